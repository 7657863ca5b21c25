use crate::{
    ast::{ComparisonOp, Query},
    functions::FunctionRef,
};

/// `logical-or-expr = logical-and-expr *("||" logical-and-expr)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOrExpr(pub Vec<LogicalAndExpr>);

/// `logical-and-expr = basic-expr *("&&" basic-expr)`
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalAndExpr(pub Vec<BasicExpr>);

/// A single operand of `&&`.
#[derive(Debug, Clone, PartialEq)]
pub enum BasicExpr {
    /// Parenthesized expression, optionally negated
    ///
    /// # Examples
    /// ```text
    /// (@.a || @.b)
    /// !(@.price > 10)
    /// ```
    Paren { not: bool, expr: LogicalOrExpr },

    /// `comparable op comparable`
    Comparison(ComparisonExpr),

    /// Existence test or logical function call, optionally negated
    ///
    /// # Examples
    /// ```text
    /// @.isbn
    /// !@.isbn
    /// match(@.name, 'J.*')
    /// ```
    Test(TestExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonExpr {
    pub left: Comparable,
    pub op: ComparisonOp,
    pub right: Comparable,
}

/// Either side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparable {
    Literal(Literal),
    /// Relative (`@.a`) or absolute (`$.a[0]`) singular query
    SingularQuery(Query),
    /// Function returning a value type
    Function(FunctionExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestExpr {
    pub not: bool,
    pub test: Test,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    /// True when the query selects at least one node
    FilterQuery(Query),
    /// True when the function result is `true`, or any value other than
    /// Nothing
    Function(FunctionExpr),
}

/// A call to a registered function, resolved at parse time.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub function: FunctionRef,
    pub args: Vec<FunctionArgument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionArgument {
    Literal(Literal),
    FilterQuery(Query),
    Logical(LogicalOrExpr),
    Function(FunctionExpr),
}

/// Literal value written in a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

impl FunctionExpr {
    pub fn name(&self) -> &str {
        self.function.name()
    }
}
