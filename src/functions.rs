//! Function extensions callable from filter expressions.
//!
//! Five functions are always available: `length`, `count`, `match`, `search`
//! and `value`. More can be added at runtime with [`register`]; every call is
//! resolved and type-checked when the query is parsed.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock, Mutex, RwLock},
};

use log::debug;
use regex::Regex;
use thiserror::Error;

use crate::{
    ast::Literal,
    evaluator::{EvalError, FilterValue},
    tree::{Document, Node, NodeId},
};

/// Declared result type of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionType {
    /// A JSON value or Nothing
    Value,
    /// `LogicalTrue` or `LogicalFalse`
    Logical,
    /// A nodelist
    Nodes,
}

/// Static type of an argument as written in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    Literal,
    /// A filter query that can select at most one node
    SingularQuery,
    /// A call to a function returning a value
    Value,
    /// A filter query that may select many nodes, or a call returning nodes
    Nodes,
    /// A logical expression, or a call returning a logical
    Logical,
}

impl ArgumentType {
    /// Whether an argument of this type may be passed where `expected` is
    /// declared.
    pub fn convertible_to(self, expected: ExpressionType) -> bool {
        match expected {
            ExpressionType::Value => matches!(
                self,
                ArgumentType::Literal | ArgumentType::SingularQuery | ArgumentType::Value
            ),
            ExpressionType::Logical => matches!(
                self,
                ArgumentType::Logical | ArgumentType::Nodes | ArgumentType::SingularQuery
            ),
            ExpressionType::Nodes => {
                matches!(self, ArgumentType::Nodes | ArgumentType::SingularQuery)
            }
        }
    }

    pub fn from_result(result: ExpressionType) -> Self {
        match result {
            ExpressionType::Value => ArgumentType::Value,
            ExpressionType::Logical => ArgumentType::Logical,
            ExpressionType::Nodes => ArgumentType::Nodes,
        }
    }
}

/// A runtime argument or result of a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionValue {
    Value(FilterValue),
    Logical(bool),
    Nodes(Vec<NodeId>),
}

impl FunctionValue {
    /// Converts to a value: a nodelist of exactly one node becomes that
    /// node's value, any other nodelist becomes Nothing.
    pub fn into_value(self, doc: &Document) -> FilterValue {
        match self {
            FunctionValue::Value(value) => value,
            FunctionValue::Logical(b) => FilterValue::Literal(Literal::Bool(b)),
            FunctionValue::Nodes(nodes) => match nodes.as_slice() {
                [single] => FilterValue::from_node(doc, *single),
                _ => FilterValue::Nothing,
            },
        }
    }

    pub fn into_nodes(self) -> Vec<NodeId> {
        match self {
            FunctionValue::Nodes(nodes) => nodes,
            _ => Vec::new(),
        }
    }
}

/// Errors from resolving, validating or running a function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    #[error("unknown function '{0}'")]
    Unknown(String),

    #[error("invalid arguments to {name}(): {message}")]
    InvalidArguments { name: String, message: String },

    #[error("function '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

pub type Validator = fn(&[ArgumentType]) -> Result<(), String>;
pub type Evaluate = fn(&Document, Vec<FunctionValue>) -> Result<FunctionValue, FunctionError>;

/// A user-registered function.
#[derive(Debug)]
pub struct FunctionDefinition {
    pub name: String,
    pub result: ExpressionType,
    pub validate: Validator,
    pub evaluate: Evaluate,
}

/// The built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Length,
    Count,
    Match,
    Search,
    Value,
}

/// A resolved function: either built in or registered at runtime.
#[derive(Debug, Clone)]
pub enum FunctionRef {
    Builtin(Builtin),
    Extension(Arc<FunctionDefinition>),
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FunctionRef::Builtin(a), FunctionRef::Builtin(b)) => a == b,
            (FunctionRef::Extension(a), FunctionRef::Extension(b)) => {
                Arc::ptr_eq(a, b) || a.name == b.name
            }
            _ => false,
        }
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<String, FunctionRef>>> = LazyLock::new(|| {
    let builtins = [
        Builtin::Length,
        Builtin::Count,
        Builtin::Match,
        Builtin::Search,
        Builtin::Value,
    ];
    RwLock::new(
        builtins
            .into_iter()
            .map(|b| (b.name().to_string(), FunctionRef::Builtin(b)))
            .collect(),
    )
});

/// Adds a function to the process-wide registry, replacing any function
/// of the same name. Queries parsed afterwards can call it.
///
/// # Examples
///
/// ```
/// use jsonpath_overlay::functions::{
///     register, ArgumentType, ExpressionType, FunctionDefinition, FunctionValue,
/// };
///
/// fn validate(args: &[ArgumentType]) -> Result<(), String> {
///     match args {
///         [] => Ok(()),
///         _ => Err("expected no arguments".to_string()),
///     }
/// }
///
/// register(FunctionDefinition {
///     name: "always".to_string(),
///     result: ExpressionType::Logical,
///     validate,
///     evaluate: |_, _| Ok(FunctionValue::Logical(true)),
/// });
///
/// assert!(jsonpath_overlay::parse("$[?always()]").is_ok());
/// ```
pub fn register(definition: FunctionDefinition) {
    debug!("registering function {}()", definition.name);
    let name = definition.name.clone();
    let mut registry = REGISTRY.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.insert(name, FunctionRef::Extension(Arc::new(definition)));
}

/// Resolves a function by name.
pub fn lookup(name: &str) -> Option<FunctionRef> {
    let registry = REGISTRY.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    registry.get(name).cloned()
}

impl FunctionRef {
    pub fn name(&self) -> &str {
        match self {
            FunctionRef::Builtin(builtin) => builtin.name(),
            FunctionRef::Extension(definition) => &definition.name,
        }
    }

    pub fn result_type(&self) -> ExpressionType {
        match self {
            FunctionRef::Builtin(builtin) => builtin.result_type(),
            FunctionRef::Extension(definition) => definition.result,
        }
    }

    /// Checks the static argument types of a call.
    pub fn validate(&self, args: &[ArgumentType]) -> Result<(), FunctionError> {
        let checked = match self {
            FunctionRef::Builtin(builtin) => builtin.validate(args),
            FunctionRef::Extension(definition) => (definition.validate)(args),
        };
        checked.map_err(|message| FunctionError::InvalidArguments {
            name: self.name().to_string(),
            message,
        })
    }

    pub fn evaluate(&self, doc: &Document, args: Vec<FunctionValue>) -> Result<FunctionValue, EvalError> {
        match self {
            FunctionRef::Builtin(builtin) => builtin.evaluate(doc, args),
            FunctionRef::Extension(definition) => Ok((definition.evaluate)(doc, args)?),
        }
    }
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Length => "length",
            Builtin::Count => "count",
            Builtin::Match => "match",
            Builtin::Search => "search",
            Builtin::Value => "value",
        }
    }

    pub fn result_type(self) -> ExpressionType {
        match self {
            Builtin::Length | Builtin::Count | Builtin::Value => ExpressionType::Value,
            Builtin::Match | Builtin::Search => ExpressionType::Logical,
        }
    }

    fn parameters(self) -> &'static [ExpressionType] {
        match self {
            Builtin::Length => &[ExpressionType::Value],
            Builtin::Count | Builtin::Value => &[ExpressionType::Nodes],
            Builtin::Match | Builtin::Search => &[ExpressionType::Value, ExpressionType::Value],
        }
    }

    fn validate(self, args: &[ArgumentType]) -> Result<(), String> {
        let params = self.parameters();
        if args.len() != params.len() {
            return Err(format!("expected {} argument(s), got {}", params.len(), args.len()));
        }
        for (i, (arg, param)) in args.iter().zip(params).enumerate() {
            if !arg.convertible_to(*param) {
                return Err(format!("argument {} of type {:?} is not convertible to {:?}", i + 1, arg, param));
            }
        }
        Ok(())
    }

    fn evaluate(self, doc: &Document, args: Vec<FunctionValue>) -> Result<FunctionValue, EvalError> {
        let mut args = args.into_iter();
        let mut next = || args.next().unwrap_or(FunctionValue::Nodes(Vec::new()));

        match self {
            Builtin::Length => Ok(FunctionValue::Value(length(doc, next().into_value(doc)))),
            Builtin::Count => {
                let count = next().into_nodes().len() as i64;
                Ok(FunctionValue::Value(FilterValue::Literal(Literal::Integer(count))))
            }
            Builtin::Value => Ok(FunctionValue::Value(next().into_value(doc))),
            Builtin::Match | Builtin::Search => {
                let subject = next().into_value(doc);
                let pattern = next().into_value(doc);
                let (FilterValue::Literal(Literal::String(subject)), FilterValue::Literal(Literal::String(pattern))) =
                    (subject, pattern)
                else {
                    return Ok(FunctionValue::Logical(false));
                };
                let source = if self == Builtin::Match {
                    format!("^(?:{pattern})$")
                } else {
                    pattern.clone()
                };
                let re = compiled(&source).map_err(|e| EvalError::InvalidRegex {
                    pattern,
                    message: e.to_string(),
                })?;
                Ok(FunctionValue::Logical(re.is_match(&subject)))
            }
        }
    }
}

const REGEX_CACHE_CAPACITY: usize = 64;

/// Compiled patterns keyed by source; cleared once it reaches capacity.
static REGEX_CACHE: LazyLock<Mutex<HashMap<String, Regex>>> = LazyLock::new(|| Mutex::new(HashMap::new()));

fn compiled(source: &str) -> Result<Regex, regex::Error> {
    let mut cache = REGEX_CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(re) = cache.get(source) {
        return Ok(re.clone());
    }
    let re = Regex::new(source)?;
    if cache.len() >= REGEX_CACHE_CAPACITY {
        cache.clear();
    }
    cache.insert(source.to_string(), re.clone());
    Ok(re)
}

/// Characters of a string, items of a sequence or pairs of a mapping;
/// Nothing for anything else.
fn length(doc: &Document, value: FilterValue) -> FilterValue {
    let len = match value {
        FilterValue::Literal(Literal::String(s)) => s.chars().count(),
        FilterValue::Node(id) => match doc.get(doc.resolve(id)) {
            Node::Sequence(items) => items.len(),
            Node::Mapping(content) => content.len() / 2,
            _ => return FilterValue::Nothing,
        },
        _ => return FilterValue::Nothing,
    };
    FilterValue::Literal(Literal::Integer(len as i64))
}
