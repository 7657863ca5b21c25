use jsonpath_overlay::{
    Config, ParseError, Query, parse, parse_with_config,
    ast::{
        BasicExpr, ChildSegment, Comparable, ComparisonOp, FunctionArgument, Literal, QueryRoot,
        Segment, Selector, Slice, Test,
    },
};

fn canonical(input: &str) -> String {
    parse(input).unwrap().to_string()
}

fn error_message(input: &str) -> String {
    match parse(input) {
        Err(ParseError::Syntax { message, .. }) => message,
        other => panic!("expected a syntax error for {input}, got {other:?}"),
    }
}

fn filter_of(query: &Query) -> &BasicExpr {
    let Segment::Child(ChildSegment::LongHand(selectors)) = &query.segments[0] else {
        panic!("expected a bracketed segment");
    };
    let Selector::Filter(expr) = &selectors[0] else {
        panic!("expected a filter selector");
    };
    &expr.0[0].0[0]
}

// ============================================================================
// Segments and selectors
// ============================================================================

#[test]
fn test_root_only() {
    let query = parse("$").unwrap();
    assert_eq!(query.root, QueryRoot::Root);
    assert!(query.segments.is_empty());
}

#[test]
fn test_dot_segments() {
    let query = parse("$.store.*").unwrap();
    assert_eq!(
        query.segments,
        vec![
            Segment::Child(ChildSegment::DotName("store".into())),
            Segment::Child(ChildSegment::DotWildcard),
        ]
    );
}

#[test]
fn test_keyword_as_member_name() {
    let query = parse("$.true.null").unwrap();
    assert_eq!(
        query.segments[0],
        Segment::Child(ChildSegment::DotName("true".into()))
    );
}

#[test]
fn test_descendant_segments() {
    let query = parse("$..author..*..[0]").unwrap();
    assert_eq!(
        query.segments,
        vec![
            Segment::Descendant(ChildSegment::DotName("author".into())),
            Segment::Descendant(ChildSegment::DotWildcard),
            Segment::Descendant(ChildSegment::LongHand(vec![Selector::Index(0)])),
        ]
    );
}

#[test]
fn test_selector_list() {
    let query = parse("$['a', *, -1, 1:3]").unwrap();
    assert_eq!(
        query.segments[0],
        Segment::Child(ChildSegment::LongHand(vec![
            Selector::Name("a".into()),
            Selector::Wildcard,
            Selector::Index(-1),
            Selector::Slice(Slice {
                start: Some(1),
                end: Some(3),
                step: None
            }),
        ]))
    );
}

#[test]
fn test_slice_forms() {
    let slice = |input: &str| match &parse(input).unwrap().segments[0] {
        Segment::Child(ChildSegment::LongHand(selectors)) => selectors[0].clone(),
        other => panic!("unexpected segment {other:?}"),
    };

    assert_eq!(
        slice("$[:]"),
        Selector::Slice(Slice { start: None, end: None, step: None })
    );
    assert_eq!(
        slice("$[::-1]"),
        Selector::Slice(Slice { start: None, end: None, step: Some(-1) })
    );
    assert_eq!(
        slice("$[1::]"),
        Selector::Slice(Slice { start: Some(1), end: None, step: None })
    );
}

#[test]
fn test_from_str() {
    let query: Query = "$.a[0]".parse().unwrap();
    assert_eq!(query, parse("$.a[0]").unwrap());
}

// ============================================================================
// Filter expressions
// ============================================================================

#[test]
fn test_comparison_with_singular_query() {
    let query = parse("$[?@.price < 10]").unwrap();
    let BasicExpr::Comparison(comparison) = filter_of(&query) else {
        panic!("expected a comparison");
    };
    assert_eq!(comparison.op, ComparisonOp::LessThan);
    assert!(matches!(comparison.left, Comparable::SingularQuery(_)));
    assert_eq!(comparison.right, Comparable::Literal(Literal::Integer(10)));
}

#[test]
fn test_existence_test() {
    let query = parse("$[?@.isbn]").unwrap();
    let BasicExpr::Test(test) = filter_of(&query) else {
        panic!("expected a test expression");
    };
    assert!(!test.not);
    assert!(matches!(test.test, Test::FilterQuery(_)));
}

#[test]
fn test_negated_paren() {
    let query = parse("$[?!(@.a || @.b)]").unwrap();
    let BasicExpr::Paren { not, expr } = filter_of(&query) else {
        panic!("expected a parenthesized expression");
    };
    assert!(*not);
    assert_eq!(expr.0.len(), 2);
}

#[test]
fn test_and_binds_tighter_than_or() {
    let query = parse("$[?@.a || @.b && @.c]").unwrap();
    let Segment::Child(ChildSegment::LongHand(selectors)) = &query.segments[0] else {
        panic!("expected a bracketed segment");
    };
    let Selector::Filter(expr) = &selectors[0] else {
        panic!("expected a filter");
    };
    assert_eq!(expr.0.len(), 2);
    assert_eq!(expr.0[0].0.len(), 1);
    assert_eq!(expr.0[1].0.len(), 2);
}

#[test]
fn test_literal_kinds() {
    let right = |input: &str| match filter_of(&parse(input).unwrap()) {
        BasicExpr::Comparison(comparison) => comparison.right.clone(),
        other => panic!("expected a comparison, got {other:?}"),
    };

    assert_eq!(right("$[?@.a == 'x']"), Comparable::Literal(Literal::String("x".into())));
    assert_eq!(right("$[?@.a == 1.5]"), Comparable::Literal(Literal::Float(1.5)));
    assert_eq!(right("$[?@.a == true]"), Comparable::Literal(Literal::Bool(true)));
    assert_eq!(right("$[?@.a == null]"), Comparable::Literal(Literal::Null));
}

#[test]
fn test_absolute_query_inside_filter() {
    let query = parse("$.items[?@.n > $.limit]").unwrap();
    assert_eq!(query.to_string(), "$.items[?@.n > $.limit]");
}

// ============================================================================
// Function calls
// ============================================================================

#[test]
fn test_singular_argument() {
    let query = parse("$[?length(@.name) > 3]").unwrap();
    let BasicExpr::Comparison(comparison) = filter_of(&query) else {
        panic!("expected a comparison");
    };
    let Comparable::Function(function) = &comparison.left else {
        panic!("expected a function call");
    };
    assert_eq!(function.name(), "length");
    assert!(matches!(function.args[0], FunctionArgument::FilterQuery(_)));
}

#[test]
fn test_nested_function_argument() {
    let query = parse("$[?length(value(@..x)) == 2]").unwrap();
    let BasicExpr::Comparison(comparison) = filter_of(&query) else {
        panic!("expected a comparison");
    };
    let Comparable::Function(function) = &comparison.left else {
        panic!("expected a function call");
    };
    assert!(matches!(function.args[0], FunctionArgument::Function(_)));
}

#[test]
fn test_logical_function_as_test() {
    let query = parse("$[?match(@.id, '[a-z]+')]").unwrap();
    let BasicExpr::Test(test) = filter_of(&query) else {
        panic!("expected a test expression");
    };
    assert!(matches!(test.test, Test::Function(_)));
}

#[test]
fn test_unknown_function() {
    assert_eq!(error_message("$[?nope(@)]"), "unknown function 'nope'");
}

#[test]
fn test_length_rejects_nodelist() {
    assert!(error_message("$[?length(@.*) > 1]").contains("invalid arguments to length()"));
}

#[test]
fn test_count_rejects_literal() {
    assert!(error_message("$[?count(1) == 1]").contains("invalid arguments to count()"));
}

#[test]
fn test_wrong_arity() {
    assert!(error_message("$[?match(@.a)]").contains("expected 2 argument(s), got 1"));
}

#[test]
fn test_logical_function_cannot_be_compared() {
    assert!(error_message("$[?match(@.a, 'x') == true]").contains("does not return a value"));
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_empty_input() {
    assert_eq!(parse(""), Err(ParseError::Empty));
    assert_eq!(parse("   "), Err(ParseError::Empty));
}

#[test]
fn test_must_start_with_root() {
    assert_eq!(error_message("a.b"), "query must start with '$'");
    assert_eq!(error_message("@.a"), "query must start with '$'");
}

#[test]
fn test_trailing_tokens() {
    assert_eq!(error_message("$.a $.b"), "unexpected token after query");
}

#[test]
fn test_unexpected_end() {
    assert_eq!(error_message("$.a["), "expected selector, found end of input");
}

#[test]
fn test_float_index_rejected() {
    assert_eq!(error_message("$[1.5]"), "expected selector");
}

#[test]
fn test_float_overflow_rejected() {
    assert_eq!(error_message("$[?@.a == 1e400]"), "number out of range");
    assert_eq!(error_message("$[?@.a == -1e400]"), "number out of range");
}

#[test]
fn test_non_integer_slice_bound() {
    assert_eq!(error_message("$[1:a]"), "slice bounds must be integers");
}

#[test]
fn test_index_limits() {
    assert!(parse("$[9007199254740991]").is_ok());
    assert!(parse("$[-9007199254740991]").is_ok());
    assert_eq!(error_message("$[9007199254740992]"), "index out of range");
    assert_eq!(error_message("$[-0]"), "negative zero is not a valid index");
}

#[test]
fn test_regex_operator_rejected() {
    assert!(error_message("$[?@.a =~ 'x']").contains("match()"));
}

#[test]
fn test_non_singular_comparison() {
    assert_eq!(error_message("$[?@.* == 1]"), "comparisons require a singular query");
    assert_eq!(error_message("$[?@..a == 1]"), "comparisons require a singular query");
}

#[test]
fn test_bare_literal_is_not_a_filter() {
    assert!(parse("$[?true]").is_err());
}

#[test]
fn test_illegal_token_is_reported() {
    assert_eq!(error_message("$.a]"), "unexpected token");
    assert_eq!(error_message("$['unterminated"), "unexpected token");
}

#[test]
fn test_error_position_and_rendering() {
    let Err(ParseError::Syntax { line, column, rendered, .. }) = parse("$.a[0 ,]") else {
        panic!("expected a syntax error");
    };
    assert_eq!((line, column), (1, 7));
    assert_eq!(
        rendered,
        "Error at line 1, column 7: expected selector\n$.a[0 ,]\n       ^"
    );
}

#[test]
fn test_error_on_second_line() {
    let Err(ParseError::Syntax { line, column, rendered, .. }) = parse("$\n.a[x]") else {
        panic!("expected a syntax error");
    };
    assert_eq!((line, column), (2, 3));
    assert!(rendered.ends_with(".a[x]\n   ^"));
}

#[test]
fn test_display_of_error_is_rendered_excerpt() {
    let err = parse("$[").unwrap_err();
    assert!(err.to_string().starts_with("Error at line 1, column 2:"));
}

// ============================================================================
// Property-name extension
// ============================================================================

#[test]
fn test_property_name_segment() {
    let config = Config::default().with_property_name_extension();
    let query = parse_with_config("$.paths~", config).unwrap();
    assert_eq!(query.segments.last(), Some(&Segment::PropertyName));
    assert_eq!(query.to_string(), "$.paths~");
}

#[test]
fn test_property_name_must_be_last() {
    let config = Config::default().with_property_name_extension();
    let Err(ParseError::Syntax { message, .. }) = parse_with_config("$.a~.b", config) else {
        panic!("expected a syntax error");
    };
    assert_eq!(message, "'~' must be the last segment");
}

#[test]
fn test_property_name_needs_extension() {
    assert_eq!(error_message("$.a~"), "unexpected token");
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_canonical_forms_print_unchanged() {
    let queries = [
        "$",
        "$.store.book[0].title",
        "$..*",
        "$..author",
        "$..['a', 'b']",
        "$[*, 0, 'a']",
        "$[1:3]",
        "$[:2]",
        "$[1:]",
        "$[::-1]",
        "$[-1]",
        "$['it\\'s']",
        "$['a b']",
        "$[?@.price < 10]",
        "$[?@.a == 'x' || @.b && !@.c]",
        "$[?!(@.a > 1)]",
        "$[?(@.a)]",
        "$[?length(@.name) >= 3]",
        "$[?count(@.*) == 2]",
        "$[?match(@.id, '[a-z]+')]",
        "$[?search(@.id, 'x')]",
        "$[?value(@..x) == 1.5]",
        "$[?@.a == null]",
        "$[?@.a != false]",
        "$[?$.limit > @.n]",
        "$.store.book[?(@.price < 10)].title",
    ];

    for query in queries {
        assert_eq!(canonical(query), query, "printing {query}");
    }
}

#[test]
fn test_non_canonical_forms_normalize() {
    assert_eq!(canonical(r#"$["a"]"#), "$['a']");
    assert_eq!(canonical("$[ 1 : 3 ]"), "$[1:3]");
    assert_eq!(canonical("$[1::]"), "$[1:]");
    assert_eq!(canonical("$[?@.a==1]"), "$[?@.a == 1]");
    assert_eq!(canonical("$[?@.a == 1e3]"), "$[?@.a == 1000.0]");
    assert_eq!(canonical(r#"$["A\n"]"#), r"$['A\n']");
}

#[test]
fn test_reparse_of_printed_query_is_equal() {
    let queries = [
        "$..book[?@.price < 10 && @.category == 'fiction'].title",
        "$[?!@.a || (@.b >= -2 && length(@.c) == 1)]",
        "$.a['x', \"y\"][0:10:2]",
        "$[?count(@..[?@.k]) > 0]",
        "$[?@.a == 1e300 || @.b < -2.5e-300]",
    ];

    for input in queries {
        let first = parse(input).unwrap();
        let printed = first.to_string();
        let second = parse(&printed).unwrap();
        assert_eq!(first, second, "reparsing {printed}");
        assert_eq!(printed, second.to_string());
    }
}
