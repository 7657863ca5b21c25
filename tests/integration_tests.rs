use jsonpath_overlay::{
    Config, Document, EvalError, FilterValue, FunctionDefinition, FunctionError, Query, Scalar,
    ast::Literal,
    functions::{ArgumentType, ExpressionType, FunctionValue},
    output::{to_json, to_json_pretty, to_yaml},
    parse, parse_with_config, register,
};
use serde_json::{Value, json};

fn eval_query(path: &str, input: &str) -> Value {
    let doc = Document::from_json_str(input).unwrap();
    let nodes = parse(path).unwrap().evaluate(&doc).unwrap();
    serde_json::from_str(&to_json(&doc, &nodes).unwrap()).unwrap()
}

fn eval_with_property_names(path: &str, input: &str) -> Value {
    let doc = Document::from_json_str(input).unwrap();
    let config = Config::default().with_property_name_extension();
    let nodes = parse_with_config(path, config).unwrap().evaluate(&doc).unwrap();
    serde_json::from_str(&to_json(&doc, &nodes).unwrap()).unwrap()
}

// ============================================================================
// End-to-end examples
// ============================================================================

#[test]
fn test_filter_by_price() {
    let doc = r#"{"store": {"book": [
        {"title": "Book 1", "price": 9.99},
        {"title": "Book 2", "price": 12.99}
    ]}}"#;
    assert_eq!(eval_query("$.store.book[?(@.price < 10)].title", doc), json!(["Book 1"]));
}

#[test]
fn test_slice_with_step() {
    assert_eq!(
        eval_query("$[0:5:2]", r#"["a", "b", "c", "d", "e"]"#),
        json!(["a", "c", "e"])
    );
}

#[test]
fn test_length_of_missing_member() {
    assert_eq!(eval_query("$.books[?(length(@)>100)]", r#"{"store": {}}"#), json!([]));
    assert_eq!(eval_query("$.books[?(length(@)>100)]", r#"{"books": [1, "x"]}"#), json!([]));
}

#[test]
fn test_filter_on_property_name() {
    let doc = r#"{"items": {"a": "item1", "b": "item2"}}"#;
    assert_eq!(eval_with_property_names("$.items[?(@~ == 'a')]", doc), json!(["item1"]));
}

// ============================================================================
// Child segments
// ============================================================================

#[test]
fn test_wildcard_keeps_mapping_order() {
    assert_eq!(eval_query("$.*", r#"{"b": 1, "a": 2, "c": [3]}"#), json!([1, 2, [3]]));
}

#[test]
fn test_missing_member_is_empty() {
    assert_eq!(eval_query("$.a.b", r#"{"a": 1}"#), json!([]));
    assert_eq!(eval_query("$.x", r#"[1, 2]"#), json!([]));
}

#[test]
fn test_selector_list_keeps_duplicates() {
    assert_eq!(eval_query("$[0, 0, 'a']", r#"[7, 8]"#), json!([7, 7]));
}

#[test]
fn test_name_selects_first_duplicate_key() {
    let mut doc = Document::new();
    let k1 = doc.scalar(Scalar::str("a"));
    let v1 = doc.scalar(Scalar::int(1));
    let k2 = doc.scalar(Scalar::str("a"));
    let v2 = doc.scalar(Scalar::int(2));
    let map = doc.mapping(vec![(k1, v1), (k2, v2)]);
    doc.set_root(map);

    let nodes = parse("$.a").unwrap().evaluate(&doc).unwrap();
    assert_eq!(nodes, vec![v1]);
}

#[test]
fn test_yaml_input() {
    let doc = Document::from_yaml_str(
        "servers:\n  - url: https://a.example\n  - url: https://b.example\n",
    )
    .unwrap();
    let nodes = parse("$.servers[*].url").unwrap().evaluate(&doc).unwrap();
    assert_eq!(
        to_json(&doc, &nodes).unwrap(),
        r#"["https://a.example","https://b.example"]"#
    );
}

#[test]
fn test_empty_document() {
    let doc = Document::from_yaml_str("").unwrap();
    assert!(parse("$..*").unwrap().evaluate(&doc).unwrap().is_empty());
}

#[test]
fn test_relative_query() {
    let doc = Document::from_json_str(r#"{"a": {"x": 1}}"#).unwrap();
    let root = doc.content_root().unwrap();
    let a = doc.mapping_get(root, "a").unwrap();

    let nodes = Query::current().child("x").query(a, &doc).unwrap();
    assert_eq!(to_json(&doc, &nodes).unwrap(), "[1]");

    let absolute = Query::root().child("a").query(a, &doc).unwrap();
    assert_eq!(absolute, vec![a]);
}

// ============================================================================
// Indices and slices
// ============================================================================

#[test]
fn test_negative_index() {
    let doc = r#"["a", "b", "c"]"#;
    assert_eq!(eval_query("$[-1]", doc), json!(["c"]));
    assert_eq!(eval_query("$[-3]", doc), json!(["a"]));
}

#[test]
fn test_out_of_range_index_is_empty() {
    let doc = r#"["a", "b", "c"]"#;
    assert_eq!(eval_query("$[3]", doc), json!([]));
    assert_eq!(eval_query("$[-4]", doc), json!([]));
}

#[test]
fn test_index_on_mapping_is_empty() {
    assert_eq!(eval_query("$[0]", r#"{"0": "zero"}"#), json!([]));
}

#[test]
fn test_slice_defaults() {
    let doc = r#"[1, 2, 3, 4, 5]"#;
    assert_eq!(eval_query("$[:]", doc), eval_query("$[0:5:1]", doc));
    assert_eq!(eval_query("$[:]", doc), json!([1, 2, 3, 4, 5]));
}

#[test]
fn test_negative_step() {
    let doc = r#"[1, 2, 3, 4, 5]"#;
    assert_eq!(eval_query("$[::-1]", doc), json!([5, 4, 3, 2, 1]));
    assert_eq!(eval_query("$[3:0:-2]", doc), json!([4, 2]));
}

#[test]
fn test_negative_bounds() {
    let doc = r#"[1, 2, 3, 4, 5]"#;
    assert_eq!(eval_query("$[-2:]", doc), json!([4, 5]));
    assert_eq!(eval_query("$[:-3]", doc), json!([1, 2]));
}

#[test]
fn test_zero_step_is_empty() {
    assert_eq!(eval_query("$[::0]", r#"[1, 2, 3]"#), json!([]));
}

#[test]
fn test_slice_out_of_range() {
    assert_eq!(eval_query("$[10:]", r#"[1, 2, 3]"#), json!([]));
    assert_eq!(eval_query("$[-10:2]", r#"[1, 2, 3]"#), json!([1, 2]));
    assert_eq!(eval_query("$[1:3]", r#"{"a": 1}"#), json!([]));
}

// ============================================================================
// Descendant segments
// ============================================================================

#[test]
fn test_descendant_name_in_document_order() {
    let doc = r#"{"a": 1, "b": {"a": 2}, "c": [{"a": 3}]}"#;
    assert_eq!(eval_query("$..a", doc), json!([1, 2, 3]));
}

#[test]
fn test_descendant_wildcard_order() {
    let doc = r#"{"a": {"b": 1}, "c": [2]}"#;
    assert_eq!(eval_query("$..*", doc), json!([{"b": 1}, [2], 1, 2]));
}

#[test]
fn test_descendant_filter() {
    let doc = r#"{"x": [{"k": 1}, {"k": 5}], "y": {"z": {"k": 7}}}"#;
    assert_eq!(eval_query("$..[?@.k > 2].k", doc), json!([5, 7]));
}

#[test]
fn test_descendant_deduplicates_shared_nodes() {
    let mut doc = Document::new();
    let key = doc.scalar(Scalar::str("x"));
    let value = doc.scalar(Scalar::int(1));
    let shared = doc.mapping(vec![(key, value)]);
    let alias = doc.alias(shared);
    let root = doc.sequence(vec![shared, alias]);
    doc.set_root(root);

    let children = parse("$[*]").unwrap().evaluate(&doc).unwrap();
    assert_eq!(children, vec![shared, shared]);

    let nodes = parse("$..*").unwrap().evaluate(&doc).unwrap();
    assert_eq!(nodes, vec![shared, value]);
    assert_eq!(to_json(&doc, &nodes).unwrap(), r#"[{"x":1},1]"#);

    let below = parse("$[*]..x").unwrap().evaluate(&doc).unwrap();
    assert_eq!(below, vec![value]);
}

#[test]
fn test_nested_descendants_report_each_node_once() {
    assert_eq!(eval_query("$..a..b", "{a: {a: {b: 1}}}"), json!([1]));
    assert_eq!(
        eval_query("$..a..b", r#"{"a": {"b": 1, "a": {"b": 2}}}"#),
        json!([1, 2])
    );
}

#[test]
fn test_alias_is_followed() {
    let mut doc = Document::new();
    let k = doc.scalar(Scalar::str("x"));
    let v = doc.scalar(Scalar::str("y"));
    let target = doc.mapping(vec![(k, v)]);
    let ka = doc.scalar(Scalar::str("a"));
    let kb = doc.scalar(Scalar::str("b"));
    let alias = doc.alias(target);
    let root = doc.mapping(vec![(ka, target), (kb, alias)]);
    doc.set_root(root);

    let nodes = parse("$.b.x").unwrap().evaluate(&doc).unwrap();
    assert_eq!(nodes, vec![v]);
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn test_existence_versus_null() {
    let doc = r#"[{"x": 0}, {"x": false}, {"x": null}, {"y": 1}]"#;
    assert_eq!(
        eval_query("$[?(@.x)]", doc),
        json!([{"x": 0}, {"x": false}, {"x": null}])
    );
    assert_eq!(eval_query("$[?(@.x==null)]", doc), json!([{"x": null}]));
    assert_eq!(eval_query("$[?!@.x]", doc), json!([{"y": 1}]));
}

#[test]
fn test_filter_over_mapping_values() {
    let doc = r#"{"m": {"a": 1, "b": 2, "c": 3}}"#;
    assert_eq!(eval_query("$.m[?@ > 1]", doc), json!([2, 3]));
}

#[test]
fn test_filter_on_scalar_is_empty() {
    assert_eq!(eval_query("$[?@ == 1]", "1"), json!([]));
}

#[test]
fn test_numbers_compare_across_types() {
    let doc = r#"[1, 1.0, "1", true, null]"#;
    assert_eq!(eval_query("$[?@ == 1]", doc), json!([1, 1.0]));
    assert_eq!(eval_query("$[?@ == 1.0]", doc), json!([1, 1.0]));
}

#[test]
fn test_ordering() {
    assert_eq!(eval_query("$[?@ <= 2]", r#"[1, 2, 3, 2.0]"#), json!([1, 2, 2.0]));
    assert_eq!(eval_query("$[?@ > 2]", r#"[1, 2.5, 3]"#), json!([2.5, 3]));
    assert_eq!(eval_query("$[?@ < 'b']", r#"["a", "b", "c", 1]"#), json!(["a"]));
}

#[test]
fn test_mismatched_types_never_order() {
    let doc = r#"[1, "1", true, null, [1], {"a": 1}]"#;
    assert_eq!(eval_query("$[?@ < 2]", doc), json!([1]));
    assert_eq!(eval_query("$[?@ >= 'a']", doc), json!([]));
}

#[test]
fn test_not_equal_includes_other_types() {
    assert_eq!(eval_query("$[?@ != 1]", r#"[1, "1", null]"#), json!(["1", null]));
}

#[test]
fn test_missing_sides_are_equal() {
    assert_eq!(eval_query("$[?@.a == @.b]", r#"[{"c": 1}, {"a": 1}]"#), json!([{"c": 1}]));
    assert_eq!(eval_query("$[?@.a <= @.b]", r#"[{"c": 1}]"#), json!([{"c": 1}]));
}

#[test]
fn test_container_equality() {
    let doc = r#"[{"a": [1, 2], "b": [1, 2]}, {"a": [1], "b": [2]}, {"a": {"x": 1, "y": 2}, "b": {"y": 2, "x": 1}}]"#;
    assert_eq!(
        eval_query("$[?@.a == @.b]", doc),
        json!([{"a": [1, 2], "b": [1, 2]}, {"a": {"x": 1, "y": 2}, "b": {"y": 2, "x": 1}}])
    );
}

#[test]
fn test_absolute_query_in_filter() {
    let doc = r#"{"limit": 2, "items": [{"n": 1}, {"n": 3}]}"#;
    assert_eq!(eval_query("$.items[?@.n > $.limit]", doc), json!([{"n": 3}]));
}

#[test]
fn test_logical_operators() {
    let doc = r#"[{"a": 1}, {"a": 1, "b": 1}, {"b": 1}, {}]"#;
    assert_eq!(eval_query("$[?@.a && !@.b]", doc), json!([{"a": 1}]));
    assert_eq!(eval_query("$[?@.a || @.b]", doc), json!([{"a": 1}, {"a": 1, "b": 1}, {"b": 1}]));
    assert_eq!(eval_query("$[?!(@.a || @.b)]", doc), json!([{}]));
}

#[test]
fn test_nested_filters() {
    let doc = r#"[{"tags": [{"n": "x"}]}, {"tags": [{"n": "y"}]}]"#;
    assert_eq!(eval_query("$[?@.tags[?@.n == 'y']]", doc), json!([{"tags": [{"n": "y"}]}]));
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_length() {
    let doc = r#"["ab", "é!", [1, 2], {"a": 1, "b": 2}, 12, "abc"]"#;
    assert_eq!(
        eval_query("$[?length(@) == 2]", doc),
        json!(["ab", "é!", [1, 2], {"a": 1, "b": 2}])
    );
}

#[test]
fn test_count_is_nodelist_length() {
    let doc = r#"[{"a": 1, "b": 2}, {"a": 1}, [1, 2]]"#;
    assert_eq!(eval_query("$[?count(@.*) == 2]", doc), json!([{"a": 1, "b": 2}, [1, 2]]));
    assert_eq!(eval_query("$[?count(@) == 1]", doc).as_array().map(Vec::len), Some(3));
}

#[test]
fn test_match_is_anchored_and_search_is_not() {
    let doc = r#"["abc", "xabcx", 1]"#;
    assert_eq!(eval_query("$[?match(@, 'a.c')]", doc), json!(["abc"]));
    assert_eq!(eval_query("$[?search(@, 'a.c')]", doc), json!(["abc", "xabcx"]));
}

#[test]
fn test_match_needs_string_operands() {
    assert_eq!(eval_query("$[?match(@, '1')]", r#"[1, "1"]"#), json!(["1"]));
    assert_eq!(eval_query("$[?!match(@, '1')]", r#"[1, "1"]"#), json!([1]));
}

#[test]
fn test_match_with_pattern_from_document() {
    let doc = r#"{"pattern": "b.*", "items": ["bar", "foo"]}"#;
    assert_eq!(eval_query("$.items[?match(@, $.pattern)]", doc), json!(["bar"]));
}

#[test]
fn test_invalid_regex_is_an_error() {
    let doc = Document::from_json_str(r#"["a"]"#).unwrap();
    let result = parse("$[?match(@, '(')]").unwrap().evaluate(&doc);
    assert!(matches!(
        result,
        Err(EvalError::InvalidRegex { ref pattern, .. }) if pattern == "("
    ));
}

#[test]
fn test_invalid_regex_not_reached() {
    let doc = Document::from_json_str("[]").unwrap();
    assert!(parse("$[?match(@, '(')]").unwrap().evaluate(&doc).unwrap().is_empty());
}

#[test]
fn test_value_of_single_node() {
    let doc = r#"[{"a": {"c": 1}}, {"a": {"c": 1}, "b": {"c": 1}}]"#;
    assert_eq!(eval_query("$[?value(@..c) == 1]", doc), json!([{"a": {"c": 1}}]));
}

#[test]
fn test_value_function_as_test() {
    let doc = r#"[{"flag": true}, {"flag": false}, {"flag": 0}, {}]"#;
    assert_eq!(eval_query("$[?value(@.flag)]", doc), json!([{"flag": true}, {"flag": 0}]));
}

#[test]
fn test_registered_function() {
    fn validate(args: &[ArgumentType]) -> Result<(), String> {
        match args {
            [arg] if arg.convertible_to(ExpressionType::Value) => Ok(()),
            _ => Err("expected one value argument".to_string()),
        }
    }

    fn evaluate(doc: &Document, args: Vec<FunctionValue>) -> Result<FunctionValue, FunctionError> {
        let even = args.into_iter().next().is_some_and(|arg| {
            matches!(arg.into_value(doc), FilterValue::Literal(Literal::Integer(n)) if n % 2 == 0)
        });
        Ok(FunctionValue::Logical(even))
    }

    register(FunctionDefinition {
        name: "is_even".to_string(),
        result: ExpressionType::Logical,
        validate,
        evaluate,
    });

    assert_eq!(eval_query("$[?is_even(@)]", "[1, 2, 3, 4]"), json!([2, 4]));
    assert!(parse("$[?is_even(@.*)]").is_err());
}

#[test]
fn test_registered_function_failure() {
    register(FunctionDefinition {
        name: "always_fails".to_string(),
        result: ExpressionType::Value,
        validate: |_| Ok(()),
        evaluate: |_, _| {
            Err(FunctionError::Failed {
                name: "always_fails".to_string(),
                message: "boom".to_string(),
            })
        },
    });

    let doc = Document::from_json_str("[1]").unwrap();
    let result = parse("$[?always_fails() == 1]").unwrap().evaluate(&doc);
    assert!(matches!(result, Err(EvalError::Function(FunctionError::Failed { .. }))));
}

// ============================================================================
// Property names
// ============================================================================

#[test]
fn test_property_names_of_mapping() {
    let doc = r#"{"paths": {"/a": 1, "/b": 2}}"#;
    assert_eq!(eval_with_property_names("$.paths~", doc), json!(["paths"]));
    assert_eq!(eval_with_property_names("$.paths[*]~", doc), json!(["/a", "/b"]));
}

#[test]
fn test_property_name_of_sequence_element_is_empty() {
    assert_eq!(eval_with_property_names("$[0]~", r#"["a"]"#), json!([]));
    assert_eq!(eval_with_property_names("$.a[*]~", r#"{"a": [1, 2]}"#), json!([]));
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_pretty_and_yaml_output() {
    let doc = Document::from_json_str(r#"{"a": {"b": [1, "x"]}}"#).unwrap();
    let nodes = parse("$.a").unwrap().evaluate(&doc).unwrap();

    assert_eq!(
        to_json_pretty(&doc, &nodes).unwrap(),
        "[\n  {\n    \"b\": [\n      1,\n      \"x\"\n    ]\n  }\n]"
    );
    assert_eq!(to_yaml(&doc, &nodes).unwrap(), "- b:\n  - 1\n  - x\n");
}

#[test]
fn test_empty_nodelist_output() {
    let doc = Document::from_json_str("{}").unwrap();
    let nodes = parse("$.missing").unwrap().evaluate(&doc).unwrap();
    assert_eq!(to_json(&doc, &nodes).unwrap(), "[]");
    assert_eq!(to_yaml(&doc, &nodes).unwrap(), "[]\n");
}
