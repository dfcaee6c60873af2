//! End-to-end extraction and compilation over whole template sources.

use paramcore::doc::unflatten_from_document;
use paramcore::yamlfmt::{read_document, write_document};
use paramcore::{reconcile, EventLog, ParamValue};
use pretty_assertions::assert_eq;
use pyparams::markers::MarkerConfig;
use pyparams::compile::{
    compile_source, extract_params, source_to_document, update_source_params,
};

const LOOP_TEMPLATE: &str = r#"from pyparams import PyParam

start_index: int = PyParam(1, scope="loop", desc="summation start index")


def sum_numbers():
    """Sum numbers """
    s = 0
    max_iters: int = PyParam(6, int, "loop", "max number of iterations")
    for i in range(start_index, max_iters):
        s += i
    return s


print(sum_numbers())
"#;

#[test]
fn extracts_full_names_and_values() {
    let markers = MarkerConfig::default();
    let params = extract_params(LOOP_TEMPLATE, &markers).unwrap();
    let keys: Vec<String> = params.iter().map(|p| p.full_name()).collect();
    assert_eq!(keys, ["loop/start_index", "loop/max_iters"]);
    assert_eq!(params[0].record.value, ParamValue::Int(1));
    assert_eq!(params[1].record.value, ParamValue::Int(6));
    assert_eq!(params[0].record.desc, "summation start index");
}

#[test]
fn compiling_an_unmodified_document_freezes_the_literals() {
    let markers = MarkerConfig::default();
    let document = source_to_document(LOOP_TEMPLATE, &markers).unwrap();
    let mut events = EventLog::new();
    let compiled =
        compile_source(LOOP_TEMPLATE, &document, &markers, false, &mut events).unwrap();
    assert!(compiled.contains("start_index: int = 1"));
    assert!(compiled.contains("    max_iters: int = 6"));
    assert!(!compiled.contains("PyParam("));
    // untouched statements survive byte for byte
    assert!(compiled.contains("    for i in range(start_index, max_iters):"));
    assert!(compiled.contains("print(sum_numbers())"));
}

#[test]
fn extraction_round_trips_through_the_document_form() {
    let markers = MarkerConfig::default();
    let params = extract_params(LOOP_TEMPLATE, &markers).unwrap();
    let document = source_to_document(LOOP_TEMPLATE, &markers).unwrap();
    assert_eq!(unflatten_from_document(&document), params);

    // and through the serialized text form, descriptions included
    let text = write_document(&document).unwrap();
    let back = unflatten_from_document(&read_document(&text).unwrap());
    assert_eq!(back, params);
}

// Declarations may sit in function defaults, call keyword arguments, class
// bodies and nested functions; compilation reaches all of them.
const DEFAULTS_TEMPLATE: &str = r#"from dataclasses import dataclass

from pyparams import PyParam


def some_function(
        x, y,
        param2: int = PyParam(2, int, "func", "b"),
        param3: float = PyParam(3, scope="func"),
        param4: int = PyParam(value=4, dtype=int, scope="func"),
        param5=PyParam(5, dtype=int, scope="func"),
        param6=PyParam(6, int, scope="func")
) -> int:
    print("test")
    return param5


result = some_function(
    0, 1,
    param2=PyParam(12, int, "func_call", "b"),
    param3=PyParam(13, scope="func_call"),
)


@dataclass
class SomeClass:
    param1: int = PyParam(value=1, scope="class")
    param2 = PyParam(2, scope="class")
    param3: int = PyParam(3, scope="class")

    def class_func(
            self,
            arg1: float = PyParam(value=1.1, scope="class/func/arg"),
            arg2=PyParam(value=2.2, scope="class/func/arg"),
    ) -> bool:
        return self.param1 + self.param2 + arg1 + arg2


def nested_function(
        x, y,
        np1: int = PyParam(2, int, "np", "b"),
):
    def nested_function2(
            x, y,
            np2: int = PyParam(2, int, "np", "b"),
    ) -> bool:
        np3: int = PyParam(2, int, "np", "b")
        pass

    np4: int = PyParam(2, int, "np", "b")

    return nested_function2
"#;

#[test]
fn compiles_defaults_keywords_and_class_bodies() {
    let markers = MarkerConfig::default();
    let document = source_to_document(DEFAULTS_TEMPLATE, &markers).unwrap();
    let mut events = EventLog::new();
    let compiled =
        compile_source(DEFAULTS_TEMPLATE, &document, &markers, false, &mut events).unwrap();
    assert!(compiled.contains(
        "some_function(x, y, param2: int=2, param3: float=3, \
         param4: int=4, param5=5, param6=6)"
    ));
    assert!(compiled.contains("result = some_function(0, 1, param2=12, param3=13)"));
    assert!(compiled.contains("self, arg1: float=1.1, arg2=2.2"));
    assert!(compiled.contains("    param2 = 2"));
    assert!(compiled.contains("    param3: int = 3"));
    assert!(compiled.contains("def nested_function2(x, y, np2: int=2) -> bool:"));
    assert!(compiled.contains("        np3: int = 2"));
    assert!(!compiled.contains("PyParam("));
}

#[test]
fn nested_body_declarations_precede_the_enclosing_defaults() {
    let markers = MarkerConfig::default();
    let params = extract_params(DEFAULTS_TEMPLATE, &markers).unwrap();
    let keys: Vec<String> = params.iter().map(|p| p.full_name()).collect();
    let at = |k: &str| keys.iter().position(|x| x == k).unwrap();
    assert!(at("np/np3") < at("np/np2"));
    assert!(at("np/np4") < at("np/np1"));
    assert!(at("func/param2") < at("func_call/param2"));
}

const DESC_TEMPLATE: &str = r#"from pyparams import PyParam

param1: int = PyParam(value=1, dtype=int, scope="loop", desc="summation start index")
param2: int = PyParam(2, int, "loop", "max number of iterations")
param3: int = PyParam(3, scope="loop")
param5: int = PyParam(
    5,
    dtype=int,
    scope="loop",
    desc="some very long description, which should "
    "break line in the yaml file: Is it long enough?",
)
"#;

#[test]
fn long_descriptions_survive_save_and_load() {
    let markers = MarkerConfig::default();
    let params = extract_params(DESC_TEMPLATE, &markers).unwrap();
    let text = write_document(&source_to_document(DESC_TEMPLATE, &markers).unwrap()).unwrap();
    // wrapped into a multi-line comment block, not a desc key
    assert!(!text.contains("desc:"));
    assert!(text.lines().filter(|l| l.trim_start().starts_with('#')).count() >= 3);
    let loaded = unflatten_from_document(&read_document(&text).unwrap());
    assert_eq!(loaded, params);
}

#[test]
fn rescoped_sources_re_extract_identically() {
    let markers = MarkerConfig::default();
    let params = extract_params(DESC_TEMPLATE, &markers).unwrap();
    let scoped = reconcile::add_scope("test", &params);
    assert_eq!(scoped[0].record.scope, "test/loop");
    assert_eq!(scoped[0].full_name(), "test/loop/param1");

    let updated = update_source_params(DESC_TEMPLATE, &scoped, &markers).unwrap();
    let back = extract_params(&updated, &markers).unwrap();
    assert_eq!(back, scoped);
}

#[test]
fn container_declarations_round_trip_unchanged() {
    let markers = MarkerConfig::default();
    let src = r#"from pyparams import PyParam

foo3_dict: dict = PyParam(
    dtype=dict,
    value={"a": {"aa": 3, "ab": [1, 3]}, "b": [1, 2, 3], "c": "test"},
    scope="model",
    desc="foo2",
)
"#;
    let params = extract_params(src, &markers).unwrap();
    let text = write_document(&source_to_document(src, &markers).unwrap()).unwrap();
    let loaded = unflatten_from_document(&read_document(&text).unwrap());
    assert_eq!(loaded, params);

    let expected = ParamValue::Map(vec![
        (
            "a".into(),
            ParamValue::Map(vec![
                ("aa".into(), ParamValue::Int(3)),
                (
                    "ab".into(),
                    ParamValue::Seq(vec![ParamValue::Int(1), ParamValue::Int(3)]),
                ),
            ]),
        ),
        (
            "b".into(),
            ParamValue::Seq(vec![
                ParamValue::Int(1),
                ParamValue::Int(2),
                ParamValue::Int(3),
            ]),
        ),
        ("c".into(), ParamValue::Str("test".into())),
    ]);
    assert_eq!(loaded[0].record.value, expected);

    let mut events = EventLog::new();
    let document = source_to_document(src, &markers).unwrap();
    let compiled = compile_source(src, &document, &markers, false, &mut events).unwrap();
    assert!(compiled.contains(
        "foo3_dict: dict = {'a': {'aa': 3, 'ab': [1, 3]}, 'b': [1, 2, 3], 'c': 'test'}"
    ));
}
