use paramcore::doc::{flatten_to_document, unflatten_from_document};
use paramcore::reconcile::{add_scope, get_param, replace_params, substitute, MatchMode};
use paramcore::{DType, EventLog, NamedParam, ParamRecord, ParamValue};

fn param(name: &str, scope: &str, v: i64) -> NamedParam {
    NamedParam {
        name: name.to_string(),
        record: ParamRecord {
            value: ParamValue::Int(v),
            dtype: DType::Int,
            scope: scope.to_string(),
            desc: String::new(),
        },
    }
}

#[test]
fn replacement_preserves_order_and_length() {
    let old = vec![param("a", "s", 1), param("b", "s", 2), param("c", "s", 3)];
    let new = vec![param("b", "s", 20)];
    let mut events = EventLog::new();
    let merged = replace_params(&new, &old, MatchMode::Strict, "version", &mut events).unwrap();
    assert_eq!(merged.len(), 3);
    assert_eq!(merged[0].record.value, ParamValue::Int(1));
    assert_eq!(merged[1].name, "b");
    assert_eq!(merged[1].record.value, ParamValue::Int(20));
    assert_eq!(merged[2].record.value, ParamValue::Int(3));
}

#[test]
fn strict_unknown_key_fails_permissive_skips() {
    let old = vec![param("a", "s", 1)];
    let new = vec![param("zz", "s", 9)];
    let mut events = EventLog::new();
    let err = replace_params(&new, &old, MatchMode::Strict, "version", &mut events).unwrap_err();
    assert!(err.to_string().contains("s/zz"));
    assert!(err.to_string().contains("s/a"));

    let merged =
        replace_params(&new, &old, MatchMode::Permissive, "version", &mut events).unwrap();
    assert_eq!(merged, old);
}

#[test]
fn version_entry_is_never_replaced() {
    let old = vec![param("version", "", 1), param("a", "", 2)];
    let new = vec![param("version", "", 9), param("a", "", 20)];
    let mut events = EventLog::new();
    let merged = replace_params(&new, &old, MatchMode::Strict, "version", &mut events).unwrap();
    assert_eq!(merged[0].record.value, ParamValue::Int(1));
    assert_eq!(merged[1].record.value, ParamValue::Int(20));
}

#[test]
fn events_note_each_decision() {
    let old = vec![param("a", "", 1), param("b", "", 2)];
    let new = vec![param("a", "", 1), param("b", "", 9)];
    let mut events = EventLog::new();
    replace_params(&new, &old, MatchMode::Strict, "version", &mut events).unwrap();
    let details: Vec<&str> = events.events().iter().map(|e| e.detail.as_str()).collect();
    assert_eq!(details, vec!["not changed", "replacing"]);
}

#[test]
fn get_param_by_full_name() {
    let params = vec![param("x", "m", 5)];
    assert_eq!(
        get_param("m/x", &params).unwrap().record.value,
        ParamValue::Int(5)
    );
    assert!(get_param("m/y", &params).is_err());
}

#[test]
fn add_scope_prefixes_every_record() {
    let params = vec![param("start_index", "loop", 1)];
    let scoped = add_scope("test", &params);
    assert_eq!(scoped[0].record.scope, "test/loop");
    assert_eq!(scoped[0].full_name(), "test/loop/start_index");
}

#[test]
fn substitute_filters_by_key_substring() {
    let base = flatten_to_document(&[param("lr", "opt", 1), param("momentum", "opt", 2)]);
    let updates = flatten_to_document(&[param("lr", "opt", 10), param("momentum", "opt", 20)]);
    let mut events = EventLog::new();
    let merged = substitute(
        &base,
        &updates,
        MatchMode::Strict,
        &["lr".to_string()],
        "version",
        &mut events,
    )
    .unwrap();
    let out = unflatten_from_document(&merged);
    assert_eq!(out[0].record.value, ParamValue::Int(10));
    assert_eq!(out[1].record.value, ParamValue::Int(2));
}

#[test]
fn substitute_with_empty_filter_takes_everything() {
    let base = flatten_to_document(&[param("lr", "opt", 1), param("momentum", "opt", 2)]);
    let updates = flatten_to_document(&[param("lr", "opt", 10), param("momentum", "opt", 20)]);
    let mut events = EventLog::new();
    let merged = substitute(&base, &updates, MatchMode::Strict, &[], "version", &mut events).unwrap();
    let out = unflatten_from_document(&merged);
    assert_eq!(out[0].record.value, ParamValue::Int(10));
    assert_eq!(out[1].record.value, ParamValue::Int(20));
}
