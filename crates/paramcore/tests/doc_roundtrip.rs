use paramcore::doc::{flatten_to_document, unflatten_from_document};
use paramcore::yamlfmt::{read_document, write_document};
use paramcore::{DType, NamedParam, ParamRecord, ParamValue};
use pretty_assertions::assert_eq;

fn param(name: &str, scope: &str, value: ParamValue, dtype: DType, desc: &str) -> NamedParam {
    NamedParam {
        name: name.to_string(),
        record: ParamRecord {
            value,
            dtype,
            scope: scope.to_string(),
            desc: desc.to_string(),
        },
    }
}

#[test]
fn flatten_unflatten_identity() {
    let params = vec![
        param("version", "", ParamValue::Str("0.5".into()), DType::Str, ""),
        param(
            "start_index",
            "loop",
            ParamValue::Int(1),
            DType::Int,
            "summation start index",
        ),
        param("offset", "b/matmul", ParamValue::Float(1.0), DType::Float, ""),
    ];
    let tree = flatten_to_document(&params);
    let back = unflatten_from_document(&tree);
    assert_eq!(back, params);
}

#[test]
fn duplicate_full_names_overwrite_in_place() {
    let params = vec![
        param("a", "", ParamValue::Int(1), DType::Int, ""),
        param("b", "", ParamValue::Int(2), DType::Int, ""),
        param("a", "", ParamValue::Int(9), DType::Int, ""),
    ];
    let back = unflatten_from_document(&flatten_to_document(&params));
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].name, "a");
    assert_eq!(back[0].record.value, ParamValue::Int(9));
    assert_eq!(back[1].name, "b");
}

#[test]
fn yaml_write_emits_desc_comment_blocks() {
    let params = vec![param(
        "offset",
        "b/matmul",
        ParamValue::Float(1.0),
        DType::Float,
        "Offset added to the result after the multiply step.",
    )];
    let text = write_document(&flatten_to_document(&params)).unwrap();
    assert!(!text.contains("desc"));
    let lines: Vec<&str> = text.lines().collect();
    let at = lines
        .iter()
        .position(|l| l.trim_start().starts_with('#'))
        .unwrap();
    assert_eq!(
        lines[at].trim_start(),
        "# Offset added to the result after the multiply step."
    );
    // the comment block sits directly on top of the dtype line, at its indent
    assert_eq!(lines[at + 1].trim_start(), "dtype: float");
    let indent = |l: &str| l.len() - l.trim_start().len();
    assert_eq!(indent(lines[at]), indent(lines[at + 1]));
    assert!(text.contains("value: 1.0"));
}

#[test]
fn document_text_round_trips_desc() {
    let params = vec![
        param("version", "", ParamValue::Str("1.1".into()), DType::Str, ""),
        param(
            "lr",
            "model/optimizer",
            ParamValue::Float(0.001),
            DType::Float,
            "Learning rate used by the optimizer; long descriptions wrap \
             across multiple comment lines and are joined back on read.",
        ),
        param(
            "layers",
            "model",
            ParamValue::Seq(vec![ParamValue::Int(64), ParamValue::Int(32)]),
            DType::List,
            "",
        ),
    ];
    let text = write_document(&flatten_to_document(&params)).unwrap();
    assert!(text.contains("# Learning rate"));
    // wrapped over more than one comment line
    assert!(text.lines().filter(|l| l.trim_start().starts_with('#')).count() >= 2);
    let back = unflatten_from_document(&read_document(&text).unwrap());
    assert_eq!(back, params);
}

#[test]
fn container_values_round_trip() {
    let value = ParamValue::Map(vec![
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
    let params = vec![param("table", "", value, DType::Dict, "")];
    let text = write_document(&flatten_to_document(&params)).unwrap();
    let back = unflatten_from_document(&read_document(&text).unwrap());
    assert_eq!(back, params);
}

#[test]
fn explicit_desc_key_is_accepted_and_comment_wins() {
    let text = "knob:\n  desc: from key\n  dtype: int\n  value: 5\n";
    let back = unflatten_from_document(&read_document(text).unwrap());
    assert_eq!(back[0].record.desc, "from key");

    let text = "knob:\n  desc: from key\n  # from comment\n  dtype: int\n  value: 5\n";
    let back = unflatten_from_document(&read_document(text).unwrap());
    assert_eq!(back[0].record.desc, "from comment");
}

#[test]
fn dtype_must_fit_value() {
    let text = "knob:\n  dtype: int\n  value: [1, 2]\n";
    assert!(read_document(text).is_err());
}

#[test]
fn tuple_dtype_restores_container_shape() {
    let text = "pair:\n  dtype: tuple\n  value:\n  - 1\n  - 2\n";
    let back = unflatten_from_document(&read_document(text).unwrap());
    assert_eq!(
        back[0].record.value,
        ParamValue::Tuple(vec![ParamValue::Int(1), ParamValue::Int(2)])
    );
}
