use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::error::{ParamError, Result};
use crate::record::{NamedParam, ParamRecord};
use crate::scope;
use crate::value::{self, DType, ParamValue};

// Insertion-ordered hierarchical mapping. A key holds either a nested scope
// or a leaf record, never both.
pub type DocTree = IndexMap<String, DocNode>;

#[derive(Debug, Clone, PartialEq)]
pub enum DocNode {
    Scope(DocTree),
    Leaf {
        value: ParamValue,
        dtype: DType,
        desc: String,
    },
}

// A param with full name `a/b/c` lands at scope path `a/b` under leaf key
// `c`. A later duplicate of the same full name overwrites the earlier leaf
// in place.
pub fn flatten_to_document(params: &[NamedParam]) -> DocTree {
    let mut root = DocTree::new();
    for p in params {
        let segs: Vec<&str> = scope::segments(&p.record.scope).collect();
        let leaf = DocNode::Leaf {
            value: p.record.value.clone(),
            dtype: p.record.dtype,
            desc: p.record.desc.clone(),
        };
        insert_at(&mut root, &segs, &p.name, leaf);
    }
    root
}

fn insert_at(map: &mut DocTree, segs: &[&str], name: &str, leaf: DocNode) {
    match segs.split_first() {
        None => {
            map.insert(name.to_string(), leaf);
        }
        Some((head, rest)) => {
            let entry = map
                .entry((*head).to_string())
                .or_insert_with(|| DocNode::Scope(DocTree::new()));
            if let DocNode::Scope(m) = entry {
                insert_at(m, rest, name, leaf);
            } else {
                // a leaf shadowed by a deeper path becomes a scope
                let mut m = DocTree::new();
                insert_at(&mut m, rest, name, leaf);
                *entry = DocNode::Scope(m);
            }
        }
    }
}

pub fn unflatten_from_document(tree: &DocTree) -> Vec<NamedParam> {
    let mut out = Vec::new();
    collect_params(tree, "", &mut out);
    out
}

fn collect_params(map: &DocTree, prefix: &str, out: &mut Vec<NamedParam>) {
    for (key, node) in map {
        match node {
            DocNode::Leaf { value, dtype, desc } => out.push(NamedParam {
                name: key.clone(),
                record: ParamRecord {
                    value: value.clone(),
                    dtype: *dtype,
                    scope: prefix.to_string(),
                    desc: desc.clone(),
                },
            }),
            DocNode::Scope(m) => collect_params(m, &scope::join(prefix, key), out),
        }
    }
}

// Serialized form with descriptions left out; the text formatter re-attaches
// them as comment blocks before each dtype line.
pub fn to_yaml(tree: &DocTree) -> Value {
    let mut m = Mapping::new();
    for (key, node) in tree {
        let v = match node {
            DocNode::Scope(inner) => to_yaml(inner),
            DocNode::Leaf { value, dtype, .. } => {
                let mut leaf = Mapping::new();
                leaf.insert(
                    Value::String("dtype".into()),
                    Value::String(dtype.tag().into()),
                );
                leaf.insert(Value::String("value".into()), value_to_yaml(value));
                Value::Mapping(leaf)
            }
        };
        m.insert(Value::String(key.clone()), v);
    }
    Value::Mapping(m)
}

pub fn from_yaml(value: &Value) -> Result<DocTree> {
    match value {
        Value::Null => Ok(DocTree::new()),
        Value::Mapping(m) => mapping_to_tree(m),
        other => Err(ParamError::Document {
            detail: format!("document root must be a mapping, got {}", yaml_kind(other)),
        }),
    }
}

fn mapping_to_tree(m: &Mapping) -> Result<DocTree> {
    let mut out = DocTree::new();
    for (k, v) in m {
        let key = k.as_str().ok_or_else(|| ParamError::Document {
            detail: format!("mapping keys must be strings, got {}", yaml_kind(k)),
        })?;
        let node = match v {
            Value::Mapping(inner) if is_leaf(inner) => leaf_from_mapping(key, inner)?,
            Value::Mapping(inner) => DocNode::Scope(mapping_to_tree(inner)?),
            other => {
                return Err(ParamError::Document {
                    detail: format!(
                        "entry `{key}` must be a mapping, got {}",
                        yaml_kind(other)
                    ),
                })
            }
        };
        out.insert(key.to_string(), node);
    }
    Ok(out)
}

fn is_leaf(m: &Mapping) -> bool {
    str_entry(m, "value").is_some() && str_entry(m, "dtype").is_some()
}

fn leaf_from_mapping(key: &str, m: &Mapping) -> Result<DocNode> {
    let tag = match str_entry(m, "dtype") {
        Some(Value::String(s)) => s.as_str(),
        _ => {
            return Err(ParamError::Document {
                detail: format!("dtype of `{key}` must be a string tag"),
            })
        }
    };
    let dtype = DType::from_tag(tag).ok_or_else(|| ParamError::Document {
        detail: format!("unknown dtype tag `{tag}` on `{key}`"),
    })?;
    let raw = match str_entry(m, "value") {
        Some(v) => yaml_to_value(v)?,
        None => {
            return Err(ParamError::Document {
                detail: format!("entry `{key}` lacks a value"),
            })
        }
    };
    let value = value::coerce(raw, dtype)?;
    let desc = match str_entry(m, "desc") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(ParamError::Document {
                detail: format!("desc of `{key}` must be a string, got {}", yaml_kind(other)),
            })
        }
        None => String::new(),
    };
    Ok(DocNode::Leaf { value, dtype, desc })
}

fn str_entry<'a>(m: &'a Mapping, key: &str) -> Option<&'a Value> {
    m.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

pub fn value_to_yaml(v: &ParamValue) -> Value {
    match v {
        ParamValue::Int(i) => Value::Number((*i).into()),
        ParamValue::Float(x) => Value::Number(serde_yaml::Number::from(*x)),
        ParamValue::Str(s) => Value::String(s.clone()),
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Seq(xs) | ParamValue::Tuple(xs) => {
            Value::Sequence(xs.iter().map(value_to_yaml).collect())
        }
        ParamValue::Map(kvs) => {
            let mut m = Mapping::new();
            for (k, v) in kvs {
                m.insert(Value::String(k.clone()), value_to_yaml(v));
            }
            Value::Mapping(m)
        }
    }
}

pub fn yaml_to_value(v: &Value) -> Result<ParamValue> {
    match v {
        Value::Bool(b) => Ok(ParamValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ParamValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(ParamValue::Float(f))
            } else {
                Err(ParamError::Document {
                    detail: format!("number {n} is out of range"),
                })
            }
        }
        Value::String(s) => Ok(ParamValue::Str(s.clone())),
        Value::Sequence(xs) => Ok(ParamValue::Seq(
            xs.iter().map(yaml_to_value).collect::<Result<_>>()?,
        )),
        Value::Mapping(m) => {
            let mut kvs = Vec::new();
            for (k, v) in m {
                let key = k.as_str().ok_or_else(|| ParamError::Document {
                    detail: format!("mapping keys must be strings, got {}", yaml_kind(k)),
                })?;
                kvs.push((key.to_string(), yaml_to_value(v)?));
            }
            Ok(ParamValue::Map(kvs))
        }
        Value::Null => Err(ParamError::Document {
            detail: "null is not a supported parameter value".to_string(),
        }),
        Value::Tagged(_) => Err(ParamError::Document {
            detail: "tagged values are not supported".to_string(),
        }),
    }
}

fn yaml_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
