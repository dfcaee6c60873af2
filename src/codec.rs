//! Conversion between marker call expressions and parameter records.

use paramcore::value::{coerce, DType, ParamValue};
use paramcore::{ModuleInclude, NamedParam, ParamError, ParamRecord, Result};
use pylang::Expr;

use crate::markers::MarkerConfig;

/// Reads the literal subset out of an expression. Names decode to their
/// identifier text, attribute chains to a dotted string, subscripts to
/// their base; calls and anything unparsed are rejected.
pub fn decode(expr: &Expr) -> Result<ParamValue> {
    match expr {
        Expr::Int(v) => Ok(ParamValue::Int(*v)),
        Expr::Float(v) => Ok(ParamValue::Float(*v)),
        Expr::Str(s) => Ok(ParamValue::Str(s.clone())),
        Expr::Bool(b) => Ok(ParamValue::Bool(*b)),
        Expr::Name(n) => Ok(ParamValue::Str(n.clone())),
        Expr::Attribute { .. } => Ok(ParamValue::Str(dotted_name(expr)?)),
        Expr::Subscript { base, .. } => decode(base),
        Expr::Tuple(xs) => Ok(ParamValue::Tuple(decode_elements(xs)?)),
        Expr::List(xs) => Ok(ParamValue::Seq(decode_elements(xs)?)),
        Expr::Dict(kvs) => {
            let mut out = Vec::with_capacity(kvs.len());
            for (k, v) in kvs {
                let key = match decode(k)? {
                    ParamValue::Str(s) => s,
                    other => {
                        return Err(ParamError::UnsupportedSyntax {
                            kind: k.kind_name().to_string(),
                            detail: format!("mapping key {other} is not a string"),
                        })
                    }
                };
                out.push((key, decode(v)?));
            }
            Ok(ParamValue::Map(out))
        }
        other => Err(unsupported(other, "cannot be read as a parameter value")),
    }
}

fn decode_elements(xs: &[Expr]) -> Result<Vec<ParamValue>> {
    xs.iter().map(decode).collect()
}

fn dotted_name(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Name(n) => Ok(n.clone()),
        Expr::Attribute { base, attr } => Ok(format!("{}.{}", dotted_name(base)?, attr)),
        other => Err(unsupported(other, "cannot appear inside a dotted reference")),
    }
}

/// Inverse of [`decode`] for the literal subset. Container elements encode
/// with their own inferred type; a `set` declaration has no source form.
pub fn encode(value: &ParamValue, dtype: DType) -> Result<Expr> {
    match (dtype, value) {
        (DType::Int, ParamValue::Int(v)) => Ok(Expr::Int(*v)),
        (DType::Float, ParamValue::Float(v)) => Ok(Expr::Float(*v)),
        (DType::Str, ParamValue::Str(s)) => Ok(Expr::Str(s.clone())),
        (DType::Bool, ParamValue::Bool(b)) => Ok(Expr::Bool(*b)),
        (DType::List, ParamValue::Seq(xs)) => Ok(Expr::List(encode_elements(xs)?)),
        (DType::Tuple, ParamValue::Tuple(xs)) => Ok(Expr::Tuple(encode_elements(xs)?)),
        (DType::Dict, ParamValue::Map(kvs)) => {
            let mut out = Vec::with_capacity(kvs.len());
            for (k, v) in kvs {
                out.push((Expr::Str(k.clone()), encode(v, DType::infer(v))?));
            }
            Ok(Expr::Dict(out))
        }
        (DType::Set, _) => Err(ParamError::UnsupportedType {
            dtype: DType::Set.tag().to_string(),
        }),
        (dtype, value) => Err(ParamError::DTypeMismatch {
            dtype: dtype.tag().to_string(),
            value: value.to_string(),
        }),
    }
}

fn encode_elements(xs: &[ParamValue]) -> Result<Vec<Expr>> {
    xs.iter().map(|x| encode(x, DType::infer(x))).collect()
}

/// Renders a record as a live marker call,
/// `PyParam(value=1.0, dtype='float', scope='b/matmul', desc='')`.
/// The output re-scans into an equal record.
pub fn encode_full_record(record: &ParamRecord, markers: &MarkerConfig) -> Result<Expr> {
    Ok(Expr::Call {
        func: Box::new(Expr::Name(markers.param.clone())),
        args: Vec::new(),
        kwargs: vec![
            ("value".to_string(), encode(&record.value, record.dtype)?),
            (
                "dtype".to_string(),
                Expr::Str(record.dtype.tag().to_string()),
            ),
            ("scope".to_string(), Expr::Str(record.scope.clone())),
            ("desc".to_string(), Expr::Str(record.desc.clone())),
        ],
    })
}

pub fn encode_include(include: &ModuleInclude, markers: &MarkerConfig) -> Expr {
    Expr::Call {
        func: Box::new(Expr::Name(markers.include.clone())),
        args: Vec::new(),
        kwargs: vec![
            ("path".to_string(), Expr::Str(include.path.clone())),
            ("scope".to_string(), Expr::Str(include.scope.clone())),
        ],
    }
}

/// Builds a named record from a `PyParam(...)` call. Positional order is
/// `value, dtype, scope, desc`; keywords are accepted for all four. The
/// declared type may be a bare type name or a string tag.
pub fn param_from_call(name: &str, call: &Expr) -> Result<NamedParam> {
    let slots = arg_slots(name, call, &["value", "dtype", "scope", "desc"])?;
    let value_expr = slots[0].ok_or_else(|| ParamError::UnsupportedSyntax {
        kind: "call".to_string(),
        detail: format!("`{name}` declaration lacks a value argument"),
    })?;
    let raw = decode(value_expr)?;
    let dtype = match slots[1] {
        None => DType::infer(&raw),
        Some(e) => dtype_from_expr(e)?,
    };
    let value = coerce(raw, dtype)?;
    let scope = optional_string("scope", slots[2])?;
    let desc = optional_string("desc", slots[3])?;
    Ok(NamedParam {
        name: name.to_string(),
        record: ParamRecord {
            value,
            dtype,
            scope,
            desc,
        },
    })
}

/// Builds a module include from an `IncludeModule(path, scope)` call.
pub fn include_from_call(name: &str, call: &Expr) -> Result<ModuleInclude> {
    let slots = arg_slots(name, call, &["path", "scope"])?;
    let path_expr = slots[0].ok_or_else(|| ParamError::UnsupportedSyntax {
        kind: "call".to_string(),
        detail: format!("`{name}` declaration lacks a path argument"),
    })?;
    let path = string_value("path", path_expr)?;
    let scope = optional_string("scope", slots[1])?;
    Ok(ModuleInclude {
        name: name.to_string(),
        path,
        scope,
    })
}

// Lays positionals and keywords over the declared argument names, in order.
fn arg_slots<'a, const N: usize>(
    name: &str,
    call: &'a Expr,
    params: &[&str; N],
) -> Result<[Option<&'a Expr>; N]> {
    let (args, kwargs) = match call {
        Expr::Call { args, kwargs, .. } => (args, kwargs),
        other => return Err(unsupported(other, "expected a marker call")),
    };
    if args.len() > N {
        return Err(ParamError::UnsupportedSyntax {
            kind: "call".to_string(),
            detail: format!(
                "`{name}` declaration takes at most {N} arguments, got {}",
                args.len()
            ),
        });
    }
    let mut slots = [None; N];
    for (i, a) in args.iter().enumerate() {
        slots[i] = Some(a);
    }
    for (kw, v) in kwargs {
        let idx = match params.iter().position(|p| *p == kw.as_str()) {
            Some(idx) => idx,
            None => {
                return Err(ParamError::UnsupportedSyntax {
                    kind: "call".to_string(),
                    detail: format!("unknown keyword `{kw}` in `{name}` declaration"),
                })
            }
        };
        if slots[idx].is_some() {
            return Err(ParamError::UnsupportedSyntax {
                kind: "call".to_string(),
                detail: format!("argument `{kw}` of `{name}` given more than once"),
            });
        }
        slots[idx] = Some(v);
    }
    Ok(slots)
}

fn dtype_from_expr(expr: &Expr) -> Result<DType> {
    let tag = match expr {
        Expr::Name(n) => n.as_str(),
        Expr::Str(s) => s.as_str(),
        other => return Err(unsupported(other, "cannot name a declared type")),
    };
    DType::from_tag(tag).ok_or_else(|| ParamError::UnsupportedType {
        dtype: tag.to_string(),
    })
}

fn optional_string(what: &str, expr: Option<&Expr>) -> Result<String> {
    match expr {
        None => Ok(String::new()),
        Some(e) => string_value(what, e),
    }
}

fn string_value(what: &str, expr: &Expr) -> Result<String> {
    match decode(expr)? {
        ParamValue::Str(s) => Ok(s),
        other => Err(ParamError::UnsupportedSyntax {
            kind: expr.kind_name().to_string(),
            detail: format!("`{what}` must be a string, got {other}"),
        }),
    }
}

fn unsupported(expr: &Expr, detail: &str) -> ParamError {
    ParamError::UnsupportedSyntax {
        kind: expr.kind_name().to_string(),
        detail: detail.to_string(),
    }
}
