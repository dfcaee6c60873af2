use std::fmt;

use crate::error::{ParamError, Result};

// Runtime shape of a parameter value. Mapping entries keep insertion order;
// keys are always strings.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Seq(Vec<ParamValue>),
    Tuple(Vec<ParamValue>),
    Map(Vec<(String, ParamValue)>),
}

impl ParamValue {
    pub fn shape_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "str",
            ParamValue::Bool(_) => "bool",
            ParamValue::Seq(_) => "list",
            ParamValue::Tuple(_) => "tuple",
            ParamValue::Map(_) => "dict",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{}", float_text(*v)),
            ParamValue::Str(s) => write!(f, "'{s}'"),
            ParamValue::Bool(true) => write!(f, "True"),
            ParamValue::Bool(false) => write!(f, "False"),
            ParamValue::Seq(xs) => {
                write!(f, "[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            ParamValue::Tuple(xs) => {
                write!(f, "(")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                if xs.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            ParamValue::Map(kvs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in kvs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{k}': {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int,
    Str,
    Float,
    Tuple,
    List,
    Dict,
    Set,
    Bool,
}

impl DType {
    pub fn tag(&self) -> &'static str {
        match self {
            DType::Int => "int",
            DType::Str => "str",
            DType::Float => "float",
            DType::Tuple => "tuple",
            DType::List => "list",
            DType::Dict => "dict",
            DType::Set => "set",
            DType::Bool => "bool",
        }
    }

    pub fn from_tag(tag: &str) -> Option<DType> {
        match tag {
            "int" => Some(DType::Int),
            "str" => Some(DType::Str),
            "float" => Some(DType::Float),
            "tuple" => Some(DType::Tuple),
            "list" => Some(DType::List),
            "dict" => Some(DType::Dict),
            "set" => Some(DType::Set),
            "bool" => Some(DType::Bool),
            _ => None,
        }
    }

    pub fn infer(value: &ParamValue) -> DType {
        match value {
            ParamValue::Int(_) => DType::Int,
            ParamValue::Float(_) => DType::Float,
            ParamValue::Str(_) => DType::Str,
            ParamValue::Bool(_) => DType::Bool,
            ParamValue::Seq(_) => DType::List,
            ParamValue::Tuple(_) => DType::Tuple,
            ParamValue::Map(_) => DType::Dict,
        }
    }

}

// Load-time coercion: the declared type reshapes the incoming value, or the
// pair is rejected. Containers convert between sequence and tuple without
// touching their elements; numeric strings parse into numbers. A `set`
// declaration keeps the sequence it arrived as.
pub fn coerce(value: ParamValue, dtype: DType) -> Result<ParamValue> {
    let out = match (dtype, value) {
        (DType::Int, ParamValue::Int(v)) => ParamValue::Int(v),
        (DType::Int, ParamValue::Float(v)) => ParamValue::Int(v as i64),
        (DType::Int, ParamValue::Bool(b)) => ParamValue::Int(b as i64),
        (DType::Int, ParamValue::Str(s)) => match s.trim().parse::<i64>() {
            Ok(v) => ParamValue::Int(v),
            Err(_) => return Err(mismatch(dtype, &ParamValue::Str(s))),
        },
        (DType::Float, ParamValue::Float(v)) => ParamValue::Float(v),
        (DType::Float, ParamValue::Int(v)) => ParamValue::Float(v as f64),
        (DType::Float, ParamValue::Bool(b)) => {
            ParamValue::Float(if b { 1.0 } else { 0.0 })
        }
        (DType::Float, ParamValue::Str(s)) => match s.trim().parse::<f64>() {
            Ok(v) => ParamValue::Float(v),
            Err(_) => return Err(mismatch(dtype, &ParamValue::Str(s))),
        },
        (DType::Str, ParamValue::Str(s)) => ParamValue::Str(s),
        (DType::Str, ParamValue::Int(v)) => ParamValue::Str(v.to_string()),
        (DType::Str, ParamValue::Float(v)) => ParamValue::Str(float_text(v)),
        (DType::Str, ParamValue::Bool(b)) => {
            ParamValue::Str(if b { "True" } else { "False" }.to_string())
        }
        (DType::Bool, ParamValue::Bool(b)) => ParamValue::Bool(b),
        (DType::Bool, ParamValue::Int(0)) => ParamValue::Bool(false),
        (DType::Bool, ParamValue::Int(1)) => ParamValue::Bool(true),
        (DType::List | DType::Set, ParamValue::Seq(xs)) => ParamValue::Seq(xs),
        (DType::List | DType::Set, ParamValue::Tuple(xs)) => ParamValue::Seq(xs),
        (DType::Tuple, ParamValue::Tuple(xs)) => ParamValue::Tuple(xs),
        (DType::Tuple, ParamValue::Seq(xs)) => ParamValue::Tuple(xs),
        (DType::Dict, ParamValue::Map(kvs)) => ParamValue::Map(kvs),
        (dtype, value) => return Err(mismatch(dtype, &value)),
    };
    Ok(out)
}

fn mismatch(dtype: DType, value: &ParamValue) -> ParamError {
    ParamError::DTypeMismatch {
        dtype: dtype.tag().to_string(),
        value: value.to_string(),
    }
}

// Integral floats keep their fractional point, matching how the host
// language prints them.
pub fn float_text(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
