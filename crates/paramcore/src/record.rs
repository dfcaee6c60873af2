use std::path::PathBuf;

use crate::scope;
use crate::value::{DType, ParamValue};

// Value semantics throughout: records are replaced wholesale during
// reconciliation, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRecord {
    pub value: ParamValue,
    pub dtype: DType,
    pub scope: String,
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedParam {
    pub name: String,
    pub record: ParamRecord,
}

impl NamedParam {
    // the unique reconciliation key within one source unit
    pub fn full_name(&self) -> String {
        scope::join(&self.record.scope, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInclude {
    // local name the include is bound to in the including unit
    pub name: String,
    // logical dotted path of the target unit
    pub path: String,
    // scope prefix applied to the target's parameters; empty = none
    pub scope: String,
}

impl ModuleInclude {
    pub fn full_name(&self) -> String {
        scope::join(&self.path, &self.name)
    }

    pub fn rel_path(&self) -> PathBuf {
        unit_rel_path(&self.path)
    }
}

// "a.b.c" -> "a/b/c.py"
pub fn unit_rel_path(dotted: &str) -> PathBuf {
    let mut p: PathBuf = dotted.split('.').collect();
    p.set_extension("py");
    p
}
