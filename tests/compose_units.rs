//! Multi-file composition: source inclusion, module encapsulation, derive.

use std::fs;
use std::path::{Path, PathBuf};

use paramcore::{EventLog, ParamError, Stage};
use pyparams::compose::compose_source;
use pyparams::markers::MarkerConfig;

const FUN_MODULE: &str = r#"from pyparams import PyParam
import numpy as np


def matmul(matrix: np.ndarray, x: np.ndarray) -> np.ndarray:
    """matrix multiplication with magic"""
    offset: float = PyParam(1.0, float, "matmul")
    alpha: float = PyParam(1.0, float, "matmul")
    return alpha * matrix @ x + offset
"#;

const FUN2_MODULE: &str = r#"from pyparams import PyParam
import numpy as np


def matmul(matrix: np.ndarray, x: np.ndarray):
    """matrix multiplication with magic"""
    bias: float = PyParam(1.1, float, "matmul")
    beta: float = PyParam(1.2, float, "matmul")
    return beta * matrix @ x + bias
"#;

const FUN_MODULE_IMPORT: &str = r#"from pyparams import *
import numpy as np

matmul1: Module = IncludeModule("fun_module", scope="a")
matmul2: Module = IncludeModule("fun_module", scope="b")
some_param: int = PyParam(4, scope="some_param")

W = np.random.rand(10, 10)
X = np.random.rand(10, 1)
Y = matmul1.matmul(W, X)
Y = matmul2.matmul(W, Y)
"#;

fn sample_dir() -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "fun_module", FUN_MODULE);
    write_unit(dir.path(), "fun2_module", FUN2_MODULE);
    write_unit(dir.path(), "fun_module_import", FUN_MODULE_IMPORT);
    let roots = vec![dir.path().to_path_buf()];
    (dir, roots)
}

fn write_unit(root: &Path, name: &str, text: &str) {
    fs::write(root.join(format!("{name}.py")), text).unwrap();
}

#[test]
fn source_inclusion_splices_units_with_banners() {
    let (_dir, roots) = sample_dir();
    let src = r#"from pyparams import PyParam, Module, IncludeModule, IncludeSource

some_global1: float = PyParam(1.0, float, "global_const")

matmul_module: Module = IncludeModule("fun_module", scope="matmul_fun")

# this code will be included here
IncludeSource("fun_module")


def in_func():
    # this code will be included here
    IncludeSource(path="fun2_module")
    local1: float = PyParam(1.0, float, "local_const")
    local1 = 0


some_global2: float = PyParam(1.0, float, "global_const")
"#;
    let markers = MarkerConfig::default();
    let mut events = EventLog::new();
    let code = compose_source(src, &roots, &markers, &mut events).unwrap();

    assert!(!code.contains("IncludeSource("));
    assert!(code.contains("PyParams: auto include source of `fun_module`"));
    assert!(code.contains("INCLUDE END OF `fun_module`"));
    // the module-level include sits at column zero
    assert!(code.contains("\ndef matmul(matrix: np.ndarray, x: np.ndarray) -> np.ndarray:"));
    // the in-function include is shifted to the directive's column
    assert!(code.contains("        PyParams: auto include source of `fun2_module`"));
    assert!(code.contains("    def matmul(matrix: np.ndarray, x: np.ndarray):"));
    assert!(code.contains("        bias: float = PyParam(1.1, float, \"matmul\")"));
    assert!(code.contains("    return beta * matrix @ x + bias"));

    // the module include became an encapsulated unit with rescoped markers
    assert!(code.contains("matmul_module: Module = _pyparam_module__matmul_module()"));
    assert!(code.contains(
        "offset: float = PyParam(value=1.0, dtype='float', \
         scope='matmul_fun/matmul', desc='')"
    ));
    assert!(code.contains("from pyparams import Module\n"));
    assert!(events.events().iter().any(|e| e.stage == Stage::IncludeSource));
}

#[test]
fn module_includes_become_renamed_encapsulated_units() {
    let (_dir, roots) = sample_dir();
    let markers = MarkerConfig::default();
    let mut events = EventLog::new();
    let code = compose_source(FUN_MODULE_IMPORT, &roots, &markers, &mut events).unwrap();

    assert!(code.contains("class _pyparam_module__matmul1():"));
    assert!(code.contains("class _pyparam_module__matmul2():"));
    assert!(code.contains("matmul1: Module = _pyparam_module__matmul1()"));
    assert!(code.contains("matmul2: Module = _pyparam_module__matmul2()"));
    assert!(code.contains("    self.matmul = matmul"));
    // one unit instantiated twice under different scopes
    assert!(code.contains(
        "offset: float = PyParam(value=1.0, dtype='float', scope='a/matmul', desc='')"
    ));
    assert!(code.contains(
        "offset: float = PyParam(value=1.0, dtype='float', scope='b/matmul', desc='')"
    ));
    assert!(code.contains("auto import of `fun_module`"));
    assert!(code.contains("used by: `matmul2`"));
    assert!(!code.contains("IncludeModule"));
    // untouched statements of the including unit survive
    assert!(code.contains("Y = matmul2.matmul(W, Y)"));
}

#[test]
fn decorator_comments_rewrite_into_directives() {
    let (_dir, roots) = sample_dir();
    let src = r#"from pyparams import *
import numpy as np

# @import_pyparams_as_module("a")
import fun_module as matmul1
# @import_pyparams_as_module()
import fun_module as matmul2

# @import_pyparams_as_source()
from fun_module  import  *

some_param: int = PyParam(4, scope="some_param")
"#;
    let markers = MarkerConfig::default();
    let mut events = EventLog::new();
    let code = compose_source(src, &roots, &markers, &mut events).unwrap();

    assert!(code.contains("class _pyparam_module__matmul1():"));
    assert!(code.contains("matmul2: Module = _pyparam_module__matmul2()"));
    assert!(code.contains("scope='a/matmul'"));
    // the empty decorator argument keeps the unit unscoped
    assert!(code.contains("offset: float = PyParam(1.0, float, \"matmul\")"));
    assert!(code.contains("PyParams: auto include source of `fun_module`"));
    assert!(!code.contains("import fun_module as"));
}

#[test]
fn derive_replaces_base_includes_by_local_name() {
    let (dir, roots) = sample_dir();
    write_unit(
        dir.path(),
        "derive_module",
        r#"from pyparams import *

DeriveModule("fun_module_import")

matmul2: Module = ReplaceModule("fun2_module", scope="c")
"#,
    );
    let src = fs::read_to_string(dir.path().join("derive_module.py")).unwrap();
    let markers = MarkerConfig::default();
    let mut events = EventLog::new();
    let code = compose_source(&src, &roots, &markers, &mut events).unwrap();

    // matmul1 keeps the base unit's include, matmul2 takes the override
    assert!(code.contains("scope='a/matmul'"));
    assert!(code.contains("scope='c/matmul'"));
    assert!(code.contains("bias: float"));
    assert!(code.contains("beta: float"));
    assert!(code.contains("matmul1: Module = _pyparam_module__matmul1()"));
    assert!(code.contains("matmul2: Module = _pyparam_module__matmul2()"));
    assert!(!code.contains("DeriveModule"));
    assert!(!code.contains("ReplaceModule"));
    assert!(events
        .events()
        .iter()
        .any(|e| e.stage == Stage::Derive && e.detail.contains("fun2_module")));
}

#[test]
fn include_cycles_are_detected() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "unit_a", "IncludeSource('unit_b')\n");
    write_unit(dir.path(), "unit_b", "IncludeSource('unit_a')\n");
    let roots = vec![dir.path().to_path_buf()];
    let markers = MarkerConfig::default();
    let mut events = EventLog::new();
    let src = fs::read_to_string(dir.path().join("unit_a.py")).unwrap();
    let err = compose_source(&src, &roots, &markers, &mut events).unwrap_err();
    assert!(matches!(err, ParamError::CyclicInclude { .. }));
    assert!(err.to_string().contains("unit_b"));
}

#[test]
fn missing_units_abort_composition() {
    let dir = tempfile::tempdir().unwrap();
    let roots = vec![dir.path().to_path_buf()];
    let markers = MarkerConfig::default();
    let mut events = EventLog::new();
    let err = compose_source("IncludeSource('ghost')\n", &roots, &markers, &mut events)
        .unwrap_err();
    assert!(matches!(err, ParamError::ModuleNotFound { .. }));
}
