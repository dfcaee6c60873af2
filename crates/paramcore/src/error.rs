use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParamError>;

// Every failure is fatal for the operation that raised it; there are no
// retry semantics. Callers decide whether KeyNotFound is fatal by choosing
// the reconciliation mode up front.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("unsupported syntax ({kind}): {detail}")]
    UnsupportedSyntax { kind: String, detail: String },

    #[error("unsupported declared type `{dtype}`")]
    UnsupportedType { dtype: String },

    #[error("declared type `{dtype}` does not fit value {value}")]
    DTypeMismatch { dtype: String, value: String },

    #[error("parameter `{key}` not found; known parameters: [{}]", known.join(", "))]
    KeyNotFound { key: String, known: Vec<String> },

    #[error("module `{path}` not found under search folders {searched:?}")]
    ModuleNotFound { path: String, searched: Vec<PathBuf> },

    #[error("module `{path}` is ambiguous; candidates: {matches:?}")]
    AmbiguousModule { path: String, matches: Vec<PathBuf> },

    #[error("malformed directive: {line}")]
    MalformedDirective { line: String },

    #[error("more than one derive directive in a single unit")]
    MultipleDeriveDirectives,

    #[error("cyclic include of `{path}` (resolution stack: {})", stack.join(" -> "))]
    CyclicInclude { path: String, stack: Vec<String> },

    #[error("version mismatch: source declares {source_version}, document declares {document}")]
    VersionMismatch {
        source_version: String,
        document: String,
    },

    #[error("malformed document: {detail}")]
    Document { detail: String },

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
