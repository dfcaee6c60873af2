pub mod doc;
pub mod error;
pub mod event;
pub mod reconcile;
pub mod record;
pub mod scope;
pub mod value;
pub mod yamlfmt;

pub use doc::{DocNode, DocTree};
pub use error::{ParamError, Result};
pub use event::{Event, EventLog, Stage};
pub use reconcile::MatchMode;
pub use record::{ModuleInclude, NamedParam, ParamRecord};
pub use value::{DType, ParamValue};
