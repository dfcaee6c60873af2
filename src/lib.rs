pub mod cli;
pub mod codec;
pub mod compile;
pub mod compose;
pub mod lookup;
pub mod markers;
pub mod rewrite;
pub mod scan;

pub use markers::MarkerConfig;
