pub mod config;
pub mod error;
pub mod db;
pub mod source;
pub mod graph;
pub mod suggest;
pub mod http;

pub use config::Config;
pub use error::{ExploreError, Result};
pub use graph::{GraphBuilder, GraphResult, ExpansionLimits};
pub use source::{QueryMode, RawRelation, RelationSource};
