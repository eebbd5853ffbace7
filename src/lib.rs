pub mod config;
pub mod error;
pub mod extract;
pub mod note;
pub mod oracle;
pub mod report;
pub mod search;
pub mod snapshot;

pub use config::Config;
pub use error::{FrontierError, Result};
pub use oracle::{HttpOracle, RelationOracle, StaticOracle};
pub use search::{Goal, Kind, Node, SearchEngine, SearchOutcome, SearchState};
