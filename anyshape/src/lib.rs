pub mod combos;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod results;
pub mod search;
pub mod set;

pub use combos::generate_combinations;
pub use config::{ScanMode, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use results::{EntryKind, Identity, MatchRecord};
pub use search::{run, RunReport};
pub use set::Set;
