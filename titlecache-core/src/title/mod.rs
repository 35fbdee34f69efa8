//! Title selection, cache population and lookup

pub mod model;
pub mod populate;
pub mod predicates;
pub mod resolve;
pub mod stats;

pub use model::{rank, SubjectTitleEntry, TitleCandidate};
pub use populate::{PopulateSummary, Populator};
pub use predicates::{TitlePredicateList, DEFAULT_TITLE_PREDICATES};
pub use resolve::{ResolvedTitles, Resolver};
pub use stats::{GraphStats, StatsChange};
