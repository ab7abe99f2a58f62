pub mod error;
pub mod fit;
pub mod hardware;
pub mod models;

pub use error::CatalogError;
pub use fit::{
    ContextFit, MatchFilters, MatchResult, MatchTier, SortMode, SpeedClass, TierGroups,
    determine_tier, match_models, rank_matches, sort_matches,
};
pub use hardware::{Hardware, HardwareCategory, HardwareDatabase, parse_memory_size};
pub use models::{
    Architecture, Category, CatalogQuery, JapaneseSupport, LlmModel, ModelDatabase, QuantLevel,
    SizeRange,
};
