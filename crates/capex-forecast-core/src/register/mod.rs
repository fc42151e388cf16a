pub mod asset;
pub mod export;
pub mod filter;

pub use asset::{enrich, enrich_with_report, AssetLine, EnrichedAssetLine, EnrichmentReport};
pub use filter::AssetFilter;
