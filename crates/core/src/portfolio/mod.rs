pub mod aggregation;
pub mod holdings;

pub use aggregation::{
    AggregationResult, PortfolioAggregationService, PortfolioAggregationServiceTrait,
    ResolvedHolding,
};
pub use holdings::{AssetClass, Holding, HoldingMetadata};
