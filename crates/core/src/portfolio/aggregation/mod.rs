mod aggregation_model;
mod aggregation_service;


pub use aggregation_model::{AggregationResult, ResolvedHolding};
pub use aggregation_service::{PortfolioAggregationService, PortfolioAggregationServiceTrait};
