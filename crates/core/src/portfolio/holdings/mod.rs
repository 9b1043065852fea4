mod holdings_model;

pub use holdings_model::{AssetClass, Holding, HoldingMetadata};
