use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};

use crate::main_lib::AppState;
use tallyfolio_core::identifiers::SecurityReference;
use tallyfolio_core::Holding;

#[derive(Parser, Debug)]
#[command(
    name = "tallyfolio-cli",
    version,
    about = "Reconciles holdings reported by several brokers into one portfolio",
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Deduplicate a JSON array of holdings and value it in the base currency
    Aggregate {
        /// Path to the holdings JSON file
        holdings_file: PathBuf,
        /// Overrides the configured base currency
        base_currency: Option<String>,
    },
    /// Convert an amount between two currencies
    #[command(allow_negative_numbers = true)]
    Convert {
        amount: Decimal,
        from: String,
        to: String,
    },
    /// Delete expired exchange rates from both cache levels
    CleanupRates,
    /// Load security reference rows from a JSON file
    ImportReferences {
        /// Path to the references JSON file
        references_file: PathBuf,
    },
}

impl Command {
    /// Runs the command and returns the JSON document to print.
    pub async fn run(self, state: &AppState) -> anyhow::Result<serde_json::Value> {
        match self {
            Command::Aggregate {
                holdings_file,
                base_currency,
            } => {
                let holdings: Vec<Holding> = read_json(&holdings_file)?;
                let base = base_currency.unwrap_or_else(|| state.settings.base_currency.clone());
                let result = state.aggregation_service.aggregate(&holdings, &base).await?;
                Ok(serde_json::to_value(result)?)
            }
            Command::Convert { amount, from, to } => {
                let conversion = state.fx_service.convert_amount(amount, &from, &to).await;
                Ok(serde_json::to_value(conversion)?)
            }
            Command::CleanupRates => {
                let deleted = state.fx_service.cleanup_expired_rates().await?;
                Ok(serde_json::json!({ "deleted": deleted }))
            }
            Command::ImportReferences { references_file } => {
                let references: Vec<SecurityReference> = read_json(&references_file)?;
                let written = state
                    .security_references
                    .upsert_references(references)
                    .await?;
                Ok(serde_json::json!({ "imported": written }))
            }
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}
