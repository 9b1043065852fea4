use async_trait::async_trait;

use super::identifiers_model::SecurityReference;
use crate::errors::Result;

/// Read-only access to security reference data.
///
/// Implementations may hit a database or a remote service; callers treat any
/// error like a miss.
#[async_trait]
pub trait SecurityReferenceLookup: Send + Sync {
    /// Looks up a security by its normalized symbol.
    async fn lookup_security(&self, symbol: &str) -> Result<Option<SecurityReference>>;
}

/// Lookup that never finds anything; identifiers come from holding metadata only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSecurityReferenceLookup;

#[async_trait]
impl SecurityReferenceLookup for NoOpSecurityReferenceLookup {
    async fn lookup_security(&self, _symbol: &str) -> Result<Option<SecurityReference>> {
        Ok(None)
    }
}
