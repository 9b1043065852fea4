//! Database model for security reference data.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use tallyfolio_core::identifiers::SecurityReference;

#[derive(Queryable, Selectable, Insertable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::security_references)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct SecurityReferenceDB {
    pub symbol: String,
    pub isin: Option<String>,
    pub cusip: Option<String>,
    pub sedol: Option<String>,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub updated_at: String,
}

impl From<SecurityReferenceDB> for SecurityReference {
    fn from(db: SecurityReferenceDB) -> Self {
        Self {
            symbol: db.symbol,
            isin: db.isin,
            cusip: db.cusip,
            sedol: db.sedol,
            name: db.name,
            exchange: db.exchange,
        }
    }
}
