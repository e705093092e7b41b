//! Importers — turn vendor-exported files into identity records.
//!
//! Each vendor format implements [`IdentityParser`]. Parsing never
//! touches the store; [`import_into`] is the separate ingestion step.

pub mod iam_csv;

pub use iam_csv::IamCsvParser;

use crate::error::Result;
use crate::identity::{Identity, IdentityFields};
use crate::storage::IdentityStore;

/// A one-shot parser for one vendor file format.
pub trait IdentityParser {
    /// Parse the source into identity field mappings, in file order.
    fn parse(&self) -> Result<Vec<IdentityFields>>;

    /// Parse the source and construct an `Identity` from each mapping.
    fn identities(&self) -> Result<Vec<Identity>> {
        Ok(self
            .parse()?
            .into_iter()
            .map(Identity::from_fields)
            .collect())
    }
}

/// Parse with `parser` and register every record in `store`, saving once.
///
/// Returns how many identities were newly registered.
///
/// # Errors
///
/// Returns any parse error before the store is touched, otherwise any
/// error from [`IdentityStore::add_identities`].
pub fn import_into<P>(store: &mut IdentityStore, parser: &P) -> Result<usize>
where
    P: IdentityParser + ?Sized,
{
    let identities = parser.identities()?;
    store.add_identities(identities)
}
