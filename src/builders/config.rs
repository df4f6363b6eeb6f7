//! Root document builder: loads every referenced sub-document.

use crate::config_loader::{load_document, resolve_relative};
use crate::context::BuildContext;
use crate::domain::Domain;
use crate::entry::{self, Entry};
use crate::error::BuildError;
use log::debug;

/// Every domain key of the root document must name a sub-document,
/// resolved against the root document's directory.
pub fn build_config(root: &Entry, ctx: &mut BuildContext<'_>) -> Result<(), BuildError> {
    for domain in Domain::sub_documents() {
        let Some(key) = domain.document_key() else {
            continue;
        };
        let reference = entry::required_str(root, key)?;
        let path = resolve_relative(ctx.config_path(), reference);
        debug!("{} document: {:?}", domain, path);
        let document = load_document(&path)?;
        ctx.insert_document(domain, document)?;
    }
    Ok(())
}
