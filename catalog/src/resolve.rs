use crate::{CardRecord, CatalogIndex, ParsedIdentifier};

/// Resolve a parsed identifier against the catalog.
///
/// Matching is exact on the key: a hit has confidence 1.0, anything else
/// (missing part or unknown key) is `(None, 0.0)`.
pub fn resolve<'a>(parsed: &ParsedIdentifier, index: &'a CatalogIndex) -> (Option<&'a CardRecord>, f32) {
	let Some(key) = parsed.key() else {
		return (None, 0.0);
	};

	match index.get(&key) {
		Some(card) => (Some(card), 1.0),
		None => {
			log::debug!("no catalog entry for {key}");
			(None, 0.0)
		}
	}
}
