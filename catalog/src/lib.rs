use std::{
	collections::HashMap,
	fs::File,
	io::{BufReader, Read},
	path::Path,
};

use anyhow::{Context, Result};

mod identifier;
pub use identifier::ParsedIdentifier;
mod resolve;
pub use resolve::resolve;

/// Market prices as published by the catalog source.
///
/// Prices are kept as the decimal strings the source uses; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prices {
	#[serde(default)]
	pub usd: Option<String>,
	#[serde(default)]
	pub usd_foil: Option<String>,
	#[serde(default)]
	pub eur: Option<String>,
}

/// A single printing of a card.
///
/// Unknown fields are ignored so a full bulk export deserializes directly.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CardRecord {
	pub id: String,
	pub name: String,
	/// Set code as published (usually lowercase, e.g. `mat`).
	pub set: String,
	#[serde(default)]
	pub set_name: Option<String>,
	pub collector_number: String,
	#[serde(default)]
	pub prices: Prices,
	#[serde(default)]
	pub image_uris: HashMap<String, String>,
}

impl CardRecord {
	pub fn key(&self) -> String {
		card_key(&self.set, &self.collector_number)
	}
}

/// Lookup key shared by index construction and resolution: `"{set}-{number}"` with the set lowercased.
pub fn card_key(set_code: &str, collector_number: &str) -> String {
	format!("{}-{}", set_code.to_lowercase(), collector_number)
}

/// Read-only mapping from [`card_key`] to card record.
///
/// Built once and shared between scans; nothing mutates it after construction.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
	cards: HashMap<String, CardRecord>,
	duplicates: usize,
}

impl CatalogIndex {
	/// Index records by key. Later records replace earlier ones with the same key.
	pub fn from_records(records: impl IntoIterator<Item = CardRecord>) -> Self {
		let mut cards = HashMap::new();
		let mut duplicates = 0;
		for card in records {
			let key = card.key();
			if let Some(prev) = cards.insert(key.clone(), card) {
				log::debug!("catalog key {key} seen twice; replacing {}", prev.id);
				duplicates += 1;
			}
		}

		if duplicates > 0 {
			log::warn!("catalog contained {duplicates} duplicate keys (last record wins)");
		}

		Self { cards, duplicates }
	}

	/// Parse a JSON array of card records.
	pub fn from_reader(reader: impl Read) -> Result<Self> {
		let records: Vec<CardRecord> = serde_json::from_reader(reader).context("Decode catalog JSON")?;
		Ok(Self::from_records(records))
	}

	/// Load a catalog file written by the sync collaborator.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let file = File::open(path).with_context(|| format!("Open catalog {}", path.display()))?;
		let index = Self::from_reader(BufReader::new(file))
			.with_context(|| format!("Parse catalog {}", path.display()))?;
		log::info!("loaded {} catalog entries from {}", index.len(), path.display());
		Ok(index)
	}

	pub fn get(&self, key: &str) -> Option<&CardRecord> {
		self.cards.get(key)
	}

	pub fn len(&self) -> usize {
		self.cards.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cards.is_empty()
	}

	/// Number of records dropped because a later record had the same key.
	pub fn duplicates(&self) -> usize {
		self.duplicates
	}
}

#[cfg(test)]
pub(crate) mod tests {
	use std::io::Write;

	use super::*;

	pub fn card(id: &str, set: &str, number: &str, name: &str) -> CardRecord {
		CardRecord {
			id: id.to_string(),
			name: name.to_string(),
			set: set.to_string(),
			set_name: None,
			collector_number: number.to_string(),
			prices: Prices::default(),
			image_uris: HashMap::new(),
		}
	}

	#[test]
	fn key_lowercases_set_only() {
		assert_eq!(card_key("MAT", "247"), "mat-247");
		assert_eq!(card_key("mat", "12a"), "mat-12a");
		assert_eq!(card_key("Wot", "10A"), "wot-10A");
	}

	#[test]
	fn duplicate_keys_keep_last_record() {
		let index = CatalogIndex::from_records([
			card("first", "mat", "247", "Old"),
			card("other", "wot", "10", "Other"),
			card("second", "MAT", "247", "New"),
		]);

		assert_eq!(index.len(), 2);
		assert_eq!(index.duplicates(), 1);
		assert_eq!(index.get("mat-247").map(|c| c.id.as_str()), Some("second"));
	}

	#[test]
	fn key_matches_any_set_case() {
		let index = CatalogIndex::from_records([card("a", "mat", "247", "Card")]);
		assert!(index.get(&card_key("MAT", "247")).is_some());
		assert!(index.get(&card_key("mat", "247")).is_some());
		assert!(index.get(&card_key("MAT", "248")).is_none());
	}

	#[test]
	fn loads_bulk_style_json_and_ignores_unknown_fields() {
		let json = r#"[
			{
				"object": "card",
				"id": "0000-1111",
				"name": "Example Card",
				"set": "mat",
				"set_name": "March of the Machine: The Aftermath",
				"collector_number": "247",
				"lang": "en",
				"prices": {"usd": "0.25", "usd_foil": null, "eur": "0.20", "tix": "0.01"},
				"image_uris": {"png": "https://example.invalid/card.png"}
			},
			{
				"id": "2222",
				"name": "Bare Card",
				"set": "wot",
				"collector_number": "10"
			}
		]"#;

		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(json.as_bytes()).unwrap();

		let index = CatalogIndex::load(file.path()).unwrap();
		assert_eq!(index.len(), 2);

		let card = index.get("mat-247").unwrap();
		assert_eq!(card.name, "Example Card");
		assert_eq!(card.prices.usd.as_deref(), Some("0.25"));
		assert_eq!(card.prices.usd_foil, None);
		assert_eq!(card.image_uris.get("png").map(String::as_str), Some("https://example.invalid/card.png"));

		let bare = index.get("wot-10").unwrap();
		assert_eq!(bare.set_name, None);
		assert_eq!(bare.prices, Prices::default());
	}

	#[test]
	fn load_reports_missing_file() {
		let err = CatalogIndex::load("/definitely/not/here/cards.json").unwrap_err();
		assert!(format!("{err:#}").contains("Open catalog"));
	}
}
