/// Set code and collector number read off a card. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedIdentifier {
	pub set_code: Option<String>,
	pub collector_number: Option<String>,
}

impl ParsedIdentifier {
	pub fn new(set_code: impl Into<String>, collector_number: impl Into<String>) -> Self {
		Self {
			set_code: Some(set_code.into()),
			collector_number: Some(collector_number.into()),
		}
	}

	pub fn is_complete(&self) -> bool {
		self.set_code.is_some() && self.collector_number.is_some()
	}

	/// Catalog key, available only when both parts were read.
	pub fn key(&self) -> Option<String> {
		match (&self.set_code, &self.collector_number) {
			(Some(set), Some(number)) => Some(crate::card_key(set, number)),
			_ => None,
		}
	}
}

impl std::fmt::Display for ParsedIdentifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"{} {}",
			self.set_code.as_deref().unwrap_or("?"),
			self.collector_number.as_deref().unwrap_or("?"),
		)
	}
}
