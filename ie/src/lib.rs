//! Physical card identification.
//!
//! A camera frame goes through boundary detection, perspective rectification,
//! identifier-region extraction, text recognition and token classification, and
//! the resulting `(set code, collector number)` key is looked up in a shared
//! [`CatalogIndex`].

use std::sync::Arc;

use catalog::CatalogIndex;

mod buffer;
pub use buffer::*;
mod config;
pub use config::ScanConfig;
mod detect;
pub use detect::{adaptive_threshold_inv, detect};
mod error;
pub use error::ScanError;
mod geometry;
pub use geometry::Quad;
mod ocr;
pub use ocr::*;
mod pipeline;
pub use pipeline::{Outcome, ScanResult, ScanTrace};
mod rectify;
pub use rectify::{CanonicalCardImage, canonical_size, rectify};
mod region;
pub use region::{crop_identifier_region, enhance_contrast, extract_identifier_region};
pub mod tokens;
pub use tokens::CandidatePolicy;

/// Card scanner: configuration, a recognizer and the catalog it resolves against.
///
/// Scans take `&self` and keep no state between calls; the catalog is only read.
/// With a `Sync` recognizer one scanner can serve several threads.
pub struct Ie<R = Box<dyn Recognizer>> {
	config: ScanConfig,
	recognizer: R,
	catalog: Arc<CatalogIndex>,
}

impl<R: Recognizer> Ie<R> {
	pub fn new(config: ScanConfig, recognizer: R, catalog: Arc<CatalogIndex>) -> Self {
		Self {
			config,
			recognizer,
			catalog,
		}
	}

	pub fn config(&self) -> &ScanConfig {
		&self.config
	}

	/// Identify the card in a frame. `Ok` with zero confidence means no card was matched.
	pub fn scan(&self, buffer: &PixelBuffer) -> Result<ScanResult, ScanError> {
		pipeline::scan(buffer, &self.config, &self.recognizer, &self.catalog)
	}

	/// Like [`Ie::scan`], also returning the intermediate images and text.
	pub fn scan_traced(&self, buffer: &PixelBuffer) -> Result<(ScanResult, ScanTrace), ScanError> {
		pipeline::scan_traced(buffer, &self.config, &self.recognizer, &self.catalog)
	}
}
