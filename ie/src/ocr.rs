//! Text recognition adapter.
//!
//! The pipeline only sees the [`Recognizer`] trait; engines plug in behind it.
//! With the `paddle` feature the crate ships [`PaddleOcr`], built on `ocr-rs`
//! (Rust PaddleOCR bindings). Tests use deterministic stubs.

use image::GrayImage;

use crate::ScanError;

/// Recognized lines, top to bottom. May be empty.
pub type RecognizedTextLines = Vec<String>;

/// Characters an engine is allowed to emit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Charset(String);

impl Charset {
    pub const UPPERCASE_DIGITS: &'static str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

    pub fn new(chars: impl Into<String>) -> Self {
        Self(chars.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(c)
    }

    /// Drop every character outside the set. Whitespace is kept as a token separator.
    pub fn filter(&self, text: &str) -> String {
        text.chars()
            .filter(|&c| c.is_whitespace() || self.contains(c))
            .collect()
    }

    /// Filter each line and drop the ones left empty.
    pub fn clean_lines<I, S>(&self, lines: I) -> RecognizedTextLines
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        lines
            .into_iter()
            .map(|line| self.filter(line.as_ref()).split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::new(Self::UPPERCASE_DIGITS)
    }
}

/// A text recognition capability.
///
/// Given the same pixels and charset an engine is expected to answer the same
/// lines. An engine that cannot run at all reports
/// [`ScanError::EngineUnavailable`]; unreadable input is just an empty result.
pub trait Recognizer {
    fn recognize(&self, image: &GrayImage, charset: &Charset) -> Result<RecognizedTextLines, ScanError>;
}

impl<R: Recognizer + ?Sized> Recognizer for &R {
    fn recognize(&self, image: &GrayImage, charset: &Charset) -> Result<RecognizedTextLines, ScanError> {
        (**self).recognize(image, charset)
    }
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn recognize(&self, image: &GrayImage, charset: &Charset) -> Result<RecognizedTextLines, ScanError> {
        (**self).recognize(image, charset)
    }
}

#[cfg(feature = "paddle")]
pub use paddle::PaddleOcr;

#[cfg(feature = "paddle")]
mod paddle {
    use std::path::Path;

    use anyhow::Context;
    use image::GrayImage;

    use super::{Charset, RecognizedTextLines, Recognizer};
    use crate::ScanError;

    /// Upscale crops shorter than this before recognition.
    const MIN_HEIGHT: u32 = 80;

    pub struct PaddleOcr {
        engine: ocr_rs::OcrEngine,
    }

    impl PaddleOcr {
        /// Initialize the OCR engine with the given model paths.
        pub fn try_new(
            detection: impl AsRef<Path>,
            recognition: impl AsRef<Path>,
            charsset: impl AsRef<Path>,
        ) -> Result<Self, ScanError> {
            let thread_count = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);

            let engine = ocr_rs::OcrEngine::new(
                detection,
                recognition,
                charsset,
                Some(ocr_rs::OcrEngineConfig {
                    backend: ocr_rs::Backend::CPU,
                    thread_count,
                    // Collector lines are small glyphs; High precision helps there.
                    precision_mode: ocr_rs::PrecisionMode::High,
                    enable_parallel: thread_count > 1,
                    min_result_confidence: 0.5,
                    ..Default::default()
                }),
            )
            .context("failed to initialize OCR engine")
            .map_err(|err| ScanError::engine(format!("{err:#}")))?;

            Ok(Self { engine })
        }
    }

    impl Recognizer for PaddleOcr {
        fn recognize(&self, image: &GrayImage, charset: &Charset) -> Result<RecognizedTextLines, ScanError> {
            let image = crate::buffer::upscale_to_height(image, MIN_HEIGHT)
                .map_err(|err| ScanError::engine(format!("{err:#}")))?;

            let rgb = image
                .as_raw()
                .iter()
                .flat_map(|&v| [v, v, v])
                .collect::<Vec<_>>();
            let input = ocr_rs::preprocess::rgb_to_image(&rgb, image.width(), image.height());

            let results = self
                .engine
                .recognize(&input)
                .map_err(|err| ScanError::engine(format!("recognition failed: {err}")))?;

            let lines = charset.clean_lines(results.into_iter().map(|v| v.text));
            log::debug!("ocr lines: {lines:?}");
            Ok(lines)
        }
    }
}
