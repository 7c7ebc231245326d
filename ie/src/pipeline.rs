//! Scan pipeline: frame in, catalog match and confidence out.
//!
//! `detect -> rectify -> extract region -> recognize -> classify -> resolve`.
//! Every stage that finds nothing ends the scan with `(None, 0.0)`; only a
//! recognizer that cannot run (or a config it cannot run with) is an error.

use catalog::{CardRecord, CatalogIndex, ParsedIdentifier};
use image::GrayImage;

use crate::{
    CanonicalCardImage, PixelBuffer, Quad, RecognizedTextLines, Recognizer, ScanConfig, ScanError,
    detect, extract_identifier_region, rectify, tokens,
};

/// Why a scan ended where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Matched,
    NoCardDetected,
    NoTextRecognized,
    NoIdentifierParsed,
    CatalogMiss,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub card: Option<CardRecord>,
    /// 1.0 for an exact catalog hit, 0.0 otherwise.
    pub confidence: f32,
    pub outcome: Outcome,
}

impl ScanResult {
    fn nothing(outcome: Outcome) -> Self {
        Self {
            card: None,
            confidence: 0.0,
            outcome,
        }
    }
}

/// Intermediate artefacts of one scan, for diagnostics.
///
/// Fields stay empty past the stage where the scan stopped.
#[derive(Debug, Clone, Default)]
pub struct ScanTrace {
    pub quad: Option<Quad>,
    pub canonical: Option<CanonicalCardImage>,
    pub region: Option<GrayImage>,
    pub lines: RecognizedTextLines,
    pub parsed: Option<ParsedIdentifier>,
}

pub fn scan(
    buffer: &PixelBuffer,
    config: &ScanConfig,
    recognizer: &impl Recognizer,
    catalog: &CatalogIndex,
) -> Result<ScanResult, ScanError> {
    scan_traced(buffer, config, recognizer, catalog).map(|(result, _)| result)
}

pub fn scan_traced(
    buffer: &PixelBuffer,
    config: &ScanConfig,
    recognizer: &impl Recognizer,
    catalog: &CatalogIndex,
) -> Result<(ScanResult, ScanTrace), ScanError> {
    config.validate()?;
    let mut trace = ScanTrace::default();

    let rotated;
    let frame = if config.rotate_90 {
        rotated = buffer.rotated_90();
        &rotated
    } else {
        buffer
    };

    trace.quad = detect(&frame.to_gray_image(), config);
    let canonical = trace
        .quad
        .and_then(|quad| rectify(frame, &quad, config.canonical_width));

    let canonical = match canonical {
        Some(card) => card,
        None if config.fallback_to_full_frame => {
            log::debug!("no card outline; using the full frame");
            CanonicalCardImage::from(frame.as_rgb().clone())
        }
        None => {
            log::debug!("no card detected");
            return Ok((ScanResult::nothing(Outcome::NoCardDetected), trace));
        }
    };

    let region = extract_identifier_region(&canonical, config);
    trace.canonical = Some(canonical);

    let lines = recognizer
        .recognize(&region, &config.charset)?
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();
    trace.region = Some(region);
    trace.lines = lines;

    if trace.lines.is_empty() {
        log::debug!("no text recognized");
        return Ok((ScanResult::nothing(Outcome::NoTextRecognized), trace));
    }
    log::debug!("recognized {:?}", trace.lines);

    let parsed = tokens::classify(&trace.lines, config.candidate_policy);
    let complete = parsed.is_complete();
    log::debug!("parsed identifier {parsed}");
    let (card, confidence) = catalog::resolve(&parsed, catalog);
    trace.parsed = Some(parsed);

    let result = match card {
        Some(card) => ScanResult {
            card: Some(card.clone()),
            confidence,
            outcome: Outcome::Matched,
        },
        None if !complete => ScanResult::nothing(Outcome::NoIdentifierParsed),
        None => ScanResult::nothing(Outcome::CatalogMiss),
    };

    Ok((result, trace))
}
