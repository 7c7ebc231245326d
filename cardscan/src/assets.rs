use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use ie::{Recognizer, ScanError};

const DETECTION: &str = "detection.mnn";
const RECOGNITION: &str = "latin_recognition.mnn";
const CHARSET: &str = "latin_charset.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

impl OcrAssets {
	fn in_dir(dir: &Path) -> Option<Self> {
		let assets = Self {
			detection: dir.join(DETECTION),
			recognition: dir.join(RECOGNITION),
			charset: dir.join(CHARSET),
		};
		(assets.detection.is_file() && assets.recognition.is_file() && assets.charset.is_file()).then_some(assets)
	}
}

/// Folders searched for the models when none is configured, in order:
/// next to the executable, one level above it, `./ocr`, and `<config_dir>/cardscan/ocr`.
fn default_candidates() -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
		if let Some(up) = dir.parent() {
			candidates.push(up.to_path_buf());
		}
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd.join("ocr"));
	}
	if let Some(config) = dirs::config_dir() {
		candidates.push(config.join("cardscan").join("ocr"));
	}
	candidates
}

/// Find the OCR model files. A configured folder is the only one tried.
pub fn resolve_ocr_assets(configured: Option<&Path>) -> Result<OcrAssets> {
	let candidates = match configured {
		Some(dir) => vec![dir.to_path_buf()],
		None => default_candidates(),
	};
	find_in(&candidates)
}

fn find_in(candidates: &[PathBuf]) -> Result<OcrAssets> {
	if let Some(assets) = candidates.iter().find_map(|dir| OcrAssets::in_dir(dir)) {
		tracing::debug!(dir = ?assets.detection.parent(), "found OCR models");
		return Ok(assets);
	}

	bail!(
		"OCR model files not found. Expected {DETECTION}, {RECOGNITION} and {CHARSET} in one of:\n{}\n\nFix: set `ocr_dir` in the config or pass --ocr-dir.",
		candidates
			.iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}

/// Build the text recognizer this binary was compiled with.
pub fn recognizer(ocr_dir: Option<&Path>) -> Result<Box<dyn Recognizer>, ScanError> {
	#[cfg(feature = "paddle")]
	{
		let assets = resolve_ocr_assets(ocr_dir).map_err(|err| ScanError::engine(format!("{err:#}")))?;
		let ocr = ie::PaddleOcr::try_new(&assets.detection, &assets.recognition, &assets.charset)?;
		Ok(Box::new(ocr))
	}

	#[cfg(not(feature = "paddle"))]
	{
		let _ = ocr_dir;
		Err(ScanError::engine("no OCR engine compiled in; rebuild with `--features paddle`"))
	}
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	fn install_models(dir: &Path) {
		fs::create_dir_all(dir).unwrap();
		for name in [DETECTION, RECOGNITION, CHARSET] {
			fs::write(dir.join(name), b"").unwrap();
		}
	}

	#[test]
	fn first_complete_folder_wins() {
		let root = tempfile::tempdir().unwrap();
		let partial = root.path().join("partial");
		let full = root.path().join("full");
		let other = root.path().join("other");

		fs::create_dir_all(&partial).unwrap();
		fs::write(partial.join(DETECTION), b"").unwrap();
		install_models(&full);
		install_models(&other);

		let assets = find_in(&[partial, full.clone(), other]).unwrap();
		assert_eq!(assets.detection, full.join(DETECTION));
		assert_eq!(assets.charset, full.join(CHARSET));
	}

	#[test]
	fn missing_models_list_the_searched_folders() {
		let root = tempfile::tempdir().unwrap();
		let err = resolve_ocr_assets(Some(root.path())).unwrap_err();
		let msg = format!("{err:#}");
		assert!(msg.contains(DETECTION));
		assert!(msg.contains(&root.path().display().to_string()));
	}

	#[test]
	fn configured_folder_is_used() {
		let root = tempfile::tempdir().unwrap();
		install_models(root.path());
		let assets = resolve_ocr_assets(Some(root.path())).unwrap();
		assert_eq!(assets.recognition, root.path().join(RECOGNITION));
	}

	#[cfg(not(feature = "paddle"))]
	#[test]
	fn without_an_engine_the_recognizer_is_unavailable() {
		assert!(matches!(recognizer(None), Err(ScanError::EngineUnavailable(_))));
	}
}
