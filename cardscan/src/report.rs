use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use ie::{ScanConfig, ScanResult, ScanTrace};

/// Human-readable summary of one scan.
pub fn format_result(result: &ScanResult) -> String {
    let Some(card) = &result.card else {
        return "No card detected".to_string();
    };

    let set_code = card.set.to_uppercase();
    let set = match &card.set_name {
        Some(name) => format!("{name} ({set_code})"),
        None => set_code,
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", card.name);
    let _ = writeln!(out, "  Set:        {set}");
    let _ = writeln!(out, "  Number:     {}", card.collector_number);
    let _ = write!(out, "  Confidence: {:.2}", result.confidence);

    let prices = [
        ("USD", &card.prices.usd),
        ("USD foil", &card.prices.usd_foil),
        ("EUR", &card.prices.eur),
    ];
    for (label, price) in prices {
        if let Some(price) = price {
            let _ = write!(out, "\n  {:<12}{price}", format!("{label}:"));
        }
    }
    out
}

/// Write the trace images a scan produced into `dir`.
///
/// `card_detected.png` is the rectified card, `cropped_bottom_left.png` the raw
/// identifier strip and `preprocessed.png` the strip as the recognizer saw it.
pub fn save_trace(dir: &Path, trace: &ScanTrace, config: &ScanConfig) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;

    if let Some(card) = &trace.canonical {
        let path = dir.join("card_detected.png");
        card.as_rgb().save(&path).with_context(|| format!("write {:?}", path))?;

        let crop = ie::crop_identifier_region(
            &card.to_gray_image(),
            config.region_height_ratio,
            config.region_width_ratio,
        );
        let path = dir.join("cropped_bottom_left.png");
        crop.save(&path).with_context(|| format!("write {:?}", path))?;
    }

    if let Some(region) = &trace.region {
        let path = dir.join("preprocessed.png");
        region.save(&path).with_context(|| format!("write {:?}", path))?;
    }

    tracing::debug!(dir = %dir.display(), "saved scan trace");
    Ok(())
}
