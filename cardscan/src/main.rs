//! cardscan: identify trading cards from photos.
//!
//! Scans image files (or a folder as new captures land in it) and prints the
//! matching catalog entry with its prices.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use ie::{CandidatePolicy, Ie, PixelBuffer};

mod assets;
mod config;
mod report;
mod watch;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "cardscan", version, about = "Identify trading cards from photos")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to `<config_dir>/cardscan.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Card catalog JSON.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Folder with the OCR models.
    #[arg(long, global = true)]
    ocr_dir: Option<PathBuf>,

    /// Rotate frames 90 degrees clockwise before scanning.
    #[arg(long, global = true)]
    rotate: bool,

    /// How to choose between several identifier candidates.
    #[arg(long, global = true, value_enum)]
    policy: Option<Policy>,

    /// Write the intermediate images of each scan into this folder.
    #[arg(long, global = true)]
    save: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan image files.
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Scan every image created in a folder.
    Watch {
        dir: PathBuf,

        /// Seconds to wait before each scan.
        #[arg(long)]
        delay: Option<f32>,
    },
    /// Print the effective configuration.
    Config {
        /// Also write it to the config file.
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    Last,
    First,
    Scored,
}

impl From<Policy> for CandidatePolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Last => CandidatePolicy::LastWins,
            Policy::First => CandidatePolicy::FirstWins,
            Policy::Scored => CandidatePolicy::Scored,
        }
    }
}

impl Cli {
    /// Command-line flags take precedence over the config file.
    fn apply(&self, cfg: &mut Config) {
        if let Some(catalog) = &self.catalog {
            cfg.catalog_path = catalog.clone();
        }
        if let Some(dir) = &self.ocr_dir {
            cfg.ocr_dir = Some(dir.clone());
        }
        if self.rotate {
            cfg.scan.rotate_90 = true;
        }
        if let Some(policy) = self.policy {
            cfg.scan.candidate_policy = policy.into();
        }
        if let Command::Watch { delay: Some(delay), .. } = self.command {
            cfg.scan_delay_s = delay;
        }
    }
}

struct Scanner {
    ie: Ie,
    save: Option<PathBuf>,
}

impl Scanner {
    fn new(cfg: &Config, save: Option<PathBuf>) -> Result<Self> {
        let recognizer = assets::recognizer(cfg.ocr_dir.as_deref())?;
        let catalog = catalog::CatalogIndex::load(&cfg.catalog_path)?;
        Ok(Self {
            ie: Ie::new(cfg.scan.clone(), recognizer, Arc::new(catalog)),
            save,
        })
    }

    /// Scan one file and print the result.
    ///
    /// The outer error is fatal (the engine is gone); the inner one only concerns this file.
    fn scan_file(&self, path: &Path) -> Result<Result<()>> {
        let image = match image::open(path).with_context(|| format!("read image {:?}", path)) {
            Ok(image) => image,
            Err(err) => return Ok(Err(err)),
        };
        let buffer = PixelBuffer::from_dynamic(image);

        let (result, trace) = self.ie.scan_traced(&buffer)?;
        tracing::info!(file = %path.display(), outcome = ?result.outcome, confidence = result.confidence, "scanned");

        println!("{}:\n{}\n", path.display(), report::format_result(&result));

        if let Some(dir) = &self.save {
            let dir = match path.file_stem() {
                Some(stem) => dir.join(stem),
                None => dir.clone(),
            };
            if let Err(err) = report::save_trace(&dir, &trace, self.ie.config()) {
                return Ok(Err(err));
            }
        }
        Ok(Ok(()))
    }
}

fn watch_delay(seconds: f32) -> Result<Duration> {
    match Duration::try_from_secs_f32(seconds) {
        Ok(delay) => Ok(delay),
        Err(_) => bail!("scan delay must be a finite, non-negative number of seconds, got {seconds}"),
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = Config::load_or_default(cli.config.as_deref());
    cli.apply(&mut cfg);

    match &cli.command {
        Command::Scan { images } => {
            let scanner = Scanner::new(&cfg, cli.save.clone())?;
            let mut failed = 0;
            for path in images {
                if let Err(err) = scanner.scan_file(path)? {
                    tracing::error!(error = %format!("{err:#}"), "scan failed");
                    failed += 1;
                }
            }
            if failed > 0 {
                bail!("{failed} of {} files could not be scanned", images.len());
            }
            Ok(())
        }
        Command::Watch { dir, .. } => {
            let scanner = Scanner::new(&cfg, cli.save.clone())?;
            let delay = watch_delay(cfg.scan_delay_s)?;
            watch::watch(dir, delay, |path| {
                if let Err(err) = scanner.scan_file(path)? {
                    tracing::error!(error = %format!("{err:#}"), "scan failed");
                }
                Ok(())
            })
        }
        Command::Config { write } => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::path()?,
            };
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&cfg).context("serialize config")?);

            match assets::resolve_ocr_assets(cfg.ocr_dir.as_deref()) {
                Ok(found) => println!("# OCR models: {}", found.detection.parent().unwrap_or(found.detection.as_path()).display()),
                Err(err) => println!("# {err:#}"),
            }

            if *write {
                cfg.save_to(&path)?;
                tracing::info!(path = %path.display(), "config written");
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from([
            "cardscan", "watch", "inbox", "--delay", "0.5", "--rotate", "--policy", "first", "--catalog", "cards.json",
        ]);
        let mut cfg = Config {
            catalog_path: PathBuf::from("other.json"),
            ..Config::default()
        };
        cli.apply(&mut cfg);

        assert_eq!(cfg.catalog_path, PathBuf::from("cards.json"));
        assert_eq!(cfg.scan_delay_s, 0.5);
        assert!(cfg.scan.rotate_90);
        assert_eq!(cfg.scan.candidate_policy, CandidatePolicy::FirstWins);
        assert_eq!(cfg.ocr_dir, None);
    }

    #[test]
    fn unset_flags_keep_config() {
        let cli = Cli::parse_from(["cardscan", "scan", "a.jpg", "b.jpg"]);
        let mut cfg = Config::default();
        cfg.scan.rotate_90 = true;
        cli.apply(&mut cfg);

        assert!(cfg.scan.rotate_90);
        assert_eq!(cfg.scan.candidate_policy, CandidatePolicy::LastWins);
        assert_eq!(cfg.scan_delay_s, 2.0);
    }

    #[test]
    fn watch_delay_must_be_usable() {
        assert_eq!(watch_delay(0.5).unwrap(), Duration::from_millis(500));
        assert_eq!(watch_delay(0.0).unwrap(), Duration::ZERO);
        assert!(watch_delay(f32::INFINITY).is_err());
        assert!(watch_delay(f32::NAN).is_err());
        assert!(watch_delay(-1.0).is_err());

        let cli = Cli::parse_from(["cardscan", "watch", "inbox", "--delay", "inf"]);
        let mut cfg = Config::default();
        cli.apply(&mut cfg);
        assert!(watch_delay(cfg.scan_delay_s).is_err());
    }

    #[test]
    fn scan_needs_an_image() {
        assert!(Cli::try_parse_from(["cardscan", "scan"]).is_err());
    }
}
