use std::{
    path::{Path, PathBuf},
    sync::mpsc,
    time::Duration,
};

use anyhow::{Context, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Images an event reports as newly created.
///
/// Capture tools often write a temporary file and rename it into place, so a
/// rename counts as a creation of its target.
fn created_images(event: &Event) -> Vec<PathBuf> {
    match event.kind {
        // inotify also sends a `Both` event after `To`; that one is skipped.
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.iter().filter(|p| is_image(p)).cloned().collect()
        }
        // FSEvents does not tell the old name from the new one.
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => {
            event.paths.iter().filter(|p| is_image(p) && p.is_file()).cloned().collect()
        }
        _ => Vec::new(),
    }
}

/// Call `on_image` for every image created in `dir` until the watcher stops.
///
/// Each call waits `delay` first, which lets the writer finish the file and
/// keeps back-to-back captures from flooding the recognizer. An error from
/// `on_image` ends the watch.
pub fn watch(dir: &Path, delay: Duration, mut on_image: impl FnMut(&Path) -> Result<()>) -> Result<()> {
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx).context("create file watcher")?;
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {:?}", dir))?;
    tracing::info!(dir = %dir.display(), delay_s = delay.as_secs_f32(), "watching for new images");

    for event in rx {
        let event = match event {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "file watcher error");
                continue;
            }
        };
        for path in created_images(&event) {
            std::thread::sleep(delay);
            on_image(&path)?;
        }
    }

    Ok(())
}
