// src/infrastructure/renderer.rs
use crate::constants::BROWSER_LAUNCH_DELAY_MS;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{Builder, TempDir};
use tracing::{debug, instrument};

/// Writes rendered notes to a temp dir and hands them to the system browser
#[derive(Debug, Default)]
pub struct PreviewRenderer {
    // the browser reads the file after spawn, so the dir must outlive the call
    temp_dir: Option<TempDir>,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_temp_file(&mut self, html: &str) -> Result<PathBuf> {
        let temp_dir = Builder::new()
            .prefix("ctfdesk-preview-")
            .rand_bytes(5)
            .tempdir()
            .context("Failed to create temporary directory")?;

        let file_path = temp_dir.path().join("note.html");
        File::create(&file_path)
            .with_context(|| format!("Failed to create temp file at {}", file_path.display()))?
            .write_all(html.as_bytes())
            .context("Failed to write preview to temporary file")?;

        debug!(path = %file_path.display(), "Wrote preview");
        self.temp_dir = Some(temp_dir);
        Ok(file_path)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn open_in_browser(&self, path: &Path) -> Result<()> {
        let path_str = path.to_str().context("Preview path is not valid UTF-8")?;

        #[cfg(target_os = "macos")]
        let mut command = {
            let mut c = std::process::Command::new("open");
            c.arg(path_str);
            c
        };
        #[cfg(target_os = "windows")]
        let mut command = {
            let mut c = std::process::Command::new("cmd");
            c.args(["/C", "start", path_str]);
            c
        };
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let mut command = {
            let mut c = std::process::Command::new("xdg-open");
            c.arg(path_str);
            c
        };

        command.spawn().context("Failed to open browser")?;
        std::thread::sleep(Duration::from_millis(BROWSER_LAUNCH_DELAY_MS));
        Ok(())
    }
}
