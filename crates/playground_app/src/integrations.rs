//! Desktop integrations: clipboard, downloads and the system opener.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::render::FALLBACK_FILENAME;

/// Clipboard write failure
#[derive(Debug, Error)]
#[error("Clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Destination for copied text
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The operating system clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        cli_clipboard::set_contents(text.to_string()).map_err(|e| ClipboardError(e.to_string()))
    }
}

/// Receiver of triggered downloads
pub trait Downloader: Send {
    /// Store `bytes` under `filename`, returning where they ended up
    fn download(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf>;
}

/// Writes downloads into a fixed directory
#[derive(Debug, Clone)]
pub struct DirectoryDownloader {
    dir: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Downloader for DirectoryDownloader {
    fn download(&mut self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| FALLBACK_FILENAME.into());
        let target = self.dir.join(name);
        std::fs::write(&target, bytes)?;
        tracing::info!(path = %target.display(), size = bytes.len(), "Download saved");
        Ok(target)
    }
}

/// Open a URL or file with the system handler
pub fn open_in_browser(target: &str) {
    if let Err(e) = open::that(target) {
        tracing::warn!(%target, error = %e, "Failed to open");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_downloader_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = DirectoryDownloader::new(dir.path().join("nested"));

        let path = downloader.download("bundle.zip", b"PK").unwrap();
        assert_eq!(path, dir.path().join("nested").join("bundle.zip"));
        assert_eq!(std::fs::read(path).unwrap(), b"PK");
    }

    #[test]
    fn test_directory_downloader_strips_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = DirectoryDownloader::new(dir.path());

        let path = downloader.download("../../etc/evil.yaml", b"x").unwrap();
        assert_eq!(path, dir.path().join("evil.yaml"));
    }

    #[test]
    fn test_directory_downloader_falls_back_without_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut downloader = DirectoryDownloader::new(dir.path());

        let path = downloader.download("", b"x").unwrap();
        assert_eq!(path, dir.path().join(FALLBACK_FILENAME));
    }
}
