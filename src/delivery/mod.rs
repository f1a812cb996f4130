//! Download sinks, the focus probe, and the throttled download loop

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Result, ResizeDropError};

pub mod scheduler;

pub use scheduler::*;

/// Destination of downloads.
///
/// A download is triggered synchronously; an `Err` is the only failure
/// signal a sink can give, and many hosts cannot give even that.
pub trait DownloadSink: Send + Sync {
    fn download(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Best-effort signal of whether the host still has the user's attention.
///
/// Losing focus right after a chunk of downloads is read as a hint that the
/// host blocked them. The signal says nothing about individual files.
pub trait FocusProbe: Send + Sync {
    fn has_focus(&self) -> bool;
}

/// Probe for hosts without a focus notion
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFocused;

impl FocusProbe for AlwaysFocused {
    fn has_focus(&self) -> bool {
        true
    }
}

/// Focus state shared with the host, which flips it as focus changes
#[derive(Debug, Clone)]
pub struct FocusFlag(Arc<AtomicBool>);

impl FocusFlag {
    /// Create a flag in the focused state
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set_focused(&self, focused: bool) {
        self.0.store(focused, Ordering::SeqCst);
    }
}

impl Default for FocusFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusProbe for FocusFlag {
    fn has_focus(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Writes each download into a directory.
///
/// Bytes go to a hidden `.part` file first, which is renamed to the final
/// name and removed if that fails. Existing files are never overwritten: a
/// clashing name gets a ` (n)` suffix before the extension.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// First free path for `name` in the output directory
    fn unique_path(&self, name: &str) -> PathBuf {
        let candidate = self.dir.join(name);
        if !candidate.exists() {
            return candidate;
        }

        let (stem, ext) = match name.rfind('.') {
            Some(dot_pos) if dot_pos > 0 => (&name[..dot_pos], &name[dot_pos..]),
            _ => (name, ""),
        };

        (1..)
            .map(|n| self.dir.join(format!("{stem} ({n}){ext}")))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }
}

impl DownloadSink for DirectorySink {
    fn download(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ResizeDropError::delivery(name, "not a valid file name"))?;

        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ResizeDropError::delivery(name, e.to_string()))?;

        let target = self.unique_path(file_name);
        let staging = self.dir.join(format!(".{file_name}.part"));

        write_staged(&staging, &target, bytes)
            .map_err(|e| ResizeDropError::delivery(name, e.to_string()))?;

        debug!("Downloaded {} -> {:?}", name, target);
        Ok(())
    }
}

/// Write `bytes` to `staging` and move it to `target`; the staging file is
/// removed when either step fails
fn write_staged(staging: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(staging, bytes)
        .and_then(|()| std::fs::rename(staging, target))
        .map_err(|e| {
            let _ = std::fs::remove_file(staging);
            e
        })
}

/// A download recorded by [`MemorySink`]
#[derive(Debug, Clone)]
pub struct Download {
    pub name: String,
    pub bytes: Vec<u8>,
    pub at: tokio::time::Instant,
}

/// Keeps downloads in memory, for embedding hosts and tests
#[derive(Debug, Default)]
pub struct MemorySink {
    downloads: Mutex<Vec<Download>>,
    reject: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every download with one of these names
    pub fn rejecting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            downloads: Mutex::new(Vec::new()),
            reject: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Downloads so far, in trigger order
    pub fn downloads(&self) -> Vec<Download> {
        self.downloads
            .lock()
            .map(|downloads| downloads.clone())
            .unwrap_or_default()
    }
}

impl DownloadSink for MemorySink {
    fn download(&self, name: &str, bytes: &[u8]) -> Result<()> {
        if self.reject.iter().any(|rejected| rejected == name) {
            return Err(ResizeDropError::delivery(name, "rejected by host"));
        }

        let mut downloads = self
            .downloads
            .lock()
            .map_err(|_| ResizeDropError::system("download log poisoned"))?;
        downloads.push(Download {
            name: name.to_string(),
            bytes: bytes.to_vec(),
            at: tokio::time::Instant::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_directory_sink_writes_file() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));

        sink.download("photo.png", b"png bytes").unwrap();

        let written = std::fs::read(dir.path().join("out/photo.png")).unwrap();
        assert_eq!(written, b"png bytes");
        assert!(!dir.path().join("out/.photo.png.part").exists());
    }

    #[test]
    fn test_directory_sink_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());

        sink.download("photo.png", b"first").unwrap();
        sink.download("photo.png", b"second").unwrap();
        sink.download("photo.png", b"third").unwrap();

        assert_eq!(std::fs::read(dir.path().join("photo.png")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.path().join("photo (1).png")).unwrap(), b"second");
        assert_eq!(std::fs::read(dir.path().join("photo (2).png")).unwrap(), b"third");
    }

    #[test]
    fn test_directory_sink_strips_directories() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));

        sink.download("../escape.png", b"x").unwrap();
        assert!(dir.path().join("out/escape.png").exists());
        assert!(!dir.path().join("escape.png").exists());

        assert!(sink.download("..", b"x").is_err());
    }

    #[test]
    fn test_failed_rename_removes_staging_file() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join(".photo.png.part");
        let target = dir.path().join("photo.png");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"occupied").unwrap();

        assert!(write_staged(&staging, &target, b"png bytes").is_err());
        assert!(!staging.exists());
        assert!(target.join("keep").exists());
    }

    #[test]
    fn test_directory_sink_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());
        // A directory squatting on the staging name makes the write fail
        std::fs::create_dir(dir.path().join(".photo.png.part")).unwrap();

        let err = sink.download("photo.png", b"png bytes").unwrap_err();
        assert_eq!(err.file_name(), Some("photo.png"));
        assert!(!dir.path().join("photo.png").exists());
    }

    #[test]
    fn test_memory_sink_rejects() {
        let sink = MemorySink::rejecting(["bad.png"]);
        assert!(sink.download("good.png", b"a").is_ok());
        assert!(sink.download("bad.png", b"b").is_err());
        assert_eq!(sink.downloads().len(), 1);
    }

    #[test]
    fn test_focus_flag() {
        let flag = FocusFlag::new();
        assert!(flag.has_focus());
        flag.set_focused(false);
        assert!(!flag.clone().has_focus());
        assert!(AlwaysFocused.has_focus());
    }
}
