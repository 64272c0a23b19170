//! Upload staging area.
//!
//! Uploaded files are written to disk under the staging directory while the
//! capability runs. Every request gets a [`StagedUpload`] guard that owns the
//! files it created (plus an optional scratch directory for capability
//! output) and removes them when dropped. The guard lives in the request
//! future, so success, rejection, capability failure, panics and client
//! disconnects all end with the same cleanup.

use rand::Rng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tracing::{debug, error, info};

/// Attempts at finding an unused staging name before giving up.
const NAME_ATTEMPTS: usize = 8;

/// A file received from the client and written to the staging area.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub size: u64,
}

/// The shared staging directory.
#[derive(Debug, Clone)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the staging directory and remove what a previous process left behind.
    ///
    /// Only entries named like [`unique_name`] output are swept; anything else
    /// in the directory is left alone. Returns the number of stale entries
    /// removed. Must run before the server accepts requests.
    pub fn prepare(&self) -> io::Result<usize> {
        fs::create_dir_all(&self.root)?;

        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_name().to_str().is_some_and(is_staged_name) {
                continue;
            }
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            match result {
                Ok(()) => removed += 1,
                Err(e) => error!("Failed to remove stale staged entry {}: {}", path.display(), e),
            }
        }

        if removed > 0 {
            info!("Removed {} stale staged entries from {}", removed, self.root.display());
        }
        Ok(removed)
    }

    /// Start staging for one request.
    pub fn begin(&self) -> StagedUpload {
        StagedUpload {
            root: self.root.clone(),
            owned_files: Vec::new(),
            scratch: None,
            files: Vec::new(),
        }
    }
}

/// Collision-proof staging name: `<unix-millis>-<random><.ext>`.
///
/// The original extension is kept when it is short and alphanumeric.
pub fn unique_name(original_name: Option<&str>) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let extension = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 16)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}-{}{}", millis, suffix, extension)
}

/// Whether `name` has the shape produced by [`unique_name`].
pub fn is_staged_name(name: &str) -> bool {
    let (stem, extension) = match name.split_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (name, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let stem_ok = stem
        .split_once('-')
        .is_some_and(|(millis, suffix)| all_digits(millis) && all_digits(suffix));
    let extension_ok = extension.is_none_or(|ext| {
        !ext.is_empty() && ext.len() <= 16 && ext.chars().all(|c| c.is_ascii_alphanumeric())
    });
    stem_ok && extension_ok
}

/// Per-request staging guard. Dropping it deletes everything it created.
#[derive(Debug)]
pub struct StagedUpload {
    root: PathBuf,
    owned_files: Vec<PathBuf>,
    scratch: Option<PathBuf>,
    files: Vec<StagedFile>,
}

impl StagedUpload {
    /// Create a new, empty staging file. The guard owns it from this point on.
    pub async fn create(&mut self, original_name: Option<&str>) -> io::Result<(PathBuf, File)> {
        let mut last_err = None;
        for _ in 0..NAME_ATTEMPTS {
            let path = self.root.join(unique_name(original_name));
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => {
                    self.owned_files.push(path.clone());
                    return Ok((path, file));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => last_err = Some(e),
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| io::Error::other("no free staging name")))
    }

    /// Record a fully written file.
    pub fn push(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    /// Files received so far.
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    /// A directory for capability output, created on first use.
    pub async fn scratch_dir(&mut self) -> io::Result<PathBuf> {
        if let Some(dir) = &self.scratch {
            return Ok(dir.clone());
        }
        let dir = self.root.join(unique_name(None));
        tokio::fs::create_dir(&dir).await?;
        self.scratch = Some(dir.clone());
        Ok(dir)
    }

    /// Every path this guard will remove.
    pub fn owned_paths(&self) -> Vec<PathBuf> {
        self.owned_files
            .iter()
            .cloned()
            .chain(self.scratch.iter().cloned())
            .collect()
    }

    fn cleanup(&mut self) {
        for path in self.owned_files.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!("Removed staged file {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => error!("Failed to remove staged file {}: {}", path.display(), e),
            }
        }
        if let Some(dir) = self.scratch.take() {
            match fs::remove_dir_all(&dir) {
                Ok(()) => debug!("Removed scratch directory {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => error!("Failed to remove scratch directory {}: {}", dir.display(), e),
            }
        }
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_unique_name_keeps_extension() {
        let name = unique_name(Some("Report Final.PDF"));
        assert!(name.ends_with(".pdf"));
        let (millis, rest) = name.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert!(rest.trim_end_matches(".pdf").parse::<u32>().is_ok());
    }

    #[test]
    fn test_unique_name_drops_unsafe_extension() {
        assert!(!unique_name(Some("evil.p/../df")).contains('/'));
        assert!(!unique_name(Some("noext")).contains('.'));
        assert!(!unique_name(None).contains('.'));
    }

    #[test]
    fn test_unique_names_differ() {
        let names: std::collections::HashSet<_> =
            (0..100).map(|_| unique_name(Some("a.png"))).collect();
        assert_eq!(names.len(), 100);
    }

    #[tokio::test]
    async fn test_drop_removes_files_and_scratch() {
        let root = TempDir::new().unwrap();
        let area = StagingArea::new(root.path());

        let mut staged = area.begin();
        let (path, mut file) = staged.create(Some("a.pdf")).await.unwrap();
        file.write_all(b"%PDF-1.7").await.unwrap();
        drop(file);
        let scratch = staged.scratch_dir().await.unwrap();
        tokio::fs::write(scratch.join("out.pdf"), b"x").await.unwrap();

        assert!(path.exists());
        assert!(scratch.exists());
        assert_eq!(staged.owned_paths().len(), 2);

        drop(staged);

        assert!(!path.exists());
        assert!(!scratch.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_scratch_dir_is_reused() {
        let root = TempDir::new().unwrap();
        let mut staged = StagingArea::new(root.path()).begin();
        let first = staged.scratch_dir().await.unwrap();
        let second = staged.scratch_dir().await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_staged_name_shape() {
        assert!(is_staged_name(&unique_name(Some("a.pdf"))));
        assert!(is_staged_name(&unique_name(None)));
        assert!(is_staged_name("1700000000000-42.png"));
        assert!(!is_staged_name("important-notes.txt"));
        assert!(!is_staged_name("project"));
        assert!(!is_staged_name("123-"));
        assert!(!is_staged_name("123-456."));
        assert!(!is_staged_name("123-456.tar.gz"));
    }

    #[test]
    fn test_prepare_sweeps_stale_entries() {
        let root = TempDir::new().unwrap();
        let staging = root.path().join("staging");
        fs::create_dir_all(staging.join("1700000000000-7")).unwrap();
        fs::write(staging.join("1700000000000-7").join("out.pdf"), b"x").unwrap();
        fs::write(staging.join("123-456.pdf"), b"stale").unwrap();

        let removed = StagingArea::new(&staging).prepare().unwrap();

        assert_eq!(removed, 2);
        assert!(staging.is_dir());
        assert_eq!(fs::read_dir(&staging).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_leaves_foreign_entries() {
        let root = TempDir::new().unwrap();
        let staging = root.path();
        fs::write(staging.join("important-notes.txt"), b"keep me").unwrap();
        fs::create_dir_all(staging.join("project").join("src")).unwrap();
        fs::write(staging.join("123-456.pdf"), b"stale").unwrap();

        let removed = StagingArea::new(staging).prepare().unwrap();

        assert_eq!(removed, 1);
        assert!(staging.join("important-notes.txt").is_file());
        assert!(staging.join("project").join("src").is_dir());
        assert!(!staging.join("123-456.pdf").exists());
    }
}
