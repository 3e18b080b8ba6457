//! Artifact persistence and the metadata ledger.
//!
//! Bodies land under `<root>/html/` or `<root>/files/` depending on the
//! content type; every persisted artifact gets one tab-separated row in
//! `<root>/metadata.tsv`. The ledger is append-only and each row is written
//! as a single unbroken line under a dedicated mutex.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::url_utils;

const LEDGER_FILE: &str = "metadata.tsv";
const LEDGER_HEADER: &str = "url\tpath\tcontent_type\n";

/// A file written to disk for one fetched URL.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub is_html: bool,
}

pub struct Store {
    html_dir: PathBuf,
    files_dir: PathBuf,
    ledger: Mutex<File>,
}

impl Store {
    /// Create the output tree under `root` and open the ledger, writing the
    /// header only when the ledger does not already exist.
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        let html_dir = root.join("html");
        let files_dir = root.join("files");
        fs::create_dir_all(&html_dir)?;
        fs::create_dir_all(&files_dir)?;

        let ledger_path = root.join(LEDGER_FILE);
        let mut ledger = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&ledger_path)?;
        if ledger.metadata()?.len() == 0 {
            ledger.write_all(LEDGER_HEADER.as_bytes())?;
        }

        Ok(Self {
            html_dir,
            files_dir,
            ledger: Mutex::new(ledger),
        })
    }

    /// Write the body to its classified location and append the ledger row.
    ///
    /// The row is appended only after the artifact bytes are fully on disk,
    /// so every path the ledger mentions exists.
    pub fn persist(
        &self,
        url: &str,
        body: &[u8],
        content_type: &str,
    ) -> Result<Artifact, StoreError> {
        if has_ledger_breaking_chars(url) || has_ledger_breaking_chars(content_type) {
            return Err(StoreError::LedgerField(url.to_string()));
        }

        let parts =
            url_utils::parse(url).ok_or_else(|| StoreError::InvalidUrl(url.to_string()))?;

        let is_html =
            content_type.to_ascii_lowercase().contains("text/html") || content_type.is_empty();

        let (dir, name) = if is_html {
            (
                &self.html_dir,
                url_utils::sanitize_filename(&parts, ".html", "html"),
            )
        } else {
            let mut extension = url_utils::extension_of(url);
            if extension.is_empty() {
                extension = ".bin".to_string();
            }
            (
                &self.files_dir,
                url_utils::sanitize_filename(&parts, &extension, "file"),
            )
        };

        let path = dir.join(&name);
        write_atomic(&path, body)?;
        self.append_record(url, &path, content_type)?;

        Ok(Artifact { path, is_html })
    }

    fn append_record(&self, url: &str, path: &Path, content_type: &str) -> Result<(), StoreError> {
        let line = format!("{}\t{}\t{}\n", url, ledger_path_string(path), content_type);
        let mut ledger = self.ledger.lock();
        ledger.write_all(line.as_bytes())?;
        Ok(())
    }
}

/// Ledger paths use forward slashes on every OS.
fn ledger_path_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn has_ledger_breaking_chars(value: &str) -> bool {
    value.contains('\t') || value.contains('\n')
}

/// Write via a sibling temp file and rename, so a concurrent reader sees
/// either nothing or the complete body.
fn write_atomic(path: &Path, body: &[u8]) -> Result<(), StoreError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| StoreError::InvalidUrl(path.display().to_string()))?
        .to_string_lossy()
        .into_owned();
    let tmp = path.with_file_name(format!("{}.tmp", file_name));
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot derive an artifact name from URL: {0}")]
    InvalidUrl(String),

    #[error("ledger field contains a tab or newline: {0}")]
    LedgerField(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_ledger(root: &Path) -> Vec<String> {
        fs::read_to_string(root.join(LEDGER_FILE))
            .unwrap()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_open_writes_header_once() {
        let dir = TempDir::new().unwrap();
        {
            let _store = Store::open(dir.path()).unwrap();
        }
        {
            let _store = Store::open(dir.path()).unwrap();
        }
        let lines = read_ledger(dir.path());
        assert_eq!(lines, vec!["url\tpath\tcontent_type".to_string()]);
        assert!(dir.path().join("html").is_dir());
        assert!(dir.path().join("files").is_dir());
    }

    #[test]
    fn test_persist_html() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let artifact = store
            .persist("https://ex.test/", b"<html>hi</html>", "text/html; charset=utf-8")
            .unwrap();

        assert!(artifact.is_html);
        assert!(artifact.path.ends_with("html/html__ex.test_index.html"));
        assert_eq!(fs::read(&artifact.path).unwrap(), b"<html>hi</html>");

        let lines = read_ledger(dir.path());
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("https://ex.test/\t"));
        assert!(lines[1].ends_with("\ttext/html; charset=utf-8"));
    }

    #[test]
    fn test_persist_empty_content_type_is_html() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let artifact = store.persist("https://ex.test/page", b"<p>x</p>", "").unwrap();
        assert!(artifact.is_html);
    }

    #[test]
    fn test_persist_binary_uses_url_extension() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let artifact = store
            .persist("https://ex.test/doc.pdf", b"%PDF-1.4", "application/pdf")
            .unwrap();

        assert!(!artifact.is_html);
        assert!(artifact.path.ends_with("files/file__ex.test_doc.pdf"));
    }

    #[test]
    fn test_persist_binary_without_extension_gets_bin() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let artifact = store
            .persist("https://ex.test/blob", b"\x00\x01", "application/octet-stream")
            .unwrap();

        let name = artifact.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with(".bin"), "unexpected name: {}", name);
    }

    #[test]
    fn test_persist_rejects_tab_in_content_type() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = store
            .persist("https://ex.test/x", b"data", "text/\thtml")
            .unwrap_err();
        assert!(matches!(err, StoreError::LedgerField(_)));
        assert_eq!(read_ledger(dir.path()).len(), 1);
    }

    #[test]
    fn test_persist_rejects_unparseable_url() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let err = store.persist("not-a-url", b"data", "text/html").unwrap_err();
        assert!(matches!(err, StoreError::InvalidUrl(_)));
    }

    #[test]
    fn test_ledger_paths_use_forward_slashes() {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path()).unwrap();
        store
            .persist("https://ex.test/a/b", b"<p>x</p>", "text/html")
            .unwrap();
        let lines = read_ledger(dir.path());
        let path_field = lines[1].split('\t').nth(1).unwrap();
        assert!(!path_field.contains('\\'));
    }
}
