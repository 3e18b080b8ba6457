//! Crawl configuration, loaded from `config/pipeline.json`.
//!
//! The config file is discovered by walking up from the starting directory
//! until a `config/pipeline.json` appears; the directory holding it is the
//! repo root, and a relative `raw_output` is resolved against that root
//! exactly once. Missing or unreadable config falls back to defaults with a
//! diagnostic, never an error.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const CONFIG_RELATIVE_PATH: &str = "config/pipeline.json";

const DEFAULT_START_URL: &str = "https://www.bgsu.edu";
const DEFAULT_RAW_OUTPUT: &str = "data/raw";
const DEFAULT_MAX_PAGES: i64 = -1;
const DEFAULT_DELAY_SECONDS: f64 = 0.25;
const DEFAULT_TIMEOUT_SECONDS: f64 = 20.0;

const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["www.bgsu.edu", "bgsu.edu"];

const DEFAULT_EXTENSIONS: &[&str] = &[
    ".html", ".htm", ".php", ".asp", ".aspx", ".jsp", ".pdf", ".txt", ".json", ".csv", ".xml",
    ".doc", ".docx", ".ppt", ".pptx", ".xls", ".xlsx", ".rtf", ".srt", ".vtt", ".jpg", ".jpeg",
    ".png", ".gif", ".svg", ".zip", ".tar", ".gz", ".mp3", ".mp4",
];

/// Fully resolved crawl configuration.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: String,
    /// Lowercased hosts the crawl is confined to.
    pub allowed_domains: HashSet<String>,
    /// Output root; already resolved, never re-joined.
    pub raw_output: PathBuf,
    /// -1 means unbounded.
    pub max_pages: i64,
    /// Global post-fetch sleep, seconds.
    pub request_delay_seconds: f64,
    pub timeout_seconds: f64,
    pub threads: usize,
    /// Dotted, lowercased extensions eligible for download.
    pub allowed_extensions: HashSet<String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            allowed_domains: DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
            raw_output: PathBuf::from(DEFAULT_RAW_OUTPUT),
            max_pages: DEFAULT_MAX_PAGES,
            request_delay_seconds: DEFAULT_DELAY_SECONDS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            threads: default_threads(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Raw file keys; every field optional so partial configs work.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    start_url: Option<String>,
    allowed_domains: Option<Vec<String>>,
    raw_output: Option<String>,
    max_pages: Option<i64>,
    delay: Option<f64>,
    timeout: Option<f64>,
    crawler_threads: Option<i64>,
    extensions: Option<Vec<String>>,
}

impl CrawlConfig {
    /// Discover `config/pipeline.json` by ancestor walk from `starting_dir`
    /// and load it; defaults when nothing is found.
    pub fn discover(starting_dir: &Path) -> Self {
        let repo_root = discover_repo_root(starting_dir);
        let config_path = repo_root.join(CONFIG_RELATIVE_PATH);
        Self::read(&config_path, &repo_root)
    }

    /// Load an explicit config file. Relative `raw_output` values resolve
    /// against the directory containing the file.
    pub fn load_file(path: &Path) -> Self {
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::read(path, &root)
    }

    fn read(config_path: &Path, repo_root: &Path) -> Self {
        let file = match std::fs::read_to_string(config_path) {
            Ok(data) => match serde_json::from_str::<FileConfig>(&data) {
                Ok(parsed) => {
                    eprintln!("Using config at {}", config_path.display());
                    parsed
                }
                Err(e) => {
                    eprintln!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    FileConfig::default()
                }
            },
            Err(_) => {
                eprintln!(
                    "Config not found at {}. Using defaults.",
                    config_path.display()
                );
                FileConfig::default()
            }
        };
        Self::from_file(file, repo_root)
    }

    fn from_file(file: FileConfig, repo_root: &Path) -> Self {
        let defaults = Self::default();

        let allowed_domains = file
            .allowed_domains
            .filter(|domains| !domains.is_empty())
            .map(|domains| {
                domains
                    .into_iter()
                    .map(|d| d.to_ascii_lowercase())
                    .collect()
            })
            .unwrap_or(defaults.allowed_domains);

        let allowed_extensions = file
            .extensions
            .filter(|exts| !exts.is_empty())
            .map(|exts| exts.iter().filter_map(|e| normalize_extension(e)).collect())
            .unwrap_or(defaults.allowed_extensions);

        let raw_output = match file.raw_output {
            Some(raw) => resolve_output_path(repo_root, &raw),
            None => repo_root.join(DEFAULT_RAW_OUTPUT),
        };

        Self {
            start_url: file.start_url.unwrap_or(defaults.start_url),
            allowed_domains,
            raw_output,
            max_pages: file.max_pages.unwrap_or(defaults.max_pages),
            request_delay_seconds: file
                .delay
                .filter(|d| d.is_finite() && *d >= 0.0)
                .unwrap_or(defaults.request_delay_seconds),
            timeout_seconds: file
                .timeout
                .filter(|t| t.is_finite() && *t > 0.0)
                .unwrap_or(defaults.timeout_seconds),
            threads: file
                .crawler_threads
                .filter(|&n| n > 0)
                .map(|n| n as usize)
                .unwrap_or(defaults.threads),
            allowed_extensions,
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Walk up from `starting_dir` until a directory contains the config file;
/// fall back to `starting_dir` itself.
fn discover_repo_root(starting_dir: &Path) -> PathBuf {
    let mut dir = starting_dir.to_path_buf();
    loop {
        if dir.join(CONFIG_RELATIVE_PATH).exists() {
            return dir;
        }
        if !dir.pop() {
            return starting_dir.to_path_buf();
        }
    }
}

fn resolve_output_path(repo_root: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        repo_root.join(path)
    }
}

/// Lowercase and prepend the leading dot when missing; empty entries drop.
fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim();
    if ext.is_empty() {
        return None;
    }
    let lowered = ext.to_ascii_lowercase();
    if lowered.starts_with('.') {
        Some(lowered)
    } else {
        Some(format!(".{}", lowered))
    }
}
