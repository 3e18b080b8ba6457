pub mod cli;
pub mod config;
pub mod crawler;
pub mod frontier;
pub mod logging;
pub mod network;
pub mod parser;
pub mod store;
pub mod url_utils;

// Re-export main types for library usage
pub use config::CrawlConfig;
pub use crawler::{CrawlError, CrawlSummary, Crawler};
pub use frontier::{Claim, FrontierSet};
pub use network::{FetchError, FetchedPage, Fetcher, HttpFetcher};
pub use parser::{HrefExtractor, LinkExtractor};
pub use store::{Artifact, Store, StoreError};
