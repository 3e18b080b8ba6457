use std::path::PathBuf;

use clap::Parser;

/// crawler cli
#[derive(Parser)]
#[command(name = "falcon-crawler")]
#[command(about = "Crawl a configured set of domains and archive pages and assets")]
#[command(version)]
pub struct Cli {
    /// config file path
    #[arg(
        short,
        long,
        help = "Path to the pipeline config (default: config/pipeline.json found from the working directory)"
    )]
    pub config: Option<PathBuf>,

    /// seed url override
    #[arg(long, help = "Override the start URL from the config")]
    pub start_url: Option<String>,

    /// page limit override
    #[arg(long, help = "Override the page limit (-1 = unbounded)")]
    pub max_pages: Option<i64>,

    /// worker count override
    #[arg(long, help = "Override the number of crawl workers")]
    pub threads: Option<usize>,
}

impl Cli {
    /// parse args
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
