use falcon_crawler::cli::Cli;
use falcon_crawler::{logging, CrawlConfig, Crawler};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_args();

    let mut config = match &cli.config {
        Some(path) => CrawlConfig::load_file(path),
        None => CrawlConfig::discover(&std::env::current_dir()?),
    };
    if let Some(url) = cli.start_url {
        config.start_url = url;
    }
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }
    if let Some(threads) = cli.threads {
        if threads > 0 {
            config.threads = threads;
        }
    }

    logging::init(&config.raw_output)?;

    let crawler = Crawler::with_http(config)?;
    let summary = crawler.run().await;

    println!(
        "Crawl finished: {} pages downloaded in {:.1}s",
        summary.pages_downloaded,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
