use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fbpost_rs::{ScrapeConfig, Scraper, save_csv};

/// Scrape a public Facebook post and its comments into two CSV files.
#[derive(Parser, Debug)]
#[command(name = "fbpost", version, about)]
struct Args {
    /// Post URL
    url: String,

    /// Directory the CSV files are written to
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Maximum comment pages to request
    #[arg(long, default_value_t = 10)]
    max_depth: u32,

    /// Sibling comments whose replies are fetched at once
    #[arg(long, default_value_t = 1)]
    reply_concurrency: usize,

    /// Ignore proxy credentials from the environment
    #[arg(long)]
    no_proxy: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Navigation timeout in seconds
    #[arg(long, default_value_t = 20)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fbpost_rs=info,warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = ScrapeConfig::from_env()
        .with_max_depth(args.max_depth)
        .with_reply_concurrency(args.reply_concurrency)
        .with_navigation_timeout(Duration::from_secs(args.timeout))
        .with_headless(!args.headful);
    if args.no_proxy {
        config = config.with_proxy(None);
    }

    let scraper = match Scraper::from_config(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        }
    };

    let post = match scraper.scrape_guarded(&args.url).await {
        Ok(p) => p,
        Err(failure) => {
            eprintln!("{failure}");
            return ExitCode::FAILURE;
        }
    };

    match save_csv(&args.out, &post) {
        Ok((post_csv, comments_csv)) => {
            println!("{}", post_csv.display());
            println!("{}", comments_csv.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
