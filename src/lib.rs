//! fbpost-rs: scrape a public Facebook post and its full comment tree.
//!
//! A scrape loads the post in a headless browser to harvest session state,
//! replays the page's own comment and reply queries over plain HTTP, merges
//! those with what the page already embeds, and hands back one [`PostRecord`].
//!
//! ```no_run
//! # async fn run() -> Result<(), fbpost_rs::FbError> {
//! use fbpost_rs::{ScrapeConfig, Scraper, export};
//!
//! let scraper = Scraper::from_config(ScrapeConfig::from_env())?;
//! let post = scraper.scrape("https://www.facebook.com/somepage/posts/1234567890123").await?;
//! export::save_csv(std::path::Path::new("out"), &post)?;
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod core;
pub mod export;
pub mod harvest;
pub mod normalize;
pub mod replay;
pub mod scrape;

pub use core::{
    Attachment, Author, Backoff, CapturedCookie, CommentRecord, Comments, FbClient,
    FbClientBuilder, FbError, InterceptedRequest, PageInfo, PageRenderer, PageSession,
    PostRecord, ProxyConfig, QueryClient, QueryRequest, RawPage, ReactionCount, Reactions,
    ReplyRecord, RetryConfig, ScrapeConfig, SessionParams,
};
pub use export::{Tables, save_csv, write_csv};
#[cfg(feature = "browser")]
pub use harvest::ChromiumRenderer;
pub use harvest::{Harvest, SessionHarvester};
pub use normalize::extract_payload;
pub use replay::{QueryReplayer, ReplayedComments, RequestKind};
pub use scrape::{ScrapeFailure, Scraper};
