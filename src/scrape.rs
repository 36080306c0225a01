//! The single inbound operation: scrape one post URL into a [`PostRecord`].

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::assemble::assemble;
use crate::core::{FbError, PageRenderer, PostRecord, QueryClient, ScrapeConfig};
use crate::harvest::SessionHarvester;
use crate::normalize::extract_payload;
use crate::replay::QueryReplayer;

#[cfg(feature = "browser")]
use crate::core::FbClient;
#[cfg(feature = "browser")]
use crate::harvest::ChromiumRenderer;

/// What the caller of [`Scraper::scrape_guarded`] sees when a scrape fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScrapeFailure {
    pub message: String,
}

/// Harvest, replay and assemble, wired to a renderer and a query client.
pub struct Scraper<R, Q> {
    renderer: R,
    client: Q,
    config: ScrapeConfig,
}

#[cfg(feature = "browser")]
impl Scraper<ChromiumRenderer, FbClient> {
    /// Headless Chromium plus the default query client.
    pub fn from_config(config: ScrapeConfig) -> Result<Self, FbError> {
        config.validate()?;
        let client = FbClient::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self::new(ChromiumRenderer::from_config(&config), client, config))
    }
}

impl<R: PageRenderer, Q: QueryClient> Scraper<R, Q> {
    pub fn new(renderer: R, client: Q, config: ScrapeConfig) -> Self {
        Self {
            renderer,
            client,
            config,
        }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Scrapes the post at `post_url`.
    ///
    /// Partial data is not an error: timeouts, exhausted retries and missing
    /// page payloads all still produce a record.
    ///
    /// # Errors
    ///
    /// Fails on an unusable configuration, an unparseable URL, when no browser session can be opened, or
    /// when the page exposes no post id.
    #[tracing::instrument(skip(self))]
    pub async fn scrape(&self, post_url: &str) -> Result<PostRecord, FbError> {
        self.config.validate()?;
        Url::parse(post_url)?;

        let harvest = SessionHarvester::new(&self.renderer, &self.config)
            .harvest(post_url)
            .await?;
        let feedback_id = harvest
            .params
            .get("feedback_id")
            .ok_or_else(|| FbError::Internal("feedback id missing after harvest".into()))?;

        let replayer = QueryReplayer::new(
            &self.client,
            &harvest.params,
            &harvest.cookies,
            &harvest.page.url,
            &self.config,
        );
        let replayed = replayer.fetch_comments(feedback_id).await;

        let page_data = extract_payload(&harvest.page.html);
        let record = assemble(page_data.as_ref(), replayed, &harvest.post_id, post_url);
        info!(
            post_id = %record.post_id,
            comments = record.comments.details.len(),
            total = record.comments.total_count,
            "scrape complete"
        );
        Ok(record)
    }

    /// Like [`Scraper::scrape`], but turns every error and panic into a
    /// [`ScrapeFailure`] carrying a user-facing message.
    pub async fn scrape_guarded(&self, post_url: &str) -> Result<PostRecord, ScrapeFailure> {
        match AssertUnwindSafe(self.scrape(post_url)).catch_unwind().await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(e)) => {
                error!("scrape of {post_url} failed: {e}");
                Err(ScrapeFailure {
                    message: e.user_message(),
                })
            }
            Err(panic) => {
                let detail = panic_detail(panic.as_ref());
                error!("scrape of {post_url} panicked: {detail}");
                Err(ScrapeFailure {
                    message: format!("Scraping failed: {detail}"),
                })
            }
        }
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected internal error".to_string()
    }
}
