//! Query replay: re-issue the page's own comment and reply queries directly.
//!
//! Comment pages are walked one cursor at a time. Every comment that reports
//! replies gets all of its reply pages fetched before the next comment page
//! is requested. Failures never abort the walk: an exhausted comments call
//! returns what was gathered so far, an exhausted replies call yields no
//! replies for that comment.

pub mod parse;
pub mod request;

pub use parse::{ConnectionPage, comment_from_node, parse_comments_page, parse_replies_page};
pub use request::RequestKind;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tracing::{debug, info, warn};

use crate::core::{
    CapturedCookie, CommentRecord, FbError, QueryClient, ReplyRecord, ScrapeConfig,
    SessionParams,
};
use crate::normalize::extract_payload;

/// Comments gathered by a replay, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayedComments {
    pub comments: Vec<CommentRecord>,
    /// Largest total reported by any comments page.
    pub total_count: Option<u64>,
    /// Number of comment pages successfully parsed.
    pub pages: u32,
}

/// Replays comment and reply queries with harvested session state.
pub struct QueryReplayer<'a, Q: QueryClient + ?Sized> {
    client: &'a Q,
    params: &'a SessionParams,
    cookies: &'a [CapturedCookie],
    referer: &'a str,
    config: &'a ScrapeConfig,
}

impl<'a, Q: QueryClient + ?Sized> QueryReplayer<'a, Q> {
    pub fn new(
        client: &'a Q,
        params: &'a SessionParams,
        cookies: &'a [CapturedCookie],
        referer: &'a str,
        config: &'a ScrapeConfig,
    ) -> Self {
        Self {
            client,
            params,
            cookies,
            referer,
            config,
        }
    }

    /// Walks the comments connection of the post identified by `feedback_id`.
    ///
    /// At most `max_depth` pages are requested.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_comments(&self, feedback_id: &str) -> ReplayedComments {
        let mut out = ReplayedComments::default();
        let mut cursor: Option<String> = None;

        while out.pages < self.config.max_depth {
            let kind = RequestKind::Comments {
                feedback_id,
                cursor: cursor.as_deref(),
            };
            let raw = match self.execute(&kind).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        gathered = out.comments.len(),
                        "comments query gave up, keeping partial result: {e}"
                    );
                    return out;
                }
            };
            let Some(data) = extract_payload(&raw) else {
                warn!(page = out.pages, "comments response carried no usable payload");
                return out;
            };

            let mut page = parse_comments_page(&data);
            out.pages += 1;
            out.total_count = out.total_count.max(page.total_count);
            debug!(page = out.pages, comments = page.items.len(), "parsed comments page");

            self.attach_replies(&mut page.items).await;
            out.comments.append(&mut page.items);

            match page.page_info.next_cursor() {
                Some(next) => cursor = Some(next.to_string()),
                None => {
                    info!(comments = out.comments.len(), pages = out.pages, "comments exhausted");
                    return out;
                }
            }
        }

        warn!(
            max_depth = self.config.max_depth,
            comments = out.comments.len(),
            "comment pagination stopped at depth ceiling"
        );
        out
    }

    /// Collects every reply page under one comment into a flat list.
    ///
    /// `expansion_token` opens the first page; `None` asks for the default
    /// first page.
    pub async fn fetch_replies(
        &self,
        feedback_id: &str,
        expansion_token: Option<&str>,
    ) -> Vec<ReplyRecord> {
        let mut replies = Vec::new();
        let mut token = expansion_token.map(str::to_string);
        let mut pages = 0u32;

        while pages < self.config.max_depth {
            let kind = RequestKind::Replies {
                feedback_id,
                expansion_token: token.as_deref(),
            };
            let page = match self.execute(&kind).await {
                Ok(raw) => extract_payload(&raw)
                    .map(|data| parse_replies_page(&data))
                    .unwrap_or_default(),
                Err(e) => {
                    warn!(feedback_id, "replies query gave up: {e}");
                    ConnectionPage::default()
                }
            };
            pages += 1;
            replies.extend(page.items);

            match page.page_info.next_cursor() {
                Some(next) => token = Some(next.to_string()),
                None => return replies,
            }
        }

        debug!(feedback_id, pages, "reply pagination stopped at depth ceiling");
        replies
    }

    /// Fills `replies` for every comment that reports any, preserving order.
    async fn attach_replies(&self, comments: &mut [CommentRecord]) {
        let jobs: Vec<(usize, String, Option<String>)> = comments
            .iter()
            .enumerate()
            .filter(|(_, c)| c.reply_count > 0)
            .filter_map(|(i, c)| {
                c.feedback_id
                    .clone()
                    .map(|fid| (i, fid, c.expansion_token.clone()))
            })
            .collect();
        if jobs.is_empty() {
            return;
        }

        let results: Vec<(usize, Vec<ReplyRecord>)> = stream::iter(jobs)
            .map(|(i, fid, token)| async move {
                (i, self.fetch_replies(&fid, token.as_deref()).await)
            })
            .buffered(self.config.reply_concurrency.max(1))
            .collect()
            .await;

        for (i, replies) in results {
            comments[i].replies = replies;
        }
    }

    /// One logical call: pause, post, and retry transport failures with backoff.
    async fn execute(&self, kind: &RequestKind<'_>) -> Result<String, FbError> {
        let request = kind.build(self.params, self.referer, Utc::now().timestamp())?;
        let retry = &self.config.retry;
        let attempts = retry.attempts();
        let mut attempt = 0u32;

        loop {
            if !self.config.request_delay.is_zero() {
                tokio::time::sleep(self.config.request_delay).await;
            }
            match self.client.post_query(&request, self.cookies).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transport() && attempt + 1 < attempts => {
                    let delay = retry.backoff.delay(attempt);
                    warn!(
                        %kind,
                        attempt = attempt + 1,
                        attempts,
                        ?delay,
                        "query failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
