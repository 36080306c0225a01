//! Session harvesting: load the post in a browser, watch its internal query
//! calls for session parameters, then read the page and its cookies.
//!
//! One harvest walks `Navigate → Intercept → Settle → Extract → Done`.
//! Navigation and quiescence timeouts degrade the result but never abort it;
//! only a page without a recognisable post id does.

#[cfg(feature = "browser")]
mod browser;
pub mod extract;

#[cfg(feature = "browser")]
pub use browser::ChromiumRenderer;
pub use extract::{encode_feedback_id, extract_post_id, scan_script_params};

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::core::client::constants::{
    BLOCKED_MEDIA_EXTENSIONS, DEFAULT_DPR, GRAPHQL_PATH, REQUIRED_PARAMS, SEED_COOKIE_DOMAIN,
    SEED_COOKIE_EXPIRES, SEED_COOKIES,
};
use crate::core::{
    CapturedCookie, FbError, InterceptedRequest, PageRenderer, PageSession, RawPage,
    ScrapeConfig, SessionParams,
};

/// Everything the replay stage needs from the browser.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub post_id: String,
    /// Harvested parameters, including `post_id` and `feedback_id`.
    pub params: SessionParams,
    pub page: RawPage,
    pub cookies: Vec<CapturedCookie>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Navigate,
    Intercept,
    Settle,
    Extract,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Navigate => "navigate",
            Phase::Intercept => "intercept",
            Phase::Settle => "settle",
            Phase::Extract => "extract",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Whether `url` targets the internal query endpoint.
pub fn is_query_endpoint(url: &str) -> bool {
    url.to_ascii_lowercase().contains(GRAPHQL_PATH)
}

/// Whether `url` is an image or video sub-resource that should be aborted.
pub fn is_blocked_media(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    BLOCKED_MEDIA_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// The two long-lived cookies every browsing context starts with.
pub fn seed_cookies() -> Vec<CapturedCookie> {
    SEED_COOKIES
        .iter()
        .map(|(name, value)| CapturedCookie {
            expires: Some(SEED_COOKIE_EXPIRES),
            ..CapturedCookie::new(*name, *value, SEED_COOKIE_DOMAIN)
        })
        .collect()
}

/// Fills still-missing required parameters from one observed query call.
///
/// `x-fb-lsd` comes from the request headers, everything else from the query
/// string or the form body (body values shadow query values).
pub fn absorb_request(params: &mut SessionParams, req: &InterceptedRequest) {
    let mut observed: Vec<(String, String)> = Url::parse(&req.url)
        .map(|u| u.query_pairs().into_owned().collect())
        .unwrap_or_default();
    if let Some(body) = req.post_data.as_deref() {
        observed.extend(url::form_urlencoded::parse(body.as_bytes()).into_owned());
    }

    for name in REQUIRED_PARAMS {
        let value = if name == "x-fb-lsd" {
            req.header(name).map(str::to_string)
        } else {
            observed
                .iter()
                .rev()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };
        if let Some(v) = value {
            params.fill(name, v);
        }
    }
}

/// Drives a [`PageRenderer`] through one harvest.
pub struct SessionHarvester<'a, R: PageRenderer + ?Sized> {
    renderer: &'a R,
    config: &'a ScrapeConfig,
}

impl<'a, R: PageRenderer + ?Sized> SessionHarvester<'a, R> {
    pub fn new(renderer: &'a R, config: &'a ScrapeConfig) -> Self {
        Self { renderer, config }
    }

    /// Harvests session parameters, page content and cookies for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FbError::PostIdNotFound`] when the page has no post id, or the
    /// browser error when neither proxied nor direct egress can open a page or
    /// the page content cannot be read.
    #[tracing::instrument(skip(self))]
    pub async fn harvest(&self, url: &str) -> Result<Harvest, FbError> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let seeds = seed_cookies();

        debug!(phase = %Phase::Navigate, "opening browsing context");
        let (mut session, proxied) = self.open_session(&seeds, tx.clone()).await?;

        debug!(phase = %Phase::Intercept, "observing query traffic");
        if let Err(e) = self.navigate(session.as_mut(), url).await {
            if proxied && !matches!(e, FbError::Timeout(_)) {
                warn!("navigation through proxy failed ({e}); retrying over direct egress");
                close_quietly(session).await;
                session = self.renderer.open(None, &seeds, tx.clone()).await?;
                if let Err(e) = self.navigate(session.as_mut(), url).await {
                    warn!("navigation failed, continuing with partial page: {e}");
                }
            } else {
                warn!("navigation failed, continuing with partial page: {e}");
            }
        }

        debug!(phase = %Phase::Settle, timeout = ?self.config.idle_timeout, "waiting for network quiescence");
        match tokio::time::timeout(
            self.config.idle_timeout,
            session.wait_for_idle(self.config.idle_timeout),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("network did not settle: {e}"),
            Err(_) => warn!("network did not settle within {:?}", self.config.idle_timeout),
        }

        debug!(phase = %Phase::Extract, "reading page content and cookies");
        let html = session.content().await;
        let cookies = match session.cookies().await {
            Ok(c) => c,
            Err(e) => {
                warn!("could not read cookies: {e}");
                Vec::new()
            }
        };
        close_quietly(session).await;
        drop(tx);

        let mut params = SessionParams::new();
        let mut observed = 0usize;
        while let Ok(req) = rx.try_recv() {
            if is_query_endpoint(&req.url) {
                observed += 1;
                absorb_request(&mut params, &req);
            }
        }
        debug!(observed, captured = params.len(), "merged intercepted query parameters");

        let html = html?;
        let post_id = extract_post_id(&html)?;
        let feedback_id = encode_feedback_id(&post_id);
        params.set("post_id", post_id.clone());
        params.set("feedback_id", feedback_id);

        let missing = params.missing(&REQUIRED_PARAMS);
        if !missing.is_empty() {
            debug!(?missing, "scanning embedded scripts for missing parameters");
            for (name, value) in scan_script_params(&html, &missing) {
                params.fill(&name, value);
            }
        }
        params.fill("dpr", DEFAULT_DPR);

        let still_missing = params.missing(&REQUIRED_PARAMS);
        if !still_missing.is_empty() {
            warn!(missing = ?still_missing, "some session parameters could not be recovered");
        }

        info!(phase = %Phase::Done, post_id = %post_id, cookies = cookies.len(), "harvest complete");
        Ok(Harvest {
            post_id,
            params,
            page: RawPage {
                url: url.to_string(),
                html,
            },
            cookies,
        })
    }

    async fn open_session(
        &self,
        seeds: &[CapturedCookie],
        tx: mpsc::UnboundedSender<InterceptedRequest>,
    ) -> Result<(Box<dyn PageSession>, bool), FbError> {
        let Some(proxy) = self.config.proxy.as_ref() else {
            return Ok((self.renderer.open(None, seeds, tx).await?, false));
        };
        match self.renderer.open(Some(proxy), seeds, tx.clone()).await {
            Ok(s) => Ok((s, true)),
            Err(e) => {
                warn!("failed to launch browser with proxy: {e}; falling back to local IP");
                Ok((self.renderer.open(None, seeds, tx).await?, false))
            }
        }
    }

    async fn navigate(&self, session: &mut dyn PageSession, url: &str) -> Result<(), FbError> {
        match tokio::time::timeout(self.config.navigation_timeout, session.navigate(url)).await {
            Ok(res) => res,
            Err(_) => Err(FbError::Timeout("navigating to the post")),
        }
    }
}

async fn close_quietly(session: Box<dyn PageSession>) {
    if let Err(e) = session.close().await {
        warn!("failed to close browser session: {e}");
    }
}
