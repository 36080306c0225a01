//! Public client surface + builder.
//! Internals are split into `constants` (UA, endpoints, query documents) and
//! `retry` (backoff policy used by query replay).

pub(crate) mod constants;
mod retry;

pub use retry::{Backoff, RetryConfig};

use crate::core::services::{QueryClient, QueryRequest};
use crate::core::{CapturedCookie, FbError, net};
use chrono::{DateTime, Utc};
use constants::{DEFAULT_GRAPHQL_URL, USER_AGENT};
use futures::future::BoxFuture;
use reqwest::Client;
use reqwest::cookie::Jar;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// HTTP client for the internal query endpoint.
///
/// Harvested cookies are loaded into a cookie jar scoped to the query
/// endpoint, so only cookies whose domain and path match it are sent. The
/// jar-backed client is kept until a different cookie set is passed in.
#[derive(Debug, Clone)]
pub struct FbClient {
    settings: HttpSettings,
    graphql_url: Url,
    session: Arc<Mutex<Option<(Vec<CapturedCookie>, Client)>>>,
}

#[derive(Debug, Clone)]
struct HttpSettings {
    user_agent: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl HttpSettings {
    fn client(&self, jar: Arc<Jar>) -> Result<Client, FbError> {
        let mut httpb = reqwest::Client::builder()
            .cookie_store(true)
            .cookie_provider(jar)
            .user_agent(self.user_agent.as_str());
        if let Some(t) = self.timeout {
            httpb = httpb.timeout(t);
        }
        if let Some(ct) = self.connect_timeout {
            httpb = httpb.connect_timeout(ct);
        }
        Ok(httpb.build()?)
    }
}

impl FbClient {
    /// Create a new builder.
    pub fn builder() -> FbClientBuilder {
        FbClientBuilder::default()
    }

    /// Where queries are posted.
    pub fn graphql_url(&self) -> &Url {
        &self.graphql_url
    }

    /// A client whose jar holds `cookies`, reused while the cookie set is unchanged.
    fn http_for(&self, cookies: &[CapturedCookie]) -> Result<Client, FbError> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((jarred, client)) = session.as_ref() {
            if jarred.as_slice() == cookies {
                return Ok(client.clone());
            }
        }
        let jar = cookie_jar(cookies, &self.graphql_url);
        let client = self.settings.client(Arc::new(jar))?;
        *session = Some((cookies.to_vec(), client.clone()));
        Ok(client)
    }
}

/// Renders a captured cookie as a `Set-Cookie` value that keeps its scope and expiry.
pub(crate) fn set_cookie_string(c: &CapturedCookie) -> String {
    let mut s = format!("{}={}", c.name, c.value);
    let domain = c.domain.trim();
    if !domain.is_empty() {
        s.push_str("; Domain=");
        s.push_str(domain);
    }
    let path = if c.path.is_empty() { "/" } else { c.path.as_str() };
    s.push_str("; Path=");
    s.push_str(path);
    if let Some(at) = c
        .expires
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs as i64, 0))
    {
        s.push_str(&at.format("; Expires=%a, %d %b %Y %H:%M:%S GMT").to_string());
    }
    if c.secure {
        s.push_str("; Secure");
    }
    if c.http_only {
        s.push_str("; HttpOnly");
    }
    s
}

/// Loads `cookies` into a jar as if `url` had set them. Cookies whose domain
/// does not cover `url`, or that have already expired, are dropped.
pub(crate) fn cookie_jar(cookies: &[CapturedCookie], url: &Url) -> Jar {
    let jar = Jar::default();
    for c in cookies {
        jar.add_cookie_str(&set_cookie_string(c), url);
    }
    jar
}

impl QueryClient for FbClient {
    fn post_query<'a>(
        &'a self,
        request: &'a QueryRequest,
        cookies: &'a [CapturedCookie],
    ) -> BoxFuture<'a, Result<String, FbError>> {
        Box::pin(async move {
            let mut req = self
                .http_for(cookies)?
                .post(self.graphql_url.clone())
                .form(&request.form);
            for (name, value) in &request.headers {
                req = req.header(name.as_str(), value.as_str());
            }

            let resp = req.send().await?;
            if !resp.status().is_success() {
                return Err(FbError::Status {
                    status: resp.status().as_u16(),
                    url: resp.url().to_string(),
                });
            }
            let body = net::get_text(resp, "graphql", &request.friendly_name, "json").await?;
            Ok(body)
        })
    }
}

/* ----------------------- Builder ----------------------- */

#[derive(Default)]
pub struct FbClientBuilder {
    user_agent: Option<String>,
    graphql_url: Option<Url>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl FbClientBuilder {
    /// Override the User-Agent.
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Override the query endpoint (e.g., `https://www.facebook.com/api/graphql/`).
    #[must_use]
    pub fn graphql_url(mut self, url: Url) -> Self {
        self.graphql_url = Some(url);
        self
    }

    /// Set a global request timeout (overall). Default: none.
    #[must_use]
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = Some(dur);
        self
    }

    /// Set a connect timeout. Default: none.
    #[must_use]
    pub fn connect_timeout(mut self, dur: Duration) -> Self {
        self.connect_timeout = Some(dur);
        self
    }

    pub fn build(self) -> Result<FbClient, FbError> {
        let graphql_url = match self.graphql_url {
            Some(u) => u,
            None => Url::parse(DEFAULT_GRAPHQL_URL)?,
        };

        let settings = HttpSettings {
            user_agent: self.user_agent.unwrap_or_else(|| USER_AGENT.to_string()),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
        };
        let http = settings.client(Arc::new(Jar::default()))?;

        Ok(FbClient {
            settings,
            graphql_url,
            session: Arc::new(Mutex::new(Some((Vec::new(), http)))),
        })
    }
}
