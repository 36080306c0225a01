use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::{CapturedCookie, FbError, ProxyConfig};

/// An outgoing request the page made to the internal query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub url: String,
    /// Request headers as sent by the page (names in any case).
    pub headers: Vec<(String, String)>,
    /// Raw `application/x-www-form-urlencoded` body, if any.
    pub post_data: Option<String>,
}

impl InterceptedRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Something that can render a page in an isolated browsing context.
///
/// Implemented by [`crate::harvest::ChromiumRenderer`]; tests substitute a fake.
pub trait PageRenderer: Send + Sync {
    /// Opens a fresh browsing context seeded with `seed_cookies`.
    ///
    /// Every request to the internal query endpoint observed while the
    /// session lives is forwarded to `observer`. Media sub-requests are blocked.
    fn open<'a>(
        &'a self,
        proxy: Option<&'a ProxyConfig>,
        seed_cookies: &'a [CapturedCookie],
        observer: UnboundedSender<InterceptedRequest>,
    ) -> BoxFuture<'a, Result<Box<dyn PageSession>, FbError>>;
}

/// One live page inside a browsing context. Must be closed when done.
pub trait PageSession: Send {
    /// Navigates to `url` and waits for the load event.
    fn navigate<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<(), FbError>>;

    /// Waits until the network goes quiet, for at most `timeout`.
    fn wait_for_idle(&mut self, timeout: Duration) -> BoxFuture<'_, Result<(), FbError>>;

    /// Current serialized document.
    fn content(&mut self) -> BoxFuture<'_, Result<String, FbError>>;

    /// Cookies visible to the browsing context.
    fn cookies(&mut self) -> BoxFuture<'_, Result<Vec<CapturedCookie>, FbError>>;

    /// Tears the page and its browser down.
    fn close(self: Box<Self>) -> BoxFuture<'static, Result<(), FbError>>;
}

/// A single replayed call to the internal query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryRequest {
    /// Value of the friendly-name header; also used to label recorded fixtures.
    pub friendly_name: String,
    pub headers: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
}

impl QueryRequest {
    /// Form field lookup.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Something that can issue an authenticated POST to the internal query endpoint.
///
/// Implemented by [`crate::FbClient`]. A call performs exactly one attempt;
/// retries belong to the caller. Non-2xx statuses must surface as
/// [`FbError::Status`].
pub trait QueryClient: Send + Sync {
    fn post_query<'a>(
        &'a self,
        request: &'a QueryRequest,
        cookies: &'a [CapturedCookie],
    ) -> BoxFuture<'a, Result<String, FbError>>;
}
