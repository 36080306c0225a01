#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::{fs, future};

use fbpost_rs::{
    CapturedCookie, FbError, InterceptedRequest, PageRenderer, PageSession, ProxyConfig,
    QueryClient, QueryRequest, RetryConfig, ScrapeConfig,
};
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedSender;

pub const COMMENTS_QUERY: &str = "CommentsListComponentsPaginationQuery";
pub const REPLIES_QUERY: &str = "Depth1CommentsListPaginationQuery";
pub const POST_URL: &str = "https://www.facebook.com/examplepage/posts/1234567890123";

pub fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e))
}

/// No pauses, short soft timeouts, three attempts per call.
pub fn fast_config() -> ScrapeConfig {
    ScrapeConfig::default()
        .with_request_delay(Duration::ZERO)
        .with_retry(RetryConfig::immediate(3))
        .with_navigation_timeout(Duration::from_millis(200))
        .with_idle_timeout(Duration::from_millis(200))
}

pub fn proxy() -> ProxyConfig {
    ProxyConfig {
        server: "proxy.test:10000".into(),
        username: "user".into(),
        password: "secret".into(),
    }
}

/// A query call the page makes while it loads.
pub fn graphql_call(query: &str, body: &str, lsd_header: Option<&str>) -> InterceptedRequest {
    InterceptedRequest {
        url: format!("https://www.facebook.com/api/graphql/?{query}"),
        headers: lsd_header
            .map(|v| vec![("X-FB-LSD".to_string(), v.to_string())])
            .unwrap_or_default(),
        post_data: Some(body.to_string()),
    }
}

/* ----------------------- Fake renderer ----------------------- */

#[derive(Clone, Default)]
pub struct FakeRenderer {
    pub html: String,
    pub intercepted: Vec<InterceptedRequest>,
    pub cookies: Vec<CapturedCookie>,
    pub fail_proxied_open: bool,
    pub fail_proxied_navigation: bool,
    pub navigation_hangs: bool,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FakeRenderer {
    pub fn with_html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.log.lock().unwrap().push(event.into());
    }
}

impl PageRenderer for FakeRenderer {
    fn open<'a>(
        &'a self,
        proxy: Option<&'a ProxyConfig>,
        seed_cookies: &'a [CapturedCookie],
        observer: UnboundedSender<InterceptedRequest>,
    ) -> BoxFuture<'a, Result<Box<dyn PageSession>, FbError>> {
        Box::pin(async move {
            let proxied = proxy.is_some();
            self.record(format!("open proxied={proxied}"));
            if proxied && self.fail_proxied_open {
                return Err(FbError::Browser("proxy refused the tunnel".into()));
            }
            Ok(Box::new(FakeSession {
                renderer: self.clone(),
                proxied,
                observer,
                seeds: seed_cookies.to_vec(),
            }) as Box<dyn PageSession>)
        })
    }
}

struct FakeSession {
    renderer: FakeRenderer,
    proxied: bool,
    observer: UnboundedSender<InterceptedRequest>,
    seeds: Vec<CapturedCookie>,
}

impl PageSession for FakeSession {
    fn navigate<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<(), FbError>> {
        Box::pin(async move {
            self.renderer.record(format!("navigate {url}"));
            tracing::debug!("renderer navigating to {url}");
            if self.renderer.navigation_hangs {
                future::pending::<()>().await;
            }
            if self.proxied && self.renderer.fail_proxied_navigation {
                return Err(FbError::Browser("net::ERR_TUNNEL_CONNECTION_FAILED".into()));
            }
            for req in &self.renderer.intercepted {
                let _ = self.observer.send(req.clone());
            }
            Ok(())
        })
    }

    fn wait_for_idle(&mut self, _timeout: Duration) -> BoxFuture<'_, Result<(), FbError>> {
        Box::pin(async { Ok(()) })
    }

    fn content(&mut self) -> BoxFuture<'_, Result<String, FbError>> {
        Box::pin(async move { Ok(self.renderer.html.clone()) })
    }

    fn cookies(&mut self) -> BoxFuture<'_, Result<Vec<CapturedCookie>, FbError>> {
        Box::pin(async move {
            let mut jar = self.seeds.clone();
            jar.extend(self.renderer.cookies.iter().cloned());
            Ok(jar)
        })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<(), FbError>> {
        Box::pin(async move {
            self.renderer.record("close");
            Ok(())
        })
    }
}

/* ----------------------- Log capture ----------------------- */

/// Collects formatted log lines from a test-local subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Installs a debug-level subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Index of the first line containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.lines().iter().position(|l| l.contains(needle))
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/* ----------------------- Scripted query client ----------------------- */

/// Answers each call through `respond(request, call_index)` and keeps every request.
pub struct ScriptedQueryClient<F> {
    respond: F,
    calls: Mutex<Vec<QueryRequest>>,
}

impl<F> ScriptedQueryClient<F>
where
    F: Fn(&QueryRequest, usize) -> Result<String, FbError> + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<QueryRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_kinds(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|r| match r.friendly_name.as_str() {
                COMMENTS_QUERY => "comments".to_string(),
                REPLIES_QUERY => format!("replies:{}", variables(r)["id"].as_str().unwrap_or("")),
                other => other.to_string(),
            })
            .collect()
    }
}

impl<F> QueryClient for ScriptedQueryClient<F>
where
    F: Fn(&QueryRequest, usize) -> Result<String, FbError> + Send + Sync,
{
    fn post_query<'a>(
        &'a self,
        request: &'a QueryRequest,
        _cookies: &'a [CapturedCookie],
    ) -> BoxFuture<'a, Result<String, FbError>> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        let result = (self.respond)(request, index);
        Box::pin(async move { result })
    }
}

pub fn variables(request: &QueryRequest) -> Value {
    serde_json::from_str(request.field("variables").unwrap_or("{}")).unwrap()
}

pub fn server_error() -> FbError {
    FbError::Status {
        status: 502,
        url: "https://www.facebook.com/api/graphql/".into(),
    }
}

/* ----------------------- Payload builders ----------------------- */

/// `(id, reply_count)` per comment; the feedback id is `fb-<id>`.
pub fn comments_body(comments: &[(&str, u64)], next: Option<&str>) -> String {
    let edges: Vec<Value> = comments
        .iter()
        .map(|(id, replies)| {
            json!({"node": {
                "id": id,
                "author": {"name": format!("author {id}"), "id": format!("u-{id}")},
                "body": {"text": format!("text {id}")},
                "created_time": 1704164645,
                "feedback": {
                    "id": format!("fb-{id}"),
                    "reactors": {"count_reduced": "1"},
                    "replies_fields": {"total_count": replies},
                    "expansion_info": {"expansion_token": format!("exp-{id}")}
                }
            }})
        })
        .collect();
    json!({
        "data": {"node": {"comment_rendering_instance_for_feed_location": {"comments": {
            "total_count": comments.len(),
            "page_info": {"end_cursor": next, "has_next_page": next.is_some()},
            "edges": edges
        }}}},
        "extensions": {"is_final": true}
    })
    .to_string()
}

pub fn replies_body(ids: &[&str], next: Option<&str>) -> String {
    let edges: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({"node": {
                "id": id,
                "author": {"name": format!("author {id}"), "id": format!("u-{id}")},
                "body": {"text": format!("reply {id}")},
                "feedback": {"id": format!("fb-{id}"), "reactors": {"count_reduced": "0"}}
            }})
        })
        .collect();
    json!({
        "data": {"node": {"replies_connection": {
            "page_info": {"end_cursor": next, "has_next_page": next.is_some()},
            "edges": edges
        }}},
        "extensions": {"is_final": true}
    })
    .to_string()
}
