//! Headless Chromium implementation of [`PageRenderer`] over the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::fetch::{
    self, AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EventAuthRequired, EventRequestPaused, FailRequestParams,
    RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    self, CookieParam, ErrorReason, Headers, SetCookiesParams, SetExtraHttpHeadersParams,
    TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::SetBypassCspParams;
use futures::StreamExt;
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{is_blocked_media, is_query_endpoint};
use crate::core::client::constants::{BROWSER_ARGS, NAVIGATION_HEADERS, USER_AGENT};
use crate::core::{
    CapturedCookie, FbError, InterceptedRequest, PageRenderer, PageSession, ProxyConfig,
    ScrapeConfig,
};

/// Launches a fresh headless Chromium per harvest.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    headless: bool,
    executable: Option<PathBuf>,
    request_timeout: Duration,
}

impl Default for ChromiumRenderer {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ChromiumRenderer {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            headless: config.headless,
            executable: config.chrome_executable.clone(),
            request_timeout: config.navigation_timeout.max(Duration::from_secs(30)),
        }
    }

    fn browser_config(&self, proxy: Option<&ProxyConfig>) -> Result<BrowserConfig, FbError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(self.request_timeout);
        if !self.headless {
            builder = builder.with_head();
        }
        for arg in BROWSER_ARGS {
            builder = builder.arg(arg);
        }
        if let Some(p) = proxy {
            builder = builder.arg(format!("--proxy-server={}", p.server));
        }
        if let Some(exe) = &self.executable {
            builder = builder.chrome_executable(exe);
        }
        builder.build().map_err(FbError::Browser)
    }
}

impl PageRenderer for ChromiumRenderer {
    fn open<'a>(
        &'a self,
        proxy: Option<&'a ProxyConfig>,
        seed_cookies: &'a [CapturedCookie],
        observer: UnboundedSender<InterceptedRequest>,
    ) -> BoxFuture<'a, Result<Box<dyn PageSession>, FbError>> {
        Box::pin(async move {
            let config = self.browser_config(proxy)?;
            let (mut browser, mut handler) = Browser::launch(config).await?;
            let handler_task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        debug!("browser handler error: {e}");
                    }
                }
            });
            info!(proxied = proxy.is_some(), "headless browser launched");

            match prepare_page(&browser, proxy, seed_cookies, observer).await {
                Ok((page, mut tasks)) => {
                    tasks.push(handler_task);
                    Ok(Box::new(ChromiumSession {
                        browser,
                        page,
                        tasks,
                    }) as Box<dyn PageSession>)
                }
                Err(e) => {
                    if let Err(close_err) = browser.close().await {
                        warn!("failed to close browser after setup error: {close_err}");
                    }
                    let _ = browser.wait().await;
                    handler_task.abort();
                    Err(e)
                }
            }
        })
    }
}

async fn prepare_page(
    browser: &Browser,
    proxy: Option<&ProxyConfig>,
    seed_cookies: &[CapturedCookie],
    observer: UnboundedSender<InterceptedRequest>,
) -> Result<(Page, Vec<JoinHandle<()>>), FbError> {
    let page = browser.new_page("about:blank").await?;

    page.execute(network::EnableParams::default()).await?;
    page.execute(SetUserAgentOverrideParams::new(USER_AGENT)).await?;
    page.execute(SetBypassCspParams::new(true)).await?;

    let extra: Map<String, Value> = NAVIGATION_HEADERS
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
        .collect();
    page.execute(SetExtraHttpHeadersParams::new(Headers::new(Value::Object(extra))))
        .await?;

    let cookies = seed_cookies
        .iter()
        .map(cookie_param)
        .collect::<Result<Vec<_>, _>>()?;
    page.execute(SetCookiesParams::new(cookies)).await?;

    let mut tasks = Vec::new();

    let paused = page.event_listener::<EventRequestPaused>().await?;
    tasks.push(spawn_interceptor(page.clone(), paused, observer));

    if let Some(p) = proxy {
        let challenges = page.event_listener::<EventAuthRequired>().await?;
        tasks.push(spawn_proxy_auth(page.clone(), challenges, p.clone()));
    }

    let pattern = RequestPattern::builder()
        .url_pattern("*")
        .request_stage(RequestStage::Request)
        .build();
    page.execute(
        fetch::EnableParams::builder()
            .pattern(pattern)
            .handle_auth_requests(proxy.is_some())
            .build(),
    )
    .await?;

    Ok((page, tasks))
}

fn spawn_interceptor(
    page: Page,
    mut paused: chromiumoxide::listeners::EventStream<EventRequestPaused>,
    observer: UnboundedSender<InterceptedRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let url = event.request.url.clone();
            if is_blocked_media(&url) {
                let fail = FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient);
                if let Err(e) = page.execute(fail).await {
                    debug!("failed to abort media request {url}: {e}");
                }
                continue;
            }

            if is_query_endpoint(&url) {
                let observed = InterceptedRequest {
                    url: url.clone(),
                    headers: header_pairs(event.request.headers.inner()),
                    post_data: event.request.post_data.clone(),
                };
                // Receiver gone means the harvest already finished reading.
                let _ = observer.send(observed);
            }

            if let Err(e) = page
                .execute(ContinueRequestParams::new(event.request_id.clone()))
                .await
            {
                debug!("failed to continue request {url}: {e}");
            }
        }
    })
}

fn spawn_proxy_auth(
    page: Page,
    mut challenges: chromiumoxide::listeners::EventStream<EventAuthRequired>,
    proxy: ProxyConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = challenges.next().await {
            let response = AuthChallengeResponse::builder()
                .response(AuthChallengeResponseResponse::ProvideCredentials)
                .username(proxy.username.clone())
                .password(proxy.password.clone())
                .build();
            match response {
                Ok(r) => {
                    let answer = ContinueWithAuthParams::new(event.request_id.clone(), r);
                    if let Err(e) = page.execute(answer).await {
                        warn!("failed to answer proxy auth challenge: {e}");
                    }
                }
                Err(e) => warn!("could not build proxy auth response: {e}"),
            }
        }
    })
}

fn cookie_param(c: &CapturedCookie) -> Result<CookieParam, FbError> {
    let mut b = CookieParam::builder()
        .name(c.name.clone())
        .value(c.value.clone())
        .domain(c.domain.clone())
        .path(c.path.clone())
        .secure(c.secure)
        .http_only(c.http_only);
    if let Some(exp) = c.expires {
        b = b.expires(TimeSinceEpoch::new(exp));
    }
    b.build().map_err(FbError::Browser)
}

fn header_pairs(headers: &Value) -> Vec<(String, String)> {
    headers
        .as_object()
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Resolves once `document.readyState` is complete and the resource count has
/// been stable for a second, or reports `ok: false` at the deadline.
fn idle_probe(timeout: Duration) -> String {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    format!(
        r#"(async () => {{
            const timeoutMs = {timeout_ms};
            const idleMs = 1000;
            const interval = 250;
            const start = Date.now();
            let last = performance.getEntriesByType('resource').length;
            let stable = 0;
            while (Date.now() - start < timeoutMs) {{
                await new Promise(r => setTimeout(r, interval));
                const cur = performance.getEntriesByType('resource').length;
                if (document.readyState === 'complete' && cur === last) {{
                    stable += interval;
                    if (stable >= idleMs) return {{ ok: true, resources: cur }};
                }} else {{
                    stable = 0;
                }}
                last = cur;
            }}
            return {{ ok: false, resources: last }};
        }})()"#
    )
}

struct ChromiumSession {
    browser: Browser,
    page: Page,
    tasks: Vec<JoinHandle<()>>,
}

impl PageSession for ChromiumSession {
    fn navigate<'a>(&'a mut self, url: &'a str) -> BoxFuture<'a, Result<(), FbError>> {
        Box::pin(async move {
            self.page.goto(url).await?;
            Ok(())
        })
    }

    fn wait_for_idle(&mut self, timeout: Duration) -> BoxFuture<'_, Result<(), FbError>> {
        Box::pin(async move {
            let result = self.page.evaluate(idle_probe(timeout)).await?;
            let info: Value = result
                .into_value()
                .map_err(|e| FbError::Browser(format!("idle probe result: {e}")))?;
            if info.get("ok").and_then(Value::as_bool).unwrap_or(false) {
                Ok(())
            } else {
                Err(FbError::Timeout("waiting for network quiescence"))
            }
        })
    }

    fn content(&mut self) -> BoxFuture<'_, Result<String, FbError>> {
        Box::pin(async move { Ok(self.page.content().await?) })
    }

    fn cookies(&mut self) -> BoxFuture<'_, Result<Vec<CapturedCookie>, FbError>> {
        Box::pin(async move {
            let cookies = self.page.get_cookies().await?;
            Ok(cookies
                .into_iter()
                .map(|c| CapturedCookie {
                    expires: (!c.session).then_some(c.expires),
                    name: c.name,
                    value: c.value,
                    domain: c.domain,
                    path: c.path,
                    http_only: c.http_only,
                    secure: c.secure,
                })
                .collect())
        })
    }

    fn close(self: Box<Self>) -> BoxFuture<'static, Result<(), FbError>> {
        Box::pin(async move {
            let ChromiumSession {
                mut browser,
                page,
                tasks,
            } = *self;
            if let Err(e) = page.close().await {
                debug!("failed to close page: {e}");
            }
            let closed = browser.close().await;
            let _ = browser.wait().await;
            for task in tasks {
                task.abort();
            }
            closed?;
            debug!("browser closed");
            Ok(())
        })
    }
}
