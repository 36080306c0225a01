//! Centralized constants for endpoints, query documents and browser identity.

/// Desktop UA shared by the browser context and the replayed queries.
pub(crate) const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/134.0.0.0 Safari/537.36"
);

/// Site origin sent with every replayed query.
pub(crate) const ORIGIN: &str = "https://www.facebook.com";

/// Internal GraphQL endpoint the page talks to.
pub(crate) const DEFAULT_GRAPHQL_URL: &str = "https://www.facebook.com/api/graphql/";

/// Substring identifying calls to the internal query endpoint.
pub(crate) const GRAPHQL_PATH: &str = "/api/graphql/";

/// Egress proxy used when credentials are configured.
pub(crate) const DEFAULT_PROXY_SERVER: &str = "isp.smartproxy.com:10000";

/// Top-level comments pagination query.
pub(crate) const COMMENTS_DOC_ID: &str = "9445061768946657";
pub(crate) const COMMENTS_FRIENDLY_NAME: &str = "CommentsListComponentsPaginationQuery";

/// First-depth replies pagination query.
pub(crate) const REPLIES_DOC_ID: &str = "9529899550379477";
pub(crate) const REPLIES_FRIENDLY_NAME: &str = "Depth1CommentsListPaginationQuery";

/// Session/query parameters harvested from the page's own calls.
pub(crate) const REQUIRED_PARAMS: [&str; 9] = [
    "x-fb-lsd", "lsd", "jazoest", "__rev", "__spin_r", "__hs", "__hsi", "__csr", "dpr",
];

/// Display pixel ratio assumed when the page never reports one.
pub(crate) const DEFAULT_DPR: &str = "2";

/// Sub-resources with these extensions are aborted during navigation.
pub(crate) const BLOCKED_MEDIA_EXTENSIONS: [&str; 6] =
    [".jpg", ".jpeg", ".png", ".gif", ".mp4", ".webm"];

/// Long-lived cookies seeded into the browsing context before navigation.
pub(crate) const SEED_COOKIES: [(&str, &str); 2] = [
    ("datr", "l1UCaAbX2BLP2Pq7J7_tjETO"),
    ("sb", "l1UCaEBMktmKJNccbMAPQSH3"),
];
pub(crate) const SEED_COOKIE_DOMAIN: &str = ".facebook.com";
pub(crate) const SEED_COOKIE_EXPIRES: f64 = 1_779_543_472.0;

/// Extra headers the browser context sends on navigation.
pub(crate) const NAVIGATION_HEADERS: [(&str, &str); 7] = [
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Sec-Fetch-Dest", "document"),
    ("Sec-Fetch-Mode", "navigate"),
    ("Sec-Fetch-Site", "none"),
    ("Sec-Fetch-User", "?1"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Flags passed to the headless browser.
pub(crate) const BROWSER_ARGS: [&str; 6] = [
    "--disable-extensions",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--disable-setuid-sandbox",
    "--disable-sync",
    "--disable-translate",
];
