use httpmock::Method::POST;
use httpmock::MockServer;
use url::Url;

use fbpost_rs::{CapturedCookie, FbClient, FbError, QueryClient, RequestKind, SessionParams};

use crate::common::{self, COMMENTS_QUERY};

fn client_for(server: &MockServer) -> FbClient {
    FbClient::builder()
        .graphql_url(Url::parse(&format!("{}/api/graphql/", server.base_url())).unwrap())
        .build()
        .unwrap()
}

/// A plain cookie set by the mock server's own host.
fn host_cookie(name: &str, value: &str, path: &str) -> CapturedCookie {
    CapturedCookie {
        path: path.into(),
        secure: false,
        ..CapturedCookie::new(name, value, "")
    }
}

fn params() -> SessionParams {
    let mut p = SessionParams::new();
    p.set("lsd", "AVqtok");
    p.set("jazoest", "2981");
    p
}

#[tokio::test]
async fn query_is_posted_with_session_headers_and_scoped_cookies() {
    let server = MockServer::start();
    let body = common::fixture("comments_page.json");

    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/graphql/")
            .header("x-fb-friendly-name", COMMENTS_QUERY)
            .header("x-fb-lsd", "AVqtok")
            .header("cookie", "datr=abc")
            .header("content-type", "application/x-www-form-urlencoded");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(body.clone());
    });

    let client = client_for(&server);
    let request = RequestKind::Comments {
        feedback_id: "ZmVlZGJhY2s6MTIzNDU2Nzg5MDEyMw==",
        cursor: None,
    }
    .build(&params(), common::POST_URL, 1_704_164_645)
    .unwrap();
    let cookies = vec![
        host_cookie("datr", "abc", "/"),
        CapturedCookie::new("tracker", "leak", ".other-site.example"),
        host_cookie("scoped", "x", "/only/here"),
    ];

    let text = client.post_query(&request, &cookies).await.unwrap();

    mock.assert();
    assert_eq!(text, body);
}

#[tokio::test]
async fn error_status_surfaces_as_retryable_status_error() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/graphql/");
        then.status(500).body("upstream unavailable");
    });

    let client = client_for(&server);
    let request = RequestKind::Replies {
        feedback_id: "ZmVlZGJhY2s6YzE=",
        expansion_token: Some("RVhQQU5EMQ"),
    }
    .build(&params(), common::POST_URL, 0)
    .unwrap();

    let err = client.post_query(&request, &[]).await.unwrap_err();

    mock.assert();
    assert!(matches!(err, FbError::Status { status: 500, .. }));
    assert!(err.is_transport());
}
