use fbpost_rs::SessionHarvester;

use crate::common::{self, FakeRenderer, POST_URL};

fn navigate() -> String {
    format!("navigate {POST_URL}")
}

#[tokio::test]
async fn proxy_launch_failure_falls_back_to_direct_egress() {
    let mut renderer = FakeRenderer::with_html(common::fixture("post_page.html"));
    renderer.fail_proxied_open = true;
    let config = common::fast_config().with_proxy(Some(common::proxy()));

    let h = SessionHarvester::new(&renderer, &config)
        .harvest(POST_URL)
        .await
        .unwrap();

    assert_eq!(h.post_id, "1234567890123");
    assert_eq!(
        renderer.events(),
        vec![
            "open proxied=true".to_string(),
            "open proxied=false".to_string(),
            navigate(),
            "close".to_string(),
        ]
    );
}

#[tokio::test]
async fn proxied_navigation_error_reopens_without_proxy() {
    let mut renderer = FakeRenderer::with_html(common::fixture("post_page.html"));
    renderer.fail_proxied_navigation = true;
    renderer.intercepted = vec![common::graphql_call("", "lsd=direct-token", None)];
    let config = common::fast_config().with_proxy(Some(common::proxy()));

    let h = SessionHarvester::new(&renderer, &config)
        .harvest(POST_URL)
        .await
        .unwrap();

    assert_eq!(h.params.get("lsd"), Some("direct-token"));
    assert_eq!(
        renderer.events(),
        vec![
            "open proxied=true".to_string(),
            navigate(),
            "close".to_string(),
            "open proxied=false".to_string(),
            navigate(),
            "close".to_string(),
        ]
    );
}

#[tokio::test]
async fn without_credentials_only_direct_egress_is_used() {
    let renderer = FakeRenderer::with_html(common::fixture("post_page.html"));
    let config = common::fast_config();

    SessionHarvester::new(&renderer, &config)
        .harvest(POST_URL)
        .await
        .unwrap();

    assert_eq!(renderer.events()[0], "open proxied=false");
    assert!(!renderer.events().iter().any(|e| e == "open proxied=true"));
}
