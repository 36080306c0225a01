use fbpost_rs::{FbError, Scraper};

use crate::common::{self, FakeRenderer, ScriptedQueryClient};

#[tokio::test]
async fn missing_post_id_becomes_user_facing_failure() {
    let renderer = FakeRenderer::with_html("<html><body>This content isn't available</body></html>");
    let client = ScriptedQueryClient::new(|_, _| panic!("no query expected"));
    let scraper = Scraper::new(renderer, client, common::fast_config());

    let failure = scraper.scrape_guarded(common::POST_URL).await.unwrap_err();

    assert!(failure.message.starts_with("Scraping failed"));
    assert!(failure.message.contains("public post"));
}

#[tokio::test]
async fn invalid_url_is_rejected_before_any_browsing() {
    let renderer = FakeRenderer::default();
    let client = ScriptedQueryClient::new(|_, _| panic!("no query expected"));
    let scraper = Scraper::new(renderer.clone(), client, common::fast_config());

    let err = scraper.scrape("not a url").await.unwrap_err();

    assert!(matches!(err, FbError::Url(_)));
    assert!(renderer.events().is_empty());
}

#[tokio::test]
async fn unusable_config_is_rejected_before_any_browsing() {
    let renderer = FakeRenderer::with_html(common::fixture("post_page.html"));
    let client = ScriptedQueryClient::new(|_, _| panic!("no query expected"));
    let scraper = Scraper::new(renderer.clone(), client, common::fast_config().with_max_depth(0));

    let err = scraper.scrape(common::POST_URL).await.unwrap_err();

    assert!(matches!(err, FbError::Config(_)));
    assert!(renderer.events().is_empty());
}

#[tokio::test]
async fn panics_are_contained_at_the_boundary() {
    let renderer = FakeRenderer::with_html(common::fixture("post_page.html"));
    let client = ScriptedQueryClient::new(|_, _| panic!("query client exploded"));
    let scraper = Scraper::new(renderer, client, common::fast_config());

    let failure = scraper.scrape_guarded(common::POST_URL).await.unwrap_err();

    assert_eq!(failure.message, "Scraping failed: query client exploded");
}

#[tokio::test]
async fn replay_failures_still_yield_page_data() {
    let renderer = FakeRenderer::with_html(common::fixture("post_page.html"));
    let client = ScriptedQueryClient::new(|_, _| Err(common::server_error()));
    let scraper = Scraper::new(renderer, client, common::fast_config());

    let post = scraper.scrape_guarded(common::POST_URL).await.unwrap();

    assert_eq!(post.comments.details.len(), 1);
    assert_eq!(post.comments.total_count, 5);
    assert_eq!(post.content.as_deref(), Some("Launch day!"));
}
