use httpmock::Method::POST;
use httpmock::MockServer;
use url::Url;

use fbpost_rs::{FbClient, Scraper, Tables, save_csv};

use crate::common::{self, COMMENTS_QUERY, FakeRenderer, REPLIES_QUERY};

fn renderer() -> FakeRenderer {
    let mut r = FakeRenderer::with_html(common::fixture("post_page.html"));
    r.intercepted = vec![common::graphql_call(
        "",
        "lsd=AVqtok&jazoest=25511&__rev=1019876543&__spin_r=1019876543&__hsi=7411&__hs=20000.HYP%3Acomet&__csr=abc&dpr=2",
        Some("AVqtok"),
    )];
    r
}

#[tokio::test]
async fn scrape_merges_page_and_replayed_comments() {
    let server = MockServer::start();
    let comments = server.mock(|when, then| {
        when.method(POST)
            .path("/api/graphql/")
            .header("x-fb-friendly-name", COMMENTS_QUERY);
        then.status(200).body(common::fixture("comments_page.json"));
    });
    let replies = server.mock(|when, then| {
        when.method(POST)
            .path("/api/graphql/")
            .header("x-fb-friendly-name", REPLIES_QUERY);
        then.status(200).body(common::fixture("replies_page.json"));
    });

    let client = FbClient::builder()
        .graphql_url(Url::parse(&format!("{}/api/graphql/", server.base_url())).unwrap())
        .build()
        .unwrap();
    let scraper = Scraper::new(renderer(), client, common::fast_config());

    let post = scraper.scrape(common::POST_URL).await.unwrap();

    comments.assert();
    replies.assert();

    assert_eq!(post.post_id, "UzpfSTEwMDA2NDoxMjM0NTY3ODkwMTIz");
    assert_eq!(post.content.as_deref(), Some("Launch day!"));
    assert_eq!(post.creation_time.as_deref(), Some("2024-01-02T03:04:05Z"));
    assert_eq!(post.article_url.as_deref(), Some("https://news.example/launch"));
    assert_eq!(post.author.name.as_deref(), Some("Example Page"));
    assert_eq!(post.privacy_scope.as_deref(), Some("Public"));
    assert_eq!(post.reactions.total_count, 42);
    assert_eq!(post.shares, 3);
    assert_eq!(post.attachment.media_id.as_deref(), Some("5550001"));

    // native comment first, its replayed twin dropped, replayed ones appended
    let texts: Vec<_> = post
        .comments
        .details
        .iter()
        .map(|c| c.text.as_deref().unwrap())
        .collect();
    assert_eq!(texts, vec!["First!", "Great news", "When in Europe?"]);
    assert_eq!(post.comments.total_count, 5);

    let c1 = &post.comments.details[1];
    assert_eq!(c1.reaction_count, Some(1200));
    assert_eq!(c1.replies.len(), 2);
    assert_eq!(c1.replies[0].gender.as_deref(), Some("FEMALE"));
    assert_eq!(
        post.comments.details[2].created_time.as_deref(),
        Some("2024-01-02T03:15:00Z")
    );

    let tables = Tables::from_post(&post);
    assert_eq!(tables.comments.len(), 5);
    assert_eq!(tables.comments[2].comment_id.as_deref(), Some("cmVwbHk6cjE="));
    assert_eq!(tables.comments[2].reply_count, 0);
    assert_eq!(tables.post.reactions_breakdown, "Like:40;Haha:2");

    let dir = tempfile::tempdir().unwrap();
    let (post_csv, comments_csv) = save_csv(dir.path(), &post).unwrap();
    assert!(post_csv.exists());
    let rows = std::fs::read_to_string(comments_csv).unwrap();
    assert_eq!(rows.lines().count(), 6);
}
