use fbpost_rs::{QueryReplayer, SessionParams};

use crate::common::{
    self, COMMENTS_QUERY, REPLIES_QUERY, ScriptedQueryClient, comments_body, replies_body,
    variables,
};

fn params() -> SessionParams {
    let mut p = SessionParams::new();
    p.set("lsd", "AVqtok");
    p.set("jazoest", "2981");
    p.set("feedback_id", "ZmVlZGJhY2s6MTIzNDU2Nzg5MDEyMw==");
    p
}

#[tokio::test]
async fn replies_are_fetched_before_the_next_comment_page() {
    let client = ScriptedQueryClient::new(|req, _| {
        let vars = variables(req);
        match req.friendly_name.as_str() {
            COMMENTS_QUERY => match vars["commentsAfterCursor"].as_str() {
                None => Ok(comments_body(&[("c1", 2), ("c2", 0)], Some("cur-2"))),
                Some("cur-2") => Ok(comments_body(&[("c3", 0)], None)),
                Some(other) => panic!("unexpected cursor {other}"),
            },
            REPLIES_QUERY => {
                assert_eq!(vars["id"], "fb-c1");
                match vars["expansionToken"].as_str() {
                    Some("exp-c1") => Ok(replies_body(&["r1"], Some("rtok-2"))),
                    Some("rtok-2") => Ok(replies_body(&["r2"], None)),
                    other => panic!("unexpected expansion token {other:?}"),
                }
            }
            other => panic!("unexpected query {other}"),
        }
    });
    let config = common::fast_config();
    let params = params();

    let out = QueryReplayer::new(&client, &params, &[], common::POST_URL, &config)
        .fetch_comments("ZmVlZGJhY2s6MTIzNDU2Nzg5MDEyMw==")
        .await;

    let ids: Vec<_> = out.comments.iter().map(|c| c.comment_id.as_deref().unwrap()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    let replies: Vec<_> = out.comments[0]
        .replies
        .iter()
        .map(|r| r.reply_id.as_deref().unwrap())
        .collect();
    assert_eq!(replies, vec!["r1", "r2"]);
    assert!(out.comments[1].replies.is_empty());
    assert_eq!(out.pages, 2);

    assert_eq!(
        client.call_kinds(),
        vec!["comments", "replies:fb-c1", "replies:fb-c1", "comments"]
    );
    let first = &client.calls()[0];
    assert_eq!(first.field("lsd"), Some("AVqtok"));
    assert_eq!(variables(first)["id"], "ZmVlZGJhY2s6MTIzNDU2Nzg5MDEyMw==");
}

#[tokio::test]
async fn endless_pagination_stops_at_depth_ceiling() {
    let client = ScriptedQueryClient::new(|_, n| {
        let id = format!("c{n}");
        let next = format!("cur-{}", n + 1);
        Ok(comments_body(&[(id.as_str(), 0)], Some(next.as_str())))
    });
    let config = common::fast_config().with_max_depth(3);
    let params = params();

    let out = QueryReplayer::new(&client, &params, &[], common::POST_URL, &config)
        .fetch_comments("fb-post")
        .await;

    assert_eq!(out.comments.len(), 3);
    assert_eq!(client.calls().len(), 3);
}

#[tokio::test]
async fn concurrent_reply_fetches_keep_comment_order() {
    let client = ScriptedQueryClient::new(|req, _| {
        let vars = variables(req);
        match req.friendly_name.as_str() {
            COMMENTS_QUERY => Ok(comments_body(&[("a", 1), ("b", 1), ("c", 0), ("d", 1)], None)),
            _ => {
                let parent = vars["id"].as_str().unwrap().trim_start_matches("fb-").to_string();
                let reply = format!("{parent}-reply");
                Ok(replies_body(&[reply.as_str()], None))
            }
        }
    });
    let config = common::fast_config().with_reply_concurrency(4);
    let params = params();

    let out = QueryReplayer::new(&client, &params, &[], common::POST_URL, &config)
        .fetch_comments("fb-post")
        .await;

    let flat: Vec<_> = out
        .comments
        .iter()
        .map(|c| {
            (
                c.comment_id.clone().unwrap(),
                c.replies.iter().filter_map(|r| r.reply_id.clone()).collect::<Vec<_>>(),
            )
        })
        .collect();
    assert_eq!(
        flat,
        vec![
            ("a".to_string(), vec!["a-reply".to_string()]),
            ("b".to_string(), vec!["b-reply".to_string()]),
            ("c".to_string(), vec![]),
            ("d".to_string(), vec!["d-reply".to_string()]),
        ]
    );
    assert_eq!(client.calls().len(), 4);
}
