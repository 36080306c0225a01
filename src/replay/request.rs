use std::fmt;

use serde::Serialize;

use crate::core::client::constants::{
    COMMENTS_DOC_ID, COMMENTS_FRIENDLY_NAME, DEFAULT_DPR, ORIGIN, REPLIES_DOC_ID, REPLIES_FRIENDLY_NAME,
    USER_AGENT,
};
use crate::core::{FbError, QueryRequest, SessionParams};

/// Which paginated connection a replayed query walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind<'a> {
    /// Top-level comments of a post, keyed by the post's feedback id.
    Comments {
        feedback_id: &'a str,
        cursor: Option<&'a str>,
    },
    /// Replies under one comment, keyed by that comment's feedback id.
    Replies {
        feedback_id: &'a str,
        expansion_token: Option<&'a str>,
    },
}

impl fmt::Display for RequestKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Comments { .. } => f.write_str("comments"),
            RequestKind::Replies { .. } => f.write_str("replies"),
        }
    }
}

#[derive(Serialize)]
struct CommentsVariables<'a> {
    #[serde(rename = "commentsAfterCount")]
    after_count: i32,
    #[serde(rename = "commentsAfterCursor")]
    after_cursor: Option<&'a str>,
    #[serde(rename = "commentsBeforeCount")]
    before_count: Option<i32>,
    #[serde(rename = "commentsBeforeCursor")]
    before_cursor: Option<&'a str>,
    #[serde(rename = "commentsIntentToken")]
    intent_token: Option<&'a str>,
    #[serde(rename = "feedLocation")]
    feed_location: &'static str,
    #[serde(rename = "focusCommentID")]
    focus_comment_id: Option<&'a str>,
    scale: u8,
    #[serde(rename = "useDefaultActor")]
    use_default_actor: bool,
    id: &'a str,
    #[serde(rename = "__relay_internal__pv__IsWorkUserrelayprovider")]
    is_work_user: bool,
}

#[derive(Serialize)]
struct RepliesVariables<'a> {
    #[serde(rename = "clientKey")]
    client_key: Option<&'a str>,
    #[serde(rename = "expansionToken")]
    expansion_token: Option<&'a str>,
    #[serde(rename = "feedLocation")]
    feed_location: &'static str,
    #[serde(rename = "focusCommentID")]
    focus_comment_id: Option<&'a str>,
    #[serde(rename = "repliesAfterCount")]
    after_count: Option<i32>,
    #[serde(rename = "repliesAfterCursor")]
    after_cursor: Option<&'a str>,
    #[serde(rename = "repliesBeforeCount")]
    before_count: Option<i32>,
    #[serde(rename = "repliesBeforeCursor")]
    before_cursor: Option<&'a str>,
    scale: u8,
    #[serde(rename = "useDefaultActor")]
    use_default_actor: bool,
    id: &'a str,
    #[serde(rename = "__relay_internal__pv__IsWorkUserrelayprovider")]
    is_work_user: bool,
}

impl RequestKind<'_> {
    pub fn doc_id(&self) -> &'static str {
        match self {
            RequestKind::Comments { .. } => COMMENTS_DOC_ID,
            RequestKind::Replies { .. } => REPLIES_DOC_ID,
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            RequestKind::Comments { .. } => COMMENTS_FRIENDLY_NAME,
            RequestKind::Replies { .. } => REPLIES_FRIENDLY_NAME,
        }
    }

    fn variables(&self) -> Result<String, FbError> {
        let json = match *self {
            RequestKind::Comments {
                feedback_id,
                cursor,
            } => serde_json::to_string(&CommentsVariables {
                after_count: -1,
                after_cursor: cursor,
                before_count: None,
                before_cursor: None,
                intent_token: None,
                feed_location: "PERMALINK",
                focus_comment_id: None,
                scale: 4,
                use_default_actor: false,
                id: feedback_id,
                is_work_user: false,
            })?,
            RequestKind::Replies {
                feedback_id,
                expansion_token,
            } => serde_json::to_string(&RepliesVariables {
                client_key: None,
                expansion_token,
                feed_location: "PERMALINK",
                focus_comment_id: None,
                after_count: None,
                after_cursor: None,
                before_count: None,
                before_cursor: None,
                scale: 2,
                use_default_actor: false,
                id: feedback_id,
                is_work_user: false,
            })?,
        };
        Ok(json)
    }

    /// Builds the headers and form body for one call.
    ///
    /// `spin_t` is the per-request timestamp marker in unix seconds.
    pub fn build(
        &self,
        params: &SessionParams,
        referer: &str,
        spin_t: i64,
    ) -> Result<QueryRequest, FbError> {
        let lsd = params.get("lsd").or_else(|| params.get("x-fb-lsd")).unwrap_or("");
        let friendly = self.friendly_name();

        let headers = vec![
            h("Accept", "application/json"),
            h("Accept-Language", "en-US,en;q=0.9"),
            h("Origin", ORIGIN),
            h("Referer", referer),
            h("User-Agent", USER_AGENT),
            h("X-ASBD-ID", params.get_or_empty("x-asbd-id")),
            h("X-FB-LSD", lsd),
            h("Sec-Fetch-Dest", "empty"),
            h("Sec-Fetch-Mode", "cors"),
            h("Sec-Fetch-Site", "same-origin"),
            h("X-FB-Friendly-Name", friendly),
        ];

        let mut form = vec![
            h("av", "0"),
            h("__user", "0"),
            h("__a", "1"),
            h("lsd", lsd),
            h("jazoest", params.get_or_empty("jazoest")),
            h("fb_api_caller_class", "RelayModern"),
            h("__spin_b", "trunk"),
            (String::from("__spin_t"), spin_t.to_string()),
            h("server_timestamps", "true"),
            h("fb_api_req_friendly_name", friendly),
            h("doc_id", self.doc_id()),
            (String::from("variables"), self.variables()?),
        ];

        if let RequestKind::Replies { .. } = self {
            form.extend([
                h("__aaid", "0"),
                h("__req", "n"),
                h("__hs", params.get_or_empty("__hs")),
                h("dpr", params.get("dpr").unwrap_or(DEFAULT_DPR)),
                h("__ccg", "EXCELLENT"),
                h("__rev", params.get_or_empty("__rev")),
                h("__s", params.get_or_empty("__s")),
                h("__hsi", params.get_or_empty("__hsi")),
                h("__csr", params.get_or_empty("__csr")),
                h("__comet_req", "15"),
                h("__spin_r", params.get_or_empty("__spin_r")),
            ]);
        }

        Ok(QueryRequest {
            friendly_name: friendly.to_string(),
            headers,
            form,
        })
    }
}

fn h(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}
