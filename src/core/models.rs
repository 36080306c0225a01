use serde::Serialize;
use std::collections::BTreeMap;

/// Session and query parameters recovered while the post page loads.
///
/// Values are filled incrementally: once a parameter holds a non-empty value,
/// later sources cannot replace it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionParams {
    values: BTreeMap<String, String>,
}

impl SessionParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `name` if present and non-empty.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Returns the value for `name`, or `""` when absent.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Stores `value` only if `name` is still missing. Returns whether it was stored.
    pub fn fill(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() || self.get(name).is_some() {
            return false;
        }
        self.values.insert(name.to_string(), value);
        true
    }

    /// Stores `value` unconditionally.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Names from `required` that still have no value.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.get(name).is_none())
            .collect()
    }

    /// Iterates over all stored parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of stored parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameter has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A cookie read from the browsing context after navigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapturedCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    /// Expiry as unix seconds; `None` for session cookies.
    pub expires: Option<f64>,
    pub http_only: bool,
    pub secure: bool,
}

impl CapturedCookie {
    /// Convenience constructor for a secure, http-only cookie on `domain` with path `/`.
    pub fn new(name: impl Into<String>, value: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: None,
            http_only: true,
            secure: true,
        }
    }
}

/// Rendered HTML of one post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

/// Pagination state of a comments or replies connection.
///
/// A missing cursor or flag means there are no more pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

impl PageInfo {
    /// The cursor to request next, if pagination should continue.
    pub fn next_cursor(&self) -> Option<&str> {
        if self.has_next_page {
            self.end_cursor.as_deref().filter(|c| !c.is_empty())
        } else {
            None
        }
    }
}

/// A reply to a top-level comment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplyRecord {
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub text: Option<String>,
    pub reply_id: Option<String>,
    pub legacy_id: Option<String>,
    /// ISO-8601 UTC timestamp.
    pub created_time: Option<String>,
    pub reaction_count: Option<u64>,
    pub feedback_id: Option<String>,
    pub profile_picture: Option<String>,
    pub gender: Option<String>,
}

/// A top-level comment and its flattened replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub text: Option<String>,
    pub comment_id: Option<String>,
    pub legacy_id: Option<String>,
    /// ISO-8601 UTC timestamp.
    pub created_time: Option<String>,
    pub reaction_count: Option<u64>,
    pub reply_count: u64,
    pub feedback_id: Option<String>,
    /// Cursor opening the first replies page.
    #[serde(skip)]
    pub expansion_token: Option<String>,
    pub replies: Vec<ReplyRecord>,
}

impl CommentRecord {
    /// Number of export rows this comment produces, itself included.
    pub fn row_count(&self) -> usize {
        1 + self.replies.len()
    }

    /// Copies every field that is absent here but present in `other`.
    pub fn fill_missing_from(&mut self, other: CommentRecord) {
        fn fill<T>(slot: &mut Option<T>, v: Option<T>) {
            if slot.is_none() {
                *slot = v;
            }
        }
        fill(&mut self.author, other.author);
        fill(&mut self.author_id, other.author_id);
        fill(&mut self.text, other.text);
        fill(&mut self.comment_id, other.comment_id);
        fill(&mut self.legacy_id, other.legacy_id);
        fill(&mut self.created_time, other.created_time);
        fill(&mut self.reaction_count, other.reaction_count);
        fill(&mut self.feedback_id, other.feedback_id);
        fill(&mut self.expansion_token, other.expansion_token);
        if self.reply_count == 0 {
            self.reply_count = other.reply_count;
        }
        if self.replies.is_empty() {
            self.replies = other.replies;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: Option<String>,
    pub id: Option<String>,
    pub profile_url: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReactionCount {
    pub reaction: Option<String>,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reactions {
    pub total_count: u64,
    pub details: Vec<ReactionCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub media_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comments {
    /// Largest total observed from any source.
    pub total_count: u64,
    pub details: Vec<CommentRecord>,
}

/// Canonical record for one scraped post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub post_id: String,
    pub content: Option<String>,
    pub post_url: Option<String>,
    pub article_url: Option<String>,
    /// ISO-8601 UTC timestamp.
    pub creation_time: Option<String>,
    pub author: Author,
    pub privacy_scope: Option<String>,
    pub reactions: Reactions,
    pub shares: u64,
    pub attachment: Attachment,
    pub comments: Comments,
}
