//! Flatten a [`PostRecord`] into a post table and a comments table.
//!
//! Replies become peer rows right after their parent comment, with their own
//! id in the `comment_id` column and a `reply_count` of zero. A post without
//! comments still gets one placeholder comment row.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::core::{CommentRecord, FbError, PostRecord, ReplyRecord};

/// Author value of the placeholder row written when a post has no comments.
pub const NO_COMMENTS_PLACEHOLDER: &str = "No comments found";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PostRow {
    pub post_id: String,
    pub content: Option<String>,
    pub post_url: Option<String>,
    pub article_url: Option<String>,
    pub creation_time: Option<String>,
    pub author_name: Option<String>,
    pub author_id: Option<String>,
    pub author_profile_url: Option<String>,
    pub author_profile_picture: Option<String>,
    pub privacy_scope: Option<String>,
    pub reactions_total_count: u64,
    /// `Like:25;Love:5`
    pub reactions_breakdown: String,
    pub shares: u64,
    pub comments_total_count: u64,
    pub attachment_title: Option<String>,
    pub attachment_image_url: Option<String>,
    pub attachment_media_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentRow {
    pub author: Option<String>,
    pub author_id: Option<String>,
    pub text: Option<String>,
    pub comment_id: Option<String>,
    pub legacy_id: Option<String>,
    pub created_time: Option<String>,
    pub reaction_count: Option<u64>,
    pub reply_count: u64,
    pub feedback_id: Option<String>,
}

impl From<&CommentRecord> for CommentRow {
    fn from(c: &CommentRecord) -> Self {
        Self {
            author: c.author.clone(),
            author_id: c.author_id.clone(),
            text: c.text.clone(),
            comment_id: c.comment_id.clone(),
            legacy_id: c.legacy_id.clone(),
            created_time: c.created_time.clone(),
            reaction_count: c.reaction_count,
            reply_count: c.reply_count,
            feedback_id: c.feedback_id.clone(),
        }
    }
}

impl From<&ReplyRecord> for CommentRow {
    fn from(r: &ReplyRecord) -> Self {
        Self {
            author: r.author.clone(),
            author_id: r.author_id.clone(),
            text: r.text.clone(),
            comment_id: r.reply_id.clone(),
            legacy_id: r.legacy_id.clone(),
            created_time: r.created_time.clone(),
            reaction_count: r.reaction_count,
            reply_count: 0,
            feedback_id: r.feedback_id.clone(),
        }
    }
}

/// The two export tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub post: PostRow,
    pub comments: Vec<CommentRow>,
}

impl Tables {
    pub fn from_post(record: &PostRecord) -> Self {
        let breakdown = record
            .reactions
            .details
            .iter()
            .filter_map(|r| {
                let name = r.reaction.as_deref()?;
                Some(format!("{name}:{}", r.count.unwrap_or(0)))
            })
            .collect::<Vec<_>>()
            .join(";");

        let post = PostRow {
            post_id: record.post_id.clone(),
            content: record.content.clone(),
            post_url: record.post_url.clone(),
            article_url: record.article_url.clone(),
            creation_time: record.creation_time.clone(),
            author_name: record.author.name.clone(),
            author_id: record.author.id.clone(),
            author_profile_url: record.author.profile_url.clone(),
            author_profile_picture: record.author.profile_picture.clone(),
            privacy_scope: record.privacy_scope.clone(),
            reactions_total_count: record.reactions.total_count,
            reactions_breakdown: breakdown,
            shares: record.shares,
            comments_total_count: record.comments.total_count,
            attachment_title: record.attachment.title.clone(),
            attachment_image_url: record.attachment.image_url.clone(),
            attachment_media_id: record.attachment.media_id.clone(),
        };

        let mut comments: Vec<CommentRow> = Vec::with_capacity(
            record.comments.details.iter().map(CommentRecord::row_count).sum(),
        );
        for c in &record.comments.details {
            comments.push(c.into());
            comments.extend(c.replies.iter().map(CommentRow::from));
        }
        if comments.is_empty() {
            comments.push(CommentRow {
                author: Some(NO_COMMENTS_PLACEHOLDER.to_string()),
                ..CommentRow::default()
            });
        }

        Self { post, comments }
    }
}

/// Writes both tables as CSV, each with a header row.
pub fn write_csv<P: Write, C: Write>(
    tables: &Tables,
    post_out: P,
    comments_out: C,
) -> Result<(), FbError> {
    let mut w = csv::Writer::from_writer(post_out);
    w.serialize(&tables.post)?;
    w.flush()?;

    let mut w = csv::Writer::from_writer(comments_out);
    for row in &tables.comments {
        w.serialize(row)?;
    }
    w.flush()?;
    Ok(())
}

/// Writes `facebook_post_<id>_post.csv` and `facebook_post_<id>_comments.csv`
/// into `dir` and returns their paths.
pub fn save_csv(dir: &Path, record: &PostRecord) -> Result<(PathBuf, PathBuf), FbError> {
    std::fs::create_dir_all(dir)?;
    let stem = format!("facebook_post_{}", file_safe(&record.post_id));
    let post_path = dir.join(format!("{stem}_post.csv"));
    let comments_path = dir.join(format!("{stem}_comments.csv"));

    let tables = Tables::from_post(record);
    write_csv(
        &tables,
        File::create(&post_path)?,
        File::create(&comments_path)?,
    )?;
    info!(
        post = %post_path.display(),
        comments = %comments_path.display(),
        rows = tables.comments.len(),
        "export written"
    );
    Ok((post_path, comments_path))
}

fn file_safe(id: &str) -> String {
    let s: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if s.is_empty() { "unknown".to_string() } else { s }
}
