//! Post assembly: merge what the rendered page embeds with replayed comments.

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::conversions::timestamp_to_iso;
use crate::core::path::{get, get_array, get_string, get_u64};
use crate::core::{Attachment, Author, Comments, PostRecord, ReactionCount, Reactions};
use crate::replay::{ReplayedComments, comment_from_node};

const UFI_RENDERER_PATH: [&str; 7] = [
    "feedback",
    "story",
    "story_ufi_container",
    "story",
    "feedback_context",
    "feedback_target_with_context",
    "comet_ufi_summary_and_actions_renderer",
];

const NATIVE_COMMENTS_PATH: [&str; 5] = [
    "feedback_target_with_context",
    "comment_list_renderer",
    "feedback",
    "comment_rendering_instance_for_feed_location",
    "comments",
];

const ARTICLE_LINK_PATH: [&str; 6] = [
    "styles",
    "attachment",
    "story_attachment_link_renderer",
    "attachment",
    "web_link",
    "url",
];

/// Parses the post embedded in a page payload (the value under `data`).
///
/// Returns `None` when the payload has no `node`. Every other missing field
/// is left empty.
pub fn parse_post(data: &Value) -> Option<PostRecord> {
    let node = get(data, ["node"]).filter(|n| n.is_object())?;
    let cs = get(node, ["comet_sections"]).unwrap_or(&Value::Null);
    let story = get(cs, ["content", "story"]).unwrap_or(&Value::Null);
    let metadata = get_array(cs, ["context_layout", "story", "comet_sections", "metadata"]).first();

    let creation_time = metadata
        .and_then(|m| get(m, ["story", "creation_time"]))
        .or_else(|| get(cs, ["timestamp", "story", "creation_time"]))
        .and_then(timestamp_to_iso);

    let attachment = get_array(story, ["attachments"]).first();
    let article_url = attachment.and_then(|a| {
        get_string(a, ["comet_footer_renderer", "target", "external_url"])
            .or_else(|| get_string(a, ARTICLE_LINK_PATH))
    });

    let ufi = get(cs, UFI_RENDERER_PATH).unwrap_or(&Value::Null);
    let fb = get(ufi, ["feedback"]).unwrap_or(&Value::Null);

    let reactions = Reactions {
        total_count: get_u64(fb, ["reaction_count", "count"]).unwrap_or(0),
        details: get_array(fb, ["top_reactions", "edges"])
            .iter()
            .map(|edge| ReactionCount {
                reaction: get_string(edge, ["node", "localized_name"]),
                count: get_u64(edge, ["reaction_count"]),
            })
            .collect(),
    };

    let native = get(ufi, NATIVE_COMMENTS_PATH).unwrap_or(&Value::Null);
    let comments = Comments {
        total_count: get_u64(native, ["total_count"]).unwrap_or(0),
        details: crate::replay::parse::edge_nodes(native)
            .map(comment_from_node)
            .collect(),
    };

    let author = get_array(story, ["actors"])
        .first()
        .map(|a| Author {
            name: get_string(a, ["name"]),
            id: get_string(a, ["id"]),
            profile_url: get_string(a, ["url"]),
            profile_picture: get_string(a, ["profile_picture", "uri"]),
        })
        .unwrap_or_default();

    let attachment = attachment
        .map(|a| Attachment {
            title: get_string(a, ["styles", "title_with_entities", "text"]),
            image_url: get_string(a, ["styles", "attachment", "media", "large_share_image", "uri"]),
            media_id: get_string(a, ["styles", "attachment", "media", "id"]),
        })
        .unwrap_or_default();

    Some(PostRecord {
        post_id: get_string(node, ["id"]).unwrap_or_default(),
        content: get_string(story, ["message", "text"]),
        post_url: get_string(story, ["wwwURL"]),
        article_url,
        creation_time,
        author,
        privacy_scope: metadata.and_then(|m| get_string(m, ["story", "privacy_scope", "description"])),
        reactions,
        shares: get_u64(fb, ["share_count", "count"]).unwrap_or(0),
        attachment,
        comments,
    })
}

/// Appends replayed comments after the native ones, skipping known ids.
///
/// A replayed comment whose id is already present only fills fields the
/// earlier copy lacks. Comments without an id are always kept.
pub fn merge_comments(native: Comments, replayed: ReplayedComments) -> Comments {
    let mut details = native.details;
    let replayed_len = replayed.comments.len() as u64;

    for comment in replayed.comments {
        let existing = comment
            .comment_id
            .as_deref()
            .and_then(|id| details.iter().position(|c| c.comment_id.as_deref() == Some(id)));
        match existing {
            Some(i) => details[i].fill_missing_from(comment),
            None => details.push(comment),
        }
    }

    let total_count = native
        .total_count
        .max(replayed_len)
        .max(replayed.total_count.unwrap_or(0));
    Comments {
        total_count,
        details,
    }
}

/// Builds the canonical record for one post.
///
/// `page_data` is the normalized payload of the rendered page, if any. Without
/// it the record carries only the identifiers and the replayed comments.
pub fn assemble(
    page_data: Option<&Value>,
    replayed: ReplayedComments,
    post_id: &str,
    post_url: &str,
) -> PostRecord {
    let parsed = page_data.and_then(parse_post);
    let mut record = match parsed {
        Some(r) => r,
        None => {
            warn!(post_id, "no structured post data on the page; returning a minimal record");
            PostRecord::default()
        }
    };

    if record.post_id.is_empty() {
        record.post_id = post_id.to_string();
    }
    if record.post_url.is_none() {
        record.post_url = Some(post_url.to_string());
    }

    let native = std::mem::take(&mut record.comments);
    let native_len = native.details.len();
    record.comments = merge_comments(native, replayed);
    debug!(
        native = native_len,
        merged = record.comments.details.len(),
        total = record.comments.total_count,
        "comments merged"
    );
    record
}
