//! Turn normalized query payloads into comment and reply pages.

use serde_json::Value;

use crate::core::conversions::{reduced_count, timestamp_to_iso};
use crate::core::path::{self, get, get_string, get_u64};
use crate::core::{CommentRecord, PageInfo, ReplyRecord};

/// Where the comments connection sits inside a comments payload.
const COMMENT_CONNECTION_PATHS: [&[&str]; 2] = [
    &["node", "comment_rendering_instance_for_feed_location", "comments"],
    &["node", "feedback", "comment_rendering_instance_for_feed_location", "comments"],
];

const REPLY_CONNECTION_PATH: [&str; 2] = ["node", "replies_connection"];

/// One page of a paginated connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPage<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
    /// Total reported by the connection itself, if any.
    pub total_count: Option<u64>,
}

impl<T> Default for ConnectionPage<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            page_info: PageInfo::default(),
            total_count: None,
        }
    }
}

/// Parses a comments payload (the value under `data`).
pub fn parse_comments_page(data: &Value) -> ConnectionPage<CommentRecord> {
    let Some(conn) = COMMENT_CONNECTION_PATHS
        .iter()
        .find_map(|p| get(data, p.iter().copied()))
    else {
        return ConnectionPage::default();
    };
    ConnectionPage {
        items: edge_nodes(conn).map(comment_from_node).collect(),
        page_info: page_info(conn),
        total_count: get_u64(conn, ["total_count"]),
    }
}

/// Parses a replies payload (the value under `data`).
pub fn parse_replies_page(data: &Value) -> ConnectionPage<ReplyRecord> {
    let Some(conn) = get(data, REPLY_CONNECTION_PATH) else {
        return ConnectionPage::default();
    };
    ConnectionPage {
        items: edge_nodes(conn).map(reply_from_node).collect(),
        page_info: page_info(conn),
        total_count: get_u64(conn, ["total_count"]),
    }
}

/// Maps a comment node from either a replayed page or the rendered page.
///
/// The author may sit under `author` or `user`, and reactors under the node
/// itself or under its `feedback`.
pub fn comment_from_node(node: &Value) -> CommentRecord {
    CommentRecord {
        author: get_string(node, ["author", "name"]).or_else(|| get_string(node, ["user", "name"])),
        author_id: get_string(node, ["author", "id"]).or_else(|| get_string(node, ["user", "id"])),
        text: get_string(node, ["body", "text"]),
        comment_id: get_string(node, ["id"]),
        legacy_id: get_string(node, ["legacy_fbid"]),
        created_time: get(node, ["created_time"]).and_then(timestamp_to_iso),
        reaction_count: get(node, ["feedback", "reactors", "count_reduced"])
            .or_else(|| get(node, ["reactors", "count_reduced"]))
            .and_then(reduced_count),
        reply_count: get_u64(node, ["feedback", "replies_fields", "total_count"]).unwrap_or(0),
        feedback_id: get_string(node, ["feedback", "id"]),
        expansion_token: get_string(node, ["feedback", "expansion_info", "expansion_token"]),
        replies: Vec::new(),
    }
}

fn reply_from_node(node: &Value) -> ReplyRecord {
    ReplyRecord {
        author: get_string(node, ["author", "name"]),
        author_id: get_string(node, ["author", "id"]),
        text: get_string(node, ["body", "text"]),
        reply_id: get_string(node, ["id"]),
        legacy_id: get_string(node, ["legacy_fbid"]),
        created_time: get(node, ["created_time"]).and_then(timestamp_to_iso),
        reaction_count: get(node, ["feedback", "reactors", "count_reduced"]).and_then(reduced_count),
        feedback_id: get_string(node, ["feedback", "id"]),
        profile_picture: get_string(node, ["author", "profile_picture_depth_0", "uri"]),
        gender: get_string(node, ["author", "gender"]),
    }
}

/// `edges[].node` objects of a connection, skipping malformed edges.
pub(crate) fn edge_nodes(conn: &Value) -> impl Iterator<Item = &Value> {
    path::get_array(conn, ["edges"])
        .iter()
        .filter_map(|edge| get(edge, ["node"]))
        .filter(|node| node.is_object())
}

fn page_info(conn: &Value) -> PageInfo {
    PageInfo {
        end_cursor: get_string(conn, ["page_info", "end_cursor"]),
        has_next_page: path::get_bool(conn, ["page_info", "has_next_page"]).unwrap_or(false),
    }
}
