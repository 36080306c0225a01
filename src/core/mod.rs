//! Core components of the `fbpost-rs` crate.
//!
//! This module contains the foundational building blocks shared by every stage:
//! - The [`FbClient`] used to replay queries, and its builder.
//! - The primary [`FbError`] type.
//! - The explicit [`ScrapeConfig`].
//! - Shared data models like [`PostRecord`] and [`CommentRecord`].
//! - The capability traits the pipeline is written against.

/// The query client (`FbClient`), builder, constants and retry policy.
pub mod client;
/// Scrape configuration (`ScrapeConfig`, `ProxyConfig`).
pub mod config;
pub mod conversions;
/// The primary error type (`FbError`) for the crate.
pub mod error;
/// Shared data models.
pub mod models;
/// Safe navigation over nested JSON.
pub mod path;
/// Capability traits for page rendering and query posting.
pub mod services;

#[cfg(feature = "test-mode")]
pub(crate) mod fixtures;

pub(crate) mod net;

// convenient re-exports so most code can just `use crate::core::FbClient`
pub use client::{Backoff, FbClient, FbClientBuilder, RetryConfig};
pub use config::{ProxyConfig, ScrapeConfig};
pub use error::FbError;
pub use models::{
    Attachment, Author, CapturedCookie, CommentRecord, Comments, PageInfo, PostRecord,
    RawPage, ReactionCount, Reactions, ReplyRecord, SessionParams,
};
pub use services::{InterceptedRequest, PageRenderer, PageSession, QueryClient, QueryRequest};
