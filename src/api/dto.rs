//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::post::Post;
use crate::timeline::TimelineState;

// ============================================
// POST DTOs
// ============================================

/// A post as shown to clients
#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: u64,
    pub author: String,
    /// Shortened author address, e.g. `0x1234...abcd`
    pub author_short: String,
    pub content: String,
    /// Milliseconds since epoch
    pub timestamp: u64,
    /// RFC 3339 rendering of `timestamp`
    pub created_at: Option<String>,
}

impl From<&Post> for PostDto {
    fn from(post: &Post) -> Self {
        let created_at = i64::try_from(post.timestamp)
            .ok()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .map(|dt| dt.to_rfc3339());

        Self {
            id: post.id,
            author: post.author.clone(),
            author_short: post.short_author(),
            content: post.content.clone(),
            timestamp: post.timestamp,
            created_at,
        }
    }
}

/// Create post request
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
}

/// Create post response
#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    /// Digest of the submitted transaction
    pub digest: String,
    /// Feed after the post was confirmed
    pub posts: Vec<PostDto>,
}

/// Post list response
#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub timeline_id: Option<String>,
    pub total: usize,
    pub posts: Vec<PostDto>,
}

// ============================================
// TIMELINE DTOs
// ============================================

/// Full timeline state
#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub timeline_id: Option<String>,
    pub posts: Vec<PostDto>,
    pub is_loading: bool,
    pub is_fetching_posts: bool,
    pub error: Option<String>,
    pub last_digest: Option<String>,
}

impl From<TimelineState> for TimelineResponse {
    fn from(state: TimelineState) -> Self {
        Self {
            posts: state.posts.iter().map(PostDto::from).collect(),
            timeline_id: state.timeline_id,
            is_loading: state.is_loading,
            is_fetching_posts: state.is_fetching_posts,
            error: state.error,
            last_digest: state.last_digest,
        }
    }
}

/// Create timeline response
#[derive(Debug, Serialize)]
pub struct CreateTimelineResponse {
    pub timeline_id: String,
    pub digest: Option<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded
    pub status: String,
    /// Whether a timeline is currently loaded
    pub timeline_loaded: bool,
    /// Last error message, if any
    pub last_error: Option<String>,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_dto() {
        let post = Post {
            id: 4,
            author: "0x1234567890abcdef".to_string(),
            content: "hello".to_string(),
            timestamp: 0,
        };
        let dto = PostDto::from(&post);
        assert_eq!(dto.author_short, "0x1234...cdef");
        assert_eq!(dto.created_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));
    }
}
