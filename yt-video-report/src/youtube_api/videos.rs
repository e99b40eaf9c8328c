//! YouTube Videos API types and functionality.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Field mask for `videos.list`.
pub(crate) const VIDEO_FIELDS: &str = "items(id,snippet(title,description,publishedAt),\
contentDetails(duration),\
statistics(viewCount,likeCount,dislikeCount,favoriteCount,commentCount))";

/// Response structure for the `videos.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    /// A list of videos that match the request criteria.
    ///
    /// Ids that do not resolve (deleted, or not visible) are simply missing.
    #[serde(default)]
    pub items: VecDeque<Video>,
}

/// A `video` resource represents a YouTube video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#resource>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    /// The ID that YouTube uses to uniquely identify the video.
    pub id: String,
    pub snippet: VideoSnippet,
    #[serde(rename = "contentDetails")]
    pub content_details: VideoContentDetails,
    /// Contains statistics about the video.
    pub statistics: VideoStatistics,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#snippet>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// When the video was published, in ISO 8601 format. Kept verbatim.
    #[serde(rename = "publishedAt")]
    pub published_at: String,
}

/// See: <https://developers.google.com/youtube/v3/docs/videos#contentDetails>
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoContentDetails {
    /// ISO 8601 duration such as `PT4M13S`.
    pub duration: String,
}

/// Statistics about the video.
///
/// See: <https://developers.google.com/youtube/v3/docs/videos#statistics>
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoStatistics {
    /// The number of times the video has been viewed.
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    /// The number of users who have indicated that they liked the video.
    #[serde(rename = "likeCount")]
    pub like_count: Option<String>,
    /// The number of users who have indicated that they disliked the video.
    /// Note: This is only visible to the video owner.
    #[serde(rename = "dislikeCount")]
    pub dislike_count: Option<String>,
    /// Deprecated by YouTube and always 0. Requested but not reported.
    #[serde(rename = "favoriteCount")]
    pub favorite_count: Option<String>,
    /// The number of comments for the video.
    #[serde(rename = "commentCount")]
    pub comment_count: Option<String>,
}
