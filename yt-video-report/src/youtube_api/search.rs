//! YouTube Search API types.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Field mask for `search.list`: the cursor and the video ids, nothing else.
pub(crate) const SEARCH_FIELDS: &str = "nextPageToken,items(id(videoId))";

/// Response structure for the `search.list` API call.
///
/// See: <https://developers.google.com/youtube/v3/docs/search/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: VecDeque<SearchResult>,
    /// Token that can be used as the value of the pageToken parameter to retrieve the next page in the result set.
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

/// See: <https://developers.google.com/youtube/v3/docs/search#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: SearchResultId,
}

/// Identifies the resource a search result points at.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultId {
    /// Only set for results of type `youtube#video`.
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}
