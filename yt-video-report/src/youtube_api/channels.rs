//! YouTube Channels API types and functionality.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Field mask for `channels.list`: only what [`ChannelSummary`] needs.
pub(crate) const CHANNEL_FIELDS: &str =
    "items(id,snippet(title,description),statistics(videoCount,viewCount,subscriberCount))";

/// Response structure for the `channels.list` API call.
///
/// The request uses a field mask, so only `items` is present.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels/list>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelListResponse {
    /// A list of channels that match the request criteria.
    #[serde(default)]
    pub items: VecDeque<Channel>,
}

/// A `channel` resource contains information about a YouTube channel.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#resource>
#[derive(Debug, Serialize, Deserialize)]
pub struct Channel {
    /// The ID that YouTube uses to uniquely identify the channel.
    pub id: String,
    pub snippet: ChannelSnippet,
    pub statistics: ChannelStatistics,
}

/// See: <https://developers.google.com/youtube/v3/docs/channels#snippet>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelSnippet {
    /// The channel's title.
    pub title: String,
    /// The channel's description.
    #[serde(default)]
    pub description: String,
}

/// Statistics about the channel.
///
/// The API encodes the counts as decimal strings.
///
/// See: <https://developers.google.com/youtube/v3/docs/channels#statistics>
#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelStatistics {
    #[serde(rename = "videoCount")]
    pub video_count: Option<String>,
    #[serde(rename = "viewCount")]
    pub view_count: Option<String>,
    /// Absent when the channel hides its subscriber count.
    #[serde(rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
}

/// The authenticated user's channel, as reported once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub video_count: u64,
    pub view_count: u64,
    /// `None` when the channel hides its subscriber count.
    pub subscriber_count: Option<u64>,
}

impl TryFrom<Channel> for ChannelSummary {
    type Error = ReportError;

    fn try_from(channel: Channel) -> Result<Self, Self::Error> {
        let count = |value: Option<String>, field: &str| {
            super::parse_count(value.as_deref(), field)
                .map_err(|reason| ReportError::MalformedRecord(format!("channel {}: {reason}", channel.id)))
        };
        Ok(Self {
            video_count: count(channel.statistics.video_count, "videoCount")?,
            view_count: count(channel.statistics.view_count, "viewCount")?,
            subscriber_count: match channel.statistics.subscriber_count {
                Some(subscribers) => Some(count(Some(subscribers), "subscriberCount")?),
                None => None,
            },
            title: channel.snippet.title,
            description: channel.snippet.description,
            id: channel.id,
        })
    }
}
