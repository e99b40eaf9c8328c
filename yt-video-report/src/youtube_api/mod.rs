//! YouTube Data API v3 client, limited to reading the authenticated user's own channel.
//!
//! Three calls are involved in a report:
//!
//! 1. `channels.list?mine=true` for a [`ChannelSummary`] of the account,
//! 2. `search.list?forMine=true&type=video&order=date`, paged through with `nextPageToken`, for
//!    the ids of every video the account owns (newest first),
//! 3. `videos.list?id=...` in batches of at most 50 ids, for each video's snippet, duration and
//!    statistics.
//!
//! All three use field masks so the API only sends what the report needs. They are grouped in
//! the [`VideoApi`] trait; [`YouTubeClient`] implements it over HTTP, and anything else that
//! implements it (such as an in-memory fake) can drive [`fetch_videos`] and the
//! [`Archiver`](crate::archive::Archiver).
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use yt_video_report::credentials::{TokenCache, acquire};
//! use yt_video_report::oauth::{ClientSecrets, OAuthManager, YOUTUBE_READONLY_SCOPE};
//! use yt_video_report::report::ColumnSet;
//! use yt_video_report::youtube_api::{VideoApi, YouTubeClient, fetch_videos};
//!
//! # async fn example() -> eyre::Result<()> {
//! let secrets = ClientSecrets::load(".top_secrets.json".as_ref())?;
//! let oauth = OAuthManager::new(secrets, vec![YOUTUBE_READONLY_SCOPE.to_string()]);
//! let token = acquire(&TokenCache::new(".youtube-oauth2.json"), &oauth).await?;
//! let client = YouTubeClient::new(token, Arc::new(oauth), reqwest::Client::new());
//!
//! let ids = client.fetch_my_video_ids().await?;
//! let table = fetch_videos(&client, &ids, &ColumnSet::default()).await?;
//! println!("{} videos", table.records().len());
//! # Ok(())
//! # }
//! ```

pub mod channels;
pub mod client;
pub mod search;
pub mod types;
pub mod videos;

pub use channels::{Channel, ChannelSummary};
pub use client::{DEFAULT_API_BASE_URL, MAX_RESULTS, YouTubeClient};
pub use types::{Page, PagedStream};
pub use videos::{Video, VideoStatistics};

use crate::report::{ColumnSet, ReportTable, VideoRecord};
use eyre::Context;
use std::future::Future;

/// The reads a report needs from YouTube.
pub trait VideoApi {
    /// The authenticated user's channel; an account without one is an error.
    fn fetch_my_channel(&self) -> impl Future<Output = eyre::Result<ChannelSummary>> + Send;

    /// Ids of every video the authenticated user owns, newest first, across all pages.
    fn fetch_my_video_ids(&self) -> impl Future<Output = eyre::Result<Vec<String>>> + Send;

    /// Details for at most [`MAX_RESULTS`] ids in one request.
    fn fetch_video_batch(
        &self,
        ids: &[String],
    ) -> impl Future<Output = eyre::Result<Vec<Video>>> + Send;
}

/// Splits `ids` into the contiguous, order-preserving batches sent to `videos.list`.
pub fn batches<T>(ids: &[T]) -> std::slice::Chunks<'_, T> {
    ids.chunks(MAX_RESULTS as usize)
}

/// Fetches every video in `ids` and lays them out under `columns`.
///
/// One `videos.list` request is made per batch of 50, in order. Records keep the order the API
/// returns them in within a batch. A video whose statistics are incomplete fails the whole
/// fetch.
pub async fn fetch_videos(
    api: &impl VideoApi,
    ids: &[String],
    columns: &ColumnSet,
) -> eyre::Result<ReportTable> {
    let mut records = Vec::with_capacity(ids.len());
    for (i, batch) in batches(ids).enumerate() {
        let videos = api
            .fetch_video_batch(batch)
            .await
            .with_context(|| format!("fetch details for video batch {}", i + 1))?;
        for video in videos {
            records.push(VideoRecord::try_from(video)?);
        }
    }

    if records.len() != ids.len() {
        tracing::warn!(
            requested = ids.len(),
            returned = records.len(),
            "some videos could not be looked up"
        );
    }
    tracing::info!(videos = records.len(), "fetched video details");

    Ok(ReportTable::new(columns.clone(), records))
}

/// Parses one of the API's decimal-string counters.
pub(crate) fn parse_count(value: Option<&str>, field: &str) -> Result<u64, String> {
    let value = value.ok_or_else(|| format!("missing {field}"))?;
    value
        .parse()
        .map_err(|e| format!("{field} {value:?} is not a count: {e}"))
}
