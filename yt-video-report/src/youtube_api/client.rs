//! Core YouTube API client functionality and authentication management.

use crate::credentials::TimeBoundAccessToken;
use crate::error::ReportError;
use crate::oauth::OAuthManager;
use crate::youtube_api::{
    VideoApi,
    channels::{CHANNEL_FIELDS, ChannelListResponse, ChannelSummary},
    search::{SEARCH_FIELDS, SearchListResponse},
    types::{Page, PagedStream},
    videos::{VIDEO_FIELDS, Video, VideoListResponse},
};
use eyre::Context;
use http::Method;
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

/// Where the YouTube Data API v3 lives.
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The largest page (and `id` batch) the API accepts.
pub const MAX_RESULTS: u32 = 50;

/// Client for interacting with the YouTube Data API v3.
///
/// This client wraps an OAuth2 token and provides the read-only calls needed to report on the
/// authenticated user's own videos. Expired access tokens are refreshed before a request using
/// the stored refresh token and the [`OAuthManager`].
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    /// The current OAuth2 token.
    token: Arc<Mutex<TimeBoundAccessToken>>,
    /// OAuth manager for refreshing tokens
    oauth_manager: Arc<OAuthManager>,
    /// HTTP client for API requests
    client: reqwest::Client,
    base_url: String,
}

impl YouTubeClient {
    /// Creates a new YouTube API client with the provided OAuth2 token, OAuth manager, and HTTP client.
    pub fn new(
        token: TimeBoundAccessToken,
        oauth_manager: Arc<OAuthManager>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            token: Arc::new(Mutex::new(token)),
            oauth_manager,
            client,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Sends requests to `base_url` instead of [`DEFAULT_API_BASE_URL`].
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns a clone of the current token, including any refresh that happened.
    pub async fn token(&self) -> TimeBoundAccessToken {
        self.token.lock().await.clone()
    }

    /// Gets a guaranteed-fresh access token, refreshing if necessary.
    #[instrument(skip(self))]
    pub(crate) async fn fresh_access_token(&self) -> eyre::Result<String> {
        let mut token = self.token.lock().await;

        if !token.is_valid() {
            tracing::debug!("access token expired, attempting refresh");

            if token.refresh(self.oauth_manager.as_ref()).await? {
                tracing::debug!("access token successfully refreshed");
            } else {
                tracing::error!("access token refresh failed, client is unusable");
                return Err(ReportError::Authorization(
                    "unable to refresh expired access token".into(),
                )
                .into());
            }
        }

        Ok(token.access_token().to_string())
    }

    /// Makes an authenticated HTTP request to the YouTube API with common error handling.
    ///
    /// - Token freshness validation and refresh
    /// - Authorization header setup
    /// - Query parameters
    /// - Status code validation
    ///
    /// Transport failures become [`ReportError::Network`], any non-2xx status becomes
    /// [`ReportError::UnexpectedResponse`].
    #[instrument(skip(self), ret, level = tracing::Level::TRACE)]
    pub(crate) async fn make_authenticated_request(
        &self,
        method: Method,
        url: &str,
        query_params: &[(&str, &str)],
    ) -> eyre::Result<reqwest::Response> {
        let access_token = self.fresh_access_token().await?;

        let response = self
            .client
            .request(method.clone(), url)
            .header("Authorization", format!("Bearer {}", access_token))
            .query(query_params)
            .send()
            .await
            .map_err(ReportError::Network)
            .with_context(|| format!("send {} request to YouTube API: {}", method, url))?;

        let status_code = response.status();
        if !status_code.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ReportError::UnexpectedResponse(format!(
                "YouTube API {} {} request failed with status {}: {}",
                method, url, status_code, error_text
            ))
            .into());
        }

        Ok(response)
    }

    /// GETs `endpoint` (relative to the base URL) and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
    ) -> eyre::Result<T> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .make_authenticated_request(Method::GET, &url, query_params)
            .await?;
        response.json().await.map_err(|e| {
            if e.is_decode() {
                ReportError::UnexpectedResponse(format!(
                    "parse YouTube {endpoint} response as JSON: {e}"
                ))
                .into()
            } else {
                eyre::Report::new(ReportError::Network(e))
                    .wrap_err(format!("read YouTube API response body from {url}"))
            }
        })
    }

    /// Returns the authenticated user's channel.
    ///
    /// Uses the `channels.list` API with `mine=true`. An account without a channel yields an
    /// empty item list, which is reported as [`ReportError::UnexpectedResponse`].
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/channels/list>
    #[instrument(skip(self), ret)]
    pub async fn get_my_channel(&self) -> eyre::Result<ChannelSummary> {
        let response: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,statistics"),
                    ("mine", "true"),
                    ("fields", CHANNEL_FIELDS),
                ],
            )
            .await?;

        tracing::debug!(returned_items = response.items.len(), "fetched channels");

        let Some(channel) = response.items.into_iter().next() else {
            return Err(ReportError::UnexpectedResponse(
                "channels.list returned no channel for the authenticated user".into(),
            )
            .into());
        };
        Ok(ChannelSummary::try_from(channel)?)
    }

    /// Returns a paginated stream of the ids of all videos owned by the authenticated user,
    /// newest first.
    ///
    /// Uses the `search.list` API with `forMine=true`, `type=video` and `order=date`. The
    /// stream follows `nextPageToken` until the API stops returning one.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/search/list>
    #[instrument(skip(self))]
    pub fn list_my_video_ids(&self) -> impl Stream<Item = eyre::Result<String>> + use<'_> {
        PagedStream::new(move |page_token| async move {
            let response = self.search_my_videos_internal(MAX_RESULTS, page_token).await?;
            let items: VecDeque<String> = response
                .items
                .into_iter()
                .map(|result| {
                    result.id.video_id.ok_or_else(|| {
                        ReportError::UnexpectedResponse("search result without a videoId".into())
                    })
                })
                .collect::<Result<_, ReportError>>()?;
            Ok(Page {
                items,
                next_page_token: response.next_page_token,
            })
        })
    }

    /// Gets snippet, content details and statistics for up to [`MAX_RESULTS`] videos.
    ///
    /// Items come back in whatever order the API chooses. Ids that do not resolve are left
    /// out by the API.
    ///
    /// # API Reference
    ///
    /// <https://developers.google.com/youtube/v3/docs/videos/list>
    #[instrument(skip(self, video_ids), fields(batch_size = video_ids.len()))]
    pub async fn get_videos(&self, video_ids: &[String]) -> eyre::Result<Vec<Video>> {
        if video_ids.len() > MAX_RESULTS as usize {
            eyre::bail!(
                "videos.list accepts at most {MAX_RESULTS} ids, got {}",
                video_ids.len()
            );
        }
        let ids = video_ids.join(",");
        let videos: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("id", ids.as_str()),
                    ("part", "snippet,contentDetails,statistics"),
                    ("fields", VIDEO_FIELDS),
                ],
            )
            .await?;

        tracing::debug!(returned_items = videos.items.len(), "fetched videos");

        Ok(videos.items.into())
    }

    /// Internal method to call the `search.list` API for one page of the user's own videos.
    ///
    /// # Arguments
    ///
    /// * `max_results` - Maximum number of results per page (1-50)
    /// * `page_token` - Token for retrieving a specific page of results
    async fn search_my_videos_internal(
        &self,
        max_results: u32,
        page_token: Option<String>,
    ) -> eyre::Result<SearchListResponse> {
        let max_results_string = max_results.to_string();
        let mut query_params = vec![
            ("part", "id"),
            ("forMine", "true"),
            ("type", "video"),
            ("order", "date"),
            ("maxResults", max_results_string.as_str()),
            ("fields", SEARCH_FIELDS),
        ];

        if let Some(ref token) = page_token {
            query_params.push(("pageToken", token.as_str()));
        }

        let response: SearchListResponse = self.get_json("search", &query_params).await?;

        tracing::debug!(
            returned_items = response.items.len(),
            has_next_page = response.next_page_token.is_some(),
            "fetched search page"
        );

        Ok(response)
    }
}

impl VideoApi for YouTubeClient {
    async fn fetch_my_channel(&self) -> eyre::Result<ChannelSummary> {
        self.get_my_channel().await
    }

    async fn fetch_my_video_ids(&self) -> eyre::Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut stream = std::pin::pin!(self.list_my_video_ids());
        while let Some(id) = stream.next().await {
            ids.push(id.context("list own videos")?);
        }
        tracing::info!(videos = ids.len(), "listed own videos");
        Ok(ids)
    }

    async fn fetch_video_batch(&self, ids: &[String]) -> eyre::Result<Vec<Video>> {
        self.get_videos(ids).await
    }
}
