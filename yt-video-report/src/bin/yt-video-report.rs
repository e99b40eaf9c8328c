use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use yt_video_report::archive::Source;
use yt_video_report::config::{Args, Config};
use yt_video_report::credentials::{TokenCache, acquire};
use yt_video_report::oauth::{ClientSecrets, OAuthManager};
use yt_video_report::youtube_api::YouTubeClient;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(Args::parse())?;
    let today = config.today();
    tracing::info!(%today, data_dir = %config.archiver.layout().data_dir().display(), "starting report");

    let connect = async || -> eyre::Result<YouTubeClient> {
        let secrets = ClientSecrets::load(&config.client_secrets)?;
        let oauth_manager = OAuthManager::new(secrets, config.scopes.clone())
            .with_timeout(config.auth_timeout);
        let cache = TokenCache::new(&config.token_cache);
        let token = acquire(&cache, &oauth_manager)
            .await
            .context("obtain YouTube credentials")?;
        Ok(
            YouTubeClient::new(token, Arc::new(oauth_manager), reqwest::Client::new())
                .with_base_url(&config.api_base_url),
        )
    };

    let summary = config.archiver.run(today, connect).await?;

    tracing::info!(
        rows = summary.rows,
        archive = %summary.archive.display(),
        slim = %summary.slim.display(),
        cached = summary.source == Source::Cached,
        swept = ?summary.swept,
        "report complete"
    );
    Ok(())
}
