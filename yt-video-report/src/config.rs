//! Command line and environment settings.

use crate::archive::{
    Archiver, DEFAULT_ARCHIVE_FILE_FORMAT, DEFAULT_MONTH_DIR_FORMAT, DEFAULT_SLIM_FILE_FORMAT,
    Layout,
};
use crate::error::ReportError;
use crate::oauth::YOUTUBE_READONLY_SCOPE;
use crate::report::ColumnSet;
use crate::youtube_api::DEFAULT_API_BASE_URL;
use clap::{Parser, ValueEnum};
use eyre::Context;
use jiff::civil::Date;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Built-in report header languages.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnPreset {
    /// API field names (`id`, `title`, `viewCount`, ...)
    #[default]
    En,
    /// Japanese labels (`識別番号`, `タイトル`, `視聴回数`, ...)
    Ja,
}

/// Writes a dated CSV report of statistics for every video on your YouTube channel.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory relative paths are resolved against [default: the executable's directory]
    #[arg(long, env = "YT_REPORT_BASE_DIR")]
    pub base_dir: Option<PathBuf>,

    /// Directory holding the per-month report directories
    #[arg(long, env = "YT_REPORT_DATA_DIR", default_value = "DataCollection")]
    pub data_dir: PathBuf,

    /// Google OAuth client secrets JSON
    #[arg(long, env = "YT_REPORT_CLIENT_SECRETS", default_value = ".top_secrets.json")]
    pub client_secrets: PathBuf,

    /// Where the OAuth token is cached between runs
    #[arg(long, env = "YT_REPORT_TOKEN_CACHE", default_value = ".youtube-oauth2.json")]
    pub token_cache: PathBuf,

    /// OAuth scope to request; may be given more than once
    #[arg(
        long = "scope",
        env = "YT_REPORT_SCOPE",
        value_delimiter = ',',
        default_value = YOUTUBE_READONLY_SCOPE
    )]
    pub scopes: Vec<String>,

    /// Delete the archive from this many days ago on every run
    #[arg(
        long,
        env = "YT_REPORT_RETENTION_DAYS",
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub retention_days: u32,

    /// Header language for the report
    #[arg(long, env = "YT_REPORT_COLUMNS", value_enum, default_value_t)]
    pub columns: ColumnPreset,

    /// Custom header labels: exactly nine, comma-separated, in field order
    #[arg(
        long,
        env = "YT_REPORT_COLUMN_LABELS",
        value_delimiter = ',',
        conflicts_with = "columns"
    )]
    pub column_labels: Option<Vec<String>>,

    /// strftime template for the month directory
    #[arg(long, env = "YT_REPORT_MONTH_DIR_FORMAT", default_value = DEFAULT_MONTH_DIR_FORMAT)]
    pub month_dir_format: String,

    /// strftime template for the full archive file name
    #[arg(long, env = "YT_REPORT_ARCHIVE_FILE_FORMAT", default_value = DEFAULT_ARCHIVE_FILE_FORMAT)]
    pub archive_file_format: String,

    /// strftime template for the slim report file name
    #[arg(long, env = "YT_REPORT_SLIM_FILE_FORMAT", default_value = DEFAULT_SLIM_FILE_FORMAT)]
    pub slim_file_format: String,

    /// Report date, YYYY-MM-DD [default: today]
    #[arg(long, env = "YT_REPORT_DATE")]
    pub date: Option<Date>,

    /// YouTube Data API base URL
    #[arg(long, env = "YT_REPORT_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Seconds to wait for the browser consent flow to finish
    #[arg(
        long,
        env = "YT_REPORT_AUTH_TIMEOUT_SECS",
        default_value = "300",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub auth_timeout_secs: u64,
}

/// Validated settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub client_secrets: PathBuf,
    pub token_cache: PathBuf,
    pub scopes: Vec<String>,
    pub archiver: Archiver,
    pub date: Option<Date>,
    pub api_base_url: String,
    pub auth_timeout: Duration,
}

impl Config {
    /// Resolves paths and checks every setting that can be checked before doing any work.
    pub fn from_args(args: Args) -> eyre::Result<Self> {
        let base_dir = match args.base_dir {
            Some(dir) => dir,
            None => executable_dir()?,
        };

        let columns = match args.column_labels {
            Some(labels) => ColumnSet::new(labels)?,
            None => match args.columns {
                ColumnPreset::En => ColumnSet::english(),
                ColumnPreset::Ja => ColumnSet::japanese(),
            },
        };

        let scopes: Vec<String> = args
            .scopes
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if scopes.is_empty() {
            return Err(ReportError::Configuration("at least one OAuth scope is required".into()).into());
        }

        let layout = Layout::new(base_dir.join(args.data_dir)).with_formats(
            args.month_dir_format,
            args.archive_file_format,
            args.slim_file_format,
        )?;
        let archiver = Archiver::new(layout, columns, args.retention_days)?;

        Ok(Self {
            client_secrets: base_dir.join(args.client_secrets),
            token_cache: base_dir.join(args.token_cache),
            scopes,
            archiver,
            date: args.date,
            api_base_url: args.api_base_url,
            auth_timeout: Duration::from_secs(args.auth_timeout_secs),
        })
    }

    /// The day to report on: `--date` if given, otherwise today in the system time zone.
    pub fn today(&self) -> Date {
        self.date.unwrap_or_else(|| jiff::Zoned::now().date())
    }
}

fn executable_dir() -> eyre::Result<PathBuf> {
    let exe = std::env::current_exe().context("locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| eyre::eyre!("executable path {} has no parent", exe.display()))
}
