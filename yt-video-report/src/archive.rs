//! Dated report files and the daily run that produces them.
//!
//! Every run works on two days: `today`, whose archive is fetched (or reused) and whose slim
//! report is derived from it, and the sweep day `today - retention_days`, whose archive is
//! deleted. Both days' month directories must already exist.

use crate::error::ReportError;
use crate::report::{ColumnSet, ReportTable};
use crate::youtube_api::{VideoApi, fetch_videos};
use eyre::Context;
use jiff::ToSpan;
use jiff::civil::Date;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use tracing::instrument;

pub const DEFAULT_MONTH_DIR_FORMAT: &str = "%y%m";
pub const DEFAULT_ARCHIVE_FILE_FORMAT: &str = "comp-%d.csv";
pub const DEFAULT_SLIM_FILE_FORMAT: &str = "%d.csv";

/// Where the report files for a given day live.
///
/// `<data_dir>/<month dir>/<archive file>` and `<data_dir>/<month dir>/<slim file>`, where each
/// component is a [`jiff::fmt::strtime`] template rendered with the day in question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    data_dir: PathBuf,
    month_dir_format: String,
    archive_file_format: String,
    slim_file_format: String,
}

impl Layout {
    /// A layout rooted at `data_dir` with the default `%y%m/comp-%d.csv` and `%y%m/%d.csv`
    /// names.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            month_dir_format: DEFAULT_MONTH_DIR_FORMAT.to_string(),
            archive_file_format: DEFAULT_ARCHIVE_FILE_FORMAT.to_string(),
            slim_file_format: DEFAULT_SLIM_FILE_FORMAT.to_string(),
        }
    }

    /// Replaces the name templates.
    ///
    /// Each template must render to something non-empty, and the two file templates must not
    /// render to anything containing a path separator.
    pub fn with_formats(
        mut self,
        month_dir: impl Into<String>,
        archive_file: impl Into<String>,
        slim_file: impl Into<String>,
    ) -> Result<Self, ReportError> {
        self.month_dir_format = month_dir.into();
        self.archive_file_format = archive_file.into();
        self.slim_file_format = slim_file.into();

        let sample = jiff::civil::date(2000, 1, 1);
        let month = render(&self.month_dir_format, sample)?;
        let archive = render(&self.archive_file_format, sample)?;
        let slim = render(&self.slim_file_format, sample)?;
        if month.is_empty() {
            return Err(ReportError::Configuration(
                "month directory format renders to an empty name".into(),
            ));
        }
        for (what, name) in [("archive file", &archive), ("slim file", &slim)] {
            if name.is_empty() || name.chars().any(std::path::is_separator) {
                return Err(ReportError::Configuration(format!(
                    "{what} format must render to a plain file name, got {name:?}"
                )));
            }
        }
        if archive == slim {
            return Err(ReportError::Configuration(format!(
                "archive and slim file formats both render to {archive:?}"
            )));
        }
        Ok(self)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn month_dir(&self, day: Date) -> Result<PathBuf, ReportError> {
        Ok(self.data_dir.join(render(&self.month_dir_format, day)?))
    }

    pub fn archive_path(&self, day: Date) -> Result<PathBuf, ReportError> {
        Ok(self
            .month_dir(day)?
            .join(render(&self.archive_file_format, day)?))
    }

    pub fn slim_path(&self, day: Date) -> Result<PathBuf, ReportError> {
        Ok(self
            .month_dir(day)?
            .join(render(&self.slim_file_format, day)?))
    }
}

fn render(format: &str, day: Date) -> Result<String, ReportError> {
    jiff::fmt::strtime::format(format, day).map_err(|e| {
        ReportError::Configuration(format!("cannot render {format:?} for {day}: {e}"))
    })
}

/// Where the rows of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Fetched from the API and written to a new archive.
    Fetched,
    /// Read back from an archive an earlier run wrote the same day.
    Cached,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub archive: PathBuf,
    pub slim: PathBuf,
    pub source: Source,
    pub rows: usize,
    /// The expired archive that was deleted, if there was one.
    pub swept: Option<PathBuf>,
}

/// Runs the daily archive / slim / sweep pass.
#[derive(Debug, Clone)]
pub struct Archiver {
    layout: Layout,
    columns: ColumnSet,
    retention_days: u32,
}

impl Archiver {
    /// `retention_days` must be at least 1, as anything less would sweep today's own archive.
    pub fn new(layout: Layout, columns: ColumnSet, retention_days: u32) -> Result<Self, ReportError> {
        if retention_days == 0 {
            return Err(ReportError::Configuration(
                "retention must be at least one day".into(),
            ));
        }
        Ok(Self {
            layout,
            columns,
            retention_days,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The day whose archive a run on `today` deletes.
    pub fn sweep_day(&self, today: Date) -> eyre::Result<Date> {
        today
            .checked_sub(i64::from(self.retention_days).days())
            .with_context(|| format!("{today} minus {} days", self.retention_days))
    }

    /// Produces today's archive and slim report, then deletes the expired archive.
    ///
    /// `connect` is only called when today's archive does not exist yet, so a second run on the
    /// same day needs neither credentials nor network.
    #[instrument(skip(self, connect), fields(%today))]
    pub async fn run<A, F>(&self, today: Date, connect: F) -> eyre::Result<RunSummary>
    where
        A: VideoApi,
        F: AsyncFnOnce() -> eyre::Result<A>,
    {
        // check-archive
        let sweep_day = self.sweep_day(today)?;
        let month_dir = self.layout.month_dir(today)?;
        let sweep_month_dir = self.layout.month_dir(sweep_day)?;
        require_dir(&month_dir).await?;
        if sweep_month_dir != month_dir {
            require_dir(&sweep_month_dir).await?;
        }

        let archive = self.layout.archive_path(today)?;
        let exists = tokio::fs::try_exists(&archive)
            .await
            .with_context(|| format!("check for archive {}", archive.display()))?;

        let (table, source) = if exists {
            tracing::info!(phase = "load-existing", archive = %archive.display(), "archive already exists");
            let table = load_archive(&archive).await?;
            (table, Source::Cached)
        } else {
            tracing::info!(phase = "fetch-and-write", archive = %archive.display(), "fetching video statistics");
            let api = connect().await.context("connect to YouTube")?;
            let table = self.fetch(&api).await?;
            save(&archive, |buf| table.write_archive(buf))
                .await
                .with_context(|| format!("write archive {}", archive.display()))?;
            (table, Source::Fetched)
        };

        // derive-slim
        let slim = self.layout.slim_path(today)?;
        save(&slim, |buf| table.write_slim(buf))
            .await
            .with_context(|| format!("write slim report {}", slim.display()))?;
        tracing::info!(phase = "derive-slim", slim = %slim.display(), rows = table.records().len(), "wrote slim report");

        // retention-sweep
        let expired = self.layout.archive_path(sweep_day)?;
        let swept = match tokio::fs::remove_file(&expired).await {
            Ok(()) => {
                tracing::info!(phase = "retention-sweep", archive = %expired.display(), "deleted expired archive");
                Some(expired)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(phase = "retention-sweep", archive = %expired.display(), "no expired archive");
                None
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("delete expired archive {}", expired.display()));
            }
        };

        Ok(RunSummary {
            archive,
            slim,
            source,
            rows: table.records().len(),
            swept,
        })
    }

    async fn fetch(&self, api: &impl VideoApi) -> eyre::Result<ReportTable> {
        let channel = api
            .fetch_my_channel()
            .await
            .context("fetch channel summary")?;
        tracing::info!(
            channel = %channel.title,
            id = %channel.id,
            videos = channel.video_count,
            views = channel.view_count,
            subscribers = ?channel.subscriber_count,
            "fetched channel"
        );

        let ids = api
            .fetch_my_video_ids()
            .await
            .context("list own video ids")?;
        fetch_videos(api, &ids, &self.columns).await
    }
}

async fn require_dir(dir: &Path) -> eyre::Result<()> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ReportError::MissingDirectory(dir.to_path_buf()).into()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ReportError::MissingDirectory(dir.to_path_buf()).into())
        }
        Err(e) => Err(e).with_context(|| format!("inspect {}", dir.display())),
    }
}

async fn load_archive(path: &Path) -> eyre::Result<ReportTable> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read archive {}", path.display()))?;
    ReportTable::read_archive(bytes.as_slice())
        .with_context(|| format!("parse archive {}", path.display()))
}

/// Renders a CSV into memory and moves it into place, so a failed write never leaves a
/// truncated file at `path`. The intermediate `.partial` file is removed if anything fails.
async fn save<F>(path: &Path, write: F) -> eyre::Result<()>
where
    F: FnOnce(&mut Vec<u8>) -> eyre::Result<()>,
{
    let mut buf = Vec::new();
    write(&mut buf)?;

    let mut partial = OsString::from(path.as_os_str());
    partial.push(".partial");
    let partial = PathBuf::from(partial);
    let written = match tokio::fs::write(&partial, &buf).await {
        Ok(()) => tokio::fs::rename(&partial, path)
            .await
            .with_context(|| format!("move {} into place", partial.display())),
        Err(e) => Err(e).with_context(|| format!("write {}", partial.display())),
    };
    if written.is_err() {
        match tokio::fs::remove_file(&partial).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %partial.display(), error = %e, "could not remove partial file");
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn default_layout() {
        let layout = Layout::new("DataCollection");
        let day = date(2020, 5, 17);
        assert_eq!(
            layout.month_dir(day).unwrap(),
            Path::new("DataCollection/2005")
        );
        assert_eq!(
            layout.archive_path(day).unwrap(),
            Path::new("DataCollection/2005/comp-17.csv")
        );
        assert_eq!(
            layout.slim_path(day).unwrap(),
            Path::new("DataCollection/2005/17.csv")
        );
    }

    #[tokio::test]
    async fn failed_save_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory where the file should go makes the final rename fail
        let target = dir.path().join("comp-17.csv");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupant"), "x").unwrap();

        let result = save(&target, |buf| {
            buf.extend_from_slice(b"id\n");
            Ok(())
        })
        .await;

        assert!(result.is_err());
        assert!(!dir.path().join("comp-17.csv.partial").exists());
        assert!(target.join("occupant").exists());
    }

    #[tokio::test]
    async fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("17.csv");
        std::fs::write(&target, "old").unwrap();

        save(&target, |buf| {
            buf.extend_from_slice(b"new");
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn custom_layout() {
        let layout = Layout::new("data")
            .with_formats("%Y-%m", "full-%Y%m%d.csv", "public-%Y%m%d.csv")
            .unwrap();
        assert_eq!(
            layout.archive_path(date(2021, 12, 3)).unwrap(),
            Path::new("data/2021-12/full-20211203.csv")
        );
        assert_eq!(
            layout.slim_path(date(2021, 12, 3)).unwrap(),
            Path::new("data/2021-12/public-20211203.csv")
        );
    }

    #[test]
    fn bad_layouts() {
        for (month, archive, slim) in [
            ("", "comp-%d.csv", "%d.csv"),
            ("%y%m", "", "%d.csv"),
            ("%y%m", "sub/comp-%d.csv", "%d.csv"),
            ("%y%m", "%d.csv", "%d.csv"),
            ("%y%m", "comp-%", "%d.csv"),
        ] {
            let result = Layout::new("data").with_formats(month, archive, slim);
            assert!(
                matches!(result, Err(ReportError::Configuration(_))),
                "{month:?} {archive:?} {slim:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn sweep_day_crosses_months() {
        let archiver = Archiver::new(Layout::new("data"), ColumnSet::default(), 1).unwrap();
        assert_eq!(archiver.sweep_day(date(2020, 3, 1)).unwrap(), date(2020, 2, 29));

        let archiver = Archiver::new(Layout::new("data"), ColumnSet::default(), 7).unwrap();
        assert_eq!(archiver.sweep_day(date(2021, 1, 3)).unwrap(), date(2020, 12, 27));
    }

    #[test]
    fn zero_retention_is_rejected() {
        assert!(matches!(
            Archiver::new(Layout::new("data"), ColumnSet::default(), 0),
            Err(ReportError::Configuration(_))
        ));
    }
}
