//! The report table and its two CSV renditions.
//!
//! The *archive* form carries every column plus a leading, unnamed row index. The *slim* form
//! is the first [`SLIM_COLUMNS`] columns (id, title and the four counters) without the index,
//! which leaves out duration, publish date and the description.

use crate::error::ReportError;
use crate::youtube_api::Video;
use crate::youtube_api::parse_count;
use eyre::Context;
use std::io;

/// Number of fields in a [`VideoRecord`], and so the number of labels in a [`ColumnSet`].
pub const FIELD_COUNT: usize = 9;

/// Columns kept in the slim report.
pub const SLIM_COLUMNS: usize = 6;

const ENGLISH_LABELS: [&str; FIELD_COUNT] = [
    "id",
    "title",
    "viewCount",
    "likeCount",
    "dislikeCount",
    "commentCount",
    "duration",
    "publishedAt",
    "description",
];

const JAPANESE_LABELS: [&str; FIELD_COUNT] = [
    "識別番号",
    "タイトル",
    "視聴回数",
    "高評価",
    "低評価",
    "コメント数",
    "動画時間",
    "投稿日",
    "概要",
];

/// Header labels for the report, one per [`VideoRecord`] field, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSet {
    labels: Vec<String>,
}

impl ColumnSet {
    /// Accepts exactly [`FIELD_COUNT`] non-empty labels.
    pub fn new<I, S>(labels: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != FIELD_COUNT {
            return Err(ReportError::Configuration(format!(
                "expected {FIELD_COUNT} column labels (one per video field), got {}: {labels:?}",
                labels.len()
            )));
        }
        if let Some(i) = labels.iter().position(|l| l.trim().is_empty()) {
            return Err(ReportError::Configuration(format!(
                "column label {} is empty",
                i + 1
            )));
        }
        Ok(Self { labels })
    }

    /// `id,title,viewCount,likeCount,dislikeCount,commentCount,duration,publishedAt,description`
    pub fn english() -> Self {
        Self {
            labels: ENGLISH_LABELS.map(String::from).to_vec(),
        }
    }

    pub fn japanese() -> Self {
        Self {
            labels: JAPANESE_LABELS.map(String::from).to_vec(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::english()
    }
}

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub view_count: u64,
    pub like_count: u64,
    pub dislike_count: u64,
    pub comment_count: u64,
    /// The API's ISO 8601 duration minus its leading `PT`, e.g. `4M13S`.
    pub duration: String,
    pub published_at: String,
    /// The video description followed by a newline.
    pub description: String,
}

impl TryFrom<Video> for VideoRecord {
    type Error = ReportError;

    fn try_from(video: Video) -> Result<Self, Self::Error> {
        let stats = &video.statistics;
        let count = |value: &Option<String>, field: &str| {
            parse_count(value.as_deref(), field)
                .map_err(|reason| ReportError::MalformedRecord(format!("video {}: {reason}", video.id)))
        };
        let view_count = count(&stats.view_count, "viewCount")?;
        let like_count = count(&stats.like_count, "likeCount")?;
        let dislike_count = count(&stats.dislike_count, "dislikeCount")?;
        let comment_count = count(&stats.comment_count, "commentCount")?;

        // Always "PT..." in practice; the first two characters are dropped unconditionally.
        let duration = video
            .content_details
            .duration
            .get(2..)
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            view_count,
            like_count,
            dislike_count,
            comment_count,
            duration,
            description: format!("{}\n", video.snippet.description),
            published_at: video.snippet.published_at,
            title: video.snippet.title,
            id: video.id,
        })
    }
}

impl VideoRecord {
    /// The record's fields as CSV cells, in column order.
    pub fn fields(&self) -> [String; FIELD_COUNT] {
        [
            self.id.clone(),
            self.title.clone(),
            self.view_count.to_string(),
            self.like_count.to_string(),
            self.dislike_count.to_string(),
            self.comment_count.to_string(),
            self.duration.clone(),
            self.published_at.clone(),
            self.description.clone(),
        ]
    }

    fn from_fields(fields: &csv::StringRecord) -> Result<Self, String> {
        if fields.len() != FIELD_COUNT {
            return Err(format!(
                "expected {FIELD_COUNT} fields, found {}",
                fields.len()
            ));
        }
        let field = |i: usize| fields.get(i).unwrap_or_default();
        let count = |i: usize| parse_count(Some(field(i)), ENGLISH_LABELS[i]);
        Ok(Self {
            id: field(0).to_string(),
            title: field(1).to_string(),
            view_count: count(2)?,
            like_count: count(3)?,
            dislike_count: count(4)?,
            comment_count: count(5)?,
            duration: field(6).to_string(),
            published_at: field(7).to_string(),
            description: field(8).to_string(),
        })
    }
}

/// The report: records in the order they were fetched, under a set of column labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    columns: ColumnSet,
    records: Vec<VideoRecord>,
}

impl ReportTable {
    pub fn new(columns: ColumnSet, records: Vec<VideoRecord>) -> Self {
        Self { columns, records }
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    /// Writes the archive form: an unnamed index column, then every labelled column.
    pub fn write_archive<W: io::Write>(&self, writer: W) -> eyre::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(
            std::iter::once("").chain(self.columns.labels().iter().map(String::as_str)),
        )
        .context("write archive header")?;
        for (index, record) in self.records.iter().enumerate() {
            csv.write_record(std::iter::once(index.to_string()).chain(record.fields()))
                .with_context(|| format!("write archive row for video {}", record.id))?;
        }
        csv.flush().context("flush archive")?;
        Ok(())
    }

    /// Reads a table back from its archive form.
    ///
    /// The header provides the column labels; the index column is discarded.
    pub fn read_archive<R: io::Read>(reader: R) -> eyre::Result<Self> {
        let mut csv = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let header = csv
            .headers()
            .map_err(|e| ReportError::MalformedRecord(format!("archive header: {e}")))?
            .clone();
        let columns = ColumnSet::new(header.iter().skip(1)).map_err(|e| {
            ReportError::MalformedRecord(format!("archive header {:?}: {e}", header))
        })?;

        let mut records = Vec::new();
        for (row, result) in csv.records().enumerate() {
            let fields = result
                .map_err(|e| ReportError::MalformedRecord(format!("archive row {row}: {e}")))?;
            let without_index: csv::StringRecord = fields.iter().skip(1).collect();
            let record = VideoRecord::from_fields(&without_index)
                .map_err(|reason| ReportError::MalformedRecord(format!("archive row {row}: {reason}")))?;
            records.push(record);
        }

        Ok(Self { columns, records })
    }

    /// Writes the slim form: the first [`SLIM_COLUMNS`] columns, no index.
    pub fn write_slim<W: io::Write>(&self, writer: W) -> eyre::Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(&self.columns.labels()[..SLIM_COLUMNS])
            .context("write slim header")?;
        for record in &self.records {
            csv.write_record(&record.fields()[..SLIM_COLUMNS])
                .with_context(|| format!("write slim row for video {}", record.id))?;
        }
        csv.flush().context("flush slim report")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::youtube_api::videos::{VideoContentDetails, VideoSnippet, VideoStatistics};
    use pretty_assertions::assert_eq;

    fn video(id: &str, stats: [Option<&str>; 4]) -> Video {
        let [views, likes, dislikes, comments] = stats.map(|s| s.map(String::from));
        Video {
            id: id.to_string(),
            snippet: VideoSnippet {
                title: format!("Title of {id}"),
                description: "line one\nline \"two\", with comma".to_string(),
                published_at: "2020-05-17T09:30:00Z".to_string(),
            },
            content_details: VideoContentDetails {
                duration: "PT4M13S".to_string(),
            },
            statistics: VideoStatistics {
                view_count: views,
                like_count: likes,
                dislike_count: dislikes,
                favorite_count: Some("0".to_string()),
                comment_count: comments,
            },
        }
    }

    fn table() -> ReportTable {
        let records = ["a", "b", "c"]
            .into_iter()
            .map(|id| {
                VideoRecord::try_from(video(id, [Some("100"), Some("10"), Some("1"), Some("5")]))
                    .unwrap()
            })
            .collect();
        ReportTable::new(ColumnSet::default(), records)
    }

    #[test]
    fn record_from_video() {
        let record =
            VideoRecord::try_from(video("a", [Some("100"), Some("10"), Some("1"), Some("5")]))
                .unwrap();
        assert_eq!(
            record,
            VideoRecord {
                id: "a".into(),
                title: "Title of a".into(),
                view_count: 100,
                like_count: 10,
                dislike_count: 1,
                comment_count: 5,
                duration: "4M13S".into(),
                published_at: "2020-05-17T09:30:00Z".into(),
                description: "line one\nline \"two\", with comma\n".into(),
            }
        );
    }

    #[test]
    fn missing_statistic_is_malformed() {
        let e = VideoRecord::try_from(video("a", [Some("100"), None, Some("1"), Some("5")]))
            .unwrap_err();
        assert!(matches!(e, ReportError::MalformedRecord(ref m) if m.contains("likeCount")));
    }

    #[test]
    fn short_duration_becomes_empty() {
        let mut v = video("a", [Some("1"), Some("1"), Some("1"), Some("1")]);
        v.content_details.duration = "P".into();
        assert_eq!(VideoRecord::try_from(v).unwrap().duration, "");
    }

    #[test]
    fn column_sets_need_nine_labels() {
        assert!(ColumnSet::new(ENGLISH_LABELS).is_ok());
        assert_eq!(ColumnSet::new(ENGLISH_LABELS).unwrap(), ColumnSet::english());
        assert_eq!(ColumnSet::japanese().labels()[0], "識別番号");

        let seven = &ENGLISH_LABELS[..7];
        assert!(matches!(
            ColumnSet::new(seven.iter().copied()),
            Err(ReportError::Configuration(_))
        ));
        let mut blank = ENGLISH_LABELS;
        blank[3] = " ";
        assert!(matches!(
            ColumnSet::new(blank),
            Err(ReportError::Configuration(_))
        ));
    }

    #[test]
    fn archive_layout() {
        let mut buf = Vec::new();
        table().write_archive(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            ",id,title,viewCount,likeCount,dislikeCount,commentCount,duration,publishedAt,description"
        );
        assert_eq!(
            lines.next().unwrap(),
            "0,a,Title of a,100,10,1,5,4M13S,2020-05-17T09:30:00Z,\"line one"
        );
        assert_eq!(lines.next().unwrap(), "line \"\"two\"\", with comma");
        // the description's trailing newline sits inside the quoted cell
        assert_eq!(lines.next().unwrap(), "\"");
        assert!(lines.next().unwrap().starts_with("1,b,"));
    }

    #[test]
    fn archive_reads_back() {
        let original = table();
        let mut buf = Vec::new();
        original.write_archive(&mut buf).unwrap();
        assert_eq!(ReportTable::read_archive(buf.as_slice()).unwrap(), original);
    }

    #[test]
    fn archive_keeps_custom_labels() {
        let original = ReportTable::new(ColumnSet::japanese(), table().records.clone());
        let mut buf = Vec::new();
        original.write_archive(&mut buf).unwrap();
        let read = ReportTable::read_archive(buf.as_slice()).unwrap();
        assert_eq!(read.columns(), &ColumnSet::japanese());
    }

    #[test]
    fn archive_with_bad_count_is_malformed() {
        let archive = ",id,title,viewCount,likeCount,dislikeCount,commentCount,duration,publishedAt,description\n\
            0,a,t,many,1,1,1,1M,2020-01-01T00:00:00Z,d\n";
        let e = ReportTable::read_archive(archive.as_bytes()).unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::MalformedRecord(m)) if m.contains("row 0")
        ));
    }

    #[test]
    fn archive_with_short_header_is_malformed() {
        let archive = ",id,title\n0,a,t\n";
        let e = ReportTable::read_archive(archive.as_bytes()).unwrap_err();
        assert!(matches!(
            ReportError::of(&e),
            Some(ReportError::MalformedRecord(_))
        ));
    }

    #[test]
    fn slim_is_first_six_archive_columns() {
        let table = table();
        let mut archive = Vec::new();
        table.write_archive(&mut archive).unwrap();
        let mut slim = Vec::new();
        table.write_slim(&mut slim).unwrap();

        let mut archive = csv::Reader::from_reader(archive.as_slice());
        let mut slim = csv::Reader::from_reader(slim.as_slice());
        let archive_header: Vec<String> =
            archive.headers().unwrap().iter().map(String::from).collect();
        let slim_header: Vec<String> = slim.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(slim_header, &archive_header[1..=SLIM_COLUMNS]);

        let archive_rows: Vec<csv::StringRecord> =
            archive.records().map(Result::unwrap).collect();
        let slim_rows: Vec<csv::StringRecord> = slim.records().map(Result::unwrap).collect();
        assert_eq!(slim_rows.len(), archive_rows.len());
        for (s, a) in slim_rows.iter().zip(&archive_rows) {
            let expected: Vec<&str> = a.iter().skip(1).take(SLIM_COLUMNS).collect();
            assert_eq!(s.iter().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn slim_layout() {
        let mut buf = Vec::new();
        table().write_slim(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "id,title,viewCount,likeCount,dislikeCount,commentCount\n\
             a,Title of a,100,10,1,5\n\
             b,Title of b,100,10,1,5\n\
             c,Title of c,100,10,1,5\n"
        );
    }
}
