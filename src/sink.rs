use std::{
    fmt::Display,
    fs::File,
    path::{Path, PathBuf},
};

use crate::types::{CrawlerError, ListingRecord};

/// Column order of the output file. Initialization always produces this
/// exact header row, whatever the data holds.
pub const COLUMNS: [&str; 7] = [
    "PICTURE",
    "LINK",
    "NAME",
    "TITLE",
    "RATINGSCORE",
    "RATINGCOUNT",
    "PRICE",
];

/// Append-only CSV destination, opened exactly once per run.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows_written: usize,
}

impl CsvSink {
    /// Creates or truncates the destination and writes the header row.
    pub fn open(path: &Path) -> Result<CsvSink, CrawlerError> {
        let file = File::create(path).map_err(|e| write_error(path, e))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(COLUMNS)
            .map_err(|e| write_error(path, e))?;
        writer.flush().map_err(|e| write_error(path, e))?;
        debug!("sink opened at {}", path.display());

        Ok(CsvSink {
            writer,
            path: path.to_path_buf(),
            rows_written: 0,
        })
    }

    /// Appends one batch and flushes it, so everything written so far
    /// survives a crash later in the run.
    pub fn append(&mut self, records: &[ListingRecord]) -> Result<(), CrawlerError> {
        for record in records {
            self.writer
                .serialize(record)
                .map_err(|e| write_error(&self.path, e))?;
        }
        self.writer.flush().map_err(|e| write_error(&self.path, e))?;
        self.rows_written += records.len();
        Ok(())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_error(path: &Path, err: impl Display) -> CrawlerError {
    CrawlerError::Write {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn record(name: &str, rating: Option<(&str, &str)>) -> ListingRecord {
        ListingRecord {
            picture: "https://img.example/1.webp".into(),
            link: "https://listings.example/gig/1".into(),
            name: name.into(),
            title: "I will build a portfolio website".into(),
            rating_score: rating.map(|(score, _)| score.to_string()),
            rating_count: rating.map(|(_, count)| count.to_string()),
            price: Some("45".into()),
        }
    }

    #[test]
    fn header_is_written_even_without_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let sink = CsvSink::open(&path).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "PICTURE,LINK,NAME,TITLE,RATINGSCORE,RATINGCOUNT,PRICE\n");
    }

    #[test]
    fn reopening_truncates_and_rewrites_the_same_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&[record("Ann", Some(("4.9", "120")))]).unwrap();
        drop(sink);

        let sink = CsvSink::open(&path).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "PICTURE,LINK,NAME,TITLE,RATINGSCORE,RATINGCOUNT,PRICE\n");
    }

    #[test]
    fn batches_are_durable_before_the_next_one_starts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&[
            record("Ann", Some(("4.9", "120"))),
            record("Bob", None),
        ])
        .unwrap();

        // read while the sink is still open: the batch must already be on disk
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 3);

        sink.append(&[record("Cyd", Some(("5.0", "3")))]).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 4);
        assert_eq!(sink.rows_written(), 3);
    }

    #[test]
    fn rows_keep_traversal_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&[record("Ann", None), record("Bob", None)]).unwrap();
        sink.append(&[record("Cyd", None)]).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        let names: Vec<&str> = contents
            .lines()
            .skip(1)
            .map(|line| line.split(',').nth(2).unwrap())
            .collect();
        assert_eq!(names, vec!["Ann", "Bob", "Cyd"]);
    }

    #[test]
    fn absent_rating_pair_serializes_as_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&[record("Bob", None)]).unwrap();
        drop(sink);

        let contents = fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(
            row,
            "https://img.example/1.webp,https://listings.example/gig/1,Bob,I will build a portfolio website,,,45"
        );
    }
}
