// src/process/mod.rs
use csv::{ByteRecord, ReaderBuilder};
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, warn};

pub mod extract;
pub mod raw_table;
pub mod selection;
pub mod utils;

pub use extract::{extract_rows, ResultRow, ResultSet, Score};
pub use raw_table::RawTable;
pub use selection::load_selected_headers;

/// Fields of one line. Bytes that are not UTF-8 are replaced rather than
/// failing the line, and a single trailing empty field (`a,b,`) is dropped.
fn record_to_vec(record: &ByteRecord) -> Vec<String> {
    let mut fields: Vec<String> = record
        .iter()
        .map(|f| String::from_utf8_lossy(f).into_owned())
        .collect();
    if fields.len() > 1 && fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}

/// Open `csv_path` and read the two-row-header score sheet.
///
/// - Line 1: header names.
/// - Line 2: per-column maximum scores, kept verbatim.
/// - Remaining non-empty lines: data rows.
///
/// A source that cannot be opened yields an empty [`RawTable`] rather than an
/// error: there is simply nothing to process.
#[tracing::instrument(level = "info", skip(csv_path), fields(path = %csv_path.as_ref().display()))]
pub fn load_score_csv<P: AsRef<Path>>(csv_path: P) -> RawTable {
    match File::open(&csv_path) {
        Ok(file) => read_score_csv(file),
        Err(e) => {
            warn!(error = %e, "cannot open score sheet, nothing to process");
            RawTable::default()
        }
    }
}

/// Same as [`load_score_csv`] over any reader. The reader is consumed and
/// dropped before returning.
pub fn read_score_csv<R: Read>(source: R) -> RawTable {
    // no quoting: fields are taken exactly as they sit between commas
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(source);

    let mut records = rdr.byte_records();

    let headers = match records.next() {
        Some(Ok(r)) => record_to_vec(&r),
        Some(Err(e)) => {
            warn!(error = %e, "unreadable header line");
            return RawTable::default();
        }
        None => return RawTable::default(),
    };
    let max_scores = match records.next() {
        Some(Ok(r)) => record_to_vec(&r),
        Some(Err(e)) => {
            warn!(error = %e, "unreadable maximum-score line");
            Vec::new()
        }
        None => Vec::new(),
    };

    let mut table = RawTable::new(headers, max_scores);
    for (idx, result) in records.enumerate() {
        match result {
            Ok(record) => table.rows.push(record_to_vec(&record)),
            Err(e) => {
                // keep what we have so far
                warn!(error = %e, record = idx, "read failure, stopping early");
                break;
            }
        }
    }
    debug!(
        headers = table.headers.len(),
        rows = table.rows.len(),
        "score sheet loaded"
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    pub(crate) fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,scoreload=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    #[test]
    fn test_reads_two_header_rows() {
        init_test_logging();
        let content = "id,math,sci\r\n,100,50\r\nS0000001,80,25\r\n\r\nS0000002,40,60\r\n";
        let table = read_score_csv(Cursor::new(content));

        assert_eq!(table.headers, vec!["id", "math", "sci"]);
        assert_eq!(table.max_scores, vec!["", "100", "50"]);
        assert_eq!(table.position("math"), Some(1));
        assert_eq!(table.position("sci"), Some(2));
        assert_eq!(table.position("art"), None);

        // the blank line is skipped and no cell keeps a trailing '\r'
        assert_eq!(
            table.rows,
            vec![
                vec!["S0000001", "80", "25"],
                vec!["S0000002", "40", "60"],
            ]
        );
    }

    #[test]
    fn test_duplicate_header_last_write_wins() {
        let table = read_score_csv(Cursor::new("id,quiz,quiz\n,10,20\n"));
        assert_eq!(table.position("quiz"), Some(2));
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_quotes_are_not_interpreted() {
        let table = read_score_csv(Cursor::new("id,\"a\",b\n,1,2\nS1,\"1,2\n"));
        assert_eq!(table.headers, vec!["id", "\"a\"", "b"]);
        assert_eq!(table.rows, vec![vec!["S1", "\"1", "2"]]);
    }

    #[test]
    fn test_short_rows_are_kept() {
        let table = read_score_csv(Cursor::new("id,a,b,c\n,1,2,3\nS1,1\nS2,1,2,3\n"));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["S1", "1"]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let table = load_score_csv("/definitely/not/here/scores.csv");
        assert!(table.is_empty());
        assert!(table.max_scores.is_empty());
    }

    #[test]
    fn test_header_only_file() {
        let table = read_score_csv(Cursor::new("id,a\n"));
        assert_eq!(table.headers, vec!["id", "a"]);
        assert!(table.max_scores.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_load_from_disk() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "id,math\n,100\nS0000001,99\n")?;
        let table = load_score_csv(tmp.path());
        assert_eq!(table.rows, vec![vec!["S0000001", "99"]]);
        Ok(())
    }

    #[test]
    fn test_non_utf8_row_does_not_stop_reading() {
        let content: &[u8] = b"id,a\n,10\nS0000001,5\nS00\xe90002,6\nS0000003,7\n";
        let table = read_score_csv(content);
        let ids: Vec<&str> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["S0000001", "S00\u{fffd}0002", "S0000003"]);
        assert_eq!(table.rows[1][1], "6");
    }

    #[test]
    fn test_trailing_comma_drops_last_field() {
        let table = read_score_csv(Cursor::new("id,a,b\n,10,\nS1,5,\n"));
        assert_eq!(table.max_scores, vec!["", "10"]);
        assert_eq!(table.rows, vec![vec!["S1", "5"]]);
    }

    /// Hands out `data` once, then fails every read.
    struct FailingAfter {
        data: Option<Vec<u8>>,
    }

    impl Read for FailingAfter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    buf[..data.len()].copy_from_slice(&data);
                    Ok(data.len())
                }
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "device went away",
                )),
            }
        }
    }

    #[test]
    fn test_read_failure_keeps_rows_so_far() {
        init_test_logging();
        let source = FailingAfter {
            data: Some(b"id,a\n,10\nS1,5\nS2,6\n".to_vec()),
        };
        let table = read_score_csv(source);
        assert_eq!(table.headers, vec!["id", "a"]);
        assert_eq!(table.max_scores, vec!["", "10"]);
        assert_eq!(table.rows, vec![vec!["S1", "5"], vec!["S2", "6"]]);
    }
}
