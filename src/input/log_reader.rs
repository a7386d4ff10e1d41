use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{ModelError, Record};

/// Errors that can occur while loading a log file
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: ModelError,
    },
}

/// Loads a whole access-log file into memory
///
/// Parsing is fail-fast: the first malformed line aborts the load. Blank
/// lines (such as the one after the final newline) are skipped.
pub struct LogReader {
    file_path: PathBuf,
}

impl LogReader {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        LogReader {
            file_path: file_path.into(),
        }
    }

    /// Read and parse every record in the file
    pub fn read_records(&self) -> Result<Vec<Record>, ReadError> {
        let file = File::open(&self.file_path)?;
        let records = Self::parse_records(BufReader::new(file))?;
        log::info!("Loaded {} records from {:?}", records.len(), self.file_path);
        Ok(records)
    }

    /// Parse records from any line-oriented reader
    pub fn parse_records<R: Read>(reader: BufReader<R>) -> Result<Vec<Record>, ReadError> {
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let record = Record::from_line(&line).map_err(|source| ReadError::Parse {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }

        Ok(records)
    }

    /// Size of the log file in bytes
    pub fn file_size(&self) -> Result<u64, ReadError> {
        Ok(std::fs::metadata(&self.file_path)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Action;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_log(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_records() {
        let file = write_log(
            "2019-10-20 09:00:00 10.0.0.1 10.0.0.2 80 TCP alice Allow\n\
             2019-10-20 10:00:00 10.0.0.3 10.0.0.4 53 UDP bob Deny\n",
        );

        let reader = LogReader::new(file.path());
        let records = reader.read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].username(), "alice");
        assert_eq!(records[1].action, Action::Deny);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let file = write_log("\n2019-10-20 09:00:00 10.0.0.1 10.0.0.2 80 TCP alice Allow\n\n");
        let records = LogReader::new(file.path()).read_records().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_empty_file() {
        let file = write_log("");
        let reader = LogReader::new(file.path());
        assert!(reader.read_records().unwrap().is_empty());
        assert_eq!(reader.file_size().unwrap(), 0);
    }

    #[test]
    fn test_malformed_line_aborts() {
        let file = write_log(
            "2019-10-20 09:00:00 10.0.0.1 10.0.0.2 80 TCP alice Allow\n\
             garbage\n\
             2019-10-20 10:00:00 10.0.0.3 10.0.0.4 53 UDP bob Deny\n",
        );

        match LogReader::new(file.path()).read_records() {
            Err(ReadError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let reader = LogReader::new("/nonexistent/netlog/output.log");
        assert!(matches!(reader.read_records(), Err(ReadError::Io(_))));
    }
}
