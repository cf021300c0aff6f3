use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

use buzzwatch_core::{RawRecord, StreamPosition};
use tracing::info;

use super::{Poll, StreamSource};
use crate::{SetupError, TransportError};

/// Replays a JSON-lines file, one record per line.
///
/// Positions use the file name as topic, partition `0` and the zero-based line
/// number as offset. Never waits; the timeout is ignored.
pub struct FileSource {
    path: PathBuf,
    topic: String,
    reader: Option<BufReader<File>>,
    line: i64,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| SetupError::Open {
            path: path.clone(),
            source,
        })?;
        let topic = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "replay".to_string());
        info!(path = %path.display(), "Replaying records from file");
        Ok(Self {
            path,
            topic,
            reader: Some(BufReader::new(file)),
            line: 0,
        })
    }
}

impl StreamSource for FileSource {
    fn poll(&mut self, _timeout: Duration, max_records: usize) -> Result<Poll, TransportError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(Poll::Exhausted);
        };

        let mut records = Vec::new();
        let mut buf = Vec::new();
        while records.len() < max_records {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| TransportError::Read {
                    path: self.path.clone(),
                    source,
                })?;
            if read == 0 {
                break;
            }
            while matches!(buf.last(), Some(b'\n' | b'\r')) {
                buf.pop();
            }
            let position = StreamPosition::new(self.topic.as_str(), 0, self.line);
            self.line += 1;
            records.push(RawRecord::new(buf.clone(), position));
        }

        if records.is_empty() {
            Ok(Poll::Exhausted)
        } else {
            Ok(Poll::Records(records))
        }
    }

    fn close(&mut self) {
        if self.reader.take().is_some() {
            info!(path = %self.path.display(), lines = self.line, "Replay file closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn records(poll: Poll) -> Vec<RawRecord> {
        match poll {
            Poll::Records(records) => records,
            other => panic!("expected records, got {other:?}"),
        }
    }

    #[test]
    fn reads_lines_in_batches() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"author": "Bob", "message": "one"}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        write!(file, "{{}}\r\n").unwrap();

        let mut source = FileSource::open(file.path()).unwrap();
        let first = records(source.poll(Duration::ZERO, 2).unwrap());
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].position.offset, 0);
        assert_eq!(first[1].payload.as_deref(), Some(&b"not json"[..]));

        let second = records(source.poll(Duration::ZERO, 2).unwrap());
        assert_eq!(second[0].payload.as_deref(), Some(&b"{}"[..]));
        assert_eq!(second[0].position.offset, 2);

        assert!(matches!(source.poll(Duration::ZERO, 2).unwrap(), Poll::Exhausted));
    }

    #[test]
    fn closed_source_is_exhausted() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{}}").unwrap();
        let mut source = FileSource::open(file.path()).unwrap();
        source.close();
        assert!(matches!(source.poll(Duration::ZERO, 10).unwrap(), Poll::Exhausted));
    }

    #[test]
    fn missing_file_is_a_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSource::open(dir.path().join("absent.jsonl")).err().unwrap();
        assert!(matches!(err, SetupError::Open { .. }));
    }
}
