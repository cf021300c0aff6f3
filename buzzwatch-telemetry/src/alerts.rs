//! ## buzzwatch-telemetry::alerts
//! **Durable alert sink**
//!
//! For every firing, in this order:
//! 1. bump the rule's alert counter,
//! 2. emit a `WARN` line with the new counter and the message text,
//! 3. append one CSV row to the rule's record file.
//!
//! The file is opened and closed around each row and is never truncated. A
//! failed append comes back as a [`SinkError`]; the counter keeps its new value
//! and the next firing is attempted as usual.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use buzzwatch_detection::Firing;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to append alert #{sequence} for rule '{rule}' to {}: {source}", path.display())]
    Append {
        rule: String,
        sequence: u64,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl SinkError {
    /// Sequence number the lost row would have carried.
    pub fn sequence(&self) -> u64 {
        match self {
            SinkError::Append { sequence, .. } => *sequence,
        }
    }
}

/// A row that reached the record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub rule: String,
    pub sequence: u64,
    pub path: PathBuf,
}

/// One line of the alert record.
#[derive(Serialize)]
struct AlertRow<'a> {
    sequence: u64,
    message: &'a str,
    author: &'a str,
    rule: &'a str,
    recorded_at: String,
}

/// Per-rule alert counters plus the append-only record writer.
///
/// Counters start at zero for every new sink; nothing is read back from the
/// record files.
#[derive(Debug, Default)]
pub struct AlertSink {
    counters: HashMap<String, u64>,
}

impl AlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts raised so far for `rule`.
    pub fn counter(&self, rule: &str) -> u64 {
        self.counters.get(rule).copied().unwrap_or(0)
    }

    pub fn record(&mut self, firing: &Firing) -> Result<Ack, SinkError> {
        let sequence = {
            let counter = self.counters.entry(firing.rule.clone()).or_insert(0);
            *counter += 1;
            *counter
        };

        match &firing.position {
            Some(position) => warn!(
                rule = %firing.rule,
                %position,
                "ALERT: {} matched rule '{}' (#{})! Message: {}",
                firing.author, firing.rule, sequence, firing.message
            ),
            None => warn!(
                rule = %firing.rule,
                "ALERT: {} matched rule '{}' (#{})! Message: {}",
                firing.author, firing.rule, sequence, firing.message
            ),
        }

        let path = &firing.action.csv_path;
        let row = AlertRow {
            sequence,
            message: &firing.message,
            author: &firing.author,
            rule: &firing.rule,
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        append_row(path, &row).map_err(|source| SinkError::Append {
            rule: firing.rule.clone(),
            sequence,
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), sequence, "Alert row appended");

        Ok(Ack {
            rule: firing.rule.clone(),
            sequence,
            path: path.clone(),
        })
    }
}

/// Open, append one row, flush, close. A header goes first into an empty file.
fn append_row(path: &Path, row: &AlertRow<'_>) -> Result<(), csv::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let write_header = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(write_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use buzzwatch_config::RuleConfig;
    use buzzwatch_core::{Event, StreamPosition};
    use buzzwatch_detection::PatternDetector;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    const LIE: &str = "Data Engineering is my passion";

    fn detector_writing_to(path: PathBuf) -> PatternDetector {
        PatternDetector::from_config(&[RuleConfig {
            csv_path: path,
            ..RuleConfig::bob_lies()
        }])
        .unwrap()
    }

    fn firing(detector: &PatternDetector) -> Firing {
        detector
            .evaluate(&Event::new("Bob", LIE))
            .pop()
            .expect("rule fires")
    }

    fn data_rows(path: &Path) -> Vec<csv::StringRecord> {
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn sequences_start_at_one_and_rows_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("bob_lies.csv");
        let detector = detector_writing_to(path.clone());
        let mut sink = AlertSink::new();

        assert_eq!(sink.record(&firing(&detector)).unwrap().sequence, 1);
        assert_eq!(sink.record(&firing(&detector)).unwrap().sequence, 2);
        assert_eq!(sink.counter("bob-lies"), 2);

        let headers = csv::Reader::from_path(&path).unwrap().headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["sequence", "message", "author", "rule", "recorded_at"]
        );
        let rows = data_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "1");
        assert_eq!(&rows[0][1], LIE);
        assert_eq!(&rows[1][0], "2");
    }

    #[test]
    fn existing_records_are_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bob_lies.csv");
        let detector = detector_writing_to(path.clone());

        AlertSink::new().record(&firing(&detector)).unwrap();
        // A fresh sink models a restart: numbering starts over, the file grows.
        AlertSink::new().record(&firing(&detector)).unwrap();

        let sequences: Vec<String> = data_rows(&path).iter().map(|r| r[0].to_string()).collect();
        assert_eq!(sequences, ["1", "1"]);
    }

    #[test]
    fn message_with_commas_and_quotes_survives() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("quotes.csv");
        let detector = PatternDetector::from_config(&[RuleConfig {
            name: "quoted".into(),
            author: Some("Eve".into()),
            message: None,
            csv_path: path.clone(),
        }])
        .unwrap();
        let text = "well, \"that\" was\nfun";
        let firing = detector.evaluate(&Event::new("Eve", text)).pop().unwrap();

        AlertSink::new().record(&firing).unwrap();
        assert_eq!(&data_rows(&path)[0][1], text);
    }

    #[test]
    fn counters_are_per_rule() {
        let dir = TempDir::new().unwrap();
        let detector = PatternDetector::from_config(&[
            RuleConfig {
                csv_path: dir.path().join("lies.csv"),
                ..RuleConfig::bob_lies()
            },
            RuleConfig {
                name: "any-bob".into(),
                author: Some("Bob".into()),
                message: None,
                csv_path: dir.path().join("bob.csv"),
            },
        ])
        .unwrap();
        let mut sink = AlertSink::new();

        for firing in detector.evaluate(&Event::new("Bob", "hi")) {
            sink.record(&firing).unwrap();
        }
        for firing in detector.evaluate(&Event::new("Bob", LIE)) {
            sink.record(&firing).unwrap();
        }
        assert_eq!(sink.counter("any-bob"), 2);
        assert_eq!(sink.counter("bob-lies"), 1);
    }

    #[traced_test]
    #[test]
    fn unwritable_target_reports_and_keeps_counting() {
        let blocker = tempfile::NamedTempFile::new().unwrap();
        // Parent "directory" is a regular file, so the append must fail.
        let detector = detector_writing_to(blocker.path().join("bob_lies.csv"));
        let mut sink = AlertSink::new();

        let first = sink.record(&firing(&detector)).unwrap_err();
        assert_eq!(first.sequence(), 1);
        let second = sink.record(&firing(&detector)).unwrap_err();
        assert_eq!(second.sequence(), 2);
        assert_eq!(sink.counter("bob-lies"), 2);

        assert!(logs_contain("ALERT: Bob matched rule 'bob-lies' (#1)"));
        assert!(logs_contain("ALERT: Bob matched rule 'bob-lies' (#2)"));
    }

    #[traced_test]
    #[test]
    fn warning_carries_position() {
        let dir = TempDir::new().unwrap();
        let detector = detector_writing_to(dir.path().join("bob_lies.csv"));
        let firing = firing(&detector).with_position(StreamPosition::new("buzz", 0, 17));

        AlertSink::new().record(&firing).unwrap();
        assert!(logs_contain("buzz[0]@17"));
        assert!(logs_contain(LIE));
    }
}
