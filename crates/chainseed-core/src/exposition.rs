//! Line-oriented exposition output.
//!
//! ```text
//! # HELP record_ingest ...
//! # TYPE record_ingest gauge
//! record_ingest{appName="ingest_application_name"} 1.000000 1729771201
//! use_case_execs_bucket{appName="ingest_application_name",le="10.000000"} 1.000000 1729598401
//! # EOF
//! ```

use crate::metrics::{Metric, MetricSet};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub const HEADER: [&str; 2] = [
    "# HELP record_ingest Running count of ingested records per stage",
    "# TYPE record_ingest gauge",
];
pub const FOOTER: &str = "# EOF";

const BUCKET_SUFFIX: &str = "_bucket";

/// `key="value"` pairs joined by commas, in key order.
pub fn render_labels(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}=\"{v}\""))
        .collect::<Vec<_>>()
        .join(",")
}

fn write_sample<W: Write>(out: &mut W, metric: &Metric, suffix: &str) -> io::Result<()> {
    writeln!(
        out,
        "{}{}{{{}}} {:.6} {}",
        metric.name,
        suffix,
        render_labels(&metric.labels),
        metric.value,
        metric.timestamp
    )
}

/// Writes header, every sample (ingest, correlation, escalation, use cases), then `# EOF`.
///
/// Returns the number of sample lines written. Stops at the first write error.
pub fn write_exposition<W: Write>(mut out: W, metrics: &MetricSet) -> io::Result<usize> {
    for line in HEADER {
        writeln!(out, "{line}")?;
    }

    let mut written = 0usize;
    for metric in metrics
        .ingest
        .iter()
        .chain(&metrics.correlation)
        .chain(&metrics.escalation)
    {
        write_sample(&mut out, metric, "")?;
        written += 1;
    }
    for metric in &metrics.use_cases {
        write_sample(&mut out, metric, BUCKET_SUFFIX)?;
        written += 1;
    }

    writeln!(out, "{FOOTER}")?;
    out.flush()?;
    Ok(written)
}

/// Creates (or truncates) `path` and writes the exposition to it.
///
/// A failure part-way leaves whatever was already written in place.
pub fn write_exposition_file(path: &Path, metrics: &MetricSet) -> io::Result<usize> {
    let file = File::create(path)?;
    write_exposition(BufWriter::new(file), metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{LABEL_APP_NAME, LABEL_LE, RECORD_INGEST, USE_CASE_EXECS};

    fn sample(name: &str, value: f64, ts: i64, labels: &[(&str, &str)]) -> Metric {
        Metric {
            name: name.to_string(),
            value,
            timestamp: ts,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn empty_set_still_has_header_and_footer() {
        let mut buf = Vec::new();
        let written = write_exposition(&mut buf, &MetricSet::default()).unwrap();
        assert_eq!(written, 0);
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            format!("{}\n{}\n# EOF\n", HEADER[0], HEADER[1])
        );
    }

    #[test]
    fn labels_render_sorted_without_trailing_comma() {
        let m = sample(
            USE_CASE_EXECS,
            1.0,
            0,
            &[(LABEL_LE, "5.000000"), (LABEL_APP_NAME, "app")],
        );
        assert_eq!(render_labels(&m.labels), "appName=\"app\",le=\"5.000000\"");
        assert_eq!(render_labels(&BTreeMap::new()), "");
    }

    #[test]
    fn sections_are_written_in_fixed_order_with_bucket_suffix() {
        let metrics = MetricSet {
            ingest: vec![sample(RECORD_INGEST, 1.0, 10, &[(LABEL_APP_NAME, "i")])],
            correlation: vec![sample(RECORD_INGEST, 1.0, 11, &[(LABEL_APP_NAME, "c")])],
            escalation: vec![sample(RECORD_INGEST, 2.0, 12, &[(LABEL_APP_NAME, "e")])],
            use_cases: vec![sample(
                USE_CASE_EXECS,
                3.0,
                13,
                &[(LABEL_LE, "60.000000"), (LABEL_APP_NAME, "i")],
            )],
        };

        let mut buf = Vec::new();
        assert_eq!(write_exposition(&mut buf, &metrics).unwrap(), 4);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            &lines[2..],
            &[
                "record_ingest{appName=\"i\"} 1.000000 10",
                "record_ingest{appName=\"c\"} 1.000000 11",
                "record_ingest{appName=\"e\"} 2.000000 12",
                "use_case_execs_bucket{appName=\"i\",le=\"60.000000\"} 3.000000 13",
                "# EOF",
            ]
        );
        assert!(text.ends_with("# EOF\n"));
    }

    struct FailingWriter {
        budget: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.budget -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_error_surfaces_to_caller() {
        let err = write_exposition(FailingWriter { budget: 1 }, &MetricSet::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn file_is_truncated_and_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.txt");
        std::fs::write(&path, "stale contents that are much longer than the output\n".repeat(10))
            .unwrap();

        write_exposition_file(&path, &MetricSet::default()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(HEADER[0]));
        assert!(text.ends_with("# EOF\n"));
        assert!(!text.contains("stale"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("metrics.txt");
        let err = write_exposition_file(&path, &MetricSet::default()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
