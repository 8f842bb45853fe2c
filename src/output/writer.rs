use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{write_curve, write_summary, DiversityReport};

/// Kind of output file written for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Per-group summary.
    Summary,
    /// Mean rarefaction curve.
    Rarefaction,
    /// First-trial collector curve.
    Collector,
}

impl OutputKind {
    fn extension(self) -> &'static str {
        match self {
            OutputKind::Summary => "phylodiv.summary",
            OutputKind::Rarefaction => "phylodiv.rarefaction",
            OutputKind::Collector => "phylodiv",
        }
    }
}

/// Writes report files into a directory.
///
/// Each file is written to a temporary file next to its destination and only
/// moved into place once complete. [`OutputWriter::discard_since`] removes
/// the files written after a checkpoint, so a cancelled run leaves nothing
/// behind.
#[derive(Debug)]
pub struct OutputWriter {
    dir: PathBuf,
    stem: String,
    written: Vec<PathBuf>,
}

impl OutputWriter {
    /// Writer placing `<stem>.<tag>.<kind>` files in `dir`.
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
            written: Vec::new(),
        }
    }

    /// Destination of one output file.
    pub fn output_path(&self, tag: &str, kind: OutputKind) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{}", self.stem, tag, kind.extension()))
    }

    /// Files persisted so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Write every output present in `report`, returning the new paths.
    pub fn write_report(&mut self, report: &DiversityReport) -> io::Result<Vec<PathBuf>> {
        let first_new = self.written.len();

        if let Some(rows) = &report.summary {
            self.persist(&report.tag, OutputKind::Summary, |out| write_summary(out, rows))?;
        }
        if let Some(rows) = &report.rarefaction {
            self.persist(&report.tag, OutputKind::Rarefaction, |out| {
                write_curve(out, &report.groups, rows)
            })?;
        }
        if let Some(rows) = &report.collector {
            self.persist(&report.tag, OutputKind::Collector, |out| {
                write_curve(out, &report.groups, rows)
            })?;
        }

        Ok(self.written[first_new..].to_vec())
    }

    /// Remove every file written after the first `checkpoint` files.
    ///
    /// A checkpoint is `written().len()` taken before a run; files of earlier
    /// runs stay in place. Keeps going past failures and reports the first one.
    pub fn discard_since(&mut self, checkpoint: usize) -> io::Result<()> {
        let checkpoint = checkpoint.min(self.written.len());
        let mut first_error = None;
        for path in self.written.drain(checkpoint..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed output"),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "could not remove output");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn persist<F>(&mut self, tag: &str, kind: OutputKind, render: F) -> io::Result<()>
    where
        F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> anyhow::Result<()>,
    {
        let path = self.output_path(tag, kind);
        let mut temp = NamedTempFile::new_in(parent_dir(&path))?;
        {
            let mut out = BufWriter::new(&mut temp);
            render(&mut out).map_err(io::Error::other)?;
            out.flush()?;
        }
        temp.persist(&path)?;
        debug!(path = %path.display(), "wrote output");
        self.written.push(path);
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{CurveRow, SummaryRow};

    fn report() -> DiversityReport {
        DiversityReport {
            tag: "1".into(),
            groups: vec!["A".into()],
            trials: 1,
            summary: Some(vec![SummaryRow {
                group: "A".into(),
                num_sampled: 1,
                diversity: 2.0,
            }]),
            rarefaction: None,
            collector: Some(vec![CurveRow {
                num_sampled: 1,
                values: vec![Some(2.0)],
            }]),
        }
    }

    #[test]
    fn writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = OutputWriter::new(dir.path(), "sample");

        let paths = writer.write_report(&report()).unwrap();
        assert_eq!(
            paths,
            vec![
                dir.path().join("sample.1.phylodiv.summary"),
                dir.path().join("sample.1.phylodiv"),
            ]
        );
        let summary = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(summary, "Groups\tnumSampled\tphyloDiversity\nA\t1\t2.0000\n");
    }

    #[test]
    fn discard_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = OutputWriter::new(dir.path(), "sample");
        let paths = writer.write_report(&report()).unwrap();

        writer.discard_since(0).unwrap();
        assert!(writer.written().is_empty());
        assert!(paths.iter().all(|path| !path.exists()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn discard_keeps_files_before_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = OutputWriter::new(dir.path(), "sample");
        let kept = writer.write_report(&report()).unwrap();

        let checkpoint = writer.written().len();
        let second = DiversityReport {
            tag: "2".into(),
            ..report()
        };
        let dropped = writer.write_report(&second).unwrap();

        writer.discard_since(checkpoint).unwrap();
        assert_eq!(writer.written(), kept.as_slice());
        assert!(kept.iter().all(|path| path.exists()));
        assert!(dropped.iter().all(|path| !path.exists()));
    }
}
