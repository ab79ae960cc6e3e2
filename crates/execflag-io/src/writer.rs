//! CSV frame writer for exported pipeline stages.

use std::fs;
use std::path::{Path, PathBuf};

use execflag_frame::Frame;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Writes frames as comma-separated files into one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Each frame is written to `{name}.csv`, header first.
pub struct FrameWriter {
    output_dir: PathBuf,
}

impl FrameWriter {
    /// Create a new writer targeting the given directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display()))]
    pub fn new(output_dir: &Path) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    /// Write `frame` to `{name}.csv` and return the written path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::InvalidOutputName`] | `name` is empty or contains characters outside `[a-zA-Z0-9_-]` |
    /// | [`IoError::WriteFile`] | The file cannot be created or written |
    #[instrument(skip(self, frame), fields(n_rows = frame.n_rows()))]
    pub fn write(&self, name: &str, frame: &Frame) -> Result<PathBuf, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidOutputName {
                name: name.to_string(),
            });
        }
        let path = self.output_dir.join(format!("{name}.csv"));
        let write_err = |e: csv::Error| IoError::WriteFile {
            path: path.clone(),
            source: e,
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(write_err)?;
        wtr.write_record(frame.column_names()).map_err(write_err)?;
        for row in frame.rows() {
            wtr.write_record(row.iter().map(|v| v.to_string()))
                .map_err(write_err)?;
        }
        wtr.flush().map_err(|e| write_err(e.into()))?;

        info!(path = %path.display(), "frame written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FrameReader;
    use execflag_frame::Formula;
    use tempfile::TempDir;

    fn frame() -> Frame {
        Frame::new(
            vec!["WAP".into(), "Minute".into(), "EXECUTE".into()],
            vec![vec![0.6512, 0.0, 1.0], vec![0.6519, 20.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn written_frame_reads_back_identically() {
        let dir = TempDir::new().unwrap();
        let writer = FrameWriter::new(dir.path()).unwrap();
        let path = writer.write("train_part", &frame()).unwrap();
        assert_eq!(path, dir.path().join("train_part.csv"));

        let formula = Formula::new("EXECUTE", ["WAP", "Minute"]).unwrap();
        let back = FrameReader::new(&path).read(&formula).unwrap();
        assert_eq!(back, frame());
    }

    #[test]
    fn creates_nested_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        FrameWriter::new(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = TempDir::new().unwrap();
        let writer = FrameWriter::new(dir.path()).unwrap();
        for bad in ["", "../escape", "a b", "x.csv"] {
            assert!(
                matches!(writer.write(bad, &frame()), Err(IoError::InvalidOutputName { .. })),
                "{bad}"
            );
        }
    }
}
