/// Frame source module
///
/// The seam to the hand-tracking and classification stage. Anything that can
/// yield frame observations in arrival order can drive a session.

use crate::frame::{FrameObservation, FrameRecord};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::trace;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read frames: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Producer of per-frame classifier output
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the stream has ended
    async fn next_frame(&mut self) -> Result<Option<FrameObservation>, SourceError>;
}

/// Frames read from newline-delimited JSON `FrameRecord`s
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a frame log on disk
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref()).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> FrameSource for JsonLinesSource<R> {
    async fn next_frame(&mut self) -> Result<Option<FrameObservation>, SourceError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: FrameRecord = serde_json::from_str(line).map_err(|source| SourceError::Parse {
                line: self.line_number,
                source,
            })?;

            trace!("Read frame record from line {}", self.line_number);
            return Ok(Some(record.into()));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_present_and_absent_frames() {
        let input = b"{\"confidences\": [0.1, 0.9]}\n\n{}\n{\"confidences\": null}\n" as &[u8];
        let mut source = JsonLinesSource::new(input);

        assert_eq!(
            source.next_frame().await.unwrap(),
            Some(FrameObservation::Present(vec![0.1, 0.9]))
        );
        assert_eq!(source.next_frame().await.unwrap(), Some(FrameObservation::Absent));
        assert_eq!(source.next_frame().await.unwrap(), Some(FrameObservation::Absent));
        assert_eq!(source.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_parse_error_reports_line() {
        let input = b"{}\n\n{\"confidences\": [0.1,\n" as &[u8];
        let mut source = JsonLinesSource::new(input);

        assert!(source.next_frame().await.unwrap().is_some());
        match source.next_frame().await {
            Err(SourceError::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let result = JsonLinesSource::open("/nonexistent/frames.jsonl").await;
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
