//! Append-only output file

use std::io;
use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::error::Error;

/// Append-only byte sink owned by the capture loop.
///
/// Every append is flushed before it returns, so an aborted run leaves only
/// whole segments behind.
pub struct OutputSink<W = BufWriter<File>> {
    writer: W,
}

impl OutputSink {
    /// Fail if `path` already exists. Existing output is never overwritten.
    pub async fn ensure_absent(path: &Path) -> Result<(), Error> {
        if tokio::fs::try_exists(path).await? {
            return Err(Error::OutputExists(path.to_path_buf()));
        }
        Ok(())
    }

    /// Create `path`, refusing to open a file that appeared in the meantime.
    pub async fn create(path: &Path) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => Error::OutputExists(path.to_path_buf()),
                _ => Error::Io(e),
            })?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: AsyncWrite + Unpin + Send> OutputSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self { writer }
    }

    pub async fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await?;
        self.writer.flush().await
    }

    /// Flush and shut down, handing back the writer.
    pub async fn close(mut self) -> io::Result<W> {
        self.writer.shutdown().await?;
        Ok(self.writer)
    }
}
