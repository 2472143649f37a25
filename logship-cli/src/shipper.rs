//! Input reading loop.
//!
//! Reads newline-delimited text, groups it into chunks of `chunk_lines`
//! lines and hands each chunk to the publisher. Stops at EOF or when the
//! shutdown future resolves; a shutdown never interrupts a chunk that is
//! already being written. Bytes that are not valid UTF-8 are replaced with
//! U+FFFD so one corrupt line never ends the run.

use std::future::Future;
use std::path::Path;
use std::pin::pin;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use logship_publisher::{DynPublisher, PublishError};

/// Counters for one shipping run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShipStats {
    /// Lines read from the input.
    pub lines: u64,
    /// `write` calls made on the publisher.
    pub chunks: u64,
    /// Lines that contained invalid UTF-8 and were shipped lossily.
    pub invalid_utf8: u64,
    /// Whether the run ended because of a shutdown request.
    pub interrupted: bool,
}

/// Open the input file, or stdin when `path` is `None`.
pub async fn open_input(
    path: Option<&Path>,
) -> std::io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            info!(path = %path.display(), "reading input file");
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            info!("reading stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

/// Feed `reader` into `publisher` until EOF or `shutdown`.
///
/// Does not close the publisher; the caller does that so the flush also
/// runs when reading fails.
pub async fn ship<R, S>(
    mut reader: R,
    publisher: &mut dyn DynPublisher,
    chunk_lines: u64,
    shutdown: S,
) -> Result<ShipStats, PublishError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    let mut stats = ShipStats::default();
    let mut buf = Vec::new();
    let mut shutdown = pin!(shutdown);
    let mut chunk = String::new();
    let mut pending = 0u64;

    loop {
        buf.clear();
        let read = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown requested, stopping input");
                stats.interrupted = true;
                None
            }
            read = reader.read_until(b'\n', &mut buf) => Some(read?),
        };

        let Some(n) = read else {
            break;
        };
        if n == 0 {
            break;
        }

        stats.lines += 1;
        let line = trim_line_ending(&buf);
        match std::str::from_utf8(line) {
            Ok(text) => chunk.push_str(text),
            Err(e) => {
                stats.invalid_utf8 += 1;
                warn!(
                    line = stats.lines,
                    error = %e,
                    "input line is not valid UTF-8, replacing invalid bytes"
                );
                chunk.push_str(&String::from_utf8_lossy(line));
            }
        }
        chunk.push('\n');
        pending += 1;

        if pending >= chunk_lines {
            publisher.write(&chunk).await?;
            stats.chunks += 1;
            chunk.clear();
            pending = 0;
        }
    }

    if !chunk.is_empty() {
        publisher.write(&chunk).await?;
        stats.chunks += 1;
    }

    debug!(
        lines = stats.lines,
        chunks = stats.chunks,
        invalid_utf8 = stats.invalid_utf8,
        "input finished"
    );
    Ok(stats)
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
