//! PNG frame export.
//!
//! Encoding a large frame takes longer than stepping it, so frames are
//! handed to a background writer thread over a bounded channel. A full
//! channel blocks the simulation loop instead of dropping frames.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use afterglow_common::{AfterglowError, AfterglowResult};
use afterglow_kernel::ColorBuffer;
use crossbeam_channel::{bounded, Sender};
use tracing::{debug, warn};

/// Frames that may wait for the writer before the sender blocks.
const EXPORT_QUEUE_DEPTH: usize = 8;

/// Writes a color buffer as an RGBA PNG.
pub fn save_png(buffer: &ColorBuffer, path: &Path) -> AfterglowResult<()> {
    let image = image::RgbaImage::from_raw(
        buffer.width() as u32,
        buffer.height() as u32,
        buffer.as_bytes().to_vec(),
    )
    .ok_or_else(|| AfterglowError::Export("color buffer size mismatch".to_string()))?;

    image
        .save(path)
        .map_err(|e| AfterglowError::Export(format!("{}: {e}", path.display())))
}

/// File name for a generation's frame.
#[must_use]
pub fn frame_path(dir: &Path, generation: u64) -> PathBuf {
    dir.join(format!("frame_{generation:06}.png"))
}

/// Background PNG writer.
#[derive(Debug)]
pub struct FrameExporter {
    sender: Option<Sender<(u64, ColorBuffer)>>,
    writer: Option<JoinHandle<ExportSummary>>,
}

/// Outcome of an export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Frames written successfully
    pub written: u64,
    /// Frames that failed to write
    pub failed: u64,
}

impl FrameExporter {
    /// Creates `dir` if needed and starts the writer thread.
    pub fn start(dir: &Path) -> AfterglowResult<Self> {
        fs::create_dir_all(dir)?;

        let (sender, receiver) = bounded::<(u64, ColorBuffer)>(EXPORT_QUEUE_DEPTH);
        let dir = dir.to_path_buf();
        let writer = thread::Builder::new()
            .name("afterglow-export".to_string())
            .spawn(move || {
                let mut summary = ExportSummary::default();
                for (generation, buffer) in receiver {
                    let path = frame_path(&dir, generation);
                    match save_png(&buffer, &path) {
                        Ok(()) => {
                            debug!("Wrote {}", path.display());
                            summary.written += 1;
                        },
                        Err(e) => {
                            warn!("Failed to export frame {generation}: {e}");
                            summary.failed += 1;
                        },
                    }
                }
                summary
            })?;

        Ok(Self {
            sender: Some(sender),
            writer: Some(writer),
        })
    }

    /// Queues a frame for writing. Blocks while the queue is full.
    pub fn submit(&self, generation: u64, buffer: ColorBuffer) {
        if let Some(sender) = &self.sender {
            if sender.send((generation, buffer)).is_err() {
                warn!("Export writer stopped; dropping frame {generation}");
            }
        }
    }

    /// Waits for queued frames to be written.
    pub fn finish(mut self) -> ExportSummary {
        self.close()
    }

    fn close(&mut self) -> ExportSummary {
        // Dropping the sender ends the writer's receive loop.
        self.sender = None;
        match self.writer.take().map(JoinHandle::join) {
            Some(Ok(summary)) => summary,
            Some(Err(_)) => {
                warn!("Export writer panicked");
                ExportSummary::default()
            },
            None => ExportSummary::default(),
        }
    }
}

impl Drop for FrameExporter {
    fn drop(&mut self) {
        self.close();
    }
}
