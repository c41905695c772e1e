//! Render sinks
//!
//! A frame is the full set of LED assignments for one animation tick. Sinks
//! push it to whatever drives the strip; the core never talks to hardware.

use serde::Serialize;
use std::future::Future;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::display::Pixel;
use crate::error::MetarMapError;

/// LED assignments for one animation tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    /// Monotonic tick counter
    pub tick: u64,
    /// Strip brightness, 0.0 to 1.0
    pub brightness: f32,
    /// Frame was built from observations of a failed refresh cycle
    pub stale: bool,
    pub pixels: Vec<Pixel>,
}

/// Receives frames from the scheduler. Failures are logged by the caller, not retried.
pub trait RenderSink: Send {
    fn render(&mut self, frame: &Frame) -> impl Future<Output = crate::Result<()>> + Send;
}

/// Logs a summary of every frame through `tracing`
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    async fn render(&mut self, frame: &Frame) -> crate::Result<()> {
        let lit = frame.pixels.iter().filter(|p| !p.color.is_off()).count();
        debug!(
            tick = frame.tick,
            brightness = frame.brightness,
            stale = frame.stale,
            pixels = frame.pixels.len(),
            lit,
            "Frame rendered"
        );
        if frame.tick == 0 {
            info!(pixels = frame.pixels.len(), "First frame rendered");
        }
        Ok(())
    }
}

/// Writes one JSON object per frame, for an external LED driver process.
/// Writes go through tokio, so a slow reader stalls only this sink.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl JsonLinesSink<tokio::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> RenderSink for JsonLinesSink<W> {
    async fn render(&mut self, frame: &Frame) -> crate::Result<()> {
        let mut line = serde_json::to_vec(frame)
            .map_err(|e| MetarMapError::render(format!("Failed to encode frame: {e}")))?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::color;

    #[tokio::test]
    async fn test_json_lines_sink_writes_one_line_per_frame() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let frame = Frame {
            tick: 3,
            brightness: 0.5,
            stale: false,
            pixels: vec![Pixel {
                index: 2,
                color: color::VFR,
            }],
        };
        sink.render(&frame).await.unwrap();
        sink.render(&frame).await.unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["tick"], 3);
        assert_eq!(value["pixels"][0]["index"], 2);
        assert_eq!(value["pixels"][0]["color"], serde_json::json!([0, 255, 0]));
    }

    #[tokio::test]
    async fn test_json_lines_sink_waits_for_slow_reader() {
        use tokio::io::{AsyncBufReadExt, BufReader};

        // pipe far smaller than one frame
        let (writer, reader) = tokio::io::duplex(16);
        let mut sink = JsonLinesSink::new(writer);
        let frame = Frame {
            tick: 7,
            brightness: 1.0,
            stale: true,
            pixels: (0..20)
                .map(|index| Pixel {
                    index,
                    color: color::IFR,
                })
                .collect(),
        };

        let writing = tokio::spawn(async move { sink.render(&frame).await });
        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await.unwrap();
        writing.await.unwrap().unwrap();

        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["tick"], 7);
        assert_eq!(value["stale"], true);
        assert_eq!(value["pixels"].as_array().map(Vec::len), Some(20));
    }
}
