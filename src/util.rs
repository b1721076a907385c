//! In-memory host doubles for tests and headless embedding.

use std::collections::{HashMap, VecDeque};

use crate::consts::FB_LEN;
use crate::host::{BlobStore, Display, Host};

/// A [`BlobStore`] over a `HashMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).cloned()
    }
}

/// A [`Display`] that records draw calls and keeps its framebuffer in a
/// plain vector.
#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    /// Framebuffer bytes, two bits per pixel.
    pub framebuffer: Vec<u8>,
    /// Draw calls in order, rendered as strings.
    pub calls: Vec<String>,
    /// Set by window writes, cleared by `refresh`.
    pub dirty: bool,
    /// Color selected by the last `set_color`.
    pub color: u8,
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self {
            framebuffer: vec![0; FB_LEN],
            calls: Vec::new(),
            dirty: false,
            color: 0,
        }
    }
}

impl Display for RecordingDisplay {
    fn set_color(&mut self, color: u8) {
        self.color = color;
        self.calls.push(format!("set_color({color})"));
    }

    fn draw_pixel(&mut self, x: u16, y: u16) {
        self.calls.push(format!("draw_pixel({x}, {y})"));
    }

    fn draw_line(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) {
        self.calls.push(format!("draw_line({x0}, {y0}, {x1}, {y1})"));
    }

    fn draw_rect(&mut self, x: u16, y: u16, w: u16, h: u16) {
        self.calls.push(format!("draw_rect({x}, {y}, {w}, {h})"));
    }

    fn draw_circle(&mut self, x: u16, y: u16, r: u16) {
        self.calls.push(format!("draw_circle({x}, {y}, {r})"));
    }

    fn clear(&mut self) {
        self.framebuffer.fill(0);
        self.calls.push("clear".into());
    }

    fn refresh(&mut self) {
        self.dirty = false;
        self.calls.push("refresh".into());
    }

    fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    fn framebuffer_mut(&mut self) -> &mut [u8] {
        &mut self.framebuffer
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

/// A fully scripted host: canned input lines, captured output, an
/// in-memory filesystem, and an optional recording display.
#[derive(Debug, Clone, Default)]
pub struct BufferedHost {
    /// Everything written through the output sink.
    pub output: String,
    /// Milliseconds of every SLEEP, in order.
    pub slept: Vec<u16>,
    /// Whether the halt notifier fired.
    pub halt_notified: bool,
    input: VecDeque<String>,
    files: MemoryBlobStore,
    display: Option<RecordingDisplay>,
}

impl BufferedHost {
    /// An empty host with no input, files or display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue input lines (without trailing newlines).
    pub fn with_input<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input.extend(lines.into_iter().map(Into::into));
        self
    }

    /// Add a virtual file.
    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path, bytes);
        self
    }

    /// Attach a recording display.
    pub fn with_display(mut self) -> Self {
        self.display = Some(RecordingDisplay::default());
        self
    }

    /// The recording display, if one was attached.
    pub fn recording_display(&self) -> Option<&RecordingDisplay> {
        self.display.as_ref()
    }
}

impl Host for BufferedHost {
    fn output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn input_line(&mut self) -> Option<String> {
        self.input.pop_front()
    }

    fn halted(&mut self) {
        self.halt_notified = true;
    }

    fn sleep(&mut self, ms: u16) {
        self.slept.push(ms);
    }

    fn blob_store(&self) -> Option<&dyn BlobStore> {
        Some(&self.files)
    }

    fn display(&mut self) -> Option<&mut dyn Display> {
        self.display.as_mut().map(|d| d as &mut dyn Display)
    }
}
