//! Frame capture and PNG screenshots.

use std::cell::RefCell;
use std::fs;
use std::io::{self, BufWriter};
use std::path::Path;
use std::rc::Rc;

use emu_core::{Frame, FrameSink};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot write screenshot: {0}")]
    Io(#[from] io::Error),
    #[error("cannot encode screenshot: {0}")]
    Encode(#[from] png::EncodingError),
}

/// Frame sink that keeps the most recently presented frame.
///
/// Clones share the same slot, so the caller can keep one handle while
/// the console owns the other.
#[derive(Debug, Clone, Default)]
pub struct FrameCapture {
    inner: Rc<RefCell<Captured>>,
}

#[derive(Debug, Default)]
struct Captured {
    latest: Option<Frame>,
    presented: u64,
}

impl FrameCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn latest(&self) -> Option<Frame> {
        self.inner.borrow().latest.clone()
    }

    /// Frames presented since the capture was created.
    #[must_use]
    pub fn presented(&self) -> u64 {
        self.inner.borrow().presented
    }
}

impl FrameSink for FrameCapture {
    fn present(&mut self, frame: &Frame) {
        let mut inner = self.inner.borrow_mut();
        match inner.latest.as_mut() {
            Some(latest) if latest.width() == frame.width() && latest.height() == frame.height() => {
                latest.pixels_mut().copy_from_slice(frame.pixels());
            }
            _ => inner.latest = Some(frame.clone()),
        }
        inner.presented += 1;
    }
}

/// ARGB32 pixels to packed RGBA bytes, alpha forced opaque.
#[must_use]
pub fn rgba_bytes(frame: &Frame) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(frame.pixels().len() * 4);
    for &pixel in frame.pixels() {
        rgba.push((pixel >> 16) as u8);
        rgba.push((pixel >> 8) as u8);
        rgba.push(pixel as u8);
        rgba.push(0xFF);
    }
    rgba
}

/// Save a frame as an 8-bit RGBA PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<(), CaptureError> {
    let file = fs::File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width(), frame.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&rgba_bytes(frame))?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_keeps_latest_frame_across_clones() {
        let capture = FrameCapture::new();
        let mut sink = capture.clone();
        assert!(capture.latest().is_none());

        let mut frame = Frame::new(2, 1);
        frame.pixels_mut()[1] = 0xFF12_3456;
        sink.present(&frame);
        frame.pixels_mut()[1] = 0xFF65_4321;
        sink.present(&frame);

        assert_eq!(capture.presented(), 2);
        let latest = capture.latest().expect("frame presented");
        assert_eq!(latest.pixel(1, 0), Some(0xFF65_4321));
    }

    #[test]
    fn rgba_drops_argb_alpha() {
        let mut frame = Frame::new(1, 1);
        frame.pixels_mut()[0] = 0x0011_2233;
        assert_eq!(rgba_bytes(&frame), [0x11, 0x22, 0x33, 0xFF]);
    }
}
