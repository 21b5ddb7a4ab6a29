//! Camera collaborators.
//!
//! The booth only ever asks for the current frame when the user presses
//! capture; a camera that has nothing to offer returns `None`.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use photostrip_common::error::{PhotostripError, PhotostripResult};
use photostrip_model::RasterPayload;

/// Source of still frames.
pub trait CameraSource: Send {
    fn name(&self) -> &str;

    /// Encode the current frame, or `None` when no frame is available.
    fn grab_frame(&mut self) -> Option<RasterPayload>;
}

/// Plays back a fixed list of frames, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    frames: Vec<RasterPayload>,
    next: usize,
}

impl StillImageCamera {
    pub fn new(frames: Vec<RasterPayload>) -> Self {
        Self { frames, next: 0 }
    }

    /// Load every file up front so a bad path fails before the session starts.
    pub fn from_files(paths: &[PathBuf]) -> PhotostripResult<Self> {
        let frames = paths
            .iter()
            .map(|p| load_frame(p))
            .collect::<PhotostripResult<Vec<_>>>()?;
        tracing::debug!(frames = frames.len(), "Loaded still frames");
        Ok(Self::new(frames))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

fn load_frame(path: &Path) -> PhotostripResult<RasterPayload> {
    let bytes = std::fs::read(path)?;
    RasterPayload::from_bytes(bytes).map_err(|e| {
        PhotostripError::decode(format!("{}: {e}", path.display()))
    })
}

impl CameraSource for StillImageCamera {
    fn name(&self) -> &str {
        "still-images"
    }

    fn grab_frame(&mut self) -> Option<RasterPayload> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.next % self.frames.len()].clone();
        self.next = (self.next + 1) % self.frames.len();
        Some(frame)
    }
}

/// Generates numbered test-pattern JPEG frames.
///
/// Each frame has a distinct background hue and shows its frame number as a
/// row of white dots, so exported strips can be checked by eye.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    frame: u32,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(64),
            height: height.max(48),
            frame: 0,
        }
    }

    /// Frames produced so far.
    pub fn frames_taken(&self) -> u32 {
        self.frame
    }

    fn render(&self, number: u32) -> RgbImage {
        let (w, h) = (self.width, self.height);
        let mut img = ImageBuffer::from_pixel(w, h, hue_color(number));

        // Center marker and four corner markers.
        let marker = (h / 12).max(4) as i32;
        draw_filled_circle_mut(
            &mut img,
            ((w / 2) as i32, (h / 2) as i32),
            marker * 2,
            Rgb([40, 40, 50]),
        );
        let inset = marker + 6;
        for (x, y) in [
            (inset, inset),
            (w as i32 - inset, inset),
            (inset, h as i32 - inset),
            (w as i32 - inset, h as i32 - inset),
        ] {
            draw_filled_circle_mut(&mut img, (x, y), marker, Rgb([255, 50, 50]));
        }

        // Frame number as dots along the bottom.
        let dot = (marker / 2).max(2);
        let spacing = dot * 3;
        let count = number.min(12) as i32;
        let start = (w as i32 - (count - 1) * spacing) / 2;
        for i in 0..count {
            draw_filled_circle_mut(
                &mut img,
                (start + i * spacing, h as i32 - inset * 2),
                dot,
                Rgb([255, 255, 255]),
            );
        }

        // Top bar, wider for later frames.
        let bar = ((w / 12) * number.min(12)).max(1);
        draw_filled_rect_mut(
            &mut img,
            Rect::at(0, 0).of_size(bar, (h / 40).max(2)),
            Rgb([255, 255, 255]),
        );
        img
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl CameraSource for SyntheticCamera {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn grab_frame(&mut self) -> Option<RasterPayload> {
        self.frame += 1;
        let img = self.render(self.frame);

        let mut jpeg = Vec::new();
        if let Err(e) = img.write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg) {
            tracing::warn!(error = %e, frame = self.frame, "Synthetic frame encoding failed");
            return None;
        }
        match RasterPayload::from_bytes(jpeg) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(error = %e, frame = self.frame, "Synthetic frame rejected");
                None
            }
        }
    }
}

/// Distinct, saturated background per frame number.
fn hue_color(number: u32) -> Rgb<u8> {
    let hue = (number.wrapping_mul(67) % 360) as f32;
    let x = 1.0 - ((hue / 60.0) % 2.0 - 1.0).abs();
    let (r, g, b) = match (hue / 60.0) as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let scale = |c: f32| (60.0 + c * 160.0) as u8;
    Rgb([scale(r), scale(g), scale(b)])
}
