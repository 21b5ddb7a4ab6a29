//! Capture session: the photos of the current round and its view mode.

use photostrip_common::error::{PhotostripError, PhotostripResult};
use photostrip_model::{FrameStyle, Photo, RasterPayload};

/// Photos per strip.
pub const CAPACITY: usize = 4;

/// Which view the booth shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Live camera with the strip filling up.
    #[default]
    Capturing,
    /// Full strip, style picker and download.
    Editing,
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capturing => f.write_str("capturing"),
            Self::Editing => f.write_str("editing"),
        }
    }
}

/// Ordered photos (at most [`CAPACITY`]), mode, and the selected style.
///
/// Mutations are rejected as a whole: a failed call leaves every field as it
/// was.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    photos: Vec<Photo>,
    mode: SessionMode,
    selected: FrameStyle,
}

impl CaptureSession {
    /// Empty session in `Capturing` with `initial_style` selected.
    pub fn new(initial_style: FrameStyle) -> Self {
        Self {
            photos: Vec::with_capacity(CAPACITY),
            mode: SessionMode::Capturing,
            selected: initial_style,
        }
    }

    /// Append a frame as the next photo. Returns the new length.
    pub fn capture(&mut self, payload: RasterPayload) -> PhotostripResult<usize> {
        if self.is_full() {
            tracing::debug!(len = self.photos.len(), "Capture rejected, session full");
            return Err(PhotostripError::SessionFull { capacity: CAPACITY });
        }
        let sequence = self.photos.len() + 1;
        self.photos.push(Photo::new(sequence, payload));
        tracing::info!(sequence, of = CAPACITY, "Photo captured");
        Ok(self.photos.len())
    }

    /// Discard every photo and return to capturing. Never fails.
    pub fn retake(&mut self) {
        let discarded = self.photos.len();
        self.photos.clear();
        self.mode = SessionMode::Capturing;
        tracing::info!(discarded, "Session reset for retake");
    }

    /// Enter editing; only allowed with a full strip.
    pub fn begin_editing(&mut self) -> PhotostripResult<()> {
        if !self.is_full() {
            return Err(PhotostripError::NotEnoughPhotos {
                have: self.photos.len(),
                need: CAPACITY,
            });
        }
        self.mode = SessionMode::Editing;
        tracing::info!("Entered editing");
        Ok(())
    }

    /// Return to capturing, keeping the photos.
    pub fn back(&mut self) {
        if self.mode == SessionMode::Editing {
            tracing::info!(photos = self.photos.len(), "Back to capturing");
        }
        self.mode = SessionMode::Capturing;
    }

    pub fn select_style(&mut self, style: FrameStyle) {
        tracing::debug!(style = %style.name, "Style selected");
        self.selected = style;
    }

    /// Photos in capture order.
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.photos.len() >= CAPACITY
    }

    pub fn remaining(&self) -> usize {
        CAPACITY - self.photos.len()
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn selected_style(&self) -> &FrameStyle {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photostrip_model::FrameStyleCatalog;

    fn frame() -> RasterPayload {
        RasterPayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]).unwrap()
    }

    fn session() -> CaptureSession {
        CaptureSession::new(FrameStyleCatalog::builtin().default_style().clone())
    }

    #[test]
    fn test_new_session_is_empty_capturing() {
        let s = session();
        assert!(s.is_empty());
        assert_eq!(s.mode(), SessionMode::Capturing);
        assert_eq!(s.remaining(), 4);
        assert_eq!(s.selected_style().name, "None");
    }

    #[test]
    fn test_capture_numbers_photos_in_order() {
        let mut s = session();
        for expected in 1..=4 {
            assert_eq!(s.capture(frame()).unwrap(), expected);
        }
        let seqs: Vec<usize> = s.photos().iter().map(Photo::sequence).collect();
        assert_eq!(seqs, [1, 2, 3, 4]);
        assert!(s.is_full());
        // Fourth capture does not switch modes on its own.
        assert_eq!(s.mode(), SessionMode::Capturing);
    }

    #[test]
    fn test_fifth_capture_rejected() {
        let mut s = session();
        for _ in 0..4 {
            s.capture(frame()).unwrap();
        }
        let err = s.capture(frame()).unwrap_err();
        assert!(matches!(err, PhotostripError::SessionFull { capacity: 4 }));
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_edit_requires_full_strip() {
        let mut s = session();
        s.capture(frame()).unwrap();
        let err = s.begin_editing().unwrap_err();
        assert!(matches!(
            err,
            PhotostripError::NotEnoughPhotos { have: 1, need: 4 }
        ));
        assert_eq!(s.mode(), SessionMode::Capturing);
    }

    #[test]
    fn test_back_keeps_photos() {
        let mut s = session();
        for _ in 0..4 {
            s.capture(frame()).unwrap();
        }
        s.begin_editing().unwrap();
        s.back();
        assert_eq!(s.mode(), SessionMode::Capturing);
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_retake_keeps_selected_style() {
        let catalog = FrameStyleCatalog::builtin();
        let mut s = session();
        for _ in 0..4 {
            s.capture(frame()).unwrap();
        }
        s.begin_editing().unwrap();
        s.select_style(catalog.find("Ocean Waves").unwrap().clone());
        s.retake();

        assert!(s.is_empty());
        assert_eq!(s.mode(), SessionMode::Capturing);
        assert_eq!(s.selected_style().name, "Ocean Waves");
    }
}
