//! The booth: routes user events to the session and decides what the UI
//! shows.

use std::fmt;

use photostrip_common::error::{PhotostripError, PhotostripResult};
use photostrip_model::{FrameStyleCatalog, PreviewStyle};
use photostrip_render_engine::{CompositeExporter, ExportArtifact};

use crate::camera::CameraSource;
use crate::session::{CaptureSession, SessionMode, CAPACITY};

/// User intents accepted by [`PhotoBooth::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoothEvent {
    Capture,
    Retake,
    Edit,
    Back,
    SelectStyle(String),
    DismissNotice,
}

/// Something the current view lets the user do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoothAction {
    TakePhoto { next: usize, of: usize },
    Retake,
    Edit,
    Back,
    SelectStyle,
    Download,
}

impl fmt::Display for BoothAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TakePhoto { next, of } => write!(f, "Take Photo {next}/{of}"),
            Self::Retake => f.write_str("Retake"),
            Self::Edit => f.write_str("Edit"),
            Self::Back => f.write_str("Back"),
            Self::SelectStyle => f.write_str("Select Style"),
            Self::Download => f.write_str("Download"),
        }
    }
}

/// One position of the strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Filled { sequence: usize },
    Empty { position: usize },
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filled { sequence } => write!(f, "[photo {sequence}]"),
            Self::Empty { position } => write!(f, "Photo {position}"),
        }
    }
}

/// Dismissible message shown after a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// What the UI renders for the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct BoothView {
    pub mode: SessionMode,
    pub slots: Vec<Slot>,
    pub actions: Vec<BoothAction>,
    pub style_name: String,
    pub preview: PreviewStyle,
    pub notice: Option<Notice>,
}

/// Capture/edit state machine around a [`CaptureSession`].
///
/// Rejected events are returned to the caller and leave the booth as it was.
pub struct PhotoBooth {
    session: CaptureSession,
    catalog: FrameStyleCatalog,
    camera: Box<dyn CameraSource>,
    notice: Option<Notice>,
}

impl PhotoBooth {
    /// Booth in `Capturing` with the catalog's default style selected.
    pub fn new(catalog: FrameStyleCatalog, camera: Box<dyn CameraSource>) -> Self {
        let session = CaptureSession::new(catalog.default_style().clone());
        tracing::debug!(camera = camera.name(), styles = catalog.len(), "Booth ready");
        Self {
            session,
            catalog,
            camera,
            notice: None,
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn catalog(&self) -> &FrameStyleCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> SessionMode {
        self.session.mode()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Apply one event.
    pub fn handle(&mut self, event: BoothEvent) -> PhotostripResult<()> {
        tracing::debug!(?event, mode = %self.session.mode(), "Handling event");
        match event {
            BoothEvent::Capture => {
                // Editing implies a full strip, so this also covers it.
                if self.session.is_full() {
                    return Err(PhotostripError::SessionFull { capacity: CAPACITY });
                }
                let frame = self.camera.grab_frame().ok_or_else(|| {
                    tracing::warn!(camera = self.camera.name(), "Camera returned no frame");
                    PhotostripError::CaptureUnavailable
                })?;
                self.session.capture(frame)?;
            }
            BoothEvent::Retake => self.session.retake(),
            BoothEvent::Edit => self.session.begin_editing()?,
            BoothEvent::Back => self.session.back(),
            BoothEvent::SelectStyle(name) => {
                let style = self
                    .catalog
                    .find(&name)
                    .ok_or(PhotostripError::UnknownStyle { name })?;
                self.session.select_style(style.clone());
            }
            BoothEvent::DismissNotice => self.dismiss_notice(),
        }
        Ok(())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Export the strip with the selected style.
    ///
    /// On failure the booth keeps its photos, mode and style and shows a
    /// notice; calling again retries.
    pub async fn download(
        &mut self,
        exporter: &CompositeExporter,
    ) -> PhotostripResult<ExportArtifact> {
        if self.session.mode() != SessionMode::Editing {
            return Err(PhotostripError::NotEditing);
        }
        if !self.session.is_full() {
            return Err(PhotostripError::NotEnoughPhotos {
                have: self.session.len(),
                need: CAPACITY,
            });
        }

        let result = exporter
            .export(self.session.photos(), self.session.selected_style())
            .await;
        match &result {
            Ok(_) => self.notice = None,
            Err(PhotostripError::ExportInProgress) => {}
            Err(e) => {
                self.notice = Some(Notice {
                    message: format!("Failed to download photo strip: {e}"),
                });
            }
        }
        result
    }

    pub fn view(&self) -> BoothView {
        let photos = self.session.photos();
        let slots = (1..=CAPACITY)
            .map(|position| match photos.get(position - 1) {
                Some(photo) => Slot::Filled {
                    sequence: photo.sequence(),
                },
                None => Slot::Empty { position },
            })
            .collect();

        let actions = match self.session.mode() {
            SessionMode::Capturing if self.session.is_full() => {
                vec![BoothAction::Retake, BoothAction::Edit]
            }
            SessionMode::Capturing => vec![BoothAction::TakePhoto {
                next: self.session.len() + 1,
                of: CAPACITY,
            }],
            SessionMode::Editing => vec![
                BoothAction::Back,
                BoothAction::SelectStyle,
                BoothAction::Download,
            ],
        };

        let style = self.session.selected_style();
        BoothView {
            mode: self.session.mode(),
            slots,
            actions,
            style_name: style.name.clone(),
            preview: style.preview.clone(),
            notice: self.notice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photostrip_model::RasterPayload;

    /// Camera that yields a fixed number of frames, then nothing.
    struct CountingCamera {
        left: usize,
    }

    impl CameraSource for CountingCamera {
        fn name(&self) -> &str {
            "counting"
        }

        fn grab_frame(&mut self) -> Option<RasterPayload> {
            if self.left == 0 {
                return None;
            }
            self.left -= 1;
            RasterPayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]).ok()
        }
    }

    fn booth(frames: usize) -> PhotoBooth {
        PhotoBooth::new(
            FrameStyleCatalog::builtin(),
            Box::new(CountingCamera { left: frames }),
        )
    }

    fn fill(booth: &mut PhotoBooth) {
        for _ in 0..CAPACITY {
            booth.handle(BoothEvent::Capture).unwrap();
        }
    }

    #[test]
    fn test_initial_view() {
        let view = booth(4).view();
        assert_eq!(view.mode, SessionMode::Capturing);
        assert_eq!(
            view.slots,
            (1..=4).map(|position| Slot::Empty { position }).collect::<Vec<_>>()
        );
        assert_eq!(view.actions, [BoothAction::TakePhoto { next: 1, of: 4 }]);
        assert_eq!(view.style_name, "None");
        assert_eq!(view.preview.declaration, "bg-white");
        assert!(view.notice.is_none());
    }

    #[test]
    fn test_full_strip_offers_retake_and_edit() {
        let mut b = booth(4);
        fill(&mut b);
        let view = b.view();
        assert_eq!(view.mode, SessionMode::Capturing);
        assert_eq!(view.actions, [BoothAction::Retake, BoothAction::Edit]);
        assert_eq!(view.slots[3], Slot::Filled { sequence: 4 });
    }

    #[test]
    fn test_missing_frame_is_noop() {
        let mut b = booth(1);
        b.handle(BoothEvent::Capture).unwrap();
        let err = b.handle(BoothEvent::Capture).unwrap_err();
        assert!(matches!(err, PhotostripError::CaptureUnavailable));
        assert_eq!(b.session().len(), 1);
    }

    #[test]
    fn test_editing_view_and_style_selection() {
        let mut b = booth(4);
        fill(&mut b);
        b.handle(BoothEvent::Edit).unwrap();
        b.handle(BoothEvent::SelectStyle("purple retro".into()))
            .unwrap();

        let view = b.view();
        assert_eq!(view.mode, SessionMode::Editing);
        assert_eq!(
            view.actions,
            [
                BoothAction::Back,
                BoothAction::SelectStyle,
                BoothAction::Download
            ]
        );
        assert_eq!(view.style_name, "Purple Retro");
        assert!(view.preview.text.is_some());
    }

    #[test]
    fn test_unknown_style_rejected_without_change() {
        let mut b = booth(4);
        let err = b
            .handle(BoothEvent::SelectStyle("Plaid".into()))
            .unwrap_err();
        assert!(matches!(err, PhotostripError::UnknownStyle { .. }));
        assert_eq!(b.session().selected_style().name, "None");
    }

    #[test]
    fn test_capture_in_editing_rejected() {
        let mut b = booth(8);
        fill(&mut b);
        b.handle(BoothEvent::Edit).unwrap();
        assert!(b.handle(BoothEvent::Capture).is_err());
        assert_eq!(b.session().len(), 4);
        assert_eq!(b.mode(), SessionMode::Editing);
    }

    #[test]
    fn test_retake_from_editing() {
        let mut b = booth(4);
        fill(&mut b);
        b.handle(BoothEvent::Edit).unwrap();
        b.handle(BoothEvent::Retake).unwrap();
        assert_eq!(b.mode(), SessionMode::Capturing);
        assert!(b.session().is_empty());
    }
}
