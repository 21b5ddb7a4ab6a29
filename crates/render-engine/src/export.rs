//! Composite export: photos + frame style in, one PNG out.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, RgbaImage};
use photostrip_common::config::{ExportSettings, MAX_CANVAS_PIXELS};
use photostrip_common::error::{PhotostripError, PhotostripResult};
use photostrip_model::{FrameStyle, Photo};

use crate::compositor::{build_scaffold, StripLayout};
use crate::decode::{await_decoded, DecodeTracker, FrameDecoder, ImageDecoder};
use crate::document::OffscreenDocument;
use crate::raster::Rasterizer;
use crate::save::FileSaver;

/// The encoded result of one export. Produced on demand, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Decoding,
    Rasterizing,
    Encoding,
    Saving,
    Complete,
    Failed,
}

/// Progress callback for export stages.
pub type ProgressCallback = Box<dyn Fn(ExportStage) + Send + Sync>;

/// Builds, decodes, rasterizes, encodes and saves photo strips.
///
/// At most one export runs at a time per exporter; a second call while one
/// is pending, or while decodes abandoned by a timed-out export are still
/// running, is rejected with [`PhotostripError::ExportInProgress`].
pub struct CompositeExporter {
    layout: StripLayout,
    filename: String,
    decode_timeout: Duration,
    document: OffscreenDocument,
    decoder: Arc<dyn FrameDecoder>,
    rasterizer: Arc<dyn Rasterizer>,
    saver: Arc<dyn FileSaver>,
    progress: Option<ProgressCallback>,
    in_flight: AtomicBool,
    decodes: DecodeTracker,
}

/// Clears the in-flight flag when an export finishes by any path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> PhotostripResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PhotostripError::ExportInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CompositeExporter {
    pub fn new(
        settings: &ExportSettings,
        rasterizer: Arc<dyn Rasterizer>,
        saver: Arc<dyn FileSaver>,
    ) -> PhotostripResult<Self> {
        settings.validate()?;
        Ok(Self {
            layout: StripLayout::from_settings(settings),
            filename: settings.filename.clone(),
            decode_timeout: Duration::from_millis(settings.decode_timeout_ms),
            document: OffscreenDocument::new(),
            decoder: Arc::new(ImageDecoder),
            rasterizer,
            saver,
            progress: None,
            in_flight: AtomicBool::new(false),
            decodes: DecodeTracker::new(),
        })
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn FrameDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn document(&self) -> &OffscreenDocument {
        &self.document
    }

    pub fn is_exporting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) || self.decodes.active() > 0
    }

    fn report(&self, stage: ExportStage) {
        if let Some(cb) = &self.progress {
            cb(stage);
        }
    }

    /// Export `photos` (top to bottom) framed by `style`.
    ///
    /// On failure nothing is saved and the offscreen scaffold is already
    /// detached when this returns.
    pub async fn export(
        &self,
        photos: &[Photo],
        style: &FrameStyle,
    ) -> PhotostripResult<ExportArtifact> {
        let _in_flight = InFlightGuard::acquire(&self.in_flight)?;
        let lingering = self.decodes.active();
        if lingering > 0 {
            tracing::warn!(lingering, "Decodes from a timed-out export still running");
            return Err(PhotostripError::ExportInProgress);
        }

        tracing::info!(
            photos = photos.len(),
            style = %style.name,
            background = %style.export.css,
            rasterizer = self.rasterizer.name(),
            "Starting export"
        );
        self.report(ExportStage::Preparing);

        match self.run(photos, style).await {
            Ok(artifact) => {
                self.report(ExportStage::Complete);
                tracing::info!(
                    filename = %artifact.filename,
                    width = artifact.width,
                    height = artifact.height,
                    bytes = artifact.png.len(),
                    "Export complete"
                );
                Ok(artifact)
            }
            Err(e) => {
                self.report(ExportStage::Failed);
                tracing::warn!(error = %e, "Export failed");
                Err(e)
            }
        }
    }

    async fn run(&self, photos: &[Photo], style: &FrameStyle) -> PhotostripResult<ExportArtifact> {
        let background = style.export_background();
        let scaffold = self
            .document
            .attach(build_scaffold(photos, background, &self.layout));
        let pixels = scaffold.width as u64 * scaffold.height as u64;
        if pixels > MAX_CANVAS_PIXELS {
            return Err(PhotostripError::render(format!(
                "strip of {}x{} exceeds {MAX_CANVAS_PIXELS} pixels",
                scaffold.width, scaffold.height
            )));
        }

        self.report(ExportStage::Decoding);
        let decoded = await_decoded(
            &scaffold,
            Arc::clone(&self.decoder),
            self.decode_timeout,
            &self.decodes,
        )
        .await?;

        self.report(ExportStage::Rasterizing);
        let bitmap = self.rasterizer.rasterize(&decoded, background).await?;
        if bitmap.dimensions() != (scaffold.width, scaffold.height) {
            return Err(PhotostripError::render(format!(
                "rasterizer produced {}x{}, expected {}x{}",
                bitmap.width(),
                bitmap.height(),
                scaffold.width,
                scaffold.height
            )));
        }

        self.report(ExportStage::Encoding);
        let artifact = ExportArtifact {
            filename: self.filename.clone(),
            width: bitmap.width(),
            height: bitmap.height(),
            png: encode_png(&bitmap)?,
        };

        self.report(ExportStage::Saving);
        self.saver.trigger_download(&artifact)?;
        Ok(artifact)
    }
}

/// Encode a bitmap as PNG.
pub fn encode_png(bitmap: &RgbaImage) -> PhotostripResult<Vec<u8>> {
    let mut png = Vec::new();
    bitmap
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PhotostripError::export(format!("PNG encoding failed: {e}")))?;
    Ok(png)
}
