//! Waiting for every image node of a scaffold to finish decoding.
//!
//! Each image node decodes on the blocking pool and reports completion
//! through its own task handle. The export only proceeds once every handle
//! has resolved, bounded by a single timeout, so no tile is ever rasterized
//! half-loaded.
//!
//! Blocking decodes cannot be cancelled, so a timed-out wait leaves them
//! running. A [`DecodeTracker`] counts them until they finish.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use photostrip_common::error::{PhotostripError, PhotostripResult};
use photostrip_model::{PayloadFormat, RasterPayload};
use tokio::task::JoinSet;

use crate::compositor::StripScaffold;

/// Turns an encoded payload into pixels.
pub trait FrameDecoder: Send + Sync {
    fn decode(&self, payload: &RasterPayload) -> PhotostripResult<RgbaImage>;
}

/// Decoder backed by the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageDecoder;

impl FrameDecoder for ImageDecoder {
    fn decode(&self, payload: &RasterPayload) -> PhotostripResult<RgbaImage> {
        let format = match payload.format() {
            PayloadFormat::Jpeg => image::ImageFormat::Jpeg,
            PayloadFormat::Png => image::ImageFormat::Png,
            PayloadFormat::Gif => image::ImageFormat::Gif,
            PayloadFormat::Webp => image::ImageFormat::WebP,
            PayloadFormat::Bmp => image::ImageFormat::Bmp,
        };
        let decoded = image::load_from_memory_with_format(payload.bytes(), format)
            .map_err(|e| PhotostripError::decode(format!("{format:?} payload: {e}")))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(PhotostripError::decode("image has zero size"));
        }
        Ok(decoded.to_rgba8())
    }
}

/// Counts decode tasks still running, including ones abandoned by a
/// timed-out wait.
#[derive(Debug, Clone, Default)]
pub struct DecodeTracker {
    active: Arc<AtomicUsize>,
}

impl DecodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode tasks spawned and not yet finished.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    fn enter(&self) -> DecodeTicket {
        self.active.fetch_add(1, Ordering::AcqRel);
        DecodeTicket(Arc::clone(&self.active))
    }
}

/// Held by one decode task; releases its count when the task ends.
struct DecodeTicket(Arc<AtomicUsize>);

impl Drop for DecodeTicket {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A scaffold whose image nodes have all finished decoding.
///
/// Only [`await_decoded`] constructs this, so a rasterizer receiving it can
/// rely on every tile having pixels.
#[derive(Debug)]
pub struct DecodedStrip<'a> {
    scaffold: &'a StripScaffold,
    images: Vec<RgbaImage>,
}

impl<'a> DecodedStrip<'a> {
    pub fn scaffold(&self) -> &'a StripScaffold {
        self.scaffold
    }

    /// Decoded pixels of the image node at `index` (tile order).
    pub fn image(&self, index: usize) -> Option<&RgbaImage> {
        self.images.get(index)
    }

    pub fn images(&self) -> &[RgbaImage] {
        &self.images
    }
}

/// Decode every image node and wait for all of them, up to `timeout`.
///
/// Each spawned decode is counted in `tracker` until it finishes, whether
/// or not this wait is still around to collect it.
pub async fn await_decoded<'a>(
    scaffold: &'a StripScaffold,
    decoder: Arc<dyn FrameDecoder>,
    timeout: Duration,
    tracker: &DecodeTracker,
) -> PhotostripResult<DecodedStrip<'a>> {
    let started = Instant::now();
    let total = scaffold.tiles.len();

    let mut tasks = JoinSet::new();
    for (index, node) in scaffold.image_nodes().enumerate() {
        let payload = node.photo.payload().clone();
        let decoder = Arc::clone(&decoder);
        let ticket = tracker.enter();
        tasks.spawn_blocking(move || {
            let _ticket = ticket;
            (index, decoder.decode(&payload))
        });
    }

    let mut slots: Vec<Option<RgbaImage>> = (0..total).map(|_| None).collect();
    let wait = async {
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| PhotostripError::decode(format!("decode task failed: {e}")))?;
            let image = result?;
            tracing::debug!(
                index,
                width = image.width(),
                height = image.height(),
                "Image node decoded"
            );
            slots[index] = Some(image);
        }
        Ok::<(), PhotostripError>(())
    };
    let outcome = tokio::time::timeout(timeout, wait).await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            let pending = slots.iter().filter(|s| s.is_none()).count();
            tracing::warn!(
                pending,
                still_running = tracker.active(),
                timeout_ms = timeout.as_millis() as u64,
                "Decode wait timed out"
            );
            return Err(PhotostripError::DecodeTimeout {
                pending,
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    }

    let images = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.ok_or_else(|| PhotostripError::decode(format!("image {index} never completed")))
        })
        .collect::<PhotostripResult<Vec<_>>>()?;

    tracing::debug!(
        images = images.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "All image nodes decoded"
    );
    Ok(DecodedStrip { scaffold, images })
}
