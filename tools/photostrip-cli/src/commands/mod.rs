pub mod booth;
pub mod shoot;
pub mod styles;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use photostrip_capture_engine::{CameraSource, StillImageCamera, SyntheticCamera};
use photostrip_common::config::AppConfig;
use photostrip_model::{FrameStyle, FrameStyleCatalog};
use photostrip_render_engine::{CompositeExporter, CpuRasterizer, DirectorySaver, ExportStage};

/// Built-in catalog plus the styles declared in config.
pub fn load_catalog(config: &AppConfig) -> anyhow::Result<FrameStyleCatalog> {
    let custom = config
        .custom_styles
        .iter()
        .map(|c| {
            FrameStyle::from_css(&c.name, &c.preview, &c.export)
                .with_context(|| format!("Invalid custom style '{}'", c.name))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    if custom.is_empty() {
        return Ok(FrameStyleCatalog::builtin());
    }
    FrameStyleCatalog::with_custom(custom).context("Invalid custom styles in config")
}

pub fn open_camera(images: &[PathBuf], synthetic: bool) -> anyhow::Result<Box<dyn CameraSource>> {
    if synthetic || images.is_empty() {
        if !synthetic {
            println!("No images given; using synthetic test-pattern frames.");
        }
        return Ok(Box::new(SyntheticCamera::default()));
    }
    let camera = StillImageCamera::from_files(images).context("Failed to load camera frames")?;
    println!("Loaded {} camera frame(s)", camera.frame_count());
    Ok(Box::new(camera))
}

/// Exporter writing to `output` (or the configured directory) with a
/// progress line on stdout.
pub fn build_exporter(
    config: &AppConfig,
    output: Option<PathBuf>,
) -> anyhow::Result<CompositeExporter> {
    let dir = output.unwrap_or_else(|| config.export.output_dir.clone());
    let rasterizer = CpuRasterizer::discover(config.export.caption_font.as_deref());
    let exporter = CompositeExporter::new(
        &config.export,
        Arc::new(rasterizer),
        Arc::new(DirectorySaver::new(dir)),
    )?
    .with_progress(Box::new(|stage| {
        if stage != ExportStage::Complete && stage != ExportStage::Failed {
            println!("  {stage:?}...");
        }
    }));
    Ok(exporter)
}
