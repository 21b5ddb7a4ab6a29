//! Capture four frames, pick a style, and export in one go.

use std::path::PathBuf;

use photostrip_capture_engine::{BoothEvent, PhotoBooth, CAPACITY};
use photostrip_common::config::AppConfig;

pub async fn run(
    config: &AppConfig,
    images: Vec<PathBuf>,
    synthetic: bool,
    style: String,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let catalog = super::load_catalog(config)?;
    let camera = super::open_camera(&images, synthetic)?;
    let exporter = super::build_exporter(config, output)?;

    let mut booth = PhotoBooth::new(catalog, camera);
    for n in 1..=CAPACITY {
        booth.handle(BoothEvent::Capture)?;
        println!("Captured photo {n}/{CAPACITY}");
    }
    booth.handle(BoothEvent::Edit)?;
    booth.handle(BoothEvent::SelectStyle(style))?;

    let view = booth.view();
    println!("Exporting with style: {}", view.style_name);

    match booth.download(&exporter).await {
        Ok(artifact) => {
            println!(
                "Saved {} ({}x{}, {} bytes)",
                artifact.filename,
                artifact.width,
                artifact.height,
                artifact.png.len()
            );
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("Export failed: {e}")),
    }
}
