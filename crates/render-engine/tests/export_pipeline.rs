use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgba, RgbaImage};
use photostrip_common::config::ExportSettings;
use photostrip_model::{FrameStyleCatalog, Photo, RasterPayload};
use photostrip_render_engine::{
    build_scaffold, CompositeExporter, CpuRasterizer, MemorySaver, StripLayout,
};

const PHOTO_COLORS: [[u8; 3]; 4] = [[220, 20, 20], [20, 200, 20], [20, 20, 220], [230, 230, 20]];

fn solid_photo(seq: usize, rgb: [u8; 3]) -> Photo {
    let img = RgbaImage::from_pixel(64, 48, Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode fixture");
    Photo::new(seq, RasterPayload::from_bytes(png).expect("fixture payload"))
}

fn close(actual: [u8; 4], expected: [u8; 3], tolerance: i32) -> bool {
    actual[..3]
        .iter()
        .zip(expected)
        .all(|(&a, e)| (a as i32 - e as i32).abs() <= tolerance)
}

#[tokio::test]
async fn sunset_strip_has_photos_in_capture_order() {
    let photos: Vec<Photo> = PHOTO_COLORS
        .iter()
        .enumerate()
        .map(|(i, rgb)| solid_photo(i + 1, *rgb))
        .collect();
    let catalog = FrameStyleCatalog::builtin();
    let sunset = catalog.find("sunset").expect("built-in style");

    let saver = Arc::new(MemorySaver::new());
    let exporter = CompositeExporter::new(
        &ExportSettings::default(),
        Arc::new(CpuRasterizer::new()),
        saver.clone(),
    )
    .unwrap();

    let artifact = exporter.export(&photos, sunset).await.unwrap();
    assert_eq!(artifact.filename, "photobooth-photos.png");
    assert_eq!((artifact.width, artifact.height), (400, 1294));
    assert_eq!(saver.saved(), vec![artifact.clone()]);
    assert!(exporter.document().is_empty());

    let bitmap = image::load_from_memory_with_format(&artifact.png, ImageFormat::Png)
        .unwrap()
        .to_rgba8();
    assert_eq!(bitmap.dimensions(), (400, 1294));

    let scaffold = build_scaffold(&photos, sunset.export_background(), &StripLayout::default());
    for (node, expected) in scaffold.image_nodes().zip(PHOTO_COLORS) {
        let (cx, cy) = node.rect.center();
        let pixel = bitmap.get_pixel(cx, cy).0;
        assert!(
            close(pixel, expected, 3),
            "tile at y={} is {pixel:?}, expected {expected:?}",
            node.rect.y
        );
    }

    // Top-left corner sits at the start of the to-bottom-right gradient.
    assert!(close(bitmap.get_pixel(1, 1).0, [251, 146, 60], 8));
    // Bottom-right corner sits at its end.
    assert!(close(bitmap.get_pixel(398, 1292).0, [147, 51, 234], 8));
}

#[tokio::test]
async fn solid_style_paints_uniform_background() {
    let photos: Vec<Photo> = (1..=4).map(|i| solid_photo(i, [0, 0, 0])).collect();
    let catalog = FrameStyleCatalog::builtin();
    let pink = catalog.find("Pastel Pink").unwrap();

    let exporter = CompositeExporter::new(
        &ExportSettings::default(),
        Arc::new(CpuRasterizer::new()),
        Arc::new(MemorySaver::new()),
    )
    .unwrap();
    let artifact = exporter.export(&photos, pink).await.unwrap();
    let bitmap = image::load_from_memory(&artifact.png).unwrap().to_rgba8();

    for (x, y) in [(2, 2), (397, 2), (2, 1291), (200, 10)] {
        assert_eq!(bitmap.get_pixel(x, y).0, [251, 207, 232, 255], "at ({x},{y})");
    }
}

#[tokio::test]
async fn pixel_ratio_scales_output() {
    let photos: Vec<Photo> = (1..=4).map(|i| solid_photo(i, [9, 9, 9])).collect();
    let settings = ExportSettings {
        pixel_ratio: 2,
        ..ExportSettings::default()
    };
    let exporter = CompositeExporter::new(
        &settings,
        Arc::new(CpuRasterizer::new()),
        Arc::new(MemorySaver::new()),
    )
    .unwrap();

    let style = FrameStyleCatalog::builtin().default_style().clone();
    let artifact = exporter.export(&photos, &style).await.unwrap();
    assert_eq!((artifact.width, artifact.height), (800, 2588));
}

async fn caption_pixels(rasterizer: CpuRasterizer) -> usize {
    let photos: Vec<Photo> = (1..=4).map(|i| solid_photo(i, [0, 0, 0])).collect();
    let catalog = FrameStyleCatalog::builtin();
    let sunset = catalog.find("Sunset").unwrap();

    let exporter = CompositeExporter::new(
        &ExportSettings::default(),
        Arc::new(rasterizer),
        Arc::new(MemorySaver::new()),
    )
    .unwrap();
    let artifact = exporter.export(&photos, sunset).await.unwrap();
    let bitmap = image::load_from_memory(&artifact.png).unwrap().to_rgba8();

    let scaffold = build_scaffold(&photos, sunset.export_background(), &StripLayout::default());
    let r = scaffold.caption.rect;
    (r.y..r.bottom().min(bitmap.height()))
        .flat_map(|y| (r.x..r.right()).map(move |x| (x, y)))
        .filter(|&(x, y)| close(bitmap.get_pixel(x, y).0, [255, 255, 255], 30))
        .count()
}

#[tokio::test]
async fn caption_is_drawn_inside_its_box() {
    let drawn = caption_pixels(CpuRasterizer::new()).await;
    assert!(drawn > 50, "only {drawn} caption-colored pixels");

    assert_eq!(caption_pixels(CpuRasterizer::without_font()).await, 0);
}
