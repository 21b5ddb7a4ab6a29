//! Rasterization of a decoded scaffold into a single bitmap.

use std::path::Path;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect as PixelRect;
use photostrip_common::error::{PhotostripError, PhotostripResult};
use photostrip_model::{ExportBackground, Rgba as Color};
use rusttype::{point, Font, Scale};

use crate::compositor::{BoxShadow, CaptionNode, Rect};
use crate::decode::DecodedStrip;

/// Caption font shipped with the crate (DejaVu Sans, see `assets/`).
pub const BUNDLED_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Turns a fully decoded scaffold into pixels.
///
/// The background is passed explicitly rather than read from the scaffold:
/// the export representation of the selected style is the only background
/// a rasterizer may paint.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    fn name(&self) -> &str;

    async fn rasterize(
        &self,
        strip: &DecodedStrip<'_>,
        background: &ExportBackground,
    ) -> PhotostripResult<RgbaImage>;
}

/// Software rasterizer built on `image` and `imageproc`.
pub struct CpuRasterizer {
    font: Option<Font<'static>>,
}

impl CpuRasterizer {
    /// Rasterizer using the bundled caption font.
    pub fn new() -> Self {
        let font = Font::try_from_bytes(BUNDLED_FONT);
        if font.is_none() {
            tracing::warn!("Bundled caption font unreadable; captions will be empty");
        }
        Self { font }
    }

    /// Rasterizer that lays out the caption box but draws no glyphs.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: Font<'static>) -> Self {
        Self { font: Some(font) }
    }

    pub fn from_font_file(path: &Path) -> PhotostripResult<Self> {
        let bytes = std::fs::read(path)?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| {
            PhotostripError::config(format!("{} is not a usable font", path.display()))
        })?;
        Ok(Self::with_font(font))
    }

    /// Use `configured` when it loads, else the bundled font.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            match Self::from_font_file(path) {
                Ok(rasterizer) => {
                    tracing::debug!(font = %path.display(), "Using configured caption font");
                    return rasterizer;
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Caption font unusable"),
            }
        }
        Self::new()
    }

    fn paint(&self, strip: &DecodedStrip<'_>, background: &ExportBackground) -> RgbaImage {
        let scaffold = strip.scaffold();
        let (width, height) = (scaffold.width, scaffold.height);

        let mut canvas = RgbaImage::from_fn(width, height, |x, y| {
            to_pixel(background.color_at(x, y, width, height))
        });

        for (tile, decoded) in scaffold.tiles.iter().zip(strip.images()) {
            draw_shadow(&mut canvas, tile.frame, tile.radius, &tile.shadow);
            fill_rounded_rect(&mut canvas, tile.frame, tile.radius, to_pixel(tile.fill));

            let rect = tile.image.rect;
            let mut photo = cover_crop(decoded, rect.width, rect.height);
            clip_corners(&mut photo, tile.image.radius);
            imageops::overlay(&mut canvas, &photo, rect.x as i64, rect.y as i64);
        }

        if let Some(font) = &self.font {
            draw_caption(&mut canvas, font, &scaffold.caption);
        }
        canvas
    }
}

impl Default for CpuRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rasterizer for CpuRasterizer {
    fn name(&self) -> &str {
        "cpu"
    }

    async fn rasterize(
        &self,
        strip: &DecodedStrip<'_>,
        background: &ExportBackground,
    ) -> PhotostripResult<RgbaImage> {
        let scaffold = strip.scaffold();
        if scaffold.width == 0 || scaffold.height == 0 {
            return Err(PhotostripError::render("scaffold has zero size"));
        }
        if strip.images().len() != scaffold.tiles.len() {
            return Err(PhotostripError::render(format!(
                "{} tiles but {} decoded images",
                scaffold.tiles.len(),
                strip.images().len()
            )));
        }
        Ok(self.paint(strip, background))
    }
}

fn to_pixel(color: Color) -> Rgba<u8> {
    Rgba(color.to_array())
}

fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, w: u32, h: u32, color: Rgba<u8>) {
    if w > 0 && h > 0 {
        draw_filled_rect_mut(canvas, PixelRect::at(x, y).of_size(w, h), color);
    }
}

/// Opaque-write rounded rectangle: two bands plus four corner discs.
fn fill_rounded_rect(canvas: &mut RgbaImage, rect: Rect, radius: u32, color: Rgba<u8>) {
    let (w, h) = (rect.width, rect.height);
    if w == 0 || h == 0 {
        return;
    }
    let r = radius.min(w / 2).min(h / 2);
    let (x, y) = (rect.x as i32, rect.y as i32);
    if r == 0 {
        fill_rect(canvas, x, y, w, h, color);
        return;
    }

    let ri = r as i32;
    fill_rect(canvas, x + ri, y, w - 2 * r, h, color);
    fill_rect(canvas, x, y + ri, w, h - 2 * r, color);

    let right = x + w as i32 - 1 - ri;
    let bottom = y + h as i32 - 1 - ri;
    for center in [(x + ri, y + ri), (right, y + ri), (x + ri, bottom), (right, bottom)] {
        draw_filled_circle_mut(canvas, center, ri, color);
    }
}

/// Paint the shadow on its own layer, blur it, then composite it once so
/// overlapping shapes do not darken each other.
fn draw_shadow(canvas: &mut RgbaImage, frame: Rect, radius: u32, shadow: &BoxShadow) {
    if shadow.color.a == 0 {
        return;
    }
    let margin = shadow.blur * 2;
    let mut layer = RgbaImage::new(frame.width + 2 * margin, frame.height + 2 * margin);
    fill_rounded_rect(
        &mut layer,
        Rect::new(margin, margin, frame.width, frame.height),
        radius,
        to_pixel(shadow.color),
    );
    if shadow.blur > 0 {
        layer = imageproc::filter::gaussian_blur_f32(&layer, shadow.blur as f32 / 2.0);
    }
    imageops::overlay(
        canvas,
        &layer,
        frame.x as i64 - margin as i64,
        frame.y as i64 + shadow.offset_y as i64 - margin as i64,
    );
}

/// Scale `src` to cover `width` x `height`, cropping the overflow evenly.
pub fn cover_crop(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (sw, sh) = src.dimensions();
    let (w64, h64) = (width as u64, height as u64);
    let (crop_w, crop_h) = if sw as u64 * h64 > sh as u64 * w64 {
        (((sh as u64 * w64) / h64).max(1) as u32, sh)
    } else {
        (sw, ((sw as u64 * h64) / w64).max(1) as u32)
    };
    let (x, y) = ((sw - crop_w) / 2, (sh - crop_h) / 2);
    let cropped = imageops::crop_imm(src, x, y, crop_w, crop_h).to_image();
    if cropped.dimensions() == (width, height) {
        return cropped;
    }
    imageops::resize(&cropped, width, height, FilterType::Triangle)
}

/// Make pixels outside the rounded corners transparent.
fn clip_corners(img: &mut RgbaImage, radius: u32) {
    let (w, h) = img.dimensions();
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        return;
    }
    let rf = r as f32;
    for dy in 0..r {
        for dx in 0..r {
            let (fx, fy) = (rf - dx as f32 - 0.5, rf - dy as f32 - 0.5);
            if fx * fx + fy * fy <= rf * rf {
                continue;
            }
            for (x, y) in [(dx, dy), (w - 1 - dx, dy), (dx, h - 1 - dy), (w - 1 - dx, h - 1 - dy)] {
                img.get_pixel_mut(x, y).0[3] = 0;
            }
        }
    }
}

fn draw_caption(canvas: &mut RgbaImage, font: &Font<'static>, caption: &CaptionNode) {
    if caption.text.is_empty() || caption.size == 0 {
        return;
    }
    let scale = Scale::uniform(caption.size as f32);
    let metrics = font.v_metrics(scale);

    let text_width = font
        .layout(&caption.text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0);

    let rect = caption.rect;
    let left = rect.x as f32 + (rect.width as f32 - text_width) / 2.0;
    let glyph_height = metrics.ascent - metrics.descent;
    let baseline = rect.y as f32 + (rect.height as f32 - glyph_height) / 2.0 + metrics.ascent;

    let (sx, sy) = caption.shadow.offset;
    draw_text(
        canvas,
        font,
        scale,
        (left + sx as f32, baseline + sy as f32),
        &caption.text,
        caption.shadow.color,
    );
    draw_text(canvas, font, scale, (left, baseline), &caption.text, caption.color);
}

fn draw_text(
    canvas: &mut RgbaImage,
    font: &Font<'static>,
    scale: Scale,
    (x, baseline): (f32, f32),
    text: &str,
    color: Color,
) {
    let (w, h) = canvas.dimensions();
    for glyph in font.layout(text, scale, point(x, baseline)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let px = bb.min.x + gx as i32;
            let py = bb.min.y + gy as i32;
            if px < 0 || py < 0 || px as u32 >= w || py as u32 >= h {
                return;
            }
            let alpha = (color.a as f32 * coverage).round() as u8;
            if alpha == 0 {
                return;
            }
            canvas
                .get_pixel_mut(px as u32, py as u32)
                .blend(&Rgba([color.r, color.g, color.b, alpha]));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_crop_wide_source_trims_sides() {
        // Left third red, middle blue, right third red: a 4:3 crop of a
        // 2:1 source keeps the center.
        let src = RgbaImage::from_fn(200, 100, |x, _| {
            if (50..150).contains(&x) {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([255, 0, 0, 255])
            }
        });
        let out = cover_crop(&src, 40, 30);
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(out.get_pixel(20, 15).0, [0, 0, 255, 255]);
    }

    #[test]
    fn test_cover_crop_tall_source_keeps_aspect() {
        let src = RgbaImage::from_pixel(90, 160, Rgba([10, 20, 30, 255]));
        let out = cover_crop(&src, 336, 252);
        assert_eq!(out.dimensions(), (336, 252));
        assert_eq!(out.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_rounded_rect_leaves_corners_untouched() {
        let mut canvas = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        fill_rounded_rect(
            &mut canvas,
            Rect::new(0, 0, 40, 40),
            10,
            Rgba([255, 255, 255, 255]),
        );
        assert_eq!(canvas.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(canvas.get_pixel(20, 20).0, [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(20, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_clip_corners_makes_corner_transparent() {
        let mut img = RgbaImage::from_pixel(20, 20, Rgba([5, 5, 5, 255]));
        clip_corners(&mut img, 6);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(19, 19).0[3], 0);
        assert_eq!(img.get_pixel(10, 10).0[3], 255);
    }

    #[test]
    fn test_bundled_font_draws_caption_inside_its_box() {
        let font = Font::try_from_bytes(BUNDLED_FONT).unwrap();
        let scaffold = crate::compositor::build_scaffold(
            &[],
            &ExportBackground::NEUTRAL,
            &crate::compositor::StripLayout::default(),
        );
        let caption = &scaffold.caption;
        let mut canvas = RgbaImage::from_pixel(scaffold.width, scaffold.height, Rgba([0, 0, 0, 255]));
        draw_caption(&mut canvas, &font, caption);

        let r = caption.rect;
        let mut inside = 0;
        for (x, y, px) in canvas.enumerate_pixels() {
            if px.0[0] > 200 {
                assert!(
                    x >= r.x && x < r.right() && y + 4 >= r.y && y < r.bottom() + 4,
                    "glyph pixel at ({x},{y}) outside caption box {r:?}"
                );
                inside += 1;
            }
        }
        assert!(inside > 50, "only {inside} caption pixels drawn");
    }

    #[test]
    fn test_shadow_only_darkens_below_frame() {
        let mut canvas = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let shadow = BoxShadow {
            offset_y: 2,
            blur: 4,
            color: Color::BLACK.with_alpha(0.1),
        };
        draw_shadow(&mut canvas, Rect::new(20, 20, 60, 60), 8, &shadow);
        assert!(canvas.get_pixel(50, 81).0[0] < 255);
        assert_eq!(canvas.get_pixel(2, 2).0, [255, 255, 255, 255]);
    }
}
