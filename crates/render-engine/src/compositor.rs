//! Strip compositor: lays out the offscreen visual tree for an export.
//!
//! The layout is computed at a fixed width so the exported bitmap does not
//! depend on any viewport. All values are device pixels, i.e. the configured
//! CSS values multiplied by the pixel ratio.

use photostrip_common::config::ExportSettings;
use photostrip_model::{ExportBackground, Photo, Rgba, PHOTO_ASPECT};

/// Axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    pub fn center(&self) -> (u32, u32) {
        (
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }
}

/// Drop shadow under a tile (`box-shadow: 0 <offset_y> <blur> <color>`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxShadow {
    pub offset_y: u32,
    pub blur: u32,
    pub color: Rgba,
}

/// Shadow behind caption glyphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextShadow {
    pub offset: (u32, u32),
    pub color: Rgba,
}

/// Resolved layout parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StripLayout {
    pub width: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    pub gap: u32,
    pub corner_radius: u32,
    pub tile_padding: u32,
    pub tile_radius: u32,
    pub tile_fill: Rgba,
    pub tile_shadow: BoxShadow,
    pub image_radius: u32,
    pub caption_text: String,
    pub caption_size: u32,
    pub caption_margin_top: u32,
    pub caption_line_height: u32,
    pub caption_color: Rgba,
    pub caption_shadow: TextShadow,
}

impl StripLayout {
    /// Scale CSS settings by the pixel ratio.
    pub fn from_settings(settings: &ExportSettings) -> Self {
        let k = settings.pixel_ratio.max(1);
        let px = |v: u32| v.saturating_mul(k);
        Self {
            width: px(settings.width),
            padding_x: px(settings.padding_x),
            padding_y: px(settings.padding_y),
            gap: px(settings.gap),
            corner_radius: px(settings.corner_radius),
            tile_padding: px(settings.tile_padding),
            tile_radius: px(settings.tile_radius),
            tile_fill: Rgba::WHITE,
            tile_shadow: BoxShadow {
                offset_y: px(2),
                blur: px(4),
                color: Rgba::BLACK.with_alpha(0.1),
            },
            image_radius: px(settings.image_radius),
            caption_text: settings.caption_text.clone(),
            caption_size: px(settings.caption_size),
            caption_margin_top: px(settings.caption_margin_top),
            caption_line_height: px(settings.caption_line_height),
            caption_color: Rgba::WHITE,
            caption_shadow: TextShadow {
                offset: (k, k),
                color: Rgba::BLACK.with_alpha(0.3),
            },
        }
    }

    /// Size of each photo, locked to the photo aspect ratio.
    pub fn image_size(&self) -> (u32, u32) {
        let width = self
            .width
            .saturating_sub(self.padding_x.saturating_add(self.tile_padding).saturating_mul(2))
            .max(1);
        let (aw, ah) = PHOTO_ASPECT;
        let height = ((width as u64 * ah as u64 + aw as u64 / 2) / aw as u64).clamp(1, u32::MAX as u64) as u32;
        (width, height)
    }

    fn tile_height(&self) -> u32 {
        self.image_size()
            .1
            .saturating_add(self.tile_padding.saturating_mul(2))
    }

    /// Total strip height for `photo_count` photos. Saturates at `u32::MAX`.
    pub fn strip_height(&self, photo_count: usize) -> u32 {
        let count = u32::try_from(photo_count).unwrap_or(u32::MAX);
        self.padding_y
            .saturating_add(count.saturating_mul(self.tile_height().saturating_add(self.gap)))
            .saturating_add(self.caption_margin_top)
            .saturating_add(self.caption_line_height)
            .saturating_add(self.padding_y)
    }
}

impl Default for StripLayout {
    fn default() -> Self {
        Self::from_settings(&ExportSettings::default())
    }
}

/// An image bound to one photo's payload, cropped to fill `rect`.
#[derive(Debug, Clone)]
pub struct ImageNode {
    pub rect: Rect,
    pub radius: u32,
    pub photo: Photo,
}

/// White frame around one photo.
#[derive(Debug, Clone)]
pub struct TileNode {
    pub frame: Rect,
    pub radius: u32,
    pub fill: Rgba,
    pub shadow: BoxShadow,
    pub image: ImageNode,
}

/// Fixed attribution line below the last tile.
#[derive(Debug, Clone)]
pub struct CaptionNode {
    pub rect: Rect,
    pub text: String,
    pub size: u32,
    pub color: Rgba,
    pub shadow: TextShadow,
}

/// The offscreen visual tree for one export.
#[derive(Debug, Clone)]
pub struct StripScaffold {
    pub width: u32,
    pub height: u32,
    pub corner_radius: u32,
    pub background: ExportBackground,
    pub tiles: Vec<TileNode>,
    pub caption: CaptionNode,
}

impl StripScaffold {
    pub fn image_nodes(&self) -> impl Iterator<Item = &ImageNode> {
        self.tiles.iter().map(|t| &t.image)
    }
}

/// Build the visual tree: one tile per photo in session order (top to
/// bottom), then the caption.
pub fn build_scaffold(
    photos: &[Photo],
    background: &ExportBackground,
    layout: &StripLayout,
) -> StripScaffold {
    let (image_w, image_h) = layout.image_size();
    let tile_w = image_w.saturating_add(layout.tile_padding.saturating_mul(2));
    let tile_h = layout.tile_height();

    let mut y = layout.padding_y;
    let mut tiles = Vec::with_capacity(photos.len());
    for photo in photos {
        let frame = Rect::new(layout.padding_x, y, tile_w, tile_h);
        let image = ImageNode {
            rect: Rect::new(
                frame.x.saturating_add(layout.tile_padding),
                frame.y.saturating_add(layout.tile_padding),
                image_w,
                image_h,
            ),
            radius: layout.image_radius,
            photo: photo.clone(),
        };
        tiles.push(TileNode {
            frame,
            radius: layout.tile_radius,
            fill: layout.tile_fill,
            shadow: layout.tile_shadow,
            image,
        });
        y = y.saturating_add(tile_h).saturating_add(layout.gap);
    }

    let caption = CaptionNode {
        rect: Rect::new(
            layout.padding_x,
            y.saturating_add(layout.caption_margin_top),
            tile_w,
            layout.caption_line_height,
        ),
        text: layout.caption_text.clone(),
        size: layout.caption_size,
        color: layout.caption_color,
        shadow: layout.caption_shadow,
    };

    let scaffold = StripScaffold {
        width: layout.width,
        height: layout.strip_height(photos.len()),
        corner_radius: layout.corner_radius,
        background: background.clone(),
        tiles,
        caption,
    };
    tracing::debug!(
        width = scaffold.width,
        height = scaffold.height,
        tiles = scaffold.tiles.len(),
        "Built strip scaffold"
    );
    scaffold
}

#[cfg(test)]
mod tests {
    use super::*;
    use photostrip_model::RasterPayload;

    fn photo(seq: usize) -> Photo {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        Photo::new(seq, RasterPayload::from_bytes(png.to_vec()).unwrap())
    }

    #[test]
    fn test_default_layout_matches_preview_proportions() {
        let layout = StripLayout::default();
        assert_eq!(layout.image_size(), (336, 252));
        assert_eq!(layout.strip_height(4), 1294);
    }

    #[test]
    fn test_pixel_ratio_scales_everything() {
        let settings = ExportSettings {
            pixel_ratio: 2,
            ..ExportSettings::default()
        };
        let layout = StripLayout::from_settings(&settings);
        assert_eq!(layout.width, 800);
        assert_eq!(layout.image_size(), (672, 504));
        assert_eq!(layout.strip_height(4), 2 * 1294);
    }

    #[test]
    fn test_huge_settings_saturate_instead_of_overflowing() {
        let settings = ExportSettings {
            width: u32::MAX / 2,
            padding_y: u32::MAX / 3,
            pixel_ratio: 20_000_000,
            ..ExportSettings::default()
        };
        let layout = StripLayout::from_settings(&settings);
        assert_eq!(layout.width, u32::MAX);
        assert_eq!(layout.strip_height(4), u32::MAX);

        let scaffold = build_scaffold(&[photo(1)], &ExportBackground::NEUTRAL, &layout);
        assert_eq!(scaffold.height, u32::MAX);
    }

    #[test]
    fn test_tiles_stack_in_photo_order() {
        let photos: Vec<Photo> = (1..=4).map(photo).collect();
        let scaffold = build_scaffold(&photos, &ExportBackground::NEUTRAL, &StripLayout::default());

        assert_eq!(scaffold.tiles.len(), 4);
        for (i, tile) in scaffold.tiles.iter().enumerate() {
            assert_eq!(tile.image.photo.sequence(), i + 1);
            assert_eq!(tile.frame.x, 20);
            assert_eq!(tile.image.rect.width * 3, tile.image.rect.height * 4);
        }
        for pair in scaffold.tiles.windows(2) {
            assert_eq!(pair[1].frame.y, pair[0].frame.bottom() + 20);
        }
    }

    #[test]
    fn test_caption_is_last_and_inside_padding() {
        let photos: Vec<Photo> = (1..=4).map(photo).collect();
        let scaffold = build_scaffold(&photos, &ExportBackground::NEUTRAL, &StripLayout::default());

        let last = scaffold.tiles.last().unwrap();
        assert!(scaffold.caption.rect.y > last.frame.bottom());
        assert_eq!(scaffold.caption.rect.bottom() + 40, scaffold.height);
        assert_eq!(scaffold.caption.text, "made by tiosatrio100");
    }

    #[test]
    fn test_empty_strip_still_has_caption() {
        let scaffold = build_scaffold(&[], &ExportBackground::NEUTRAL, &StripLayout::default());
        assert!(scaffold.tiles.is_empty());
        assert_eq!(scaffold.height, 40 + 10 + 20 + 40);
    }
}
