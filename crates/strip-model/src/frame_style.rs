//! Frame styles and the catalog users pick them from.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::background::{ExportBackground, GradientDirection};
use crate::color::Rgba;
use crate::ModelError;

/// Declarative style consumed by the live preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewStyle {
    /// Utility-class declaration for the strip container
    /// (fill, gradient, border, shadow).
    pub declaration: String,

    /// Optional text treatment applied to the caption.
    pub text: Option<String>,
}

/// Representation handed to the rasterizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportStyle {
    /// CSS background text, kept for display and for tooling that speaks CSS.
    pub css: String,

    pub background: ExportBackground,
}

impl ExportStyle {
    pub fn new(background: ExportBackground) -> Self {
        Self {
            css: background.to_css(),
            background,
        }
    }

    pub fn parse(css: &str) -> Result<Self, ModelError> {
        Ok(Self {
            css: css.trim().to_string(),
            background: ExportBackground::parse(css)?,
        })
    }
}

/// A named decorative preset.
///
/// Both representations are required: the preview declaration cannot be fed
/// to the rasterizer and the export background is never derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameStyle {
    pub name: String,
    pub preview: PreviewStyle,
    pub export: ExportStyle,
}

impl FrameStyle {
    pub fn new(name: impl Into<String>, preview: PreviewStyle, export: ExportStyle) -> Self {
        Self {
            name: name.into(),
            preview,
            export,
        }
    }

    /// Build a style from a preview declaration and export CSS text.
    pub fn from_css(
        name: impl Into<String>,
        preview: impl Into<String>,
        export_css: &str,
    ) -> Result<Self, ModelError> {
        Ok(Self::new(
            name,
            PreviewStyle {
                declaration: preview.into(),
                text: None,
            },
            ExportStyle::parse(export_css)?,
        ))
    }

    pub fn export_background(&self) -> &ExportBackground {
        &self.export.background
    }
}

/// Ordered, read-only list of frame styles. Display order is catalog order
/// and index 0 is the default selection.
#[derive(Debug, Clone)]
pub struct FrameStyleCatalog {
    styles: Arc<[FrameStyle]>,
}

impl FrameStyleCatalog {
    /// The built-in catalog, constructed once per process.
    pub fn builtin() -> Self {
        static BUILTIN: OnceLock<Arc<[FrameStyle]>> = OnceLock::new();
        Self {
            styles: BUILTIN.get_or_init(|| builtin_styles().into()).clone(),
        }
    }

    /// Built-in catalog followed by `extra` styles, validated for unique names.
    pub fn with_custom(extra: Vec<FrameStyle>) -> Result<Self, ModelError> {
        let mut styles: Vec<FrameStyle> = Self::builtin().styles.to_vec();
        for style in extra {
            if styles.iter().any(|s| s.name.eq_ignore_ascii_case(&style.name)) {
                return Err(ModelError::DuplicateStyle { name: style.name });
            }
            styles.push(style);
        }
        Ok(Self {
            styles: styles.into(),
        })
    }

    pub fn list(&self) -> &[FrameStyle] {
        &self.styles
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameStyle> {
        self.styles.get(index)
    }

    /// The "None" entry.
    pub fn default_style(&self) -> &FrameStyle {
        &self.styles[0]
    }

    /// Case-insensitive lookup by name.
    pub fn find(&self, name: &str) -> Option<&FrameStyle> {
        let name = name.trim();
        self.styles
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.styles
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }
}

impl Default for FrameStyleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn solid(name: &str, declaration: &str, color: Rgba) -> FrameStyle {
    FrameStyle::new(
        name,
        PreviewStyle {
            declaration: declaration.to_string(),
            text: None,
        },
        ExportStyle::new(ExportBackground::solid(color)),
    )
}

fn gradient(
    name: &str,
    declaration: &str,
    direction: GradientDirection,
    colors: &[Rgba],
) -> FrameStyle {
    FrameStyle::new(
        name,
        PreviewStyle {
            declaration: declaration.to_string(),
            text: None,
        },
        ExportStyle::new(ExportBackground::linear(direction, colors)),
    )
}

fn builtin_styles() -> Vec<FrameStyle> {
    let purple_500 = Rgba::rgb(168, 85, 247);
    let pink_500 = Rgba::rgb(236, 72, 153);
    let blue_500 = Rgba::rgb(59, 130, 246);

    let mut purple_retro = solid(
        "Purple Retro",
        "bg-purple-500 border-4 border-pink-300 shadow-[4px_4px_0_#000]",
        purple_500,
    );
    purple_retro.preview.text = Some("text-yellow-200 [text-shadow:2px_2px_0_#4c1d95]".to_string());

    vec![
        FrameStyle::new(
            "None",
            PreviewStyle {
                declaration: "bg-white".to_string(),
                text: None,
            },
            ExportStyle::new(ExportBackground::NEUTRAL),
        ),
        solid("Pastel Pink", "bg-pink-200", Rgba::rgb(251, 207, 232)),
        solid("Pastel Blue", "bg-blue-200", Rgba::rgb(191, 219, 254)),
        solid("Pastel Green", "bg-green-200", Rgba::rgb(187, 247, 208)),
        gradient(
            "Purple Gradient",
            "bg-gradient-to-b from-purple-500 to-pink-500",
            GradientDirection::ToBottom,
            &[purple_500, pink_500],
        ),
        gradient(
            "Ocean Waves",
            "bg-gradient-to-r from-blue-500 via-teal-400 to-blue-500",
            GradientDirection::ToRight,
            &[blue_500, Rgba::rgb(45, 212, 191), blue_500],
        ),
        gradient(
            "Sunset",
            "bg-gradient-to-br from-orange-400 via-pink-500 to-purple-600",
            GradientDirection::ToBottomRight,
            &[Rgba::rgb(251, 146, 60), pink_500, Rgba::rgb(147, 51, 234)],
        ),
        solid(
            "Yellow Retro",
            "bg-yellow-300 border-4 border-black",
            Rgba::rgb(253, 224, 71),
        ),
        purple_retro,
    ]
}
