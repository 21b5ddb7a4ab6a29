//! Photostrip Model
//!
//! Defines the core data contracts shared by capture and export:
//! - **Photo:** an immutable captured frame and its encoded raster payload
//! - **Color / Background:** CSS-compatible colors and linear gradients the
//!   rasterizer can sample directly
//! - **FrameStyle:** a decorative preset carrying both its live-preview
//!   declaration and its export background
//!
//! Layout values are expressed in CSS pixels; the render engine scales them
//! by the configured pixel ratio.

pub mod background;
pub mod color;
pub mod frame_style;
pub mod photo;

pub use background::*;
pub use color::*;
pub use frame_style::*;
pub use photo::*;

/// Errors raised while parsing model values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid color `{input}`: {reason}")]
    InvalidColor { input: String, reason: String },

    #[error("Invalid background `{input}`: {reason}")]
    InvalidBackground { input: String, reason: String },

    #[error("Invalid raster payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Duplicate frame style name: {name}")]
    DuplicateStyle { name: String },
}
