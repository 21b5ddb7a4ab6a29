//! Photostrip Capture Engine
//!
//! Takes frames from a camera into a four-photo capture session and drives
//! the booth between capturing and editing.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  PhotoBooth                    │
//! │  ┌──────────────┐  capture   ┌──────────────┐  │
//! │  │ CameraSource │ ─────────▶ │CaptureSession│  │
//! │  └──────────────┘            │  photos[0..4]│  │
//! │                              │  mode, style │  │
//! │  ┌──────────────┐  select    └──────┬───────┘  │
//! │  │ StyleCatalog │ ─────────────────▶│          │
//! │  └──────────────┘                   │ download │
//! │                                     ▼          │
//! │                        CompositeExporter (PNG) │
//! └───────────────────────────────────────────────┘
//! ```

pub mod camera;
pub mod machine;
pub mod session;

pub use camera::*;
pub use machine::*;
pub use session::*;
