//! Photostrip Render Engine
//!
//! Turns a capture session's photos and a frame style into one PNG.
//!
//! # Pipeline Architecture
//!
//! ```text
//! photos ──┐
//!          ├── build_scaffold (fixed-width layout, one tile per photo, caption)
//! style ───┘         │
//!                    ├── attach to OffscreenDocument (released on drop)
//!                    │
//!                    ├── await_decoded (per-image completion, bounded timeout)
//!                    │
//!                    ├── Rasterizer (export background passed explicitly)
//!                    │
//!                    ├── PNG encode
//!                    │
//!                    ▼
//!               FileSaver ── photobooth-photos.png
//! ```

pub mod compositor;
pub mod decode;
pub mod document;
pub mod export;
pub mod raster;
pub mod save;

pub use compositor::*;
pub use decode::*;
pub use document::*;
pub use export::*;
pub use raster::*;
pub use save::*;
