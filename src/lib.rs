//! dermannot - dermatology region annotation editor core
//!
//! Coordinate transform between natural and screen space, the region model,
//! the draw and edit state machines, and the render projection consumed by
//! a presentation layer. Also the feedback payloads, file formats and the
//! review comparison built on top of them.

pub mod compare;
pub mod config;
pub mod constants;
pub mod format;
pub mod geometry;
pub mod model;
pub mod render;
pub mod replay;
pub mod state;
pub mod transport;

pub use config::EditorConfig;
pub use model::{Region, RegionCollection, RegionKey};
pub use state::EditorSession;
