//! Region format implementations.

mod json;
mod pascal_voc;
mod yolo;

#[cfg(test)]
mod tests;

pub use json::JsonFormat;
pub use pascal_voc::PascalVocFormat;
pub use yolo::YoloFormat;
