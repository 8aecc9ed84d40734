//! Region import/export and the submission wire format.
//!
//! The payload types are the JSON shapes exchanged with the prediction
//! source and the submission sink. The file formats implement
//! [`RegionFormat`] and are discovered through the [`FormatRegistry`].
//!
//! ## Supported Formats
//!
//! - **Feedback JSON**: the upload-flow submission payload
//! - **YOLO TXT**: normalized `class cx cy w h` lines, needs the image size
//! - **Pascal VOC XML**: per-image XML with pixel boxes

mod error;
pub mod formats;
mod payload;
mod registry;
mod traits;

pub use error::FormatError;
pub use payload::{
    FeedbackPrediction, FeedbackSubmission, Prediction, ReviewCase, ReviewPrediction,
    ReviewSubmission, Submission, parse_predictions,
};
pub use registry::FormatRegistry;
pub use traits::{
    AnnotatedImage, ExportResult, FormatWarning, ImportOptions, RegionFormat, WarningSeverity,
};
