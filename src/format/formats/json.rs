//! Submission JSON format.
//!
//! Export writes the upload-flow feedback payload. Import accepts either a
//! bare prediction list or a stored case object with a `predictions` field.

use std::path::Path;

use serde::Deserialize;

use crate::format::error::FormatError;
use crate::format::payload::{FeedbackPrediction, FeedbackSubmission, Prediction, ReviewCase};
use crate::format::traits::{
    AnnotatedImage, ExportResult, FormatWarning, ImportOptions, RegionFormat,
};

/// Feedback payload JSON.
pub struct JsonFormat;

#[derive(Deserialize)]
#[serde(untagged)]
enum PredictionSource {
    List(Vec<Prediction>),
    Case(ReviewCase),
}

impl RegionFormat for JsonFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Feedback JSON"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn requires_dimensions(&self) -> bool {
        false
    }

    fn export(&self, image: &AnnotatedImage, path: &Path) -> Result<ExportResult, FormatError> {
        log::info!("Exporting feedback JSON to {:?}", path);

        let mut result = ExportResult::new();
        for (index, region) in image.regions.iter().enumerate() {
            if region.class_index().is_none() {
                result.add_warning(
                    FormatWarning::info(format!(
                        "Label '{}' is not in the class catalog, class omitted",
                        region.label
                    ))
                    .with_region(index),
                );
            }
        }

        let submission = FeedbackSubmission {
            predictions: image.regions.iter().map(FeedbackPrediction::from).collect(),
            feedback: None,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&submission)?)?;

        result.regions_exported = submission.predictions.len();
        result.files_created.push(path.to_path_buf());
        Ok(result)
    }

    fn import(&self, path: &Path, options: &ImportOptions) -> Result<AnnotatedImage, FormatError> {
        log::info!("Importing predictions from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let source: PredictionSource = serde_json::from_str(&content)?;
        let (predictions, stored) = match source {
            PredictionSource::List(predictions) => (predictions, None),
            PredictionSource::Case(case) => {
                log::debug!("Stored case with status '{}'", case.status.name());
                (case.predictions, Some((case.status, case.review_notes)))
            }
        };

        let image_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let image = AnnotatedImage::new(
            image_name,
            options.natural,
            predictions.iter().map(Prediction::to_region).collect(),
        );

        Ok(match stored {
            Some((status, notes)) => image.with_case(status, notes),
            None => image,
        })
    }
}
