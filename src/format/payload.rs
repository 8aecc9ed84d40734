//! Wire shapes exchanged with the prediction source and submission sink.
//!
//! Predictions arrive as `{xmin, ymin, xmax, ymax, name, confidence}` in
//! natural pixel space. Submissions send the edited collection back in the
//! same shape plus the `isNew` flag and a modified flag whose key differs
//! between the upload (`isModified`) and review (`modified`) variants.

use serde::{Deserialize, Serialize};

use crate::model::{CaseStatus, Region};

/// One detection as produced by the model or stored with a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub confidence: f64,
}

impl Prediction {
    pub fn new(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        name: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            name: name.into(),
            confidence,
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Build an untouched region. Flags in the source payload are ignored.
    pub fn to_region(&self) -> Region {
        Region::loaded(
            self.xmin,
            self.ymin,
            self.xmax,
            self.ymax,
            self.name.clone(),
            self.confidence,
        )
    }
}

impl From<&Region> for Prediction {
    fn from(region: &Region) -> Self {
        Self::new(
            region.xmin,
            region.ymin,
            region.xmax,
            region.ymax,
            region.label.clone(),
            region.confidence,
        )
    }
}

/// A stored case as returned when it is reopened for review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCase {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub review_notes: Option<String>,
    #[serde(default)]
    pub status: CaseStatus,
}

/// Upload-flow record: prediction plus `class`, `isModified`, `isNew`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackPrediction {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub name: String,
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class_index: Option<usize>,
    pub confidence: f64,
    #[serde(rename = "isModified", default)]
    pub is_modified: bool,
    #[serde(rename = "isNew", default)]
    pub is_new: bool,
}

impl From<&Region> for FeedbackPrediction {
    fn from(region: &Region) -> Self {
        Self {
            xmin: region.xmin,
            ymin: region.ymin,
            xmax: region.xmax,
            ymax: region.ymax,
            name: region.label.clone(),
            class_index: region.class_index(),
            confidence: region.confidence,
            is_modified: region.is_modified,
            is_new: region.is_new,
        }
    }
}

/// Review-flow record: prediction plus `modified`, `isNew`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPrediction {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub modified: bool,
    #[serde(rename = "isNew", default)]
    pub is_new: bool,
}

impl From<&Region> for ReviewPrediction {
    fn from(region: &Region) -> Self {
        Self {
            xmin: region.xmin,
            ymin: region.ymin,
            xmax: region.xmax,
            ymax: region.ymax,
            name: region.label.clone(),
            confidence: region.confidence,
            modified: region.is_modified,
            is_new: region.is_new,
        }
    }
}

/// Payload of the upload flow's feedback submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub predictions: Vec<FeedbackPrediction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Payload of the review flow's submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub predictions: Vec<ReviewPrediction>,
    pub review_notes: String,
    pub status: CaseStatus,
}

/// Either submission variant.
///
/// Review comes first so that untagged decoding tries the variant with
/// required `review_notes`/`status` before the looser feedback shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Submission {
    Review(ReviewSubmission),
    Feedback(FeedbackSubmission),
}

impl Submission {
    pub fn prediction_count(&self) -> usize {
        match self {
            Submission::Feedback(s) => s.predictions.len(),
            Submission::Review(s) => s.predictions.len(),
        }
    }
}

/// Parse a JSON list of predictions.
pub fn parse_predictions(json: &str) -> Result<Vec<Prediction>, serde_json::Error> {
    serde_json::from_str(json)
}
