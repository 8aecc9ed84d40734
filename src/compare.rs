//! Comparison of model predictions with clinician feedback.
//!
//! Boxes are paired greedily on their complete IoU. The result says which
//! predictions were kept, moved, relabeled, removed or added, and whether the
//! case should go to a second reviewer.

use ndarray::Array2;
use serde::Serialize;

use crate::format::Prediction;

/// Complete IoU with its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CiouBreakdown {
    pub iou: f64,
    /// Squared center distance over squared enclosing diagonal.
    pub distance_term: f64,
    /// `alpha * v` aspect-ratio penalty.
    pub aspect_ratio_term: f64,
    pub ciou: f64,
}

/// Intersection over union of two boxes.
pub fn iou(a: &Prediction, b: &Prediction) -> f64 {
    let x_min = a.xmin.max(b.xmin);
    let y_min = a.ymin.max(b.ymin);
    let x_max = a.xmax.min(b.xmax);
    let y_max = a.ymax.min(b.ymax);

    if x_max <= x_min || y_max <= y_min {
        return 0.0;
    }

    let intersection = (x_max - x_min) * (y_max - y_min);
    let union = a.width() * a.height() + b.width() * b.height() - intersection;
    if union > 0.0 { intersection / union } else { 0.0 }
}

/// Complete IoU: IoU minus a center-distance and an aspect-ratio penalty.
pub fn ciou(a: &Prediction, b: &Prediction) -> CiouBreakdown {
    let iou = iou(a, b);

    let center_distance_sq = ((a.xmin + a.xmax) / 2.0 - (b.xmin + b.xmax) / 2.0).powi(2)
        + ((a.ymin + a.ymax) / 2.0 - (b.ymin + b.ymax) / 2.0).powi(2);
    let diagonal_sq = (a.xmax.max(b.xmax) - a.xmin.min(b.xmin)).powi(2)
        + (a.ymax.max(b.ymax) - a.ymin.min(b.ymin)).powi(2);
    let distance_term = if diagonal_sq > 0.0 {
        center_distance_sq / diagonal_sq
    } else {
        0.0
    };

    let angle = |p: &Prediction| {
        if p.height() > 0.0 {
            (p.width() / p.height()).atan()
        } else {
            0.0
        }
    };
    let v = 4.0 / std::f64::consts::PI.powi(2) * (angle(a) - angle(b)).powi(2);
    let alpha = if iou < 1.0 { v / (1.0 - iou + v) } else { 0.0 };
    let aspect_ratio_term = alpha * v;

    CiouBreakdown {
        iou,
        distance_term,
        aspect_ratio_term,
        ciou: iou - distance_term - aspect_ratio_term,
    }
}

/// A model box paired with a feedback box.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxMatch {
    pub ai_index: usize,
    pub feedback_index: usize,
    pub ciou: CiouBreakdown,
}

/// Outcome of pairing two prediction lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Comparison {
    pub matches: Vec<BoxMatch>,
    /// Feedback boxes no model box was paired with.
    pub missed_detections: Vec<usize>,
    /// Model boxes no feedback box was paired with.
    pub false_positives: Vec<usize>,
    /// Indices into `matches` whose CIoU is below the threshold.
    pub significant_differences: Vec<usize>,
    pub needs_review: bool,
}

/// Pair `ai` and `feedback` boxes greedily by highest CIoU.
///
/// Each box is used at most once and pairing stops once the best remaining
/// CIoU is not positive.
pub fn compare_predictions(
    ai: &[Prediction],
    feedback: &[Prediction],
    threshold: f64,
) -> Comparison {
    let mut scores = Array2::<f64>::zeros((ai.len(), feedback.len()));
    let mut details = Array2::<Option<CiouBreakdown>>::from_elem(scores.raw_dim(), None);
    for (i, a) in ai.iter().enumerate() {
        for (j, f) in feedback.iter().enumerate() {
            let result = ciou(a, f);
            scores[[i, j]] = result.ciou;
            details[[i, j]] = Some(result);
        }
    }

    let mut comparison = Comparison::default();
    let mut ai_used = vec![false; ai.len()];
    let mut feedback_used = vec![false; feedback.len()];

    while let Some(((i, j), best)) = best_cell(&scores) {
        if best <= 0.0 {
            break;
        }
        let Some(breakdown) = details[[i, j]] else {
            break;
        };

        if best < threshold {
            comparison
                .significant_differences
                .push(comparison.matches.len());
        }
        comparison.matches.push(BoxMatch {
            ai_index: i,
            feedback_index: j,
            ciou: breakdown,
        });
        ai_used[i] = true;
        feedback_used[j] = true;

        scores.row_mut(i).fill(0.0);
        scores.column_mut(j).fill(0.0);
    }

    comparison.missed_detections = unused(&feedback_used);
    comparison.false_positives = unused(&ai_used);
    comparison.needs_review =
        !comparison.significant_differences.is_empty() || !comparison.missed_detections.is_empty();

    log::debug!(
        "Compared {} model boxes with {} feedback boxes: {} matches, {} missed, {} removed",
        ai.len(),
        feedback.len(),
        comparison.matches.len(),
        comparison.missed_detections.len(),
        comparison.false_positives.len()
    );
    comparison
}

/// First cell holding the maximum score, in row-major order.
fn best_cell(scores: &Array2<f64>) -> Option<((usize, usize), f64)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (index, &score) in scores.indexed_iter() {
        if best.is_none_or(|(_, current)| score > current) {
            best = Some((index, score));
        }
    }
    best
}

fn unused(used: &[bool]) -> Vec<usize> {
    used.iter()
        .enumerate()
        .filter_map(|(index, &used)| (!used).then_some(index))
        .collect()
}

/// Matched pair whose labels differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationDifference {
    pub ai_index: usize,
    pub feedback_index: usize,
    /// Lowercased model label.
    pub ai_label: String,
    /// Lowercased feedback label.
    pub feedback_label: String,
}

/// Confident model box the clinician deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighConfidenceRemoval {
    pub ai_index: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReviewSummary {
    pub ai_prediction_count: usize,
    pub feedback_prediction_count: usize,
    pub match_count: usize,
    pub significant_difference_count: usize,
    pub missed_detection_count: usize,
    pub false_positive_count: usize,
    pub classification_difference_count: usize,
    pub high_confidence_removal_count: usize,
}

/// Everything needed to decide on a second review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewAssessment {
    pub comparison: Comparison,
    pub summary: ReviewSummary,
    pub classification_differences: Vec<ClassificationDifference>,
    pub high_confidence_removals: Vec<HighConfidenceRemoval>,
    pub needs_review: bool,
}

/// Compare predictions and flag the case for review if anything notable
/// changed: a poor match, a missed detection, a relabel, or the removal of a
/// confident prediction.
pub fn assess_for_review(
    ai: &[Prediction],
    feedback: &[Prediction],
    threshold: f64,
    confidence_threshold: f64,
) -> ReviewAssessment {
    let comparison = compare_predictions(ai, feedback, threshold);

    let classification_differences: Vec<_> = comparison
        .matches
        .iter()
        .filter_map(|m| {
            let ai_label = ai[m.ai_index].name.to_lowercase();
            let feedback_label = feedback[m.feedback_index].name.to_lowercase();
            (ai_label != feedback_label).then(|| ClassificationDifference {
                ai_index: m.ai_index,
                feedback_index: m.feedback_index,
                ai_label,
                feedback_label,
            })
        })
        .collect();

    let high_confidence_removals: Vec<_> = comparison
        .false_positives
        .iter()
        .filter(|&&i| ai[i].confidence >= confidence_threshold)
        .map(|&i| HighConfidenceRemoval {
            ai_index: i,
            confidence: ai[i].confidence,
        })
        .collect();

    let summary = ReviewSummary {
        ai_prediction_count: ai.len(),
        feedback_prediction_count: feedback.len(),
        match_count: comparison.matches.len(),
        significant_difference_count: comparison.significant_differences.len(),
        missed_detection_count: comparison.missed_detections.len(),
        false_positive_count: comparison.false_positives.len(),
        classification_difference_count: classification_differences.len(),
        high_confidence_removal_count: high_confidence_removals.len(),
    };

    let needs_review = comparison.needs_review
        || !classification_differences.is_empty()
        || !high_confidence_removals.is_empty();
    if needs_review {
        log::info!("Case flagged for review: {:?}", summary);
    }

    ReviewAssessment {
        comparison,
        summary,
        classification_differences,
        high_confidence_removals,
        needs_review,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn bbox(xmin: f64, ymin: f64, xmax: f64, ymax: f64, name: &str, confidence: f64) -> Prediction {
        Prediction::new(xmin, ymin, xmax, ymax, name, confidence)
    }

    #[test]
    fn test_iou() {
        let a = bbox(0.0, 0.0, 10.0, 10.0, "Glands", 0.5);
        let b = bbox(5.0, 0.0, 15.0, 10.0, "Glands", 0.5);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < EPSILON);
        assert_eq!(iou(&a, &bbox(10.0, 0.0, 20.0, 10.0, "Glands", 0.5)), 0.0);
        assert_eq!(iou(&a, &a), 1.0);
    }

    #[test]
    fn test_ciou_identical_boxes() {
        let a = bbox(0.0, 0.0, 10.0, 20.0, "Glands", 0.5);
        let result = ciou(&a, &a);
        assert_eq!(result.iou, 1.0);
        assert_eq!(result.distance_term, 0.0);
        assert_eq!(result.aspect_ratio_term, 0.0);
        assert_eq!(result.ciou, 1.0);
    }

    #[test]
    fn test_ciou_penalizes_distance() {
        let a = bbox(0.0, 0.0, 10.0, 10.0, "Glands", 0.5);
        let b = bbox(5.0, 0.0, 15.0, 10.0, "Glands", 0.5);
        let result = ciou(&a, &b);
        // Centers 5 apart, enclosing box 15x10
        assert!((result.distance_term - 25.0 / 325.0).abs() < EPSILON);
        assert_eq!(result.aspect_ratio_term, 0.0);
        assert!(result.ciou < result.iou);
    }

    #[test]
    fn test_ciou_degenerate_boxes() {
        let point = bbox(3.0, 3.0, 3.0, 3.0, "Glands", 0.5);
        let result = ciou(&point, &point);
        assert_eq!(result.iou, 0.0);
        assert_eq!(result.distance_term, 0.0);
        assert!(result.ciou.is_finite());
    }

    #[test]
    fn test_compare_greedy_matching() {
        let ai = vec![
            bbox(0.0, 0.0, 10.0, 10.0, "Glands", 0.9),
            bbox(50.0, 50.0, 60.0, 60.0, "Epidermis", 0.8),
            bbox(200.0, 200.0, 210.0, 210.0, "Glands", 0.3),
        ];
        let feedback = vec![
            bbox(50.0, 50.0, 60.0, 60.0, "Epidermis", 0.8),
            bbox(1.0, 0.0, 11.0, 10.0, "Glands", 0.9),
            bbox(400.0, 400.0, 420.0, 420.0, "Nodular BCC", 0.5),
        ];

        let result = compare_predictions(&ai, &feedback, 0.5);
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.matches[0].ai_index, 1);
        assert_eq!(result.matches[0].feedback_index, 0);
        assert_eq!(result.matches[1].ai_index, 0);
        assert_eq!(result.matches[1].feedback_index, 1);
        assert!(result.significant_differences.is_empty());
        assert_eq!(result.missed_detections, vec![2]);
        assert_eq!(result.false_positives, vec![2]);
        assert!(result.needs_review);
    }

    #[test]
    fn test_compare_identical_lists_needs_no_review() {
        let boxes = vec![
            bbox(0.0, 0.0, 10.0, 10.0, "Glands", 0.9),
            bbox(20.0, 20.0, 40.0, 30.0, "Epidermis", 0.4),
        ];
        let assessment = assess_for_review(&boxes, &boxes, 0.5, 0.75);
        assert!(!assessment.needs_review);
        assert_eq!(assessment.summary.match_count, 2);
        assert!(assessment.classification_differences.is_empty());
    }

    #[test]
    fn test_assess_flags_relabel_and_confident_removal() {
        let ai = vec![
            bbox(0.0, 0.0, 10.0, 10.0, "Glands", 0.9),
            bbox(100.0, 100.0, 120.0, 120.0, "Nodular BCC", 0.8),
            bbox(300.0, 300.0, 310.0, 310.0, "Epidermis", 0.2),
        ];
        let feedback = vec![
            bbox(0.0, 0.0, 10.0, 10.0, "glands", 0.9),
            bbox(0.0, 0.0, 10.0, 10.0, "Hair follicle", 0.9),
        ];

        let assessment = assess_for_review(&ai, &feedback[..1], 0.5, 0.75);
        assert!(assessment.classification_differences.is_empty(), "case-insensitive");
        assert_eq!(assessment.high_confidence_removals.len(), 1);
        assert_eq!(assessment.high_confidence_removals[0].ai_index, 1);
        assert!(assessment.needs_review);

        let relabeled = assess_for_review(&ai[..1], &feedback[1..], 0.5, 0.75);
        assert_eq!(relabeled.classification_differences.len(), 1);
        assert_eq!(relabeled.classification_differences[0].feedback_label, "hair follicle");
        assert_eq!(relabeled.summary.classification_difference_count, 1);
        assert!(relabeled.needs_review);
    }

    #[test]
    fn test_poor_match_is_significant() {
        let ai = vec![bbox(0.0, 0.0, 10.0, 10.0, "Glands", 0.5)];
        let feedback = vec![bbox(4.0, 0.0, 14.0, 10.0, "Glands", 0.5)];
        let result = compare_predictions(&ai, &feedback, 0.5);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.significant_differences, vec![0]);
        assert!(result.needs_review);
    }
}
