//! The editing session: one case, one image, one region collection.
//!
//! Ties the draw state machine and the edit controller to the collection
//! they both mutate. Every editing operation is a logged no-op when the case
//! context forbids editing or when it refers to a region key that went stale.

use crate::config::EditorSettings;
use crate::format::{
    FeedbackPrediction, FeedbackSubmission, Prediction, ReviewPrediction, ReviewSubmission,
    Submission,
};
use crate::geometry::{Point, Rect, Transform, Viewport};
use crate::model::{
    CaseContext, CaseStatus, ClassCatalog, Region, RegionCollection, RegionKey, RegionPatch,
    Workflow,
};
use crate::render::{Projection, project_regions};
use crate::state::drawing::{DrawOutcome, DrawingState, PointerTarget};
use crate::state::edit::{EditBuffer, EditController};
use crate::state::manipulation::{self, ResizeHandle};
use crate::transport::{SubmissionSink, TransportError};

/// Editing session for a single case.
#[derive(Debug, Clone)]
pub struct EditorSession {
    regions: RegionCollection,
    drawing: DrawingState,
    edit: EditController,
    hovered: Option<usize>,
    case: CaseContext,
    viewport: Viewport,
    catalog: ClassCatalog,
    settings: EditorSettings,
}

impl EditorSession {
    pub fn new(case: CaseContext, settings: EditorSettings) -> Self {
        Self {
            regions: RegionCollection::new(),
            drawing: DrawingState::default(),
            edit: EditController::new(
                settings.confidence_slider_min,
                settings.confidence_slider_max,
            ),
            hovered: None,
            case,
            viewport: Viewport::default(),
            catalog: ClassCatalog::builtin(),
            settings,
        }
    }

    pub fn regions(&self) -> &RegionCollection {
        &self.regions
    }

    pub fn case(&self) -> CaseContext {
        self.case
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub fn drawing(&self) -> &DrawingState {
        &self.drawing
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.edit.editing_index()
    }

    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        self.edit.buffer()
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered
    }

    /// Transform for the current viewport.
    pub fn transform(&self) -> Transform {
        self.viewport.transform()
    }

    pub fn editing_permitted(&self) -> bool {
        self.case.editing_permitted()
    }

    /// Key for `index` under the current collection generation.
    pub fn key(&self, index: usize) -> Option<RegionKey> {
        self.regions.key(index)
    }

    /// Replace the collection with freshly loaded predictions.
    ///
    /// Clears the hover and edit markers and abandons any draw gesture.
    pub fn load_predictions(&mut self, predictions: &[Prediction]) {
        for prediction in predictions {
            if !self.catalog.contains(&prediction.name) {
                log::warn!(
                    "Loaded prediction with label '{}' outside the class catalog",
                    prediction.name
                );
            }
        }

        self.regions
            .replace_all(predictions.iter().map(Prediction::to_region));
        self.edit.reset();
        self.drawing.cancel();
        self.hovered = None;
        log::info!("Loaded {} predictions", self.regions.len());
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport.natural.is_none() {
            log::debug!("Viewport set before natural image size is known");
        }
        self.viewport = viewport;
    }

    /// Record a status change reported by the case owner.
    pub fn set_case_status(&mut self, status: CaseStatus) {
        if self.case.status != status {
            log::info!(
                "Case status changed: {} -> {}",
                self.case.status.name(),
                status.name()
            );
        }
        self.case.status = status;
        if !self.editing_permitted() {
            self.drawing.cancel();
            self.edit.cancel();
        }
    }

    // --- Draw gesture -----------------------------------------------------

    pub fn pointer_down(&mut self, pos: Point, target: PointerTarget) -> bool {
        let permitted = self.editing_permitted();
        self.drawing.begin(pos, target, permitted)
    }

    pub fn pointer_move(&mut self, pos: Point) -> bool {
        self.drawing.update(pos, self.viewport.container)
    }

    /// Finish the draw gesture. Returns the index of the region created.
    pub fn pointer_up(&mut self) -> Option<usize> {
        let outcome = self
            .drawing
            .finish(&self.transform(), self.settings.min_draw_size);
        let DrawOutcome::Completed { natural, .. } = outcome else {
            return None;
        };
        if !self.editing_permitted() {
            log::debug!("Draw: editing no longer permitted, discarding gesture");
            return None;
        }

        let region = Region::drawn(
            natural,
            self.catalog.default_label(),
            self.settings.default_confidence,
        );
        let index = self.regions.append(region);
        log::info!(
            "Draw: created region {} at ({:.1}, {:.1}) {:.1}x{:.1}",
            index,
            natural.x,
            natural.y,
            natural.width,
            natural.height
        );

        if let Some(region) = self.regions.get(index).cloned() {
            self.edit.select(index, &region);
        }
        Some(index)
    }

    /// Pointer left the container: abandon the gesture.
    pub fn pointer_leave(&mut self) -> bool {
        self.drawing.cancel()
    }

    // --- Box manipulation -------------------------------------------------

    /// Drag a region by a screen-space delta.
    pub fn move_region(&mut self, key: RegionKey, screen_delta: Point) -> bool {
        let Some((index, rect, transform)) = self.manipulation_target(key) else {
            return false;
        };
        let moved = manipulation::translate(rect, screen_delta, &transform, self.viewport.natural);
        log::debug!("Moved region {} to ({:.1}, {:.1})", index, moved.x, moved.y);
        self.regions.patch(index, &RegionPatch::bounds(moved))
    }

    /// Drag one of a region's resize handles by a screen-space delta.
    pub fn resize_region(
        &mut self,
        key: RegionKey,
        handle: ResizeHandle,
        screen_delta: Point,
    ) -> bool {
        let Some((index, rect, transform)) = self.manipulation_target(key) else {
            return false;
        };
        let resized = manipulation::resize(
            rect,
            handle,
            screen_delta,
            &transform,
            crate::constants::MIN_REGION_EXTENT,
            self.viewport.natural,
        );
        log::debug!(
            "Resized region {} via {:?} to {:.1}x{:.1}",
            index,
            handle,
            resized.width,
            resized.height
        );
        self.regions.patch(index, &RegionPatch::bounds(resized))
    }

    /// Set a region's frame from a final screen-space rectangle.
    pub fn place_region(&mut self, key: RegionKey, screen: Rect) -> bool {
        let Some((index, _, transform)) = self.manipulation_target(key) else {
            return false;
        };
        let placed = manipulation::place(screen, &transform, crate::constants::MIN_REGION_EXTENT);
        self.regions.patch(index, &RegionPatch::bounds(placed))
    }

    /// Double activation removes the region directly.
    pub fn double_click(&mut self, key: RegionKey) -> bool {
        self.remove(key)
    }

    fn manipulation_target(&self, key: RegionKey) -> Option<(usize, Rect, Transform)> {
        if !self.editing_permitted() {
            log::debug!("Ignoring manipulation, editing not permitted");
            return None;
        }
        let transform = self.transform();
        if !transform.is_scaled() {
            log::warn!("Ignoring manipulation, image dimensions unknown");
            return None;
        }
        let index = self.regions.resolve(key)?;
        let rect = self.regions.get(index)?.rect();
        Some((index, rect, transform))
    }

    // --- Structured editing -----------------------------------------------

    /// Open the edit panel for a region.
    pub fn select(&mut self, key: RegionKey) -> bool {
        if !self.editing_permitted() {
            log::debug!("Ignoring select, editing not permitted");
            return false;
        }
        let Some(index) = self.regions.resolve(key) else {
            return false;
        };
        let Some(region) = self.regions.get(index).cloned() else {
            return false;
        };
        self.edit.select(index, &region);
        true
    }

    pub fn set_edit_label(&mut self, label: impl Into<String>) -> bool {
        self.edit.set_label(label)
    }

    pub fn set_edit_confidence_percent(&mut self, percent: f64) -> bool {
        self.edit.set_confidence_percent(percent)
    }

    /// Write the edit buffer back. Returns the committed index.
    pub fn commit(&mut self) -> Option<usize> {
        if !self.editing_permitted() {
            log::debug!("Ignoring commit, editing not permitted");
            return None;
        }
        self.edit.commit(&mut self.regions, &self.catalog)
    }

    pub fn cancel(&mut self) -> bool {
        self.edit.cancel()
    }

    /// Delete a region immediately.
    ///
    /// Hover and edit markers at or after the removed index are cleared.
    pub fn remove(&mut self, key: RegionKey) -> bool {
        if !self.editing_permitted() {
            log::debug!("Ignoring removal, editing not permitted");
            return false;
        }
        let Some(index) = self.regions.resolve(key) else {
            return false;
        };
        let Some(removed) = self.regions.remove(index) else {
            return false;
        };

        self.edit.region_removed(index);
        if self.hovered.is_some_and(|hovered| hovered >= index) {
            self.hovered = None;
        }
        log::info!("Removed region {} ('{}')", index, removed.label);
        true
    }

    // --- Hover ------------------------------------------------------------

    pub fn hover(&mut self, key: RegionKey) -> bool {
        match self.regions.resolve(key) {
            Some(index) => {
                self.hovered = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn unhover(&mut self) {
        self.hovered = None;
    }

    // --- Output -----------------------------------------------------------

    /// Screen-space view of the current frame.
    pub fn project(&self) -> Projection {
        let transform = self.transform();
        Projection {
            transform,
            regions: project_regions(
                &self.regions,
                &transform,
                self.hovered,
                self.edit.editing_index(),
            ),
            draft: self.drawing.draft_rect(),
        }
    }

    pub fn feedback_submission(&self, notes: Option<String>) -> FeedbackSubmission {
        FeedbackSubmission {
            predictions: self.regions.iter().map(FeedbackPrediction::from).collect(),
            feedback: notes.filter(|n| !n.trim().is_empty()),
        }
    }

    /// Review payload. Submitting a review marks the case as reviewed.
    pub fn review_submission(&self, notes: Option<String>) -> ReviewSubmission {
        ReviewSubmission {
            predictions: self.regions.iter().map(ReviewPrediction::from).collect(),
            review_notes: notes.unwrap_or_default(),
            status: CaseStatus::Reviewed,
        }
    }

    /// Build the payload for this case's workflow.
    pub fn submission(&self, notes: Option<String>) -> Submission {
        match self.case.workflow {
            Workflow::Upload => Submission::Feedback(self.feedback_submission(notes)),
            Workflow::Review => Submission::Review(self.review_submission(notes)),
        }
    }

    /// Send the collection to `sink`.
    pub fn submit(
        &self,
        sink: &mut dyn SubmissionSink,
        notes: Option<String>,
    ) -> Result<(), TransportError> {
        let submission = self.submission(notes);
        log::info!(
            "Submitting {} regions ({:?} workflow)",
            submission.prediction_count(),
            self.case.workflow
        );
        sink.send(&submission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::render::VisualState;
    use crate::transport::MemorySink;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn predictions() -> Vec<Prediction> {
        vec![
            Prediction::new(10.0, 10.0, 50.0, 50.0, "Nodular BCC", 0.8),
            Prediction::new(60.0, 60.0, 90.0, 90.0, "Glands", 0.4),
            Prediction::new(5.0, 70.0, 30.0, 95.0, "Epidermis", 0.6),
        ]
    }

    /// Upload session on a 100x100 image rendered at 200x200.
    fn session() -> EditorSession {
        let mut session = EditorSession::new(
            CaseContext::new(Workflow::Upload, CaseStatus::Completed),
            EditorSettings::default(),
        );
        session.set_viewport(Viewport::filled(
            Size::new(200.0, 200.0),
            Some(Size::new(100.0, 100.0)),
        ));
        session.load_predictions(&predictions());
        session
    }

    fn key(session: &EditorSession, index: usize) -> RegionKey {
        session.key(index).expect("index exists")
    }

    #[test]
    fn test_draw_scenario() {
        let mut session = session();
        session.load_predictions(&predictions()[..1]);

        assert!(session.pointer_down(Point::new(5.0, 5.0), PointerTarget::ImageSurface));
        assert!(session.pointer_move(Point::new(40.0, 40.0)));
        assert_eq!(session.pointer_up(), Some(1));

        let region = session.regions().get(1).expect("created");
        assert!(approx_eq(region.xmin, 2.5));
        assert!(approx_eq(region.ymin, 2.5));
        assert!(approx_eq(region.xmax, 20.0));
        assert!(approx_eq(region.ymax, 20.0));
        assert!(region.is_new);
        assert!(region.is_modified);
        assert_eq!(region.confidence, 0.5);
        assert_eq!(region.label, "Nodular BCC");
        assert_eq!(session.editing_index(), Some(1));
    }

    #[test]
    fn test_small_draw_is_discarded() {
        let mut session = session();
        session.pointer_down(Point::new(5.0, 5.0), PointerTarget::ImageSurface);
        session.pointer_move(Point::new(14.0, 80.0));
        assert_eq!(session.pointer_up(), None);
        assert_eq!(session.regions().len(), 3);
    }

    #[test]
    fn test_pointer_leave_cancels_draw() {
        let mut session = session();
        session.pointer_down(Point::new(5.0, 5.0), PointerTarget::ImageSurface);
        session.pointer_move(Point::new(100.0, 100.0));
        assert!(session.pointer_leave());
        assert_eq!(session.pointer_up(), None);
        assert_eq!(session.regions().len(), 3);
    }

    #[test]
    fn test_draw_without_natural_size_is_discarded() {
        let mut session = session();
        session.set_viewport(Viewport::filled(Size::new(200.0, 200.0), None));
        session.pointer_down(Point::new(5.0, 5.0), PointerTarget::ImageSurface);
        session.pointer_move(Point::new(100.0, 100.0));
        assert_eq!(session.pointer_up(), None);
        assert_eq!(session.regions().len(), 3);
    }

    #[test]
    fn test_editing_gated_by_case_status() {
        let mut session = EditorSession::new(
            CaseContext::new(Workflow::Upload, CaseStatus::InProgress),
            EditorSettings::default(),
        );
        session.set_viewport(Viewport::filled(
            Size::new(100.0, 100.0),
            Some(Size::new(100.0, 100.0)),
        ));
        session.load_predictions(&predictions());

        let k = key(&session, 0);
        assert!(!session.pointer_down(Point::new(1.0, 1.0), PointerTarget::ImageSurface));
        assert!(!session.move_region(k, Point::new(5.0, 5.0)));
        assert!(!session.select(k));
        assert!(!session.remove(k));

        session.set_case_status(CaseStatus::Completed);
        assert!(session.move_region(k, Point::new(5.0, 5.0)));

        session.set_case_status(CaseStatus::Reviewed);
        assert!(!session.double_click(k));
        assert_eq!(session.regions().len(), 3);
    }

    #[test]
    fn test_status_change_drops_active_edit() {
        let mut session = session();
        let k = key(&session, 0);
        assert!(session.select(k));
        session.set_case_status(CaseStatus::Pending);
        assert_eq!(session.editing_index(), None);
        assert!(session.commit().is_none());
    }

    #[test]
    fn test_zero_move_marks_modified() {
        let mut session = session();
        let k = key(&session, 1);
        assert!(session.move_region(k, Point::new(0.0, 0.0)));
        let region = session.regions().get(1).expect("region");
        assert!(region.is_modified);
        assert!(approx_eq(region.xmin, 60.0));
        assert!(approx_eq(region.width(), 30.0));
    }

    #[test]
    fn test_move_converts_screen_delta() {
        let mut session = session();
        let k = key(&session, 0);
        session.move_region(k, Point::new(20.0, -10.0));
        let region = session.regions().get(0).expect("region");
        assert!(approx_eq(region.xmin, 20.0));
        assert!(approx_eq(region.ymin, 5.0));
        assert!(approx_eq(region.width(), 40.0));
        assert!(approx_eq(region.height(), 40.0));
    }

    #[test]
    fn test_resize_and_place() {
        let mut session = session();
        let k = key(&session, 0);
        assert!(session.resize_region(k, ResizeHandle::BottomRight, Point::new(20.0, 20.0)));
        let region = session.regions().get(0).expect("region");
        assert!(approx_eq(region.xmax, 60.0));
        assert!(approx_eq(region.ymax, 60.0));

        assert!(session.place_region(k, Rect::new(0.0, 0.0, 40.0, 20.0)));
        let region = session.regions().get(0).expect("region");
        assert!(approx_eq(region.xmax, 20.0));
        assert!(approx_eq(region.ymax, 10.0));
    }

    #[test]
    fn test_remove_shifts_and_clears_markers() {
        let mut session = session();
        session.select(key(&session, 1));
        session.hover(key(&session, 2));

        assert!(session.remove(key(&session, 0)));
        assert_eq!(session.regions().len(), 2);
        assert_eq!(session.regions().get(0).map(|r| r.label.as_str()), Some("Glands"));
        assert_eq!(session.editing_index(), None);
        assert_eq!(session.hovered_index(), None);
    }

    #[test]
    fn test_remove_keeps_earlier_markers() {
        let mut session = session();
        session.select(key(&session, 0));
        session.hover(key(&session, 0));
        assert!(session.remove(key(&session, 2)));
        assert_eq!(session.editing_index(), Some(0));
        assert_eq!(session.hovered_index(), Some(0));
    }

    #[test]
    fn test_stale_key_is_noop() {
        let mut session = session();
        let stale = key(&session, 2);
        session.double_click(key(&session, 0));

        assert!(!session.move_region(stale, Point::new(1.0, 1.0)));
        assert!(!session.select(stale));
        assert!(!session.remove(stale));
        assert!(!session.hover(stale));
        assert_eq!(session.regions().len(), 2);
    }

    #[test]
    fn test_edit_commit_through_session() {
        let mut session = session();
        session.select(key(&session, 2));
        session.set_edit_label("Superficial BCC");
        session.set_edit_confidence_percent(73.0);
        assert_eq!(session.commit(), Some(2));

        let region = session.regions().get(2).expect("region");
        assert_eq!(region.label, "Superficial BCC");
        assert_eq!(region.class_index(), Some(2));
        assert_eq!(region.confidence, 0.73);
    }

    #[test]
    fn test_projection() {
        let mut session = session();
        session.hover(key(&session, 0));
        session.move_region(key(&session, 1), Point::new(0.0, 0.0));
        session.pointer_down(Point::new(10.0, 10.0), PointerTarget::ImageSurface);
        session.pointer_move(Point::new(300.0, 30.0));

        let projection = session.project();
        assert_eq!(projection.regions.len(), 3);
        assert_eq!(projection.regions[0].rect, Rect::new(20.0, 20.0, 80.0, 80.0));
        assert_eq!(projection.regions[0].state, VisualState::Hovered);
        assert_eq!(projection.regions[1].state, VisualState::Modified);
        assert_eq!(projection.regions[2].state, VisualState::Default);
        assert_eq!(projection.draft, Some(Rect::new(10.0, 10.0, 190.0, 20.0)));
    }

    #[test]
    fn test_submit_feedback() {
        let mut session = session();
        session.move_region(key(&session, 0), Point::new(0.0, 0.0));
        let mut sink = MemorySink::default();
        session
            .submit(&mut sink, Some("two lesions".to_string()))
            .expect("submit");

        let Some(Submission::Feedback(sent)) = sink.sent.first() else {
            panic!("expected feedback submission");
        };
        assert_eq!(sent.predictions.len(), 3);
        assert!(sent.predictions[0].is_modified);
        assert_eq!(sent.predictions[1].class_index, Some(6));
        assert_eq!(sent.feedback.as_deref(), Some("two lesions"));
    }

    #[test]
    fn test_review_submission_marks_reviewed() {
        let mut session = EditorSession::new(
            CaseContext::new(Workflow::Review, CaseStatus::Pending),
            EditorSettings::default(),
        );
        session.load_predictions(&predictions());
        let submission = session.submission(None);
        let Submission::Review(review) = submission else {
            panic!("expected review submission");
        };
        assert_eq!(review.status, CaseStatus::Reviewed);
        assert_eq!(review.review_notes, "");
        assert_eq!(review.predictions.len(), 3);
    }

    #[test]
    fn test_load_resets_markers() {
        let mut session = session();
        session.select(key(&session, 0));
        session.hover(key(&session, 1));
        let old = key(&session, 0);
        session.load_predictions(&predictions());
        assert_eq!(session.editing_index(), None);
        assert_eq!(session.hovered_index(), None);
        assert!(!session.select(old));
    }
}
