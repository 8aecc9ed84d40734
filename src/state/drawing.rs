//! Draw-gesture state machine.
//!
//! `Idle -> Drawing` on pointer-down over the image surface, live updates
//! on pointer-move, `Drawing -> Idle` on pointer-up (commit) or when the
//! pointer leaves the container (cancel). Only screen coordinates are held
//! here; conversion to natural space happens once, when the gesture ends.

use crate::geometry::{Point, Rect, Size, Transform};
use crate::model::RegionKey;

/// What the pointer was over when it went down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The image element itself.
    ImageSurface,
    /// An existing region's manipulation surface.
    Region(RegionKey),
    /// Container background outside the image.
    Background,
}

/// Transient state of a new-box gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Pointer is down on the image; both points are in screen space.
    Drawing { start: Point, current: Point },
}

/// Result of ending a gesture with pointer-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOutcome {
    /// There was no gesture to finish.
    NotDrawing,
    /// The rectangle was below the minimum size and has been discarded.
    TooSmall { screen: Rect },
    /// Natural dimensions were unknown, so the rectangle cannot be stored.
    Unscaled { screen: Rect },
    /// A rectangle large enough to become a region.
    Completed { screen: Rect, natural: Rect },
}

impl DrawingState {
    pub fn is_drawing(&self) -> bool {
        matches!(self, DrawingState::Drawing { .. })
    }

    /// Screen-space rectangle of the gesture, for the draft overlay.
    pub fn draft_rect(&self) -> Option<Rect> {
        match self {
            DrawingState::Idle => None,
            DrawingState::Drawing { start, current } => Some(Rect::from_corners(*start, *current)),
        }
    }

    /// Try to start a gesture. Returns true if the state moved to `Drawing`.
    pub fn begin(&mut self, pos: Point, target: PointerTarget, editing_permitted: bool) -> bool {
        if !editing_permitted {
            log::debug!("Draw: ignored pointer-down, editing not permitted");
            return false;
        }
        if self.is_drawing() {
            log::debug!("Draw: ignored pointer-down, gesture already in progress");
            return false;
        }
        if target != PointerTarget::ImageSurface {
            log::trace!("Draw: pointer-down on {:?}, not starting", target);
            return false;
        }

        *self = DrawingState::Drawing {
            start: pos,
            current: pos,
        };
        log::debug!("Draw: STARTED at ({:.1}, {:.1})", pos.x, pos.y);
        true
    }

    /// Move the live corner, clamped to the container.
    pub fn update(&mut self, pos: Point, container: Size) -> bool {
        match self {
            DrawingState::Drawing { current, .. } => {
                *current = pos.clamp_to(container);
                log::trace!("Draw: MOVE to ({:.1}, {:.1})", current.x, current.y);
                true
            }
            DrawingState::Idle => false,
        }
    }

    /// End the gesture on pointer-up and classify the result.
    pub fn finish(&mut self, transform: &Transform, min_size: f64) -> DrawOutcome {
        let Some(screen) = self.draft_rect() else {
            return DrawOutcome::NotDrawing;
        };
        *self = DrawingState::Idle;

        if screen.width < min_size || screen.height < min_size {
            log::debug!(
                "Draw: discarded {:.1}x{:.1} gesture (minimum {:.0})",
                screen.width,
                screen.height,
                min_size
            );
            return DrawOutcome::TooSmall { screen };
        }
        if !transform.is_scaled() {
            log::warn!("Draw: image dimensions unknown, discarding gesture");
            return DrawOutcome::Unscaled { screen };
        }

        DrawOutcome::Completed {
            screen,
            natural: transform.rect_to_natural(screen),
        }
    }

    /// Abandon the gesture without creating anything.
    pub fn cancel(&mut self) -> bool {
        let was_drawing = self.is_drawing();
        if was_drawing {
            log::debug!("Draw: CANCELLED");
        }
        *self = DrawingState::Idle;
        was_drawing
    }
}
