//! Screen-space projection of the region collection.
//!
//! Pure functions of the regions, the current transform and the hover and
//! edit markers. The presentation layer calls this again whenever the
//! rendered image size may have changed.

use crate::geometry::{Rect, Transform};
use crate::model::{Region, RegionCollection, RegionKey};

/// Visual tag of a region, by priority: hovered, new, modified, default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Hovered,
    New,
    Modified,
    Default,
}

impl VisualState {
    /// Pick the tag for a region.
    pub fn of(region: &Region, hovered: bool) -> Self {
        if hovered {
            VisualState::Hovered
        } else if region.is_new {
            VisualState::New
        } else if region.is_modified {
            VisualState::Modified
        } else {
            VisualState::Default
        }
    }
}

/// Everything the presentation layer needs to draw one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionView {
    /// Key to pass back into editing operations.
    pub key: RegionKey,
    /// Frame in screen space.
    pub rect: Rect,
    pub state: VisualState,
    /// Being edited in the edit panel.
    pub selected: bool,
    pub label: String,
    pub class_index: Option<usize>,
    pub confidence: f64,
}

/// A full frame: every region plus the draft rectangle of a draw gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub transform: Transform,
    pub regions: Vec<RegionView>,
    /// Screen-space rectangle of the gesture in progress.
    pub draft: Option<Rect>,
}

/// Screen-space frame of a single region.
pub fn screen_rect(region: &Region, transform: &Transform) -> Rect {
    Rect::new(
        region.xmin * transform.scale_x,
        region.ymin * transform.scale_y,
        (region.xmax - region.xmin) * transform.scale_x,
        (region.ymax - region.ymin) * transform.scale_y,
    )
}

/// Project every region in `regions`.
pub fn project_regions(
    regions: &RegionCollection,
    transform: &Transform,
    hovered: Option<usize>,
    editing: Option<usize>,
) -> Vec<RegionView> {
    regions
        .iter()
        .enumerate()
        .map(|(index, region)| RegionView {
            key: RegionKey {
                index,
                generation: regions.generation(),
            },
            rect: screen_rect(region, transform),
            state: VisualState::of(region, hovered == Some(index)),
            selected: editing == Some(index),
            label: region.label.clone(),
            class_index: region.class_index(),
            confidence: region.confidence,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RegionPatch;

    fn collection() -> RegionCollection {
        let mut regions = RegionCollection::new();
        regions.replace_all([
            Region::loaded(10.0, 10.0, 50.0, 50.0, "Nodular BCC", 0.8),
            Region::loaded(60.0, 20.0, 80.0, 90.0, "Glands", 0.4),
        ]);
        regions
    }

    #[test]
    fn test_screen_rect() {
        let region = Region::loaded(10.0, 10.0, 50.0, 30.0, "Glands", 0.5);
        let rect = screen_rect(&region, &Transform::new(2.0, 0.5));
        assert_eq!(rect, Rect::new(20.0, 5.0, 80.0, 10.0));
    }

    #[test]
    fn test_visual_state_priority() {
        let mut region = Region::loaded(0.0, 0.0, 1.0, 1.0, "Glands", 0.5);
        assert_eq!(VisualState::of(&region, false), VisualState::Default);
        region.is_modified = true;
        assert_eq!(VisualState::of(&region, false), VisualState::Modified);
        region.is_new = true;
        assert_eq!(VisualState::of(&region, false), VisualState::New);
        assert_eq!(VisualState::of(&region, true), VisualState::Hovered);
    }

    #[test]
    fn test_project_regions_flags() {
        let mut regions = collection();
        regions.patch(1, &RegionPatch::new().ymin(20.0));
        let views = project_regions(&regions, &Transform::new(1.0, 1.0), Some(0), Some(1));

        assert_eq!(views.len(), 2);
        assert_eq!(views[0].state, VisualState::Hovered);
        assert!(!views[0].selected);
        assert_eq!(views[1].state, VisualState::Modified);
        assert!(views[1].selected);
        assert_eq!(views[1].class_index, Some(6));
        assert_eq!(views[1].key.generation, regions.generation());
    }

    #[test]
    fn test_projection_follows_transform() {
        let regions = collection();
        let small = project_regions(&regions, &Transform::new(0.5, 0.5), None, None);
        let large = project_regions(&regions, &Transform::new(2.0, 2.0), None, None);
        assert_eq!(small[0].rect, Rect::new(5.0, 5.0, 20.0, 20.0));
        assert_eq!(large[0].rect, Rect::new(20.0, 20.0, 80.0, 80.0));
    }
}
