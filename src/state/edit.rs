//! Selection and structured editing of one region at a time.

use crate::constants::{CONFIDENCE_SLIDER_MAX, CONFIDENCE_SLIDER_MIN};
use crate::model::{ClassCatalog, Region, RegionCollection, RegionPatch};

/// Working copy of the editable fields of the selected region.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBuffer {
    /// Label as chosen in the dropdown; resolved against the catalog on commit.
    pub label: String,
    /// Confidence on the 1-100 slider scale.
    pub confidence_percent: f64,
}

impl EditBuffer {
    fn from_region(region: &Region) -> Self {
        Self {
            label: region.label.clone(),
            confidence_percent: region.confidence * 100.0,
        }
    }
}

/// Current editing state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditState {
    /// Nothing selected for editing.
    #[default]
    Idle,
    /// The region at `index` is being edited.
    Editing { index: usize, buffer: EditBuffer },
}

/// Owns the "being edited" marker and its buffer.
#[derive(Debug, Clone)]
pub struct EditController {
    state: EditState,
    slider_min: f64,
    slider_max: f64,
}

impl Default for EditController {
    fn default() -> Self {
        Self::new(CONFIDENCE_SLIDER_MIN, CONFIDENCE_SLIDER_MAX)
    }
}

impl EditController {
    pub fn new(slider_min: f64, slider_max: f64) -> Self {
        Self {
            state: EditState::Idle,
            slider_min: slider_min.min(slider_max),
            slider_max: slider_max.max(slider_min),
        }
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Index currently being edited.
    pub fn editing_index(&self) -> Option<usize> {
        match &self.state {
            EditState::Editing { index, .. } => Some(*index),
            EditState::Idle => None,
        }
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        match &self.state {
            EditState::Editing { buffer, .. } => Some(buffer),
            EditState::Idle => None,
        }
    }

    /// Load `region` into a fresh buffer and mark `index` as being edited.
    ///
    /// Any previous buffer is dropped without being written back.
    /// Returns the index whose edit was discarded, if any.
    pub fn select(&mut self, index: usize, region: &Region) -> Option<usize> {
        let discarded = self.editing_index().filter(|previous| *previous != index);
        if let Some(previous) = discarded {
            log::debug!("Edit: discarding unsaved buffer for region {}", previous);
        }
        self.state = EditState::Editing {
            index,
            buffer: EditBuffer::from_region(region),
        };
        log::debug!("Edit: selected region {}", index);
        discarded
    }

    /// Change the label in the buffer. No-op when nothing is selected.
    pub fn set_label(&mut self, label: impl Into<String>) -> bool {
        match &mut self.state {
            EditState::Editing { buffer, .. } => {
                buffer.label = label.into();
                true
            }
            EditState::Idle => false,
        }
    }

    /// Change the slider value in the buffer, held to the slider bounds.
    pub fn set_confidence_percent(&mut self, percent: f64) -> bool {
        let (min, max) = (self.slider_min, self.slider_max);
        match &mut self.state {
            EditState::Editing { buffer, .. } if percent.is_finite() => {
                buffer.confidence_percent = percent.clamp(min, max);
                true
            }
            _ => false,
        }
    }

    /// Write the buffer into the region being edited and clear the marker.
    ///
    /// Returns the committed index, or `None` when there was nothing to
    /// commit or the index no longer exists.
    pub fn commit(
        &mut self,
        regions: &mut RegionCollection,
        catalog: &ClassCatalog,
    ) -> Option<usize> {
        let EditState::Editing { index, buffer } = std::mem::take(&mut self.state) else {
            return None;
        };

        let (label, class_index) = catalog.resolve(&buffer.label);
        let percent = if buffer.confidence_percent.is_finite() {
            buffer.confidence_percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let confidence = percent / 100.0;

        let patch = RegionPatch::new().label(label).confidence(confidence);
        if regions.patch(index, &patch) {
            log::info!(
                "Edit: committed region {} as '{}' (class {}, confidence {:.2})",
                index,
                label,
                class_index,
                confidence
            );
            Some(index)
        } else {
            None
        }
    }

    /// Drop the buffer without touching any region.
    pub fn cancel(&mut self) -> bool {
        let was_editing = self.editing_index().is_some();
        if was_editing {
            log::debug!("Edit: cancelled");
        }
        self.state = EditState::Idle;
        was_editing
    }

    /// React to removal of the region at `removed`.
    ///
    /// A marker on the removed region or on any region after it (whose index
    /// just shifted) is cleared. Markers before it are still valid.
    pub fn region_removed(&mut self, removed: usize) -> bool {
        match self.editing_index() {
            Some(index) if index >= removed => {
                log::debug!("Edit: cleared marker {} after removal of {}", index, removed);
                self.state = EditState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Forget everything, e.g. when the collection is reloaded.
    pub fn reset(&mut self) {
        self.state = EditState::Idle;
    }
}
