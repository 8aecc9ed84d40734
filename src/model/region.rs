//! Region data model: one labeled rectangle in natural image coordinates.

use crate::constants::MIN_REGION_EXTENT;
use crate::geometry::Rect;
use crate::model::catalog::ClassCatalog;

/// A detected or user-drawn region of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    /// Finding name, a member of the class catalog once edited.
    pub label: String,
    /// Model or user confidence in `[0, 1]`.
    pub confidence: f64,
    /// Drawn by the user during this session.
    pub is_new: bool,
    /// Touched since it was loaded or created. Never reset.
    pub is_modified: bool,
}

impl Region {
    /// Create a region as it arrives from the prediction source.
    pub fn loaded(
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
        label: impl Into<String>,
        confidence: f64,
    ) -> Self {
        let mut region = Self {
            xmin,
            ymin,
            xmax,
            ymax,
            label: label.into(),
            confidence: clamp_confidence(confidence),
            is_new: false,
            is_modified: false,
        };
        region.normalize();
        region
    }

    /// Create a region from a user draw gesture (natural-space rectangle).
    pub fn drawn(rect: Rect, label: impl Into<String>, confidence: f64) -> Self {
        let mut region = Self {
            xmin: rect.x,
            ymin: rect.y,
            xmax: rect.right(),
            ymax: rect.bottom(),
            label: label.into(),
            confidence: clamp_confidence(confidence),
            is_new: true,
            is_modified: true,
        };
        region.normalize();
        region
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Natural-space rectangle of this region.
    pub fn rect(&self) -> Rect {
        Rect::new(self.xmin, self.ymin, self.width(), self.height())
    }

    /// Catalog position of the current label.
    ///
    /// Derived on every call so it can never drift from `label`.
    pub fn class_index(&self) -> Option<usize> {
        ClassCatalog::builtin().index_of(&self.label)
    }

    /// Merge a patch into this region and mark it modified.
    pub fn apply(&mut self, patch: &RegionPatch) {
        if let Some(v) = patch.xmin {
            self.xmin = v;
        }
        if let Some(v) = patch.ymin {
            self.ymin = v;
        }
        if let Some(v) = patch.xmax {
            self.xmax = v;
        }
        if let Some(v) = patch.ymax {
            self.ymax = v;
        }
        if let Some(label) = &patch.label {
            self.label = label.clone();
        }
        if let Some(confidence) = patch.confidence {
            self.confidence = clamp_confidence(confidence);
        }
        self.normalize();
        self.is_modified = true;
    }

    /// Swap inverted edges and widen collapsed ones, so that
    /// `xmax - xmin >= MIN_REGION_EXTENT` and likewise for y.
    fn normalize(&mut self) {
        if self.xmin > self.xmax {
            std::mem::swap(&mut self.xmin, &mut self.xmax);
        }
        if self.ymin > self.ymax {
            std::mem::swap(&mut self.ymin, &mut self.ymax);
        }
        if self.xmax - self.xmin < MIN_REGION_EXTENT {
            self.xmax = self.xmin + MIN_REGION_EXTENT;
        }
        if self.ymax - self.ymin < MIN_REGION_EXTENT {
            self.ymax = self.ymin + MIN_REGION_EXTENT;
        }
    }
}

/// A partial update to a region. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPatch {
    pub xmin: Option<f64>,
    pub ymin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymax: Option<f64>,
    pub label: Option<String>,
    pub confidence: Option<f64>,
}

impl RegionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch replacing all four edges with those of `rect`.
    pub fn bounds(rect: Rect) -> Self {
        Self {
            xmin: Some(rect.x),
            ymin: Some(rect.y),
            xmax: Some(rect.right()),
            ymax: Some(rect.bottom()),
            ..Self::default()
        }
    }

    pub fn xmin(mut self, v: f64) -> Self {
        self.xmin = Some(v);
        self
    }

    pub fn ymin(mut self, v: f64) -> Self {
        self.ymin = Some(v);
        self
    }

    pub fn xmax(mut self, v: f64) -> Self {
        self.xmax = Some(v);
        self
    }

    pub fn ymax(mut self, v: f64) -> Self {
        self.ymax = Some(v);
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
