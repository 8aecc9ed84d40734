//! Trait definitions for region format implementations.

use std::path::{Path, PathBuf};

use crate::format::error::FormatError;
use crate::geometry::Size;
use crate::model::{CaseStatus, Region};

/// Trait for region import/export implementations.
///
/// Each format (submission JSON, YOLO, Pascal VOC) implements this trait to
/// convert between the editor's regions and one file per image.
pub trait RegionFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "json", "yolo", "voc").
    fn id(&self) -> &'static str;

    /// Human-readable name for display.
    fn display_name(&self) -> &'static str;

    /// File extensions this format uses.
    fn extensions(&self) -> &[&'static str];

    /// Whether export needs the natural image size.
    fn requires_dimensions(&self) -> bool;

    /// Export one image's regions to `path`.
    fn export(&self, image: &AnnotatedImage, path: &Path) -> Result<ExportResult, FormatError>;

    /// Import one image's regions from `path`.
    fn import(&self, path: &Path, options: &ImportOptions) -> Result<AnnotatedImage, FormatError>;
}

/// Regions of a single image, with what is known about the image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotatedImage {
    /// File name of the source image.
    pub image_name: String,
    /// Natural pixel size, if known.
    pub natural: Option<Size>,
    pub regions: Vec<Region>,
    /// Status of the stored case the regions came from.
    pub status: Option<CaseStatus>,
    /// Review notes stored with that case.
    pub notes: Option<String>,
}

impl AnnotatedImage {
    pub fn new(image_name: impl Into<String>, natural: Option<Size>, regions: Vec<Region>) -> Self {
        Self {
            image_name: image_name.into(),
            natural,
            regions,
            status: None,
            notes: None,
        }
    }

    /// Attach the stored case context.
    pub fn with_case(mut self, status: CaseStatus, notes: Option<String>) -> Self {
        self.status = Some(status);
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    /// Natural size if it is usable for normalization.
    pub fn usable_natural(&self) -> Option<Size> {
        self.natural.filter(Size::is_usable)
    }
}

/// Options for import operations.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Natural size of the image, for formats that store normalized values.
    pub natural: Option<Size>,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the natural image size.
    pub fn natural(mut self, size: Size) -> Self {
        self.natural = Some(size);
        self
    }
}

/// Result of an export operation.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Number of regions written.
    pub regions_exported: usize,

    /// Warnings generated during export (e.g., skipped regions).
    pub warnings: Vec<FormatWarning>,

    /// Files created during export.
    pub files_created: Vec<PathBuf>,
}

impl ExportResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: FormatWarning) {
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Warning generated during format conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatWarning {
    /// Index of the region this warning relates to (if applicable).
    pub region_index: Option<usize>,

    /// Human-readable warning message.
    pub message: String,

    /// Severity level of the warning.
    pub severity: WarningSeverity,
}

impl FormatWarning {
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            region_index: None,
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    /// Create a warning-level warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    /// Set the region this warning relates to.
    pub fn with_region(mut self, index: usize) -> Self {
        self.region_index = Some(index);
        self
    }
}

/// Severity level for format warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Informational message, not a problem.
    Info,
    /// Something was skipped or modified.
    Warning,
}
