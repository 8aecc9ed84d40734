//! Format registry for discovering and accessing region formats.

use std::collections::HashMap;

use crate::format::error::FormatError;
use crate::format::formats::{JsonFormat, PascalVocFormat, YoloFormat};
use crate::format::traits::RegionFormat;

/// Registry of available region formats.
///
/// All built-in formats are registered on creation.
pub struct FormatRegistry {
    formats: HashMap<&'static str, Box<dyn RegionFormat>>,
}

impl FormatRegistry {
    /// Create a new registry with all built-in formats registered.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: HashMap::new(),
        };

        registry.register(Box::new(JsonFormat));
        registry.register(Box::new(YoloFormat));
        registry.register(Box::new(PascalVocFormat));

        registry
    }

    /// Register a format implementation.
    pub fn register(&mut self, format: Box<dyn RegionFormat>) {
        self.formats.insert(format.id(), format);
    }

    /// Get a format by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn RegionFormat> {
        self.formats.get(id).map(|f| f.as_ref())
    }

    /// Like [`get`](Self::get), but an unknown ID is an error.
    pub fn require(&self, id: &str) -> Result<&dyn RegionFormat, FormatError> {
        self.get(id)
            .ok_or_else(|| FormatError::UnknownFormat(id.to_string()))
    }

    /// Find formats by file extension.
    pub fn by_extension(&self, ext: &str) -> Vec<&dyn RegionFormat> {
        let ext = ext.trim_start_matches('.');
        self.formats
            .values()
            .filter(|f| f.extensions().iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .map(|f| f.as_ref())
            .collect()
    }

    /// Get all format IDs, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.formats.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
