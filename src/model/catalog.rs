//! The fixed, ordered catalog of finding classes.
//!
//! A class is identified by its position in [`CLASS_NAMES`]. The same list
//! backs the label dropdown, the YOLO class index and the `class` field of
//! submitted predictions.

/// Finding classes known to the detection model, in class-index order.
pub const CLASS_NAMES: &[&str] = &[
    "Nodular BCC",
    "Infiltrative BCC",
    "Superficial BCC",
    "Micronodular BCC",
    "Inflamation/Possible BCC",
    "Hair follicle",
    "Glands",
    "Epidermis",
];

/// Read-only view over the class catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassCatalog {
    names: &'static [&'static str],
}

impl ClassCatalog {
    /// The catalog compiled into this build.
    pub const fn builtin() -> Self {
        Self { names: CLASS_NAMES }
    }

    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label used when nothing better is available.
    pub fn default_label(&self) -> &'static str {
        self.names.first().copied().unwrap_or("")
    }

    /// Position of `label` in the catalog.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.names.iter().position(|name| *name == label)
    }

    /// Name at `index`.
    pub fn name_of(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index_of(label).is_some()
    }

    /// Resolve a free-form label to a catalog entry.
    ///
    /// Empty or unknown labels fall back to the first entry.
    pub fn resolve(&self, label: &str) -> (&'static str, usize) {
        match self.index_of(label.trim()) {
            Some(index) => (self.names[index], index),
            None => {
                if !label.trim().is_empty() {
                    log::debug!(
                        "Label '{}' is not in the class catalog, using '{}'",
                        label,
                        self.default_label()
                    );
                }
                (self.default_label(), 0)
            }
        }
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lookup() {
        let catalog = ClassCatalog::builtin();
        assert_eq!(catalog.len(), 8);
        assert_eq!(catalog.index_of("Nodular BCC"), Some(0));
        assert_eq!(catalog.index_of("Epidermis"), Some(7));
        assert_eq!(catalog.index_of("epidermis"), None);
        assert_eq!(catalog.name_of(5), Some("Hair follicle"));
        assert_eq!(catalog.name_of(8), None);
    }

    #[test]
    fn test_resolve_falls_back_to_first_entry() {
        let catalog = ClassCatalog::builtin();
        assert_eq!(catalog.resolve(""), ("Nodular BCC", 0));
        assert_eq!(catalog.resolve("New Finding"), ("Nodular BCC", 0));
        assert_eq!(catalog.resolve("Glands"), ("Glands", 6));
    }
}
