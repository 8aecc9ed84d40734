//! Data models for the annotation editor.

mod case;
mod catalog;
mod collection;
mod region;

pub use case::{CaseContext, CaseStatus, Workflow};
pub use catalog::{CLASS_NAMES, ClassCatalog};
pub use collection::{RegionCollection, RegionKey};
pub use region::{Region, RegionPatch};
