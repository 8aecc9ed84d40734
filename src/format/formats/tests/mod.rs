//! File-level tests for the region formats.

mod json_tests;

use std::path::PathBuf;

/// Fresh scratch directory under the system temp dir.
pub(super) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dermannot_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}
