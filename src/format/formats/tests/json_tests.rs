//! Tests for the feedback JSON format.

use super::scratch_dir;
use crate::format::formats::JsonFormat;
use crate::format::traits::{AnnotatedImage, ImportOptions, RegionFormat};
use crate::geometry::{Rect, Size};
use crate::model::{CaseStatus, Region};

fn image() -> AnnotatedImage {
    let mut moved = Region::loaded(10.0, 10.0, 50.0, 50.0, "Nodular BCC", 0.8);
    moved.is_modified = true;
    AnnotatedImage::new(
        "case_17",
        Some(Size::new(640.0, 480.0)),
        vec![
            moved,
            Region::drawn(Rect::new(2.5, 2.5, 17.5, 17.5), "Nodular BCC", 0.5),
            Region::loaded(100.0, 100.0, 200.0, 150.0, "Unlisted finding", 0.3),
        ],
    )
}

#[test]
fn test_json_export_payload_shape() {
    let dir = scratch_dir("json_export");
    let path = dir.join("case_17.json");

    let result = JsonFormat.export(&image(), &path).expect("export");
    assert_eq!(result.regions_exported, 3);
    assert_eq!(result.files_created, vec![path.clone()]);
    assert_eq!(result.warnings.len(), 1, "unlisted label is reported");
    assert_eq!(result.warnings[0].region_index, Some(2));

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    let predictions = value["predictions"].as_array().expect("array");
    assert_eq!(predictions[0]["isModified"], true);
    assert_eq!(predictions[0]["isNew"], false);
    assert_eq!(predictions[1]["isNew"], true);
    assert_eq!(predictions[1]["class"], 0);
    assert!(predictions[2].get("class").is_none());
    assert!(value.get("feedback").is_none());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_json_import_prediction_list() {
    let dir = scratch_dir("json_list");
    let path = dir.join("lesion.json");
    std::fs::write(
        &path,
        r#"[{"xmin":1,"ymin":2,"xmax":3,"ymax":4,"name":"Glands","confidence":0.9}]"#,
    )
    .expect("write");

    let image = JsonFormat
        .import(&path, &ImportOptions::new())
        .expect("import");
    assert_eq!(image.image_name, "lesion");
    assert_eq!(image.natural, None);
    assert_eq!(image.regions.len(), 1);
    assert_eq!(image.regions[0].class_index(), Some(6));
    assert!(!image.regions[0].is_modified);
    assert_eq!(image.status, None);
    assert_eq!(image.notes, None);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_json_import_review_case() {
    let dir = scratch_dir("json_case");
    let path = dir.join("case.json");
    std::fs::write(
        &path,
        r#"{"predictions":[{"xmin":5,"ymin":5,"xmax":9,"ymax":9,"name":"Epidermis","confidence":0.2}],
           "status":"pending","review_notes":null}"#,
    )
    .expect("write");

    let image = JsonFormat
        .import(&path, &ImportOptions::new().natural(Size::new(10.0, 10.0)))
        .expect("import");
    assert_eq!(image.regions.len(), 1);
    assert_eq!(image.regions[0].label, "Epidermis");
    assert_eq!(image.natural, Some(Size::new(10.0, 10.0)));
    assert_eq!(image.status, Some(CaseStatus::Pending));
    assert_eq!(image.notes, None);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_json_import_keeps_stored_status_and_notes() {
    let dir = scratch_dir("json_reviewed");
    let path = dir.join("reviewed.json");
    std::fs::write(
        &path,
        r#"{"predictions":[],"status":"reviewed","review_notes":"done"}"#,
    )
    .expect("write");

    let image = JsonFormat
        .import(&path, &ImportOptions::new())
        .expect("import");
    assert!(image.regions.is_empty());
    assert_eq!(image.status, Some(CaseStatus::Reviewed));
    assert_eq!(image.notes.as_deref(), Some("done"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_json_import_rejects_garbage() {
    let dir = scratch_dir("json_garbage");
    let path = dir.join("bad.json");
    std::fs::write(&path, "{not json").expect("write");
    assert!(JsonFormat.import(&path, &ImportOptions::new()).is_err());
    let _ = std::fs::remove_dir_all(&dir);
}
