//! YOLO TXT format implementation.
//!
//! One text file per image, one `class cx cy w h` line per region, with
//! coordinates normalized by the natural image size. A `classes.txt` listing
//! the class catalog is written next to the label file.

use std::path::Path;

use crate::format::error::FormatError;
use crate::format::traits::{
    AnnotatedImage, ExportResult, FormatWarning, ImportOptions, RegionFormat,
};
use crate::geometry::Size;
use crate::model::{ClassCatalog, Region};

/// YOLO TXT format.
///
/// Regions whose label is outside the class catalog cannot be given a class
/// id and are skipped with a warning. Export and import both need the
/// natural image size.
pub struct YoloFormat;

impl RegionFormat for YoloFormat {
    fn id(&self) -> &'static str {
        "yolo"
    }

    fn display_name(&self) -> &'static str {
        "YOLO (TXT)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    fn requires_dimensions(&self) -> bool {
        true
    }

    fn export(&self, image: &AnnotatedImage, path: &Path) -> Result<ExportResult, FormatError> {
        log::info!("Exporting YOLO labels to {:?}", path);

        let size = image
            .usable_natural()
            .ok_or_else(|| FormatError::missing_dimensions(self.id(), &image.image_name))?;

        let output_dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = output_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut result = ExportResult::new();

        let classes_path = output_dir
            .map(|dir| dir.join("classes.txt"))
            .unwrap_or_else(|| "classes.txt".into());
        std::fs::write(&classes_path, ClassCatalog::builtin().names().join("\n"))?;
        result.files_created.push(classes_path);

        let mut lines = Vec::new();
        for (index, region) in image.regions.iter().enumerate() {
            match format_line(region, size) {
                Some(line) => {
                    lines.push(line);
                    result.regions_exported += 1;
                }
                None => {
                    log::warn!(
                        "Skipping region {} with label '{}' outside the class catalog",
                        index,
                        region.label
                    );
                    result.add_warning(
                        FormatWarning::warning(format!(
                            "Skipped region with unknown label '{}'",
                            region.label
                        ))
                        .with_region(index),
                    );
                }
            }
        }

        std::fs::write(path, lines.join("\n"))?;
        result.files_created.push(path.to_path_buf());

        log::info!(
            "Exported {} regions ({} warnings)",
            result.regions_exported,
            result.warnings.len()
        );
        Ok(result)
    }

    fn import(&self, path: &Path, options: &ImportOptions) -> Result<AnnotatedImage, FormatError> {
        log::info!("Importing YOLO labels from {:?}", path);

        let image_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let size = options
            .natural
            .filter(Size::is_usable)
            .ok_or_else(|| FormatError::missing_dimensions(self.id(), &image_name))?;

        let content = std::fs::read_to_string(path)?;
        let mut regions = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_line(line, size) {
                Some(region) => regions.push(region),
                None => log::warn!("Skipping malformed YOLO line {}: '{}'", line_no + 1, line),
            }
        }

        log::info!("Imported {} regions", regions.len());
        Ok(AnnotatedImage::new(image_name, Some(size), regions))
    }
}

/// Format one region as a YOLO line, or `None` if it has no class id.
pub(crate) fn format_line(region: &Region, size: Size) -> Option<String> {
    let class_index = region.class_index()?;

    let cx = ((region.xmin + region.xmax) / (2.0 * size.width)).clamp(0.0, 1.0);
    let cy = ((region.ymin + region.ymax) / (2.0 * size.height)).clamp(0.0, 1.0);
    let w = (region.width() / size.width).clamp(0.0, 1.0);
    let h = (region.height() / size.height).clamp(0.0, 1.0);

    Some(format!("{} {:.6} {:.6} {:.6} {:.6}", class_index, cx, cy, w, h))
}

/// Parse a YOLO line back into a natural-space region.
fn parse_line(line: &str, size: Size) -> Option<Region> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    let class_index: usize = parts[0].parse().ok()?;
    let cx: f64 = parts[1].parse().ok()?;
    let cy: f64 = parts[2].parse().ok()?;
    let w: f64 = parts[3].parse().ok()?;
    let h: f64 = parts[4].parse().ok()?;
    let label = ClassCatalog::builtin().name_of(class_index)?;

    Some(Region::loaded(
        (cx - w / 2.0) * size.width,
        (cy - h / 2.0) * size.height,
        (cx + w / 2.0) * size.width,
        (cy + h / 2.0) * size.height,
        label,
        1.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let region = parse_line("6 0.5 0.5 0.2 0.4", Size::new(100.0, 50.0)).expect("parse");
        assert_eq!(region.label, "Glands");
        assert!((region.xmin - 40.0).abs() < 1e-9);
        assert!((region.ymin - 15.0).abs() < 1e-9);
        assert!((region.xmax - 60.0).abs() < 1e-9);
        assert!((region.ymax - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_line_rejects_unknown_class() {
        assert!(parse_line("42 0.5 0.5 0.2 0.4", Size::new(100.0, 50.0)).is_none());
        assert!(parse_line("0 0.5 0.5", Size::new(100.0, 50.0)).is_none());
    }
}
