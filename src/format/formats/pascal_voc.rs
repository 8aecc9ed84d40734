//! Pascal VOC XML format implementation.
//!
//! One XML file per image with a `<size>` block and one `<object>` per
//! region. Box corners are written as whole pixels.

use std::io::Write;
use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::format::error::FormatError;
use crate::format::traits::{AnnotatedImage, ExportResult, ImportOptions, RegionFormat};
use crate::geometry::Size;
use crate::model::Region;

/// Pascal VOC XML format.
pub struct PascalVocFormat;

impl RegionFormat for PascalVocFormat {
    fn id(&self) -> &'static str {
        "voc"
    }

    fn display_name(&self) -> &'static str {
        "Pascal VOC (XML)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["xml"]
    }

    fn requires_dimensions(&self) -> bool {
        false
    }

    fn export(&self, image: &AnnotatedImage, path: &Path) -> Result<ExportResult, FormatError> {
        log::info!("Exporting Pascal VOC annotation to {:?}", path);

        let mut result = ExportResult::new();
        let size = image.usable_natural();
        if size.is_none() {
            log::warn!("Image '{}' has no dimensions, using 0x0", image.image_name);
        }

        let xml = build_xml(image, size.unwrap_or_default())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, xml)?;

        result.regions_exported = image.regions.len();
        result.files_created.push(path.to_path_buf());
        Ok(result)
    }

    fn import(&self, path: &Path, options: &ImportOptions) -> Result<AnnotatedImage, FormatError> {
        log::info!("Importing Pascal VOC annotation from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let mut image = parse_xml(&content)?;
        if image.image_name.is_empty() {
            image.image_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
        }
        if image.natural.is_none() {
            image.natural = options.natural;
        }

        log::info!("Imported {} regions", image.regions.len());
        Ok(image)
    }
}

fn build_xml(image: &AnnotatedImage, size: Size) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    start(&mut writer, "annotation")?;

    write_text_element(&mut writer, "filename", &image.image_name)?;

    start(&mut writer, "size")?;
    write_text_element(&mut writer, "width", &pixels(size.width).to_string())?;
    write_text_element(&mut writer, "height", &pixels(size.height).to_string())?;
    write_text_element(&mut writer, "depth", "3")?;
    end(&mut writer, "size")?;

    write_text_element(&mut writer, "segmented", "0")?;

    for region in &image.regions {
        start(&mut writer, "object")?;
        write_text_element(&mut writer, "name", &region.label)?;
        write_text_element(&mut writer, "pose", "Unspecified")?;
        write_text_element(&mut writer, "truncated", "0")?;
        write_text_element(&mut writer, "difficult", "0")?;

        start(&mut writer, "bndbox")?;
        write_text_element(&mut writer, "xmin", &pixels(region.xmin).to_string())?;
        write_text_element(&mut writer, "ymin", &pixels(region.ymin).to_string())?;
        write_text_element(&mut writer, "xmax", &pixels(region.xmax).to_string())?;
        write_text_element(&mut writer, "ymax", &pixels(region.ymax).to_string())?;
        end(&mut writer, "bndbox")?;

        end(&mut writer, "object")?;
    }

    end(&mut writer, "annotation")?;

    String::from_utf8(writer.into_inner())
        .map_err(|_| FormatError::invalid_format("Invalid UTF-8 in XML"))
}

fn pixels(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

fn start<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))
}

fn end<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(|e| FormatError::Xml(e.into()))
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), FormatError> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(|e| FormatError::Xml(e.into()))?;
    end(writer, name)
}

#[derive(Default)]
struct ObjectDraft {
    name: String,
    xmin: f64,
    ymin: f64,
    xmax: f64,
    ymax: f64,
}

fn parse_xml(content: &str) -> Result<AnnotatedImage, FormatError> {
    use quick_xml::Reader;

    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut image = AnnotatedImage::default();
    let (mut width, mut height) = (0.0, 0.0);

    let mut current_element = String::new();
    let mut in_size = false;
    let mut in_bndbox = false;
    let mut object: Option<ObjectDraft> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match name.as_str() {
                    "object" => object = Some(ObjectDraft::default()),
                    "bndbox" => in_bndbox = true,
                    "size" => in_size = true,
                    _ => {}
                }
                current_element = name;
            }
            Ok(Event::End(ref e)) => {
                match e.name().as_ref() {
                    b"object" => {
                        if let Some(draft) = object.take() {
                            let empty = draft.name.is_empty()
                                || draft.xmax <= draft.xmin
                                || draft.ymax <= draft.ymin;
                            if empty {
                                log::warn!("Skipping VOC object '{}' with empty box", draft.name);
                            } else {
                                image.regions.push(Region::loaded(
                                    draft.xmin,
                                    draft.ymin,
                                    draft.xmax,
                                    draft.ymax,
                                    draft.name,
                                    1.0,
                                ));
                            }
                        }
                    }
                    b"bndbox" => in_bndbox = false,
                    b"size" => in_size = false,
                    _ => {}
                }
                current_element.clear();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                let number = || text.trim().parse::<f64>().unwrap_or(0.0);

                if in_size {
                    match current_element.as_str() {
                        "width" => width = number(),
                        "height" => height = number(),
                        _ => {}
                    }
                } else if let Some(draft) = object.as_mut() {
                    if in_bndbox {
                        match current_element.as_str() {
                            "xmin" => draft.xmin = number(),
                            "ymin" => draft.ymin = number(),
                            "xmax" => draft.xmax = number(),
                            "ymax" => draft.ymax = number(),
                            _ => {}
                        }
                    } else if current_element == "name" {
                        draft.name = text.clone();
                    }
                } else if current_element == "filename" {
                    image.image_name = text.clone();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(FormatError::Xml(e)),
            _ => {}
        }
    }

    let size = Size::new(width, height);
    if size.is_usable() {
        image.natural = Some(size);
    }
    Ok(image)
}
