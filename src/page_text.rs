use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_16BE;
use lopdf::Document;
use lopdf::Object;
use lopdf::ObjectId;
use lopdf::content::Content;

use crate::error::ConvertError;
use crate::model::{Rect, TextRun};

/// Estimated glyph advance as a fraction of the font size. Run widths are
/// approximations; only vertical placement is tracked exactly.
const GLYPH_WIDTH_RATIO: f64 = 0.5;

/// Positioned page text, the seam to the PDF text capability. Pages are
/// 1-based and traversed strictly forward by the callers in this crate.
pub trait PageText {
    fn page_count(&self) -> u32;

    /// Full page rectangle in top-left coordinates.
    fn page_bounds(&self, page: u32) -> Result<Rect, ConvertError>;

    /// Raw glyph runs for one page, not yet joined into words.
    fn glyph_runs(&self, page: u32) -> Result<Vec<TextRun>, ConvertError>;
}

pub struct PdfPages {
    document: Document,
    pages: BTreeMap<u32, ObjectId>,
}

impl PdfPages {
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        Ok(Self::new(Document::load(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConvertError> {
        Ok(Self::new(Document::load_mem(bytes)?))
    }

    fn new(document: Document) -> Self {
        let pages = document.get_pages();
        Self { document, pages }
    }

    fn page_id(&self, page: u32) -> Result<ObjectId, ConvertError> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(ConvertError::PdfLoad(lopdf::Error::PageNumberNotFound(page)))
    }

    fn media_box(&self, page_id: ObjectId) -> (f64, f64) {
        let mut id = page_id;
        for _ in 0..8 {
            let Ok(dict) = self.document.get_dictionary(id) else {
                break;
            };
            if let Ok(object) = dict.get(b"MediaBox")
                && let Some(edges) = media_box_edges(&self.document, object)
            {
                return edges;
            }
            match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => id = parent,
                Err(_) => break,
            }
        }
        (612.0, 792.0)
    }
}

impl PageText for PdfPages {
    fn page_count(&self) -> u32 {
        u32::try_from(self.pages.len()).unwrap_or(u32::MAX)
    }

    fn page_bounds(&self, page: u32) -> Result<Rect, ConvertError> {
        let page_id = self.page_id(page)?;
        let (width, height) = self.media_box(page_id);
        Ok(Rect {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: height,
        })
    }

    fn glyph_runs(&self, page: u32) -> Result<Vec<TextRun>, ConvertError> {
        let page_id = self.page_id(page)?;
        let (_, height) = self.media_box(page_id);
        Ok(collect_runs(&self.document, page_id, height))
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}

fn media_box_edges(document: &Document, object: &Object) -> Option<(f64, f64)> {
    let object = match object {
        Object::Reference(id) => document.get_object(*id).ok()?,
        other => other,
    };
    let Object::Array(values) = object else {
        return None;
    };
    if values.len() != 4 {
        return None;
    }
    let edges = values.iter().map(number).collect::<Option<Vec<_>>>()?;
    Some(((edges[2] - edges[0]).abs(), (edges[3] - edges[1]).abs()))
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let replacement = text.matches('\u{FFFD}').count();
    replacement * 8 > total
}

fn decode_run(encoding: Option<&str>, bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) && bytes.len() > 2 {
        let (text, had_errors) = UTF_16BE.decode_without_bom_handling(&bytes[2..]);
        if !had_errors && !text.is_empty() {
            return text.into_owned();
        }
    }

    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    if let Some(name) = encoding {
        let lower = name.to_ascii_lowercase();
        if lower.contains("utf16")
            || lower.contains("ucs2")
            || lower.contains("identity-h")
            || lower.contains("unicode")
        {
            let (text, had_errors) = UTF_16BE.decode_without_bom_handling(bytes);
            if !had_errors && !text.is_empty() {
                return text.into_owned();
            }
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

fn push_run(
    runs: &mut Vec<TextRun>,
    text: String,
    x: &mut f64,
    y: f64,
    size: f64,
    page_height: f64,
) {
    let width = text.chars().count() as f64 * size * GLYPH_WIDTH_RATIO;
    if !text.trim().is_empty() {
        runs.push(TextRun {
            rect: Rect {
                left: *x,
                top: page_height - y - size,
                right: *x + width,
                bottom: page_height - y,
            },
            text,
        });
    }
    *x += width;
}

/// Walks the content stream tracking the text line matrix (Tm/Td/TD/T*/TL)
/// and the active font, emitting one run per shown string.
fn collect_runs(document: &Document, page_id: ObjectId, page_height: f64) -> Vec<TextRun> {
    let Ok(raw_content) = document.get_page_content(page_id) else {
        return Vec::new();
    };
    let Ok(content) = Content::decode(&raw_content) else {
        return Vec::new();
    };
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut runs = Vec::new();
    let mut encoding = None;
    let mut size = 12.0_f64;
    let mut scale = 1.0_f64;
    let mut leading = 0.0_f64;
    let (mut x, mut y) = (0.0_f64, 0.0_f64);
    let (mut line_x, mut line_y) = (0.0_f64, 0.0_f64);

    for operation in content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => {
                x = 0.0;
                y = 0.0;
                line_x = 0.0;
                line_y = 0.0;
                scale = 1.0;
            }
            "Tf" => {
                if let Some(font_name) = operands.first().and_then(|operand| operand.as_name().ok())
                {
                    encoding = encodings.get(font_name).copied();
                }
                if let Some(value) = operands.get(1).and_then(number) {
                    size = value;
                }
            }
            "TL" => {
                if let Some(value) = operands.first().and_then(number) {
                    leading = value;
                }
            }
            "Td" | "TD" => {
                let tx = operands.first().and_then(number).unwrap_or(0.0);
                let ty = operands.get(1).and_then(number).unwrap_or(0.0);
                if operation.operator == "TD" {
                    leading = -ty;
                }
                line_x += tx;
                line_y += ty;
                x = line_x;
                y = line_y;
            }
            "Tm" => {
                if let Some(value) = operands.get(3).and_then(number)
                    && value != 0.0
                {
                    scale = value.abs();
                }
                line_x = operands.get(4).and_then(number).unwrap_or(0.0);
                line_y = operands.get(5).and_then(number).unwrap_or(0.0);
                x = line_x;
                y = line_y;
            }
            "T*" => {
                line_y -= leading;
                x = line_x;
                y = line_y;
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = decode_run(encoding, bytes);
                    push_run(&mut runs, text, &mut x, y, size * scale, page_height);
                }
            }
            "'" | "\"" => {
                line_y -= leading;
                x = line_x;
                y = line_y;
                let text_operand = if operation.operator == "'" {
                    operands.first()
                } else {
                    operands.get(2)
                };
                if let Some(Object::String(bytes, _)) = text_operand {
                    let text = decode_run(encoding, bytes);
                    push_run(&mut runs, text, &mut x, y, size * scale, page_height);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                let text = decode_run(encoding, bytes);
                                push_run(&mut runs, text, &mut x, y, size * scale, page_height);
                            }
                            other => {
                                if let Some(adjustment) = number(other) {
                                    x -= adjustment / 1000.0 * size * scale;
                                }
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    runs
}
