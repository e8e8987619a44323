//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the handful of PDF operations the
//! pipeline needs, isolating lopdf from glyph interpretation, table
//! detection and image extraction.

use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Indirect object identifier of an image XObject.
pub type ObjectRef = (u32, u16);

/// Page bounds from the (possibly inherited) `/MediaBox`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl MediaBox {
    /// Create a media box from its corner coordinates, normalizing order.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }
    }

    /// Page height in points.
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Page width in points.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }
}

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Build an operation from an operator and operands.
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }
}

/// `/DecodeParms` entries relevant to Flate predictors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub predictor: i64,
    pub colors: i64,
    pub bits_per_component: i64,
    pub columns: i64,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
        }
    }
}

/// An image XObject as stored in the file, before any decoding.
#[derive(Debug, Clone)]
pub struct RawImage {
    /// Indirect object id; identical ids are the same embedded image
    pub id: ObjectRef,
    /// Width in source pixels
    pub width: Option<u32>,
    /// Height in source pixels
    pub height: Option<u32>,
    /// Filter chain, outermost first (e.g., ["FlateDecode"])
    pub filters: Vec<String>,
    /// Color space family name (e.g., "DeviceRGB", "ICCBased")
    pub color_space: Option<String>,
    /// Bits per component
    pub bits_per_component: Option<u8>,
    /// Predictor parameters for Flate streams
    pub decode_params: Option<DecodeParams>,
    /// Encoded stream bytes
    pub data: Vec<u8>,
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, geometry, font info, content
/// stream decoding, text decoding and image enumeration without exposing
/// any concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return the page's media box, if one is set on the page or an ancestor.
    fn media_box(&self, page: PageId) -> Option<MediaBox>;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Return the image XObjects reachable from the page's resources,
    /// in resource order. The same object may be listed more than once.
    fn page_images(&self, page: PageId) -> Result<Vec<RawImage>>;
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Helper: extract a number from a [`PdfValue`].
pub fn get_number_from_value(val: &PdfValue) -> Option<f32> {
    match val {
        PdfValue::Integer(i) => Some(*i as f32),
        PdfValue::Real(r) => Some(*r),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend: the lopdf-backed implementation
// ---------------------------------------------------------------------------

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

/// Form XObjects may nest; stop following them past this depth.
const MAX_FORM_DEPTH: usize = 8;

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Resolve an object that may be a reference.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).ok(),
            other => Some(other),
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(obj).and_then(|o| o.as_dict().ok())
    }

    /// Look up a page attribute, following `/Parent` for inheritable keys.
    fn inherited<'a>(&'a self, page: PageId, key: &[u8]) -> Option<&'a Object> {
        let mut current = self.doc.get_dictionary(page).ok();
        let mut seen = HashSet::new();
        while let Some(dict) = current {
            if let Ok(value) = dict.get(key) {
                return self.resolve(value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            if !seen.insert(parent) {
                return None;
            }
            current = self.doc.get_dictionary(parent).ok();
        }
        None
    }

    /// Collect image XObjects from a resource dictionary, descending into forms.
    fn collect_images(
        &self,
        resources: &Dictionary,
        depth: usize,
        visited_forms: &mut HashSet<ObjectId>,
        out: &mut Vec<RawImage>,
    ) {
        let Some(xobjects) = resources
            .get(b"XObject")
            .ok()
            .and_then(|o| self.resolve_dict(o))
        else {
            return;
        };

        for (_, obj) in xobjects.iter() {
            let Ok(id) = obj.as_reference() else {
                continue;
            };
            let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
                continue;
            };
            let dict = &stream.dict;
            match dict.get(b"Subtype").and_then(|s| s.as_name()) {
                Ok(b"Image") => out.push(self.raw_image(id, stream)),
                Ok(b"Form") if depth < MAX_FORM_DEPTH && visited_forms.insert(id) => {
                    if let Some(form_resources) =
                        dict.get(b"Resources").ok().and_then(|o| self.resolve_dict(o))
                    {
                        self.collect_images(form_resources, depth + 1, visited_forms, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn raw_image(&self, id: ObjectId, stream: &lopdf::Stream) -> RawImage {
        let dict = &stream.dict;
        let int = |key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|o| self.resolve(o))
                .and_then(|o| o.as_i64().ok())
        };

        let filters = match dict.get(b"Filter").ok().and_then(|o| self.resolve(o)) {
            Some(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
            Some(Object::Array(arr)) => arr
                .iter()
                .filter_map(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .collect(),
            _ => Vec::new(),
        };

        let color_space = match dict.get(b"ColorSpace").ok().and_then(|o| self.resolve(o)) {
            Some(Object::Name(n)) => Some(String::from_utf8_lossy(n).to_string()),
            Some(Object::Array(arr)) => arr
                .first()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string()),
            _ => None,
        };

        let decode_params = dict
            .get(b"DecodeParms")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| match o {
                Object::Dictionary(d) => Some(d),
                Object::Array(arr) => arr.iter().find_map(|p| self.resolve_dict(p)),
                _ => None,
            })
            .map(|d| {
                let get = |key: &[u8], default: i64| {
                    d.get(key).and_then(|o| o.as_i64()).unwrap_or(default)
                };
                let defaults = DecodeParams::default();
                DecodeParams {
                    predictor: get(b"Predictor", defaults.predictor),
                    colors: get(b"Colors", defaults.colors),
                    bits_per_component: get(b"BitsPerComponent", defaults.bits_per_component),
                    columns: get(b"Columns", defaults.columns),
                }
            });

        RawImage {
            id: (id.0, id.1),
            width: int(b"Width").and_then(|w| u32::try_from(w).ok()),
            height: int(b"Height").and_then(|h| u32::try_from(h).ok()),
            filters,
            color_space,
            bits_per_component: int(b"BitsPerComponent").and_then(|b| u8::try_from(b).ok()),
            decode_params,
            data: stream.content.clone(),
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: PageId) -> Option<MediaBox> {
        let array = self.inherited(page, b"MediaBox")?.as_array().ok()?;
        let coords: Vec<f32> = array
            .iter()
            .filter_map(|o| self.resolve(o))
            .filter_map(|o| o.as_float().ok())
            .collect();
        match coords.as_slice() {
            [x0, y0, x1, y1, ..] => Some(MediaBox::new(*x0, *y0, *x1, *y1)),
            _ => None,
        }
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::Decode(e.to_string()))?;

        let mut result = Vec::with_capacity(lopdf_fonts.len());
        for (name, font_dict) in &lopdf_fonts {
            let base_font = font_dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            result.push(BackendFontInfo {
                name: name.clone(),
                base_font,
            });
        }
        Ok(result)
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::Decode(e.to_string()))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without /Contents is blank.
            Err(_) => return Ok(Vec::new()),
        };

        let stream_bytes = |s: &lopdf::Stream| {
            if s.dict.has(b"Filter") {
                s.decompressed_content()
                    .map_err(|e| Error::Decode(e.to_string()))
            } else {
                Ok(s.content.clone())
            }
        };

        match self.resolve(contents) {
            Some(Object::Stream(s)) => stream_bytes(s),
            Some(Object::Array(arr)) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Some(Object::Stream(s)) = self.resolve(obj) {
                        content.extend_from_slice(&stream_bytes(s)?);
                        content.push(b'\n');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::Decode("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::Decode(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn page_images(&self, page: PageId) -> Result<Vec<RawImage>> {
        let mut images = Vec::new();
        if let Some(resources) = self
            .inherited(page, b"Resources")
            .and_then(|o| o.as_dict().ok())
        {
            let mut visited_forms = HashSet::new();
            self.collect_images(resources, 0, &mut visited_forms, &mut images);
        }
        Ok(images)
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}
