//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the handful of PDF operations the
//! splitter needs, isolating the concrete PDF library (lopdf) from outline
//! resolution, text indexing and table detection.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::detect;
use crate::error::{Error, Result};
use crate::model::{Bookmark, PageBox};

/// Maximum outline nesting followed before the walk gives up on a branch.
const MAX_OUTLINE_DEPTH: usize = 64;

/// Maximum `/Parent` hops when looking up inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    /// A string operand that is not shown as text.
    Str(Vec<u8>),
    /// A shown string, already decoded through the current font's encoding.
    Text(String),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    pub fn as_number(&self) -> Option<f32> {
        get_number_from_value(self)
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }
}

/// Abstract interface for PDF document access.
///
/// Page indices are zero-based. Implementations must be shareable across
/// threads because sections are extracted in parallel.
pub trait PdfBackend: Sync {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// The visible page rectangle in user space.
    fn page_box(&self, page_index: usize) -> Result<PageBox>;

    /// Content stream operations of a page.
    ///
    /// Operands of text-showing operators (`Tj`, `TJ`, `'`, `"`) are returned
    /// as [`PdfValue::Text`], decoded with the font selected by `Tf`.
    fn page_operations(&self, page_index: usize) -> Result<Vec<ContentOp>>;

    /// Outline entries in document order (pre-order), with top-down
    /// destination offsets.
    fn bookmarks(&self) -> Result<Vec<Bookmark>>;

    /// Document title from the info dictionary, if any.
    fn title(&self) -> Option<String> {
        None
    }

    /// Check a page index against the page count.
    fn check_page(&self, page_index: usize) -> Result<()> {
        let page_count = self.page_count();
        if page_index >= page_count {
            return Err(Error::PageRange {
                page: page_index + 1,
                page_count,
            });
        }
        Ok(())
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
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
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    page_ids: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load_bytes(&data)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let header = detect::sniff_bytes(data)?;
        log::debug!("Loading {} ({} bytes)", header, data.len());
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    /// Load from a reader.
    pub fn load_reader<R: std::io::Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes(&data)
    }

    /// Wrap an already parsed document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let page_ids = doc.get_pages().into_values().collect();
        Self { doc, page_ids }
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn page_id(&self, page_index: usize) -> Result<ObjectId> {
        self.page_ids
            .get(page_index)
            .copied()
            .ok_or(Error::PageRange {
                page: page_index + 1,
                page_count: self.page_ids.len(),
            })
    }

    fn page_index_of(&self, id: ObjectId) -> Option<usize> {
        self.page_ids.iter().position(|&p| p == id)
    }

    /// Follow a reference, returning the object itself otherwise.
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    /// Look up a page attribute, walking up `/Parent` for inherited values.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(self.resolve(value));
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn page_content(&self, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id)?;
        let contents = match page_dict.get(b"Contents") {
            Ok(obj) => obj,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match self.resolve(contents) {
            Object::Stream(s) => Ok(s.decompressed_content().unwrap_or_else(|_| s.content.clone())),
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Stream(s) = self.resolve(obj) {
                        match s.decompressed_content() {
                            Ok(data) => content.extend_from_slice(&data),
                            Err(_) => content.extend_from_slice(&s.content),
                        }
                        content.push(b' ');
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn walk_outline(
        &self,
        first: ObjectId,
        depth: usize,
        visited: &mut HashSet<ObjectId>,
        out: &mut Vec<Bookmark>,
    ) {
        if depth >= MAX_OUTLINE_DEPTH {
            log::warn!("Outline nesting deeper than {} levels ignored", MAX_OUTLINE_DEPTH);
            return;
        }

        let mut current = Some(first);
        while let Some(id) = current {
            if !visited.insert(id) {
                log::warn!("Outline cycle detected at object {:?}", id);
                break;
            }
            let Ok(item) = self.doc.get_dictionary(id) else {
                break;
            };

            let title = item
                .get(b"Title")
                .ok()
                .map(|t| self.resolve(t))
                .and_then(object_to_string)
                .unwrap_or_default();
            let (page_index, top) = self.item_destination(item);
            let y = match (page_index, top) {
                (Some(p), Some(top)) => Some(self.page_box(p).unwrap_or_default().to_page_y(top)),
                _ => None,
            };

            out.push(Bookmark {
                title,
                depth,
                page_index,
                y,
            });

            if let Ok(Object::Reference(child)) = item.get(b"First") {
                self.walk_outline(*child, depth + 1, visited, out);
            }

            current = match item.get(b"Next") {
                Ok(Object::Reference(next)) => Some(*next),
                _ => None,
            };
        }
    }

    /// Destination of an outline item: `/Dest` first, then a GoTo `/A` action.
    fn item_destination(&self, item: &lopdf::Dictionary) -> (Option<usize>, Option<f32>) {
        if let Ok(dest) = item.get(b"Dest") {
            if let Some(found) = self.resolve_destination(dest, 0) {
                return found;
            }
        }

        if let Ok(action) = item.get(b"A") {
            if let Ok(action) = self.resolve(action).as_dict() {
                let is_goto = matches!(action.get(b"S"), Ok(Object::Name(s)) if s == b"GoTo");
                if is_goto {
                    if let Ok(dest) = action.get(b"D") {
                        if let Some(found) = self.resolve_destination(dest, 0) {
                            return found;
                        }
                    }
                }
            }
        }

        (None, None)
    }

    fn resolve_destination(&self, dest: &Object, hops: usize) -> Option<(Option<usize>, Option<f32>)> {
        if hops > 4 {
            return None;
        }
        match self.resolve(dest) {
            Object::Array(arr) => {
                let page_ref = arr.first()?.as_reference().ok()?;
                Some((self.page_index_of(page_ref), destination_top(arr)))
            }
            Object::Dictionary(d) => self.resolve_destination(d.get(b"D").ok()?, hops + 1),
            Object::String(bytes, _) => {
                let target = self.named_destination(bytes)?;
                self.resolve_destination(target, hops + 1)
            }
            Object::Name(name) => {
                let target = self.named_destination(name)?;
                self.resolve_destination(target, hops + 1)
            }
            _ => None,
        }
    }

    /// Look up a named destination in `/Names /Dests`, then in the legacy
    /// catalog `/Dests` dictionary.
    fn named_destination(&self, name: &[u8]) -> Option<&Object> {
        let catalog = self.doc.catalog().ok()?;

        if let Ok(names) = catalog.get(b"Names") {
            if let Ok(names) = self.resolve(names).as_dict() {
                if let Ok(tree) = names.get(b"Dests") {
                    if let Ok(tree) = self.resolve(tree).as_dict() {
                        if let Some(found) = self.lookup_name_tree(tree, name, 0) {
                            return Some(found);
                        }
                    }
                }
            }
        }

        let dests = self.resolve(catalog.get(b"Dests").ok()?).as_dict().ok()?;
        dests.get(name).ok().map(|d| self.resolve(d))
    }

    fn lookup_name_tree<'a>(
        &'a self,
        node: &'a lopdf::Dictionary,
        name: &[u8],
        depth: usize,
    ) -> Option<&'a Object> {
        if depth > MAX_OUTLINE_DEPTH {
            return None;
        }

        if let Ok(names) = node.get(b"Names") {
            if let Ok(pairs) = self.resolve(names).as_array() {
                for pair in pairs.chunks_exact(2) {
                    if let Object::String(key, _) = self.resolve(&pair[0]) {
                        if key.as_slice() == name {
                            return Some(self.resolve(&pair[1]));
                        }
                    }
                }
            }
        }

        let kids = self.resolve(node.get(b"Kids").ok()?).as_array().ok()?;
        kids.iter()
            .filter_map(|kid| self.resolve(kid).as_dict().ok())
            .find_map(|kid| self.lookup_name_tree(kid, name, depth + 1))
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_box(&self, page_index: usize) -> Result<PageBox> {
        let page_id = self.page_id(page_index)?;
        let rect = self
            .inherited(page_id, b"CropBox")
            .or_else(|| self.inherited(page_id, b"MediaBox"))
            .and_then(|obj| obj.as_array().ok())
            .and_then(|arr| {
                let nums: Vec<f32> = arr.iter().filter_map(object_to_f32).collect();
                (nums.len() == 4).then(|| PageBox::new(nums[0], nums[1], nums[2], nums[3]))
            });

        Ok(match rect {
            Some(rect) if rect.width() > 0.0 && rect.height() > 0.0 => rect,
            _ => {
                log::debug!("Page {} has no usable box, assuming Letter", page_index + 1);
                PageBox::letter()
            }
        })
    }

    fn page_operations(&self, page_index: usize) -> Result<Vec<ContentOp>> {
        let page_id = self.page_id(page_index)?;
        let data = self.page_content(page_id)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let content = lopdf::content::Content::decode(&data)?;

        let fonts = self.doc.get_page_fonts(page_id).unwrap_or_default();
        let encodings: BTreeMap<Vec<u8>, _> = fonts
            .iter()
            .filter_map(|(name, font)| {
                font.get_font_encoding(&self.doc)
                    .ok()
                    .map(|enc| (name.clone(), enc))
            })
            .collect();

        let mut current_font: Option<Vec<u8>> = None;
        let mut ops = Vec::with_capacity(content.operations.len());

        for op in content.operations {
            let decode = |bytes: &[u8]| -> String {
                current_font
                    .as_ref()
                    .and_then(|f| encodings.get(f))
                    .and_then(|enc| LopdfDocument::decode_text(enc, bytes).ok())
                    .unwrap_or_else(|| decode_text_simple(bytes))
            };

            let operands = match op.operator.as_str() {
                "Tj" | "'" | "\"" | "TJ" => op
                    .operands
                    .iter()
                    .map(|o| convert_shown(o, &decode))
                    .collect(),
                _ => op.operands.iter().map(convert_object).collect(),
            };

            if op.operator == "Tf" {
                current_font = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(<[u8]>::to_vec);
            }

            ops.push(ContentOp {
                operator: op.operator,
                operands,
            });
        }

        Ok(ops)
    }

    fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        let catalog = self.doc.catalog()?;
        let Ok(outlines) = catalog.get(b"Outlines") else {
            return Ok(Vec::new());
        };
        let outlines = self
            .resolve(outlines)
            .as_dict()
            .map_err(|_| Error::MalformedOutline("/Outlines is not a dictionary".into()))?;

        let mut out = Vec::new();
        if let Ok(Object::Reference(first)) = outlines.get(b"First") {
            let mut visited = HashSet::new();
            self.walk_outline(*first, 0, &mut visited, &mut out);
        }
        Ok(out)
    }

    fn title(&self) -> Option<String> {
        let info = self.resolve(self.doc.trailer.get(b"Info").ok()?).as_dict().ok()?;
        let title = object_to_string(self.resolve(info.get(b"Title").ok()?))?;
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_string())
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

/// Convert an operand of a text-showing operator, decoding its strings.
fn convert_shown(obj: &Object, decode: &dyn Fn(&[u8]) -> String) -> PdfValue {
    match obj {
        Object::String(b, _) => PdfValue::Text(decode(b)),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(|o| convert_shown(o, decode)).collect()),
        other => convert_object(other),
    }
}

fn object_to_f32(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn object_to_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Top coordinate (user space) of an explicit destination array.
///
/// `/XYZ` carries it at index 3, `/FitH` and `/FitBH` at index 2. A `null`
/// top means "unchanged" and is treated as absent.
fn destination_top(arr: &[Object]) -> Option<f32> {
    let kind = arr.get(1)?.as_name().ok()?;
    match kind {
        b"XYZ" => arr.get(3).and_then(object_to_f32),
        b"FitH" | b"FitBH" => arr.get(2).and_then(object_to_f32),
        _ => None,
    }
}
