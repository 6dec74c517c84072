//! PDF Document wrapper

use crate::font::decode_win_ansi;
use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{generate_text_operators, TextRenderContext, TextRun};
use crate::{Align, PdfError, Result, StandardFont};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// PDF Document wrapper providing high-level operations
///
/// Coordinates passed to drawing methods are in points with the origin at the
/// top-left corner of the page; they are converted to PDF user space
/// (bottom-left origin) internally.
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// Current font face
    current_font: StandardFont,
    /// Current font size
    current_font_size: f32,
    /// Current text color
    current_text_color: Color,
    /// Font dictionaries added to the document (face -> object ID)
    embedded_fonts: HashMap<StandardFont, ObjectId>,
    /// Page font resources (page number -> face -> resource name)
    page_font_resources: HashMap<usize, HashMap<StandardFont, String>>,
    /// Next font resource number
    next_font_resource: u32,
    /// Embedded images (data hash -> PDF object ID)
    embedded_images: HashMap<u64, ObjectId>,
    /// Page image resources (page number -> object ID -> resource name)
    page_image_resources: HashMap<usize, HashMap<ObjectId, String>>,
    /// Next image resource number
    next_image_resource: u32,
    /// Buffered content operators per page (page number -> operators)
    page_content_buffer: HashMap<usize, Vec<u8>>,
}

impl PdfDocument {
    fn from_document(inner: Document) -> Self {
        Self {
            inner,
            current_font: StandardFont::default(),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            embedded_fonts: HashMap::new(),
            page_font_resources: HashMap::new(),
            next_font_resource: 1,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
        }
    }

    /// Create an empty document with no pages
    pub fn new() -> Self {
        let mut inner = Document::with_version("1.5");

        let pages_id = inner.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(vec![])),
            ("Count", Object::Integer(0)),
        ]));
        let catalog_id = inner.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        inner.trailer.set("Root", Object::Reference(catalog_id));

        Self::from_document(inner)
    }

    /// Open a PDF document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let inner = Document::load(path).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Open a PDF document from bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| PdfError::OpenError(e.to_string()))?;
        Ok(Self::from_document(inner))
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Object ID of a page (1-indexed)
    pub(crate) fn page_id(&self, page: usize) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&(page as u32))
            .copied()
            .ok_or(PdfError::InvalidPage(page, pages.len()))
    }

    /// Catalog object ID from the trailer
    pub(crate) fn catalog_id(&self) -> Result<ObjectId> {
        self.inner
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Document trailer missing Root entry".to_string()))
    }

    /// Append a page of the given size in points and return its number
    pub fn add_page(&mut self, width: f64, height: f64) -> Result<usize> {
        let catalog_id = self.catalog_id()?;
        let pages_id = self
            .inner
            .get_dictionary(catalog_id)?
            .get(b"Pages")
            .and_then(Object::as_reference)
            .map_err(|_| PdfError::ParseError("Catalog missing Pages entry".to_string()))?;

        let contents_id = self
            .inner
            .add_object(Stream::new(Dictionary::new(), Vec::new()));
        let page_id = self.inner.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width as f32),
                    Object::Real(height as f32),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(contents_id)),
        ]));

        let pages = self.inner.get_dictionary_mut(pages_id)?;
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        match pages.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            _ => pages.set("Kids", vec![Object::Reference(page_id)]),
        }
        pages.set("Count", Object::Integer(count + 1));

        Ok(self.page_count())
    }

    /// Set the current font face and size
    pub fn set_font(&mut self, font: StandardFont, size: f32) {
        self.current_font = font;
        self.current_font_size = size;
    }

    /// Set only the font size (keeps current face)
    pub fn set_font_size(&mut self, size: f32) {
        self.current_font_size = size;
    }

    /// Current font size in points
    pub fn font_size(&self) -> f32 {
        self.current_font_size
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Insert text in the current face
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Baseline Y coordinate in points (from top)
    /// * `align` - Text alignment relative to `x`
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let run = TextRun::new(text, self.current_font);
        self.insert_runs(std::slice::from_ref(&run), page, x, y, align)
    }

    /// Insert one line made of runs in different faces at the current size
    pub fn insert_runs(
        &mut self,
        runs: &[TextRun],
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let runs: Vec<&TextRun> = runs.iter().filter(|r| !r.text.is_empty()).collect();
        if runs.is_empty() {
            return Ok(());
        }

        let mut resolved = Vec::with_capacity(runs.len());
        for run in &runs {
            let resource = self.font_resource(run.font, page)?;
            resolved.push((resource, run.text.as_str()));
        }

        let ctx = TextRenderContext {
            font_size: self.current_font_size,
            text_width: runs.iter().map(|r| r.width(self.current_font_size)).sum(),
            color: self.current_text_color,
        };

        let pdf_y = self.page_height(page)? - y;
        let operators = generate_text_operators(&resolved, x, pdf_y, align, &ctx);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Draw a straight line
    #[allow(clippy::too_many_arguments)]
    pub fn draw_line(
        &mut self,
        page: usize,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        line_width: f64,
        color: Color,
    ) -> Result<()> {
        let height = self.page_height(page)?;
        let ops = format!(
            "q\n{line_width} w\n{} {} {} RG\n{x1} {} m\n{x2} {} l\nS\nQ\n",
            color.r,
            color.g,
            color.b,
            height - y1,
            height - y2
        );
        self.buffer_content(page, ops.as_bytes());
        Ok(())
    }

    /// Draw a rectangle with an optional fill and an optional black border
    #[allow(clippy::too_many_arguments)]
    pub fn draw_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        border_width: Option<f64>,
    ) -> Result<()> {
        let page_height = self.page_height(page)?;
        let pdf_y = page_height - y - height;

        let mut ops = String::from("q\n");
        if let Some(color) = fill {
            ops.push_str(&format!("{} {} {} rg\n", color.r, color.g, color.b));
        }
        if let Some(w) = border_width {
            ops.push_str(&format!("{w} w\n0 0 0 RG\n"));
        }
        ops.push_str(&format!("{x} {pdf_y} {width} {height} re\n"));
        let paint = match (fill.is_some(), border_width.is_some()) {
            (true, true) => "B",
            (true, false) => "f",
            (false, true) => "S",
            (false, false) => "n",
        };
        ops.push_str(paint);
        ops.push_str("\nQ\n");

        self.buffer_content(page, ops.as_bytes());
        Ok(())
    }

    /// Insert an image (JPEG or PNG)
    ///
    /// # Arguments
    /// * `data` - Image file bytes
    /// * `page` - Page number (1-indexed)
    /// * `x` - X coordinate in points
    /// * `y` - Y coordinate of the top edge in points (from top)
    /// * `width` - Target width in points
    /// * `height` - Target height in points
    /// * `mode` - Scaling mode
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
    ) -> Result<()> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let (resource, orig_width, orig_height) = self.image_resource(data, page)?;
        let (actual_width, actual_height) =
            calculate_scaled_dimensions(orig_width, orig_height, width, height, mode);

        let pdf_y = self.page_height(page)? - y - actual_height;
        let operators = generate_image_operators(&resource, x, pdf_y, actual_width, actual_height);
        self.buffer_content(page, &operators);

        Ok(())
    }

    /// Decode the strings shown by text operators on a saved page
    ///
    /// Operators still buffered (not yet saved) are not included.
    pub fn extract_text_runs(&self, page: usize) -> Result<Vec<String>> {
        let page_id = self.page_id(page)?;
        let content = Content::decode(&self.inner.get_page_content(page_id)?)?;

        let mut runs = Vec::new();
        for operation in content.operations {
            match operation.operator.as_str() {
                "Tj" | "'" | "\"" => {
                    if let Some(Object::String(bytes, _)) = operation.operands.last() {
                        runs.push(decode_win_ansi(bytes));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operation.operands.first() {
                        let text: String = items
                            .iter()
                            .filter_map(|item| match item {
                                Object::String(bytes, _) => Some(decode_win_ansi(bytes)),
                                _ => None,
                            })
                            .collect();
                        runs.push(text);
                    }
                }
                _ => {}
            }
        }

        Ok(runs)
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush_content_buffers()?;
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_content_buffers()?;
        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }

    /// Get a mutable reference to the underlying lopdf document
    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.inner
    }

    /// Resource name of a font face on a page, adding it on first use
    fn font_resource(&mut self, font: StandardFont, page: usize) -> Result<String> {
        if let Some(name) = self
            .page_font_resources
            .get(&page)
            .and_then(|fonts| fonts.get(&font))
        {
            return Ok(name.clone());
        }

        let font_id = match self.embedded_fonts.get(&font) {
            Some(id) => *id,
            None => {
                let id = self.inner.add_object(font.to_pdf_dictionary());
                self.embedded_fonts.insert(font, id);
                id
            }
        };

        let name = format!("LF{}", self.next_font_resource);
        self.next_font_resource += 1;
        self.add_page_resource(page, b"Font", &name, font_id)?;
        self.page_font_resources
            .entry(page)
            .or_default()
            .insert(font, name.clone());

        Ok(name)
    }

    /// Resource name and pixel size of an image on a page, embedding it once
    fn image_resource(&mut self, data: &[u8], page: usize) -> Result<(String, u32, u32)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let object_id = match self.embedded_images.get(&data_hash) {
            Some(id) => *id,
            None => {
                let xobject = ImageXObject::from_bytes(data)?;
                let id = self.inner.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(data_hash, id);
                id
            }
        };

        let dict = &self
            .inner
            .get_object(object_id)?
            .as_stream()
            .map_err(|_| PdfError::ParseError("Image object is not a stream".to_string()))?
            .dict;
        let width = dict.get(b"Width").and_then(Object::as_i64)? as u32;
        let height = dict.get(b"Height").and_then(Object::as_i64)? as u32;

        if let Some(name) = self
            .page_image_resources
            .get(&page)
            .and_then(|images| images.get(&object_id))
        {
            return Ok((name.clone(), width, height));
        }

        let name = format!("LIm{}", self.next_image_resource);
        self.next_image_resource += 1;
        self.add_page_resource(page, b"XObject", &name, object_id)?;
        self.page_image_resources
            .entry(page)
            .or_default()
            .insert(object_id, name.clone());

        Ok((name, width, height))
    }

    /// Register `name -> id` under a category (Font, XObject) of a page's Resources
    ///
    /// Resources held by reference are copied inline so sibling pages sharing
    /// the same dictionary are left untouched.
    fn add_page_resource(
        &mut self,
        page: usize,
        category: &[u8],
        name: &str,
        id: ObjectId,
    ) -> Result<()> {
        let page_id = self.page_id(page)?;
        let page_dict = self.inner.get_dictionary(page_id)?;

        let mut resources = self.resolve_dict(page_dict.get(b"Resources").ok())?;
        let mut entries = self.resolve_dict(resources.get(category).ok())?;
        entries.set(name, Object::Reference(id));
        resources.set(category, Object::Dictionary(entries));

        self.inner
            .get_dictionary_mut(page_id)?
            .set("Resources", Object::Dictionary(resources));

        Ok(())
    }

    /// Clone a dictionary that may be direct or behind a reference
    fn resolve_dict(&self, object: Option<&Object>) -> Result<Dictionary> {
        match object {
            Some(Object::Dictionary(dict)) => Ok(dict.clone()),
            Some(Object::Reference(id)) => Ok(self.inner.get_dictionary(*id)?.clone()),
            _ => Ok(Dictionary::new()),
        }
    }

    /// Page height in points, following MediaBox inheritance
    pub(crate) fn page_height(&self, page: usize) -> Result<f64> {
        let mut current = self.page_id(page)?;

        // Follow parent chain up to 10 levels
        for _ in 0..10 {
            let dict = self.inner.get_dictionary(current)?;

            if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
                let values = match media_box {
                    Object::Array(values) => values,
                    Object::Reference(id) => self.inner.get_object(*id)?.as_array()?,
                    _ => return Err(PdfError::ParseError("MediaBox is not an array".to_string())),
                };
                return media_box_height(values);
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent)) => current = *parent,
                _ => break,
            }
        }

        Ok(crate::A4_HEIGHT)
    }

    /// Buffer content operators for a page (written at save time)
    fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Flush all buffered content to page streams
    ///
    /// Buffered operators are added as one extra stream per page. Existing
    /// content is wrapped in q/Q so its graphics state cannot leak into ours.
    fn flush_content_buffers(&mut self) -> Result<()> {
        let buffers: Vec<(usize, Vec<u8>)> = self.page_content_buffer.drain().collect();

        for (page, content) in buffers {
            if content.is_empty() {
                continue;
            }
            let page_id = self.page_id(page)?;

            let existing: Vec<Object> = match self.inner.get_dictionary(page_id)?.get(b"Contents") {
                Ok(Object::Array(items)) => items.clone(),
                Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
                _ => Vec::new(),
            };

            let mut contents = Vec::with_capacity(existing.len() + 2);
            if !existing.is_empty() {
                let save_id = self
                    .inner
                    .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
                contents.push(Object::Reference(save_id));
                contents.extend(existing);
                let mut restored = b"Q\n".to_vec();
                restored.extend_from_slice(&content);
                let id = self.inner.add_object(Stream::new(Dictionary::new(), restored));
                contents.push(Object::Reference(id));
            } else {
                let id = self.inner.add_object(Stream::new(Dictionary::new(), content));
                contents.push(Object::Reference(id));
            }

            self.inner
                .get_dictionary_mut(page_id)?
                .set("Contents", Object::Array(contents));
        }

        Ok(())
    }
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Height from a MediaBox array `[x1 y1 x2 y2]`
fn media_box_height(values: &[Object]) -> Result<f64> {
    let number = |object: &Object| -> Option<f64> {
        object
            .as_f32()
            .map(|v| v as f64)
            .ok()
            .or_else(|| object.as_i64().ok().map(|v| v as f64))
    };

    if values.len() < 4 {
        return Err(PdfError::ParseError("Invalid MediaBox format".to_string()));
    }
    let y1 = number(&values[1]).ok_or_else(|| PdfError::ParseError("Invalid MediaBox y1".to_string()))?;
    let y2 = number(&values[3]).ok_or_else(|| PdfError::ParseError("Invalid MediaBox y2".to_string()))?;
    Ok(y2 - y1)
}
