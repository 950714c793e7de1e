//! PDF Document builder
//!
//! Pages are recorded as lists of operations and only turned into lopdf
//! objects when the document is written, so fonts are embedded once with
//! every character they ended up needing.

use crate::image::{
    calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject,
};
use crate::text::{generate_rect_operators, generate_text_operators, TextRenderContext};
use crate::{Align, BuiltinFont, FontFamily, FontFamilyBuilder, FontWeight, PdfError, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Which font a text run is set in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum FontKey {
    Embedded(FontWeight),
    Builtin(BuiltinFont),
}

impl FontKey {
    fn resource_name(&self) -> &'static str {
        match self {
            FontKey::Embedded(FontWeight::Regular) => "F1",
            FontKey::Embedded(FontWeight::Bold) => "F2",
            FontKey::Builtin(BuiltinFont::Helvetica) => "F3",
            FontKey::Builtin(BuiltinFont::HelveticaBold) => "F4",
        }
    }
}

/// A text run, encoded to glyph codes at write time
#[derive(Debug, Clone)]
struct BufferedText {
    text: String,
    font: FontKey,
    /// Left edge in PDF coordinates (alignment already applied)
    x: f64,
    /// Baseline in PDF coordinates
    y: f64,
    font_size: f32,
}

#[derive(Debug, Clone)]
enum PageOp {
    Raw(Vec<u8>),
    Text(BufferedText),
}

#[derive(Debug, Clone)]
struct PageState {
    width: f64,
    height: f64,
    ops: Vec<PageOp>,
    fonts: BTreeSet<FontKey>,
    /// Resource name -> index into `PdfDocument::images`
    images: BTreeMap<String, usize>,
}

/// In-memory PDF document made of fixed-size pages
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pages: Vec<PageState>,
    /// Registered TrueType family; built-in Helvetica when absent
    font_family: Option<FontFamily>,
    current_weight: FontWeight,
    current_font_size: f32,
    /// Embedded images, deduplicated by content hash
    images: Vec<ImageXObject>,
    image_index: HashMap<u64, usize>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            font_family: None,
            current_weight: FontWeight::default(),
            current_font_size: 12.0,
            images: Vec::new(),
            image_index: HashMap::new(),
        }
    }

    /// Get the number of pages in the document
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Append a blank page of `width` x `height` points
    ///
    /// # Returns
    /// New page number (1-indexed)
    pub fn add_page(&mut self, width: f64, height: f64) -> Result<usize> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidPageSize(width, height));
        }

        self.pages.push(PageState {
            width,
            height,
            ops: Vec::new(),
            fonts: BTreeSet::new(),
            images: BTreeMap::new(),
        });

        Ok(self.pages.len())
    }

    /// Page size in points
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let state = self.page(page)?;
        Ok((state.width, state.height))
    }

    fn page(&self, page: usize) -> Result<&PageState> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageState> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|index| self.pages.get_mut(index))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    /// Register the TrueType family used for all text
    ///
    /// # Example
    /// ```ignore
    /// doc.register_font_family("JhengHei",
    ///     FontFamilyBuilder::new()
    ///         .regular(std::fs::read("msjh.ttf")?)
    ///         .bold(std::fs::read("msjhbd.ttf")?)
    /// )?;
    /// ```
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if let Some(existing) = &self.font_family {
            return Err(PdfError::FontAlreadyExists(format!(
                "{name} (already using {})",
                existing.regular.name
            )));
        }

        self.font_family = Some(builder.build(name)?);
        Ok(())
    }

    /// Whether text is set in an embedded TrueType family
    pub fn has_embedded_font(&self) -> bool {
        self.font_family.is_some()
    }

    /// Set the font size in points
    pub fn set_font_size(&mut self, size: f32) {
        self.current_font_size = size;
    }

    /// Current font size in points
    pub fn font_size(&self) -> f32 {
        self.current_font_size
    }

    /// Set the font weight
    pub fn set_font_weight(&mut self, weight: FontWeight) {
        self.current_weight = weight;
    }

    fn current_font_key(&self) -> FontKey {
        match &self.font_family {
            Some(family) => FontKey::Embedded(family.resolved_weight(self.current_weight)),
            None => FontKey::Builtin(BuiltinFont::for_weight(self.current_weight)),
        }
    }

    fn width_in(&self, key: FontKey, text: &str, font_size: f32) -> f64 {
        match (key, &self.font_family) {
            (FontKey::Embedded(weight), Some(family)) => {
                family.variant(weight).text_width_points(text, font_size) as f64
            }
            (FontKey::Builtin(font), _) => font.text_width_points(text, font_size) as f64,
            (FontKey::Embedded(_), None) => 0.0,
        }
    }

    /// Width of `text` in points with the current font settings
    pub fn text_width(&self, text: &str) -> f64 {
        self.width_in(self.current_font_key(), text, self.current_font_size)
    }

    /// Insert text at a specific position
    ///
    /// # Arguments
    /// * `text` - Text to insert
    /// * `page` - Page number (1-indexed)
    /// * `x` - Alignment anchor in points (left edge, centre or right edge)
    /// * `y` - Baseline in points from the top of the page
    /// * `align` - Text alignment
    pub fn insert_text(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;

        if text.is_empty() {
            return Ok(());
        }

        let key = self.current_font_key();
        match key {
            FontKey::Embedded(weight) => {
                if let Some(family) = self.font_family.as_mut() {
                    let font = family.variant_mut(weight);
                    if let Some(missing) = text.chars().find(|c| !c.is_whitespace() && !font.has_glyph(*c)) {
                        log::warn!("font {} has no glyph for {missing:?}", font.name);
                    }
                    font.add_chars(text);
                }
            }
            FontKey::Builtin(font) => {
                if text.chars().any(|c| !BuiltinFont::can_encode(c)) {
                    log::warn!(
                        "{} cannot encode {text:?}; unsupported characters become '?'",
                        font.base_font()
                    );
                }
            }
        }

        let width = self.width_in(key, text, self.current_font_size);
        let start_x = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };

        let op = PageOp::Text(BufferedText {
            text: text.to_string(),
            font: key,
            x: start_x,
            y: page_height - y,
            font_size: self.current_font_size,
        });

        let state = self.page_mut(page)?;
        state.fonts.insert(key);
        state.ops.push(op);

        Ok(())
    }

    /// Insert an image stretched into a box
    ///
    /// # Arguments
    /// * `data` - PNG bytes
    /// * `page` - Page number (1-indexed)
    /// * `x`, `y` - Top-left corner in points (from top-left of page)
    /// * `width`, `height` - Box size in points
    pub fn insert_image(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<()> {
        self.insert_image_scaled(data, page, x, y, width, height, ImageScaleMode::Stretch)
    }

    /// Insert an image with scaling mode, anchored at the box's top-left corner
    #[allow(clippy::too_many_arguments)]
    pub fn insert_image_scaled(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mode: ImageScaleMode,
    ) -> Result<()> {
        let page_height = self.page(page)?.height;

        let (resource_name, orig_width, orig_height) = self.get_or_create_image_ref(data, page)?;
        let (actual_width, actual_height) =
            calculate_scaled_dimensions(orig_width, orig_height, width, height, mode);

        let pdf_y = page_height - y - actual_height;
        let operators =
            generate_image_operators(&resource_name, x, pdf_y, actual_width, actual_height);
        self.page_mut(page)?.ops.push(PageOp::Raw(operators));

        Ok(())
    }

    /// Stroke a black rectangle given by its top-left corner (points from top-left of page)
    pub fn draw_rect(
        &mut self,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        line_width: f64,
    ) -> Result<()> {
        let state = self.page_mut(page)?;
        let pdf_y = state.height - y - height;
        let operators = generate_rect_operators(x, pdf_y, width, height, line_width);
        state.ops.push(PageOp::Raw(operators));
        Ok(())
    }

    /// Resource name and pixel size of an image, embedding it on first use
    ///
    /// Images are deduplicated by hash of their data.
    fn get_or_create_image_ref(&mut self, data: &[u8], page: usize) -> Result<(String, u32, u32)> {
        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let index = match self.image_index.get(&data_hash) {
            Some(&index) => index,
            None => {
                let xobject = ImageXObject::from_bytes(data).map_err(|e| {
                    PdfError::ImageError(format!("Failed to create image XObject: {e}"))
                })?;
                self.images.push(xobject);
                let index = self.images.len() - 1;
                self.image_index.insert(data_hash, index);
                index
            }
        };

        let (width, height) = (self.images[index].width, self.images[index].height);
        let resource_name = format!("Im{}", index + 1);
        self.page_mut(page)?
            .images
            .insert(resource_name.clone(), index);

        Ok((resource_name, width, height))
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut doc = self.build()?;
        doc.save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = self.build()?;
        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    /// Assemble the lopdf document
    fn build(&self) -> Result<Document> {
        if self.pages.is_empty() {
            return Err(PdfError::SaveError("document has no pages".to_string()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let used_fonts: BTreeSet<FontKey> = self
            .pages
            .iter()
            .flat_map(|page| page.fonts.iter().copied())
            .collect();

        let mut font_ids: BTreeMap<FontKey, ObjectId> = BTreeMap::new();
        for key in used_fonts {
            let id = match key {
                FontKey::Embedded(weight) => self.embed_font_object(&mut doc, weight)?,
                FontKey::Builtin(font) => doc.add_object(font.to_pdf_dictionary()),
            };
            font_ids.insert(key, id);
        }

        let image_ids: Vec<ObjectId> = self
            .images
            .iter()
            .map(|image| doc.add_object(image.to_pdf_stream()))
            .collect();

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = self.encode_page_content(page)?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

            let mut font_dict = Dictionary::new();
            for key in &page.fonts {
                let id = font_ids
                    .get(key)
                    .ok_or_else(|| PdfError::FontNotFound(key.resource_name().to_string()))?;
                font_dict.set(key.resource_name(), Object::Reference(*id));
            }

            let mut xobject_dict = Dictionary::new();
            for (name, &index) in &page.images {
                let id = image_ids
                    .get(index)
                    .ok_or_else(|| PdfError::ImageError(format!("missing image {name}")))?;
                xobject_dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
            }

            let mut resources = Dictionary::new();
            if !font_dict.is_empty() {
                resources.set("Font", font_dict);
            }
            if !xobject_dict.is_empty() {
                resources.set("XObject", xobject_dict);
            }

            let media_box = vec![
                0.into(),
                0.into(),
                Object::Real(page.width as f32),
                Object::Real(page.height as f32),
            ];
            let page_dict = Dictionary::from_iter(vec![
                ("Type", "Page".into()),
                ("Parent", Object::Reference(pages_id)),
                ("MediaBox", media_box.into()),
                ("Resources", resources.into()),
                ("Contents", Object::Reference(content_id)),
            ]);
            kids.push(Object::Reference(doc.add_object(page_dict)));
        }

        let count = kids.len() as i64;
        let pages_dict = Dictionary::from_iter(vec![
            ("Type", "Pages".into()),
            ("Kids", kids.into()),
            ("Count", count.into()),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", "Catalog".into()),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        log::debug!(
            "assembled PDF: {} page(s), {} font(s), {} image(s)",
            self.pages.len(),
            font_ids.len(),
            self.images.len()
        );

        Ok(doc)
    }

    /// Embed one weight of the registered family and link its objects
    fn embed_font_object(&self, doc: &mut Document, weight: FontWeight) -> Result<ObjectId> {
        let family = self
            .font_family
            .as_ref()
            .ok_or_else(|| PdfError::FontNotFound("no font family registered".to_string()))?;
        let objects = family.variant(weight).to_pdf_objects()?;

        let font_file_id = doc.add_object(objects.font_file_stream);

        let mut font_descriptor = objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = doc.add_object(font_descriptor);

        let mut cid_font = objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = doc.add_object(cid_font);

        let tounicode_id = doc.add_object(objects.tounicode_stream);

        let mut type0_font = objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(doc.add_object(type0_font))
    }

    /// Content stream bytes of one page, in painting order
    fn encode_page_content(&self, page: &PageState) -> Result<Vec<u8>> {
        let mut content = Vec::new();

        for op in &page.ops {
            match op {
                PageOp::Raw(bytes) => content.extend_from_slice(bytes),
                PageOp::Text(run) => {
                    let text_hex = match (run.font, &self.font_family) {
                        (FontKey::Embedded(weight), Some(family)) => {
                            family.variant(weight).encode_text_hex(&run.text)
                        }
                        (FontKey::Builtin(font), _) => font.encode_text_hex(&run.text),
                        (FontKey::Embedded(_), None) => {
                            return Err(PdfError::FontNotFound(run.font.resource_name().to_string()))
                        }
                    };

                    let ctx = TextRenderContext {
                        font_name: run.font.resource_name().to_string(),
                        font_size: run.font_size,
                        text_width: 0.0,
                    };
                    content.extend(generate_text_operators(&text_hex, run.x, run.y, Align::Left, &ctx));
                }
            }
        }

        Ok(content)
    }
}
