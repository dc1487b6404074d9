//! PDF document builder

use crate::font::{pdf_font_name, subset_tag, FontData, FontFamily, FontFamilyBuilder, FontSubset, FontWeight};
use crate::graphics::{generate_line_operators, generate_rect_operators, Color, LineStyle, RectStyle};
use crate::image::{calculate_scaled_dimensions, generate_image_operators, ImageScaleMode, ImageXObject};
use crate::text::{align_offset, generate_text_operators, TextRenderContext};
use crate::{Align, PdfError, Result, A4_HEIGHT, A4_WIDTH};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;

/// A text run whose glyph encoding waits until fonts are subsetted
#[derive(Debug, Clone)]
struct BufferedTextOp {
    text: String,
    family: String,
    weight: FontWeight,
    /// Baseline start in PDF coordinates (alignment already applied)
    x: f64,
    y: f64,
    font_size: f32,
    text_width: f64,
    color: Color,
    synthetic_bold: bool,
}

#[derive(Debug, Clone)]
enum PageOp {
    Raw(Vec<u8>),
    Text(BufferedTextOp),
}

#[derive(Debug, Clone)]
struct Page {
    width: f64,
    height: f64,
    ops: Vec<PageOp>,
    /// Indices into `PdfDocument::images`
    images: BTreeSet<usize>,
}

/// A font face subset and embedded into the output
struct EmbeddedFont {
    resource: String,
    object_id: ObjectId,
    subset: FontSubset,
}

/// In-memory PDF document built page by page
///
/// Coordinates passed to drawing methods are in points with the origin at
/// the top-left corner of the page; `y` grows downward. Text `y` is the
/// baseline.
pub struct PdfDocument {
    pages: Vec<Page>,
    font_families: HashMap<String, FontFamily>,
    current_family: Option<String>,
    current_weight: FontWeight,
    current_font_size: f32,
    current_text_color: Color,
    images: Vec<ImageXObject>,
    /// Image data hash -> index into `images`
    image_index: HashMap<u64, usize>,
    title: Option<String>,
}

impl Default for PdfDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDocument {
    /// Create an empty document with no pages
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            font_families: HashMap::new(),
            current_family: None,
            current_weight: FontWeight::Regular,
            current_font_size: 12.0,
            current_text_color: Color::black(),
            images: Vec::new(),
            image_index: HashMap::new(),
            title: None,
        }
    }

    /// Set the document title written to the Info dictionary
    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    /// Append an A4 portrait page, returning its 1-indexed number
    pub fn add_page(&mut self) -> usize {
        self.add_page_with_size(A4_WIDTH, A4_HEIGHT)
    }

    /// Append a page of the given size in points
    pub fn add_page_with_size(&mut self, width: f64, height: f64) -> usize {
        self.pages.push(Page {
            width,
            height,
            ops: Vec::new(),
            images: BTreeSet::new(),
        });
        self.pages.len()
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page size in points
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let page = self.page(page)?;
        Ok((page.width, page.height))
    }

    fn page(&self, page: usize) -> Result<&Page> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|index| self.pages.get(index))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut Page> {
        let count = self.pages.len();
        page.checked_sub(1)
            .and_then(|index| self.pages.get_mut(index))
            .ok_or(PdfError::InvalidPage(page, count))
    }

    /// Register a font family
    ///
    /// # Example
    /// ```ignore
    /// doc.register_font_family(
    ///     "simhei",
    ///     FontFamilyBuilder::new().regular(regular_bytes).bold(bold_bytes),
    /// )?;
    /// ```
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        let family = builder.build(name)?;
        self.font_families.insert(name.to_string(), family);
        Ok(())
    }

    /// Select the family and size for subsequent text
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        if !self.font_families.contains_key(family) {
            return Err(PdfError::FontNotFound(family.to_string()));
        }
        self.current_family = Some(family.to_string());
        self.current_font_size = size;
        Ok(())
    }

    pub fn set_font_size(&mut self, size: f32) {
        self.current_font_size = size;
    }

    pub fn set_font_weight(&mut self, weight: FontWeight) {
        self.current_weight = weight;
    }

    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    fn current_family(&self) -> Result<(&str, &FontFamily)> {
        let name = self
            .current_family
            .as_deref()
            .ok_or_else(|| PdfError::FontNotFound("No font family set".to_string()))?;
        let family = self
            .font_families
            .get(name)
            .ok_or_else(|| PdfError::FontNotFound(name.to_string()))?;
        Ok((name, family))
    }

    /// Width of `text` in points with the current font, weight and size
    pub fn text_width(&self, text: &str) -> Result<f64> {
        let (_, family) = self.current_family()?;
        Ok(family
            .variant(self.current_weight)
            .text_width_points(text, self.current_font_size) as f64)
    }

    /// Insert a single line of text with its baseline at `y` (from top)
    pub fn insert_text(&mut self, text: &str, page: usize, x: f64, y: f64, align: Align) -> Result<()> {
        let page_height = self.page(page)?.height;
        if text.is_empty() {
            return Ok(());
        }

        let weight = self.current_weight;
        let font_size = self.current_font_size;
        let (family_name, family) = self.current_family()?;
        let family_name = family_name.to_string();
        let synthetic_bold = family.needs_synthetic_bold(weight);
        let text_width = family.variant(weight).text_width_points(text, font_size) as f64;

        if let Some(family) = self.font_families.get_mut(&family_name) {
            family.variant_mut(weight).add_chars(text)?;
        }

        let op = BufferedTextOp {
            text: text.to_string(),
            family: family_name,
            weight,
            x: x + align_offset(text_width, align),
            y: page_height - y,
            font_size,
            text_width,
            color: self.current_text_color,
            synthetic_bold,
        };
        self.page_mut(page)?.ops.push(PageOp::Text(op));
        Ok(())
    }

    /// Draw a line between two points
    pub fn draw_line(&mut self, page: usize, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) -> Result<()> {
        let target = self.page_mut(page)?;
        let height = target.height;
        let ops = generate_line_operators(x1, height - y1, x2, height - y2, style);
        target.ops.push(PageOp::Raw(ops));
        Ok(())
    }

    /// Draw a rectangle whose top-left corner is at `x`,`y`
    pub fn draw_rect(&mut self, page: usize, x: f64, y: f64, width: f64, height: f64, style: &RectStyle) -> Result<()> {
        let target = self.page_mut(page)?;
        let pdf_y = target.height - y - height;
        let ops = generate_rect_operators(x, pdf_y, width, height, style);
        if !ops.is_empty() {
            target.ops.push(PageOp::Raw(ops));
        }
        Ok(())
    }

    /// Place a JPEG or PNG image with its top-left corner at `x`,`y`, sized
    /// into `width`×`height` by `mode`. Returns the drawn size in points.
    ///
    /// Identical image data is embedded once and shared between placements.
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
    ) -> Result<(f64, f64)> {
        self.page(page)?;

        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let hash = hasher.finish();

        let index = match self.image_index.get(&hash) {
            Some(&index) => index,
            None => {
                self.images.push(ImageXObject::from_bytes(data)?);
                let index = self.images.len() - 1;
                self.image_index.insert(hash, index);
                index
            }
        };

        let image = &self.images[index];
        let (drawn_width, drawn_height) =
            calculate_scaled_dimensions(image.width, image.height, width, height, mode);

        let target = self.page_mut(page)?;
        let pdf_y = target.height - y - drawn_height;
        let ops = generate_image_operators(&image_resource(index), x, pdf_y, drawn_width, drawn_height);
        target.ops.push(PageOp::Raw(ops));
        target.images.insert(index);

        Ok((drawn_width, drawn_height))
    }

    /// Write the document to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Serialize the document
    ///
    /// Fonts are subsetted to the glyphs used, buffered text is encoded with
    /// the remapped glyph IDs and page content is Flate-compressed. The
    /// document itself is left untouched, so this can be called repeatedly.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut document = self.build()?;
        let mut buffer = Vec::new();
        document
            .save_to(&mut buffer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(buffer)
    }

    fn build(&self) -> Result<Document> {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let fonts = self.embed_fonts(&mut document)?;
        let image_ids: Vec<ObjectId> = self
            .images
            .iter()
            .map(|image| document.add_object(image.to_pdf_stream()))
            .collect();

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let mut content = Vec::new();
            let mut font_resources = Dictionary::new();

            for op in &page.ops {
                match op {
                    PageOp::Raw(ops) => content.extend_from_slice(ops),
                    PageOp::Text(text) => {
                        let key = (text.family.clone(), text.weight);
                        let (face, embedded) = fonts
                            .get(&key)
                            .and_then(|embedded| Some((self.face(&text.family, text.weight)?, embedded)))
                            .ok_or_else(|| PdfError::FontNotFound(text.family.clone()))?;

                        font_resources.set(embedded.resource.as_bytes(), Object::Reference(embedded.object_id));
                        let hex = face.encode_text_hex(&text.text, &embedded.subset)?;
                        let ctx = TextRenderContext {
                            font_name: embedded.resource.clone(),
                            font_size: text.font_size,
                            text_width: text.text_width,
                            color: text.color,
                            synthetic_bold: text.synthetic_bold,
                        };
                        content.extend(generate_text_operators(&hex, text.x, text.y, Align::Left, &ctx));
                    }
                }
            }

            let mut xobjects = Dictionary::new();
            for &index in &page.images {
                xobjects.set(image_resource(index).as_bytes(), Object::Reference(image_ids[index]));
            }

            let content_id = document.add_object(compressed_stream(&content)?);
            let page_id = document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), page.width.into(), page.height.into()],
                "Resources" => dictionary! {
                    "Font" => font_resources,
                    "XObject" => xobjects,
                },
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::string_literal(concat!("pdf-core ", env!("CARGO_PKG_VERSION"))),
        };
        if let Some(title) = &self.title {
            info.set("Title", utf16_text_string(title));
        }
        let info_id = document.add_object(info);
        document.trailer.set("Info", info_id);

        Ok(document)
    }

    fn face(&self, family: &str, weight: FontWeight) -> Option<&FontData> {
        self.font_families.get(family).map(|f| f.variant(weight))
    }

    /// Subset and embed every face that has text, keyed by (family, weight)
    fn embed_fonts(&self, document: &mut Document) -> Result<HashMap<(String, FontWeight), EmbeddedFont>> {
        let mut embedded = HashMap::new();
        let mut by_face: BTreeMap<&str, (String, ObjectId)> = BTreeMap::new();
        let mut next_resource = 1;

        let mut families: Vec<(&String, &FontFamily)> = self.font_families.iter().collect();
        families.sort_by(|a, b| a.0.cmp(b.0));

        for (family_name, family) in families {
            for weight in [FontWeight::Regular, FontWeight::Bold] {
                let face = family.variant(weight);
                if !face.is_used() {
                    continue;
                }

                let subset = face.subset()?;
                let (resource, object_id) = match by_face.get(face.name.as_str()) {
                    Some(existing) => existing.clone(),
                    None => {
                        let resource = format!("F{next_resource}");
                        next_resource += 1;
                        let object_id = embed_font(document, face, &subset)?;
                        by_face.insert(face.name.as_str(), (resource.clone(), object_id));
                        (resource, object_id)
                    }
                };

                embedded.insert(
                    (family_name.clone(), weight),
                    EmbeddedFont {
                        resource,
                        object_id,
                        subset,
                    },
                );
            }
        }

        Ok(embedded)
    }
}

/// Add the Type0 font object graph for a subset, returning the Type0 font ID
fn embed_font(document: &mut Document, face: &FontData, subset: &FontSubset) -> Result<ObjectId> {
    let base_font = format!(
        "{}+{}",
        subset_tag(&face.name, face.used_glyph_count()),
        pdf_font_name(&face.name)
    );
    let objects = face.to_pdf_objects(subset, &base_font)?;

    let mut font_file = objects.font_file_stream;
    font_file
        .compress()
        .map_err(|e| PdfError::SaveError(format!("font stream: {e}")))?;
    let font_file_id = document.add_object(font_file);

    let mut descriptor = objects.font_descriptor;
    descriptor.set(objects.font_file_key, Object::Reference(font_file_id));
    let descriptor_id = document.add_object(descriptor);

    let mut cid_font = objects.cid_font;
    cid_font.set("FontDescriptor", Object::Reference(descriptor_id));
    let cid_font_id = document.add_object(cid_font);

    let tounicode_id = document.add_object(objects.tounicode_stream);

    let mut type0 = objects.type0_font;
    type0.set("DescendantFonts", Object::Array(vec![Object::Reference(cid_font_id)]));
    type0.set("ToUnicode", Object::Reference(tounicode_id));
    Ok(document.add_object(type0))
}

fn image_resource(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn compressed_stream(content: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content)?;
    let data = encoder.finish()?;
    Ok(Stream::new(dictionary! { "Filter" => "FlateDecode" }, data).with_compression(false))
}

/// PDF text string in UTF-16BE with a byte order mark
fn utf16_text_string(text: &str) -> Object {
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
