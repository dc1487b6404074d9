//! Font handling for PDF documents
//!
//! Fonts are embedded as Type0 composite fonts with Identity-H encoding.
//! Glyph usage is tracked while text is inserted; at save time each used
//! font is subsetted and its glyph IDs remapped.

use crate::{PdfError, Result};
use lopdf::{Dictionary, Object, Stream};
use std::collections::BTreeMap;
use subsetter::GlyphRemapper;
use ttf_parser::{Face, GlyphId, Tag};

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Parsed font file plus the glyphs used so far
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font identifier (e.g. "simhei-bold")
    pub name: String,
    /// Raw font file (TTF, OTF or TTC)
    data: Vec<u8>,
    /// Face index within a collection
    index: u32,
    /// Glyphs used, mapped to the first character that produced them
    used_glyphs: BTreeMap<u16, char>,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    bbox: [i16; 4],
    /// CFF outlines (embedded as FontFile3 / CIDFontType0)
    is_cff: bool,
}

/// Font family: a regular face and an optional bold face
#[derive(Debug, Clone)]
pub struct FontFamily {
    pub regular: FontData,
    pub bold: Option<FontData>,
}

impl FontFamily {
    /// Get the face for a weight, falling back to regular
    pub fn variant(&self, weight: FontWeight) -> &FontData {
        match weight {
            FontWeight::Bold => self.bold.as_ref().unwrap_or(&self.regular),
            FontWeight::Regular => &self.regular,
        }
    }

    /// Mutable access to the face for a weight, falling back to regular
    pub fn variant_mut(&mut self, weight: FontWeight) -> &mut FontData {
        match (weight, self.bold.as_mut()) {
            (FontWeight::Bold, Some(bold)) => bold,
            _ => &mut self.regular,
        }
    }

    /// Whether bold text has to be emboldened by stroking the regular face
    pub fn needs_synthetic_bold(&self, weight: FontWeight) -> bool {
        weight == FontWeight::Bold && self.bold.is_none()
    }

    /// All faces in this family
    pub fn faces(&self) -> impl Iterator<Item = &FontData> {
        std::iter::once(&self.regular).chain(self.bold.as_ref())
    }
}

/// Builder for registering font families
#[derive(Debug, Default)]
pub struct FontFamilyBuilder {
    regular: Option<Vec<u8>>,
    bold: Option<Vec<u8>>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn regular(mut self, data: Vec<u8>) -> Self {
        self.regular = Some(data);
        self
    }

    pub fn bold(mut self, data: Vec<u8>) -> Self {
        self.bold = Some(data);
        self
    }

    /// Build the family, parsing each face
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let regular = self.regular.ok_or_else(|| {
            PdfError::FontParseError(format!(
                "Font family '{family_name}' must have a regular face"
            ))
        })?;

        Ok(FontFamily {
            regular: FontData::from_bytes(family_name, regular)?,
            bold: self
                .bold
                .map(|data| FontData::from_bytes(&format!("{family_name}-bold"), data))
                .transpose()?,
        })
    }
}

/// A font reduced to the glyphs a document uses
pub struct FontSubset {
    /// Subsetted font program
    pub data: Vec<u8>,
    remapper: GlyphRemapper,
}

/// PDF objects generated for font embedding
pub struct FontObjects {
    /// Type0 font dictionary
    pub type0_font: Dictionary,
    /// CIDFont dictionary
    pub cid_font: Dictionary,
    /// Font descriptor dictionary
    pub font_descriptor: Dictionary,
    /// Font program stream
    pub font_file_stream: Stream,
    /// ToUnicode CMap stream
    pub tounicode_stream: Stream,
    /// Key the descriptor uses for the font program (FontFile2 or FontFile3)
    pub font_file_key: &'static str,
}

impl FontData {
    /// Parse font bytes (face 0 of a collection)
    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self> {
        Self::from_collection(name, data, 0)
    }

    /// Parse a face from font bytes
    pub fn from_collection(name: &str, data: Vec<u8>, index: u32) -> Result<Self> {
        let (units_per_em, ascender, descender, bbox, is_cff) = {
            let face = Face::parse(&data, index)
                .map_err(|e| PdfError::FontParseError(format!("{name}: {e}")))?;
            let rect = face.global_bounding_box();
            (
                face.units_per_em(),
                face.ascender(),
                face.descender(),
                [rect.x_min, rect.y_min, rect.x_max, rect.y_max],
                face.raw_face().table(Tag::from_bytes(b"CFF ")).is_some(),
            )
        };

        Ok(Self {
            name: name.to_string(),
            data,
            index,
            used_glyphs: BTreeMap::new(),
            units_per_em,
            ascender,
            descender,
            bbox,
            is_cff,
        })
    }

    fn face(&self) -> Result<Face<'_>> {
        Face::parse(&self.data, self.index)
            .map_err(|e| PdfError::FontParseError(format!("{}: {e}", self.name)))
    }

    /// Record the glyphs needed for `text`
    pub fn add_chars(&mut self, text: &str) -> Result<()> {
        let glyphs: Vec<(u16, char)> = {
            let face = self.face()?;
            text.chars()
                .filter_map(|c| face.glyph_index(c).map(|gid| (gid.0, c)))
                .collect()
        };
        for (gid, c) in glyphs {
            self.used_glyphs.entry(gid).or_insert(c);
        }
        Ok(())
    }

    /// Whether any text has been set in this face
    pub fn is_used(&self) -> bool {
        !self.used_glyphs.is_empty()
    }

    /// Number of distinct glyphs used
    pub fn used_glyph_count(&self) -> usize {
        self.used_glyphs.len()
    }

    /// Check if the font has a glyph for the character
    pub fn has_glyph(&self, c: char) -> bool {
        self.face()
            .ok()
            .and_then(|face| face.glyph_index(c))
            .is_some_and(|gid| gid.0 != 0)
    }

    /// Font units per em
    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Text width in font units
    pub fn text_width(&self, text: &str) -> u32 {
        let Ok(face) = self.face() else {
            return 0;
        };
        text.chars()
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|gid| face.glyph_hor_advance(gid))
            .map(u32::from)
            .sum()
    }

    /// Text width in points for a font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        self.text_width(text) as f32 / self.units_per_em as f32 * font_size
    }

    /// Scale font units to PDF glyph space (1000 units per em)
    fn to_glyph_space(&self, value: i32) -> i64 {
        (value as f64 * 1000.0 / self.units_per_em as f64).round() as i64
    }

    /// Subset the font to the glyphs used so far
    pub fn subset(&self) -> Result<FontSubset> {
        let mut remapper = GlyphRemapper::new();
        remapper.remap(0);
        for &gid in self.used_glyphs.keys() {
            remapper.remap(gid);
        }

        let data = subsetter::subset(&self.data, self.index, &remapper)
            .map_err(|e| PdfError::FontSubsetError(format!("{}: {e:?}", self.name)))?;

        Ok(FontSubset { data, remapper })
    }

    /// Encode text as a hex string of remapped glyph IDs for the Tj operator
    pub fn encode_text_hex(&self, text: &str, subset: &FontSubset) -> Result<String> {
        let face = self.face()?;
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');
        for c in text.chars() {
            let gid = face.glyph_index(c).map(|g| g.0).unwrap_or(0);
            let new_gid = subset.remapper.get(gid).unwrap_or(0);
            hex.push_str(&format!("{new_gid:04X}"));
        }
        hex.push('>');
        Ok(hex)
    }

    /// Generate the PDF objects that embed this font's subset
    pub fn to_pdf_objects(&self, subset: &FontSubset, base_font: &str) -> Result<FontObjects> {
        let base_font = Object::Name(base_font.as_bytes().to_vec());

        let tounicode_content = self.generate_tounicode_cmap(subset);
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![("Type", "CMap".into())]),
            tounicode_content.into_bytes(),
        );

        let (font_file_stream, font_file_key, cid_subtype) = if self.is_cff {
            (
                Stream::new(
                    Dictionary::from_iter(vec![("Subtype", "OpenType".into())]),
                    subset.data.clone(),
                ),
                "FontFile3",
                "CIDFontType0",
            )
        } else {
            (
                Stream::new(
                    Dictionary::from_iter(vec![(
                        "Length1",
                        Object::Integer(subset.data.len() as i64),
                    )]),
                    subset.data.clone(),
                ),
                "FontFile2",
                "CIDFontType2",
            )
        };

        let [x_min, y_min, x_max, y_max] = self.bbox.map(|v| self.to_glyph_space(v as i32));
        let ascent = self.to_glyph_space(self.ascender as i32);
        let descent = self.to_glyph_space(self.descender as i32);

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", "FontDescriptor".into()),
            ("FontName", base_font.clone()),
            ("Flags", Object::Integer(4)),
            (
                "FontBBox",
                Object::Array(vec![x_min.into(), y_min.into(), x_max.into(), y_max.into()]),
            ),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", ascent.into()),
            ("Descent", descent.into()),
            ("CapHeight", ascent.into()),
            ("StemV", Object::Integer(80)),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", Object::Integer(0)),
        ]);

        let mut cid_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", cid_subtype.into()),
            ("BaseFont", base_font.clone()),
            ("CIDSystemInfo", cid_system_info.into()),
            ("W", Object::Array(self.generate_widths_array(subset)?)),
            ("DW", Object::Integer(1000)),
        ]);
        if !self.is_cff {
            cid_font.set("CIDToGIDMap", Object::Name(b"Identity".to_vec()));
        }

        let type0_font = Dictionary::from_iter(vec![
            ("Type", "Font".into()),
            ("Subtype", "Type0".into()),
            ("BaseFont", base_font),
            ("Encoding", "Identity-H".into()),
        ]);

        Ok(FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
            font_file_key,
        })
    }

    /// Generate the /W array (`cid [width] cid [width] ...`) in remapped IDs
    fn generate_widths_array(&self, subset: &FontSubset) -> Result<Vec<Object>> {
        let face = self.face()?;
        let mut widths = Vec::with_capacity(self.used_glyphs.len() * 2);
        for &gid in self.used_glyphs.keys() {
            let Some(new_gid) = subset.remapper.get(gid) else {
                continue;
            };
            let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
            widths.push(Object::Integer(new_gid as i64));
            widths.push(Object::Array(vec![self
                .to_glyph_space(advance as i32)
                .into()]));
        }
        Ok(widths)
    }

    /// Generate the ToUnicode CMap mapping remapped glyph IDs to characters
    fn generate_tounicode_cmap(&self, subset: &FontSubset) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        let entries: Vec<(u16, char)> = self
            .used_glyphs
            .iter()
            .filter_map(|(&gid, &c)| subset.remapper.get(gid).map(|new_gid| (new_gid, c)))
            .collect();

        // bfchar sections are limited to 100 entries each
        for chunk in entries.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for (gid, c) in chunk {
                cmap.push_str(&format!("<{gid:04X}> <{}>\n", utf16_hex(*c)));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\nend\n");
        cmap
    }
}

/// UTF-16BE hex for a character (surrogate pairs outside the BMP)
fn utf16_hex(c: char) -> String {
    let mut units = [0u16; 2];
    c.encode_utf16(&mut units)
        .iter()
        .map(|unit| format!("{unit:04X}"))
        .collect()
}

/// Six-letter subset tag derived from the font name and glyph set
pub(crate) fn subset_tag(name: &str, glyph_count: usize) -> String {
    let mut seed: u32 = 2166136261;
    for byte in name.bytes().chain(glyph_count.to_le_bytes()) {
        seed = (seed ^ byte as u32).wrapping_mul(16777619);
    }
    (0..6)
        .map(|i| (b'A' + ((seed >> (i * 5)) % 26) as u8) as char)
        .collect()
}

/// Make a font identifier safe to use as a PDF name
pub(crate) fn pdf_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "Font".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_regular() {
        let result = FontFamilyBuilder::new().bold(vec![0u8; 16]).build("simhei");
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_invalid_font_bytes() {
        let result = FontData::from_bytes("broken", vec![0u8; 100]);
        assert!(matches!(result, Err(PdfError::FontParseError(_))));
    }

    #[test]
    fn test_utf16_hex() {
        assert_eq!(utf16_hex('A'), "0041");
        assert_eq!(utf16_hex('出'), "51FA");
        assert_eq!(utf16_hex('😀'), "D83DDE00");
    }

    #[test]
    fn test_subset_tag_shape() {
        let tag = subset_tag("simhei", 42);
        assert_eq!(tag.len(), 6);
        assert!(tag.chars().all(|c| c.is_ascii_uppercase()));
        assert_eq!(tag, subset_tag("simhei", 42));
        assert_ne!(tag, subset_tag("simhei", 43));
    }

    #[test]
    fn test_pdf_font_name() {
        assert_eq!(pdf_font_name("simhei-bold"), "simhei-bold");
        assert_eq!(pdf_font_name("黑体"), "__");
        assert_eq!(pdf_font_name(""), "Font");
    }
}
