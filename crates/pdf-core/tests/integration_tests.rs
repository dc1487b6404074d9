//! Integration tests for pdf-core
//!
//! Tests that embed fonts need a TrueType/OpenType file with CJK glyphs and
//! are ignored by default. Run them with `cargo test -- --ignored`, pointing
//! `PDF_CORE_TEST_FONT` at a font when none of the usual system fonts exist.

use lopdf::Document;
use pdf_core::{
    Align, Color, FontData, FontFamilyBuilder, FontWeight, ImageScaleMode, LineStyle,
    PdfDocument, PdfError, RectStyle,
};
use pretty_assertions::assert_eq;

const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/wenquanyi/wqy-microhei/wqy-microhei.ttc",
    "/System/Library/Fonts/PingFang.ttc",
    "C:\\Windows\\Fonts\\simhei.ttf",
];

fn has_cjk_glyphs(data: &[u8]) -> bool {
    FontData::from_bytes("candidate", data.to_vec()).is_ok_and(|font| font.has_glyph('出'))
}

/// Font with CJK glyphs; fails the test when none can be found
fn get_test_font_data() -> Vec<u8> {
    let configured = std::env::var("PDF_CORE_TEST_FONT").ok();
    configured
        .iter()
        .map(String::as_str)
        .chain(SYSTEM_FONTS.iter().copied())
        .filter_map(|path| std::fs::read(path).ok())
        .find(|data| has_cjk_glyphs(data))
        .expect("no CJK test font found; set PDF_CORE_TEST_FONT")
}

fn document_with_font() -> PdfDocument {
    let mut doc = PdfDocument::new();
    doc.add_page();
    doc.register_font_family("body", FontFamilyBuilder::new().regular(get_test_font_data()))
        .expect("register font");
    doc.set_font("body", 12.0).expect("set font");
    doc
}

fn first_page_content(bytes: &[u8]) -> String {
    let parsed = Document::load_mem(bytes).expect("parse output");
    let page_id = *parsed.get_pages().get(&1).expect("page 1");
    let content = parsed.get_page_content(page_id).expect("page content");
    String::from_utf8_lossy(&content).into_owned()
}

#[test]
fn test_blank_document_roundtrip() {
    let mut doc = PdfDocument::new();
    doc.add_page();
    doc.add_page();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();
    assert_eq!(parsed.get_pages().len(), 2);
}

#[test]
fn test_shapes_in_content_stream() {
    let mut doc = PdfDocument::new();
    doc.add_page();
    doc.draw_line(1, 28.35, 100.0, 566.93, 100.0, &LineStyle::default())
        .unwrap();
    doc.draw_rect(
        1,
        28.35,
        120.0,
        100.0,
        20.0,
        &RectStyle {
            fill: Some(Color::gray(0.95)),
            stroke: Some(LineStyle::default()),
        },
    )
    .unwrap();

    let content = first_page_content(&doc.to_bytes().unwrap());
    assert!(content.contains("28.35 741.89 m"));
    assert!(content.contains("re\nB"));
}

#[test]
fn test_save_to_file() {
    let mut doc = PdfDocument::new();
    doc.add_page();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.pdf");
    doc.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
#[ignore = "needs a CJK font; set PDF_CORE_TEST_FONT"]
fn test_insert_text_embeds_subset_font() {
    let mut doc = document_with_font();
    doc.insert_text("出库单 Delivery Note", 1, 297.64, 40.0, Align::Center)
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let parsed = Document::load_mem(&bytes).unwrap();

    let type0_fonts: Vec<_> = parsed
        .objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter(|dict| {
            dict.get(b"Subtype")
                .and_then(|s| s.as_name())
                .is_ok_and(|name| name == b"Type0")
        })
        .collect();
    assert_eq!(type0_fonts.len(), 1);

    let base_font = type0_fonts[0].get(b"BaseFont").unwrap().as_name().unwrap();
    assert_eq!(base_font[6], b'+');

    let content = first_page_content(&bytes);
    assert!(content.contains("/F1 12 Tf"));
    assert!(content.contains("Tj"));
}

#[test]
#[ignore = "needs a CJK font; set PDF_CORE_TEST_FONT"]
fn test_text_alignment_uses_measured_width() {
    let mut doc = document_with_font();
    let width = doc.text_width("Total").unwrap();
    assert!(width > 0.0);

    doc.insert_text("Total", 1, 300.0, 100.0, Align::Right).unwrap();
    let content = first_page_content(&doc.to_bytes().unwrap());
    assert!(content.contains(&format!("{:.2} 741.89 Td", 300.0 - width)));
}

#[test]
#[ignore = "needs a CJK font; set PDF_CORE_TEST_FONT"]
fn test_bold_without_bold_face_is_synthesized() {
    let mut doc = document_with_font();
    doc.set_font_weight(FontWeight::Bold);
    doc.insert_text("Title", 1, 10.0, 30.0, Align::Left).unwrap();
    doc.set_font_weight(FontWeight::Regular);
    doc.insert_text("Body", 1, 10.0, 50.0, Align::Left).unwrap();

    let content = first_page_content(&doc.to_bytes().unwrap());
    assert_eq!(content.matches("2 Tr").count(), 1);
    // Both runs share the single embedded face
    assert!(!content.contains("/F2"));
}

#[test]
#[ignore = "needs a CJK font; set PDF_CORE_TEST_FONT"]
fn test_duplicate_family_rejected() {
    let font = get_test_font_data();
    let mut doc = PdfDocument::new();
    doc.register_font_family("body", FontFamilyBuilder::new().regular(font.clone()))
        .unwrap();
    let result = doc.register_font_family("body", FontFamilyBuilder::new().regular(font));
    assert!(matches!(result, Err(PdfError::FontAlreadyExists(_))));
}

#[test]
fn test_png_image_placement() {
    let mut png = Vec::new();
    image::DynamicImage::new_rgba8(200, 100)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let mut doc = PdfDocument::new();
    doc.add_page();
    let (w, h) = doc
        .insert_image(&png, 1, 28.35, 28.35, 60.0, 60.0, ImageScaleMode::FitBox)
        .unwrap();
    assert_eq!((w, h), (60.0, 30.0));

    let content = first_page_content(&doc.to_bytes().unwrap());
    assert!(content.contains("/Im1 Do"));
}
