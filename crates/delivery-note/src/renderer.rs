//! A4 PDF rendering of a delivery note

use crate::aggregator::NoteSummary;
use crate::logo::decode_data_url;
use crate::schema::{DeliveryNote, LineItem};
use crate::Result;
use cn_text::{format_iso_date, wrap_text};
use pdf_core::{
    Align, Color, FontFamilyBuilder, FontWeight, ImageScaleMode, LineStyle, PdfDocument, RectStyle,
    A4_HEIGHT, A4_WIDTH,
};
use tracing::{debug, warn};

const FONT_FAMILY: &str = "note";

/// 10 mm page margin in points
const MARGIN: f64 = 10.0 * 72.0 / 25.4;
const CONTENT_WIDTH: f64 = A4_WIDTH - 2.0 * MARGIN;
const RIGHT_EDGE: f64 = MARGIN + CONTENT_WIDTH;
/// Lowest y body content may reach; the page footer sits below it
const CONTENT_BOTTOM: f64 = A4_HEIGHT - MARGIN - 14.0;

const TITLE_SIZE: f32 = 22.0;
const TITLE_SPACING: f64 = 8.0;
const INFO_SIZE: f32 = 10.5;
const TABLE_SIZE: f32 = 9.5;
const TABLE_LINE_HEIGHT: f64 = 12.0;
const HEADER_ROW_HEIGHT: f64 = 22.0;
const MIN_ROW_HEIGHT: f64 = 20.0;
const CELL_PADDING: f64 = 5.0;
const SUMMARY_ROW_HEIGHT: f64 = 17.0;
/// Space needed below the table for the summary box and signatures
const CLOSING_HEIGHT: f64 = 5.0 * SUMMARY_ROW_HEIGHT + 16.0 + 86.0;

/// Table columns: title and share of the content width
const COLUMNS: [(&str, f64); 8] = [
    ("序号", 0.06),
    ("产品名称", 0.22),
    ("规格", 0.14),
    ("单位", 0.08),
    ("数量", 0.10),
    ("单价", 0.12),
    ("金额", 0.13),
    ("备注", 0.15),
];

/// Font files used for rendering; the regular face must contain CJK glyphs
#[derive(Debug, Clone)]
pub struct FontSet {
    pub regular: Vec<u8>,
    pub bold: Option<Vec<u8>>,
}

impl FontSet {
    pub fn new(regular: Vec<u8>) -> Self {
        Self { regular, bold: None }
    }

    pub fn with_bold(mut self, bold: Vec<u8>) -> Self {
        self.bold = Some(bold);
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    weight: FontWeight,
    color: Color,
}

impl TextStyle {
    fn regular(size: f32) -> Self {
        Self {
            size,
            weight: FontWeight::Regular,
            color: Color::black(),
        }
    }

    fn bold(size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            ..Self::regular(size)
        }
    }

    fn muted(size: f32) -> Self {
        Self {
            color: Color::gray(0.4),
            ..Self::regular(size)
        }
    }
}

/// Left edge and width of each table column
fn column_layout() -> Vec<(f64, f64)> {
    let mut x = MARGIN;
    COLUMNS
        .iter()
        .map(|&(_, share)| {
            let width = CONTENT_WIDTH * share;
            let column = (x, width);
            x += width;
            column
        })
        .collect()
}

/// Display columns (half-width units) that fit in a cell
fn cell_capacity(width: f64) -> usize {
    ((width - 2.0 * CELL_PADDING) / (TABLE_SIZE as f64 / 2.0)).floor().max(1.0) as usize
}

fn row_height(line_count: usize) -> f64 {
    (line_count as f64 * TABLE_LINE_HEIGHT + 8.0).max(MIN_ROW_HEIGHT)
}

/// Assign rows to pages. Returns `(page_index, top)` per row, where page 0
/// starts at `first_top` and later pages at `next_top`.
fn paginate(heights: &[f64], first_top: f64, next_top: f64, bottom: f64) -> Vec<(usize, f64)> {
    let mut page = 0;
    let mut y = first_top;
    heights
        .iter()
        .map(|&height| {
            let page_is_fresh = (page == 0 && y == first_top) || (page > 0 && y == next_top);
            if y + height > bottom && !page_is_fresh {
                page += 1;
                y = next_top;
            }
            let placed = (page, y);
            y += height;
            placed
        })
        .collect()
}

/// Renders a [`DeliveryNote`] onto A4 pages
pub struct NoteRenderer<'a> {
    note: &'a DeliveryNote,
    summary: NoteSummary,
}

impl<'a> NoteRenderer<'a> {
    pub fn new(note: &'a DeliveryNote) -> Self {
        Self {
            note,
            summary: note.totals().summary(),
        }
    }

    /// Render the note to PDF bytes
    pub fn render(&self, fonts: &FontSet) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new();
        doc.set_title(self.note.title());

        let mut family = FontFamilyBuilder::new().regular(fonts.regular.clone());
        if let Some(bold) = &fonts.bold {
            family = family.bold(bold.clone());
        }
        doc.register_font_family(FONT_FAMILY, family)?;
        doc.set_font(FONT_FAMILY, INFO_SIZE)?;

        let first_page = doc.add_page();
        let mut y = self.draw_header(&mut doc, first_page)?;
        y = self.draw_info(&mut doc, first_page, y)?;
        let (last_page, y) = self.draw_table(&mut doc, first_page, y)?;

        let (page, y) = if y + CLOSING_HEIGHT > CONTENT_BOTTOM {
            debug!("Summary moved to a new page");
            let page = doc.add_page();
            (page, self.draw_continuation_header(&mut doc, page)?)
        } else {
            (last_page, y)
        };
        let y = self.draw_summary(&mut doc, page, y + 10.0)?;
        self.draw_signatures(&mut doc, page, y + 24.0)?;

        self.draw_page_numbers(&mut doc)?;
        debug!(pages = doc.page_count(), rows = self.note.items.len(), "Rendered delivery note");
        Ok(doc.to_bytes()?)
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &self,
        doc: &mut PdfDocument,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        style: TextStyle,
        align: Align,
    ) -> Result<()> {
        doc.set_font_size(style.size);
        doc.set_font_weight(style.weight);
        doc.set_text_color(style.color);
        doc.insert_text(text, page, x, y, align)?;
        Ok(())
    }

    /// Title with extra space between characters, centered on `center`
    fn spaced_title(&self, doc: &mut PdfDocument, page: usize, center: f64, y: f64, size: f32) -> Result<()> {
        let style = TextStyle::bold(size);
        doc.set_font_size(style.size);
        doc.set_font_weight(style.weight);

        let chars: Vec<String> = self.note.title().chars().map(String::from).collect();
        let widths = chars
            .iter()
            .map(|c| doc.text_width(c))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let spacing = TITLE_SPACING * size as f64 / TITLE_SIZE as f64;
        let total: f64 = widths.iter().sum::<f64>() + spacing * chars.len().saturating_sub(1) as f64;

        let mut x = center - total / 2.0;
        for (c, width) in chars.iter().zip(widths) {
            self.text(doc, c, page, x, y, style, Align::Left)?;
            x += width + spacing;
        }
        Ok(())
    }

    fn draw_logo(&self, doc: &mut PdfDocument, page: usize) {
        let Some(url) = self.note.settings.logo.as_deref().filter(|url| !url.is_empty()) else {
            return;
        };
        let placed = decode_data_url(url).and_then(|bytes| {
            doc.insert_image(&bytes, page, MARGIN, MARGIN, 120.0, 48.0, ImageScaleMode::FitBox)
                .map_err(Into::into)
        });
        if let Err(e) = placed {
            warn!(error = %e, "Skipping logo");
        }
    }

    /// Logo, title, company name, note number and the header rule
    fn draw_header(&self, doc: &mut PdfDocument, page: usize) -> Result<f64> {
        self.draw_logo(doc, page);

        let center = A4_WIDTH / 2.0;
        self.spaced_title(doc, page, center, MARGIN + 26.0, TITLE_SIZE)?;

        let company = self.note.settings.company_name.trim();
        if !company.is_empty() {
            self.text(doc, company, page, center, MARGIN + 44.0, TextStyle::muted(10.0), Align::Center)?;
        }

        self.text(
            doc,
            &format!("编号：{}", self.note.note_number),
            page,
            RIGHT_EDGE,
            MARGIN + 26.0,
            TextStyle::regular(9.0),
            Align::Right,
        )?;

        let rule_y = MARGIN + 56.0;
        doc.draw_line(
            page,
            MARGIN,
            rule_y,
            RIGHT_EDGE,
            rule_y,
            &LineStyle {
                width: 1.5,
                color: Color::gray(0.2),
            },
        )?;
        Ok(rule_y + 22.0)
    }

    /// Compact header for pages after the first
    fn draw_continuation_header(&self, doc: &mut PdfDocument, page: usize) -> Result<f64> {
        self.spaced_title(doc, page, A4_WIDTH / 2.0, MARGIN + 16.0, 14.0)?;
        self.text(
            doc,
            &format!("编号：{}", self.note.note_number),
            page,
            RIGHT_EDGE,
            MARGIN + 16.0,
            TextStyle::regular(9.0),
            Align::Right,
        )?;
        doc.draw_line(page, MARGIN, MARGIN + 24.0, RIGHT_EDGE, MARGIN + 24.0, &LineStyle::default())?;
        Ok(MARGIN + 36.0)
    }

    /// Label followed by an underlined value
    #[allow(clippy::too_many_arguments)]
    fn labelled_field(
        &self,
        doc: &mut PdfDocument,
        page: usize,
        label: &str,
        value: &str,
        x: f64,
        end_x: f64,
        y: f64,
    ) -> Result<()> {
        let label_style = TextStyle::muted(INFO_SIZE);
        doc.set_font_size(label_style.size);
        doc.set_font_weight(label_style.weight);
        let label_width = doc.text_width(label)?;

        self.text(doc, label, page, x, y, label_style, Align::Left)?;
        let value_x = x + label_width + 4.0;
        self.text(doc, value, page, value_x, y, TextStyle::regular(INFO_SIZE), Align::Left)?;
        doc.draw_line(
            page,
            value_x - 2.0,
            y + 3.0,
            end_x,
            y + 3.0,
            &LineStyle {
                width: 0.5,
                color: Color::gray(0.6),
            },
        )?;
        Ok(())
    }

    /// Customer, delivery date and address rows
    fn draw_info(&self, doc: &mut PdfDocument, page: usize, y: f64) -> Result<f64> {
        let form = &self.note.form_data;
        let date = format_iso_date(&form.delivery_date).unwrap_or_else(|_| form.delivery_date.clone());
        let split = MARGIN + CONTENT_WIDTH * 0.6;

        self.labelled_field(doc, page, "客户名称：", &form.customer_name, MARGIN, split - 20.0, y)?;
        self.labelled_field(doc, page, "送货日期：", &date, split, RIGHT_EDGE, y)?;
        self.labelled_field(doc, page, "送货地址：", &form.delivery_address, MARGIN, RIGHT_EDGE, y + 22.0)?;
        Ok(y + 40.0)
    }

    fn draw_table_header(&self, doc: &mut PdfDocument, page: usize, y: f64) -> Result<f64> {
        let style = RectStyle {
            fill: Some(Color::gray(0.96)),
            stroke: Some(LineStyle::default()),
        };
        for ((title, _), (x, width)) in COLUMNS.iter().zip(column_layout()) {
            doc.draw_rect(page, x, y, width, HEADER_ROW_HEIGHT, &style)?;
            self.text(
                doc,
                title,
                page,
                x + width / 2.0,
                y + HEADER_ROW_HEIGHT / 2.0 + TABLE_SIZE as f64 * 0.35,
                TextStyle::bold(TABLE_SIZE),
                Align::Center,
            )?;
        }
        Ok(y + HEADER_ROW_HEIGHT)
    }

    fn row_cells(&self, index: usize, item: &LineItem) -> [String; 8] {
        let amount = self
            .summary
            .row_amounts
            .get(index)
            .cloned()
            .unwrap_or_default();
        [
            (index + 1).to_string(),
            item.name.clone(),
            item.spec.clone(),
            item.unit.clone(),
            item.quantity.trim().to_string(),
            item.price.trim().to_string(),
            amount,
            item.remark.clone(),
        ]
    }

    /// Item rows, continuing on new pages. Returns the last page and the y
    /// below the table.
    fn draw_table(&self, doc: &mut PdfDocument, first_page: usize, y: f64) -> Result<(usize, f64)> {
        let columns = column_layout();

        let rows: Vec<Vec<Vec<String>>> = self
            .note
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.row_cells(index, item)
                    .iter()
                    .zip(&columns)
                    .map(|(text, &(_, width))| wrap_text(text, cell_capacity(width)))
                    .collect()
            })
            .collect();
        let heights: Vec<f64> = rows
            .iter()
            .map(|cells| row_height(cells.iter().map(Vec::len).max().unwrap_or(1)))
            .collect();

        // Table header height is reserved on every page
        let first_top = y + HEADER_ROW_HEIGHT;
        let next_top = MARGIN + 36.0 + HEADER_ROW_HEIGHT;
        let placements = paginate(&heights, first_top, next_top, CONTENT_BOTTOM);

        let mut page = first_page;
        let mut bottom = self.draw_table_header(doc, page, y)?;
        let mut current_index = 0;

        for ((cells, height), (page_index, top)) in rows.iter().zip(&heights).zip(placements) {
            if page_index != current_index {
                current_index = page_index;
                page = doc.add_page();
                debug!(page, "Item table continues on new page");
                let header_y = self.draw_continuation_header(doc, page)?;
                self.draw_table_header(doc, page, header_y)?;
            }

            for (lines, &(x, width)) in cells.iter().zip(&columns) {
                doc.draw_rect(page, x, top, width, *height, &RectStyle::outlined(LineStyle::default()))?;

                let block = lines.len() as f64 * TABLE_LINE_HEIGHT;
                let first_baseline = top + (height - block) / 2.0 + TABLE_LINE_HEIGHT * 0.75;
                for (k, line) in lines.iter().enumerate() {
                    self.text(
                        doc,
                        line,
                        page,
                        x + width / 2.0,
                        first_baseline + k as f64 * TABLE_LINE_HEIGHT,
                        TextStyle::regular(TABLE_SIZE),
                        Align::Center,
                    )?;
                }
            }
            bottom = top + height;
        }

        Ok((page, bottom))
    }

    /// Totals box; returns the y below it
    fn draw_summary(&self, doc: &mut PdfDocument, page: usize, y: f64) -> Result<f64> {
        let summary = &self.summary;
        let height = 5.0 * SUMMARY_ROW_HEIGHT + 12.0;
        doc.draw_rect(
            page,
            MARGIN,
            y,
            CONTENT_WIDTH,
            height,
            &RectStyle {
                fill: Some(Color::gray(0.98)),
                stroke: Some(LineStyle {
                    width: 0.5,
                    color: Color::gray(0.9),
                }),
            },
        )?;

        let value_x = RIGHT_EDGE - 10.0;
        let label_x = value_x - 120.0;
        let rows = [
            ("合计金额：", summary.subtotal.as_str(), false),
            ("税率：", summary.tax_rate.as_str(), false),
            ("税额：", summary.tax_amount.as_str(), false),
            ("价税合计：", summary.grand_total.as_str(), true),
            ("大写金额：", summary.amount_in_words.as_str(), true),
        ];

        let mut baseline = y + 6.0 + SUMMARY_ROW_HEIGHT * 0.75;
        for (label, value, emphasized) in rows {
            let (label_style, value_style) = if emphasized {
                (TextStyle::bold(11.0), TextStyle::bold(11.0))
            } else {
                (TextStyle::muted(10.0), TextStyle::regular(10.0))
            };
            if label == "价税合计：" {
                let rule_y = baseline - SUMMARY_ROW_HEIGHT * 0.75 - 1.0;
                doc.draw_line(
                    page,
                    label_x - 80.0,
                    rule_y,
                    value_x,
                    rule_y,
                    &LineStyle {
                        width: 0.5,
                        color: Color::gray(0.85),
                    },
                )?;
            }

            // Long numeral text shifts its label left
            doc.set_font_size(value_style.size);
            doc.set_font_weight(value_style.weight);
            let value_width = doc.text_width(value)?;
            let label_right = label_x.min(value_x - value_width - 8.0);

            self.text(doc, label, page, label_right, baseline, label_style, Align::Right)?;
            self.text(doc, value, page, value_x, baseline, value_style, Align::Right)?;
            baseline += SUMMARY_ROW_HEIGHT;
        }

        Ok(y + height)
    }

    /// 制单人 / 拣货人 / 审核人 row and the 客户签收 line
    fn draw_signatures(&self, doc: &mut PdfDocument, page: usize, y: f64) -> Result<()> {
        let form = &self.note.form_data;
        let third = CONTENT_WIDTH / 3.0;
        let signers = [("制单人：", &form.maker), ("拣货人：", &form.picker), ("审核人：", &form.reviewer)];

        for (i, (label, value)) in signers.into_iter().enumerate() {
            let x = MARGIN + third * i as f64;
            self.labelled_field(doc, page, label, value, x, x + third - 20.0, y)?;
        }
        self.labelled_field(doc, page, "客户签收：", "", MARGIN, RIGHT_EDGE, y + 36.0)?;
        Ok(())
    }

    fn draw_page_numbers(&self, doc: &mut PdfDocument) -> Result<()> {
        let total = doc.page_count();
        for page in 1..=total {
            self.text(
                doc,
                &format!("第 {page} 页 / 共 {total} 页"),
                page,
                A4_WIDTH / 2.0,
                A4_HEIGHT - MARGIN,
                TextStyle::muted(8.0),
                Align::Center,
            )?;
        }
        Ok(())
    }
}
