use std::ops::Range;

use bytes::Bytes;
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::table::{paginate, ExportTable, TablePage};
use super::ExportArtifact;
use crate::error::ExportError;

pub const PDF_FILE_NAME: &str = "Sensor_Data.pdf";
pub const PDF_MIME: &str = "application/pdf";
pub const DOCUMENT_TITLE: &str = "Sensor Data";

// Landscape A4.
const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 14.0;
const TITLE_BASELINE_MM: f32 = 20.0;
const TABLE_TOP_MM: f32 = 30.0;
const ROW_HEIGHT_MM: f32 = 6.5;
const SEQUENCE_COLUMN_MM: f32 = 16.0;
const TIME_COLUMN_MM: f32 = 44.0;
const TITLE_FONT_SIZE: f32 = 16.0;
const CELL_FONT_SIZE: f32 = 7.5;

/// A run of rows from one logical page placed on one physical sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetBlock {
    pub page: usize,
    pub rows: Range<usize>,
}

/// Lines available on the first sheet (below the title) and on every following sheet.
pub fn sheet_capacities() -> (usize, usize) {
    let usable = |top: f32| ((PAGE_HEIGHT_MM - top - MARGIN_MM) / ROW_HEIGHT_MM).floor() as usize;
    (usable(TABLE_TOP_MM), usable(MARGIN_MM))
}

/// Lays logical pages onto physical sheets. Every block costs one header line plus its rows,
/// and consecutive blocks on the same sheet are separated by one blank line. Empty logical
/// pages produce no block.
pub fn plan_sheets(
    pages: &[TablePage<'_>],
    first_capacity: usize,
    capacity: usize,
) -> Vec<Vec<SheetBlock>> {
    let capacity = capacity.max(2);
    let mut sheets: Vec<Vec<SheetBlock>> = vec![Vec::new()];
    let mut remaining = first_capacity;

    for (page, logical) in pages.iter().enumerate() {
        let total = logical.rows.len();
        let mut start = 0;
        while start < total {
            if remaining < 2 {
                sheets.push(Vec::new());
                remaining = capacity;
            }
            let take = (remaining - 1).min(total - start);
            if let Some(sheet) = sheets.last_mut() {
                sheet.push(SheetBlock {
                    page,
                    rows: start..start + take,
                });
            }
            start += take;
            remaining = remaining.saturating_sub(take + 2);
        }
    }

    sheets
}

pub fn render_document(
    table: &ExportTable,
    first_page_rows: usize,
) -> Result<ExportArtifact, ExportError> {
    let pages = paginate(table, first_page_rows);
    let (first_capacity, capacity) = sheet_capacities();
    let sheets = plan_sheets(&pages, first_capacity, capacity);
    let headers = table.headers();

    let (doc, first_page, first_layer) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "table",
    );
    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (sheet_index, blocks) in sheets.iter().enumerate() {
        let layer = if sheet_index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "table");
            doc.get_page(page).get_layer(layer)
        };

        let mut top = if sheet_index == 0 {
            layer.use_text(
                DOCUMENT_TITLE,
                TITLE_FONT_SIZE,
                Mm(MARGIN_MM),
                Mm(PAGE_HEIGHT_MM - TITLE_BASELINE_MM),
                &bold,
            );
            TABLE_TOP_MM
        } else {
            MARGIN_MM
        };

        for block in blocks {
            top += ROW_HEIGHT_MM;
            draw_row(&layer, &bold, top, &headers);
            for row in &pages[block.page].rows[block.rows.clone()] {
                top += ROW_HEIGHT_MM;
                let cells: Vec<String> = row.cells().iter().map(ToString::to_string).collect();
                draw_row(&layer, &font, top, &cells);
            }
            top += ROW_HEIGHT_MM;
        }
    }

    let bytes = doc.save_to_bytes()?;
    Ok(ExportArtifact {
        file_name: PDF_FILE_NAME.to_string(),
        mime_type: PDF_MIME,
        bytes: Bytes::from(bytes),
    })
}

fn column_offsets(columns: usize) -> Vec<f32> {
    let value_columns = columns.saturating_sub(2).max(1) as f32;
    let value_width =
        (PAGE_WIDTH_MM - 2.0 * MARGIN_MM - SEQUENCE_COLUMN_MM - TIME_COLUMN_MM) / value_columns;
    (0..columns)
        .map(|col| match col {
            0 => MARGIN_MM,
            1 => MARGIN_MM + SEQUENCE_COLUMN_MM,
            n => MARGIN_MM + SEQUENCE_COLUMN_MM + TIME_COLUMN_MM + (n - 2) as f32 * value_width,
        })
        .collect()
}

/// `top` is measured from the top edge; PDF coordinates grow upward from the bottom.
fn draw_row(layer: &PdfLayerReference, font: &IndirectFontRef, top: f32, cells: &[String]) {
    let baseline = Mm(PAGE_HEIGHT_MM - top);
    for (text, x) in cells.iter().zip(column_offsets(cells.len())) {
        if text.is_empty() {
            continue;
        }
        layer.use_text(text.as_str(), CELL_FONT_SIZE, Mm(x), baseline, font);
    }
}
