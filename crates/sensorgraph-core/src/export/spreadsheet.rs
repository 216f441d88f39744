use bytes::Bytes;
use rust_xlsxwriter::{Format, Workbook};
use serde::Deserialize;

use super::table::{Cell, ExportTable};
use super::ExportArtifact;
use crate::error::ExportError;

pub const XLSX_FILE_NAME: &str = "Sensor_data.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_FILE_NAME: &str = "Sensor_data.csv";
pub const CSV_MIME: &str = "text/csv";
pub const SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadsheetFormat {
    #[default]
    Xlsx,
    Csv,
}

pub fn render_spreadsheet(
    table: &ExportTable,
    format: SpreadsheetFormat,
) -> Result<ExportArtifact, ExportError> {
    let artifact = match format {
        SpreadsheetFormat::Xlsx => ExportArtifact {
            file_name: XLSX_FILE_NAME.to_string(),
            mime_type: XLSX_MIME,
            bytes: Bytes::from(encode_xlsx(table)?),
        },
        SpreadsheetFormat::Csv => ExportArtifact {
            file_name: CSV_FILE_NAME.to_string(),
            mime_type: CSV_MIME,
            bytes: Bytes::from(encode_csv(table)?),
        },
    };
    Ok(artifact)
}

fn encode_xlsx(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header.as_str(), &header_format)?;
    }

    for (offset, row) in table.body().enumerate() {
        let row_num = offset as u32 + 1;
        for (col, cell) in row.cells().iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row_num, col, text.as_str())?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row_num, col, *value as f64)?;
                }
                Cell::Blank => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn encode_csv(table: &ExportTable) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.headers())?;
    for row in table.body() {
        writer.write_record(row.cells().iter().map(Cell::to_string))?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Spreadsheet(err.to_string()))
}
