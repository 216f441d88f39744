//! Tabular shape shared by the spreadsheet and document exports.

use std::fmt;

use chrono_tz::Tz;
use sensorgraph_parser::{ChannelKey, SensorReading};

use crate::aggregation::AggregateTable;
use crate::error::ExportError;

pub const SEQUENCE_HEADER: &str = "Sr. No";
pub const TIME_HEADER: &str = "Local Time";
pub const PRESSURE_HEADER: &str = "DP";
pub const AVERAGE_LABEL: &str = "Average";

const CHANNEL_COUNT: usize = ChannelKey::ALL.len();
const DATE_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(i64),
    Blank,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Blank => Ok(()),
        }
    }
}

/// Column headers in export order: sequence, time, sensor 1 bins, sensor 2 bins, pressure.
pub fn headers() -> Vec<String> {
    let mut headers = Vec::with_capacity(CHANNEL_COUNT + 2);
    headers.push(SEQUENCE_HEADER.to_string());
    headers.push(TIME_HEADER.to_string());
    for key in ChannelKey::ALL {
        headers.push(match key {
            ChannelKey::Pressure => PRESSURE_HEADER.to_string(),
            particle => particle.field_name(),
        });
    }
    headers
}

/// Column-wise rounded means. Building one is the export precondition: every channel must
/// have an average.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AverageRow {
    pub values: [i64; CHANNEL_COUNT],
}

impl AverageRow {
    pub fn from_table(averages: &AggregateTable) -> Result<Self, ExportError> {
        let mut values = [0; CHANNEL_COUNT];
        for key in ChannelKey::ALL {
            let mean = averages
                .mean(key)
                .ok_or(ExportError::MissingAverage { channel: key })?;
            values[key.column_index()] = mean.round() as i64;
        }
        Ok(Self { values })
    }

    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(CHANNEL_COUNT + 2);
        cells.push(Cell::Text(AVERAGE_LABEL.to_string()));
        cells.push(Cell::Blank);
        cells.extend(self.values.iter().map(|value| Cell::Number(*value)));
        cells
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    /// 1-based position in the full dataset.
    pub sequence: usize,
    /// Empty when the reading had no usable timestamp.
    pub local_time: String,
    pub values: [Option<i64>; CHANNEL_COUNT],
}

impl ExportRow {
    pub fn from_reading(sequence: usize, reading: &SensorReading, timezone: Tz) -> Self {
        let local_time = reading
            .created_at
            .map(|ts| ts.with_timezone(&timezone).format(DATE_TIME_FORMAT).to_string())
            .unwrap_or_default();
        let mut values = [None; CHANNEL_COUNT];
        for key in ChannelKey::ALL {
            values[key.column_index()] = reading.value(key);
        }
        Self {
            sequence,
            local_time,
            values,
        }
    }

    pub fn cells(&self) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(CHANNEL_COUNT + 2);
        cells.push(Cell::Number(self.sequence as i64));
        cells.push(if self.local_time.is_empty() {
            Cell::Blank
        } else {
            Cell::Text(self.local_time.clone())
        });
        cells.extend(
            self.values
                .iter()
                .map(|value| value.map(Cell::Number).unwrap_or(Cell::Blank)),
        );
        cells
    }
}

/// The full, unwindowed dataset plus its average row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportTable {
    pub average: AverageRow,
    pub rows: Vec<ExportRow>,
}

impl ExportTable {
    pub fn build(
        readings: &[SensorReading],
        averages: &AggregateTable,
        timezone: Tz,
    ) -> Result<Self, ExportError> {
        let average = AverageRow::from_table(averages)?;
        let rows = readings
            .iter()
            .enumerate()
            .map(|(index, reading)| ExportRow::from_reading(index + 1, reading, timezone))
            .collect();
        Ok(Self { average, rows })
    }

    pub fn headers(&self) -> Vec<String> {
        headers()
    }

    /// Average row first, then every data row in dataset order.
    pub fn body(&self) -> impl Iterator<Item = TableRow<'_>> {
        std::iter::once(TableRow::Average(&self.average)).chain(self.rows.iter().map(TableRow::Data))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TableRow<'a> {
    Average(&'a AverageRow),
    Data(&'a ExportRow),
}

impl TableRow<'_> {
    pub fn cells(&self) -> Vec<Cell> {
        match self {
            TableRow::Average(row) => row.cells(),
            TableRow::Data(row) => row.cells(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TablePage<'a> {
    pub rows: Vec<TableRow<'a>>,
}

impl TablePage<'_> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Splits the table into its two logical pages: the average row plus the first
/// `first_page_rows` data rows, then every remaining data row. The second page may be
/// empty; no row is ever dropped.
pub fn paginate(table: &ExportTable, first_page_rows: usize) -> [TablePage<'_>; 2] {
    let split = first_page_rows.min(table.rows.len());
    let (head, tail) = table.rows.split_at(split);

    let mut first = Vec::with_capacity(head.len() + 1);
    first.push(TableRow::Average(&table.average));
    first.extend(head.iter().map(TableRow::Data));

    [
        TablePage { rows: first },
        TablePage {
            rows: tail.iter().map(TableRow::Data).collect(),
        },
    ]
}
