pub mod money;
pub mod sort;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::view::RenderError;

// Unknown wire types fall back to plain text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ColumnType {
    #[default]
    Text,
    Money,
    Number,
}

impl ColumnType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "money" => Self::Money,
            "number" => Self::Number,
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "string",
            Self::Money => "money",
            Self::Number => "number",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Money | Self::Number)
    }

    pub fn format(&self, value: &CellValue) -> Cell {
        match (self, value) {
            (Self::Money, CellValue::Number(n)) => Cell::Money(money::format_money(*n)),
            // Already rendered server-side (or missing).
            (Self::Money, other) => Cell::Money(other.to_string()),
            (Self::Number, other) => Cell::Number(other.to_string()),
            (Self::Text, other) => Cell::Text(other.to_string()),
        }
    }
}

impl From<String> for ColumnType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<ColumnType> for String {
    fn from(value: ColumnType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColumnSpec {
    pub label: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnType,
    pub index: usize,
    #[serde(default, alias = "skipTotal")]
    pub skip_total: bool,
}

impl ColumnSpec {
    pub fn new(label: impl Into<String>, kind: ColumnType, index: usize) -> Self {
        Self {
            label: label.into(),
            kind,
            index,
            skip_total: false,
        }
    }

    pub fn text(label: impl Into<String>, index: usize) -> Self {
        Self::new(label, ColumnType::Text, index)
    }

    pub fn money(label: impl Into<String>, index: usize) -> Self {
        Self::new(label, ColumnType::Money, index)
    }

    pub fn skipping_total(mut self) -> Self {
        self.skip_total = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

pub type Row = Vec<CellValue>;

/// Builds a row from heterogeneous literals: `row!["Combustível", 100]`.
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::table::CellValue::from($value)),*]
    };
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Cell {
    Text(String),
    Money(String),
    Number(String),
    Empty,
}

impl Cell {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(s) | Self::Money(s) | Self::Number(s) => s,
            Self::Empty => "",
        }
    }

    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Self::Money(_) | Self::Number(_) => Some("right"),
            Self::Empty => Some("empty"),
            Self::Text(_) => None,
        }
    }

    pub fn is_right_aligned(&self) -> bool {
        matches!(self, Self::Money(_) | Self::Number(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStyle {
    Even,
    Odd,
    Final,
}

impl RowStyle {
    pub fn for_index(index: usize) -> Self {
        if index % 2 != 0 {
            Self::Odd
        } else {
            Self::Even
        }
    }

    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Self::Even => None,
            Self::Odd => Some("odd"),
            Self::Final => Some("final"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedRow {
    pub style: RowStyle,
    pub raw: Row,
    pub cells: Vec<Cell>,
}

pub const SHOW_PAGES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Paging {
    pub start: usize,
    pub length: usize,
    pub total_records: usize,
    pub current_page: usize,
    pub total_pages: usize,
    pub first_page: usize,
    pub last_page: usize,
    pub leading_ellipsis: bool,
    pub trailing_ellipsis: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLink {
    Page(usize),
    Current(usize),
    Ellipsis,
}

impl Paging {
    // Pages are 1-based. The window of SHOW_PAGES pages is centered on the
    // current page and clamped at both ends.
    pub fn new(start: usize, length: usize, total_records: usize) -> Self {
        let length = length.max(1);
        let current_page = start / length + 1;
        let total_pages = total_records / length + usize::from(total_records % length != 0);
        let half = SHOW_PAGES / 2;

        let (first_page, last_page) = if total_pages < SHOW_PAGES {
            (1, total_pages)
        } else if current_page <= half {
            (1, SHOW_PAGES)
        } else if current_page + half > total_pages {
            (total_pages - SHOW_PAGES + 1, total_pages)
        } else {
            (current_page - half, current_page + half)
        };

        Self {
            start,
            length,
            total_records,
            current_page,
            total_pages,
            first_page,
            last_page,
            leading_ellipsis: first_page > 1,
            trailing_ellipsis: last_page < total_pages,
        }
    }

    pub fn links(&self) -> Vec<PageLink> {
        let mut links = Vec::new();
        if self.leading_ellipsis {
            links.push(PageLink::Page(1));
            links.push(PageLink::Ellipsis);
        }
        for page in self.first_page..=self.last_page {
            if page == self.current_page {
                links.push(PageLink::Current(page));
            } else {
                links.push(PageLink::Page(page));
            }
        }
        if self.trailing_ellipsis {
            links.push(PageLink::Ellipsis);
            links.push(PageLink::Page(self.total_pages));
        }
        links
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderedTable {
    pub header: Vec<String>,
    pub formats: Vec<ColumnType>,
    #[serde(skip)]
    pub(crate) indices: Vec<usize>,
    pub body: Vec<RenderedRow>,
    pub total: RenderedRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paging: Option<Paging>,
}

impl RenderedTable {
    pub fn body_rows(&self) -> Vec<&Row> {
        self.body.iter().map(|r| &r.raw).collect()
    }

    pub fn total_row(&self) -> &Row {
        &self.total.raw
    }

    pub fn format_for_index(&self, index: usize) -> Option<ColumnType> {
        self.indices
            .iter()
            .position(|i| *i == index)
            .map(|pos| self.formats[pos])
    }

    pub fn page(&self, start: usize, length: usize) -> RenderedTable {
        let total_records = self.body.len();
        let from = start.min(total_records);
        let to = start.saturating_add(length).min(total_records);
        RenderedTable {
            header: self.header.clone(),
            formats: self.formats.clone(),
            indices: self.indices.clone(),
            body: self.body[from..to].to_vec(),
            total: self.total.clone(),
            paging: Some(Paging::new(start, length, total_records)),
        }
    }
}

fn cell_at<'a>(
    row: &'a Row,
    row_index: usize,
    column: &ColumnSpec,
) -> Result<&'a CellValue, RenderError> {
    row.get(column.index)
        .ok_or_else(|| RenderError::ColumnOutOfRange {
            column: column.label.clone(),
            index: column.index,
            row: row_index,
            width: row.len(),
        })
}

pub fn render_table(columns: &[ColumnSpec], rows: &[Row]) -> Result<RenderedTable, RenderError> {
    let (total_raw, body_raw) = rows.split_last().ok_or(RenderError::InvalidData)?;

    let mut body = Vec::with_capacity(body_raw.len());
    for (i, row) in body_raw.iter().enumerate() {
        let mut cells = Vec::with_capacity(columns.len());
        for column in columns {
            cells.push(column.kind.format(cell_at(row, i, column)?));
        }
        body.push(RenderedRow {
            style: RowStyle::for_index(i),
            raw: row.clone(),
            cells,
        });
    }

    let total_index = rows.len() - 1;
    let mut total_cells = Vec::with_capacity(columns.len());
    for column in columns {
        if column.skip_total {
            total_cells.push(Cell::Empty);
            continue;
        }
        total_cells.push(column.kind.format(cell_at(total_raw, total_index, column)?));
    }

    Ok(RenderedTable {
        header: columns.iter().map(|c| c.label.clone()).collect(),
        formats: columns.iter().map(|c| c.kind).collect(),
        indices: columns.iter().map(|c| c.index).collect(),
        body,
        total: RenderedRow {
            style: RowStyle::Final,
            raw: total_raw.clone(),
            cells: total_cells,
        },
        paging: None,
    })
}
