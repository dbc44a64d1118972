use serde::Serialize;

use crate::table::{CellValue, Row};
use crate::view::{RenderError, ViewPayload};

pub const DEFAULT_THRESHOLD: f64 = 0.05;

pub const OTHER_LABEL: &str = "Outros";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartRequest {
    pub enabled: bool,
    pub column_index: usize,
    pub threshold_fraction: f64,
}

impl Default for ChartRequest {
    fn default() -> Self {
        Self {
            enabled: false,
            column_index: 0,
            threshold_fraction: DEFAULT_THRESHOLD,
        }
    }
}

impl ChartRequest {
    pub fn new(column_index: usize) -> Self {
        Self {
            enabled: true,
            column_index,
            ..Self::default()
        }
    }

    pub fn with_threshold(mut self, threshold_fraction: f64) -> Self {
        self.threshold_fraction = threshold_fraction;
        self
    }

    pub fn from_payload(payload: &ViewPayload) -> Self {
        Self {
            enabled: payload.show_graph,
            column_index: payload.graph_column(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartBucket {
    pub label: String,
    pub value: f64,
}

impl ChartBucket {
    pub fn share(&self, total: f64) -> f64 {
        if total == 0.0 {
            0.0
        } else {
            self.value / total
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Chart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub column_index: usize,
    pub total: f64,
    pub buckets: Vec<ChartBucket>,
}

fn numeric_at(row: &Row, row_index: usize, index: usize) -> Result<f64, RenderError> {
    match row.get(index) {
        Some(CellValue::Number(n)) => Ok(*n),
        Some(CellValue::Null) => Ok(0.0),
        Some(other) => Err(RenderError::NonNumeric {
            row: row_index,
            index,
            value: other.to_string(),
        }),
        None => Err(RenderError::ColumnOutOfRange {
            column: format!("#{index}"),
            index,
            row: row_index,
            width: row.len(),
        }),
    }
}

fn label_at(row: &Row, row_index: usize) -> Result<String, RenderError> {
    row.first()
        .map(|v| v.to_string())
        .ok_or_else(|| RenderError::ColumnOutOfRange {
            column: "label".to_string(),
            index: 0,
            row: row_index,
            width: 0,
        })
}

/// The last row is the denominator. Only a share strictly greater than
/// `threshold_fraction` gets its own bucket; the rest, nulls included, is
/// summed into a trailing [`OTHER_LABEL`] bucket that is present even when empty.
pub fn bucket_for_chart(
    rows: &[Row],
    column_index: usize,
    threshold_fraction: f64,
) -> Result<Vec<ChartBucket>, RenderError> {
    if !threshold_fraction.is_finite() || !(0.0..=1.0).contains(&threshold_fraction) {
        return Err(RenderError::InvalidThreshold {
            value: threshold_fraction,
        });
    }
    let (total_row, body) = rows.split_last().ok_or(RenderError::InvalidData)?;
    let total = numeric_at(total_row, rows.len() - 1, column_index)?;
    if total == 0.0 {
        return Err(RenderError::DivisionByZero);
    }

    let mut buckets = Vec::new();
    let mut other = 0.0;
    for (i, row) in body.iter().enumerate() {
        let value = numeric_at(row, i, column_index)?;
        if value / total > threshold_fraction {
            buckets.push(ChartBucket {
                label: label_at(row, i)?,
                value,
            });
        } else {
            other += value;
        }
    }
    buckets.push(ChartBucket {
        label: OTHER_LABEL.to_string(),
        value: other,
    });
    Ok(buckets)
}

pub fn build_chart(
    rows: &[Row],
    request: &ChartRequest,
    title: Option<String>,
) -> Result<Option<Chart>, RenderError> {
    if !request.enabled {
        return Ok(None);
    }
    let buckets = bucket_for_chart(rows, request.column_index, request.threshold_fraction)?;
    let total = rows
        .last()
        .and_then(|r| r.get(request.column_index))
        .and_then(CellValue::as_number)
        .unwrap_or_default();
    Ok(Some(Chart {
        title,
        column_index: request.column_index,
        total,
        buckets,
    }))
}
