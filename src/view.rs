use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chart::{self, Chart, ChartRequest};
use crate::table::{self, ColumnSpec, RenderedTable, Row};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no rows to render (the last row must hold the totals)")]
    InvalidData,

    #[error("chart total is zero, cannot compute slice shares")]
    DivisionByZero,

    #[error("column '{column}' reads index {index} but row {row} has only {width} values")]
    ColumnOutOfRange {
        column: String,
        index: usize,
        row: usize,
        width: usize,
    },

    #[error("non-numeric value '{value}' at row {row}, index {index}")]
    NonNumeric {
        row: usize,
        index: usize,
        value: String,
    },

    #[error("invalid chart threshold {value}, expected a fraction between 0 and 1")]
    InvalidThreshold { value: f64 },

    #[error("no column at position {position} (table has {columns} columns)")]
    UnknownColumn { position: usize, columns: usize },
}

fn default_show_graph() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ViewPayload {
    pub columns: Vec<ColumnSpec>,
    pub data: Vec<Row>,
    #[serde(default = "default_show_graph")]
    pub show_graph: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_title: Option<String>,
}

impl ViewPayload {
    pub fn graph_column(&self) -> usize {
        self.graph_column
            .unwrap_or_else(|| self.columns.len().saturating_sub(1))
    }

    pub fn graph_title(&self) -> Option<String> {
        self.graph_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct View {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub table: RenderedTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<Chart>,
}

impl View {
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

pub fn render_view(payload: &ViewPayload, threshold_fraction: f64) -> Result<View, RenderError> {
    let table = table::render_table(&payload.columns, &payload.data)?;
    let request = ChartRequest::from_payload(payload).with_threshold(threshold_fraction);
    let chart = chart::build_chart(&payload.data, &request, payload.graph_title())?;
    Ok(View {
        source: None,
        table,
        chart,
    })
}

pub fn render_table_view(payload: &ViewPayload) -> Result<View, RenderError> {
    Ok(View {
        source: None,
        table: table::render_table(&payload.columns, &payload.data)?,
        chart: None,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewTicket {
    generation: u64,
}

impl ViewTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

// Each navigation takes a ticket before its request goes out; a view is only
// shown when no later ticket is on screen.
#[derive(Debug, Default)]
pub struct ResultsPane {
    issued: AtomicU64,
    shown: Mutex<Option<(ViewTicket, Arc<View>)>>,
}

impl ResultsPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> ViewTicket {
        ViewTicket {
            generation: self.issued.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    pub fn present(&self, ticket: ViewTicket, view: View) -> bool {
        let mut shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((current, _)) = shown.as_ref() {
            if *current >= ticket {
                return false;
            }
        }
        *shown = Some((ticket, Arc::new(view)));
        true
    }

    pub fn current(&self) -> Option<Arc<View>> {
        let shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        shown.as_ref().map(|(_, view)| Arc::clone(view))
    }

    pub fn current_ticket(&self) -> Option<ViewTicket> {
        let shown = self.shown.lock().unwrap_or_else(|e| e.into_inner());
        shown.as_ref().map(|(ticket, _)| *ticket)
    }
}
