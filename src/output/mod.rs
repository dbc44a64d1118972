pub mod report;

use itertools::Itertools;

use crate::chart::Chart;
use crate::table::{money, Cell, ColumnType, PageLink, RenderedRow, RenderedTable};
use crate::view::View;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(format: OutputFormat, views: &[View]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(views),
        OutputFormat::Json => render_json(views),
        OutputFormat::Html => render_html(views),
    }
}

pub(crate) fn chart_value(table: &RenderedTable, chart: &Chart, value: f64) -> String {
    match table.format_for_index(chart.column_index) {
        Some(ColumnType::Money) => money::format_money(value),
        _ => value.to_string(),
    }
}

fn text_widths(table: &RenderedTable) -> Vec<usize> {
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.chars().count()).collect();
    for row in table.body.iter().chain(std::iter::once(&table.total)) {
        for (w, cell) in widths.iter_mut().zip(row.cells.iter()) {
            *w = (*w).max(cell.text().chars().count());
        }
    }
    widths
}

fn pad(text: &str, width: usize, right: bool) -> String {
    let fill = width.saturating_sub(text.chars().count());
    if right {
        format!("{}{}", " ".repeat(fill), text)
    } else {
        format!("{}{}", text, " ".repeat(fill))
    }
}

fn text_row(row: &RenderedRow, widths: &[usize]) -> String {
    row.cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| pad(cell.text(), *w, cell.is_right_aligned()))
        .join(" | ")
        .trim_end()
        .to_string()
}

fn render_text_table(out: &mut String, table: &RenderedTable) {
    let widths = text_widths(table);
    let header = table
        .header
        .iter()
        .zip(&widths)
        .zip(&table.formats)
        .map(|((h, w), kind)| pad(h, *w, kind.is_numeric()))
        .join(" | ");
    let rule = widths.iter().map(|w| "-".repeat(*w)).join("-+-");

    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for row in &table.body {
        out.push_str(&text_row(row, &widths));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out.push_str(&text_row(&table.total, &widths));
    out.push('\n');

    if let Some(paging) = table.paging {
        let (from, to) = if table.body.is_empty() {
            (0, 0)
        } else {
            (paging.start + 1, paging.start + table.body.len())
        };
        out.push_str(&format!(
            "Showing {from} to {to} of {} entries\n",
            paging.total_records
        ));
        if paging.total_pages > 1 {
            let links = paging.links().iter().map(page_link_text).join(" ");
            out.push_str(&format!("Pages: {links}\n"));
        }
    }
}

fn page_link_text(link: &PageLink) -> String {
    match link {
        PageLink::Page(n) => n.to_string(),
        PageLink::Current(n) => format!("[{n}]"),
        PageLink::Ellipsis => "…".to_string(),
    }
}

fn render_text_chart(out: &mut String, table: &RenderedTable, chart: &Chart) {
    out.push('\n');
    if let Some(title) = chart.title.as_deref() {
        out.push_str(title);
        out.push('\n');
    }
    let label_width = chart
        .buckets
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);
    let values: Vec<String> = chart
        .buckets
        .iter()
        .map(|b| chart_value(table, chart, b.value))
        .collect();
    let value_width = values.iter().map(|v| v.chars().count()).max().unwrap_or(0);
    for (bucket, value) in chart.buckets.iter().zip(&values) {
        out.push_str(&format!(
            "  {}  {}  {:>5.1}%\n",
            pad(&bucket.label, label_width, false),
            pad(value, value_width, true),
            bucket.share(chart.total) * 100.0
        ));
    }
}

pub fn render_text(views: &[View]) -> Vec<u8> {
    let mut out = String::new();
    for (i, view) in views.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if let Some(source) = view.source.as_deref() {
            out.push_str(&format!("== {source}\n"));
        }
        render_text_table(&mut out, &view.table);
        if let Some(chart) = view.chart.as_ref() {
            render_text_chart(&mut out, &view.table, chart);
        }
    }
    out.into_bytes()
}

pub fn render_json(views: &[View]) -> Vec<u8> {
    serde_json::to_vec_pretty(views).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render_html(views: &[View]) -> Vec<u8> {
    report::render_html(views)
}

pub(crate) fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub(crate) fn cell_html(cell: &Cell) -> String {
    match cell.css_class() {
        Some(class) => format!("<td class=\"{class}\">{}</td>", escape_html(cell.text())),
        None => format!("<td>{}</td>", escape_html(cell.text())),
    }
}
