use std::f64::consts::PI;

use super::{cell_html, chart_value, escape_html};
use crate::chart::Chart;
use crate::table::{PageLink, Paging, RenderedRow, RenderedTable};
use crate::view::View;

const SLICE_COLORS: [&str; 8] = [
    "#135bec", "#f59e0b", "#10b981", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#94a3b8",
];

fn json_for_script_tag(value: &str) -> String {
    value.replace("</", "<\\/")
}

fn row_html(row: &RenderedRow) -> String {
    let cells: String = row.cells.iter().map(cell_html).collect();
    match row.style.css_class() {
        Some(class) => format!("<tr class=\"{class}\">{cells}</tr>"),
        None => format!("<tr>{cells}</tr>"),
    }
}

fn table_html(table: &RenderedTable) -> String {
    let mut out = String::new();
    out.push_str("<table class=\"resultstable\">\n<thead><tr>");
    for label in &table.header {
        out.push_str(&format!("<th>{}</th>", escape_html(label)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.body {
        out.push_str(&row_html(row));
        out.push('\n');
    }
    out.push_str("</tbody>\n<tfoot>\n");
    out.push_str(&row_html(&table.total));
    out.push_str("\n</tfoot>\n</table>\n");
    if let Some(paging) = table.paging {
        let (from, to) = if table.body.is_empty() {
            (0, 0)
        } else {
            (paging.start + 1, paging.start + table.body.len())
        };
        out.push_str(&format!(
            "<p class=\"paging\">Showing {from} to {to} of {} entries</p>\n",
            paging.total_records
        ));
        if paging.total_pages > 1 {
            out.push_str(&pagination_html(&paging));
        }
    }
    out
}

fn pagination_html(paging: &Paging) -> String {
    let mut out = String::from("<ul class=\"pagination\">");
    for link in paging.links() {
        out.push_str(&match link {
            PageLink::Page(n) => format!("<li><a>{n}</a></li>"),
            PageLink::Current(n) => format!("<li class=\"active\"><a>{n}</a></li>"),
            PageLink::Ellipsis => "<li class=\"disabled\"><a>…</a></li>".to_string(),
        });
    }
    out.push_str("</ul>\n");
    out
}

fn point_on_circle(fraction: f64, radius: f64) -> (f64, f64) {
    let angle = 2.0 * PI * fraction - PI / 2.0;
    (radius + radius * angle.cos(), radius + radius * angle.sin())
}

fn pie_svg(chart: &Chart) -> String {
    let r: f64 = 100.0;
    let mut out = format!(
        "<svg class=\"graph\" viewBox=\"0 0 {d} {d}\" width=\"{d}\" height=\"{d}\">",
        d = 2.0 * r
    );
    let mut start = 0.0;
    for (i, bucket) in chart.buckets.iter().enumerate() {
        let share = bucket.share(chart.total).clamp(0.0, 1.0);
        if share <= 0.0 {
            continue;
        }
        let color = SLICE_COLORS[i % SLICE_COLORS.len()];
        if share >= 1.0 {
            out.push_str(&format!(
                "<circle cx=\"{r}\" cy=\"{r}\" r=\"{r}\" fill=\"{color}\"/>"
            ));
            break;
        }
        let (x1, y1) = point_on_circle(start, r);
        let (x2, y2) = point_on_circle(start + share, r);
        let large = if share > 0.5 { 1 } else { 0 };
        out.push_str(&format!(
            "<path d=\"M{r},{r} L{x1:.2},{y1:.2} A{r},{r} 0 {large} 1 {x2:.2},{y2:.2} Z\" fill=\"{color}\"/>"
        ));
        start += share;
    }
    out.push_str("</svg>");
    out
}

fn chart_html(table: &RenderedTable, chart: &Chart) -> String {
    let mut out = String::from("<div class=\"graphparent\">\n");
    if let Some(title) = chart.title.as_deref() {
        out.push_str(&format!(
            "<h3 class=\"graphtitle\">{}</h3>\n",
            escape_html(title)
        ));
    }
    out.push_str(&pie_svg(chart));
    out.push_str("\n<ul class=\"legend\">\n");
    for (i, bucket) in chart.buckets.iter().enumerate() {
        out.push_str(&format!(
            "<li><span class=\"swatch\" style=\"background:{}\"></span>{} <span class=\"right\">{}</span> ({:.1}%)</li>\n",
            SLICE_COLORS[i % SLICE_COLORS.len()],
            escape_html(&bucket.label),
            escape_html(&chart_value(table, chart, bucket.value)),
            bucket.share(chart.total) * 100.0
        ));
    }
    out.push_str("</ul>\n</div>\n");
    out
}

fn view_html(view: &View) -> String {
    let mut out = String::from("<section class=\"view\">\n");
    if let Some(source) = view.source.as_deref() {
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(source)));
    }
    out.push_str(&table_html(&view.table));
    if let Some(chart) = view.chart.as_ref() {
        out.push_str(&chart_html(&view.table, chart));
    }
    out.push_str("</section>\n");
    out
}

pub fn render_html(views: &[View]) -> Vec<u8> {
    let json = serde_json::to_string(views).unwrap_or_else(|_| "[]".to_string());
    let json = json_for_script_tag(&json);
    let body: String = views.iter().map(view_html).collect();

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="pt-BR">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Relatório de gastos</title>
  <style>
    body {{ font-family: sans-serif; margin: 2em; color: #0f172a; }}
    table {{ border-collapse: collapse; width: 100%; margin-bottom: 1em; }}
    th, td {{ padding: 4px 8px; border-bottom: 1px solid #e2e8f0; text-align: left; }}
    tr.odd {{ background: #f8fafc; }}
    tr.final {{ font-weight: bold; border-top: 2px solid #0f172a; }}
    td.right {{ text-align: right; white-space: nowrap; }}
    .graphparent {{ display: flex; gap: 2em; align-items: center; }}
    .legend {{ list-style: none; padding: 0; }}
    .swatch {{ display: inline-block; width: 12px; height: 12px; margin-right: 6px; }}
  </style>
</head>
<body>
  <script type="application/json" id="views-data">{json}</script>
{body}</body>
</html>
"####
    );
    html.into_bytes()
}
