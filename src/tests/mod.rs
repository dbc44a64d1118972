use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::chart::{bucket_for_chart, ChartRequest, OTHER_LABEL};
use crate::fetch::{self, FetchError, FetchOptions, Fetcher};
use crate::row;
use crate::table::{render_table, Cell, ColumnSpec, ColumnType, RowStyle};
use crate::view::{self, ResultsPane};

#[test]
fn expense_scenario_renders_body_and_totals() {
    let columns: Vec<ColumnSpec> = serde_json::from_str(
        r#"[{"label":"Tipo","type":"string","index":0},
            {"label":"Valor","type":"money","index":1,"skipTotal":false}]"#,
    )
    .unwrap();
    let rows = vec![
        row!["Combustível", 100],
        row!["Material", 50],
        row!["TOTAL", 150],
    ];
    let table = render_table(&columns, &rows).unwrap();

    assert_eq!(table.header, vec!["Tipo".to_string(), "Valor".to_string()]);
    assert_eq!(table.formats, vec![ColumnType::Text, ColumnType::Money]);
    assert_eq!(table.body_rows().len(), 2);
    assert_eq!(table.total_row(), &row!["TOTAL", 150]);
    assert_eq!(table.body[0].cells[1], Cell::Money("R$ 100,00".into()));
    assert_eq!(table.body[1].cells[1], Cell::Money("R$ 50,00".into()));
    assert_eq!(table.body[1].style, RowStyle::Odd);
    assert_eq!(table.total.cells[0], Cell::Text("TOTAL".into()));
    assert_eq!(table.total.cells[1], Cell::Money("R$ 150,00".into()));
}

#[test]
fn skip_total_column_is_blank_whatever_the_total_value() {
    let columns = vec![
        ColumnSpec::text("Deputad@", 0),
        ColumnSpec::money("Média", 1).skipping_total(),
        ColumnSpec::money("Total", 2),
    ];
    let rows = vec![
        row!["Fulano", 10, 120],
        row!["Beltrana", 20, 240],
        row!["Total", 99_999, 360],
    ];
    let table = render_table(&columns, &rows).unwrap();
    assert_eq!(table.total.cells[1], Cell::Empty);
    assert_eq!(table.total.cells[2], Cell::Money("R$ 360,00".into()));
    assert_eq!(table.body[0].cells[1], Cell::Money("R$ 10,00".into()));
}

#[test]
fn threshold_boundary_folds_into_outros() {
    let rows = vec![row!["A", 5], row!["B", 95], row!["Total", 100]];
    let buckets = bucket_for_chart(&rows, 1, 0.05).unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!((buckets[0].label.as_str(), buckets[0].value), ("B", 95.0));
    assert_eq!(
        (buckets[1].label.as_str(), buckets[1].value),
        (OTHER_LABEL, 5.0)
    );
}

#[test]
fn bucket_values_sum_to_total_for_many_thresholds() {
    let rows = vec![
        row!["PT", 3_200],
        row!["PMDB", 2_100],
        row!["PSDB", 1_900],
        row!["PV", 410],
        row!["PSOL", 250],
        row!["PCdoB", 140],
        row!["Total", 8_000],
    ];
    for threshold in [0.0, 0.01, 0.03, 0.05, 0.1, 0.25, 0.5, 1.0] {
        let request = ChartRequest::new(1).with_threshold(threshold);
        let buckets =
            bucket_for_chart(&rows, request.column_index, request.threshold_fraction).unwrap();
        let sum: f64 = buckets.iter().map(|b| b.value).sum();
        assert_eq!(sum, 8_000.0, "threshold {threshold}");
        assert_eq!(buckets.last().unwrap().label, OTHER_LABEL);
    }
}

struct CannedResponse {
    status_line: &'static str,
    body: String,
}

/// Serves one canned HTTP response and reports the request line it got.
async fn serve_once(response: CannedResponse) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let first_line = request.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(first_line).await;
            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response.status_line,
                response.body.len(),
                response.body
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    (format!("http://{addr}/"), rx)
}

fn local_fetcher() -> Fetcher {
    Fetcher::new(&FetchOptions {
        timeout_seconds: 5,
        system_proxy: false,
        ..FetchOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn fetch_and_render_a_view() {
    let body = r#"{"columns":[{"label":"Partido","type":"string","index":0},
                              {"label":"Valor","type":"money","index":1}],
                   "data":[["PT",700],["PV",280],["PSOL",20],["Total",1000]],
                   "show_graph":true,"graph_column":1,"graph_title":"Por partido"}"#;
    let (base, mut requests) = serve_once(CannedResponse {
        status_line: "200 OK",
        body: body.to_string(),
    })
    .await;

    let url = fetch::view_url(&base, "por_partido", Some("valor"), true).unwrap();
    let payload = local_fetcher().fetch(url).await.unwrap();
    let request_line = requests.recv().await.unwrap();
    assert_eq!(
        request_line,
        "GET /por_partido?order_by=valor&asc=1 HTTP/1.1"
    );

    let view = view::render_view(&payload, 0.05).unwrap();
    assert_eq!(view.table.body.len(), 3);
    let chart = view.chart.unwrap();
    let labels: Vec<&str> = chart.buckets.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["PT", "PV", OTHER_LABEL]);
    assert_eq!(chart.buckets[2].value, 20.0);
}

#[tokio::test]
async fn fetch_reports_http_status() {
    let (base, _requests) = serve_once(CannedResponse {
        status_line: "404 Not Found",
        body: "{}".to_string(),
    })
    .await;
    let url = fetch::view_url(&base, "missing", None, false).unwrap();
    let err = local_fetcher().fetch(url).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn fetch_reports_malformed_payload() {
    let (base, _requests) = serve_once(CannedResponse {
        status_line: "200 OK",
        body: r#"{"columns": "nope"}"#.to_string(),
    })
    .await;
    let url = fetch::view_url(&base, "broken", None, false).unwrap();
    let err = local_fetcher().fetch(url).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode { .. }));
}

#[tokio::test]
async fn slow_older_navigation_does_not_replace_newer_view() {
    let payload: view::ViewPayload =
        serde_json::from_str(r#"{"columns":[],"data":[["Total"]],"show_graph":false}"#).unwrap();
    let pane = std::sync::Arc::new(ResultsPane::new());
    let older = pane.issue();
    let newer = pane.issue();

    let (done_tx, mut done_rx) = mpsc::channel::<bool>(2);
    let fast = {
        let pane = pane.clone();
        let view = view::render_table_view(&payload).unwrap().with_source("newer");
        let done_tx = done_tx.clone();
        tokio::spawn(async move {
            let _ = done_tx.send(pane.present(newer, view)).await;
        })
    };
    fast.await.unwrap();
    let slow = {
        let pane = pane.clone();
        let view = view::render_table_view(&payload).unwrap().with_source("older");
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let _ = done_tx.send(pane.present(older, view)).await;
        })
    };
    slow.await.unwrap();

    assert_eq!(done_rx.recv().await, Some(true));
    assert_eq!(done_rx.recv().await, Some(false));
    assert_eq!(pane.current().unwrap().source.as_deref(), Some("newer"));
}
