use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::{ColoredString, Colorize};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;

use crate::chart::{self, ChartRequest, DEFAULT_THRESHOLD};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::fetch::{self, FetchOptions, Fetcher};
use crate::output::{self, OutputFormat};
use crate::table::sort::SortDirection;
use crate::view::{self, RenderError, ResultsPane, View, ViewPayload};

fn print_banner() {
    const BANNER: &str = r#"
                                 _
   ___ _ __   ___ _ __   __| |_   _(_) _____      __
  / __| '_ \ / _ \ '_ \ / _` \ \ / / |/ _ \ \ /\ / /
  \__ \ |_) |  __/ | | | (_| |\ V /| |  __/\ V  V /
  |___/ .__/ \___|_| |_|\__,_| \_/ |_|\___| \_/\_/
      |_|
       public-expenditure report viewer
    "#;
    eprint!("{}", BANNER);
    eprintln!();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn tagged(tag: ColoredString, message: &str) -> String {
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        tag,
        "]".bold().white(),
        message
    )
}

fn info(message: &str) -> String {
    tagged("INF".bold().blue(), message)
}

fn warn(message: &str) -> String {
    tagged("WRN".bold().yellow(), message)
}

fn error(message: &str) -> String {
    tagged("ERR".bold().red(), message)
}

fn format_label(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
        OutputFormat::Html => "html",
    }
}

#[derive(Clone, Debug)]
struct RunConfig {
    base_url: String,
    paths: Vec<String>,
    order_by: Option<String>,
    ascending: bool,
    sort: Option<(usize, SortDirection)>,
    threshold: f64,
    page: Option<(usize, usize)>,
    output: Option<String>,
    output_format: OutputFormat,
    show_all: bool,
    fetch: FetchOptions,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args
        .url
        .or(cfg.base_url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a base URL is required (--url or base_url in config)".to_string())?;
    reqwest::Url::parse(&base_url).map_err(|e| format!("invalid URL '{base_url}': {e}"))?;

    let raw_paths = if args.path.is_empty() {
        cfg.paths.unwrap_or_default()
    } else {
        args.path
    };
    let paths = crate::utils::normalize_paths(&raw_paths);
    if paths.is_empty() {
        return Err("at least one view path is required (--path or paths in config)".to_string());
    }

    let threshold = match args.threshold.or(cfg.threshold) {
        Some(raw) => crate::utils::parse_threshold_fraction(&raw)
            .map_err(|e| format!("invalid threshold '{raw}': {e}"))?,
        None => DEFAULT_THRESHOLD,
    };

    let page_size = args.page_size.or(cfg.page_size).unwrap_or(0);
    let page = match (args.page, page_size) {
        (Some(_), 0) => return Err("--page requires a page size".to_string()),
        (_, 0) => None,
        (page, size) => Some((page.unwrap_or(1).saturating_sub(1).saturating_mul(size), size)),
    };

    let output = args.output.or(cfg.output);
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let fetch = FetchOptions {
        timeout_seconds: args.timeout.or(cfg.timeout).unwrap_or(10),
        proxy: args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty()),
        header: args.header.or(cfg.header).filter(|h| !h.trim().is_empty()),
        ..FetchOptions::default()
    };

    let direction = if args.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };

    Ok(RunConfig {
        base_url,
        paths,
        order_by: args.order_by,
        ascending: args.asc,
        sort: args.sort_column.map(|column| (column, direction)),
        threshold,
        page,
        output,
        output_format,
        show_all: args.show_all.or(cfg.show_all).unwrap_or(false),
        fetch,
        no_color,
        verbose: args.verbose,
    })
}

// Chart failures only cost the chart; the table is still shown.
fn render_payload(
    payload: &ViewPayload,
    run: &RunConfig,
) -> Result<(View, Option<String>), RenderError> {
    let mut view = view::render_table_view(payload)?;
    let request = ChartRequest::from_payload(payload).with_threshold(run.threshold);
    let warning = match chart::build_chart(&payload.data, &request, payload.graph_title()) {
        Ok(chart) => {
            view.chart = chart;
            None
        }
        Err(e) => Some(format!("chart suppressed: {e}")),
    };
    if let Some((column, direction)) = run.sort {
        view.table = view.table.sorted_by(column, direction)?;
    }
    if let Some((start, length)) = run.page {
        view.table = view.table.page(start, length);
    }
    Ok((view, warning))
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    format_kv_line("URL", &run.base_url);
    format_kv_line("Views", &run.paths.join(", "));
    if let Some(order_by) = run.order_by.as_deref() {
        let dir = if run.ascending { "asc" } else { "desc" };
        format_kv_line("Order by", &format!("{order_by} ({dir})"));
    }
    format_kv_line("Threshold", &format!("{:.1}%", run.threshold * 100.0));
    format_kv_line("Format", format_label(run.output_format));
    format_kv_line("Output", run.output.as_deref().unwrap_or("stdout"));
    eprintln!();

    let fetcher = Fetcher::new(&run.fetch).map_err(|e| e.to_string())?;
    let pane = ResultsPane::new();

    let mut requests = Vec::with_capacity(run.paths.len());
    for path in run.paths.iter() {
        let url = fetch::view_url(&run.base_url, path, run.order_by.as_deref(), run.ascending)
            .map_err(|e| e.to_string())?;
        requests.push((path.clone(), url, pane.issue()));
    }

    let pb = ProgressBar::new(requests.len() as u64);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Progress: [{pos}/{len}] :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );

    let now = Instant::now();
    let mut pending = FuturesUnordered::new();
    for (index, (path, url, ticket)) in requests.into_iter().enumerate() {
        let fetcher = fetcher.clone();
        pending.push(async move {
            let result = fetcher.fetch(url.clone()).await;
            (index, path, url, ticket, result)
        });
    }

    let mut fetched: Vec<Option<View>> = vec![None; run.paths.len()];
    let mut failures = 0usize;
    while let Some((index, path, url, ticket, result)) = pending.next().await {
        pb.inc(1);
        pb.set_message(path.clone());

        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                failures += 1;
                pb.println(error(&e.to_string()));
                continue;
            }
        };
        if run.verbose > 0 {
            pb.println(info(&format!(
                "fetched {url} ({} rows, {} columns)",
                payload.data.len(),
                payload.columns.len()
            )));
        }

        let (view, warning) = match render_payload(&payload, &run) {
            Ok(rendered) => rendered,
            Err(e) => {
                failures += 1;
                pb.println(error(&format!("{path}: {e}")));
                continue;
            }
        };
        if let Some(warning) = warning {
            pb.println(warn(&format!("{path}: {warning}")));
        }

        let view = view.with_source(path.clone());
        if run.show_all {
            fetched[index] = Some(view.clone());
        }
        if !pane.present(ticket, view) && run.verbose > 0 {
            pb.println(info(&format!(
                "{path}: a newer view is already displayed, discarding"
            )));
        }
    }
    pb.finish_and_clear();

    let views: Vec<View> = if run.show_all {
        fetched.into_iter().flatten().collect()
    } else {
        if let (Some(ticket), true) = (pane.current_ticket(), run.verbose > 0) {
            eprintln!(
                "{}",
                info(&format!(
                    "showing navigation {} of {}",
                    ticket.generation(),
                    run.paths.len()
                ))
            );
        }
        pane.current()
            .map(|v| vec![(*v).clone()])
            .unwrap_or_default()
    };
    if views.is_empty() {
        return Err(format!(
            "no view could be rendered ({failures} of {} failed)",
            run.paths.len()
        ));
    }

    let bytes = output::render(run.output_format, &views);
    match run.output.as_deref() {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
            eprintln!("{}", info(&format!("wrote {} view(s) to {path}", views.len())));
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&bytes)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to flush stdout: {e}"))?;
        }
    }

    if failures > 0 {
        eprintln!("{}", warn(&format!("{failures} view(s) could not be rendered")));
    }
    eprintln!();
    eprintln!(
        ":: Completed :: {} view(s) in {}ms ::",
        views.len(),
        now.elapsed().as_millis()
    );

    Ok(())
}

fn load_effective_config(args: &CliArgs) -> Result<ConfigFile, String> {
    match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    if args.init_config {
        let path = args
            .config
            .as_deref()
            .map(config::expand_tilde)
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine the config file location".to_string())?;
        config::ensure_default_config_file(&path)?;
        println!("{}", path.display());
        return Ok(());
    }

    let cfg = load_effective_config(&args)?;
    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}

#[cfg(test)]
mod cli_tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        let mut full = vec!["spendview"];
        full.extend_from_slice(argv);
        CliArgs::parse_from(full)
    }

    #[test]
    fn defaults_apply_without_config() {
        let args = parse(&["-u", "http://localhost:8080/", "-p", "por_tipo"]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        assert_eq!(run.paths, vec!["por_tipo".to_string()]);
        assert_eq!(run.threshold, DEFAULT_THRESHOLD);
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.page, None);
        assert!(!run.show_all);
        assert_eq!(run.fetch.timeout_seconds, 10);
    }

    #[test]
    fn config_fills_missing_arguments() {
        let cfg = ConfigFile {
            base_url: Some("http://localhost:8080/".to_string()),
            paths: Some(vec!["por_partido".to_string(), "por_tipo".to_string()]),
            threshold: Some("10%".to_string()),
            output: Some("report.html".to_string()),
            page_size: Some(25),
            show_all: Some(true),
            ..ConfigFile::default()
        };
        let run = build_run_config(parse(&[]), cfg).unwrap();
        assert_eq!(run.paths.len(), 2);
        assert_eq!(run.threshold, 0.1);
        assert_eq!(run.output_format, OutputFormat::Html);
        assert_eq!(run.page, Some((0, 25)));
        assert!(run.show_all);
    }

    #[test]
    fn arguments_override_config() {
        let cfg = ConfigFile {
            base_url: Some("http://config.example/".to_string()),
            paths: Some(vec!["from_config".to_string()]),
            output_format: Some("json".to_string()),
            ..ConfigFile::default()
        };
        let args = parse(&[
            "-u",
            "http://cli.example/",
            "-p",
            "a,b",
            "--page",
            "3",
            "--page-size",
            "10",
            "-A",
            "text",
            "-s",
            "1",
            "--desc",
        ]);
        let run = build_run_config(args, cfg).unwrap();
        assert_eq!(run.base_url, "http://cli.example/");
        assert_eq!(run.paths, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(run.page, Some((20, 10)));
        assert_eq!(run.output_format, OutputFormat::Text);
        assert_eq!(run.sort, Some((1, SortDirection::Descending)));
    }

    #[test]
    fn missing_base_url_or_paths_is_an_error() {
        assert!(build_run_config(parse(&["-p", "x"]), ConfigFile::default()).is_err());
        assert!(build_run_config(parse(&["-u", "http://localhost/"]), ConfigFile::default()).is_err());
        assert!(
            build_run_config(parse(&["-u", "not a url", "-p", "x"]), ConfigFile::default())
                .is_err()
        );
    }

    #[test]
    fn page_without_size_is_an_error() {
        let args = parse(&["-u", "http://localhost/", "-p", "x", "--page", "2"]);
        assert!(build_run_config(args, ConfigFile::default()).is_err());
    }

    #[test]
    fn zero_total_drops_only_the_chart() {
        let payload: ViewPayload = serde_json::from_str(
            r#"{"columns":[{"label":"Tipo","type":"string","index":0},
                           {"label":"Valor","type":"money","index":1}],
                "data":[["Nada",0],["Total",0]],"show_graph":true,"graph_column":1}"#,
        )
        .unwrap();
        let run = build_run_config(
            parse(&["-u", "http://localhost/", "-p", "x"]),
            ConfigFile::default(),
        )
        .unwrap();
        let (view, warning) = render_payload(&payload, &run).unwrap();
        assert!(view.chart.is_none());
        assert!(warning.is_some());
        assert_eq!(view.table.body.len(), 1);
    }

    #[test]
    fn unchartable_column_keeps_the_table() {
        let run = build_run_config(
            parse(&["-u", "http://localhost/", "-p", "x"]),
            ConfigFile::default(),
        )
        .unwrap();
        let payload: ViewPayload = serde_json::from_str(
            r#"{"columns":[{"label":"Tipo","type":"string","index":0},
                           {"label":"Valor","type":"money","index":1}],
                "data":[["Sem valor",null],["Combustível",10],["Total",10]],
                "show_graph":true,"graph_column":1}"#,
        )
        .unwrap();
        let (view, warning) = render_payload(&payload, &run).unwrap();
        assert!(warning.is_none());
        let chart = view.chart.unwrap();
        assert_eq!(chart.buckets.last().unwrap().value, 0.0);
        assert_eq!(view.table.body.len(), 2);

        let payload: ViewPayload = serde_json::from_str(
            r#"{"columns":[{"label":"Tipo","type":"string","index":0},
                           {"label":"Valor","type":"money","index":1}],
                "data":[["Combustível","dez"],["Total",10]],
                "show_graph":true,"graph_column":1}"#,
        )
        .unwrap();
        let (view, warning) = render_payload(&payload, &run).unwrap();
        assert!(view.chart.is_none());
        assert!(warning.unwrap().contains("non-numeric"));
        assert_eq!(view.table.body[0].cells[1].text(), "dez");
    }

    #[test]
    fn repeated_paths_are_kept_whole() {
        let args = parse(&["-u", "http://localhost/", "-p", "gastos?ids=1,2", "-p", "por_tipo"]);
        let run = build_run_config(args, ConfigFile::default()).unwrap();
        assert_eq!(
            run.paths,
            vec!["gastos?ids=1,2".to_string(), "por_tipo".to_string()]
        );
    }
}
