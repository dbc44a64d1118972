use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "spendview",
    version,
    about = "public-expenditure report viewer",
    long_about = "spendview fetches report views (JSON tables whose last row holds the totals) and renders them as text, JSON or HTML, with a pie chart of the charted column.\n\nExamples:\n  spendview -u http://localhost:8080/ -p por_partido\n  spendview -u http://localhost:8080/ -p por_tipo --order-by valor --asc\n  spendview -u http://localhost:8080/ -p por_partido -p por_tipo --all -o report.html\n\nTip: Use --config to keep the base URL and output settings out of the command line."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Input",
        help = "Base URL of the report site."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'p',
        long = "pth",
        visible_alias = "path",
        value_name = "PATH",
        action = ArgAction::Append,
        help_heading = "Input",
        help = "View path to fetch (repeatable, in navigation order)."
    )]
    pub path: Vec<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.spendview/config.yml when present)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Input",
        help = "Write the default config file if it does not exist yet, then exit."
    )]
    pub init_config: bool,

    #[arg(
        short = 'O',
        long = "ob",
        visible_alias = "order-by",
        value_name = "COLUMN",
        help_heading = "Sorting",
        help = "Ask the server to order rows by this column id (order_by)."
    )]
    pub order_by: Option<String>,

    #[arg(
        long = "asc",
        help_heading = "Sorting",
        help = "Ascending server-side order (asc=1); requires --order-by."
    )]
    pub asc: bool,

    #[arg(
        short = 's',
        long = "sc",
        visible_alias = "sort-column",
        value_name = "N",
        help_heading = "Sorting",
        help = "Re-sort the rendered rows by displayed column N (0-based)."
    )]
    pub sort_column: Option<usize>,

    #[arg(
        long = "desc",
        help_heading = "Sorting",
        help = "Descending order for --sort-column."
    )]
    pub desc: bool,

    #[arg(
        short = 'g',
        long = "thr",
        visible_alias = "threshold",
        value_name = "FRACTION",
        help_heading = "Chart",
        help = "Share of the total a row must exceed to get its own slice (0.05 or 5%)."
    )]
    pub threshold: Option<String>,

    #[arg(
        long = "pg",
        visible_alias = "page",
        value_name = "N",
        help_heading = "Paging",
        help = "Page number to show (1-based); requires a page size."
    )]
    pub page: Option<usize>,

    #[arg(
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Paging",
        help = "Rows per page (0 = no paging)."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered views to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text, json, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'a',
        long = "all",
        visible_alias = "show-all",
        num_args = 0..=1,
        default_missing_value = "true",
        help_heading = "Output",
        help = "Emit every fetched view instead of only the latest navigation."
    )]
    pub show_all: Option<bool>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'x',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,
}
