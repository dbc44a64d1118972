use crate::cli::args::CliArgs;
use crate::output::OutputFormat;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.threshold.as_deref() {
        crate::utils::parse_threshold_fraction(raw)
            .map_err(|e| format!("invalid --threshold '{raw}': {e}"))?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json or html"
            ));
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header_line(raw)
            .map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    if args.asc && args.order_by.is_none() {
        return Err("--asc requires --order-by".to_string());
    }
    if args.desc && args.sort_column.is_none() {
        return Err("--desc requires --sort-column".to_string());
    }
    if let Some(page) = args.page {
        if page == 0 {
            return Err("invalid page, expected positive integer".to_string());
        }
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    Ok(())
}
