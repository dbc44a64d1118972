pub fn parse_threshold_fraction(value: &str) -> Result<f64, String> {
    let raw = value.trim();
    if raw.is_empty() {
        return Err("empty threshold".to_string());
    }
    let fraction = match raw.strip_suffix('%') {
        Some(pct) => {
            pct.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid percentage '{raw}'"))?
                / 100.0
        }
        None => raw
            .parse::<f64>()
            .map_err(|_| format!("invalid fraction '{raw}'"))?,
    };
    if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
        return Err(format!("threshold '{raw}' must be between 0 and 1 (or 0% and 100%)"));
    }
    Ok(fraction)
}

pub fn parse_header_line(value: &str) -> Result<(String, String), String> {
    let (name, val) = value
        .split_once(':')
        .ok_or_else(|| "expected 'Key: Value'".to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((name.to_string(), val.trim().to_string()))
}

// Paths are taken whole; a query such as `ids=1,2` may contain commas.
pub fn normalize_paths(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for path in values.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !out.iter().any(|p| p == path) {
            out.push(path.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_threshold_accepts_fraction_and_percentage() {
        assert_eq!(parse_threshold_fraction("0.05").unwrap(), 0.05);
        assert_eq!(parse_threshold_fraction(" 10% ").unwrap(), 0.1);
        assert_eq!(parse_threshold_fraction("0").unwrap(), 0.0);
    }

    #[test]
    fn parse_threshold_rejects_out_of_range() {
        assert!(parse_threshold_fraction("").is_err());
        assert!(parse_threshold_fraction("abc").is_err());
        assert!(parse_threshold_fraction("1.5").is_err());
        assert!(parse_threshold_fraction("-1%").is_err());
        assert!(parse_threshold_fraction("NaN").is_err());
    }

    #[test]
    fn parse_header_line_splits_on_first_colon() {
        let (k, v) = parse_header_line("Referer: http://localhost:8080/").unwrap();
        assert_eq!(k, "Referer");
        assert_eq!(v, "http://localhost:8080/");
        assert!(parse_header_line("no-colon").is_err());
        assert!(parse_header_line(": value").is_err());
    }

    #[test]
    fn normalize_paths_dedupes_in_order() {
        let raw: Vec<String> = ["por_partido", " por_tipo", "", "por_partido"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            normalize_paths(&raw),
            vec!["por_partido".to_string(), "por_tipo".to_string()]
        );
    }

    #[test]
    fn normalize_paths_keeps_commas_in_queries() {
        let raw = vec!["gastos?ids=1,2".to_string()];
        assert_eq!(normalize_paths(&raw), vec!["gastos?ids=1,2".to_string()]);
    }
}
