use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub paths: Option<Vec<String>>,
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    pub header: Option<String>,
    #[serde(default, alias = "graph_threshold", deserialize_with = "threshold_text")]
    pub threshold: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub page_size: Option<usize>,
    pub no_color: Option<bool>,
    pub show_all: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Threshold {
    Text(String),
    Number(f64),
}

// `threshold: 0.1` and `threshold: "10%"` are both accepted.
fn threshold_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Threshold>::deserialize(d)?.map(|t| match t {
        Threshold::Text(text) => text,
        Threshold::Number(n) => n.to_string(),
    }))
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".spendview").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn parse_config(contents: &str) -> Result<ConfigFile, String> {
    serde_yaml::from_str::<ConfigFile>(contents).map_err(|e| e.to_string())
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    r#"# spendview config
#
# Location (default):
#   ~/.spendview/config.yml

# Report site
# base_url: http://localhost:8080/
# paths:
#   - por_partido
#   - por_tipo

# HTTP
timeout: 10
# proxy: http://127.0.0.1:8080
# header: "Key: Value"

# Chart: rows at or below this share of the total are folded into "Outros".
# Accepts a fraction (0.05) or a percentage (5%).
threshold: "0.05"

# Output
# output: ./report.html
# output_format: html
# page_size: 25
show_all: false

# Output styling
no_color: false
"#
    .to_string()
}

pub fn ensure_default_config_file(path: &Path) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
