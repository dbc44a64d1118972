use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use thiserror::Error;

use crate::utils;
use crate::view::ViewPayload;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    Proxy {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode view payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Clone, Debug)]
pub struct FetchOptions {
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub user_agent: String,
    pub system_proxy: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            proxy: None,
            header: None,
            user_agent: concat!("spendview/", env!("CARGO_PKG_VERSION")).to_string(),
            system_proxy: true,
        }
    }
}

// `order_by` is replaced in place or appended; `asc=1` only survives for
// ascending order. Other query parameters keep their position.
pub fn view_url(
    base: &str,
    path: &str,
    order_by: Option<&str>,
    ascending: bool,
) -> Result<Url, FetchError> {
    let invalid = |message: String| FetchError::InvalidUrl {
        url: format!("{base} + {path}"),
        message,
    };
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    let mut url = Url::parse(&base)
        .and_then(|b| b.join(path.trim_start_matches('/')))
        .map_err(|e| invalid(e.to_string()))?;

    let order_by = match order_by.map(str::trim).filter(|s| !s.is_empty()) {
        Some(column) => column,
        None => return Ok(url),
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut has_order_by = false;
    let mut has_asc = false;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "order_by" => {
                has_order_by = true;
                pairs.push((key.into_owned(), order_by.to_string()));
            }
            "asc" if ascending => {
                has_asc = true;
                pairs.push((key.into_owned(), "1".to_string()));
            }
            "asc" => {}
            _ => pairs.push((key.into_owned(), value.into_owned())),
        }
    }
    if !has_order_by {
        pairs.push(("order_by".to_string(), order_by.to_string()));
    }
    if ascending && !has_asc {
        pairs.push(("asc".to_string(), "1".to_string()));
    }
    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    Ok(url)
}

#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        if let Some(raw) = options.header.as_deref() {
            let invalid = |message: String| FetchError::InvalidHeader {
                header: raw.to_string(),
                message,
            };
            let (name, value) = utils::parse_header_line(raw).map_err(&invalid)?;
            let name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let value = HeaderValue::from_str(&value).map_err(|e| invalid(e.to_string()))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(options.user_agent.clone())
            .timeout(Duration::from_secs(options.timeout_seconds.max(1)));
        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let p = reqwest::Proxy::all(proxy).map_err(|source| FetchError::Proxy {
                proxy: proxy.to_string(),
                source,
            })?;
            builder = builder.proxy(p);
        } else if !options.system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: Url) -> Result<ViewPayload, FetchError> {
        let url_str = url.to_string();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url_str.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request {
                url: url_str.clone(),
                source,
            })?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url_str,
            source,
        })
    }
}
