pub mod error;

pub use error::{Result, WaybackError};

use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use url::Url;

const AVAILABILITY_URL: &str = "https://archive.org/wayback/available";
const WEB_URL: &str = "https://web.archive.org";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Closest archived copy of a URL, if any.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Availability {
    pub available: bool,
    pub url: Option<String>,
    pub timestamp: Option<String>,
    pub status: Option<String>,
}

impl Availability {
    pub fn date(&self) -> Option<String> {
        self.timestamp.as_deref().and_then(format_timestamp)
    }
}

#[derive(Debug, Deserialize)]
struct AvailabilityResponse {
    #[serde(default)]
    archived_snapshots: ArchivedSnapshots,
}

#[derive(Debug, Default, Deserialize)]
struct ArchivedSnapshots {
    closest: Option<ClosestSnapshot>,
}

#[derive(Debug, Deserialize)]
struct ClosestSnapshot {
    url: Option<String>,
    timestamp: Option<String>,
    status: Option<String>,
}

/// One CDX row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub timestamp: String,
    pub original: String,
    pub status: String,
    pub mimetype: String,
    pub length: String,
    pub archive_url: String,
}

pub struct WaybackClient {
    client: reqwest::Client,
    availability_url: String,
    web_url: String,
}

impl WaybackClient {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(AVAILABILITY_URL, WEB_URL)
    }

    /// `availability_url` is the full `/wayback/available` endpoint; `web_url` is the
    /// host serving `/cdx/search/cdx` and `/web/...`.
    pub fn with_base_urls(availability_url: &str, web_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            availability_url: availability_url.trim_end_matches('/').to_string(),
            web_url: web_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn check(&self, url: &str) -> Result<Availability> {
        let url = normalize_url(url);
        let resp = self
            .client
            .get(&self.availability_url)
            .query(&[("url", url.as_str())])
            .timeout(Duration::from_secs(30))
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body: AvailabilityResponse = serde_json::from_str(&resp.text().await?)?;
        Ok(match body.archived_snapshots.closest {
            Some(closest) => Availability {
                available: true,
                url: closest.url,
                timestamp: closest.timestamp,
                status: closest.status,
            },
            None => Availability::default(),
        })
    }

    /// CDX listing, optionally restricted to a calendar year.
    pub async fn snapshots(
        &self,
        url: &str,
        year: Option<i32>,
        limit: u32,
    ) -> Result<Vec<Snapshot>> {
        let url = normalize_url(url);
        let limit = limit.to_string();
        let mut params = vec![
            ("url", url),
            ("output", "json".to_string()),
            ("limit", limit),
            ("fl", "timestamp,original,statuscode,mimetype,length".to_string()),
        ];
        if let Some(year) = year {
            params.push(("from", format!("{year}0101")));
            params.push(("to", format!("{year}1231")));
        }

        let resp = self
            .client
            .get(format!("{}/cdx/search/cdx", self.web_url))
            .query(&params)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body = resp.text().await?;
        Ok(parse_cdx(&body, &self.web_url))
    }

    /// Raw archived page. Without a timestamp Wayback serves the latest capture.
    pub async fn download(&self, url: &str, timestamp: Option<&str>) -> Result<String> {
        let url = normalize_url(url);
        let archive_url = match timestamp {
            Some(ts) => format!("{}/web/{}id_/{}", self.web_url, ts, url),
            None => format!("{}/web/{}", self.web_url, url),
        };

        let resp = self.client.get(&archive_url).send().await?;
        let resp = check_status(resp).await?;
        Ok(resp.text().await?)
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(WaybackError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Accepts both `output=json` bodies and the plain space-separated CDX format.
/// The first row is a header in JSON mode and is skipped.
pub fn parse_cdx(body: &str, web_url: &str) -> Vec<Snapshot> {
    let rows: Vec<Vec<String>> = match serde_json::from_str::<Vec<Vec<String>>>(body) {
        Ok(rows) => rows.into_iter().skip(1).collect(),
        Err(_) => body
            .lines()
            .map(|line| line.split_whitespace().map(String::from).collect())
            .collect(),
    };

    rows.into_iter()
        .filter(|row| row.len() >= 5)
        .map(|row| {
            let mut fields = row.into_iter();
            let mut next = || fields.next().unwrap_or_default();
            let timestamp = next();
            let original = next();
            Snapshot {
                archive_url: format!("{web_url}/web/{timestamp}/{original}"),
                status: next(),
                mimetype: next(),
                length: next(),
                timestamp,
                original,
            }
        })
        .collect()
}

pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// `20230115120000` -> `2023-01-15 12:00:00`.
pub fn format_timestamp(ts: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(ts, TIMESTAMP_FORMAT)
        .ok()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

/// File name used when saving a downloaded capture.
pub fn snapshot_filename(url: &str, timestamp: Option<&str>) -> String {
    let normalized = normalize_url(url);
    let host = Url::parse(&normalized)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| url.to_string());
    format!(
        "{}_{}.html",
        host.replace('.', "_"),
        timestamp.unwrap_or("latest")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_is_added_when_missing() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
    }

    #[test]
    fn timestamp_is_formatted() {
        assert_eq!(
            format_timestamp("20230115120000").as_deref(),
            Some("2023-01-15 12:00:00")
        );
        assert!(format_timestamp("2023").is_none());
    }

    #[test]
    fn json_cdx_skips_header_row() {
        let body = r#"[["timestamp","original","statuscode","mimetype","length"],
["20230101000000","https://bad.com/","200","text/html","1234"]]"#;
        let snaps = parse_cdx(body, "https://web.archive.org");

        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].timestamp, "20230101000000");
        assert_eq!(snaps[0].length, "1234");
        assert_eq!(
            snaps[0].archive_url,
            "https://web.archive.org/web/20230101000000/https://bad.com/"
        );
    }

    #[test]
    fn plain_cdx_rows_are_parsed() {
        let body = "20230101000000 https://bad.com/ 200 text/html 99\nshort row\n";
        let snaps = parse_cdx(body, "https://web.archive.org");
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].status, "200");
    }

    #[test]
    fn filename_uses_host_and_timestamp() {
        assert_eq!(
            snapshot_filename("scam-site.com/login", Some("20230115120000")),
            "scam-site_com_20230115120000.html"
        );
        assert_eq!(snapshot_filename("https://a.b.com", None), "a_b_com_latest.html");
    }
}
