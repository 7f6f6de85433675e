use serde::{Deserialize, Serialize};

/// Wrapper for `/search/` responses.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    pub total: Option<u64>,
}

/// A single hit from `/search/`. Only the fields the pipeline reads are typed.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub screenshot: Option<String>,
    pub page: Option<PageInfo>,
    pub task: Option<TaskInfo>,
}

impl SearchHit {
    /// A summary built from the hit alone, when it already carries a screenshot.
    pub fn summary(&self) -> Option<ScanSummary> {
        let screenshot = self.screenshot.clone().filter(|s| !s.is_empty())?;
        let page = self.page.clone().unwrap_or_default();
        Some(ScanSummary {
            uuid: self.id.clone().unwrap_or_default(),
            screenshot,
            ip: page.ip.unwrap_or_default(),
            country: page.country.unwrap_or_default(),
            title: page.title.unwrap_or_default(),
            malicious: false,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    pub url: Option<String>,
    pub domain: Option<String>,
    pub ip: Option<String>,
    pub country: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInfo {
    pub uuid: Option<String>,
    pub url: Option<String>,
    pub time: Option<String>,
    pub visibility: Option<String>,
    #[serde(rename = "screenshotURL")]
    pub screenshot_url: Option<String>,
}

/// Full scan record from `/result/{uuid}/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanResult {
    pub task: Option<TaskInfo>,
    pub page: Option<PageInfo>,
    pub verdicts: Option<Verdicts>,
}

impl ScanResult {
    pub fn into_summary(self, uuid: &str) -> ScanSummary {
        let screenshot = self
            .task
            .and_then(|t| t.screenshot_url)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| screenshot_url(uuid));
        let page = self.page.unwrap_or_default();
        let malicious = self
            .verdicts
            .and_then(|v| v.overall)
            .and_then(|o| o.malicious)
            .unwrap_or(false);

        ScanSummary {
            uuid: uuid.to_string(),
            screenshot,
            ip: page.ip.unwrap_or_default(),
            country: page.country.unwrap_or_default(),
            title: page.title.unwrap_or_default(),
            malicious,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verdicts {
    pub overall: Option<Verdict>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Verdict {
    pub score: Option<i64>,
    pub malicious: Option<bool>,
}

/// Flattened view of a scan: what callers store alongside a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub uuid: String,
    pub screenshot: String,
    pub ip: String,
    pub country: String,
    pub title: String,
    pub malicious: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
}

/// Body for `POST /scan/`.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    pub url: String,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub uuid: String,
    pub message: Option<String>,
    pub result: Option<String>,
    pub api: Option<String>,
}

/// Public screenshot location for a finished scan.
pub fn screenshot_url(uuid: &str) -> String {
    format!("https://urlscan.io/screenshots/{uuid}.png")
}
