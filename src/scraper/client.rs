//! HTTP session with request pacing for boatrace.jp

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{Result, ScraperError};
use crate::models::{RaceDate, RaceNumber, StadiumCode};

/// Site root every page path is appended to
pub const DEFAULT_BASE_URL: &str = "https://www.boatrace.jp";

/// Scraper configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    /// Site root, without trailing slash
    pub base_url: String,
    /// Minimum gap between two requests on one session, in milliseconds
    pub delay_ms: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            delay_ms: 1000,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl ScraperConfig {
    /// Defaults overridden by `BOATRACE_BASE_URL`, `BOATRACE_DELAY_MS`,
    /// `BOATRACE_TIMEOUT_SECS` and `BOATRACE_USER_AGENT`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("BOATRACE_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(delay) = lookup("BOATRACE_DELAY_MS") {
            config.delay_ms = parse_env_number("BOATRACE_DELAY_MS", &delay)?;
        }
        if let Some(timeout) = lookup("BOATRACE_TIMEOUT_SECS") {
            config.timeout_secs = parse_env_number("BOATRACE_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(user_agent) = lookup("BOATRACE_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(config)
    }

    /// Race page URL, e.g. `.../owpc/pc/race/racelist?rno=1&jcd=05&hd=20241230`
    pub fn race_url(&self, path: &str, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> String {
        format!(
            "{}{}?rno={}&jcd={:02}&hd={}",
            self.base_url,
            path,
            race,
            stadium,
            date.compact()
        )
    }

    /// Day page URL, e.g. `.../owpc/pc/race/index?hd=20241230`
    pub fn day_url(&self, path: &str, date: RaceDate) -> String {
        format!("{}{}?hd={}", self.base_url, path, date.compact())
    }
}

fn parse_env_number(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| ScraperError::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}

/// Fetches pages for one scraper. Each implementation is one session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Body of the page at `url`
    async fn get(&self, url: &str) -> Result<String>;
}

/// Creates a fresh session for each cached scraper
pub type TransportFactory = Box<dyn Fn() -> Result<Box<dyn Transport>> + Send + Sync>;

/// Factory producing [`HttpTransport`] sessions from `config`.
///
/// Every session keeps its own cookie store but shares one pacer, so all
/// requests made through the factory's sessions are spaced by `delay_ms`.
pub fn http_transport_factory(config: ScraperConfig) -> TransportFactory {
    let pacer = Arc::new(Pacer::new(Duration::from_millis(config.delay_ms)));
    Box::new(move || -> Result<Box<dyn Transport>> {
        Ok(Box::new(HttpTransport::with_pacer(&config, pacer.clone())?))
    })
}

/// Keeps consecutive requests at least `delay` apart
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until the next request may go out
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// reqwest-backed session: one cookie store, paced by a possibly shared pacer
pub struct HttpTransport {
    client: reqwest::Client,
    pacer: Arc<Pacer>,
}

impl HttpTransport {
    /// Create a new session with its own pacer
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let pacer = Arc::new(Pacer::new(Duration::from_millis(config.delay_ms)));
        Self::with_pacer(config, pacer)
    }

    /// Create a new session that waits on `pacer` before every request
    pub fn with_pacer(config: &ScraperConfig, pacer: Arc<Pacer>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .build()?;

        Ok(Self { client, pacer })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String> {
        self.pacer.wait().await;

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Request to {} failed with status {}", url, status);
            return Err(ScraperError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn date() -> RaceDate {
        RaceDate::new(NaiveDate::from_ymd_opt(2024, 12, 30).unwrap())
    }

    #[test]
    fn test_config_default() {
        let config = ScraperConfig::default();
        assert_eq!(config.base_url, "https://www.boatrace.jp");
        assert_eq!(config.delay_ms, 1000);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("BOATRACE_BASE_URL", "http://localhost:8080/"),
            ("BOATRACE_DELAY_MS", "250"),
        ]
        .into_iter()
        .collect();

        let config = ScraperConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.delay_ms, 250);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_config_rejects_bad_number() {
        let result = ScraperConfig::from_lookup(|key| {
            (key == "BOATRACE_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ScraperError::Config(_))));
    }

    #[test]
    fn test_race_url() {
        let config = ScraperConfig::default();
        assert_eq!(
            config.race_url("/owpc/pc/race/racelist", date(), 23, 1),
            "https://www.boatrace.jp/owpc/pc/race/racelist?rno=1&jcd=23&hd=20241230"
        );
    }

    #[test]
    fn test_race_url_stadium_padding() {
        let config = ScraperConfig::default();
        // Stadium code 1 should be zero-padded to 01
        let url = config.race_url("/owpc/pc/race/oddstf", date(), 1, 12);
        assert!(url.contains("jcd=01"));
        assert!(url.contains("rno=12"));
    }

    #[test]
    fn test_day_url() {
        let config = ScraperConfig::default();
        assert_eq!(
            config.day_url("/owpc/pc/race/index", date()),
            "https://www.boatrace.jp/owpc/pc/race/index?hd=20241230"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spaces_requests() {
        let pacer = Pacer::new(Duration::from_millis(1000));
        let start = Instant::now();

        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(1000));

        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));

        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_no_wait_after_idle() {
        let pacer = Pacer::new(Duration::from_millis(500));
        pacer.wait().await;

        tokio::time::sleep(Duration::from_millis(800)).await;
        let before = Instant::now();
        pacer.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(&ScraperConfig::default()).is_ok());
    }

    /// Local server answering every request with `status`; returns its base URL
    async fn serve(status: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let body = "<html><body>ok</body></html>";
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    fn local_config(base_url: String, delay_ms: u64) -> ScraperConfig {
        ScraperConfig {
            base_url,
            delay_ms,
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_http_transport_non_success_status() {
        let config = local_config(serve("503 Service Unavailable").await, 0);
        let transport = HttpTransport::new(&config).unwrap();
        let url = config.day_url("/owpc/pc/race/index", date());

        match transport.get(&url).await {
            Err(ScraperError::UnexpectedStatus { url: failed, status }) => {
                assert_eq!(status, 503);
                assert_eq!(failed, url);
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_transport_returns_body() {
        let config = local_config(serve("200 OK").await, 0);
        let transport = HttpTransport::new(&config).unwrap();

        let body = transport.get(&config.day_url("/owpc/pc/race/index", date())).await.unwrap();
        assert!(body.contains("ok"));
    }

    #[tokio::test]
    async fn test_http_transport_paces_requests() {
        let config = local_config(serve("200 OK").await, 300);
        let transport = HttpTransport::new(&config).unwrap();
        let url = config.race_url("/owpc/pc/race/oddstf", date(), 1, 1);

        let start = Instant::now();
        transport.get(&url).await.unwrap();
        transport.get(&url).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_factory_sessions_share_pacing() {
        let config = local_config(serve("200 OK").await, 300);
        let factory = http_transport_factory(config.clone());
        let first = factory().unwrap();
        let second = factory().unwrap();

        let start = Instant::now();
        first.get(&config.day_url("/owpc/pc/race/index", date())).await.unwrap();
        second
            .get(&config.race_url("/owpc/pc/race/beforeinfo", date(), 1, 1))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
