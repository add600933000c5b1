//! Page scrapers for boatrace.jp
//!
//! Each scraper fetches one kind of page and turns it into a [`Record`] using
//! the helpers in [`extract`]. Race-level pages (odds, preview, program,
//! result) are addressed by date, stadium and race; the stadium index is
//! addressed by date alone.
//!
//! # Example
//!
//! ```no_run
//! use boatrace_scraper::scraper::{HttpTransport, RaceScraper, ResultScraper, ScraperConfig, Session};
//! use boatrace_scraper::validate::parse_date;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ScraperConfig::default();
//!     let transport = HttpTransport::new(&config)?;
//!     let scraper = ResultScraper::new(Session::new(Box::new(transport), config));
//!
//!     let date = parse_date(&"2024-12-30".into())?;
//!     let record = scraper.scrape(date, 23, 12).await?;
//!     println!("{} fields", record.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
pub mod extract;
mod odds;
mod preview;
mod program;
mod result;
mod stadium;

pub use client::{
    http_transport_factory, HttpTransport, Pacer, ScraperConfig, Transport, TransportFactory,
    DEFAULT_BASE_URL,
};
pub use odds::{parse_odds, OddsScraper};
pub use preview::{parse_preview, PreviewScraper};
pub use program::{parse_program, ProgramScraper};
pub use result::{parse_result, ResultScraper};
pub use stadium::{parse_stadiums, StadiumEntry, StadiumScraper};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RaceDate, RaceNumber, Record, StadiumCode};

/// Boats per race
pub const BOATS: u8 = 6;

/// Produces one record per race
#[async_trait]
pub trait RaceScraper: Send + Sync {
    async fn scrape(&self, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Result<Record>;
}

/// Lists the stadiums holding races on a date
#[async_trait]
pub trait StadiumLister: Send + Sync {
    async fn scrape_ids(&self, date: RaceDate) -> Result<Vec<StadiumCode>>;

    async fn scrape_names(&self, date: RaceDate) -> Result<Vec<String>>;

    async fn scrape(&self, date: RaceDate) -> Result<Vec<Record>>;
}

/// A transport plus the configuration used to build page URLs
pub struct Session {
    transport: Box<dyn Transport>,
    config: ScraperConfig,
}

impl Session {
    pub fn new(transport: Box<dyn Transport>, config: ScraperConfig) -> Self {
        Self { transport, config }
    }

    /// Fetch a race-level page
    pub async fn race_page(
        &self,
        path: &str,
        date: RaceDate,
        stadium: StadiumCode,
        race: RaceNumber,
    ) -> Result<String> {
        let url = self.config.race_url(path, date, stadium, race);
        tracing::info!("Scraping: {}", url);
        self.transport.get(&url).await
    }

    /// Fetch a day-level page
    pub async fn day_page(&self, path: &str, date: RaceDate) -> Result<String> {
        let url = self.config.day_url(path, date);
        tracing::info!("Scraping: {}", url);
        self.transport.get(&url).await
    }
}

/// Fields every race-level record starts with
pub(crate) fn race_record(date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Record {
    let mut record = Record::new();
    record.insert("race_date", date.to_string());
    record.insert("race_stadium_number", stadium);
    record.insert("race_number", race);
    record
}

/// Stadium codes and names
pub fn get_stadium_name(code: u8) -> &'static str {
    match code {
        1 => "桐生",
        2 => "戸田",
        3 => "江戸川",
        4 => "平和島",
        5 => "多摩川",
        6 => "浜名湖",
        7 => "蒲郡",
        8 => "常滑",
        9 => "津",
        10 => "三国",
        11 => "びわこ",
        12 => "住之江",
        13 => "尼崎",
        14 => "鳴門",
        15 => "丸亀",
        16 => "児島",
        17 => "宮島",
        18 => "徳山",
        19 => "下関",
        20 => "若松",
        21 => "芦屋",
        22 => "福岡",
        23 => "唐津",
        24 => "大村",
        _ => "不明",
    }
}
