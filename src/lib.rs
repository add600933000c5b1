//! Boatrace scraper - race data from boatrace.jp
//!
//! This library provides:
//! - A [`Dispatcher`] that routes named operations to page scrapers
//! - Odds, pre-race information, program and result scrapers
//! - Stadium listings for a race day
//! - Validation of dates, stadium codes and race numbers
//!
//! # Example
//!
//! ```no_run
//! use boatrace_scraper::{Dispatcher, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut dispatcher = Dispatcher::new(ScraperConfig::from_env()?);
//!
//!     let stadiums = dispatcher.list_stadium_names("today").await?;
//!     println!("Racing today: {}", stadiums.join(", "));
//!
//!     let odds = dispatcher.fetch_odds("today", Some("12".into()), Some("1".into())).await?;
//!     println!("{}", serde_json::to_string(&odds)?);
//!
//!     Ok(())
//! }
//! ```

pub mod dispatcher;
pub mod error;
pub mod models;
pub mod scraper;
pub mod validate;

// Re-export commonly used types
pub use dispatcher::{Dispatcher, Operation, ScraperKind};
pub use error::{Result, ScraperError};
pub use models::{
    CodeArg, DateArg, OddsRange, Output, RaceDate, RaceNumber, Record, ResultTree, StadiumCode,
    Value,
};
pub use scraper::ScraperConfig;
