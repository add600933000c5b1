//! Operation routing, scraper caching and the race fetch loop
//!
//! # Example
//!
//! ```no_run
//! use boatrace_scraper::{Dispatcher, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut dispatcher = Dispatcher::new(ScraperConfig::default());
//!
//!     // Every race at stadium 23 on the day
//!     let tree = dispatcher.fetch_program("2024-12-30", Some(23.into()), None).await?;
//!     println!("{} races", tree[&23].len());
//!
//!     // Same thing, addressed by name
//!     let output = dispatcher.invoke("fetch result", "20241230", Some("23".into()), Some("12".into())).await?;
//!     println!("{}", serde_json::to_string_pretty(&output)?);
//!
//!     Ok(())
//! }
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{Result, ScraperError};
use crate::models::{CodeArg, DateArg, Output, RaceDate, Record, ResultTree, StadiumCode};
use crate::scraper::{
    http_transport_factory, OddsScraper, PreviewScraper, ProgramScraper, RaceScraper, ResultScraper,
    ScraperConfig, Session, StadiumLister, StadiumScraper, Transport, TransportFactory,
};
use crate::validate::{parse_date, parse_stadium_code, resolve_race_numbers};

/// Logical request types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchOdds,
    FetchPreview,
    FetchProgram,
    FetchResult,
    ListStadiumIds,
    ListStadiumNames,
    ListStadiums,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::FetchOdds,
        Operation::FetchPreview,
        Operation::FetchProgram,
        Operation::FetchResult,
        Operation::ListStadiumIds,
        Operation::ListStadiumNames,
        Operation::ListStadiums,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::FetchOdds => "fetchOdds",
            Operation::FetchPreview => "fetchPreview",
            Operation::FetchProgram => "fetchProgram",
            Operation::FetchResult => "fetchResult",
            Operation::ListStadiumIds => "listStadiumIds",
            Operation::ListStadiumNames => "listStadiumNames",
            Operation::ListStadiums => "listStadiums",
        }
    }

    pub fn kind(self) -> ScraperKind {
        match self {
            Operation::FetchOdds => ScraperKind::Odds,
            Operation::FetchPreview => ScraperKind::Preview,
            Operation::FetchProgram => ScraperKind::Program,
            Operation::FetchResult => ScraperKind::Result,
            Operation::ListStadiumIds | Operation::ListStadiumNames | Operation::ListStadiums => {
                ScraperKind::Stadium
            }
        }
    }

    pub fn is_stadium_listing(self) -> bool {
        self.kind() == ScraperKind::Stadium
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = ScraperError;

    /// Case-insensitive; spaces, underscores and hyphens are ignored, so
    /// "fetch odds", "fetchOdds" and "fetch_odds" are the same operation.
    /// The `scrape*` names are accepted as aliases.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "fetchodds" | "scrapeoddses" => Ok(Operation::FetchOdds),
            "fetchpreview" | "scrapepreviews" => Ok(Operation::FetchPreview),
            "fetchprogram" | "scrapeprograms" => Ok(Operation::FetchProgram),
            "fetchresult" | "scraperesults" => Ok(Operation::FetchResult),
            "liststadiumids" | "scrapestadiumids" => Ok(Operation::ListStadiumIds),
            "liststadiumnames" | "scrapestadiumnames" => Ok(Operation::ListStadiumNames),
            "liststadiums" | "scrapestadiums" => Ok(Operation::ListStadiums),
            _ => Err(ScraperError::InvalidOperation(s.to_string())),
        }
    }
}

/// Page scraper behind an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScraperKind {
    Odds,
    Preview,
    Program,
    Result,
    Stadium,
}

impl ScraperKind {
    fn build(self, transport: Box<dyn Transport>, config: ScraperConfig) -> CachedScraper {
        let session = Session::new(transport, config);
        match self {
            ScraperKind::Odds => CachedScraper::Race(Box::new(OddsScraper::new(session))),
            ScraperKind::Preview => CachedScraper::Race(Box::new(PreviewScraper::new(session))),
            ScraperKind::Program => CachedScraper::Race(Box::new(ProgramScraper::new(session))),
            ScraperKind::Result => CachedScraper::Race(Box::new(ResultScraper::new(session))),
            ScraperKind::Stadium => CachedScraper::Stadium(Box::new(StadiumScraper::new(session))),
        }
    }
}

enum CachedScraper {
    Race(Box<dyn RaceScraper>),
    Stadium(Box<dyn StadiumLister>),
}

/// Routes operations to page scrapers.
///
/// One scraper, with its own transport session, is created per operation on
/// first use and kept for the dispatcher's lifetime. Requests are issued one
/// at a time; a failed request aborts the rest of the invocation.
pub struct Dispatcher {
    config: ScraperConfig,
    factory: TransportFactory,
    instances: HashMap<Operation, CachedScraper>,
}

impl Dispatcher {
    /// Dispatcher whose sessions are real HTTP clients.
    ///
    /// Each session has its own cookie store; all of them share one pacer.
    pub fn new(config: ScraperConfig) -> Self {
        let factory = http_transport_factory(config.clone());
        Self::with_transport_factory(config, factory)
    }

    pub fn with_transport_factory(config: ScraperConfig, factory: TransportFactory) -> Self {
        Self {
            config,
            factory,
            instances: HashMap::new(),
        }
    }

    /// Operations that currently have a cached scraper
    pub fn cached_operations(&self) -> Vec<Operation> {
        let mut operations: Vec<Operation> = self.instances.keys().copied().collect();
        operations.sort_by_key(|op| Operation::ALL.iter().position(|o| o == op));
        operations
    }

    /// Run an operation addressed by name
    pub async fn invoke(
        &mut self,
        name: &str,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<Output> {
        let operation: Operation = name.parse()?;
        self.execute(operation, date, stadium, race).await
    }

    /// Run an operation.
    ///
    /// Stadium listings ignore `stadium` and `race`. Race-level operations
    /// fetch every (stadium, race) pair, stadium-major; an absent stadium
    /// means every stadium racing that day, an absent race means races 1-12.
    pub async fn execute(
        &mut self,
        operation: Operation,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<Output> {
        self.instance(operation)?;
        let date = parse_date(&date.into())?;

        if operation.is_stadium_listing() {
            if stadium.is_some() || race.is_some() {
                tracing::debug!("{} ignores stadium and race arguments", operation);
            }
            let lister = self.lister(operation)?;
            return match operation {
                Operation::ListStadiumIds => lister.scrape_ids(date).await.map(Output::StadiumIds),
                Operation::ListStadiumNames => lister.scrape_names(date).await.map(Output::StadiumNames),
                _ => lister.scrape(date).await.map(Output::Stadiums),
            };
        }

        let races = resolve_race_numbers(race.as_ref())?;
        let stadiums = self.resolve_stadium_codes(date, stadium.as_ref()).await?;

        tracing::debug!(
            "{} on {}: {} stadium(s) x {} race(s)",
            operation,
            date,
            stadiums.len(),
            races.len()
        );

        let scraper = self.race_scraper(operation)?;
        let mut tree = ResultTree::new();
        for &stadium in &stadiums {
            let mut records = IndexMap::with_capacity(races.len());
            for &race in &races {
                let record = scraper.scrape(date, stadium, race).await?;
                records.insert(race, record);
            }
            tree.insert(stadium, records);
        }

        Ok(Output::Races(tree))
    }

    /// Stadiums to fetch: the given code, or every stadium listed for `date`
    pub async fn resolve_stadium_codes(
        &mut self,
        date: RaceDate,
        stadium: Option<&CodeArg>,
    ) -> Result<Vec<StadiumCode>> {
        match stadium {
            Some(code) => Ok(vec![parse_stadium_code(code)?]),
            None => self.lister(Operation::ListStadiums)?.scrape_ids(date).await,
        }
    }

    pub async fn fetch_odds(
        &mut self,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<ResultTree> {
        self.races(Operation::FetchOdds, date, stadium, race).await
    }

    pub async fn fetch_preview(
        &mut self,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<ResultTree> {
        self.races(Operation::FetchPreview, date, stadium, race).await
    }

    pub async fn fetch_program(
        &mut self,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<ResultTree> {
        self.races(Operation::FetchProgram, date, stadium, race).await
    }

    pub async fn fetch_result(
        &mut self,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<ResultTree> {
        self.races(Operation::FetchResult, date, stadium, race).await
    }

    pub async fn list_stadium_ids(&mut self, date: impl Into<DateArg>) -> Result<Vec<StadiumCode>> {
        let output = self.execute(Operation::ListStadiumIds, date, None, None).await?;
        Ok(output.into_stadium_ids().unwrap_or_default())
    }

    pub async fn list_stadium_names(&mut self, date: impl Into<DateArg>) -> Result<Vec<String>> {
        let output = self.execute(Operation::ListStadiumNames, date, None, None).await?;
        Ok(output.into_stadium_names().unwrap_or_default())
    }

    pub async fn list_stadiums(&mut self, date: impl Into<DateArg>) -> Result<Vec<Record>> {
        let output = self.execute(Operation::ListStadiums, date, None, None).await?;
        Ok(output.into_stadiums().unwrap_or_default())
    }

    async fn races(
        &mut self,
        operation: Operation,
        date: impl Into<DateArg>,
        stadium: Option<CodeArg>,
        race: Option<CodeArg>,
    ) -> Result<ResultTree> {
        let output = self.execute(operation, date, stadium, race).await?;
        Ok(output.into_races().unwrap_or_default())
    }

    /// Cached scraper for `operation`, created with a fresh session on first use
    fn instance(&mut self, operation: Operation) -> Result<&CachedScraper> {
        match self.instances.entry(operation) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let transport = (self.factory)()?;
                tracing::debug!("Creating {:?} scraper for {}", operation.kind(), operation);
                Ok(entry.insert(operation.kind().build(transport, self.config.clone())))
            }
        }
    }

    fn race_scraper(&mut self, operation: Operation) -> Result<&dyn RaceScraper> {
        match self.instance(operation)? {
            CachedScraper::Race(scraper) => Ok(scraper.as_ref()),
            CachedScraper::Stadium(_) => Err(ScraperError::InvalidOperation(operation.to_string())),
        }
    }

    fn lister(&mut self, operation: Operation) -> Result<&dyn StadiumLister> {
        match self.instance(operation)? {
            CachedScraper::Stadium(lister) => Ok(lister.as_ref()),
            CachedScraper::Race(_) => Err(ScraperError::InvalidOperation(operation.to_string())),
        }
    }
}
