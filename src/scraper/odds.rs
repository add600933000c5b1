//! Win (単勝) and place (複勝) odds

use async_trait::async_trait;
use scraper::Html;

use super::extract::{extract_number, extract_range};
use super::{race_record, RaceScraper, Session, BOATS};
use crate::error::Result;
use crate::models::{RaceDate, RaceNumber, Record, StadiumCode};

const ODDS_PATH: &str = "/owpc/pc/race/oddstf";

/// Win and place odds for each boat.
///
/// Win odds are a single number; place odds are shown as a "lower-upper"
/// range.
pub struct OddsScraper {
    session: Session,
}

impl OddsScraper {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RaceScraper for OddsScraper {
    async fn scrape(&self, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Result<Record> {
        let html = self.session.race_page(ODDS_PATH, date, stadium, race).await?;
        Ok(parse_odds(&html, date, stadium, race))
    }
}

/// Parse win/place odds from the oddstf page.
///
/// The page has two `div.grid_unit` columns (win, then place), each holding
/// a table with one `tbody` per boat.
pub fn parse_odds(html: &str, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Record {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut record = race_record(date, stadium, race);

    for boat in 1..=BOATS {
        record.insert(
            format!("win_{}", boat),
            extract_number(
                root,
                &format!("div.grid_unit:nth-child(1) table tbody:nth-of-type({}) td.oddsPoint", boat),
            ),
        );
    }

    for boat in 1..=BOATS {
        record.insert(
            format!("place_{}", boat),
            extract_range(
                root,
                &format!("div.grid_unit:nth-child(2) table tbody:nth-of-type({}) td.oddsPoint", boat),
            ),
        );
    }

    record
}
