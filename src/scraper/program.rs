//! Race program (出走表)

use async_trait::async_trait;
use scraper::Html;

use super::extract::{extract_number, extract_text};
use super::{race_record, RaceScraper, Session, BOATS};
use crate::error::Result;
use crate::models::{RaceDate, RaceNumber, Record, StadiumCode};

const PROGRAM_PATH: &str = "/owpc/pc/race/racelist";

pub struct ProgramScraper {
    session: Session,
}

impl ProgramScraper {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RaceScraper for ProgramScraper {
    async fn scrape(&self, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Result<Record> {
        let html = self.session.race_page(PROGRAM_PATH, date, stadium, race).await?;
        Ok(parse_program(&html, date, stadium, race))
    }
}

/// Parse the racelist page.
///
/// Each boat is one `tbody.is-fs12`; its first row carries the racer block
/// (3rd cell) and the rate columns, whose first line is the value kept here.
pub fn parse_program(html: &str, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Record {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut record = race_record(date, stadium, race);

    record.insert("race_title", extract_text(root, "div.heading2_title h2"));
    record.insert("race_subtitle", extract_text(root, "h3.title16_titleDetail__add2020"));

    for boat in 1..=BOATS {
        let row = format!("div.table1 table tbody.is-fs12:nth-of-type({}) tr:nth-child(1)", boat);
        let racer = format!("{} td:nth-child(3)", row);

        record.insert(
            format!("boat_{}_racer_profile", boat),
            extract_text(root, &format!("{} div:nth-child(1)", racer)),
        );
        record.insert(
            format!("boat_{}_racer_name", boat),
            extract_text(root, &format!("{} div:nth-child(2) a", racer)),
        );
        record.insert(
            format!("boat_{}_racer_details", boat),
            extract_text(root, &format!("{} div:nth-child(3)", racer)),
        );
        record.insert(
            format!("boat_{}_national_win_rate", boat),
            extract_number(root, &format!("{} td:nth-child(5)", row)),
        );
        record.insert(
            format!("boat_{}_local_win_rate", boat),
            extract_number(root, &format!("{} td:nth-child(6)", row)),
        );
        record.insert(
            format!("boat_{}_motor_number", boat),
            extract_number(root, &format!("{} td:nth-child(7)", row)),
        );
        record.insert(
            format!("boat_{}_boat_equipment_number", boat),
            extract_number(root, &format!("{} td:nth-child(8)", row)),
        );
    }

    record
}
