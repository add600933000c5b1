//! Stadiums holding races on a given day, from the race index page

use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

use super::extract::{extract_text, normalize_text, select_all, select_first};
use super::{get_stadium_name, Session, StadiumLister};
use crate::error::Result;
use crate::models::{RaceDate, Record, StadiumCode};
use crate::validate::STADIUM_COUNT;

const INDEX_PATH: &str = "/owpc/pc/race/index";

const STADIUM_LINK: &str = "a[href*='jcd=']";

/// One row of the race index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StadiumEntry {
    pub code: StadiumCode,
    pub name: String,
    pub race_title: Option<String>,
}

impl StadiumEntry {
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("stadium_id", self.code);
        record.insert("stadium_name", self.name.as_str());
        record.insert("race_title", self.race_title.clone());
        record
    }
}

pub struct StadiumScraper {
    session: Session,
}

impl StadiumScraper {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    async fn entries(&self, date: RaceDate) -> Result<Vec<StadiumEntry>> {
        let html = self.session.day_page(INDEX_PATH, date).await?;
        Ok(parse_stadiums(&html))
    }
}

#[async_trait]
impl StadiumLister for StadiumScraper {
    async fn scrape_ids(&self, date: RaceDate) -> Result<Vec<StadiumCode>> {
        Ok(self.entries(date).await?.into_iter().map(|e| e.code).collect())
    }

    async fn scrape_names(&self, date: RaceDate) -> Result<Vec<String>> {
        Ok(self.entries(date).await?.into_iter().map(|e| e.name).collect())
    }

    async fn scrape(&self, date: RaceDate) -> Result<Vec<Record>> {
        Ok(self.entries(date).await?.iter().map(StadiumEntry::to_record).collect())
    }
}

/// Parse the stadiums listed on the race index page, in page order.
///
/// Each row of the index table links to its stadium with a `jcd` parameter.
/// Pages without the table fall back to scanning every stadium link.
pub fn parse_stadiums(html: &str) -> Vec<StadiumEntry> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut seen: HashSet<StadiumCode> = HashSet::new();
    let mut stadiums = Vec::new();

    for row in select_all(root, "div.table1 table tbody tr") {
        let Some(link) = select_first(row, STADIUM_LINK) else {
            continue;
        };
        let Some(code) = link.value().attr("href").and_then(extract_stadium_code) else {
            continue;
        };
        if seen.insert(code) {
            stadiums.push(StadiumEntry {
                code,
                name: stadium_label(row, link, code),
                race_title: extract_text(row, "td.is-alignL").filter(|t| !t.is_empty()),
            });
        }
    }

    if stadiums.is_empty() {
        for link in select_all(root, STADIUM_LINK) {
            let Some(code) = link.value().attr("href").and_then(extract_stadium_code) else {
                continue;
            };
            if seen.insert(code) {
                stadiums.push(StadiumEntry {
                    code,
                    name: stadium_label(link, link, code),
                    race_title: None,
                });
            }
        }
    }

    stadiums
}

/// Stadium name from the logo's alt text, the link text, or the code table
fn stadium_label(scope: ElementRef, link: ElementRef, code: StadiumCode) -> String {
    select_first(scope, "img[alt]")
        .and_then(|img| img.value().attr("alt"))
        .map(normalize_text)
        .filter(|name| !name.is_empty())
        .or_else(|| {
            let text = normalize_text(&link.text().collect::<String>());
            (!text.is_empty()).then_some(text)
        })
        .unwrap_or_else(|| get_stadium_name(code).to_string())
}

/// Extract stadium code from URL (jcd parameter)
fn extract_stadium_code(url: &str) -> Option<StadiumCode> {
    let idx = url.find("jcd=")?;
    let rest = &url[idx + 4..];
    let code_str: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    code_str
        .parse::<StadiumCode>()
        .ok()
        .filter(|code| (1..=STADIUM_COUNT).contains(code))
}
