//! Race results (結果): finishing order, technique, weather, trifecta payout

use async_trait::async_trait;
use scraper::Html;

use super::extract::{extract_number, extract_text};
use super::preview::insert_weather;
use super::{race_record, RaceScraper, Session, BOATS};
use crate::error::Result;
use crate::models::{RaceDate, RaceNumber, Record, StadiumCode};

const RESULT_PATH: &str = "/owpc/pc/race/raceresult";

pub struct ResultScraper {
    session: Session,
}

impl ResultScraper {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RaceScraper for ResultScraper {
    async fn scrape(&self, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Result<Record> {
        let html = self.session.race_page(RESULT_PATH, date, stadium, race).await?;
        Ok(parse_result(&html, date, stadium, race))
    }
}

/// Parse the raceresult page.
///
/// Rows of the finishing table are in finishing order. Disqualified boats
/// carry a text rank ("転", "失") instead of a digit.
pub fn parse_result(html: &str, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Record {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut record = race_record(date, stadium, race);

    for place in 1..=BOATS {
        let row = format!(
            "div.grid_unit:nth-child(1) table.is-w495 tbody:nth-of-type({}) tr:nth-child(1)",
            place
        );
        record.insert(
            format!("place_{}_rank", place),
            extract_text(root, &format!("{} td:nth-child(1)", row)),
        );
        record.insert(
            format!("place_{}_boat_number", place),
            extract_number(root, &format!("{} td:nth-child(2)", row)),
        );
        record.insert(
            format!("place_{}_racer", place),
            extract_text(root, &format!("{} td:nth-child(3)", row)),
        );
        record.insert(
            format!("place_{}_time", place),
            extract_text(root, &format!("{} td:nth-child(4)", row)),
        );
    }

    record.insert(
        "race_technique",
        extract_text(root, "table.is-w243.is-h108__3rdadd tbody td"),
    );

    insert_weather(&mut record, root);

    let trifecta = "div.grid_unit:nth-child(2) table.is-w495 tbody:nth-of-type(1) tr:nth-child(1)";
    record.insert(
        "trifecta_combination",
        extract_text(root, &format!("{} div.numberSet1_row", trifecta)),
    );
    record.insert(
        "trifecta_payout",
        extract_number(root, &format!("{} span.is-payout1", trifecta)),
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::preview::tests::WEATHER;
    use chrono::NaiveDate;

    fn date() -> RaceDate {
        RaceDate::new(NaiveDate::from_ymd_opt(2024, 12, 30).unwrap())
    }

    fn place_row(rank: &str, boat: u8, racer: &str, time: &str) -> String {
        format!(
            r#"<tbody><tr>
                <td class="is-fs14">{}</td>
                <td class="is-fs14 is-boatColor{b}">{b}</td>
                <td><span class="is-fs12">4444</span>
                    <span class="is-fs18 is-fBold">{}</span></td>
                <td>{}</td>
            </tr></tbody>"#,
            rank,
            racer,
            time,
            b = boat
        )
    }

    #[test]
    fn test_parse_result() {
        let places = [
            place_row("１", 1, "山田　太郎", "1'49\"8"),
            place_row("２", 3, "佐藤　花子", "1'51\"2"),
            place_row("３", 2, "鈴木　一郎", "1'52\"0"),
            place_row("４", 5, "高橋　次郎", "1'53\"4"),
            place_row("５", 6, "田中　三郎", ""),
            place_row("転", 4, "伊藤　四郎", ""),
        ]
        .concat();
        let html = format!(
            r#"<html><body><div class="grid is-type2">
                <div class="grid_unit">
                  <div class="table1"><table class="is-w495"><thead><tr><th>着</th></tr></thead>{}</table></div>
                  <div class="table1"><table class="is-w243 is-h108__3rdadd"><thead><tr><th>決まり手</th></tr></thead><tbody><tr><td>逃げ</td></tr></tbody></table></div>
                </div>
                <div class="grid_unit">
                  {}
                  <div class="table1"><table class="is-w495">
                    <thead><tr><th>勝式</th></tr></thead>
                    <tbody><tr>
                      <td rowspan="2">3連単</td>
                      <td><div class="numberSet1"><div class="numberSet1_row">
                        <span class="numberSet1_number is-type1">1</span>
                        <span class="numberSet1_text">-</span>
                        <span class="numberSet1_number is-type3">3</span>
                        <span class="numberSet1_text">-</span>
                        <span class="numberSet1_number is-type2">2</span>
                      </div></div></td>
                      <td><span class="is-payout1">&yen;1,230</span></td>
                      <td>4</td>
                    </tr></tbody>
                  </table></div>
                </div>
            </div></body></html>"#,
            places, WEATHER
        );

        let record = parse_result(&html, date(), 23, 12);

        assert_eq!(record.get("place_1_rank").unwrap().as_text(), Some("1"));
        assert_eq!(record.get("place_1_boat_number").unwrap().as_number(), Some(1.0));
        assert_eq!(record.get("place_1_racer").unwrap().as_text(), Some("4444 山田 太郎"));
        assert_eq!(record.get("place_2_boat_number").unwrap().as_number(), Some(3.0));
        assert_eq!(record.get("place_2_time").unwrap().as_text(), Some("1'51\"2"));
        assert_eq!(record.get("place_6_rank").unwrap().as_text(), Some("転"));
        assert_eq!(record.get("place_6_time").unwrap().as_text(), Some(""));

        assert_eq!(record.get("race_technique").unwrap().as_text(), Some("逃げ"));
        assert_eq!(record.get("race_wind").unwrap().as_number(), Some(3.0));

        assert_eq!(record.get("trifecta_combination").unwrap().as_text(), Some("1 - 3 - 2"));
        assert_eq!(record.get("trifecta_payout").unwrap().as_number(), Some(1230.0));
    }

    #[test]
    fn test_parse_result_not_run_yet() {
        let record = parse_result("<html><body><p>データはありません</p></body></html>", date(), 23, 12);

        assert!(record.get("place_1_rank").unwrap().is_null());
        assert!(record.get("race_technique").unwrap().is_null());
        assert!(record.get("trifecta_payout").unwrap().is_null());
        assert_eq!(record.get("race_number").unwrap().as_number(), Some(12.0));
    }
}
