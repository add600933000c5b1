//! Pre-race information (直前情報): weather, exhibition times, start exhibition

use async_trait::async_trait;
use scraper::{ElementRef, Html};

use super::extract::{extract_class_token, extract_number, extract_text};
use super::{race_record, RaceScraper, Session, BOATS};
use crate::error::Result;
use crate::models::{RaceDate, RaceNumber, Record, StadiumCode, Value};

const PREVIEW_PATH: &str = "/owpc/pc/race/beforeinfo";

pub struct PreviewScraper {
    session: Session,
}

impl PreviewScraper {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl RaceScraper for PreviewScraper {
    async fn scrape(&self, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Result<Record> {
        let html = self.session.race_page(PREVIEW_PATH, date, stadium, race).await?;
        Ok(parse_preview(&html, date, stadium, race))
    }
}

/// Parse the beforeinfo page
pub fn parse_preview(html: &str, date: RaceDate, stadium: StadiumCode, race: RaceNumber) -> Record {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut record = race_record(date, stadium, race);

    insert_weather(&mut record, root);

    for boat in 1..=BOATS {
        let row = format!("table.is-w748 tbody:nth-of-type({}) tr:nth-child(1)", boat);
        record.insert(
            format!("boat_{}_racer_weight", boat),
            extract_number(root, &format!("{} td:nth-child(4)", row)),
        );
        record.insert(
            format!("boat_{}_exhibition_time", boat),
            extract_number(root, &format!("{} td:nth-child(5)", row)),
        );
        record.insert(
            format!("boat_{}_tilt", boat),
            extract_number(root, &format!("{} td:nth-child(6)", row)),
        );
    }

    // Start exhibition rows are ordered by course, not by boat
    for course in 1..=BOATS {
        let row = format!("table.is-w238 tbody tr:nth-child({})", course);
        record.insert(
            format!("course_{}_boat_number", course),
            extract_number(root, &format!("{} span.table1_boatImage1Number", row)),
        );
        record.insert(
            format!("course_{}_start_timing", course),
            extract_text(root, &format!("{} span.table1_boatImage1TimeInner", row)),
        );
    }

    record
}

/// Weather block shared by the preview and result pages
pub(crate) fn insert_weather(record: &mut Record, root: ElementRef) {
    record.insert(
        "race_wind",
        extract_number(root, "div.weather1_bodyUnit.is-wind span.weather1_bodyUnitLabelData"),
    );
    record.insert(
        "race_wind_direction",
        Value::token(extract_class_token(
            root,
            "div.weather1_bodyUnit.is-windDirection p.weather1_bodyUnitImage",
        )),
    );
    record.insert(
        "race_wave",
        extract_number(root, "div.weather1_bodyUnit.is-wave span.weather1_bodyUnitLabelData"),
    );
    record.insert(
        "race_weather",
        extract_text(root, "div.weather1_bodyUnit.is-weather span.weather1_bodyUnitLabelTitle"),
    );
    record.insert(
        "race_weather_token",
        Value::token(extract_class_token(
            root,
            "div.weather1_bodyUnit.is-weather p.weather1_bodyUnitImage",
        )),
    );
    record.insert(
        "race_temperature",
        extract_number(root, "div.weather1_bodyUnit.is-direction span.weather1_bodyUnitLabelData"),
    );
    record.insert(
        "race_water_temperature",
        extract_number(
            root,
            "div.weather1_bodyUnit.is-waterTemperature span.weather1_bodyUnitLabelData",
        ),
    );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) const WEATHER: &str = r#"
        <div class="weather1">
          <div class="weather1_body">
            <div class="weather1_bodyUnit is-direction">
              <div class="weather1_bodyUnitLabel">
                <span class="weather1_bodyUnitLabelTitle">気温</span>
                <span class="weather1_bodyUnitLabelData">12.0℃</span>
              </div>
            </div>
            <div class="weather1_bodyUnit is-weather">
              <p class="weather1_bodyUnitImage is-weather1"></p>
              <div class="weather1_bodyUnitLabel">
                <span class="weather1_bodyUnitLabelTitle">晴</span>
              </div>
            </div>
            <div class="weather1_bodyUnit is-wind">
              <div class="weather1_bodyUnitLabel">
                <span class="weather1_bodyUnitLabelTitle">風速</span>
                <span class="weather1_bodyUnitLabelData">3m</span>
              </div>
            </div>
            <div class="weather1_bodyUnit is-windDirection">
              <p class="weather1_bodyUnitImage is-wind14"></p>
            </div>
            <div class="weather1_bodyUnit is-waterTemperature">
              <div class="weather1_bodyUnitLabel">
                <span class="weather1_bodyUnitLabelTitle">水温</span>
                <span class="weather1_bodyUnitLabelData">14.0℃</span>
              </div>
            </div>
            <div class="weather1_bodyUnit is-wave">
              <div class="weather1_bodyUnitLabel">
                <span class="weather1_bodyUnitLabelTitle">波高</span>
                <span class="weather1_bodyUnitLabelData">2cm</span>
              </div>
            </div>
          </div>
        </div>
    "#;

    fn date() -> RaceDate {
        RaceDate::new(NaiveDate::from_ymd_opt(2024, 12, 30).unwrap())
    }

    fn boat_tbody(boat: u8, weight: &str, time: &str, tilt: &str) -> String {
        format!(
            r#"<tbody class="is-fs12">
                <tr><td class="is-boatColor{b}">{b}</td><td></td><td><a>選手{b}</a></td><td>{w}</td><td>{t}</td><td>{i}</td></tr>
                <tr><td>部品交換</td></tr>
            </tbody>"#,
            b = boat,
            w = weight,
            t = time,
            i = tilt
        )
    }

    fn start_row(boat: u8, timing: &str) -> String {
        format!(
            r#"<tr><td><div class="table1_boatImage1"><span class="table1_boatImage1Number is-type{b}">{b}</span><span class="table1_boatImage1Time"><span class="table1_boatImage1TimeInner">{t}</span></span></div></td></tr>"#,
            b = boat,
            t = timing
        )
    }

    #[test]
    fn test_parse_preview() {
        let boats: String = (1..=6u8)
            .map(|b| boat_tbody(b, &format!("5{}.0kg", b), "6.78", "-0.5"))
            .collect();
        let starts: String = [(1, ".05"), (2, ".11"), (4, "F.01"), (3, ".20"), (5, ".15"), (6, ".09")]
            .iter()
            .map(|(b, t)| start_row(*b, t))
            .collect();
        let html = format!(
            r#"<html><body>{}<table class="is-w748"><thead><tr><th>枠</th></tr></thead>{}</table>
               <table class="is-w238"><tbody>{}</tbody></table></body></html>"#,
            WEATHER, boats, starts
        );

        let record = parse_preview(&html, date(), 5, 3);

        assert_eq!(record.get("race_wind").unwrap().as_number(), Some(3.0));
        assert_eq!(
            record.get("race_wind_direction").unwrap().as_token(),
            Some("weather1_bodyUnitImage is-wind14")
        );
        assert_eq!(record.get("race_wave").unwrap().as_number(), Some(2.0));
        assert_eq!(record.get("race_weather").unwrap().as_text(), Some("晴"));
        assert_eq!(record.get("race_temperature").unwrap().as_number(), Some(12.0));
        assert_eq!(record.get("race_water_temperature").unwrap().as_number(), Some(14.0));

        assert_eq!(record.get("boat_2_racer_weight").unwrap().as_number(), Some(52.0));
        assert_eq!(record.get("boat_6_exhibition_time").unwrap().as_number(), Some(6.78));
        assert_eq!(record.get("boat_1_tilt").unwrap().as_number(), Some(-0.5));

        assert_eq!(record.get("course_3_boat_number").unwrap().as_number(), Some(4.0));
        assert_eq!(record.get("course_3_start_timing").unwrap().as_text(), Some("F.01"));
        assert_eq!(record.get("course_1_start_timing").unwrap().as_text(), Some(".05"));
    }

    #[test]
    fn test_parse_preview_empty_page() {
        let record = parse_preview("<html><body></body></html>", date(), 5, 3);
        assert!(record.get("race_wind").unwrap().is_null());
        assert!(record.get("race_wind_direction").unwrap().is_null());
        assert!(record.get("boat_1_exhibition_time").unwrap().is_null());
        assert!(record.get("course_6_start_timing").unwrap().is_null());
    }
}
