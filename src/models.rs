use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Stadium code (1-24)
pub type StadiumCode = u8;

/// Race number within a meeting day (1-12)
pub type RaceNumber = u8;

/// Stadium → race → record, in the order the pages were requested
pub type ResultTree = IndexMap<StadiumCode, IndexMap<RaceNumber, Record>>;

/// Lower/upper odds pair, as shown for place and wide bets ("1.0-1.4")
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OddsRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

/// A single extracted field value.
///
/// Pages routinely omit fields (odds not posted yet, race not run yet), so
/// every variant other than `Null` means the field was present on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Text(String),
    Number(f64),
    /// Coded value read from a class attribute (wind direction, weather)
    Token(String),
    Range(OddsRange),
}

impl Value {
    pub fn token(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::Token)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            Value::Token(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<OddsRange> {
        match self {
            Value::Range(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::Text)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Value::Null, Value::Number)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<OddsRange> for Value {
    fn from(value: OddsRange) -> Self {
        Value::Range(value)
    }
}

/// Field name → value, in extraction order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Calendar date of a race meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RaceDate(NaiveDate);

impl RaceDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYYMMDD`, the form the site expects in the `hd` query parameter
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for RaceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for RaceDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Date argument before parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateArg {
    Text(String),
    Date(NaiveDate),
}

impl From<&str> for DateArg {
    fn from(value: &str) -> Self {
        DateArg::Text(value.to_string())
    }
}

impl From<String> for DateArg {
    fn from(value: String) -> Self {
        DateArg::Text(value)
    }
}

impl From<NaiveDate> for DateArg {
    fn from(value: NaiveDate) -> Self {
        DateArg::Date(value)
    }
}

impl From<RaceDate> for DateArg {
    fn from(value: RaceDate) -> Self {
        DateArg::Date(value.date())
    }
}

/// Stadium code or race number argument before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeArg {
    Text(String),
    Number(i64),
}

impl fmt::Display for CodeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeArg::Text(s) => f.write_str(s),
            CodeArg::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for CodeArg {
    fn from(value: &str) -> Self {
        CodeArg::Text(value.to_string())
    }
}

impl From<String> for CodeArg {
    fn from(value: String) -> Self {
        CodeArg::Text(value)
    }
}

impl From<u8> for CodeArg {
    fn from(value: u8) -> Self {
        CodeArg::Number(i64::from(value))
    }
}

impl From<u32> for CodeArg {
    fn from(value: u32) -> Self {
        CodeArg::Number(i64::from(value))
    }
}

impl From<i32> for CodeArg {
    fn from(value: i32) -> Self {
        CodeArg::Number(i64::from(value))
    }
}

impl From<i64> for CodeArg {
    fn from(value: i64) -> Self {
        CodeArg::Number(value)
    }
}

/// What an operation returns: a nested tree for race-level operations, a
/// flat list for stadium listings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Output {
    Races(ResultTree),
    StadiumIds(Vec<StadiumCode>),
    StadiumNames(Vec<String>),
    Stadiums(Vec<Record>),
}

impl Output {
    pub fn into_races(self) -> Option<ResultTree> {
        match self {
            Output::Races(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn into_stadium_ids(self) -> Option<Vec<StadiumCode>> {
        match self {
            Output::StadiumIds(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn into_stadium_names(self) -> Option<Vec<String>> {
        match self {
            Output::StadiumNames(names) => Some(names),
            _ => None,
        }
    }

    pub fn into_stadiums(self) -> Option<Vec<Record>> {
        match self {
            Output::Stadiums(records) => Some(records),
            _ => None,
        }
    }
}
