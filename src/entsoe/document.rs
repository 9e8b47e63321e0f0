//! Decoding of ENTSO-E transparency platform XML replies.
//!
//! An "actual generation per generation unit" query is answered either with a
//! `GL_MarketDocument` holding one time series per plant and production type, or with
//! an `Acknowledgement_MarketDocument` explaining why nothing was returned.

use crate::entsoe::error::EntsoeError;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

/// Acknowledgement reason code for "no matching data found".
pub const NO_MATCHING_DATA_REASON: &str = "999";

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationDocument {
    #[serde(rename = "TimeSeries", default)]
    pub time_series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeries {
    #[serde(rename = "quantity_Measure_Unit.name", default)]
    pub unit: Option<String>,
    #[serde(rename = "MktPSRType", default)]
    pub psr: Option<MktPsrType>,
    #[serde(rename = "Period", default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MktPsrType {
    #[serde(rename = "psrType", default)]
    pub psr_type: Option<String>,
    #[serde(rename = "PowerSystemResources", default)]
    pub resource: Option<PowerSystemResources>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PowerSystemResources {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Period {
    #[serde(rename = "timeInterval")]
    pub time_interval: TimeInterval,
    pub resolution: String,
    #[serde(rename = "Point", default)]
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeInterval {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Point {
    pub position: u32,
    #[serde(default)]
    pub quantity: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Acknowledgement {
    #[serde(rename = "Reason", default)]
    pub reasons: Vec<Reason>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reason {
    pub code: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl Acknowledgement {
    pub fn is_no_data(&self) -> bool {
        self.reasons
            .iter()
            .any(|r| r.code == NO_MATCHING_DATA_REASON)
    }

    pub fn describe(&self) -> String {
        self.reasons
            .iter()
            .map(|r| match &r.text {
                Some(text) => format!("{} ({})", text, r.code),
                None => r.code.clone(),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone)]
pub enum ReplyDocument {
    Generation(GenerationDocument),
    Acknowledgement(Acknowledgement),
}

/// One point of one time series, flattened. Fields stay optional so that incomplete
/// replies can be detected instead of silently defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    pub psr_type: Option<String>,
    pub plant_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Decodes a reply body, dispatching on its root element.
pub fn parse_reply(xml: &str) -> Result<ReplyDocument, EntsoeError> {
    match root_element(xml)?.as_str() {
        "GL_MarketDocument" => quick_xml::de::from_str(xml)
            .map(ReplyDocument::Generation)
            .map_err(EntsoeError::Decode),
        "Acknowledgement_MarketDocument" => quick_xml::de::from_str(xml)
            .map(ReplyDocument::Acknowledgement)
            .map_err(EntsoeError::Decode),
        other => Err(EntsoeError::UnexpectedDocument(other.to_string())),
    }
}

fn root_element(xml: &str) -> Result<String, EntsoeError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(EntsoeError::Xml)? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Event::Eof => return Err(EntsoeError::UnexpectedDocument(String::new())),
            _ => {}
        }
    }
}

impl GenerationDocument {
    /// Flattens all time series into records, adding each point's timestamp.
    pub fn records(&self) -> Vec<GenerationRecord> {
        let mut records = Vec::new();
        for series in &self.time_series {
            let psr_type = series.psr.as_ref().and_then(|p| p.psr_type.clone());
            let plant_name = series
                .psr
                .as_ref()
                .and_then(|p| p.resource.as_ref())
                .and_then(|r| r.name.clone());

            for period in &series.periods {
                let start = parse_timestamp(&period.time_interval.start);
                let step = parse_resolution(&period.resolution);
                for point in &period.points {
                    records.push(GenerationRecord {
                        psr_type: psr_type.clone(),
                        plant_name: plant_name.clone(),
                        quantity: point.quantity,
                        unit: series.unit.clone(),
                        timestamp: point_timestamp(start, step, point.position),
                    });
                }
            }
        }
        records
    }
}

fn point_timestamp(
    start: Option<DateTime<Utc>>,
    step: Option<TimeDelta>,
    position: u32,
) -> Option<DateTime<Utc>> {
    let offset = step?.checked_mul(i32::try_from(position.checked_sub(1)?).ok()?)?;
    start?.checked_add_signed(offset)
}

/// Parses ENTSO-E interval bounds such as `2020-01-01T00:00Z`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%MZ")
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// Parses the ISO 8601 durations used as period resolutions (`PT15M`, `PT60M`, `PT1H`, `P1D`).
pub fn parse_resolution(value: &str) -> Option<TimeDelta> {
    let rest = value.strip_prefix('P')?;
    let (part, time) = match rest.strip_prefix('T') {
        Some(time) => (time, true),
        None => (rest, false),
    };
    let unit_at = part.len().checked_sub(1)?;
    let (amount, unit) = part.split_at(unit_at);
    let amount: i64 = amount.parse().ok()?;
    match (time, unit) {
        (true, "S") => TimeDelta::try_seconds(amount),
        (true, "M") => TimeDelta::try_minutes(amount),
        (true, "H") => TimeDelta::try_hours(amount),
        (false, "D") => TimeDelta::try_days(amount),
        (false, "W") => TimeDelta::try_weeks(amount),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) const BIOMASS_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<GL_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-6:generationloaddocument:3:0">
    <mRID>0f3c1b8e2a</mRID>
    <type>A73</type>
    <process.processType>A16</process.processType>
    <TimeSeries>
        <mRID>1</mRID>
        <businessType>A01</businessType>
        <inBiddingZone_Domain.mRID codingScheme="A01">10YES-REE------0</inBiddingZone_Domain.mRID>
        <quantity_Measure_Unit.name>MAW</quantity_Measure_Unit.name>
        <MktPSRType>
            <psrType>B01</psrType>
            <PowerSystemResources>
                <mRID codingScheme="A01">18WENCE-12345-1X</mRID>
                <name>ENCE HUELVA</name>
            </PowerSystemResources>
        </MktPSRType>
        <Period>
            <timeInterval>
                <start>2020-01-01T00:00Z</start>
                <end>2020-01-01T02:00Z</end>
            </timeInterval>
            <resolution>PT60M</resolution>
            <Point>
                <position>1</position>
                <quantity>41.5</quantity>
            </Point>
            <Point>
                <position>2</position>
                <quantity>40</quantity>
            </Point>
        </Period>
    </TimeSeries>
</GL_MarketDocument>"#;

    pub(crate) const NO_DATA_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Acknowledgement_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0">
    <mRID>9a1b</mRID>
    <createdDateTime>2024-05-01T10:00:00Z</createdDateTime>
    <Reason>
        <code>999</code>
        <text>No matching data found for Data item ACTUAL_GENERATION_PER_GENERATION_UNIT</text>
    </Reason>
</Acknowledgement_MarketDocument>"#;

    #[test]
    fn test_generation_reply_yields_timestamped_records() {
        let ReplyDocument::Generation(document) = parse_reply(BIOMASS_REPLY).unwrap() else {
            panic!("expected a generation document");
        };
        let records = document.records();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].psr_type.as_deref(), Some("B01"));
        assert_eq!(records[0].plant_name.as_deref(), Some("ENCE HUELVA"));
        assert_eq!(records[0].unit.as_deref(), Some("MAW"));
        assert_eq!(records[0].quantity, Some(41.5));
        assert_eq!(
            records[1].timestamp,
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_acknowledgement_with_reason_999_means_no_data() {
        let ReplyDocument::Acknowledgement(ack) = parse_reply(NO_DATA_REPLY).unwrap() else {
            panic!("expected an acknowledgement");
        };
        assert!(ack.is_no_data());
        assert!(ack.describe().contains("No matching data"));
    }

    #[test]
    fn test_unknown_root_is_rejected() {
        let err = parse_reply("<Publication_MarketDocument/>").unwrap_err();
        assert!(matches!(err, EntsoeError::UnexpectedDocument(ref name) if name == "Publication_MarketDocument"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_resolutions() {
        assert_eq!(parse_resolution("PT15M"), TimeDelta::try_minutes(15));
        assert_eq!(parse_resolution("PT60M"), TimeDelta::try_hours(1));
        assert_eq!(parse_resolution("PT1H"), TimeDelta::try_hours(1));
        assert_eq!(parse_resolution("P1D"), TimeDelta::try_days(1));
        assert_eq!(parse_resolution("P1Y"), None);
        assert_eq!(parse_resolution("15M"), None);
    }

    #[test]
    fn test_position_zero_has_no_timestamp() {
        let start = parse_timestamp("2020-01-01T00:00Z");
        assert_eq!(point_timestamp(start, TimeDelta::try_minutes(15), 0), None);
        assert_eq!(
            point_timestamp(start, TimeDelta::try_minutes(15), 3),
            Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 30, 0).unwrap())
        );
    }
}
