use crate::era5::mappings::{mars_param, LevelType};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::era5::error::Era5Error;

/// Dataset every request is sent to.
pub const DATASET: &str = "reanalysis-era5-complete";

const MARS_CLASS: &str = "ea";
const MARS_EXPVER: &str = "1";
const MARS_STREAM: &str = "oper";
const MARS_TYPE: &str = "an";

/// Output format of the retrieved files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    #[default]
    Grib,
    NetCdf,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::Grib => "grib",
            FileFormat::NetCdf => "nc",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Grib => "grib",
            FileFormat::NetCdf => "netcdf",
        }
    }
}

impl FromStr for FileFormat {
    type Err = Era5Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grib" => Ok(FileFormat::Grib),
            "netcdf" => Ok(FileFormat::NetCdf),
            _ => Err(Era5Error::InvalidFileFormat(s.to_string())),
        }
    }
}

/// One MARS request: all variables of one level type for one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarsRequest {
    pub class: String,
    pub date: String,
    pub expver: String,
    pub grid: String,
    pub param: String,
    pub stream: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub levtype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub levelist: Option<String>,
    pub data_format: String,
}

impl MarsRequest {
    /// Builds the request for `year`-`month`.
    ///
    /// `days` is the length of the month, `area` is `[north, west, south, east]` and
    /// `levels` is only used for 3D level types.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        year: i32,
        month: u32,
        days: u32,
        level_type: LevelType,
        variables: &[&str],
        levels: Option<&[String]>,
        area: Option<[f64; 4]>,
        resolution: &str,
        file_format: FileFormat,
    ) -> Self {
        let time = (0..24)
            .map(|hour| format!("{hour:02}:00:00"))
            .collect::<Vec<_>>()
            .join("/");
        let param = variables
            .iter()
            .map(|v| mars_param(v))
            .collect::<Vec<_>>()
            .join("/");
        let levelist = match level_type {
            LevelType::Single => None,
            LevelType::Pressure | LevelType::Model => levels.map(|l| l.join("/")),
        };

        Self {
            class: MARS_CLASS.to_string(),
            date: format!("{year}-{month:02}-01/to/{year}-{month:02}-{days:02}"),
            expver: MARS_EXPVER.to_string(),
            grid: resolution.to_string(),
            param,
            stream: MARS_STREAM.to_string(),
            time,
            kind: MARS_TYPE.to_string(),
            area: area.map(|[n, w, s, e]| format!("{n}/{w}/{s}/{e}")),
            levtype: level_type.levtype().to_string(),
            levelist,
            data_format: file_format.name().to_string(),
        }
    }

    /// Key/value pairs in MARS order, as shown by dry runs.
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("class", self.class.as_str()),
            ("date", self.date.as_str()),
            ("expver", self.expver.as_str()),
            ("grid", self.grid.as_str()),
            ("param", self.param.as_str()),
            ("stream", self.stream.as_str()),
            ("time", self.time.as_str()),
            ("type", self.kind.as_str()),
        ];
        if let Some(area) = &self.area {
            pairs.push(("area", area));
        }
        pairs.push(("levtype", &self.levtype));
        if let Some(levelist) = &self.levelist {
            pairs.push(("levelist", levelist));
        }
        pairs.push(("data_format", &self.data_format));
        pairs
    }
}

impl fmt::Display for MarsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.pairs() {
            writeln!(f, "  {key}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_request() {
        let request = MarsRequest::new(
            2020,
            1,
            31,
            LevelType::Single,
            &["2m_temperature", "surface_pressure"],
            None,
            None,
            "0.25/0.25",
            FileFormat::Grib,
        );

        assert_eq!(request.param, "2t/sp");
        assert_eq!(request.date, "2020-01-01/to/2020-01-31");
        assert_eq!(request.levtype, "sfc");
        assert_eq!(request.levelist, None);
        assert_eq!(request.area, None);
        assert!(request.time.starts_with("00:00:00/01:00:00/"));
        assert!(request.time.ends_with("/23:00:00"));
    }

    #[test]
    fn test_pressure_level_request_lists_levels_and_area() {
        let levels = vec!["1000".to_string(), "950".to_string()];
        let request = MarsRequest::new(
            2021,
            2,
            28,
            LevelType::Pressure,
            &["temperature"],
            Some(&levels),
            Some([60.0, -10.5, 35.0, 30.0]),
            "0.25/0.25",
            FileFormat::NetCdf,
        );

        assert_eq!(request.levelist.as_deref(), Some("1000/950"));
        assert_eq!(request.levtype, "pl");
        assert_eq!(request.area.as_deref(), Some("60/-10.5/35/30"));
        assert_eq!(request.data_format, "netcdf");
    }

    #[test]
    fn test_serialized_request_uses_mars_keys() {
        let request = MarsRequest::new(
            2020,
            1,
            31,
            LevelType::Single,
            &["2m_temperature"],
            None,
            None,
            "0.25/0.25",
            FileFormat::Grib,
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "an");
        assert_eq!(json["class"], "ea");
        assert!(json.get("area").is_none());
        assert!(json.get("levelist").is_none());
    }

    #[test]
    fn test_file_format_parsing() {
        assert_eq!("GRIB".parse::<FileFormat>().unwrap(), FileFormat::Grib);
        assert_eq!("netcdf".parse::<FileFormat>().unwrap().extension(), "nc");
        let err = "xlsx".parse::<FileFormat>().unwrap_err();
        assert_eq!(err.to_string(), "file_format must be 'grib' or 'netcdf', got 'xlsx'");
    }
}
