//! Static ENTSO-E code tables: production (PSR) types and bidding zones.

/// A bidding zone by its EIC code, with the ISO country codes it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiddingZone {
    pub eic: &'static str,
    pub name: &'static str,
    pub countries: &'static [&'static str],
}

const fn zone(
    eic: &'static str,
    name: &'static str,
    countries: &'static [&'static str],
) -> BiddingZone {
    BiddingZone {
        eic,
        name,
        countries,
    }
}

/// Bidding zones accepted by the downloader, in the default download order.
pub const BIDDING_ZONES: &[BiddingZone] = &[
    zone("10YAL-KESH-----5", "AL", &["AL"]),
    zone("10YAT-APG------L", "AT", &["AT"]),
    zone("10YBA-JPCC-----D", "BA", &["BA"]),
    zone("10YBE----------2", "BE", &["BE"]),
    zone("10YCA-BULGARIA-R", "BG", &["BG"]),
    zone("10YCH-SWISSGRIDZ", "CH", &["CH"]),
    zone("10YCS-CG-TSO---S", "ME", &["ME"]),
    zone("10YCS-SERBIATSOV", "RS", &["RS"]),
    zone("10YCY-1001A0003J", "CY", &["CY"]),
    zone("10YCZ-CEPS-----N", "CZ", &["CZ"]),
    zone("10Y1001A1001A82H", "DE-LU", &["DE", "LU"]),
    zone("10YDK-1--------W", "DK1", &["DK"]),
    zone("10YDK-2--------M", "DK2", &["DK"]),
    zone("10Y1001A1001A39I", "EE", &["EE"]),
    zone("10YES-REE------0", "ES", &["ES"]),
    zone("10YFI-1--------U", "FI", &["FI"]),
    zone("10YFR-RTE------C", "FR", &["FR"]),
    zone("10YGB----------A", "GB", &["GB"]),
    zone("10YGR-HTSO-----Y", "GR", &["GR"]),
    zone("10YHR-HEP------M", "HR", &["HR"]),
    zone("10YHU-MAVIR----U", "HU", &["HU"]),
    zone("10Y1001A1001A59C", "IE-SEM", &["IE", "GB"]),
    zone("10Y1001A1001A73I", "IT-North", &["IT"]),
    zone("10Y1001A1001A70O", "IT-Centre-North", &["IT"]),
    zone("10Y1001A1001A71M", "IT-Centre-South", &["IT"]),
    zone("10Y1001A1001A788", "IT-South", &["IT"]),
    zone("10Y1001C--00096J", "IT-Calabria", &["IT"]),
    zone("10Y1001A1001A75E", "IT-Sicily", &["IT"]),
    zone("10Y1001A1001A74G", "IT-Sardinia", &["IT"]),
    zone("10YLT-1001A0008Q", "LT", &["LT"]),
    zone("10YLV-1001A00074", "LV", &["LV"]),
    zone("10YMK-MEPSO----8", "MK", &["MK"]),
    zone("10YNL----------L", "NL", &["NL"]),
    zone("10YNO-1--------2", "NO1", &["NO"]),
    zone("10YNO-2--------T", "NO2", &["NO"]),
    zone("10YNO-3--------J", "NO3", &["NO"]),
    zone("10YNO-4--------9", "NO4", &["NO"]),
    zone("10Y1001A1001A48H", "NO5", &["NO"]),
    zone("10YPL-AREA-----S", "PL", &["PL"]),
    zone("10YPT-REN------W", "PT", &["PT"]),
    zone("10YRO-TEL------P", "RO", &["RO"]),
    zone("10Y1001A1001A44P", "SE1", &["SE"]),
    zone("10Y1001A1001A45N", "SE2", &["SE"]),
    zone("10Y1001A1001A46L", "SE3", &["SE"]),
    zone("10Y1001A1001A47J", "SE4", &["SE"]),
    zone("10YSI-ELES-----O", "SI", &["SI"]),
    zone("10YSK-SEPS-----K", "SK", &["SK"]),
    zone("10YTR-TEIAS----W", "TR", &["TR"]),
    zone("10Y1001C--000182", "UA-IPS", &["UA"]),
    zone("10Y1001C--00100H", "XK", &["XK"]),
];

/// PSR (production type) codes and their names. Network asset codes are included
/// so they are recognised, but they never carry generation.
const PSR_TYPES: &[(&str, &str)] = &[
    ("B01", "Biomass"),
    ("B02", "Fossil Brown coal/Lignite"),
    ("B03", "Fossil Coal-derived gas"),
    ("B04", "Fossil Gas"),
    ("B05", "Fossil Hard coal"),
    ("B06", "Fossil Oil"),
    ("B07", "Fossil Oil shale"),
    ("B08", "Fossil Peat"),
    ("B09", "Geothermal"),
    ("B10", "Hydro Pumped Storage"),
    ("B11", "Hydro Run-of-river and poundage"),
    ("B12", "Hydro Water Reservoir"),
    ("B13", "Marine"),
    ("B14", "Nuclear"),
    ("B15", "Other renewable"),
    ("B16", "Solar"),
    ("B17", "Waste"),
    ("B18", "Wind Offshore"),
    ("B19", "Wind Onshore"),
    ("B20", "Other"),
    ("B21", "AC Link"),
    ("B22", "DC Link"),
    ("B23", "Substation"),
    ("B24", "Transformer"),
    ("B25", "Energy storage"),
];

pub fn psr_type_name(code: &str) -> Option<&'static str> {
    PSR_TYPES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub fn bidding_zone(eic: &str) -> Option<&'static BiddingZone> {
    BIDDING_ZONES.iter().find(|z| z.eic == eic)
}

pub fn all_zone_codes() -> Vec<&'static str> {
    BIDDING_ZONES.iter().map(|z| z.eic).collect()
}

/// EIC codes of every bidding zone covering `country` (ISO 3166 alpha-2, any case).
pub fn zones_for_country(country: &str) -> Vec<&'static str> {
    BIDDING_ZONES
        .iter()
        .filter(|z| z.countries.iter().any(|c| c.eq_ignore_ascii_case(country)))
        .map(|z| z.eic)
        .collect()
}
