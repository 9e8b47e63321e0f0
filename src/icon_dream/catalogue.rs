//! Variables published in the ICON-DREAM-Global open-data tree.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Variables downloaded when none are requested.
pub const DEFAULT_VARIABLES: &[&str] = &["T"];

/// Variables published on pressure levels; everything else is a 2D field.
pub const PRESSURE_LEVEL_VARIABLES: &[&str] = &["T", "U", "V", "P", "QV", "W", "TKE", "WS", "DEN"];

/// Used when the directory listing cannot be read.
pub const FALLBACK_VARIABLES: &[&str] = &[
    "T", "U", "V", "W", "P", "QV", "TKE", "WS", "DEN", "T_2M", "U_10M", "V_10M", "TD_2M",
    "TOT_PREC", "PS", "PMSL", "CLCT", "ASWDIR_S", "ASWDIFD_S", "QV_S", "TMAX_2M", "TMIN_2M",
    "VMAX_10M", "WS_10M", "Z0",
];

pub fn fallback_variables() -> BTreeSet<String> {
    FALLBACK_VARIABLES.iter().map(|v| v.to_string()).collect()
}

fn listing_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // One sub-directory per variable, e.g. <a href="T_2M/">T_2M/</a>
    PATTERN.get_or_init(|| Regex::new(r#"href="([A-Z0-9_]+)/""#).unwrap())
}

/// Extracts the variable directories from an HTML directory listing.
pub fn parse_listing(html: &str) -> BTreeSet<String> {
    listing_pattern()
        .captures_iter(html)
        .map(|c| c[1].to_string())
        .collect()
}

/// Human-readable listing of `variables`, split into 3D and 2D fields.
pub fn variables_report(variables: &BTreeSet<String>) -> String {
    let rule = "=".repeat(80);
    let (pressure, surface): (Vec<&str>, Vec<&str>) = variables
        .iter()
        .map(String::as_str)
        .partition(|v| PRESSURE_LEVEL_VARIABLES.contains(v));

    let mut out = format!(
        "{rule}\nAVAILABLE ICON-DREAM GLOBAL VARIABLES\n{rule}\n\
         Dataset: ICON-DREAM-Global (DWD Open Data)\n\
         Resolution: ~13km (icosahedral grid)\n\
         Temporal: Hourly data\n\
         Time period: 2010-01 to present\n\n\
         Available variables ({}):\n\n",
        variables.len()
    );
    if !pressure.is_empty() {
        out.push_str("  3D Pressure-Level Variables:\n");
        for variable in &pressure {
            out.push_str(&format!("    - {variable}\n"));
        }
        out.push('\n');
    }
    if !surface.is_empty() {
        out.push_str("  2D Surface Variables:\n");
        for variable in &surface {
            out.push_str(&format!("    - {variable}\n"));
        }
    }
    out.push_str(&format!("\n{rule}\n"));
    out
}
