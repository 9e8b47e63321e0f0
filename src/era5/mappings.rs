//! ERA5 variable catalogues, vertical levels and MARS parameter codes.

/// Variables downloaded when none are requested: common inputs for renewable energy models.
pub const DEFAULT_VARIABLES: &[&str] = &[
    "10m_u_component_of_wind",
    "10m_v_component_of_wind",
    "100m_u_component_of_wind",
    "100m_v_component_of_wind",
    "2m_temperature",
    "surface_solar_radiation_downwards",
    "surface_pressure",
    "total_precipitation",
    "temperature",
    "u_component_of_wind",
    "v_component_of_wind",
    "relative_humidity",
    "geopotential",
];

/// All single-level (2D) variables.
pub const SINGLE_LEVEL_VARIABLES: &[&str] = &[
    "100m_u_component_of_wind",
    "100m_v_component_of_wind",
    "10m_u_component_of_wind",
    "10m_v_component_of_wind",
    "2m_dewpoint_temperature",
    "2m_temperature",
    "boundary_layer_height",
    "convective_available_potential_energy",
    "convective_precipitation",
    "eastward_turbulent_surface_stress",
    "evaporation",
    "friction_velocity",
    "geopotential_at_surface",
    "high_vegetation_cover",
    "instantaneous_10m_wind_direction",
    "instantaneous_10m_wind_speed",
    "instantaneous_eastward_turbulent_surface_stress",
    "instantaneous_northward_turbulent_surface_stress",
    "land_sea_mask",
    "large_scale_precipitation",
    "leaf_area_index_high_vegetation",
    "leaf_area_index_low_vegetation",
    "low_vegetation_cover",
    "mean_sea_level_pressure",
    "mean_surface_downward_long_wave_radiation_flux",
    "mean_surface_downward_short_wave_radiation_flux",
    "mean_surface_latent_heat_flux",
    "mean_surface_sensible_heat_flux",
    "mean_top_downward_long_wave_radiation_flux",
    "mean_top_downward_short_wave_radiation_flux",
    "mean_top_net_long_wave_radiation_flux",
    "mean_top_net_short_wave_radiation_flux",
    "northward_turbulent_surface_stress",
    "potential_evaporation",
    "runoff",
    "sea_ice_cover",
    "sea_surface_temperature",
    "skin_reservoir_content",
    "skin_temperature",
    "snow_cover",
    "snow_depth",
    "snowfall",
    "soil_temperature_level_1",
    "soil_temperature_level_2",
    "soil_temperature_level_3",
    "soil_temperature_level_4",
    "soil_type",
    "surface_latent_heat_flux",
    "surface_net_solar_radiation",
    "surface_net_thermal_radiation",
    "surface_pressure",
    "surface_sensible_heat_flux",
    "surface_solar_radiation_downwards",
    "surface_thermal_radiation_downwards",
    "top_net_solar_radiation",
    "top_net_thermal_radiation",
    "total_cloud_cover",
    "total_column_cloud_ice_water",
    "total_column_cloud_liquid_water",
    "total_column_ozone",
    "total_column_rain_water",
    "total_column_supercooled_liquid_water",
    "total_column_water",
    "total_column_water_vapour",
    "total_precipitation",
    "type_of_high_vegetation",
    "type_of_low_vegetation",
    "uv_visible_albedo_for_diffuse_radiation",
    "uv_visible_albedo_for_direct_radiation",
    "vertical_integral_of_divergence_of_moisture_flux",
    "vertical_integral_of_eastward_water_vapour_flux",
    "vertical_integral_of_northward_water_vapour_flux",
    "volumetric_soil_water_layer_1",
    "volumetric_soil_water_layer_2",
    "volumetric_soil_water_layer_3",
    "volumetric_soil_water_layer_4",
];

/// All pressure-level (3D) variables.
pub const PRESSURE_LEVEL_VARIABLES: &[&str] = &[
    "divergence",
    "fraction_of_cloud_cover",
    "geopotential",
    "ozone_mass_mixing_ratio",
    "potential_vorticity",
    "quality_indicators_cloud_icing_level",
    "quality_indicators_cloud_type",
    "relative_humidity",
    "specific_cloud_ice_water_content",
    "specific_cloud_liquid_water_content",
    "specific_humidity",
    "temperature",
    "u_component_of_wind",
    "v_component_of_wind",
    "vorticity",
];

/// All model-level (3D) variables.
pub const MODEL_LEVEL_VARIABLES: &[&str] = &[
    "divergence",
    "fraction_of_cloud_cover",
    "geopotential",
    "ozone_mass_mixing_ratio",
    "potential_vorticity",
    "quality_indicators_cloud_icing_level",
    "quality_indicators_cloud_type",
    "relative_humidity",
    "specific_cloud_ice_water_content",
    "specific_cloud_liquid_water_content",
    "specific_humidity",
    "temperature",
    "u_component_of_wind",
    "v_component_of_wind",
    "vorticity",
];

/// Every ERA5 pressure level in hPa, top of the atmosphere first.
pub const ALL_PRESSURE_LEVELS: &[&str] = &[
    "1", "2", "3", "5", "7", "10", "20", "30", "50", "70",
    "100", "125", "150", "175", "200", "225", "250", "300", "350", "400",
    "450", "500", "550", "600", "650", "700", "750", "775", "800", "825",
    "850", "875", "900", "925", "950", "975", "1000",
];

/// The three lowest pressure levels: roughly 110 m, 300 m and 560 m above sea level.
pub const DEFAULT_PRESSURE_LEVELS: &[&str] = &["1000", "975", "950"];

/// The five lowest model levels, 137 being the surface.
pub const DEFAULT_MODEL_LEVELS: &[&str] = &["133", "134", "135", "136", "137"];

/// Number of ERA5 model levels.
pub const MODEL_LEVEL_COUNT: u32 = 137;

const MARS_PARAMS: &[(&str, &str)] = &[
    ("10m_u_component_of_wind", "10u"),
    ("10m_v_component_of_wind", "10v"),
    ("100m_u_component_of_wind", "100u"),
    ("100m_v_component_of_wind", "100v"),
    ("2m_temperature", "2t"),
    ("2m_dewpoint_temperature", "2d"),
    ("surface_solar_radiation_downwards", "ssrd"),
    ("surface_pressure", "sp"),
    ("total_precipitation", "tp"),
    ("mean_sea_level_pressure", "msl"),
    ("boundary_layer_height", "blh"),
    ("convective_precipitation", "cp"),
    ("evaporation", "e"),
    ("snowfall", "sf"),
    ("snow_depth", "sd"),
    ("sea_ice_cover", "ci"),
    ("sea_surface_temperature", "sst"),
    ("skin_temperature", "skt"),
    ("skin_reservoir_content", "src"),
    ("soil_type", "slt"),
    ("surface_latent_heat_flux", "slhf"),
    ("surface_sensible_heat_flux", "sshf"),
    ("surface_thermal_radiation_downwards", "strd"),
    ("surface_net_solar_radiation", "ssr"),
    ("surface_net_thermal_radiation", "str"),
    ("top_net_solar_radiation", "tsr"),
    ("top_net_thermal_radiation", "ttr"),
    ("total_cloud_cover", "tcc"),
    ("temperature", "t"),
    ("u_component_of_wind", "u"),
    ("v_component_of_wind", "v"),
    ("geopotential", "z"),
    ("relative_humidity", "r"),
    ("specific_humidity", "q"),
    ("vertical_velocity", "w"),
    ("divergence", "d"),
    ("vorticity", "vo"),
    ("potential_vorticity", "pv"),
    ("fraction_of_cloud_cover", "cc"),
    ("specific_cloud_ice_water_content", "ciwc"),
    ("specific_cloud_liquid_water_content", "clwc"),
    ("ozone_mass_mixing_ratio", "o3"),
];

/// MARS short name of a variable. Unmapped names fall back to the name without
/// underscores, truncated to ten characters.
pub fn mars_param(variable: &str) -> String {
    MARS_PARAMS
        .iter()
        .find(|(name, _)| *name == variable)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| variable.replace('_', "").chars().take(10).collect())
}

/// Every model level, `"1"` to `"137"`.
pub fn all_model_levels() -> Vec<String> {
    (1..=MODEL_LEVEL_COUNT).map(|l| l.to_string()).collect()
}

/// Vertical-level category of an ERA5 request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelType {
    Single,
    Pressure,
    Model,
}

impl LevelType {
    /// Key used in the work grid.
    pub fn key(self) -> &'static str {
        match self {
            LevelType::Single => "single",
            LevelType::Pressure => "pressure",
            LevelType::Model => "model",
        }
    }

    /// MARS `levtype`.
    pub fn levtype(self) -> &'static str {
        match self {
            LevelType::Single => "sfc",
            LevelType::Pressure => "pl",
            LevelType::Model => "ml",
        }
    }

    /// Short tag used in output file names.
    pub fn file_tag(self) -> &'static str {
        match self {
            LevelType::Single => "sl",
            LevelType::Pressure => "pl",
            LevelType::Model => "ml",
        }
    }

    pub fn variables(self) -> &'static [&'static str] {
        match self {
            LevelType::Single => SINGLE_LEVEL_VARIABLES,
            LevelType::Pressure => PRESSURE_LEVEL_VARIABLES,
            LevelType::Model => MODEL_LEVEL_VARIABLES,
        }
    }

    pub fn supports(self, variable: &str) -> bool {
        self.variables().contains(&variable)
    }
}

impl std::fmt::Display for LevelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for LevelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(LevelType::Single),
            "pressure" => Ok(LevelType::Pressure),
            "model" => Ok(LevelType::Model),
            other => Err(format!("unknown level type '{other}'")),
        }
    }
}

/// Human-readable listing of all variables and levels.
pub fn available_variables_report() -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);
    out.push_str(&format!("{rule}\nAVAILABLE ERA5 VARIABLES\n{rule}\n"));

    out.push_str("\n--- SINGLE-LEVEL (2D) VARIABLES ---\n");
    out.push_str(&format!("Total: {} variables\n\n", SINGLE_LEVEL_VARIABLES.len()));
    for variable in SINGLE_LEVEL_VARIABLES {
        let marker = if DEFAULT_VARIABLES.contains(variable) { " [DEFAULT]" } else { "" };
        out.push_str(&format!("  - {variable}{marker}\n"));
    }

    out.push_str("\n--- PRESSURE-LEVEL (3D) VARIABLES ---\n");
    out.push_str(&format!("Available levels (hPa): {}\n", ALL_PRESSURE_LEVELS.join(", ")));
    out.push_str(&format!("Default levels: {}\n", DEFAULT_PRESSURE_LEVELS.join(", ")));
    out.push_str(&format!("Total: {} variables\n\n", PRESSURE_LEVEL_VARIABLES.len()));
    for variable in PRESSURE_LEVEL_VARIABLES {
        let marker = if DEFAULT_VARIABLES.contains(variable) { " [DEFAULT]" } else { "" };
        out.push_str(&format!("  - {variable}{marker}\n"));
    }

    out.push_str("\n--- MODEL-LEVEL (3D) VARIABLES ---\n");
    out.push_str(&format!("Available levels: 1-{MODEL_LEVEL_COUNT}\n"));
    out.push_str(&format!("Default levels: {}\n", DEFAULT_MODEL_LEVELS.join(", ")));
    out.push_str(&format!("Total: {} variables\n\n", MODEL_LEVEL_VARIABLES.len()));
    for variable in MODEL_LEVEL_VARIABLES {
        out.push_str(&format!("  - {variable}\n"));
    }
    out.push_str(&format!("\n{rule}\n"));
    out
}
