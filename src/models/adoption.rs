use serde::{Deserialize, Deserializer, Serialize};

/// Regions that are sums of other regions.
pub const AGGREGATE_REGIONS: [&str; 4] = ["World", "Europe", "EU27", "Rest of the world"];

pub fn is_aggregate_region(region: &str) -> bool {
    AGGREGATE_REGIONS.contains(&region)
}

/// Whole years, also written as integral floats (`2022.0`) by tools that store the column as float.
pub fn parse_year(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(year) = value.parse::<i32>() {
        return Some(year);
    }
    let v: f64 = value.parse().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= i32::MAX as f64 {
        Some(v as i32)
    } else {
        None
    }
}

fn deserialize_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_year(&value).ok_or_else(|| serde::de::Error::custom(format!("invalid year '{}'", value)))
}

/// One row of the pre-processed adoption table, one per region/year/category/mode/powertrain.
/// Every column but `region` and `year` may be absent from the file, unparseable numbers read as empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRecord {
    pub region: String,
    #[serde(deserialize_with = "deserialize_year")]
    pub year: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub powertrain: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ev_stock: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ev_sales: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ev_sales_share: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub ev_charging_points: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub total_stations: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub fast_charger_ratio: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub always_available_ratio: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub stations_per_million_evs: Option<f64>,
}

impl AdoptionRecord {
    pub const REQUIRED_COLUMNS: [&'static str; 2] = ["region", "year"];

    pub fn is_bev_or_phev(&self) -> bool {
        self.powertrain == "BEV" || self.powertrain == "PHEV"
    }
}
