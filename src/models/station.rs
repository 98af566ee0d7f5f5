use chrono::DateTime;
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_with::formats::Separator;
use serde_with::serde_as;
use serde_with::StringWithSeparator;
use std::collections::HashMap;
use std::fmt::Display;
use std::fmt::Formatter;

/// Joins connector types with `|` so the list survives inside a comma separated file.
pub struct PipeSeparator;

impl Separator for PipeSeparator {
    fn separator() -> &'static str {
        "|"
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StationStatus {
    Operational,
    Planned,
    TemporarilyUnavailable,
    NotOperational,
    Unknown,
    PartlyOperational,
}

static STATUS_ALIASES: Lazy<HashMap<&'static str, StationStatus>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("operational", StationStatus::Operational);
    m.insert("available", StationStatus::Operational);
    m.insert("planned", StationStatus::Planned);
    m.insert("planned for future date", StationStatus::Planned);
    m.insert("under construction", StationStatus::Planned);
    m.insert("temporarilyunavailable", StationStatus::TemporarilyUnavailable);
    m.insert("temporarily unavailable", StationStatus::TemporarilyUnavailable);
    m.insert("notoperational", StationStatus::NotOperational);
    m.insert("not operational", StationStatus::NotOperational);
    m.insert("removed (decommissioned)", StationStatus::NotOperational);
    m.insert("partlyoperational", StationStatus::PartlyOperational);
    m.insert("partly operational", StationStatus::PartlyOperational);
    m.insert("partly operational (mixed)", StationStatus::PartlyOperational);
    m.insert("unknown", StationStatus::Unknown);
    m
});

impl StationStatus {
    pub const ALL: [StationStatus; 6] = [
        StationStatus::Operational,
        StationStatus::Planned,
        StationStatus::TemporarilyUnavailable,
        StationStatus::NotOperational,
        StationStatus::Unknown,
        StationStatus::PartlyOperational,
    ];

    /// Maps free text from a source table to a status. Anything unrecognized is `Unknown`.
    pub fn from_source(value: &str) -> StationStatus {
        let key = value.trim().to_lowercase();
        STATUS_ALIASES
            .get(key.as_str())
            .copied()
            .unwrap_or(StationStatus::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StationStatus::Operational => "Operational",
            StationStatus::Planned => "Planned",
            StationStatus::TemporarilyUnavailable => "Temporarily Unavailable",
            StationStatus::NotOperational => "Not Operational",
            StationStatus::Unknown => "Unknown",
            StationStatus::PartlyOperational => "Partly Operational",
        }
    }

    /// Marker colour on the station map.
    pub fn color(&self) -> &'static str {
        match self {
            StationStatus::Operational => "green",
            StationStatus::PartlyOperational => "limegreen",
            StationStatus::Planned => "blue",
            StationStatus::TemporarilyUnavailable => "orange",
            StationStatus::NotOperational => "red",
            StationStatus::Unknown => "gray",
        }
    }
}

impl Display for StationStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One row of the merged charging station file.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargingStation {
    pub id: i64,
    pub title: String,
    pub address: String,
    pub town: String,
    pub state: String,
    pub postcode: String,
    pub country_code: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub operator: String,
    pub status: StationStatus,
    pub num_connectors: u32,
    #[serde_as(as = "StringWithSeparator::<PipeSeparator, String>")]
    pub connector_types: Vec<String>,
    pub date_added: Option<DateTime<Utc>>,
}

impl ChargingStation {
    /// Column order of the canonical schema, identical to the serialized header.
    pub const COLUMNS: [&'static str; 14] = [
        "id",
        "title",
        "address",
        "town",
        "state",
        "postcode",
        "country_code",
        "lat",
        "lon",
        "operator",
        "status",
        "num_connectors",
        "connector_types",
        "date_added",
    ];

    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }

    /// "town, state, country" without the empty parts.
    pub fn location(&self) -> String {
        let parts: Vec<&str> = [
            self.town.as_str(),
            self.state.as_str(),
            self.country_code.as_str(),
        ]
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
        if parts.is_empty() {
            String::from("N/A")
        } else {
            parts.join(", ")
        }
    }
}
