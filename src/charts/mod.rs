mod chart_error;
mod choropleth;
mod correlation;
mod figure;
mod infrastructure;
mod powertrain;
pub mod stats;
mod station_map;
mod timeline;
mod timeseries;

pub use chart_error::ChartError;
pub use figure::Figure;

use crate::data::{AdoptionTable, RegionYear, StationTable};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Timeseries,
    Choropleth,
    #[serde(rename = "adoption_map")]
    AdoptionMap,
    Correlation,
    Powertrain,
    Timeline,
    Stations,
    Infrastructure,
}

impl ChartKind {
    pub const ALL: [ChartKind; 8] = [
        ChartKind::AdoptionMap,
        ChartKind::Choropleth,
        ChartKind::Stations,
        ChartKind::Correlation,
        ChartKind::Timeseries,
        ChartKind::Powertrain,
        ChartKind::Timeline,
        ChartKind::Infrastructure,
    ];

    pub fn from_name(name: &str) -> Option<ChartKind> {
        ChartKind::ALL.iter().copied().find(|k| k.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Timeseries => "timeseries",
            ChartKind::Choropleth => "choropleth",
            ChartKind::AdoptionMap => "adoption_map",
            ChartKind::Correlation => "correlation",
            ChartKind::Powertrain => "powertrain",
            ChartKind::Timeline => "timeline",
            ChartKind::Stations => "stations",
            ChartKind::Infrastructure => "infrastructure",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Timeseries => "EV Adoption Trends Over Time",
            ChartKind::Choropleth => "Charging Stations by Country",
            ChartKind::AdoptionMap => "Global EV Stock by Country",
            ChartKind::Correlation => "EV Stock vs. Charging Infrastructure",
            ChartKind::Powertrain => "Powertrain Technology Distribution",
            ChartKind::Timeline => "Charging Network Growth",
            ChartKind::Stations => "EV Charging Infrastructure Network",
            ChartKind::Infrastructure => "Infrastructure Adequacy",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChartKind::Timeseries => "Selected metric per region and year, hover shows the year over year growth rate.",
            ChartKind::Choropleth => "Merged charging stations per country, optionally up to a given year.",
            ChartKind::AdoptionMap => "EV stock per country in the selected year, hover shows the charging stations.",
            ChartKind::Correlation => "One point per region with an OLS trend line, Pearson r and p-value.",
            ChartKind::Powertrain => "Stacked BEV, PHEV and FCEV stock per region with the BEV/PHEV sales share.",
            ChartKind::Timeline => "Stations added per year and cumulative network size with policy milestones.",
            ChartKind::Stations => "A seeded sample of stations coloured by status.",
            ChartKind::Infrastructure => "Charging points of the ten largest networks and EVs per charging point.",
        }
    }

    /// Which request options change this chart.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            ChartKind::Timeseries => &["regions", "metric"],
            ChartKind::Choropleth => &["year"],
            ChartKind::AdoptionMap => &["year"],
            ChartKind::Correlation => &["year"],
            ChartKind::Powertrain => &["regions"],
            ChartKind::Timeline => &["year"],
            ChartKind::Stations => &[],
            ChartKind::Infrastructure => &["year"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalEvStock,
    TotalStations,
    StationsPerEv,
}

impl Metric {
    pub fn from_name(name: &str) -> Option<Metric> {
        match name {
            "total_ev_stock" => Some(Metric::TotalEvStock),
            "total_stations" => Some(Metric::TotalStations),
            "stations_per_ev" => Some(Metric::StationsPerEv),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::TotalEvStock => "Total EV Stock (vehicles)",
            Metric::TotalStations => "Charging Stations",
            Metric::StationsPerEv => "Stations per EV",
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Metric::TotalEvStock => &["ev_stock"],
            Metric::TotalStations | Metric::StationsPerEv => &["ev_stock", "total_stations"],
        }
    }

    pub fn value(&self, row: &RegionYear) -> Option<f64> {
        match self {
            Metric::TotalEvStock => Some(row.total_ev_stock),
            Metric::TotalStations => row.total_stations,
            Metric::StationsPerEv => row.stations_per_ev,
        }
    }
}

/// Options of one chart request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub year: Option<i32>,
    /// Empty means the five largest regions.
    pub regions: Vec<String>,
    pub metric: Metric,
    pub max_markers: usize,
    pub seed: u64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            year: None,
            regions: vec![],
            metric: Metric::TotalEvStock,
            max_markers: 5000,
            seed: 42,
        }
    }
}

impl ChartOptions {
    /// Reads the `year`, `regions` and `metric` request parameters.
    pub fn with_params(
        mut self,
        year: Option<&str>,
        regions: Option<&str>,
        metric: Option<&str>,
    ) -> Result<ChartOptions, ChartError> {
        if let Some(year) = year.filter(|y| !y.trim().is_empty()) {
            let parsed = year
                .trim()
                .parse::<i32>()
                .map_err(|_| ChartError::InvalidOption("year".into(), year.to_string()))?;
            self.year = Some(parsed);
        }
        if let Some(regions) = regions {
            self.regions = regions
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(metric) = metric.filter(|m| !m.trim().is_empty()) {
            self.metric = Metric::from_name(metric.trim())
                .ok_or_else(|| ChartError::InvalidOption("metric".into(), metric.to_string()))?;
        }
        Ok(self)
    }

    fn regions_or_top(&self, adoption: &AdoptionTable) -> Vec<String> {
        if self.regions.is_empty() {
            adoption.top_regions(5, None)
        } else {
            self.regions.clone()
        }
    }
}

fn require(chart: ChartKind, adoption: &AdoptionTable, columns: &[&str]) -> Result<(), ChartError> {
    let missing = adoption.missing_columns(columns);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ChartError::MissingColumns(chart.name(), missing))
    }
}

/// Builds one chart from the loaded tables. Pure: the tables are never changed.
pub fn render(
    kind: ChartKind,
    stations: &StationTable,
    adoption: &AdoptionTable,
    options: &ChartOptions,
) -> Result<Figure, ChartError> {
    trace!("render {} with {:?}", kind.name(), options);
    match kind {
        ChartKind::Timeseries => timeseries::render(adoption, options),
        ChartKind::Choropleth => choropleth::render(stations, options),
        ChartKind::AdoptionMap => choropleth::render_adoption(adoption, options),
        ChartKind::Correlation => correlation::render(adoption, options),
        ChartKind::Powertrain => powertrain::render(adoption, options),
        ChartKind::Timeline => timeline::render(stations, options),
        ChartKind::Stations => station_map::render(stations, options),
        ChartKind::Infrastructure => infrastructure::render(adoption, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{sample_adoption, sample_stations};

    #[test]
    fn chart_names() {
        for kind in ChartKind::ALL.iter() {
            assert_eq!(ChartKind::from_name(kind.name()), Some(*kind));
        }
        assert_eq!(ChartKind::from_name("pie"), None);
        assert_eq!(serde_json::to_value(ChartKind::Timeseries).unwrap(), "timeseries");
        assert_eq!(serde_json::to_value(ChartKind::AdoptionMap).unwrap(), "adoption_map");
    }

    #[test]
    fn request_parameters() {
        let options = ChartOptions::default()
            .with_params(Some("2021"), Some("China, Norway,,"), Some("stations_per_ev"))
            .unwrap();
        assert_eq!(options.year, Some(2021));
        assert_eq!(options.regions, vec!["China", "Norway"]);
        assert_eq!(options.metric, Metric::StationsPerEv);

        let defaults = ChartOptions::default().with_params(Some(""), None, None).unwrap();
        assert_eq!(defaults, ChartOptions::default());

        assert_eq!(
            ChartOptions::default().with_params(Some("soon"), None, None),
            Err(ChartError::InvalidOption("year".into(), "soon".into()))
        );
        assert!(ChartOptions::default().with_params(None, None, Some("speed")).is_err());
    }

    #[test]
    fn every_chart_renders_sample_data() {
        let stations = sample_stations();
        let adoption = sample_adoption();
        let options = ChartOptions::default();
        for kind in ChartKind::ALL.iter() {
            let figure = render(*kind, &stations, &adoption, &options).unwrap();
            assert!(!figure.data.is_empty(), "{} has no traces", kind.name());
        }
    }

    #[test]
    fn missing_columns_name_the_chart() {
        let stations = sample_stations();
        let adoption = AdoptionTable::from_reader("a.csv", "region,year,ev_stock\nChina,2022,5\n".as_bytes()).unwrap();
        match render(ChartKind::Correlation, &stations, &adoption, &ChartOptions::default()) {
            Err(ChartError::MissingColumns(chart, columns)) => {
                assert_eq!(chart, "correlation");
                assert_eq!(columns, vec!["total_stations"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        let err = render(ChartKind::Powertrain, &stations, &adoption, &ChartOptions::default()).unwrap_err();
        assert!(err.to_string().contains("powertrain"));
        // station charts do not depend on the adoption table
        assert!(render(ChartKind::Timeline, &stations, &adoption, &ChartOptions::default()).is_ok());
    }
}
