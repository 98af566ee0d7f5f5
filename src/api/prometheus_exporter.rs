use super::DashboardState;
use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

/// Request counters and gauges describing the loaded data.
pub struct RequestMetrics {
    registry: Registry,
    requests: IntCounterVec,
    stations: IntGauge,
    status: IntGaugeVec,
    coordinates: IntGaugeVec,
    adoption_rows: IntGauge,
    adoption_skipped_rows: IntGauge,
}

impl RequestMetrics {
    pub fn new(prefix: &str) -> Result<Self, prometheus::Error> {
        let prefix = prefix.trim_end_matches('_');
        let prefix = if prefix.is_empty() {
            None
        } else {
            Some(prefix.to_string())
        };
        let registry = Registry::new_custom(prefix, None)?;

        let requests = IntCounterVec::new(
            Opts::new("requests_total", "HTTP requests by route and status code"),
            &["route", "status"],
        )?;
        let stations = IntGauge::new("stations", "Charging stations in the merged file")?;
        let status = IntGaugeVec::new(
            Opts::new("stations_by_status", "Charging stations by operational status"),
            &["status"],
        )?;
        let coordinates = IntGaugeVec::new(
            Opts::new("station_coordinates", "Stations by coordinate validity from the last merge"),
            &["validity"],
        )?;
        let adoption_rows = IntGauge::new("adoption_rows", "Rows in the adoption table")?;
        let adoption_skipped_rows = IntGauge::new(
            "adoption_skipped_rows",
            "Adoption rows skipped for a missing region or year",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(stations.clone()))?;
        registry.register(Box::new(status.clone()))?;
        registry.register(Box::new(coordinates.clone()))?;
        registry.register(Box::new(adoption_rows.clone()))?;
        registry.register(Box::new(adoption_skipped_rows.clone()))?;

        Ok(RequestMetrics {
            registry,
            requests,
            stations,
            status,
            coordinates,
            adoption_rows,
            adoption_skipped_rows,
        })
    }

    pub fn set_data(&self, state: &DashboardState) {
        self.stations.set(state.stations.len() as i64);
        for (status, count) in state.stations.count_by_status() {
            self.status.with_label_values(&[status.label()]).set(count as i64);
        }
        self.adoption_rows.set(state.adoption.rows.len() as i64);
        self.adoption_skipped_rows.set(state.adoption.skipped_rows as i64);
        let (valid, invalid, missing) = match state.report {
            Some(ref report) => (
                report.coordinates.valid,
                report.coordinates.invalid,
                report.coordinates.missing,
            ),
            None => {
                let valid = state.stations.with_coordinates().count();
                (valid, 0, state.stations.len() - valid)
            }
        };
        self.coordinates.with_label_values(&["valid"]).set(valid as i64);
        self.coordinates.with_label_values(&["invalid"]).set(invalid as i64);
        self.coordinates.with_label_values(&["missing"]).set(missing as i64);
    }

    pub fn observe(&self, route: &str, status: u16) {
        let status = status.to_string();
        self.requests.with_label_values(&[route, status.as_str()]).inc();
    }

    pub fn render(&self) -> Result<rouille::Response, Box<dyn std::error::Error>> {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(rouille::Response::from_data(encoder.format_type().to_string(), buffer).with_status_code(200))
    }
}
