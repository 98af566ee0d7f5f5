use super::figure::{layout, Figure};
use super::{ChartError, ChartKind, ChartOptions};
use crate::data::StationTable;
use crate::merge::draw_sample;
use crate::models::{ChargingStation, StationStatus};
use serde_json::json;

fn hover_text(station: &ChargingStation) -> String {
    let title = if station.title.trim().is_empty() {
        "N/A"
    } else {
        station.title.as_str()
    };
    format!(
        "<b>{}</b><br>Location: {}<br>Operator: {}<br>Connectors: {}<br>Status: {}",
        title,
        station.location(),
        station.operator,
        station.num_connectors,
        station.status
    )
}

/// Seeded sample of stations with coordinates, one trace per status.
pub fn render(stations: &StationTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let located: Vec<&ChargingStation> = stations.with_coordinates().collect();
    if located.is_empty() {
        return Err(ChartError::NoData(
            ChartKind::Stations.name(),
            String::from("no station has coordinates"),
        ));
    }
    let sample = draw_sample(&located, options.max_markers, options.seed);
    debug!("station map shows {} of {} located stations", sample.len(), located.len());

    let mut traces = vec![];
    for status in StationStatus::ALL.iter() {
        let group: Vec<&&ChargingStation> = sample.iter().filter(|s| s.status == *status).collect();
        if group.is_empty() {
            continue;
        }
        traces.push(json!({
            "type": "scattergeo",
            "mode": "markers",
            "name": format!("{} ({})", status.label(), group.len()),
            "lat": group.iter().map(|s| s.lat).collect::<Vec<_>>(),
            "lon": group.iter().map(|s| s.lon).collect::<Vec<_>>(),
            "text": group.iter().map(|s| hover_text(s)).collect::<Vec<_>>(),
            "hoverinfo": "text",
            "marker": { "size": 6, "color": status.color(), "opacity": 0.8 }
        }));
    }

    Ok(Figure::new(
        traces,
        layout(
            600,
            json!({
                "margin": { "l": 0, "r": 0, "t": 30, "b": 0 },
                "geo": {
                    "projection": { "type": "natural earth" },
                    "showland": true,
                    "landcolor": "#F4F4F4",
                    "showcountries": true,
                    "countrycolor": "#D0D0D0"
                },
                "meta": { "shown": sample.len(), "located": located.len(), "total": stations.len() }
            }),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_stations;

    #[test]
    fn traces_per_status() {
        let figure = render(&sample_stations(), &ChartOptions::default()).unwrap();
        let names: Vec<&str> = figure.data.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "Operational (2)",
                "Planned (1)",
                "Temporarily Unavailable (1)",
                "Not Operational (1)"
            ]
        );
        assert_eq!(figure.data[0]["marker"]["color"], "green");
        assert_eq!(figure.layout["meta"]["located"], 5);
        let text = figure.data[2]["text"][0].as_str().unwrap();
        assert!(text.contains("Location: London, GB"));
        assert!(text.contains("Operator: Shell"));
    }

    #[test]
    fn sample_is_capped_and_stable() {
        let options = ChartOptions {
            max_markers: 3,
            ..Default::default()
        };
        let first = render(&sample_stations(), &options).unwrap();
        let second = render(&sample_stations(), &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.layout["meta"]["shown"], 3);
        let markers: usize = first
            .data
            .iter()
            .map(|t| t["lat"].as_array().unwrap().len())
            .sum();
        assert_eq!(markers, 3);
    }
}
