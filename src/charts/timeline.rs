use super::figure::{axis, layout, Figure, ACCENT, TEXT_COLOR};
use super::stats::pct_change;
use super::{ChartError, ChartKind, ChartOptions};
use crate::data::StationTable;
use serde_json::{json, Value};

pub struct PolicyMarker {
    pub year: i32,
    pub label: &'static str,
    pub color: &'static str,
}

pub const POLICY_MARKERS: [PolicyMarker; 3] = [
    PolicyMarker {
        year: 2016,
        label: "Paris Agreement (2016)",
        color: "red",
    },
    PolicyMarker {
        year: 2020,
        label: "EU Green Deal (2020)",
        color: "green",
    },
    PolicyMarker {
        year: 2022,
        label: "U.S. Federal EV Tax Credit Expansion (2022)",
        color: "blue",
    },
];

/// Stations added per year as bars, the cumulative network on a second axis.
pub fn render(stations: &StationTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let per_year: Vec<(i32, usize)> = stations
        .added_per_year()
        .into_iter()
        .filter(|(year, _)| options.year.map(|cutoff| *year <= cutoff).unwrap_or(true))
        .collect();
    let (first_year, last_year) = match (per_year.first(), per_year.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => {
            return Err(ChartError::NoData(
                ChartKind::Timeline.name(),
                String::from("no station has a date_added value"),
            ))
        }
    };

    let years: Vec<i32> = per_year.iter().map(|(year, _)| *year).collect();
    let added: Vec<usize> = per_year.iter().map(|(_, count)| *count).collect();
    let cumulative: Vec<usize> = added
        .iter()
        .scan(0, |total, count| {
            *total += count;
            Some(*total)
        })
        .collect();
    let growth = pct_change(&cumulative.iter().map(|c| Some(*c as f64)).collect::<Vec<_>>());

    let bars = json!({
        "type": "bar",
        "name": "Stations added",
        "x": years,
        "y": added,
        "marker": { "color": "#B8B8B8" },
        "hovertemplate": "%{x}: %{y:,} added<extra></extra>"
    });
    let line = json!({
        "type": "scatter",
        "mode": "lines+markers",
        "name": "Cumulative stations",
        "x": years,
        "y": cumulative,
        "customdata": growth,
        "yaxis": "y2",
        "line": { "color": ACCENT, "width": 2.5 },
        "hovertemplate": "%{x}: %{y:,} total<br>Growth: %{customdata:+.1f}%<extra></extra>"
    });

    let mut shapes: Vec<Value> = vec![];
    let mut annotations: Vec<Value> = vec![];
    for marker in POLICY_MARKERS.iter() {
        if marker.year < first_year || marker.year > last_year {
            continue;
        }
        shapes.push(json!({
            "type": "line",
            "xref": "x", "yref": "paper",
            "x0": marker.year, "x1": marker.year, "y0": 0, "y1": 1,
            "line": { "color": marker.color, "dash": "dot", "width": 2 },
            "opacity": 0.6
        }));
        annotations.push(json!({
            "xref": "x", "yref": "paper",
            "x": marker.year, "y": 0.95,
            "text": marker.label,
            "showarrow": false,
            "font": { "size": 10, "color": marker.color },
            "bgcolor": "rgba(255,255,255,0.8)"
        }));
    }

    let mut y2 = axis("Cumulative stations");
    y2["overlaying"] = json!("y");
    y2["side"] = json!("right");
    y2["showgrid"] = json!(false);
    y2["title"]["font"] = json!({ "color": TEXT_COLOR });
    Ok(Figure::new(
        vec![bars, line],
        layout(
            500,
            json!({
                "xaxis": axis("Year"),
                "yaxis": axis("Stations added"),
                "yaxis2": y2,
                "shapes": shapes,
                "annotations": annotations,
                "legend": { "x": 0.01, "y": 0.99 }
            }),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_stations;

    #[test]
    fn cumulative_with_markers_in_range() {
        let figure = render(&sample_stations(), &ChartOptions::default()).unwrap();
        assert_eq!(figure.data[0]["x"], json!([2019, 2020, 2021, 2022]));
        assert_eq!(figure.data[0]["y"], json!([1, 1, 2, 1]));
        assert_eq!(figure.data[1]["y"], json!([1, 2, 4, 5]));
        assert_eq!(figure.data[1]["customdata"], json!([null, 100.0, 100.0, 25.0]));
        // 2016 is before the first station
        let labels: Vec<&str> = figure.layout["annotations"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["text"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["EU Green Deal (2020)", "U.S. Federal EV Tax Credit Expansion (2022)"]);
        assert_eq!(figure.layout["shapes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn cutoff_and_empty() {
        let options = ChartOptions {
            year: Some(2020),
            ..Default::default()
        };
        let figure = render(&sample_stations(), &options).unwrap();
        assert_eq!(figure.data[1]["y"], json!([1, 2]));
        assert!(render(&StationTable::default(), &ChartOptions::default()).is_err());
    }
}
