use super::figure::{layout, palette_color, Figure};
use super::{require, ChartError, ChartKind, ChartOptions};
use crate::data::{AdoptionTable, InfrastructureRow};
use crate::models::is_aggregate_region;
use serde_json::json;

const TOP_NETWORKS: usize = 10;

/// Share of charging points among the largest networks.
pub fn render(adoption: &AdoptionTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let kind = ChartKind::Infrastructure;
    require(kind, adoption, &["ev_charging_points", "ev_stock"])?;

    let mut rows: Vec<InfrastructureRow> = adoption
        .infrastructure_summary(options.year)
        .into_iter()
        .filter(|r| r.ev_charging_points > 0.0 && !is_aggregate_region(&r.region))
        .collect();
    if rows.is_empty() {
        return Err(ChartError::NoData(
            kind.name(),
            String::from("no region reports charging points"),
        ));
    }
    rows.sort_by(|a, b| b.ev_charging_points.total_cmp(&a.ev_charging_points));
    rows.truncate(TOP_NETWORKS);

    let trace = json!({
        "type": "pie",
        "hole": 0.4,
        "labels": rows.iter().map(|r| r.region.as_str()).collect::<Vec<_>>(),
        "values": rows.iter().map(|r| r.ev_charging_points).collect::<Vec<_>>(),
        "customdata": rows
            .iter()
            .map(|r| json!([r.evs_per_charging_point, r.category]))
            .collect::<Vec<_>>(),
        "marker": { "colors": (0..rows.len()).map(palette_color).collect::<Vec<_>>() },
        "textinfo": "label+percent",
        "hovertemplate": "<b>%{label}</b><br>Charging points: %{value:,.0f}<br>EVs per point: %{customdata[0]:.1f}<br>%{customdata[1]}<extra></extra>"
    });
    Ok(Figure::new(
        vec![trace],
        layout(500, json!({ "showlegend": true })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_adoption;

    #[test]
    fn largest_networks_first() {
        let figure = render(&sample_adoption(), &ChartOptions::default()).unwrap();
        let trace = &figure.data[0];
        assert_eq!(trace["labels"], json!(["China", "USA", "Norway"]));
        assert_eq!(trace["values"], json!([760_000.0, 28_000.0, 20_000.0]));
        assert_eq!(trace["customdata"][2], json!([39.5, "Well Served (≤50 EVs/station)"]));
    }

    #[test]
    fn earlier_year() {
        let options = ChartOptions {
            year: Some(2021),
            ..Default::default()
        };
        let figure = render(&sample_adoption(), &options).unwrap();
        assert_eq!(figure.data[0]["labels"], json!(["China"]));

        let none = ChartOptions {
            year: Some(1990),
            ..Default::default()
        };
        assert!(matches!(
            render(&sample_adoption(), &none),
            Err(ChartError::NoData("infrastructure", _))
        ));
    }
}
