use super::figure::{axis, layout, Figure, ACCENT, TEXT_COLOR};
use super::stats::{linear_regression, pearson};
use super::{require, ChartError, ChartKind, ChartOptions};
use crate::data::AdoptionTable;
use crate::models::is_aggregate_region;
use serde_json::json;

pub fn render(adoption: &AdoptionTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let kind = ChartKind::Correlation;
    require(kind, adoption, &["ev_stock", "total_stations"])?;
    let year = options
        .year
        .or_else(|| adoption.latest_year())
        .ok_or_else(|| ChartError::NoData(kind.name(), String::from("adoption table is empty")))?;

    let mut regions = vec![];
    let mut x = vec![];
    let mut y = vec![];
    for row in adoption.ev_stock_by_region_year() {
        if row.year != year || is_aggregate_region(&row.region) {
            continue;
        }
        if let Some(stations) = row.total_stations {
            x.push(row.total_ev_stock);
            y.push(stations);
            regions.push(row.region);
        }
    }
    let correlation = pearson(&x, &y).ok_or_else(|| {
        ChartError::NoData(
            kind.name(),
            format!("{} regions with stock and stations in {}, at least 3 needed", x.len(), year),
        )
    })?;
    let fit = linear_regression(&x, &y).ok_or_else(|| {
        ChartError::NoData(kind.name(), String::from("EV stock does not vary between regions"))
    })?;

    let x_min = x.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let points = json!({
        "type": "scatter",
        "mode": "markers+text",
        "name": "Regions",
        "x": x,
        "y": y,
        "text": regions,
        "textposition": "top center",
        "marker": { "size": 10, "color": ACCENT, "opacity": 0.8 },
        "hovertemplate": "<b>%{text}</b><br>EV stock: %{x:,.0f}<br>Stations: %{y:,.0f}<extra></extra>"
    });
    let trend = json!({
        "type": "scatter",
        "mode": "lines",
        "name": "OLS trend",
        "x": [x_min, x_max],
        "y": [fit.at(x_min), fit.at(x_max)],
        "line": { "color": TEXT_COLOR, "dash": "dash", "width": 2 }
    });
    let summary = format!(
        "r = {:.3}, p = {:.4}, n = {}",
        correlation.r, correlation.p_value, correlation.n
    );
    debug!("correlation {}: {}", year, summary);

    Ok(Figure::new(
        vec![points, trend],
        layout(
            500,
            json!({
                "xaxis": axis(&format!("EV stock {}", year)),
                "yaxis": axis("Charging stations"),
                "annotations": [{
                    "xref": "paper", "yref": "paper", "x": 0.02, "y": 0.98,
                    "showarrow": false, "align": "left",
                    "text": summary,
                    "bgcolor": "rgba(255,255,255,0.8)"
                }],
                "meta": {
                    "r": correlation.r,
                    "p_value": correlation.p_value,
                    "n": correlation.n,
                    "slope": fit.slope,
                    "intercept": fit.intercept
                }
            }),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_adoption;

    #[test]
    fn regions_of_latest_year() {
        let figure = render(&sample_adoption(), &ChartOptions::default()).unwrap();
        assert_eq!(figure.data[0]["text"], json!(["China", "Norway", "USA"]));
        assert_eq!(figure.data[1]["x"], json!([790_000.0, 13_512_000.0]));
        let r = figure.layout["meta"]["r"].as_f64().unwrap();
        assert!((r - 0.9882501917744989).abs() < 1e-9);
        let text = figure.layout["annotations"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("r = 0.988, p = "));
        assert!(text.ends_with("n = 3"));
    }

    #[test]
    fn too_few_regions() {
        let options = ChartOptions {
            year: Some(2030),
            ..Default::default()
        };
        match render(&sample_adoption(), &options) {
            Err(ChartError::NoData(chart, reason)) => {
                assert_eq!(chart, "correlation");
                assert!(reason.contains("0 regions"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
