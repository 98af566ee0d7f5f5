use super::figure::{layout, Figure, GRID_COLOR, TEXT_COLOR};
use super::stats::share_pct;
use super::{require, ChartError, ChartKind, ChartOptions};
use crate::data::{AdoptionTable, PowertrainTotal, POWERTRAINS};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

pub const FIRST_YEAR: i32 = 2015;
pub const LAST_YEAR: i32 = 2023;

fn powertrain_color(powertrain: &str) -> &'static str {
    match powertrain {
        "BEV" => "#E31937",
        "PHEV" => "#5C5E62",
        _ => "#171A20",
    }
}

/// BEV and PHEV share of their combined sales per year, FCEV has no share.
fn sales_shares(totals: &[&PowertrainTotal]) -> BTreeMap<(i32, String), f64> {
    let mut combined: BTreeMap<i32, f64> = BTreeMap::new();
    for t in totals.iter().filter(|t| t.powertrain != "FCEV") {
        *combined.entry(t.year).or_insert(0.0) += t.ev_sales;
    }
    let mut shares = BTreeMap::new();
    for t in totals.iter().filter(|t| t.powertrain != "FCEV") {
        let total = combined.get(&t.year).copied().unwrap_or(0.0);
        if let Some(share) = share_pct(t.ev_sales, total) {
            shares.insert((t.year, t.powertrain.clone()), share);
        }
    }
    shares
}

/// Stacked stock bars, one subplot per region.
pub fn render(adoption: &AdoptionTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let kind = ChartKind::Powertrain;
    require(kind, adoption, &["powertrain", "ev_stock", "ev_sales"])?;

    let regions = options.regions_or_top(adoption);
    let all = adoption.powertrain_totals();
    let mut traces = vec![];
    let mut axes = Map::new();
    let mut annotations = vec![];
    let columns = regions.len().max(1) as f64;
    let gap = 0.03;

    for (i, region) in regions.iter().enumerate() {
        let totals: Vec<&PowertrainTotal> = all
            .iter()
            .filter(|t| &t.region == region && t.year >= FIRST_YEAR && t.year <= LAST_YEAR)
            .collect();
        let shares = sales_shares(&totals);
        let suffix = if i == 0 { String::new() } else { (i + 1).to_string() };

        for powertrain in POWERTRAINS.iter() {
            let series: Vec<&&PowertrainTotal> = totals
                .iter()
                .filter(|t| t.powertrain == *powertrain && t.ev_stock > 0.0)
                .collect();
            if series.is_empty() {
                continue;
            }
            let years: Vec<i32> = series.iter().map(|t| t.year).collect();
            let stock: Vec<f64> = series.iter().map(|t| t.ev_stock).collect();
            let share: Vec<Option<f64>> = series
                .iter()
                .map(|t| shares.get(&(t.year, t.powertrain.clone())).copied())
                .collect();
            traces.push(json!({
                "type": "bar",
                "name": powertrain,
                "legendgroup": powertrain,
                "showlegend": i == 0,
                "x": years,
                "y": stock,
                "customdata": share,
                "xaxis": format!("x{}", suffix),
                "yaxis": format!("y{}", suffix),
                "marker": { "color": powertrain_color(powertrain) },
                "hovertemplate": format!(
                    "<b>{} {}</b><br>%{{x}}: %{{y:,.0f}}<br>Sales share: %{{customdata:.1f}}%<extra></extra>",
                    region, powertrain
                )
            }));
        }

        let start = i as f64 / columns;
        let end = (i + 1) as f64 / columns - if i + 1 < regions.len() { gap } else { 0.0 };
        axes.insert(
            format!("xaxis{}", suffix),
            json!({ "domain": [start, end], "anchor": format!("y{}", suffix), "showgrid": true, "gridcolor": GRID_COLOR }),
        );
        axes.insert(
            format!("yaxis{}", suffix),
            json!({ "type": "log", "anchor": format!("x{}", suffix), "showgrid": true, "gridcolor": GRID_COLOR }),
        );
        annotations.push(json!({
            "text": region,
            "xref": "paper", "yref": "paper",
            "x": (start + end) / 2.0, "y": 1.0,
            "xanchor": "center", "yanchor": "bottom",
            "showarrow": false,
            "font": { "size": 12, "color": TEXT_COLOR }
        }));
    }

    if traces.is_empty() {
        return Err(ChartError::NoData(
            kind.name(),
            format!(
                "no BEV, PHEV or FCEV stock between {} and {} for {}",
                FIRST_YEAR,
                LAST_YEAR,
                regions.join(", ")
            ),
        ));
    }

    let mut extra = json!({
        "barmode": "stack",
        "annotations": annotations,
        "legend": { "orientation": "h", "yanchor": "bottom", "y": 1.08, "xanchor": "right", "x": 1 },
        "margin": { "l": 60, "r": 20, "t": 60, "b": 50 }
    });
    if let Value::Object(ref mut map) = extra {
        map.extend(axes);
    }
    Ok(Figure::new(traces, layout(500, extra)))
}
