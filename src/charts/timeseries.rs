use super::figure::{axis, layout, palette_color, Figure};
use super::stats::pct_change;
use super::{require, ChartError, ChartKind, ChartOptions, Metric};
use crate::data::{AdoptionTable, RegionYear};
use serde_json::json;

pub fn render(adoption: &AdoptionTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let kind = ChartKind::Timeseries;
    require(kind, adoption, options.metric.required_columns())?;

    let regions = options.regions_or_top(adoption);
    let rows = adoption.ev_stock_by_region_year();
    let mut traces = vec![];
    for (i, region) in regions.iter().enumerate() {
        let series: Vec<&RegionYear> = rows.iter().filter(|r| &r.region == region).collect();
        if series.is_empty() {
            continue;
        }
        let years: Vec<i32> = series.iter().map(|r| r.year).collect();
        let values: Vec<Option<f64>> = series.iter().map(|r| options.metric.value(r)).collect();
        let growth = pct_change(&values);
        traces.push(json!({
            "type": "scatter",
            "mode": "lines+markers",
            "name": region,
            "x": years,
            "y": values,
            "customdata": growth,
            "line": { "width": 2.5, "color": palette_color(i) },
            "marker": { "size": 6 },
            "hovertemplate": format!(
                "<b>{}</b><br>%{{x}}: %{{y:,.4~f}}<br>YoY growth: %{{customdata:+.1f}}%<extra></extra>",
                region
            )
        }));
    }
    if traces.is_empty() {
        return Err(ChartError::NoData(
            kind.name(),
            format!("no EV stock rows for regions {}", regions.join(", ")),
        ));
    }

    let mut y_axis = axis(options.metric.label());
    if options.metric == Metric::TotalEvStock {
        y_axis["type"] = json!("log");
    }
    Ok(Figure::new(
        traces,
        layout(
            500,
            json!({
                "hovermode": "x unified",
                "xaxis": axis("Year"),
                "yaxis": y_axis,
                "margin": { "l": 60, "r": 140, "t": 20, "b": 50 }
            }),
        ),
    ))
}
