use super::AdoptionTable;
use crate::models::is_aggregate_region;
use serde::{Deserialize, Serialize};

/// Headline numbers of one year, aggregate regions left out so nothing is counted twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub year: i32,
    pub total_ev_stock: f64,
    pub total_stations: f64,
    pub avg_stations_per_ev: f64,
    pub yoy_growth_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiCard {
    pub title: String,
    pub value: String,
    pub subtitle: String,
}

fn totals(table: &AdoptionTable, year: i32) -> (f64, f64) {
    table
        .ev_stock_by_region_year()
        .iter()
        .filter(|r| r.year == year && !is_aggregate_region(&r.region))
        .fold((0.0, 0.0), |(stock, stations), r| {
            (stock + r.total_ev_stock, stations + r.total_stations.unwrap_or(0.0))
        })
}

pub fn summary_stats(table: &AdoptionTable, year: Option<i32>) -> Option<SummaryStats> {
    let (min_year, max_year) = table.year_range()?;
    let year = year.unwrap_or(max_year);
    let (total_ev_stock, total_stations) = totals(table, year);
    let avg_stations_per_ev = if total_ev_stock > 0.0 {
        total_stations / total_ev_stock
    } else {
        0.0
    };
    let yoy_growth_pct = if year > min_year {
        let (previous, _) = totals(table, year - 1);
        if previous > 0.0 {
            (total_ev_stock - previous) / previous * 100.0
        } else {
            0.0
        }
    } else {
        0.0
    };
    Some(SummaryStats {
        year,
        total_ev_stock,
        total_stations,
        avg_stations_per_ev,
        yoy_growth_pct,
    })
}

/// `1234567.8` becomes `1,234,568`.
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::new();
    for (i, c) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}

pub fn kpi_cards(stats: &SummaryStats) -> Vec<KpiCard> {
    vec![
        KpiCard {
            title: String::from("Total EV Stock"),
            value: format_thousands(stats.total_ev_stock),
            subtitle: format!("Year {}", stats.year),
        },
        KpiCard {
            title: String::from("Total Charging Stations"),
            value: format_thousands(stats.total_stations),
            subtitle: String::from("Excluding aggregate regions"),
        },
        KpiCard {
            title: String::from("Avg Stations per EV"),
            value: format!("{:.4}", stats.avg_stations_per_ev),
            subtitle: String::from("Infrastructure Ratio"),
        },
        KpiCard {
            title: String::from("YoY Growth Rate"),
            value: format!("{:+.1}%", stats.yoy_growth_pct),
            subtitle: String::from("Year over Year"),
        },
    ]
}
