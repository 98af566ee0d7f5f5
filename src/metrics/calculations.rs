use crate::charts::stats::{pct_change, quantile, share_pct};
use crate::data::{format_thousands, AdoptionTable};
use crate::models::{is_aggregate_region, AdoptionRecord};
use serde::Serialize;
use std::collections::BTreeMap;

pub const GROWTH_YEARS: [i32; 3] = [2021, 2022, 2023];
const LEADERS: usize = 10;

fn first(slot: &mut Option<f64>, value: Option<f64>) {
    if slot.is_none() {
        *slot = value;
    }
}

type GroupKey<'a> = (&'a str, i32, &'a str, &'a str);

fn bev_phev_groups(table: &AdoptionTable) -> BTreeMap<GroupKey<'_>, Vec<&AdoptionRecord>> {
    let mut groups: BTreeMap<GroupKey, Vec<&AdoptionRecord>> = BTreeMap::new();
    for row in table.rows.iter().filter(|r| r.is_bev_or_phev()) {
        groups
            .entry((row.region.as_str(), row.year, row.category.as_str(), row.mode.as_str()))
            .or_default()
            .push(row);
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationsRatio {
    pub region: String,
    pub year: i32,
    pub category: String,
    pub mode: String,
    pub ev_stock: f64,
    pub total_stations: f64,
    pub stations_per_1000_evs: Option<f64>,
    pub stations_per_million_evs: Option<f64>,
    pub fast_charger_ratio: Option<f64>,
    pub always_available_ratio: Option<f64>,
}

/// BEV and PHEV stock per region, year, category and mode, rows without stations dropped.
pub fn stations_per_ev_ratio(table: &AdoptionTable) -> Vec<StationsRatio> {
    let mut out = vec![];
    for ((region, year, category, mode), rows) in bev_phev_groups(table) {
        let ev_stock: f64 = rows.iter().filter_map(|r| r.ev_stock).sum();
        let mut total_stations = None;
        let mut fast_charger_ratio = None;
        let mut always_available_ratio = None;
        let mut stations_per_million_evs = None;
        for row in rows.iter() {
            first(&mut total_stations, row.total_stations);
            first(&mut fast_charger_ratio, row.fast_charger_ratio);
            first(&mut always_available_ratio, row.always_available_ratio);
            first(&mut stations_per_million_evs, row.stations_per_million_evs);
        }
        let total_stations = match total_stations {
            Some(stations) => stations,
            None => continue,
        };
        let stations_per_1000_evs = if ev_stock > 0.0 {
            Some(total_stations / (ev_stock / 1000.0))
        } else {
            None
        };
        out.push(StationsRatio {
            region: region.to_string(),
            year,
            category: category.to_string(),
            mode: mode.to_string(),
            ev_stock,
            total_stations,
            stations_per_1000_evs,
            stations_per_million_evs,
            fast_charger_ratio,
            always_available_ratio,
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthRate {
    pub region: String,
    pub year: i32,
    pub category: String,
    pub mode: String,
    pub powertrain: &'static str,
    pub ev_sales: f64,
    pub ev_sales_yoy_growth: Option<f64>,
    pub ev_stock: f64,
    pub ev_stock_yoy_growth: Option<f64>,
    pub total_stations: Option<f64>,
    pub total_stations_yoy_growth: Option<f64>,
}

/// Year over year growth of BEV+PHEV sales, stock and stations per region and mode.
pub fn yoy_growth_rates(table: &AdoptionTable) -> Vec<GrowthRate> {
    let mut years: BTreeMap<(&str, &str, i32), GrowthRate> = BTreeMap::new();
    for row in table.rows.iter().filter(|r| r.is_bev_or_phev()) {
        let entry = years
            .entry((row.region.as_str(), row.mode.as_str(), row.year))
            .or_insert_with(|| GrowthRate {
                region: row.region.clone(),
                year: row.year,
                category: row.category.clone(),
                mode: row.mode.clone(),
                powertrain: "EV",
                ev_sales: 0.0,
                ev_sales_yoy_growth: None,
                ev_stock: 0.0,
                ev_stock_yoy_growth: None,
                total_stations: None,
                total_stations_yoy_growth: None,
            });
        entry.ev_sales += row.ev_sales.unwrap_or(0.0);
        entry.ev_stock += row.ev_stock.unwrap_or(0.0);
        first(&mut entry.total_stations, row.total_stations);
    }

    // keys are ordered by region and mode first, so every series is contiguous
    let mut out: Vec<GrowthRate> = years.into_values().collect();
    let mut start = 0;
    while start < out.len() {
        let end = start
            + out[start..]
                .iter()
                .take_while(|g| g.region == out[start].region && g.mode == out[start].mode)
                .count();
        let series = &mut out[start..end];
        let sales = pct_change(&series.iter().map(|g| Some(g.ev_sales)).collect::<Vec<_>>());
        let stock = pct_change(&series.iter().map(|g| Some(g.ev_stock)).collect::<Vec<_>>());
        let stations = pct_change(&series.iter().map(|g| g.total_stations).collect::<Vec<_>>());
        for (i, g) in series.iter_mut().enumerate() {
            g.ev_sales_yoy_growth = sales[i];
            g.ev_stock_yoy_growth = stock[i];
            g.total_stations_yoy_growth = stations[i];
        }
        start = end;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfrastructureAdequacy {
    pub region: String,
    pub year: i32,
    pub category: String,
    pub mode: String,
    pub ev_stock: f64,
    pub total_stations: f64,
    pub stations_per_1000_evs: Option<f64>,
    pub fast_charger_ratio: Option<f64>,
    pub always_available_ratio: Option<f64>,
    pub infrastructure_score: f64,
    pub adequacy_category: &'static str,
}

/// Weighted score out of 100: station density 50%, fast chargers 25%, availability 25%.
pub fn infrastructure_score(ratio: &StationsRatio) -> f64 {
    let stations = ratio
        .stations_per_1000_evs
        .map(|s| (s / 10.0 * 100.0).min(100.0))
        .unwrap_or(0.0);
    let fast = ratio.fast_charger_ratio.unwrap_or(0.0) * 100.0;
    let availability = ratio.always_available_ratio.unwrap_or(0.0) * 100.0;
    stations * 0.5 + fast * 0.25 + availability * 0.25
}

/// Scores every ratio row, categories split at the 33rd and 67th percentile of all scores.
pub fn infrastructure_adequacy(ratios: &[StationsRatio]) -> Vec<InfrastructureAdequacy> {
    let scores: Vec<f64> = ratios.iter().map(infrastructure_score).collect();
    let cuts = quantile(&scores, 0.33).zip(quantile(&scores, 0.67));
    ratios
        .iter()
        .zip(scores.iter())
        .map(|(ratio, score)| {
            let adequacy_category = match cuts {
                Some((_, high)) if *score >= high => "Well-served",
                Some((low, _)) if *score >= low => "Strained",
                Some(_) => "Insufficient",
                None => "Unknown",
            };
            InfrastructureAdequacy {
                region: ratio.region.clone(),
                year: ratio.year,
                category: ratio.category.clone(),
                mode: ratio.mode.clone(),
                ev_stock: ratio.ev_stock,
                total_stations: ratio.total_stations,
                stations_per_1000_evs: ratio.stations_per_1000_evs,
                fast_charger_ratio: ratio.fast_charger_ratio,
                always_available_ratio: ratio.always_available_ratio,
                infrastructure_score: *score,
                adequacy_category,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketShare {
    pub region: String,
    pub year: i32,
    pub category: String,
    pub mode: String,
    pub bev_sales: Option<f64>,
    pub phev_sales: Option<f64>,
    pub bev_market_share_pct: Option<f64>,
    pub phev_market_share_pct: Option<f64>,
}

pub fn bev_phev_market_share(table: &AdoptionTable) -> Vec<MarketShare> {
    let mut out = vec![];
    for ((region, year, category, mode), rows) in bev_phev_groups(table) {
        let total: f64 = rows.iter().filter_map(|r| r.ev_sales).sum();
        let mut bev_sales = None;
        let mut phev_sales = None;
        for row in rows.iter() {
            match row.powertrain.as_str() {
                "BEV" => first(&mut bev_sales, row.ev_sales),
                _ => first(&mut phev_sales, row.ev_sales),
            }
        }
        if bev_sales.is_none() && phev_sales.is_none() {
            continue;
        }
        out.push(MarketShare {
            region: region.to_string(),
            year,
            category: category.to_string(),
            mode: mode.to_string(),
            bev_sales,
            phev_sales,
            bev_market_share_pct: bev_sales.and_then(|s| share_pct(s, total)),
            phev_market_share_pct: phev_sales.and_then(|s| share_pct(s, total)),
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalLeader {
    pub region: String,
    pub ev_stock: f64,
    pub ev_sales: f64,
    pub ev_sales_share: Option<f64>,
    pub total_stations: Option<f64>,
    #[serde(skip)]
    pub fast_charger_ratio: Option<f64>,
}

/// Car BEV+PHEV figures per region in `year`, aggregates included.
fn cars_by_region(table: &AdoptionTable, year: i32) -> Vec<RegionalLeader> {
    let mut map: BTreeMap<&str, RegionalLeader> = BTreeMap::new();
    for row in table
        .rows
        .iter()
        .filter(|r| r.year == year && r.mode == "Cars" && r.is_bev_or_phev())
    {
        let entry = map.entry(row.region.as_str()).or_insert_with(|| RegionalLeader {
            region: row.region.clone(),
            ev_stock: 0.0,
            ev_sales: 0.0,
            ev_sales_share: None,
            total_stations: None,
            fast_charger_ratio: None,
        });
        entry.ev_stock += row.ev_stock.unwrap_or(0.0);
        entry.ev_sales += row.ev_sales.unwrap_or(0.0);
        first(&mut entry.ev_sales_share, row.ev_sales_share);
        first(&mut entry.total_stations, row.total_stations);
        first(&mut entry.fast_charger_ratio, row.fast_charger_ratio);
    }
    map.into_values().collect()
}

/// The ten largest car EV fleets of the latest year.
pub fn regional_leaders(table: &AdoptionTable) -> Vec<RegionalLeader> {
    let year = match table.latest_year() {
        Some(year) => year,
        None => return vec![],
    };
    let mut leaders: Vec<RegionalLeader> = cars_by_region(table, year)
        .into_iter()
        .filter(|r| !is_aggregate_region(&r.region))
        .collect();
    leaders.sort_by(|a, b| b.ev_stock.total_cmp(&a.ev_stock));
    leaders.truncate(LEADERS);
    leaders
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetric {
    pub metric: String,
    pub value: String,
}

impl SummaryMetric {
    fn new(metric: &str, value: String) -> Self {
        SummaryMetric {
            metric: metric.to_string(),
            value,
        }
    }
}

fn percent(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(value) => format!("{:.*}%", decimals, value),
        None => String::from("N/A"),
    }
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}

/// Global headline values from the `World` car rows of the latest year, plus the
/// average world growth over 2021 to 2023.
pub fn dashboard_summary(table: &AdoptionTable, growth: &[GrowthRate]) -> Vec<SummaryMetric> {
    let world = table
        .latest_year()
        .and_then(|year| cars_by_region(table, year).into_iter().find(|r| r.region == "World"));
    if world.is_none() {
        warn!("adoption table has no World car rows for the latest year, global metrics are N/A");
    }
    let na = || String::from("N/A");

    let world_growth: Vec<&GrowthRate> = growth
        .iter()
        .filter(|g| g.region == "World" && g.mode == "Cars" && GROWTH_YEARS.contains(&g.year))
        .collect();
    let label = format!("({}-{})", GROWTH_YEARS[0], GROWTH_YEARS[GROWTH_YEARS.len() - 1]);

    vec![
        SummaryMetric::new(
            "Total EV Stock (Global)",
            world.as_ref().map(|w| format_thousands(w.ev_stock)).unwrap_or_else(na),
        ),
        SummaryMetric::new(
            "Total Charging Stations (Global)",
            world
                .as_ref()
                .and_then(|w| w.total_stations)
                .map(format_thousands)
                .unwrap_or_else(na),
        ),
        SummaryMetric::new(
            "EV Sales Share (Global)",
            percent(world.as_ref().and_then(|w| w.ev_sales_share), 2),
        ),
        SummaryMetric::new(
            "Fast Charger Ratio (Global)",
            percent(world.as_ref().and_then(|w| w.fast_charger_ratio).map(|r| r * 100.0), 1),
        ),
        SummaryMetric::new(
            &format!("Avg YoY EV Sales Growth {}", label),
            percent(mean(world_growth.iter().map(|g| g.ev_sales_yoy_growth)), 1),
        ),
        SummaryMetric::new(
            &format!("Avg YoY EV Stock Growth {}", label),
            percent(mean(world_growth.iter().map(|g| g.ev_stock_yoy_growth)), 1),
        ),
        SummaryMetric::new(
            &format!("Avg YoY Stations Growth {}", label),
            percent(mean(world_growth.iter().map(|g| g.total_stations_yoy_growth)), 1),
        ),
    ]
}
