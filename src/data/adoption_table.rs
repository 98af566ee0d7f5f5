use super::DataError;
use crate::models::{is_aggregate_region, AdoptionRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;

/// EV stock and infrastructure per region and year, summed over all rows with a stock value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionYear {
    pub region: String,
    pub year: i32,
    pub total_ev_stock: f64,
    pub total_stations: Option<f64>,
    pub stations_per_million_evs: Option<f64>,
    pub stations_per_ev: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowertrainTotal {
    pub region: String,
    pub year: i32,
    pub powertrain: String,
    pub ev_stock: f64,
    pub ev_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfrastructureRow {
    pub region: String,
    pub ev_charging_points: f64,
    pub total_stations: Option<f64>,
    pub ev_stock: f64,
    pub evs_per_charging_point: Option<f64>,
    pub category: &'static str,
}

pub const POWERTRAINS: [&str; 3] = ["BEV", "PHEV", "FCEV"];

pub fn infrastructure_category(evs_per_charging_point: Option<f64>) -> &'static str {
    match evs_per_charging_point {
        None => "No Data",
        Some(r) if r <= 50.0 => "Well Served (≤50 EVs/station)",
        Some(r) if r <= 100.0 => "Adequate (51-100 EVs/station)",
        Some(r) if r <= 200.0 => "Strained (101-200 EVs/station)",
        Some(_) => "Insufficient (>200 EVs/station)",
    }
}

/// Keeps the first value that is present, like a group-by "first".
fn first(slot: &mut Option<f64>, value: Option<f64>) {
    if slot.is_none() {
        *slot = value;
    }
}

/// The pre-processed adoption table. Only `region` and `year` are guaranteed,
/// charts check the other columns they need through `missing_columns`.
/// Rows without a region or a whole-number year are skipped and counted.
#[derive(Debug, Clone, Default)]
pub struct AdoptionTable {
    pub columns: BTreeSet<String>,
    pub rows: Vec<AdoptionRecord>,
    pub skipped_rows: usize,
}

impl AdoptionTable {
    pub fn load(path: &str) -> Result<AdoptionTable, DataError> {
        let file = File::open(path).map_err(|err| DataError::Io(path.to_string(), err))?;
        AdoptionTable::from_reader(path, file)
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<AdoptionTable, DataError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let columns: BTreeSet<String> = rdr
            .headers()
            .map_err(|err| DataError::Csv(name.to_string(), err))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let table = AdoptionTable {
            columns,
            rows: vec![],
            skipped_rows: 0,
        };
        let missing = table.missing_columns(&AdoptionRecord::REQUIRED_COLUMNS);
        if !missing.is_empty() {
            return Err(DataError::MissingColumns(name.to_string(), missing));
        }
        let mut rows = vec![];
        let mut skipped_rows = 0;
        for result in rdr.deserialize::<AdoptionRecord>() {
            match result {
                Ok(row) if !row.region.trim().is_empty() => rows.push(row),
                Ok(row) => {
                    debug!("{}: skipping row without region for {}", name, row.year);
                    skipped_rows += 1;
                }
                Err(err) => {
                    if let csv::ErrorKind::Io(_) = err.kind() {
                        return Err(DataError::Csv(name.to_string(), err));
                    }
                    debug!("{}: skipping row: {}", name, err);
                    skipped_rows += 1;
                }
            }
        }
        if skipped_rows > 0 {
            warn!("{}: skipped {} malformed rows", name, skipped_rows);
        }
        debug!("loaded {} adoption rows from {}", rows.len(), name);
        Ok(AdoptionTable {
            rows,
            skipped_rows,
            ..table
        })
    }

    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.columns.contains(**c))
            .map(|c| c.to_string())
            .collect()
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        let min = self.rows.iter().map(|r| r.year).min()?;
        let max = self.rows.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.year_range().map(|(_, max)| max)
    }

    pub fn available_regions(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .rows
            .iter()
            .map(|r| r.region.as_str())
            .filter(|r| !r.is_empty())
            .collect();
        set.into_iter().map(String::from).collect()
    }

    pub fn ev_stock_by_region_year(&self) -> Vec<RegionYear> {
        let mut map: BTreeMap<(&str, i32), RegionYear> = BTreeMap::new();
        for row in self.rows.iter() {
            let stock = match row.ev_stock {
                Some(stock) => stock,
                None => continue,
            };
            let entry = map.entry((row.region.as_str(), row.year)).or_insert_with(|| RegionYear {
                region: row.region.clone(),
                year: row.year,
                total_ev_stock: 0.0,
                total_stations: None,
                stations_per_million_evs: None,
                stations_per_ev: None,
            });
            entry.total_ev_stock += stock;
            first(&mut entry.total_stations, row.total_stations);
            first(&mut entry.stations_per_million_evs, row.stations_per_million_evs);
        }
        map.into_values()
            .map(|mut r| {
                r.stations_per_ev = match r.total_stations {
                    Some(stations) if r.total_ev_stock > 0.0 => Some(stations / r.total_ev_stock),
                    Some(_) => Some(0.0),
                    None => None,
                };
                r
            })
            .collect()
    }

    /// Largest regions by EV stock in `year` (default latest), aggregates excluded.
    pub fn top_regions(&self, n: usize, year: Option<i32>) -> Vec<String> {
        let year = match year.or_else(|| self.latest_year()) {
            Some(year) => year,
            None => return vec![],
        };
        let mut rows: Vec<RegionYear> = self
            .ev_stock_by_region_year()
            .into_iter()
            .filter(|r| r.year == year && !is_aggregate_region(&r.region))
            .collect();
        rows.sort_by(|a, b| b.total_ev_stock.total_cmp(&a.total_ev_stock));
        rows.into_iter().take(n).map(|r| r.region).collect()
    }

    /// Stock and sales per region, year and powertrain for BEV, PHEV and FCEV.
    pub fn powertrain_totals(&self) -> Vec<PowertrainTotal> {
        let mut map: BTreeMap<(&str, i32, &str), PowertrainTotal> = BTreeMap::new();
        for row in self.rows.iter() {
            if !POWERTRAINS.contains(&row.powertrain.as_str()) {
                continue;
            }
            if row.ev_stock.is_none() && row.ev_sales.is_none() {
                continue;
            }
            let entry = map
                .entry((row.region.as_str(), row.year, row.powertrain.as_str()))
                .or_insert_with(|| PowertrainTotal {
                    region: row.region.clone(),
                    year: row.year,
                    powertrain: row.powertrain.clone(),
                    ev_stock: 0.0,
                    ev_sales: 0.0,
                });
            entry.ev_stock += row.ev_stock.unwrap_or(0.0);
            entry.ev_sales += row.ev_sales.unwrap_or(0.0);
        }
        map.into_values().collect()
    }

    /// EVs per charging point per region in `year` (default latest).
    pub fn infrastructure_summary(&self, year: Option<i32>) -> Vec<InfrastructureRow> {
        let year = match year.or_else(|| self.latest_year()) {
            Some(year) => year,
            None => return vec![],
        };
        let mut map: BTreeMap<&str, InfrastructureRow> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| r.year == year) {
            let entry = map.entry(row.region.as_str()).or_insert_with(|| InfrastructureRow {
                region: row.region.clone(),
                ev_charging_points: 0.0,
                total_stations: None,
                ev_stock: 0.0,
                evs_per_charging_point: None,
                category: "",
            });
            entry.ev_charging_points += row.ev_charging_points.unwrap_or(0.0);
            entry.ev_stock += row.ev_stock.unwrap_or(0.0);
            first(&mut entry.total_stations, row.total_stations);
        }
        map.into_values()
            .map(|mut r| {
                if r.ev_charging_points > 0.0 {
                    r.evs_per_charging_point = Some(r.ev_stock / r.ev_charging_points);
                }
                r.category = infrastructure_category(r.evs_per_charging_point);
                r
            })
            .collect()
    }
}
