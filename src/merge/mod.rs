mod coordinates;
mod field_mapping;
mod merge_error;
mod merge_report;
mod sample;
mod source_table;

pub use field_mapping::FieldMapping;
pub use merge_error::MergeError;
pub use merge_report::MergeReport;
pub use merge_report::SourceReport;
pub use sample::draw_sample;
pub use source_table::SourceTable;

use crate::config::{read_field_mapping_file, read_translation_file, Config};
use crate::models::{normalize_country_code, ChargingStation, StationStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use coordinates::{check_coordinates, CoordinateCheck};
use field_mapping::ResolvedMapping;
use merge_report::SkipReason;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub fail_on_duplicates: bool,
}

/// Result of a merge, before anything is written.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub stations: Vec<ChargingStation>,
    /// Position of every source's rows inside `stations`.
    pub source_ranges: Vec<(String, Range<usize>)>,
    pub report: MergeReport,
}

struct StationRow {
    station: ChargingStation,
    coordinates: CoordinateCheck,
    unparsed_date: bool,
}

fn translate<'a>(translations: &'a HashMap<String, String>, value: &'a str) -> &'a str {
    translations.get(value).map(String::as_str).unwrap_or(value)
}

fn text(
    mapping: &ResolvedMapping,
    translations: &HashMap<String, String>,
    field: &str,
    record: &csv::StringRecord,
) -> String {
    mapping
        .value(field, record)
        .map(|v| translate(translations, v).to_string())
        .unwrap_or_default()
}

/// Integers and integral floats like `1234.0`, which spreadsheets like to produce.
fn parse_integer(value: &str) -> Option<i64> {
    if let Ok(v) = value.parse::<i64>() {
        return Some(v);
    }
    let v: f64 = value.parse().ok()?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        Some(v as i64)
    } else {
        None
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return d.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
        }
    }
    None
}

fn split_connector_types(value: &str, translations: &HashMap<String, String>) -> Vec<String> {
    let mut list: Vec<String> = vec![];
    for part in value.split(|c| c == ';' || c == ',' || c == '|') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let part = translate(translations, part).to_string();
        if !list.contains(&part) {
            list.push(part);
        }
    }
    list
}

fn build_station(
    mapping: &ResolvedMapping,
    translations: &HashMap<String, String>,
    record: &csv::StringRecord,
    id_offset: i64,
) -> Result<StationRow, SkipReason> {
    let id = mapping
        .value("id", record)
        .and_then(parse_integer)
        .and_then(|id| id.checked_add(id_offset))
        .ok_or(SkipReason::Id)?;

    let country_code = mapping
        .value("country_code", record)
        .map(|v| translate(translations, v))
        .and_then(normalize_country_code)
        .ok_or(SkipReason::CountryCode)?;

    let num_connectors = match mapping.value("num_connectors", record) {
        None => 0,
        Some(value) => parse_integer(value)
            .and_then(|v| u32::try_from(v).ok())
            .ok_or(SkipReason::ConnectorCount)?,
    };

    let coordinates = check_coordinates(mapping.value("lat", record), mapping.value("lon", record));
    let (lat, lon) = coordinates.lat_lon();

    let (date_added, unparsed_date) = match mapping.value("date_added", record) {
        None => (None, false),
        Some(value) => match parse_date(value) {
            Some(date) => (Some(date), false),
            None => {
                trace!("unparsed date '{}' for id {}", value, id);
                (None, true)
            }
        },
    };

    let mut operator = text(mapping, translations, "operator", record);
    if operator.is_empty() {
        operator = String::from("Unknown");
    }
    let status = StationStatus::from_source(&text(mapping, translations, "status", record));
    let connector_types = mapping
        .value("connector_types", record)
        .map(|v| split_connector_types(v, translations))
        .unwrap_or_default();

    Ok(StationRow {
        station: ChargingStation {
            id,
            title: text(mapping, translations, "title", record),
            address: text(mapping, translations, "address", record),
            town: text(mapping, translations, "town", record),
            state: text(mapping, translations, "state", record),
            postcode: mapping.value("postcode", record).unwrap_or("").to_string(),
            country_code,
            lat,
            lon,
            operator,
            status,
            num_connectors,
            connector_types,
            date_added,
        },
        coordinates,
        unparsed_date,
    })
}

/// Merges source tables into the canonical schema. Sources are processed in order and
/// the first occurrence of an id wins; later occurrences are counted, never written.
pub fn merge_tables(
    tables: &[SourceTable],
    mapping: &FieldMapping,
    translations: &HashMap<String, String>,
    options: &MergeOptions,
) -> Result<MergeOutcome, MergeError> {
    if tables.is_empty() {
        return Err(MergeError::NoSources);
    }
    // resolve everything first, a bad mapping must fail before any row is looked at
    let resolved: Vec<ResolvedMapping> = tables
        .iter()
        .map(|t| mapping.resolve(t))
        .collect::<Result<_, _>>()?;

    let mut seen: HashSet<i64> = HashSet::new();
    let mut stations: Vec<ChargingStation> = vec![];
    let mut source_ranges = vec![];
    let mut reports = vec![];
    let mut duplicate_ids = vec![];

    for (table, resolved) in tables.iter().zip(resolved.iter()) {
        debug!("{}: {} fields mapped", table.name, resolved.field_count());
        let mut report = SourceReport::new(&table.name, table.rows_read());
        report.skip(SkipReason::FieldCount, table.unreadable_rows);
        let start = stations.len();

        for record in table.rows.iter() {
            let row = match build_station(resolved, translations, record, table.id_offset) {
                Ok(row) => row,
                Err(reason) => {
                    trace!("{}: skipping row {:?}: {}", table.name, record, reason.key());
                    report.skip(reason, 1);
                    continue;
                }
            };
            report.valid += 1;
            if !seen.insert(row.station.id) {
                report.duplicates += 1;
                duplicate_ids.push(row.station.id);
                continue;
            }
            report.coordinates.add(&row.coordinates);
            if row.unparsed_date {
                report.unparsed_dates += 1;
            }
            stations.push(row.station);
        }

        report.output_rows = stations.len() - start;
        source_ranges.push((table.name.clone(), start..stations.len()));
        reports.push(report);
    }

    if options.fail_on_duplicates && !duplicate_ids.is_empty() {
        let count = duplicate_ids.len();
        duplicate_ids.truncate(merge_report::MAX_LISTED_DUPLICATES);
        return Err(MergeError::DuplicateIds(count, duplicate_ids));
    }

    Ok(MergeOutcome {
        stations,
        source_ranges,
        report: MergeReport::from_sources(reports, duplicate_ids),
    })
}

/// Writes stations in canonical column order. An empty list still gets a header.
pub fn write_stations<W: Write>(stations: &[ChargingStation], writer: W) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(writer);
    if stations.is_empty() {
        wtr.write_record(ChargingStation::COLUMNS)?;
    }
    for station in stations {
        wtr.serialize(station)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_stations_file(stations: &[ChargingStation], path: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path).map_err(|err| format!("{}: {}", path, err))?;
    write_stations(stations, BufWriter::new(file))
}

fn read_sources(config: &Config) -> Result<Vec<SourceTable>, Box<dyn Error>> {
    let mut tables = vec![];
    for source in config.sources.iter() {
        info!("reading source '{}' from {}", source.name, source.path);
        let file = File::open(&source.path).map_err(|err| format!("{}: {}", source.path, err))?;
        tables.push(SourceTable::from_reader(
            &source.name,
            source.id_offset,
            source.delimiter,
            file,
        )?);
    }
    Ok(tables)
}

/// The `merge` command: reads every configured source and writes the merged file,
/// one verification sample per source and the data quality report.
pub fn run_merge(config: &Config) -> Result<MergeReport, Box<dyn Error>> {
    let started = Instant::now();
    if config.sources.is_empty() {
        return Err(Box::new(MergeError::NoSources));
    }
    let mapping = FieldMapping::new(read_field_mapping_file(&config.field_mapping_filepath)?)?;
    let translations = read_translation_file(&config.translations_filepath)?;
    info!("loaded {} translations", translations.len());

    let tables = read_sources(config)?;
    let options = MergeOptions {
        fail_on_duplicates: config.fail_on_duplicates,
    };
    let outcome = merge_tables(&tables, &mapping, &translations, &options)?;

    debug_assert_eq!(outcome.report.coordinates.total(), outcome.report.output_rows);
    write_stations_file(&outcome.stations, &config.merged_file)?;
    info!("wrote {} stations to {}", outcome.stations.len(), config.merged_file);

    for (name, range) in outcome.source_ranges.iter() {
        let picked = sample::draw_sample(
            &outcome.stations[range.clone()],
            config.sample_size,
            sample::source_seed(config.sample_seed, name),
        );
        let path = format!("{}/{}_sample.csv", config.samples_dir, name);
        write_stations_file(&picked, &path)?;
        debug!("wrote sample of {} rows to {}", picked.len(), path);
    }

    outcome.report.save(&config.report_file)?;
    outcome.report.log_summary();
    info!(
        "merge finished in {}",
        humantime::format_duration(std::time::Duration::from_millis(started.elapsed().as_millis() as u64))
    );
    Ok(outcome.report)
}
