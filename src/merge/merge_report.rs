use super::coordinates::CoordinateCounts;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Number of duplicate ids listed in the report.
pub const MAX_LISTED_DUPLICATES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkipReason {
    FieldCount,
    Id,
    CountryCode,
    ConnectorCount,
}

impl SkipReason {
    pub fn key(&self) -> &'static str {
        match self {
            SkipReason::FieldCount => "field_count",
            SkipReason::Id => "id",
            SkipReason::CountryCode => "country_code",
            SkipReason::ConnectorCount => "num_connectors",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub name: String,
    pub rows_read: usize,
    /// Rows that passed validation, duplicates included.
    pub valid: usize,
    pub malformed: BTreeMap<String, usize>,
    pub duplicates: usize,
    pub coordinates: CoordinateCounts,
    pub unparsed_dates: usize,
    pub output_rows: usize,
}

impl SourceReport {
    pub fn new(name: &str, rows_read: usize) -> Self {
        SourceReport {
            name: name.to_string(),
            rows_read,
            ..Default::default()
        }
    }

    pub fn skip(&mut self, reason: SkipReason, count: usize) {
        if count > 0 {
            *self.malformed.entry(reason.key().to_string()).or_insert(0) += count;
        }
    }

    pub fn malformed_total(&self) -> usize {
        self.malformed.values().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeReport {
    pub sources: Vec<SourceReport>,
    pub rows_read: usize,
    pub valid: usize,
    pub malformed: usize,
    pub duplicates: usize,
    pub duplicate_ids: Vec<i64>,
    pub coordinates: CoordinateCounts,
    pub unparsed_dates: usize,
    pub output_rows: usize,
}

impl MergeReport {
    pub fn from_sources(sources: Vec<SourceReport>, duplicate_ids: Vec<i64>) -> Self {
        let mut report = MergeReport {
            duplicate_ids: duplicate_ids.into_iter().take(MAX_LISTED_DUPLICATES).collect(),
            ..Default::default()
        };
        for source in sources.iter() {
            report.rows_read += source.rows_read;
            report.valid += source.valid;
            report.malformed += source.malformed_total();
            report.duplicates += source.duplicates;
            report.coordinates.merge(&source.coordinates);
            report.unparsed_dates += source.unparsed_dates;
            report.output_rows += source.output_rows;
        }
        report.sources = sources;
        report
    }

    pub fn save(&self, path: &str) -> Result<(), Box<dyn Error>> {
        if let Some(parent) = Path::new(path).parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        fs::write(path, out)?;
        Ok(())
    }

    pub fn load(path: &str) -> Result<MergeReport, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn log_summary(&self) {
        for source in self.sources.iter() {
            info!(
                "{}: {} rows read, {} valid, {} malformed {:?}, {} duplicates, coordinates {} valid / {} invalid / {} missing, {} unparsed dates",
                source.name,
                source.rows_read,
                source.valid,
                source.malformed_total(),
                source.malformed,
                source.duplicates,
                source.coordinates.valid,
                source.coordinates.invalid,
                source.coordinates.missing,
                source.unparsed_dates
            );
        }
        info!(
            "merged {} rows from {} sources ({} malformed, {} duplicates)",
            self.output_rows,
            self.sources.len(),
            self.malformed,
            self.duplicates
        );
        if !self.duplicate_ids.is_empty() {
            warn!("duplicate ids excluded from output: {:?}", self.duplicate_ids);
        }
    }
}
