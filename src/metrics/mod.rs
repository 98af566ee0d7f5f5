mod calculations;

pub use calculations::{
    bev_phev_market_share, dashboard_summary, infrastructure_adequacy, regional_leaders,
    stations_per_ev_ratio, yoy_growth_rates,
};

use crate::config::Config;
use crate::data::AdoptionTable;
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const OUTPUT_FILES: [&str; 6] = [
    "stations_per_ev_ratio.csv",
    "yoy_growth_rates.csv",
    "infrastructure_adequacy.csv",
    "bev_phev_market_share.csv",
    "regional_leaders.csv",
    "dashboard_summary.csv",
];

fn write_csv<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    let file = File::create(&path).map_err(|err| format!("{}: {}", path.display(), err))?;
    let mut wtr = csv::Writer::from_writer(BufWriter::new(file));
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    debug!("wrote {} rows to {}", rows.len(), path.display());
    Ok(path)
}

/// Derives every metric table from an already loaded adoption table into `dir`.
pub fn write_metrics(table: &AdoptionTable, dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let ratios = stations_per_ev_ratio(table);
    let growth = yoy_growth_rates(table);
    let adequacy = infrastructure_adequacy(&ratios);
    let shares = bev_phev_market_share(table);
    let leaders = regional_leaders(table);
    let summary = dashboard_summary(table, &growth);

    Ok(vec![
        write_csv(dir, OUTPUT_FILES[0], &ratios)?,
        write_csv(dir, OUTPUT_FILES[1], &growth)?,
        write_csv(dir, OUTPUT_FILES[2], &adequacy)?,
        write_csv(dir, OUTPUT_FILES[3], &shares)?,
        write_csv(dir, OUTPUT_FILES[4], &leaders)?,
        write_csv(dir, OUTPUT_FILES[5], &summary)?,
    ])
}

/// The `metrics` command.
pub fn run_metrics(config: &Config) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let started = Instant::now();
    let table = AdoptionTable::load(&config.adoption_file)?;
    info!(
        "loaded {} adoption rows from {} ({} skipped)",
        table.rows.len(),
        config.adoption_file,
        table.skipped_rows
    );
    let written = write_metrics(&table, Path::new(&config.metrics_dir))?;
    info!(
        "wrote {} metric files to {} in {}",
        written.len(),
        config.metrics_dir,
        humantime::format_duration(std::time::Duration::from_millis(started.elapsed().as_millis() as u64))
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_adoption;

    #[test]
    fn writes_every_metric_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("metrics");
        let written = write_metrics(&sample_adoption(), &out).unwrap();
        assert_eq!(written.len(), OUTPUT_FILES.len());
        for name in OUTPUT_FILES.iter() {
            assert!(out.join(name).is_file(), "{} missing", name);
        }

        let adequacy = fs::read_to_string(out.join("infrastructure_adequacy.csv")).unwrap();
        let header = adequacy.lines().next().unwrap();
        assert!(header.starts_with("region,year,category,mode,ev_stock,total_stations"));
        assert!(header.ends_with("infrastructure_score,adequacy_category"));
        assert_eq!(adequacy.lines().count(), 8);

        let leaders = fs::read_to_string(out.join("regional_leaders.csv")).unwrap();
        assert_eq!(
            leaders.lines().next().unwrap(),
            "region,ev_stock,ev_sales,ev_sales_share,total_stations"
        );

        let summary = fs::read_to_string(out.join("dashboard_summary.csv")).unwrap();
        assert!(summary.contains("Total EV Stock (Global),\"26,000,000\""));
    }

    #[test]
    fn missing_adoption_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = AdoptionTable::load(dir.path().join("none.csv").to_str().unwrap());
        assert!(table.is_err());
    }
}
