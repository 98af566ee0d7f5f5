use super::data::{ApiChart, ApiRegion};
use crate::config::Config;
use crate::data::{kpi_cards, summary_stats, AdoptionTable, StationTable};
use crate::merge::MergeReport;
use handlebars::{to_json, Handlebars};
use serde_json::value::Map;
use std::error::Error;
use std::path::Path;

pub const DASHBOARD_TEMPLATE: &str = "dashboard.hbs";

/// Everything the server reads. Loaded once at start and never changed afterwards.
pub struct DashboardState {
    pub stations: StationTable,
    pub adoption: AdoptionTable,
    pub report: Option<MergeReport>,
    pub map_markers: usize,
    templates: Handlebars<'static>,
}

impl DashboardState {
    pub fn new(stations: StationTable, adoption: AdoptionTable, report: Option<MergeReport>, map_markers: usize) -> Self {
        DashboardState {
            stations,
            adoption,
            report,
            map_markers,
            templates: Handlebars::new(),
        }
    }

    /// Reads the merged file, the adoption table, the merge report and the page template.
    /// A missing adoption file or report leaves those parts empty, a broken one is an error.
    pub fn load(config: &Config) -> Result<DashboardState, Box<dyn Error>> {
        let stations = StationTable::load(&config.merged_file)?;
        info!("loaded {} stations from {}", stations.len(), config.merged_file);

        let adoption = if Path::new(&config.adoption_file).exists() {
            let adoption = AdoptionTable::load(&config.adoption_file)?;
            info!(
                "loaded {} adoption rows for {} regions from {} ({} skipped)",
                adoption.rows.len(),
                adoption.available_regions().len(),
                config.adoption_file,
                adoption.skipped_rows
            );
            adoption
        } else {
            warn!(
                "adoption file {} not found, adoption charts are unavailable",
                config.adoption_file
            );
            AdoptionTable::default()
        };

        let report = if Path::new(&config.report_file).exists() {
            Some(MergeReport::load(&config.report_file)?)
        } else {
            warn!("no merge report at {}", config.report_file);
            None
        };

        let mut state = DashboardState::new(stations, adoption, report, config.map_markers);
        state.register_templates(&config.static_files_dir)?;
        Ok(state)
    }

    pub fn register_templates(&mut self, static_dir: &str) -> Result<(), Box<dyn Error>> {
        let path = format!("{}/{}", static_dir, DASHBOARD_TEMPLATE);
        self.templates
            .register_template_file(DASHBOARD_TEMPLATE, &path)
            .map_err(|err| format!("unable to register template file {}: {}", path, err))?;
        Ok(())
    }

    pub fn render_dashboard(&self) -> Result<String, Box<dyn Error>> {
        let mut data = Map::new();
        data.insert(String::from("charts"), to_json(ApiChart::all()));
        data.insert(String::from("regions"), to_json(ApiRegion::list(&self.adoption)));
        data.insert(String::from("default_regions"), to_json(self.adoption.top_regions(5, None)));
        if let Some((first, last)) = self.adoption.year_range() {
            data.insert(String::from("first_year"), to_json(first));
            data.insert(String::from("last_year"), to_json(last));
        }
        if let Some(stats) = summary_stats(&self.adoption, None) {
            data.insert(String::from("kpis"), to_json(kpi_cards(&stats)));
        }
        data.insert(String::from("station_count"), to_json(self.stations.len()));
        data.insert(String::from("report"), to_json(&self.report));
        Ok(self.templates.render(DASHBOARD_TEMPLATE, &data)?)
    }
}
