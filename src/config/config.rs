use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Merge,
    Metrics,
    Serve,
    All,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Command> {
        match name {
            "merge" => Some(Command::Merge),
            "metrics" => Some(Command::Metrics),
            "serve" => Some(Command::Serve),
            "all" => Some(Command::All),
            _ => None,
        }
    }

    pub fn runs_merge(&self) -> bool {
        matches!(self, Command::Merge | Command::All)
    }

    pub fn runs_metrics(&self) -> bool {
        matches!(self, Command::Metrics | Command::All)
    }

    pub fn runs_server(&self) -> bool {
        matches!(self, Command::Serve | Command::All)
    }
}

/// One station list that takes part in the merge.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    pub path: String,
    pub delimiter: u8,
    pub id_offset: i64,
}

impl SourceConfig {
    pub fn new(name: &str, path: &str) -> Self {
        SourceConfig {
            name: name.to_string(),
            path: path.to_string(),
            delimiter: b',',
            id_offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub command: Command,
    pub config_file_loaded: bool,
    pub log_dir: String,
    pub log_level: usize,
    pub listen_host: String,
    pub listen_port: i32,
    pub threads: usize,
    pub static_files_dir: String,
    pub merged_file: String,
    pub report_file: String,
    pub samples_dir: String,
    pub sample_size: usize,
    pub sample_seed: u64,
    pub field_mapping_filepath: String,
    pub translations_filepath: String,
    pub fail_on_duplicates: bool,
    pub adoption_file: String,
    pub metrics_dir: String,
    pub map_markers: usize,
    pub prometheus_exporter: bool,
    pub prometheus_exporter_prefix: String,
    pub slow_request_warning: Duration,
    pub sources: Vec<SourceConfig>,
}
