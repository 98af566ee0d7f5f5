mod config;
mod config_error;
mod data_mapping_item;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};
use std::error::Error;
use std::fs;
use std::time::Duration;

pub use config::Command;
pub use config::Config;
pub use config::SourceConfig;
pub use config_error::ConfigError;
pub use data_mapping_item::read_field_mapping_file;
pub use data_mapping_item::read_translation_file;
pub use data_mapping_item::FieldMappingItem;

#[cfg(test)]
pub use data_mapping_item::read_field_mapping_reader;
#[cfg(test)]
pub use data_mapping_item::read_translation_reader;

fn get_option_string(
    matches: &ArgMatches,
    config: &toml::Value,
    setting_name: &str,
    default_value: String,
) -> Result<String, Box<dyn Error>> {
    let value_from_clap = matches.get_one::<String>(setting_name);
    if let Some(value_from_clap) = value_from_clap {
        return Ok(value_from_clap.to_string());
    }

    let setting = config.get(setting_name);
    if let Some(setting) = setting {
        if let Some(setting_decoded) = setting.as_str() {
            return Ok(String::from(setting_decoded));
        } else {
            return Err(Box::new(ConfigError::TypeError(setting_name.into(), setting.to_string())));
        }
    }

    Ok(default_value)
}

fn get_option_duration(
    matches: &ArgMatches,
    config: &toml::Value,
    setting_name: &str,
    default_value: String,
) -> Result<Duration, Box<dyn Error>> {
    let s = get_option_string(matches, config, setting_name, default_value)?;
    Ok(s.parse::<humantime::Duration>()?.into())
}

fn get_option_number(
    matches: &ArgMatches,
    config: &toml::Value,
    setting_name: &str,
    default_value: i64,
) -> Result<i64, Box<dyn Error>> {
    let value_from_clap = matches.get_one::<String>(setting_name);
    if let Some(value_from_clap) = value_from_clap {
        return Ok(value_from_clap.parse()?);
    }

    let setting = config.get(setting_name);
    if let Some(setting) = setting {
        if let Some(setting_decoded) = setting.as_integer() {
            return Ok(setting_decoded);
        } else {
            return Err(Box::new(ConfigError::TypeError(setting_name.into(), setting.to_string())));
        }
    }

    Ok(default_value)
}

/// A number that has to fit into `T`, like a port, a count or an unsigned seed.
fn get_option_number_as<T: TryFrom<i64>>(
    matches: &ArgMatches,
    config: &toml::Value,
    setting_name: &str,
    default_value: i64,
) -> Result<T, Box<dyn Error>> {
    let value = get_option_number(matches, config, setting_name, default_value)?;
    match T::try_from(value) {
        Ok(value) => Ok(value),
        Err(_) => Err(Box::new(ConfigError::TypeError(setting_name.into(), value.to_string()))),
    }
}

fn get_option_number_occurences(
    matches: &ArgMatches,
    config: &toml::Value,
    setting_name: &str,
    default_value: usize,
) -> Result<usize, Box<dyn Error>> {
    let value_from_clap = matches.get_count(setting_name) as usize;
    if value_from_clap > 0 {
        return Ok(value_from_clap);
    }

    let setting = config.get(setting_name);
    if let Some(setting) = setting {
        if let Some(setting_decoded) = setting.as_integer().and_then(|v| usize::try_from(v).ok()) {
            return Ok(setting_decoded);
        } else {
            return Err(Box::new(ConfigError::TypeError(setting_name.into(), setting.to_string())));
        }
    }

    Ok(default_value)
}

fn get_option_bool(
    matches: &ArgMatches,
    config: &toml::Value,
    setting_name: &str,
    default_value: bool,
) -> Result<bool, Box<dyn Error>> {
    let value_from_clap = matches.get_one::<String>(setting_name);
    if let Some(value_from_clap) = value_from_clap {
        return Ok(value_from_clap.parse()?);
    }

    let setting = config.get(setting_name);
    if let Some(setting) = setting {
        if let Some(setting_decoded) = setting.as_bool() {
            return Ok(setting_decoded);
        } else {
            return Err(Box::new(ConfigError::TypeError(setting_name.into(), setting.to_string())));
        }
    }

    Ok(default_value)
}

fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    match value {
        "\\t" | "tab" => Ok(b'\t'),
        _ if value.len() == 1 && value.is_ascii() => Ok(value.as_bytes()[0]),
        _ => Err(ConfigError::TypeError("delimiter".into(), value.to_string())),
    }
}

fn parse_source_arg(value: &str) -> Result<SourceConfig, ConfigError> {
    let mut parts = value.splitn(2, '=');
    let name = parts.next().unwrap_or("").trim();
    let path = parts.next().unwrap_or("").trim();
    if name.is_empty() || path.is_empty() {
        return Err(ConfigError::InvalidSource(value.to_string()));
    }
    Ok(SourceConfig::new(name, path))
}

/// Reads `[[source]]` tables with `name`, `path`, optional `delimiter` and `id-offset`.
fn get_sources_from_config(config: &toml::Value) -> Result<Vec<SourceConfig>, Box<dyn Error>> {
    let mut list = vec![];
    let setting = config.get("source");
    if let Some(setting) = setting {
        let entries = setting
            .as_array()
            .ok_or_else(|| ConfigError::TypeError("source".into(), setting.to_string()))?;
        for entry in entries {
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ConfigError::TypeError("source.name".into(), entry.to_string()))?;
            let path = entry
                .get("path")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ConfigError::TypeError("source.path".into(), entry.to_string()))?;
            let mut source = SourceConfig::new(name, path);
            if let Some(delimiter) = entry.get("delimiter") {
                let delimiter = delimiter
                    .as_str()
                    .ok_or_else(|| ConfigError::TypeError("source.delimiter".into(), delimiter.to_string()))?;
                source.delimiter = parse_delimiter(delimiter)?;
            }
            if let Some(id_offset) = entry.get("id-offset") {
                source.id_offset = id_offset
                    .as_integer()
                    .ok_or_else(|| ConfigError::TypeError("source.id-offset".into(), id_offset.to_string()))?;
            }
            list.push(source);
        }
    }
    Ok(list)
}

fn build_cli() -> ClapCommand {
    ClapCommand::new("ev-dashboard")
        .version(crate_version!())
        .about("Merges EV charging station lists and serves the EV adoption dashboard")
        .arg(
            Arg::new("command")
                .value_name("COMMAND")
                .help("merge, metrics, serve or all")
                .value_parser(["merge", "metrics", "serve", "all"])
                .default_value("serve"),
        )
        .arg(
            Arg::new("config-file")
                .short('f')
                .long("config-file")
                .value_name("CONFIG-FILE")
                .help("Path to config file")
                .env("CONFIG_FILE")
                .default_value("./etc/ev-dashboard.toml"),
        )
        .arg(
            Arg::new("log-dir")
                .short('l')
                .long("log-dir")
                .value_name("LOG-DIR")
                .help("Path to log dir")
                .env("LOG_DIR"),
        )
        .arg(
            Arg::new("log-level")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("increases the log level. can be specified mutliple times 0..3"),
        )
        .arg(
            Arg::new("listen-host")
                .long("host")
                .value_name("HOST")
                .help("listening host ip")
                .env("HOST"),
        )
        .arg(
            Arg::new("listen-port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("listening port")
                .env("PORT"),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .value_name("THREADS")
                .help("concurrent threads used by socket")
                .env("THREADS"),
        )
        .arg(
            Arg::new("static-files-dir")
                .short('g')
                .long("static-files-dir")
                .value_name("STATIC_FILES_DIR")
                .help("directory that contains the dashboard template and static files")
                .env("STATIC_FILES_DIR"),
        )
        .arg(
            Arg::new("merged-file")
                .short('o')
                .long("merged-file")
                .value_name("MERGED_FILE")
                .help("merged charging station csv, written by merge and read by serve")
                .env("MERGED_FILE"),
        )
        .arg(
            Arg::new("report-file")
                .long("report-file")
                .value_name("REPORT_FILE")
                .help("data quality report of the last merge")
                .env("REPORT_FILE"),
        )
        .arg(
            Arg::new("samples-dir")
                .long("samples-dir")
                .value_name("SAMPLES_DIR")
                .help("directory for the verification samples, one per source")
                .env("SAMPLES_DIR"),
        )
        .arg(
            Arg::new("sample-size")
                .long("sample-size")
                .value_name("SAMPLE_SIZE")
                .help("rows per verification sample")
                .env("SAMPLE_SIZE"),
        )
        .arg(
            Arg::new("sample-seed")
                .long("sample-seed")
                .value_name("SAMPLE_SEED")
                .help("seed for sample selection")
                .env("SAMPLE_SEED"),
        )
        .arg(
            Arg::new("field-mapping-file")
                .short('m')
                .long("field-mapping-file")
                .value_name("FIELD_MAPPING_FILE")
                .help("source column to canonical field mapping, path or url")
                .env("FIELD_MAPPING_FILE"),
        )
        .arg(
            Arg::new("translations-file")
                .long("translations-file")
                .value_name("TRANSLATIONS_FILE")
                .help("value translation table, path or url")
                .env("TRANSLATIONS_FILE"),
        )
        .arg(
            Arg::new("fail-on-duplicates")
                .long("fail-on-duplicates")
                .value_name("FAIL_ON_DUPLICATES")
                .help("abort the merge if duplicate ids are found")
                .env("FAIL_ON_DUPLICATES"),
        )
        .arg(
            Arg::new("adoption-file")
                .short('a')
                .long("adoption-file")
                .value_name("ADOPTION_FILE")
                .help("pre-processed EV adoption csv")
                .env("ADOPTION_FILE"),
        )
        .arg(
            Arg::new("metrics-dir")
                .long("metrics-dir")
                .value_name("METRICS_DIR")
                .help("output directory of the metrics command")
                .env("METRICS_DIR"),
        )
        .arg(
            Arg::new("map-markers")
                .long("map-markers")
                .value_name("MAP_MARKERS")
                .help("max stations drawn on the station map")
                .env("MAP_MARKERS"),
        )
        .arg(
            Arg::new("prometheus-exporter")
                .short('e')
                .long("prometheus-exporter")
                .value_name("PROMETHEUS_EXPORTER")
                .help("export statistics through a prometheus compatible exporter"),
        )
        .arg(
            Arg::new("prometheus-exporter-prefix")
                .long("prometheus-exporter-prefix")
                .value_name("PROMETHEUS_EXPORTER_PREFIX")
                .help("prefix for all exported values on /metrics"),
        )
        .arg(
            Arg::new("slow-request-warning")
                .long("slow-request-warning")
                .value_name("SLOW_REQUEST_WARNING")
                .help("log a warning for requests slower than this")
                .env("SLOW_REQUEST_WARNING"),
        )
        .arg(
            Arg::new("source")
                .short('s')
                .long("source")
                .value_name("NAME=PATH")
                .help("station list to merge, can be given multiple times")
                .action(ArgAction::Append),
        )
}

pub fn load_config() -> Result<Config, Box<dyn Error>> {
    let matches = build_cli().get_matches();
    load_config_from_matches(&matches)
}

fn load_config_from_matches(matches: &ArgMatches) -> Result<Config, Box<dyn Error>> {
    let command_name = matches
        .get_one::<String>("command")
        .map(String::as_str)
        .unwrap_or("serve");
    let command = Command::from_name(command_name)
        .ok_or_else(|| ConfigError::TypeError("command".into(), command_name.to_string()))?;

    let config_file_path: String = matches
        .get_one::<String>("config-file")
        .cloned()
        .unwrap_or_else(|| String::from("./etc/ev-dashboard.toml"));

    let (config, config_file_loaded) = match fs::read_to_string(&config_file_path) {
        Ok(contents) => (toml::from_str::<toml::Value>(&contents)?, true),
        Err(_) => (toml::Value::Table(toml::Table::new()), false),
    };

    let log_dir: String = get_option_string(matches, &config, "log-dir", String::from("."))?;
    let log_level: usize = get_option_number_occurences(matches, &config, "log-level", 0)?;
    let listen_host: String =
        get_option_string(matches, &config, "listen-host", String::from("127.0.0.1"))?;
    let listen_port: i32 = get_option_number_as(matches, &config, "listen-port", 8050)?;
    let threads: usize = get_option_number_as(matches, &config, "threads", 1)?;
    let static_files_dir: String =
        get_option_string(matches, &config, "static-files-dir", String::from("./static/"))?;
    let merged_file: String = get_option_string(
        matches,
        &config,
        "merged-file",
        String::from("data/processed/ev_stations_merged_global.csv"),
    )?;
    let report_file: String = get_option_string(
        matches,
        &config,
        "report-file",
        String::from("data/processed/merge_report.json"),
    )?;
    let samples_dir: String =
        get_option_string(matches, &config, "samples-dir", String::from("data/processed/samples"))?;
    let sample_size: usize = get_option_number_as(matches, &config, "sample-size", 10)?;
    let sample_seed: u64 = get_option_number_as(matches, &config, "sample-seed", 42)?;
    let field_mapping_filepath: String = get_option_string(
        matches,
        &config,
        "field-mapping-file",
        String::from("./etc/field-mapping.csv"),
    )?;
    let translations_filepath: String = get_option_string(
        matches,
        &config,
        "translations-file",
        String::from("./etc/translations.csv"),
    )?;
    let fail_on_duplicates: bool = get_option_bool(matches, &config, "fail-on-duplicates", false)?;
    let adoption_file: String = get_option_string(
        matches,
        &config,
        "adoption-file",
        String::from("data/processed/merged_dataset.csv"),
    )?;
    let metrics_dir: String =
        get_option_string(matches, &config, "metrics-dir", String::from("data/processed/metrics"))?;
    let map_markers: usize = get_option_number_as(matches, &config, "map-markers", 5000)?;
    let prometheus_exporter: bool = get_option_bool(matches, &config, "prometheus-exporter", true)?;
    let prometheus_exporter_prefix: String = get_option_string(
        matches,
        &config,
        "prometheus-exporter-prefix",
        String::from("ev_dashboard_"),
    )?;
    let slow_request_warning =
        get_option_duration(matches, &config, "slow-request-warning", String::from("2s"))?;

    let mut sources = vec![];
    if let Some(values) = matches.get_many::<String>("source") {
        for value in values {
            sources.push(parse_source_arg(value)?);
        }
    }
    let mut sources_from_file = get_sources_from_config(&config)?;
    sources.append(&mut sources_from_file);
    for (i, source) in sources.iter().enumerate() {
        if sources[..i].iter().any(|s| s.name == source.name) {
            return Err(Box::new(ConfigError::DuplicateSource(source.name.clone())));
        }
    }

    Ok(Config {
        command,
        config_file_loaded,
        log_dir,
        log_level,
        listen_host,
        listen_port,
        threads,
        static_files_dir,
        merged_file,
        report_file,
        samples_dir,
        sample_size,
        sample_seed,
        field_mapping_filepath,
        translations_filepath,
        fail_on_duplicates,
        adoption_file,
        metrics_dir,
        map_markers,
        prometheus_exporter,
        prometheus_exporter_prefix,
        slow_request_warning,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(args: &[&str]) -> Result<Config, Box<dyn Error>> {
        let matches = build_cli().try_get_matches_from(args)?;
        load_config_from_matches(&matches)
    }

    #[test]
    fn defaults_without_config_file() {
        let config = load(&["ev-dashboard", "-f", "/nonexistent/ev.toml"]).unwrap();
        assert!(!config.config_file_loaded);
        assert_eq!(config.command, Command::Serve);
        assert_eq!(config.sample_seed, 42);
        assert_eq!(config.slow_request_warning, Duration::from_secs(2));
        assert!(config.sources.is_empty());
    }

    #[test]
    fn file_values_and_cli_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ev.toml");
        fs::write(
            &path,
            r#"
listen-port = 9000
sample-size = 3
fail-on-duplicates = true

[[source]]
name = "cn"
path = "data/raw/china.csv"
delimiter = "\t"
id-offset = 10000000
"#,
        )
        .unwrap();
        let config = load(&[
            "ev-dashboard",
            "merge",
            "-f",
            path.to_str().unwrap(),
            "--port",
            "8123",
            "-vv",
            "--source",
            "intl=data/raw/intl.csv",
        ])
        .unwrap();
        assert!(config.config_file_loaded);
        assert_eq!(config.command, Command::Merge);
        assert_eq!(config.listen_port, 8123);
        assert_eq!(config.sample_size, 3);
        assert_eq!(config.log_level, 2);
        assert!(config.fail_on_duplicates);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0], SourceConfig::new("intl", "data/raw/intl.csv"));
        assert_eq!(config.sources[1].delimiter, b'\t');
        assert_eq!(config.sources[1].id_offset, 10_000_000);
    }

    #[test]
    fn wrong_type_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ev.toml");
        fs::write(&path, "listen-port = \"eighty\"\n").unwrap();
        let err = load(&["ev-dashboard", "-f", path.to_str().unwrap()]).unwrap_err();
        assert!(err.to_string().contains("listen-port"));
    }

    #[test]
    fn numbers_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ev.toml");
        for (line, name) in [
            ("sample-seed = -1", "sample-seed"),
            ("listen-port = 3000000000", "listen-port"),
            ("threads = -2", "threads"),
            ("map-markers = -5", "map-markers"),
        ] {
            fs::write(&path, format!("{}\n", line)).unwrap();
            let err = load(&["ev-dashboard", "-f", path.to_str().unwrap()]).unwrap_err();
            assert!(err.to_string().contains(name), "{}: {}", line, err);
        }

        fs::write(&path, "sample-seed = 7\nlisten-port = 9000\n").unwrap();
        let config = load(&["ev-dashboard", "-f", path.to_str().unwrap()]).unwrap();
        assert_eq!(config.sample_seed, 7);
        assert_eq!(config.listen_port, 9000);
    }

    #[test]
    fn duplicate_source_names() {
        let err = load(&[
            "ev-dashboard",
            "-f",
            "/nonexistent/ev.toml",
            "-s",
            "a=x.csv",
            "-s",
            "a=y.csv",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn source_argument_format() {
        assert!(parse_source_arg("intl").is_err());
        assert!(parse_source_arg("=x.csv").is_err());
        assert_eq!(parse_source_arg("a=b=c.csv").unwrap().path, "b=c.csv");
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter("ab").is_err());
    }
}
