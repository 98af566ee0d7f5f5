use super::ConfigError;
use crate::models::ChargingStation;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fs::File;
use std::io::Read;

#[derive(Debug, Clone, Deserialize)]
struct TranslationItem {
    from: String,
    to: String,
}

/// One line of the field mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldMappingItem {
    pub source: String,
    #[serde(default)]
    pub column: String,
    pub field: String,
    #[serde(default)]
    pub default: String,
}

/// Reads a `from;to` table of whole-value translations from a local path or an http(s) url.
pub fn read_translation_file(file_path: &str) -> Result<HashMap<String, String>, Box<dyn Error>> {
    debug!("read_translation_file({})", file_path);
    read_translation_reader(open_table(file_path)?)
}

pub fn read_translation_reader<R>(reader: R) -> Result<HashMap<String, String>, Box<dyn Error>>
where
    R: Read,
{
    let items: Vec<TranslationItem> = read_table_reader(reader)?;
    Ok(translations_from_items(items))
}

fn translations_from_items(items: Vec<TranslationItem>) -> HashMap<String, String> {
    let mut r: HashMap<String, String> = HashMap::new();
    for record in items {
        if !r.contains_key(&record.from) {
            r.insert(record.from, record.to);
        } else {
            error!("Duplicate key in translation table: {}", record.from);
        }
    }
    r
}

/// Reads the `source;column;field;default` table. Every field has to be a canonical column.
pub fn read_field_mapping_file(file_path: &str) -> Result<Vec<FieldMappingItem>, Box<dyn Error>> {
    debug!("read_field_mapping_file({})", file_path);
    read_field_mapping_reader(open_table(file_path)?)
}

pub fn read_field_mapping_reader<R>(reader: R) -> Result<Vec<FieldMappingItem>, Box<dyn Error>>
where
    R: Read,
{
    let items: Vec<FieldMappingItem> = read_table_reader(reader)?;
    check_fields(items)
}

fn check_fields(items: Vec<FieldMappingItem>) -> Result<Vec<FieldMappingItem>, Box<dyn Error>> {
    for item in &items {
        if !ChargingStation::COLUMNS.contains(&item.field.as_str()) {
            return Err(Box::new(ConfigError::UnknownField(
                item.source.clone(),
                item.field.clone(),
            )));
        }
    }
    Ok(items)
}

fn open_table(file_path: &str) -> Result<Box<dyn Read>, Box<dyn Error>> {
    match Url::parse(file_path) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            debug!("Remote url: {}", url);
            Ok(Box::new(reqwest::blocking::get(url)?.error_for_status()?))
        }
        _ => {
            debug!("Local path: {}", file_path);
            Ok(Box::new(File::open(file_path)?))
        }
    }
}

fn read_table_reader<T, R>(reader: R) -> Result<Vec<T>, Box<dyn Error>>
where
    T: DeserializeOwned + std::fmt::Debug,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b';')
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut list = vec![];
    for result in rdr.deserialize() {
        let record: T = result?;
        trace!("loaded record: {:?}", record);
        list.push(record);
    }
    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translations_first_key_wins() {
        let data = "from;to\n# comment\n运营中;Operational\n北京市;Beijing\n运营中;Other\n";
        let map = read_translation_reader(data.as_bytes()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("运营中").map(String::as_str), Some("Operational"));
        assert_eq!(map.get("北京市").map(String::as_str), Some("Beijing"));
    }

    #[test]
    fn field_mapping_with_literals() {
        let data = "source;column;field;default\ncn;编号;id;\ncn;;country_code;CN\ncn;;connector_types;Untracked\n";
        let items = read_field_mapping_reader(data.as_bytes()).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].column, "编号");
        assert_eq!(items[0].field, "id");
        assert_eq!(items[1].column, "");
        assert_eq!(items[1].default, "CN");
    }

    #[test]
    fn field_mapping_rejects_unknown_field() {
        let data = "source;column;field;default\nintl;Name;name;\n";
        let err = read_field_mapping_reader(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unknown field 'name'"));
    }

    #[test]
    fn local_path_is_not_a_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translations.csv");
        std::fs::write(&path, "from;to\na;b\n").unwrap();
        let map = read_translation_file(path.to_str().unwrap()).unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("b"));
    }
}
