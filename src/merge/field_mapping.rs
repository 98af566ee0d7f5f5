use super::source_table::SourceTable;
use super::MergeError;
use crate::config::FieldMappingItem;
use std::collections::BTreeMap;

/// Canonical fields every source has to provide.
pub const REQUIRED_FIELDS: [&str; 2] = ["id", "country_code"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldRule {
    column: Option<String>,
    default: Option<String>,
}

/// Field mapping table grouped by source name.
#[derive(Debug, Clone, Default)]
pub struct FieldMapping {
    rules: BTreeMap<String, BTreeMap<String, FieldRule>>,
}

impl FieldMapping {
    pub fn new(items: Vec<FieldMappingItem>) -> Result<Self, MergeError> {
        let mut rules: BTreeMap<String, BTreeMap<String, FieldRule>> = BTreeMap::new();
        for item in items {
            let per_source = rules.entry(item.source.clone()).or_default();
            if per_source.contains_key(&item.field) {
                return Err(MergeError::DuplicateFieldRule(item.source, item.field));
            }
            let rule = FieldRule {
                column: non_empty(item.column),
                default: non_empty(item.default),
            };
            per_source.insert(item.field, rule);
        }
        Ok(FieldMapping { rules })
    }

    /// Binds the rules of one source to the column positions of its header.
    /// Fails when a mapped column is absent or a required field has no origin.
    pub fn resolve(&self, table: &SourceTable) -> Result<ResolvedMapping, MergeError> {
        let rules = self
            .rules
            .get(&table.name)
            .ok_or_else(|| MergeError::NoMapping(table.name.clone()))?;

        let mut missing = vec![];
        let mut fields = BTreeMap::new();
        for (field, rule) in rules {
            let index = match rule.column {
                Some(ref column) => match table.column_index(column) {
                    Some(index) => Some(index),
                    None => {
                        missing.push(column.clone());
                        continue;
                    }
                },
                None => None,
            };
            fields.insert(
                field.clone(),
                ResolvedField {
                    index,
                    default: rule.default.clone(),
                },
            );
        }
        if !missing.is_empty() {
            return Err(MergeError::MissingColumns(table.name.clone(), missing));
        }
        for required in REQUIRED_FIELDS.iter() {
            let provided = fields
                .get(*required)
                .map(|f| f.index.is_some() || f.default.is_some())
                .unwrap_or(false);
            if !provided {
                return Err(MergeError::MissingRequiredField(
                    table.name.clone(),
                    required.to_string(),
                ));
            }
        }

        let dropped: Vec<&String> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(i, _)| !fields.values().any(|f| f.index == Some(*i)))
            .map(|(_, h)| h)
            .collect();
        if !dropped.is_empty() {
            debug!("{}: unmapped columns dropped: {:?}", table.name, dropped);
        }
        Ok(ResolvedMapping { fields })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Clone)]
struct ResolvedField {
    index: Option<usize>,
    default: Option<String>,
}

/// Mapping of one source with column names replaced by positions.
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    fields: BTreeMap<String, ResolvedField>,
}

impl ResolvedMapping {
    /// Value of a canonical field for one row: the mapped cell if it is not empty, else the default.
    pub fn value<'a>(&'a self, field: &str, record: &'a csv::StringRecord) -> Option<&'a str> {
        let resolved = self.fields.get(field)?;
        let cell = resolved
            .index
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty());
        cell.or(resolved.default.as_deref())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, column: &str, field: &str, default: &str) -> FieldMappingItem {
        FieldMappingItem {
            source: source.to_string(),
            column: column.to_string(),
            field: field.to_string(),
            default: default.to_string(),
        }
    }

    fn table(headers: &str, row: &str) -> SourceTable {
        let data = format!("{}\n{}\n", headers, row);
        SourceTable::from_reader("cn", 0, b',', data.as_bytes()).unwrap()
    }

    #[test]
    fn cell_then_default_then_literal() {
        let mapping = FieldMapping::new(vec![
            item("cn", "编号", "id", ""),
            item("cn", "运营商", "operator", "Unknown"),
            item("cn", "", "country_code", "CN"),
        ])
        .unwrap();
        let t = table("编号,运营商,备注", "17,,note");
        let resolved = mapping.resolve(&t).unwrap();
        assert_eq!(resolved.field_count(), 3);
        let row = &t.rows[0];
        assert_eq!(resolved.value("id", row), Some("17"));
        assert_eq!(resolved.value("operator", row), Some("Unknown"));
        assert_eq!(resolved.value("country_code", row), Some("CN"));
        assert_eq!(resolved.value("title", row), None);
    }

    #[test]
    fn missing_column_fails_fast() {
        let mapping = FieldMapping::new(vec![
            item("cn", "编号", "id", ""),
            item("cn", "国家", "country_code", ""),
        ])
        .unwrap();
        let t = table("编号,名称", "1,x");
        match mapping.resolve(&t) {
            Err(MergeError::MissingColumns(source, columns)) => {
                assert_eq!(source, "cn");
                assert_eq!(columns, vec!["国家"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn required_field_without_origin() {
        let mapping = FieldMapping::new(vec![item("cn", "编号", "id", "")]).unwrap();
        let t = table("编号", "1");
        assert!(matches!(
            mapping.resolve(&t),
            Err(MergeError::MissingRequiredField(_, ref f)) if f == "country_code"
        ));
    }

    #[test]
    fn unknown_source_and_duplicate_rules() {
        let mapping = FieldMapping::new(vec![item("intl", "ID", "id", "")]).unwrap();
        assert!(matches!(mapping.resolve(&table("ID", "1")), Err(MergeError::NoMapping(_))));
        assert!(FieldMapping::new(vec![item("a", "x", "id", ""), item("a", "y", "id", "")]).is_err());
    }
}
