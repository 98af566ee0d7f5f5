use super::MergeError;
use std::io::Read;

/// Raw rows of one station list as read from disk, before any mapping.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub name: String,
    pub id_offset: i64,
    pub headers: Vec<String>,
    pub rows: Vec<csv::StringRecord>,
    /// Rows with the wrong field count or broken encoding.
    pub unreadable_rows: usize,
}

impl SourceTable {
    pub fn from_reader<R>(name: &str, id_offset: i64, delimiter: u8, reader: R) -> Result<Self, MergeError>
    where
        R: Read,
    {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: Vec<String> = rdr
            .headers()
            .map_err(|err| MergeError::Csv(name.to_string(), err))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = vec![];
        let mut unreadable_rows = 0;
        for result in rdr.records() {
            match result {
                Ok(record) => rows.push(record),
                Err(err) => match err.kind() {
                    csv::ErrorKind::UnequalLengths { .. } | csv::ErrorKind::Utf8 { .. } => {
                        debug!("{}: skipping unreadable row: {}", name, err);
                        unreadable_rows += 1;
                    }
                    _ => return Err(MergeError::Csv(name.to_string(), err)),
                },
            }
        }
        debug!(
            "{}: {} rows read, {} unreadable, columns {:?}",
            name,
            rows.len(),
            unreadable_rows,
            headers
        );
        Ok(SourceTable {
            name: name.to_string(),
            id_offset,
            headers,
            rows,
            unreadable_rows,
        })
    }

    pub fn rows_read(&self) -> usize {
        self.rows.len() + self.unreadable_rows
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_rows_with_wrong_field_count() {
        let data = "\u{feff}ID,Name\n1,a\n2,b,extra\n3,c\n";
        let table = SourceTable::from_reader("intl", 0, b',', data.as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["ID", "Name"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.unreadable_rows, 1);
        assert_eq!(table.rows_read(), 3);
        assert_eq!(table.column_index("Name"), Some(1));
        assert_eq!(table.column_index("name"), None);
    }

    #[test]
    fn tab_delimited_chinese_headers() {
        let data = "编号\t名称\n1\t充电站\n";
        let table = SourceTable::from_reader("cn", 5, b'\t', data.as_bytes()).unwrap();
        assert_eq!(table.column_index("名称"), Some(1));
        assert_eq!(&table.rows[0][1], "充电站");
        assert_eq!(table.id_offset, 5);
    }
}
