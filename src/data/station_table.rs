use super::DataError;
use crate::models::{ChargingStation, StationStatus};
use chrono::Datelike;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;

/// The merged station file, loaded once at server start.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    pub stations: Vec<ChargingStation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryCount {
    pub country_code: String,
    pub stations: usize,
    pub connectors: u64,
}

impl StationTable {
    pub fn load(path: &str) -> Result<StationTable, DataError> {
        let file = File::open(path).map_err(|err| DataError::Io(path.to_string(), err))?;
        StationTable::from_reader(path, file)
    }

    /// Fails when the header lacks any canonical column.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<StationTable, DataError> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|err| DataError::Csv(name.to_string(), err))?
            .clone();
        let missing: Vec<String> = ChargingStation::COLUMNS
            .iter()
            .filter(|c| !headers.iter().any(|h| h == **c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DataError::MissingColumns(name.to_string(), missing));
        }
        let mut stations = vec![];
        for result in rdr.deserialize() {
            let station: ChargingStation = result.map_err(|err| DataError::Csv(name.to_string(), err))?;
            stations.push(station);
        }
        debug!("loaded {} stations from {}", stations.len(), name);
        Ok(StationTable { stations })
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn with_coordinates(&self) -> impl Iterator<Item = &ChargingStation> {
        self.stations.iter().filter(|s| s.has_coordinates())
    }

    /// Stations per country, largest first. With a cut-off year, stations added later are
    /// left out; stations without a date are always counted.
    pub fn count_by_country(&self, until_year: Option<i32>) -> Vec<CountryCount> {
        let mut map: BTreeMap<&str, (usize, u64)> = BTreeMap::new();
        for station in self.stations.iter() {
            if let (Some(year), Some(date)) = (until_year, station.date_added) {
                if date.year() > year {
                    continue;
                }
            }
            let entry = map.entry(station.country_code.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += station.num_connectors as u64;
        }
        let mut list: Vec<CountryCount> = map
            .into_iter()
            .map(|(code, (stations, connectors))| CountryCount {
                country_code: code.to_string(),
                stations,
                connectors,
            })
            .collect();
        list.sort_by(|a, b| b.stations.cmp(&a.stations).then(a.country_code.cmp(&b.country_code)));
        list
    }

    /// Number of stations added per calendar year, undated stations excluded.
    pub fn added_per_year(&self) -> BTreeMap<i32, usize> {
        let mut map = BTreeMap::new();
        for date in self.stations.iter().filter_map(|s| s.date_added) {
            *map.entry(date.year()).or_insert(0) += 1;
        }
        map
    }

    pub fn count_by_status(&self) -> BTreeMap<StationStatus, usize> {
        let mut map = BTreeMap::new();
        for station in self.stations.iter() {
            *map.entry(station.status).or_insert(0) += 1;
        }
        map
    }

    /// Stations of one country (or all), paged.
    pub fn page(&self, country_code: Option<&str>, offset: usize, limit: usize) -> Vec<&ChargingStation> {
        self.stations
            .iter()
            .filter(|s| country_code.map(|c| s.country_code.eq_ignore_ascii_case(c)).unwrap_or(true))
            .skip(offset)
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const STATIONS: &str = "id,title,address,town,state,postcode,country_code,lat,lon,operator,status,num_connectors,connector_types,date_added
1,A,,Berlin,,,DE,52.5,13.4,EnBW,Operational,4,CCS (Type 2)|Type 2,2019-05-01T10:00:00Z
2,B,,Munich,,,DE,48.1,11.6,Unknown,Planned,0,Untracked,2020-01-15T00:00:00Z
3,C,,London,,,GB,51.5,-0.1,Shell,TemporarilyUnavailable,2,CHAdeMO,2021-03-04T05:06:07Z
4,D,,Lyon,,,FR,,,Izivia,Operational,2,Type 2,
5,E,,Beijing,,,CN,39.9,116.4,TELD,Operational,10,Untracked,2021-07-01T00:00:00Z
6,F,,Shanghai,,,CN,31.2,121.5,State Grid,NotOperational,6,Untracked,2022-02-02T00:00:00Z
";

    pub(crate) fn table() -> StationTable {
        StationTable::from_reader("stations.csv", STATIONS.as_bytes()).unwrap()
    }

    #[test]
    fn loads_merged_file() {
        let t = table();
        assert_eq!(t.len(), 6);
        assert_eq!(t.with_coordinates().count(), 5);
        assert_eq!(t.stations[0].connector_types, vec!["CCS (Type 2)", "Type 2"]);
        assert_eq!(t.count_by_status().get(&StationStatus::Operational), Some(&3));
    }

    #[test]
    fn missing_canonical_column() {
        let data = "id,title\n1,A\n";
        match StationTable::from_reader("bad.csv", data.as_bytes()) {
            Err(DataError::MissingColumns(file, columns)) => {
                assert_eq!(file, "bad.csv");
                assert!(columns.contains(&String::from("country_code")));
                assert!(!columns.contains(&String::from("title")));
            }
            other => panic!("unexpected {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn country_counts_with_cutoff() {
        let t = table();
        let all = t.count_by_country(None);
        assert_eq!(all[0].country_code, "CN");
        assert_eq!(all[0].stations, 2);
        assert_eq!(all[0].connectors, 16);
        assert_eq!(all[1].country_code, "DE");

        let until_2020 = t.count_by_country(Some(2020));
        let codes: Vec<&str> = until_2020.iter().map(|c| c.country_code.as_str()).collect();
        // the undated station in FR is kept
        assert_eq!(codes, vec!["DE", "FR"]);
    }

    #[test]
    fn yearly_additions_and_paging() {
        let t = table();
        let per_year: Vec<(i32, usize)> = t.added_per_year().into_iter().collect();
        assert_eq!(per_year, vec![(2019, 1), (2020, 1), (2021, 2), (2022, 1)]);
        assert_eq!(t.page(Some("cn"), 0, 10).len(), 2);
        assert_eq!(t.page(None, 4, 10).len(), 2);
        assert_eq!(t.page(None, 0, 1)[0].id, 1);
    }
}
