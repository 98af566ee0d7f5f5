use crate::data::AdoptionTable;
use crate::models::is_aggregate_region;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiRegion {
    pub name: String,
    pub aggregate: bool,
    pub first_year: i32,
    pub last_year: i32,
}

impl ApiRegion {
    pub fn list(table: &AdoptionTable) -> Vec<ApiRegion> {
        let mut years: BTreeMap<&str, (i32, i32)> = BTreeMap::new();
        for row in table.rows.iter().filter(|r| !r.region.is_empty()) {
            let entry = years.entry(row.region.as_str()).or_insert((row.year, row.year));
            entry.0 = entry.0.min(row.year);
            entry.1 = entry.1.max(row.year);
        }
        years
            .into_iter()
            .map(|(name, (first_year, last_year))| ApiRegion {
                name: name.to_string(),
                aggregate: is_aggregate_region(name),
                first_year,
                last_year,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample_adoption;

    #[test]
    fn regions_with_year_span() {
        let regions = ApiRegion::list(&sample_adoption());
        assert_eq!(regions.len(), 4);
        assert_eq!(regions[0].name, "China");
        assert_eq!((regions[0].first_year, regions[0].last_year), (2021, 2022));
        let world = &regions[3];
        assert!(world.aggregate);
        assert_eq!(world.first_year, 2022);
    }
}
