use crate::api::api_response::ApiResponse;
use crate::data::CountryCount;
use crate::models::country_name;
use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCountry {
    pub name: String,
    pub iso_3166_1: String,
    pub stationcount: usize,
    pub connectorcount: u64,
}

impl ApiCountry {
    pub fn new_with_code(iso_3166_1: String, stationcount: usize, connectorcount: u64) -> Self {
        ApiCountry {
            name: country_name(&iso_3166_1).to_string(),
            iso_3166_1,
            stationcount,
            connectorcount,
        }
    }

    pub fn get_response<I, P>(list: I, format: &str) -> Result<ApiResponse, Box<dyn Error>>
    where
        I: IntoIterator<Item = P>,
        P: Into<ApiCountry>,
    {
        let list: Vec<ApiCountry> = list.into_iter().map(|item| item.into()).collect();
        ApiResponse::from_list(&list, format)
    }
}

impl From<CountryCount> for ApiCountry {
    fn from(item: CountryCount) -> Self {
        ApiCountry::new_with_code(item.country_code, item.stations, item.connectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_from_code() {
        let country: ApiCountry = CountryCount {
            country_code: String::from("DE"),
            stations: 2,
            connectors: 4,
        }
        .into();
        assert!(country.name.contains("Germany"));
        assert_eq!(country.stationcount, 2);
    }
}
