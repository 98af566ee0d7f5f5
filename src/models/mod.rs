mod adoption;
mod country;
mod station;

pub use adoption::is_aggregate_region;
pub use adoption::AdoptionRecord;
pub use country::alpha2_to_alpha3;
pub use country::country_name;
#[cfg(test)]
pub use country::is_alpha2;
pub use country::normalize_country_code;
pub use country::region_alpha3;
pub use station::ChargingStation;
pub use station::StationStatus;
