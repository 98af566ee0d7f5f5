mod adoption_table;
mod data_error;
mod station_table;
mod summary;

pub use adoption_table::AdoptionTable;
pub use adoption_table::InfrastructureRow;
pub use adoption_table::PowertrainTotal;
pub use adoption_table::RegionYear;
pub use adoption_table::POWERTRAINS;
pub use data_error::DataError;
pub use station_table::CountryCount;
pub use station_table::StationTable;
pub use summary::format_thousands;
pub use summary::kpi_cards;
pub use summary::summary_stats;
pub use summary::KpiCard;

#[cfg(test)]
pub(crate) use adoption_table::tests::table as sample_adoption;
#[cfg(test)]
pub(crate) use station_table::tests::table as sample_stations;
