mod api_chart;
mod api_country;
mod api_region;

pub use self::api_chart::ApiChart;
pub use self::api_country::ApiCountry;
pub use self::api_region::ApiRegion;
