use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    MissingColumns(&'static str, Vec<String>),
    NoData(&'static str, String),
    UnknownChart(String),
    InvalidOption(String, String),
}

impl Display for ChartError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match *self {
            ChartError::MissingColumns(chart, ref columns) => write!(
                f,
                "Chart '{}' needs columns missing from the adoption table: {}",
                chart,
                columns.join(", ")
            ),
            ChartError::NoData(chart, ref reason) => write!(f, "Chart '{}' has no data: {}", chart, reason),
            ChartError::UnknownChart(ref name) => write!(f, "Unknown chart '{}'", name),
            ChartError::InvalidOption(ref name, ref value) => {
                write!(f, "Invalid value '{}' for option '{}'", value, name)
            }
        }
    }
}

impl Error for ChartError {}
