use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    InvalidParameter(String, String),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match *self {
            ApiError::InvalidParameter(ref name, ref value) => {
                write!(f, "Invalid value '{}' for parameter '{}'", value, name)
            }
        }
    }
}

impl Error for ApiError {}
