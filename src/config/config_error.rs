use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

#[derive(Debug, Clone)]
pub enum ConfigError {
    TypeError(String, String),
    InvalidSource(String),
    UnknownField(String, String),
    DuplicateSource(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match *self {
            ConfigError::TypeError(ref field_name, ref field_value) => {
                write!(f, "Value {} for field {} has wrong type", field_value, field_name)
            }
            ConfigError::InvalidSource(ref value) => {
                write!(f, "Source '{}' is not of the form NAME=PATH", value)
            }
            ConfigError::UnknownField(ref source, ref field) => {
                write!(f, "Field mapping for source '{}' targets unknown field '{}'", source, field)
            }
            ConfigError::DuplicateSource(ref name) => {
                write!(f, "Source '{}' is configured more than once", name)
            }
        }
    }
}

impl Error for ConfigError {}
