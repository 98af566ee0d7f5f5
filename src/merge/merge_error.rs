use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

#[derive(Debug)]
pub enum MergeError {
    NoSources,
    MissingColumns(String, Vec<String>),
    MissingRequiredField(String, String),
    DuplicateFieldRule(String, String),
    NoMapping(String),
    DuplicateIds(usize, Vec<i64>),
    Csv(String, csv::Error),
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match *self {
            MergeError::NoSources => write!(f, "No sources configured for merge"),
            MergeError::MissingColumns(ref source, ref columns) => write!(
                f,
                "Source '{}' is missing mapped columns: {}",
                source,
                columns.join(", ")
            ),
            MergeError::MissingRequiredField(ref source, ref field) => write!(
                f,
                "Source '{}' provides neither a column nor a default for required field '{}'",
                source, field
            ),
            MergeError::DuplicateFieldRule(ref source, ref field) => {
                write!(f, "Source '{}' maps field '{}' more than once", source, field)
            }
            MergeError::NoMapping(ref source) => {
                write!(f, "Field mapping table has no entries for source '{}'", source)
            }
            MergeError::DuplicateIds(count, ref ids) => {
                let ids: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
                write!(f, "{} duplicate ids found, first: {}", count, ids.join(", "))
            }
            MergeError::Csv(ref source, ref err) => write!(f, "Source '{}': {}", source, err),
        }
    }
}

impl Error for MergeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            MergeError::Csv(_, ref err) => Some(err),
            _ => None,
        }
    }
}
