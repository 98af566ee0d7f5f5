use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

#[derive(Debug)]
pub enum DataError {
    MissingColumns(String, Vec<String>),
    Io(String, std::io::Error),
    Csv(String, csv::Error),
}

impl Display for DataError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match *self {
            DataError::MissingColumns(ref file, ref columns) => write!(
                f,
                "{} is missing required columns: {}",
                file,
                columns.join(", ")
            ),
            DataError::Io(ref file, ref err) => write!(f, "{}: {}", file, err),
            DataError::Csv(ref file, ref err) => write!(f, "{}: {}", file, err),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            DataError::Io(_, ref err) => Some(err),
            DataError::Csv(_, ref err) => Some(err),
            _ => None,
        }
    }
}
