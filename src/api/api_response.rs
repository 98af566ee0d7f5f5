use serde::Serialize;
use std::error::Error;

pub const CONTENT_JSON: &str = "application/json";
pub const CONTENT_CSV: &str = "text/csv";

pub enum ApiResponse {
    Text(String, &'static str),
    BadRequest(String),
    ServerError(String),
    NotFound,
    UnknownContentType,
    Locked(String),
}

impl ApiResponse {
    /// A list as `json` or `csv`, any other format is unknown.
    pub fn from_list<T: Serialize>(list: &[T], format: &str) -> Result<ApiResponse, Box<dyn Error>> {
        Ok(match format {
            "json" => ApiResponse::Text(serde_json::to_string(list)?, CONTENT_JSON),
            "csv" => ApiResponse::Text(serialize_to_csv(list)?, CONTENT_CSV),
            _ => ApiResponse::UnknownContentType,
        })
    }

    pub fn into_response(self) -> rouille::Response {
        match self {
            ApiResponse::Text(text, content_type) => rouille::Response::text(text)
                .with_no_cache()
                .with_unique_header("Content-Type", content_type),
            ApiResponse::BadRequest(message) => rouille::Response::text(message).with_status_code(400),
            ApiResponse::ServerError(message) => rouille::Response::text(message).with_status_code(500),
            ApiResponse::NotFound => rouille::Response::empty_404(),
            ApiResponse::UnknownContentType => rouille::Response::empty_406(),
            ApiResponse::Locked(message) => rouille::Response::text(message).with_status_code(423),
        }
    }
}

fn serialize_to_csv<T: Serialize>(entries: &[T]) -> Result<String, Box<dyn Error>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    let x: Vec<u8> = wtr.into_inner()?;
    Ok(String::from_utf8(x)?)
}
