use super::ApiError;
use rouille::Request;
use std::collections::HashMap;
use std::str::FromStr;
use url::form_urlencoded;

/// Query string parameters of a request; the first occurrence of a key wins.
pub struct RequestParameters {
    values: HashMap<String, String>,
}

impl RequestParameters {
    pub fn new(req: &Request) -> Self {
        RequestParameters::from_query(req.raw_query_string())
    }

    pub fn from_query(query: &str) -> Self {
        let mut values = HashMap::new();
        for (key, val) in form_urlencoded::parse(query.as_bytes()) {
            trace!("query '{}' => '{}'", key, val);
            values.entry(key.into_owned()).or_insert_with(|| val.into_owned());
        }
        RequestParameters { values }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Empty values count as absent.
    pub fn get_parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, ApiError> {
        match self.values.get(name).map(|v| v.trim()).filter(|v| !v.is_empty()) {
            Some(v) => v
                .parse::<T>()
                .map(Some)
                .map_err(|_| ApiError::InvalidParameter(name.to_string(), v.to_string())),
            None => Ok(None),
        }
    }

    pub fn get_number(&self, name: &str, default: usize) -> usize {
        let v = self.values.get(name);
        if let Some(v) = v {
            let parsed = v.parse::<usize>();
            if let Ok(parsed) = parsed {
                return parsed;
            } else {
                error!("could not parse '{}'", v);
            }
        }
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_query() {
        let p = RequestParameters::from_query("regions=China%2CUSA&year=2022&year=2019&limit=x&offset=");
        assert_eq!(p.get_str("regions"), Some("China,USA"));
        assert_eq!(p.get_parsed::<i32>("year"), Ok(Some(2022)));
        assert_eq!(p.get_parsed::<i32>("offset"), Ok(None));
        assert_eq!(p.get_parsed::<i32>("missing"), Ok(None));
        assert_eq!(
            p.get_parsed::<usize>("limit"),
            Err(ApiError::InvalidParameter("limit".into(), "x".into()))
        );
        assert_eq!(p.get_number("limit", 7), 7);
    }
}
