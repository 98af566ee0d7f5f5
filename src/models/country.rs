use celes::Country;

/// Normalizes a country value from a source table to an ISO 3166-1 alpha-2 code.
/// Accepts alpha-2, alpha-3 and English names. Returns None for anything else.
pub fn normalize_country_code(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let country = match value.len() {
        2 => Country::from_alpha2(value.to_uppercase()).ok(),
        3 => Country::from_alpha3(value.to_uppercase()).ok(),
        _ => None,
    };
    let country = country
        .or_else(|| Country::from_name(value).ok())
        .or_else(|| Country::from_alias(value).ok());
    country.map(|c| c.alpha2.to_string())
}

#[cfg(test)]
pub fn is_alpha2(value: &str) -> bool {
    value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase()) && Country::from_alpha2(value).is_ok()
}

/// Plotly choropleth maps locate countries by alpha-3 code.
pub fn alpha2_to_alpha3(alpha2: &str) -> Option<&'static str> {
    Country::from_alpha2(alpha2).ok().map(|c| c.alpha3)
}

/// Alpha-3 code of an adoption region such as `China`, `USA` or `Korea`. Aggregates and
/// names that are no country give None.
pub fn region_alpha3(region: &str) -> Option<&'static str> {
    normalize_country_code(region).and_then(|alpha2| alpha2_to_alpha3(&alpha2))
}

pub fn country_name(alpha2: &str) -> &'static str {
    Country::from_alpha2(alpha2).map(|c| c.long_name).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_codes_and_names() {
        assert_eq!(normalize_country_code("de"), Some(String::from("DE")));
        assert_eq!(normalize_country_code(" CN "), Some(String::from("CN")));
        assert_eq!(normalize_country_code("DEU"), Some(String::from("DE")));
        assert_eq!(normalize_country_code("Germany"), Some(String::from("DE")));
        assert_eq!(normalize_country_code("China"), Some(String::from("CN")));
    }

    #[test]
    fn rejects_unknown_values() {
        assert_eq!(normalize_country_code(""), None);
        assert_eq!(normalize_country_code("XX"), None);
        assert_eq!(normalize_country_code("Atlantis"), None);
    }

    #[test]
    fn alpha2_checks() {
        assert!(is_alpha2("FR"));
        assert!(!is_alpha2("fr"));
        assert!(!is_alpha2("FRA"));
        assert_eq!(alpha2_to_alpha3("FR"), Some("FRA"));
        assert_eq!(alpha2_to_alpha3("ZZ"), None);
    }

    #[test]
    fn region_names_to_alpha3() {
        assert_eq!(region_alpha3("China"), Some("CHN"));
        assert_eq!(region_alpha3("USA"), Some("USA"));
        assert_eq!(region_alpha3("Norway"), Some("NOR"));
        assert_eq!(region_alpha3("Rest of the world"), None);
    }
}
