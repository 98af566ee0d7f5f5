use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateCheck {
    Valid(f64, f64),
    Invalid,
    Missing,
}

impl CoordinateCheck {
    pub fn lat_lon(&self) -> (Option<f64>, Option<f64>) {
        match *self {
            CoordinateCheck::Valid(lat, lon) => (Some(lat), Some(lon)),
            _ => (None, None),
        }
    }
}

/// Checks a latitude/longitude pair. A pair with one side empty is invalid,
/// both sides empty is missing. (0, 0) is treated as a placeholder and rejected.
pub fn check_coordinates(lat: Option<&str>, lon: Option<&str>) -> CoordinateCheck {
    let (lat, lon) = match (lat, lon) {
        (None, None) => return CoordinateCheck::Missing,
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return CoordinateCheck::Invalid,
    };
    let lat: f64 = match lat.trim().parse() {
        Ok(v) => v,
        Err(_) => return CoordinateCheck::Invalid,
    };
    let lon: f64 = match lon.trim().parse() {
        Ok(v) => v,
        Err(_) => return CoordinateCheck::Invalid,
    };
    if !lat.is_finite() || !lon.is_finite() {
        return CoordinateCheck::Invalid;
    }
    if lat.abs() > 90.0 || lon.abs() > 180.0 {
        return CoordinateCheck::Invalid;
    }
    if lat == 0.0 && lon == 0.0 {
        return CoordinateCheck::Invalid;
    }
    CoordinateCheck::Valid(lat, lon)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinateCounts {
    pub valid: usize,
    pub invalid: usize,
    pub missing: usize,
}

impl CoordinateCounts {
    pub fn add(&mut self, check: &CoordinateCheck) {
        match check {
            CoordinateCheck::Valid(_, _) => self.valid += 1,
            CoordinateCheck::Invalid => self.invalid += 1,
            CoordinateCheck::Missing => self.missing += 1,
        }
    }

    pub fn merge(&mut self, other: &CoordinateCounts) {
        self.valid += other.valid;
        self.invalid += other.invalid;
        self.missing += other.missing;
    }

    pub fn total(&self) -> usize {
        self.valid + self.invalid + self.missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_pairs() {
        assert_eq!(
            check_coordinates(Some("39.9042"), Some("116.4074")),
            CoordinateCheck::Valid(39.9042, 116.4074)
        );
        assert_eq!(
            check_coordinates(Some("-90"), Some("180")),
            CoordinateCheck::Valid(-90.0, 180.0)
        );
    }

    #[test]
    fn invalid_pairs() {
        assert_eq!(check_coordinates(Some("91"), Some("10")), CoordinateCheck::Invalid);
        assert_eq!(check_coordinates(Some("10"), Some("-180.5")), CoordinateCheck::Invalid);
        assert_eq!(check_coordinates(Some("abc"), Some("10")), CoordinateCheck::Invalid);
        assert_eq!(check_coordinates(Some("NaN"), Some("10")), CoordinateCheck::Invalid);
        assert_eq!(check_coordinates(Some("0"), Some("0")), CoordinateCheck::Invalid);
        assert_eq!(check_coordinates(Some("10"), None), CoordinateCheck::Invalid);
    }

    #[test]
    fn missing_pair() {
        assert_eq!(check_coordinates(None, None), CoordinateCheck::Missing);
        assert_eq!(CoordinateCheck::Missing.lat_lon(), (None, None));
    }

    #[test]
    fn counts_add_up() {
        let mut counts = CoordinateCounts::default();
        counts.add(&CoordinateCheck::Valid(1.0, 2.0));
        counts.add(&CoordinateCheck::Invalid);
        counts.add(&CoordinateCheck::Missing);
        counts.add(&CoordinateCheck::Missing);
        assert_eq!(counts.total(), 4);
        let mut all = CoordinateCounts::default();
        all.merge(&counts);
        all.merge(&counts);
        assert_eq!(all, CoordinateCounts { valid: 2, invalid: 2, missing: 4 });
    }
}
