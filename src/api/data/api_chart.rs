use crate::charts::ChartKind;
use serde::{Deserialize, Serialize};

/// One entry of the chart list, `options` names the request parameters the chart reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiChart {
    pub name: String,
    pub title: String,
    pub description: String,
    pub options: String,
    pub url: String,
}

impl From<ChartKind> for ApiChart {
    fn from(kind: ChartKind) -> Self {
        ApiChart {
            name: kind.name().to_string(),
            title: kind.title().to_string(),
            description: kind.description().to_string(),
            options: kind.options().join(","),
            url: format!("/json/charts/{}", kind.name()),
        }
    }
}

impl ApiChart {
    pub fn all() -> Vec<ApiChart> {
        ChartKind::ALL.iter().map(|k| ApiChart::from(*k)).collect()
    }
}
