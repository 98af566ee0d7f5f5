use super::figure::{layout, Figure};
use super::{require, ChartError, ChartKind, ChartOptions};
use crate::data::{AdoptionTable, StationTable};
use crate::models::{alpha2_to_alpha3, country_name, is_aggregate_region, region_alpha3};
use serde_json::{json, Value};

const COLORSCALE: [(f64, &str); 5] = [
    (0.0, "#F0F9FF"),
    (0.2, "#BAE6FD"),
    (0.5, "#38BDF8"),
    (0.8, "#0284C7"),
    (1.0, "#0C4A6E"),
];

fn colorscale() -> Vec<Value> {
    COLORSCALE.iter().map(|(p, c)| json!([p, c])).collect()
}

fn geo_layout() -> Value {
    layout(
        550,
        json!({
            "margin": { "l": 0, "r": 0, "t": 0, "b": 0 },
            "geo": {
                "showframe": false,
                "showcoastlines": true,
                "projection": { "type": "natural earth" },
                "bgcolor": "#F4F4F4",
                "lakecolor": "#F4F4F4"
            }
        }),
    )
}

pub fn render(stations: &StationTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let counts = stations.count_by_country(options.year);
    let mut locations = vec![];
    let mut z = vec![];
    let mut text = vec![];
    for count in counts.iter() {
        // plotly places countries by alpha-3
        let alpha3 = match alpha2_to_alpha3(&count.country_code) {
            Some(alpha3) => alpha3,
            None => continue,
        };
        locations.push(alpha3);
        z.push(count.stations);
        text.push(format!(
            "{}<br>{} connectors",
            country_name(&count.country_code),
            count.connectors
        ));
    }
    if locations.is_empty() {
        let reason = match options.year {
            Some(year) => format!("no stations added up to {}", year),
            None => String::from("station table is empty"),
        };
        return Err(ChartError::NoData(ChartKind::Choropleth.name(), reason));
    }

    let trace = json!({
        "type": "choropleth",
        "locationmode": "ISO-3",
        "locations": locations,
        "z": z,
        "text": text,
        "colorscale": colorscale(),
        "colorbar": { "title": { "text": "Stations" }, "thickness": 15, "len": 0.7 },
        "hovertemplate": "%{text}<br>Stations: %{z:,}<extra></extra>"
    });
    Ok(Figure::new(vec![trace], geo_layout()))
}

/// EV stock per country in `year` (default latest). Aggregate regions and regions
/// that are no country are left off the map.
pub fn render_adoption(adoption: &AdoptionTable, options: &ChartOptions) -> Result<Figure, ChartError> {
    let kind = ChartKind::AdoptionMap;
    require(kind, adoption, &["ev_stock"])?;
    let year = options
        .year
        .or_else(|| adoption.latest_year())
        .ok_or_else(|| ChartError::NoData(kind.name(), String::from("adoption table is empty")))?;

    let mut locations = vec![];
    let mut z = vec![];
    let mut names = vec![];
    let mut stations = vec![];
    for row in adoption.ev_stock_by_region_year() {
        if row.year != year || is_aggregate_region(&row.region) {
            continue;
        }
        let alpha3 = match region_alpha3(&row.region) {
            Some(alpha3) => alpha3,
            None => {
                debug!("{}: region '{}' is not a country", kind.name(), row.region);
                continue;
            }
        };
        locations.push(alpha3);
        z.push(row.total_ev_stock);
        names.push(row.region);
        stations.push(row.total_stations);
    }
    if locations.is_empty() {
        return Err(ChartError::NoData(kind.name(), format!("no country has EV stock in {}", year)));
    }

    let trace = json!({
        "type": "choropleth",
        "locationmode": "ISO-3",
        "locations": locations,
        "z": z,
        "text": names,
        "customdata": stations,
        "colorscale": colorscale(),
        "colorbar": { "title": { "text": "EV Stock" }, "thickness": 15, "len": 0.7 },
        "hovertemplate": "%{text}<br>EV Stock: %{z:,.0f}<br>Charging Stations: %{customdata:,.0f}<extra></extra>"
    });
    let mut figure = Figure::new(vec![trace], geo_layout());
    figure.layout["meta"] = json!({ "year": year });
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{sample_adoption, sample_stations};

    #[test]
    fn alpha3_locations() {
        let figure = render(&sample_stations(), &ChartOptions::default()).unwrap();
        let trace = &figure.data[0];
        assert_eq!(trace["locations"], json!(["CHN", "DEU", "FRA", "GBR"]));
        assert_eq!(trace["z"], json!([2, 2, 1, 1]));
    }

    #[test]
    fn year_cutoff() {
        let options = ChartOptions {
            year: Some(2019),
            ..Default::default()
        };
        let figure = render(&sample_stations(), &options).unwrap();
        assert_eq!(figure.data[0]["locations"], json!(["DEU", "FRA"]));

        let before = ChartOptions {
            year: Some(2000),
            ..Default::default()
        };
        // the undated FR station is still there
        assert!(render(&sample_stations(), &before).is_ok());
        assert!(render(&StationTable::default(), &before).is_err());
    }

    #[test]
    fn adoption_map_of_latest_year() {
        let figure = render_adoption(&sample_adoption(), &ChartOptions::default()).unwrap();
        let trace = &figure.data[0];
        // World is an aggregate and stays off the map
        assert_eq!(trace["locations"], json!(["CHN", "NOR", "USA"]));
        assert_eq!(trace["z"], json!([13_512_000.0, 790_000.0, 2_970_000.0]));
        assert_eq!(trace["customdata"], json!([180_000.0, 6_000.0, 61_000.0]));
        assert_eq!(figure.layout["meta"]["year"], 2022);
    }

    #[test]
    fn adoption_map_year_filter() {
        let options = ChartOptions {
            year: Some(2021),
            ..Default::default()
        };
        let figure = render_adoption(&sample_adoption(), &options).unwrap();
        assert_eq!(figure.data[0]["z"], json!([7_800_000.0, 650_000.0, 2_020_000.0]));

        let empty = ChartOptions {
            year: Some(1990),
            ..Default::default()
        };
        assert!(matches!(
            render_adoption(&sample_adoption(), &empty),
            Err(ChartError::NoData("adoption_map", _))
        ));

        let world_only =
            AdoptionTable::from_reader("a.csv", "region,year,ev_stock\nWorld,2022,5\nEurope,2022,3\n".as_bytes())
                .unwrap();
        assert!(render_adoption(&world_only, &ChartOptions::default()).is_err());
        let no_stock = AdoptionTable::from_reader("a.csv", "region,year\nChina,2022\n".as_bytes()).unwrap();
        assert!(matches!(
            render_adoption(&no_stock, &ChartOptions::default()),
            Err(ChartError::MissingColumns("adoption_map", _))
        ));
    }
}
