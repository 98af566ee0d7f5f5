mod api_error;
mod api_response;
mod dashboard_state;
mod data;
mod parameters;
mod prometheus_exporter;

pub use self::dashboard_state::DashboardState;

use self::api_error::ApiError;

use self::api_response::{ApiResponse, CONTENT_JSON};
use self::data::{ApiChart, ApiCountry, ApiRegion};
use self::parameters::RequestParameters;
use self::prometheus_exporter::RequestMetrics;
use crate::charts::{self, ChartError, ChartKind, ChartOptions};
use crate::config::Config;
use crate::data::{kpi_cards, summary_stats, KpiCard};
use rouille::{Request, Response};
use std::error::Error;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::prelude::*;
use std::time::Duration;

const DEFAULT_PAGE_SIZE: usize = 1000;
const MAX_PAGE_SIZE: usize = 100_000;

struct ServerSettings {
    static_dir: String,
    log_dir: String,
    slow_request_warning: Duration,
}

impl ServerSettings {
    fn from_config(config: &Config) -> Self {
        ServerSettings {
            static_dir: config.static_files_dir.clone(),
            log_dir: config.log_dir.clone(),
            slow_request_warning: config.slow_request_warning,
        }
    }
}

fn add_cors(result: Response) -> Response {
    result
        .with_unique_header("Access-Control-Allow-Origin", "*")
        .with_unique_header("Access-Control-Allow-Headers", "origin, x-requested-with, content-type")
        .with_unique_header("Access-Control-Allow-Methods", "GET")
}

/// Serves the dashboard until the process is stopped.
pub fn run(config: &Config, state: DashboardState) -> Result<(), Box<dyn Error>> {
    let listen_str = format!("{}:{}", config.listen_host, config.listen_port);
    info!("Listen on {} with {} threads", listen_str, config.threads);
    let metrics = if config.prometheus_exporter {
        let metrics = RequestMetrics::new(&config.prometheus_exporter_prefix)?;
        metrics.set_data(&state);
        Some(metrics)
    } else {
        None
    };
    let settings = ServerSettings::from_config(config);
    rouille::start_server_with_pool(listen_str, Some(config.threads), move |request| {
        handle_connection(&state, metrics.as_ref(), &settings, request)
    });
}

fn send_file(path: &str, content_type: &'static str) -> Response {
    let file = File::open(path);
    match file {
        Ok(file) => add_cors(Response::from_file(content_type, file)),
        _ => add_cors(Response::empty_404()),
    }
}

fn log_to_file(file_name: &str, line: &str) {
    let file = OpenOptions::new().append(true).create(true).open(file_name);

    match file {
        Ok(mut file) => {
            if let Err(e) = writeln!(file, "{}", line) {
                error!("Couldn't write to file: {}", e);
            }
        }
        Err(err) => {
            error!("Could not open log file {}", err);
        }
    }
}

/// Low-cardinality route name for the request counter.
fn route_label(url: &str) -> &'static str {
    let items: Vec<&str> = url.split('/').collect();
    match items.as_slice() {
        ["", ""] => "dashboard",
        ["", "main.css"] | ["", "favicon.ico"] => "static",
        ["", "metrics"] => "metrics",
        ["", _, "charts"] => "charts",
        ["", _, "charts", _] => "chart",
        ["", _, "summary"] => "summary",
        ["", _, "quality"] => "quality",
        ["", _, "countries"] => "countries",
        ["", _, "stations"] => "stations",
        ["", _, "regions"] => "regions",
        _ => "other",
    }
}

fn handle_connection(
    state: &DashboardState,
    metrics: Option<&RequestMetrics>,
    settings: &ServerSettings,
    request: &Request,
) -> Response {
    let remote_ip: String = request
        .header("X-Forwarded-For")
        .map(String::from)
        .unwrap_or_else(|| request.remote_addr().ip().to_string());
    let referer: String = request.header("Referer").unwrap_or("-").to_string();
    let user_agent: String = request.header("User-Agent").unwrap_or("-").to_string();

    let now = chrono::Utc::now().format("%d/%m/%Y:%H:%M:%S%.6f");
    let log_ok = |req: &Request, resp: &Response, elap: Duration| {
        let line = format!(
            r#"{} - - [{}] "{} {}" {} {} "{}" "{}""#,
            remote_ip,
            now,
            req.method(),
            req.raw_url(),
            resp.status_code,
            0,
            referer,
            user_agent
        );
        debug!("{}", line);
        log_to_file(&format!("{}/access.log", settings.log_dir), &line);
        if elap > settings.slow_request_warning {
            warn!(
                "slow request ({}): {} {}",
                humantime::format_duration(elap),
                req.method(),
                req.raw_url()
            );
        }
        if let Some(metrics) = metrics {
            metrics.observe(route_label(&req.url()), resp.status_code);
        }
    };
    let log_err = |req: &Request, _elap: Duration| {
        let line = format!("{} {} Handler panicked: {} {}", remote_ip, now, req.method(), req.raw_url());
        debug!("{}", line);
        log_to_file(&format!("{}/error.log", settings.log_dir), &line);
    };
    rouille::log_custom(request, log_ok, log_err, || {
        let result = handle_connection_internal(state, metrics, settings, request);
        match result {
            Ok(response) => response,
            Err(err) => {
                error!("{} {}: {}", request.method(), request.raw_url(), err);
                Response::text(err.to_string()).with_status_code(500)
            }
        }
    })
}

fn chart_error_response(err: ChartError) -> ApiResponse {
    match err {
        ChartError::UnknownChart(_) => ApiResponse::NotFound,
        ChartError::InvalidOption(..) => ApiResponse::BadRequest(err.to_string()),
        _ => {
            warn!("{}", err);
            ApiResponse::ServerError(err.to_string())
        }
    }
}

fn encode_chart(
    state: &DashboardState,
    name: &str,
    format: &str,
    ppp: &RequestParameters,
) -> Result<ApiResponse, Box<dyn Error>> {
    if format != "json" {
        return Ok(ApiResponse::UnknownContentType);
    }
    let kind = match ChartKind::from_name(name) {
        Some(kind) => kind,
        None => return Ok(chart_error_response(ChartError::UnknownChart(name.to_string()))),
    };
    let options = ChartOptions {
        max_markers: state.map_markers,
        ..Default::default()
    }
    .with_params(ppp.get_str("year"), ppp.get_str("regions"), ppp.get_str("metric"));
    let result = options.and_then(|options| charts::render(kind, &state.stations, &state.adoption, &options));
    match result {
        Ok(figure) => Ok(ApiResponse::Text(serde_json::to_string(&figure)?, CONTENT_JSON)),
        Err(err) => Ok(chart_error_response(err)),
    }
}

fn encode_summary(state: &DashboardState, year: Option<i32>, format: &str) -> Result<ApiResponse, Box<dyn Error>> {
    let cards: Vec<KpiCard> = summary_stats(&state.adoption, year)
        .map(|stats| kpi_cards(&stats))
        .unwrap_or_default();
    ApiResponse::from_list(&cards, format)
}

fn encode_quality(state: &DashboardState, format: &str) -> Result<ApiResponse, Box<dyn Error>> {
    if format != "json" {
        return Ok(ApiResponse::UnknownContentType);
    }
    Ok(match state.report {
        Some(ref report) => ApiResponse::Text(serde_json::to_string(report)?, CONTENT_JSON),
        None => ApiResponse::NotFound,
    })
}

fn encode_stations(
    state: &DashboardState,
    ppp: &RequestParameters,
    format: &str,
) -> Result<ApiResponse, Box<dyn Error>> {
    let offset = ppp.get_number("offset", 0);
    let limit = ppp.get_number("limit", DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let page = state.stations.page(ppp.get_str("countrycode"), offset, limit);
    ApiResponse::from_list(&page, format)
}

fn handle_connection_internal(
    state: &DashboardState,
    metrics: Option<&RequestMetrics>,
    settings: &ServerSettings,
    request: &Request,
) -> Result<Response, Box<dyn Error>> {
    if request.method() != "GET" {
        return Ok(Response::empty_404());
    }

    let ppp = RequestParameters::new(request);
    let year: Option<i32> = match ppp.get_parsed("year") {
        Ok(year) => year,
        Err(err) => return Ok(add_cors(ApiResponse::BadRequest(err.to_string()).into_response())),
    };

    let url = request.url();
    let items: Vec<&str> = url.split('/').collect();
    let static_dir = &settings.static_dir;
    if items.len() == 2 {
        let file_name = items[1];
        match file_name {
            "metrics" => match metrics {
                Some(metrics) => Ok(metrics.render()?),
                None => Ok(ApiResponse::Locked(String::from("Exporter not enabled!")).into_response()),
            },
            "favicon.ico" => Ok(send_file(&format!("{}/{}", static_dir, "favicon.ico"), "image/png")),
            "main.css" => Ok(send_file(&format!("{}/{}", static_dir, "main.css"), "text/css")),
            "" => Ok(Response::html(state.render_dashboard()?).with_no_cache()),
            _ => Ok(Response::empty_404()),
        }
    } else if items.len() == 3 {
        let format = items[1];
        let command = items[2];

        let response = match command {
            "charts" => ApiResponse::from_list(&ApiChart::all(), format)?,
            "summary" => encode_summary(state, year, format)?,
            "quality" => encode_quality(state, format)?,
            "countries" => ApiCountry::get_response(state.stations.count_by_country(year), format)?,
            "stations" => encode_stations(state, &ppp, format)?,
            "regions" => ApiResponse::from_list(&ApiRegion::list(&state.adoption), format)?,
            _ => ApiResponse::NotFound,
        };
        Ok(add_cors(response.into_response()))
    } else if items.len() == 4 && items[2] == "charts" {
        let format = items[1];
        let chart = items[3];
        Ok(add_cors(encode_chart(state, chart, format, &ppp)?.into_response()))
    } else {
        Ok(Response::empty_404())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{sample_adoption, sample_stations};
    use crate::merge::MergeReport;

    fn state() -> DashboardState {
        let mut state = DashboardState::new(
            sample_stations(),
            sample_adoption(),
            Some(MergeReport::default()),
            5000,
        );
        state
            .register_templates(concat!(env!("CARGO_MANIFEST_DIR"), "/static"))
            .unwrap();
        state
    }

    fn settings(log_dir: &str) -> ServerSettings {
        ServerSettings {
            static_dir: String::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            log_dir: log_dir.to_string(),
            slow_request_warning: Duration::from_secs(10),
        }
    }

    fn get(state: &DashboardState, url: &str) -> (u16, String) {
        let request = Request::fake_http("GET", url, vec![], vec![]);
        let response = handle_connection_internal(state, None, &settings("/tmp"), &request).unwrap();
        let status = response.status_code;
        let mut body = String::new();
        response.data.into_reader_and_size().0.read_to_string(&mut body).unwrap();
        (status, body)
    }

    #[test]
    fn chart_routes() {
        let state = state();
        let (status, body) = get(&state, "/json/charts");
        assert_eq!(status, 200);
        let list: Vec<ApiChart> = serde_json::from_str(&body).unwrap();
        assert_eq!(list.len(), ChartKind::ALL.len());

        let (status, body) = get(&state, "/json/charts/timeseries?regions=Norway&metric=total_stations");
        assert_eq!(status, 200);
        let figure: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(figure["data"][0]["name"], "Norway");
        assert!(figure["layout"].is_object());

        let (status, body) = get(&state, "/json/charts/adoption_map?year=2021");
        assert_eq!(status, 200);
        let figure: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(figure["data"][0]["locations"], serde_json::json!(["CHN", "NOR", "USA"]));
        assert_eq!(figure["layout"]["meta"]["year"], 2021);

        assert_eq!(get(&state, "/csv/charts/timeseries").0, 406);
        assert_eq!(get(&state, "/json/charts/pie").0, 404);
        assert_eq!(get(&state, "/json/charts/timeseries?metric=speed").0, 400);
        assert_eq!(get(&state, "/json/charts/correlation?year=1990").0, 500);
    }

    #[test]
    fn table_routes() {
        let state = state();
        let (status, body) = get(&state, "/csv/countries?year=2019");
        assert_eq!(status, 200);
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines[0], "name,iso_3166_1,stationcount,connectorcount");
        assert_eq!(lines.len(), 3);

        let (_, body) = get(&state, "/json/stations?countrycode=DE&limit=1");
        let stations: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(stations.as_array().unwrap().len(), 1);
        assert_eq!(stations[0]["id"], 1);

        let (_, body) = get(&state, "/json/summary");
        let cards: Vec<KpiCard> = serde_json::from_str(&body).unwrap();
        assert_eq!(cards.len(), 4);

        assert_eq!(get(&state, "/json/quality").0, 200);
        assert_eq!(get(&state, "/csv/quality").0, 406);
        assert_eq!(get(&state, "/json/regions").0, 200);
        assert_eq!(get(&state, "/xml/regions").0, 406);
        assert_eq!(get(&state, "/json/summary?year=later").0, 400);
        assert_eq!(get(&state, "/json/unknown").0, 404);
        assert_eq!(get(&state, "/a/b/c/d/e").0, 404);
    }

    #[test]
    fn dashboard_page() {
        let state = state();
        let (status, body) = get(&state, "/");
        assert_eq!(status, 200);
        assert!(body.contains("EV Adoption Trends Over Time"));
        assert!(body.contains("/json/charts/choropleth"));
        assert!(body.contains("Global EV Stock by Country"));
        assert_eq!(get(&state, "/metrics").0, 423);
    }

    #[test]
    fn access_log_and_counters() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().to_str().unwrap();
        let state = state();
        let metrics = RequestMetrics::new("test_").unwrap();
        let request = Request::fake_http("GET", "/json/regions", vec![], vec![]);
        let response = handle_connection(&state, Some(&metrics), &settings(log_dir), &request);
        assert_eq!(response.status_code, 200);

        let access = std::fs::read_to_string(dir.path().join("access.log")).unwrap();
        assert!(access.contains("\"GET /json/regions\" 200"));
        let mut text = String::new();
        metrics
            .render()
            .unwrap()
            .data
            .into_reader_and_size()
            .0
            .read_to_string(&mut text)
            .unwrap();
        assert!(text.contains("test_requests_total{route=\"regions\",status=\"200\"} 1"));
        assert_eq!(route_label("/json/charts/timeline"), "chart");
        assert_eq!(route_label("/"), "dashboard");
    }
}
