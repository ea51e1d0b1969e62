//! Wiremock integration tests for the upstream client.

use std::time::Duration;

use chrono::{FixedOffset, NaiveDate};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use noaa_client::{HttpClient, HttpClientOptions, NoaaApi};
use tide_common::TideType;

fn api_for(server: &MockServer) -> NoaaApi {
    api_with_retries(server, 3)
}

fn api_with_retries(server: &MockServer, max_retries: u32) -> NoaaApi {
    let http = HttpClient::new(HttpClientOptions {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        max_retries,
        initial_backoff: Duration::from_millis(5),
    })
    .expect("client should build");
    NoaaApi::new(http)
}

fn pst() -> FixedOffset {
    FixedOffset::west_opt(8 * 3600).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_station_list() -> serde_json::Value {
    serde_json::json!({
        "stationList": [
            {
                "stationId": "9447130",
                "name": "Seattle",
                "state": "WA",
                "region": "Puget Sound",
                "lat": 47.6062,
                "lon": -122.3321,
                "timeZoneCorr": "-8",
                "level": "",
                "stationType": "R"
            },
            {
                "stationId": "9446484",
                "name": "Tacoma",
                "state": "WA",
                "region": "",
                "lat": 47.269,
                "lon": -122.4138,
                "timeZoneCorr": "not-a-number",
                "level": "L1",
                "stationType": "S"
            }
        ]
    })
}

#[tokio::test]
async fn station_list_decodes_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mdapi/prod/webapi/tidepredstations.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_station_list()))
        .expect(1)
        .mount(&server)
        .await;

    let stations = api_for(&server).station_list().await.unwrap();

    assert_eq!(stations.len(), 2);
    let seattle = &stations[0];
    assert_eq!(seattle.id, "9447130");
    assert_eq!(seattle.time_zone_offset, -28_800);
    assert_eq!(seattle.level, None);
    assert_eq!(seattle.station_type.as_deref(), Some("R"));
    assert_eq!(seattle.capabilities, vec!["WATER_LEVEL".to_string()]);

    // Unparseable timeZoneCorr falls back to 0, empty region drops to None.
    let tacoma = &stations[1];
    assert_eq!(tacoma.time_zone_offset, 0);
    assert_eq!(tacoma.region, None);
    assert_eq!(tacoma.level.as_deref(), Some("L1"));
}

#[tokio::test]
async fn predictions_parse_station_local_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .and(query_param("interval", "6"))
        .and(query_param("station", "9447130"))
        .and(query_param("begin_date", "20240101"))
        .and(query_param("end_date", "20240101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [
                { "t": "2024-01-01 00:00", "v": "1.503" },
                { "t": "2024-01-01 00:06", "v": "1.521" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let predictions = api_for(&server)
        .predictions("9447130", day(2024, 1, 1), day(2024, 1, 1), &pst())
        .await
        .unwrap();

    assert_eq!(predictions.len(), 2);
    // Midnight PST = 08:00 UTC.
    assert_eq!(predictions[0].timestamp, 1_704_096_000_000);
    assert_eq!(predictions[0].local_time, "2024-01-01T00:00:00");
    assert!((predictions[0].height - 1.503).abs() < 1e-9);
    assert_eq!(predictions[1].timestamp - predictions[0].timestamp, 360_000);
}

#[tokio::test]
async fn extremes_map_high_and_low() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .and(query_param("interval", "hilo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "predictions": [
                { "t": "2024-01-01 03:12", "v": "2.8", "type": "H" },
                { "t": "2024-01-01 09:45", "v": "0.3", "type": "L" }
            ]
        })))
        .mount(&server)
        .await;

    let extremes = api_for(&server)
        .extremes("9447130", day(2024, 1, 1), day(2024, 1, 1), &pst())
        .await
        .unwrap();

    assert_eq!(extremes.len(), 2);
    assert_eq!(extremes[0].kind, TideType::High);
    assert_eq!(extremes[1].kind, TideType::Low);
    assert_eq!(extremes[1].local_time, "2024-01-01T09:45:00");
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mdapi/prod/webapi/tidepredstations.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = api_for(&server).station_list().await.unwrap_err();
    assert_eq!(err.kind(), "upstream-error");
    assert_eq!(err.http_status(), 502);
}

#[tokio::test]
async fn server_error_is_retried_then_surfaced() {
    let server = MockServer::start().await;
    // Initial attempt plus two retries.
    Mock::given(method("GET"))
        .and(path("/mdapi/prod/webapi/tidepredstations.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = api_with_retries(&server, 2).station_list().await.unwrap_err();
    assert_eq!(err.kind(), "upstream-error");
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn retry_recovers_from_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mdapi/prod/webapi/tidepredstations.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mdapi/prod/webapi/tidepredstations.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_station_list()))
        .expect(1)
        .mount(&server)
        .await;

    let stations = api_for(&server).station_list().await.unwrap();
    assert_eq!(stations.len(), 2);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .predictions("9447130", day(2024, 1, 1), day(2024, 1, 1), &pst())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "decode-error");
}

#[tokio::test]
async fn upstream_no_data_body_yields_empty_series() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/prod/datagetter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "error": { "message": "No Predictions data was found." }
        })))
        .mount(&server)
        .await;

    let extremes = api_for(&server)
        .extremes("9447130", day(2024, 1, 1), day(2024, 1, 1), &pst())
        .await
        .unwrap();
    assert!(extremes.is_empty());
}
