mod common;

use common::{actuals_grid, budget_grid, test_config, TestApp};
use reporting_service::services::{GoogleSheetsClient, ReportError, SheetSource};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SPREADSHEET_ID: &str = "sheet-123";

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

async fn mount_drive_lookup(server: &MockServer, files: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param(
            "q",
            "name = 'BRFC Financial Reporting Analysis' and \
             mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "files": files })))
        .mount(server)
        .await;
}

async fn mount_values(server: &MockServer, tab: &str, values: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path_regex(format!(
            r"^/spreadsheets/{}/values/.*{}.*$",
            SPREADSHEET_ID, tab
        )))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("valueRenderOption", "FORMATTED_VALUE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": format!("'{}'!A1:Z1000", tab),
            "majorDimension": "ROWS",
            "values": values
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetches_tabs_after_looking_up_the_spreadsheet_by_name() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_drive_lookup(&server, json!([{ "id": SPREADSHEET_ID, "name": "BRFC" }])).await;
    mount_values(&server, "FY2025Budget", json!(budget_grid())).await;
    mount_values(&server, "AccountTransactions", json!(actuals_grid())).await;

    let client = GoogleSheetsClient::new(&test_config(&server.uri()).google).unwrap();
    let grids = client
        .fetch_tabs(&["FY2025Budget", "AccountTransactions"])
        .await
        .unwrap();

    assert_eq!(grids.len(), 2);
    assert_eq!(grids[0][0][0], "Account");
    assert_eq!(grids[1][3][0], "Date");
}

#[tokio::test]
async fn configured_spreadsheet_id_skips_drive() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_values(&server, "Ledger", json!([["Date", "Account Name", "Net"]])).await;
    Mock::given(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.google.spreadsheet_id = Some(SPREADSHEET_ID.to_string());

    let client = GoogleSheetsClient::new(&config.google).unwrap();
    let grids = client.fetch_tabs(&["Ledger"]).await.unwrap();

    assert_eq!(grids[0][0].len(), 3);
}

#[tokio::test]
async fn empty_tab_yields_no_rows() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/spreadsheets/sheet-123/values/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "'Empty'!A1:Z1000",
            "majorDimension": "ROWS"
        })))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.google.spreadsheet_id = Some(SPREADSHEET_ID.to_string());

    let client = GoogleSheetsClient::new(&config.google).unwrap();
    let grids = client.fetch_tabs(&["Empty"]).await.unwrap();
    assert!(grids[0].is_empty());
}

#[tokio::test]
async fn unknown_spreadsheet_name_is_a_fetch_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_drive_lookup(&server, json!([])).await;

    let client = GoogleSheetsClient::new(&test_config(&server.uri()).google).unwrap();
    let err = client.fetch_tabs(&["FY2025Budget"]).await.unwrap_err();

    match err {
        ReportError::DataFetch(msg) => assert!(msg.contains("not found"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_exchange_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let client = GoogleSheetsClient::new(&test_config(&server.uri()).google).unwrap();
    let err = client.fetch_tabs(&["FY2025Budget"]).await.unwrap_err();

    assert_eq!(err.kind(), "data_fetch_error");
}

#[tokio::test]
async fn report_endpoint_runs_against_google() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_drive_lookup(&server, json!([{ "id": SPREADSHEET_ID }])).await;
    mount_values(&server, "FY2025Budget", json!(budget_grid())).await;
    mount_values(&server, "AccountTransactions", json!(actuals_grid())).await;

    let app = TestApp::spawn_with(test_config(&server.uri()), None).await;
    let response = reqwest::Client::new()
        .post(format!("{}/run-report", app.address))
        .json(&json!({ "reporting_month": "March" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["operating_expenses"]["actual"], -100.0);
    assert_eq!(body["bottom_line"]["actual"], 1350.0);
}

#[tokio::test]
async fn report_endpoint_maps_sheet_errors_to_bad_gateway() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_drive_lookup(&server, json!([{ "id": SPREADSHEET_ID }])).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/spreadsheets/sheet-123/values/.*$"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "The caller does not have permission" }
        })))
        .mount(&server)
        .await;

    let app = TestApp::spawn_with(test_config(&server.uri()), None).await;
    let response = reqwest::Client::new()
        .post(format!("{}/run-report", app.address))
        .json(&json!({ "reporting_month": "March" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 502);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("403"));
}
