use std::fs;
use tracing::{error, info};

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // 14:30 UTC on 2023-01-03, 2023-01-31, 2023-02-01 and 2023-02-28
    pub const TIMESTAMPS: [i64; 4] = [1672756200, 1675175400, 1675261800, 1677594600];

    pub fn chart_response(prices: &[Option<f64>]) -> String {
        let count = prices.len();
        let timestamps: Vec<String> = TIMESTAMPS[..count].iter().map(|t| t.to_string()).collect();
        let values: Vec<String> = prices
            .iter()
            .map(|p| p.map_or("null".to_string(), |v| v.to_string()))
            .collect();
        let values = values.join(", ");
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{ "currency": "USD", "gmtoffset": -18000 }},
                        "timestamp": [{}],
                        "indicators": {{
                            "quote": [{{ "close": [{values}] }}],
                            "adjclose": [{{ "adjclose": [{values}] }}]
                        }}
                    }}],
                    "error": null
                }}
            }}"#,
            timestamps.join(", ")
        )
    }

    pub async fn mount_symbol(server: &MockServer, encoded_symbol: &str, prices: &[Option<f64>]) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{encoded_symbol}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(chart_response(prices)))
            .mount(server)
            .await;
    }

    pub async fn create_mock_server() -> MockServer {
        let server = MockServer::start().await;
        mount_symbol(
            &server,
            "%5EGSPC",
            &[Some(3800.0), Some(4000.0), Some(4000.0), Some(4100.0)],
        )
        .await;
        mount_symbol(
            &server,
            "AAA",
            &[Some(100.0), Some(110.0), Some(110.0), Some(99.0)],
        )
        .await;
        mount_symbol(&server, "BBB", &[Some(50.0), Some(55.0), None, None]).await;
        mount_symbol(&server, "CCC", &[Some(20.0), Some(20.0), Some(20.0), Some(25.0)]).await;
        mount_symbol(&server, "DDD", &[Some(10.0), Some(9.0), Some(9.0), Some(9.9)]).await;
        server
    }

    pub fn write_config(dir: &std::path::Path, base_url: &str, extra: &str) -> std::path::PathBuf {
        let config_path = dir.join("config.yaml");
        let config_content = format!(
            r#"
providers:
  yahoo:
    base_url: {base_url}
tickers: "aaa, bbb, ccc, ddd"
start_date: 2023-01-01
{extra}
"#
        );
        std::fs::write(&config_path, config_content).expect("Failed to write config file");
        config_path
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("out").join("monthly.csv");
    let chart_path = temp_dir.path().join("out").join("monthly.svg");
    let config_path = test_utils::write_config(
        temp_dir.path(),
        &mock_server.uri(),
        &format!(
            "output:\n  csv_path: {}\n  chart_path: {}\n",
            csv_path.display(),
            chart_path.display()
        ),
    );

    let result = idxcmp::run_command(
        idxcmp::AppCommand::Report(idxcmp::ReportArgs::default()),
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );

    let csv = fs::read_to_string(&csv_path).expect("CSV should be written");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Date,Index Open,Index Close,Index % Change,AAA % Chg,BBB % Chg,CCC % Chg,DDD % Chg"
    );
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("2023-01-31,3800,4000,5.26"));
    // BBB has no February prices, so only its column is empty
    let february: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(february[0], "2023-02-28");
    assert_eq!(february[1], "4000");
    assert_eq!(february[2], "4100");
    assert_eq!(february[5], "");
    assert_eq!(february[6], "25");
    assert!(!february[7].is_empty());

    let svg = fs::read_to_string(&chart_path).expect("Chart should be written");
    assert!(svg.contains("BBB % Chg"));
}

#[test_log::test(tokio::test)]
async fn test_report_service_against_mock_yahoo() {
    use idxcmp::core::{PriceField, ReportService};
    use idxcmp::providers::YahooFinanceProvider;

    let mock_server = test_utils::create_mock_server().await;
    let provider = YahooFinanceProvider::new(&mock_server.uri(), PriceField::AdjustedClose)
        .expect("Failed to build provider");
    let service = ReportService::new(&provider);
    let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

    let report = service
        .report("AAA, BBB, CCC, DDD", start)
        .await
        .expect("report should succeed");

    assert_eq!(report.records.len(), 2);
    let jan = &report.records[0];
    assert!((jan.index_change.unwrap() - 5.26).abs() < 0.005);
    assert!((jan.symbol_changes[0].unwrap() - 10.0).abs() < 1e-9);

    let feb = &report.records[1];
    assert_eq!(feb.symbol_changes[1], None);
    assert!((feb.symbol_changes[2].unwrap() - 25.0).abs() < 1e-9);

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 5);

    // an identical query does not reach the server again
    service
        .report("aaa,bbb,ccc,ddd", start)
        .await
        .expect("cached report should succeed");
    let received = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 5);
}

#[test_log::test(tokio::test)]
async fn test_unknown_symbol_surfaces_data_unavailable() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), "");

    let result = idxcmp::run_command(
        idxcmp::AppCommand::Report(idxcmp::ReportArgs {
            tickers: Some("AAA, BBB, CCC, ZZZ".to_string()),
            ..Default::default()
        }),
        Some(config_path.to_str().unwrap()),
    )
    .await;

    let err = result.expect_err("unknown symbol should fail the query");
    let message = err.to_string();
    assert!(message.starts_with("Error fetching data"), "{message}");
    assert!(message.contains("ZZZ"), "{message}");
    assert!(message.contains("HTTP error: 404"), "{message}");
}

#[test_log::test(tokio::test)]
async fn test_wrong_ticker_count_skips_fetch() {
    let mock_server = test_utils::create_mock_server().await;
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let config_path = test_utils::write_config(temp_dir.path(), &mock_server.uri(), "");

    for tickers in ["AAA, BBB, CCC", "AAA, BBB, CCC, DDD, EEE"] {
        let result = idxcmp::run_command(
            idxcmp::AppCommand::Report(idxcmp::ReportArgs {
                tickers: Some(tickers.to_string()),
                ..Default::default()
            }),
            Some(config_path.to_str().unwrap()),
        )
        .await;
        assert!(result.is_ok(), "validation is reported, not raised");
    }

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file_fails() {
    let result = idxcmp::run_command(
        idxcmp::AppCommand::Report(idxcmp::ReportArgs::default()),
        Some("/nonexistent/idxcmp/config.yaml"),
    )
    .await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
#[ignore = "hits the live Yahoo Finance API"]
async fn test_real_yahoo_finance_api() {
    use idxcmp::core::{PriceField, PriceSource};
    use idxcmp::providers::YahooFinanceProvider;

    let base_url = "https://query1.finance.yahoo.com";
    let provider = YahooFinanceProvider::new(base_url, PriceField::AdjustedClose)
        .expect("Failed to build provider");
    let start = chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();

    let symbol = "^GSPC";
    info!(?symbol, "Fetching daily prices from Yahoo Finance");

    match provider.fetch_history(symbol, start).await {
        Ok(series) => {
            info!(days = series.len(), "Received successful price response");
            assert!(!series.is_empty(), "History should not be empty");
            assert!(series.values().all(|p| *p > 0.0), "Prices should be positive");
        }
        Err(e) => {
            error!("API request failed: {e}\n{e:?}");
            panic!("API request failed: {e}");
        }
    }
}
