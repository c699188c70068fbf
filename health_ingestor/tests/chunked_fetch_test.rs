use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use health_ingestor::{
    Error,
    models::{
        ChunkSpan, DateRange, Granularity, MetricKind, MetricRegistry, UpstreamErrorKind,
    },
    observe::RecordingObserver,
    providers::{AuthenticatedClient, ProviderError},
    requests::historical::{
        FetchContext, FetchRequest, FetchResult, RetryConfig, fetch_series, fetch_summary,
        sleeper::RecordingSleeper,
    },
    testing::{ScriptedClient, heart_body, rate_limited, upstream_error},
};
use log::Level;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn heart_request(start: NaiveDate, end: NaiveDate) -> FetchRequest {
    let descriptor = MetricRegistry::standard()
        .descriptor(MetricKind::RestingHeartRate)
        .unwrap()
        .clone();
    FetchRequest::new(descriptor, start, end).with_retry(RetryConfig {
        max_attempts: 3,
        backoff_factor: Duration::from_millis(100),
    })
}

#[tokio::test]
async fn multi_year_range_is_fetched_chunk_by_chunk() {
    let client = ScriptedClient::new(vec![
        Ok(heart_body(&[("2022-01-05", Some(60)), ("2022-01-20", Some(64))])),
        Ok(rate_limited()),
        Ok(heart_body(&[("2023-02-10", Some(58)), ("2023-02-11", None)])),
        Ok(heart_body(&[("2024-03-01", Some(55))])),
    ]);
    let sleeper = RecordingSleeper::new();
    let observer = RecordingObserver::new();
    let ctx = FetchContext::new(&client, "https://api.test")
        .with_sleeper(&sleeper)
        .with_observer(&observer);

    let result = fetch_series(&ctx, &heart_request(d(2022, 1, 1), d(2024, 3, 31)), &CancellationToken::new())
        .await
        .unwrap();

    let report = result.data().expect("data");
    assert!(report.failures.is_empty());
    assert!(!report.cancelled);
    assert_eq!(report.series.len(), 5);
    assert_eq!(report.series.valued_len(), 4);
    assert_eq!(
        client.urls(),
        vec![
            "https://api.test/1/user/-/activities/heart/date/2022-01-01/2022-12-31.json",
            "https://api.test/1/user/-/activities/heart/date/2023-01-01/2023-12-31.json",
            "https://api.test/1/user/-/activities/heart/date/2023-01-01/2023-12-31.json",
            "https://api.test/1/user/-/activities/heart/date/2024-01-01/2024-03-31.json",
        ]
    );
    assert_eq!(sleeper.delays(), vec![Duration::from_millis(100)]);
    assert_eq!(observer.count(Level::Warn), 1);
}

#[tokio::test]
async fn failed_chunk_yields_partial_result() {
    let client = ScriptedClient::new(vec![
        Ok(heart_body(&[("2023-01-01", Some(60))])),
        Ok(upstream_error("insufficient_scope", "heartrate scope missing")),
    ]);
    let observer = RecordingObserver::new();
    let ctx = FetchContext::new(&client, "https://api.test").with_observer(&observer);
    let request = heart_request(d(2023, 1, 1), d(2023, 1, 20)).with_chunk_span(ChunkSpan::Days(10));

    let report = fetch_series(&ctx, &request, &CancellationToken::new())
        .await
        .unwrap()
        .data()
        .expect("partial data, not an empty result");

    assert_eq!(report.series.len(), 1);
    assert_eq!(report.series.records()[0].value, Some(60.0));
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].range, DateRange::new(d(2023, 1, 11), d(2023, 1, 20)).unwrap());
    assert_eq!(report.failures[0].kind, UpstreamErrorKind::InsufficientScope);
    assert_eq!(observer.count(Level::Error), 1);
}

#[tokio::test]
async fn every_chunk_failing_is_no_data_found() {
    let client = ScriptedClient::new(vec![
        Ok(upstream_error("system", "busy")),
        Ok(upstream_error("system", "still busy")),
        Ok(upstream_error("expired_token", "expired")),
    ]);
    let sleeper = RecordingSleeper::new();
    let ctx = FetchContext::new(&client, "https://api.test").with_sleeper(&sleeper);
    let request = heart_request(d(2023, 1, 1), d(2023, 1, 4))
        .with_chunk_span(ChunkSpan::Days(2))
        .with_retry(RetryConfig {
            max_attempts: 2,
            backoff_factor: Duration::from_secs(1),
        });

    let result = fetch_series(&ctx, &request, &CancellationToken::new()).await.unwrap();

    match result {
        FetchResult::NoDataFound { failures, cancelled } => {
            assert!(!cancelled);
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].kind, UpstreamErrorKind::RateLimited);
            assert_eq!(failures[0].message, "still busy");
            assert_eq!(failures[1].kind, UpstreamErrorKind::ExpiredToken);
        }
        other => panic!("expected NoDataFound, got {other:?}"),
    }
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(1)]);
}

#[tokio::test]
async fn summary_reports_monthly_and_yearly_means() {
    let client = ScriptedClient::new(vec![Ok(heart_body(&[
        ("2023-01-05", Some(60)),
        ("2023-01-20", Some(64)),
        ("2023-02-10", Some(58)),
        ("2023-02-11", None),
    ]))]);
    let ctx = FetchContext::new(&client, "https://api.test");

    let summary = fetch_summary(&ctx, &heart_request(d(2023, 1, 1), d(2023, 2, 28)), &CancellationToken::new())
        .await
        .unwrap()
        .data()
        .unwrap();

    let monthly: Vec<_> = summary.monthly.iter().map(|b| (b.label(), b.mean_value)).collect();
    assert_eq!(
        monthly,
        vec![("2023-01".to_string(), Some(62.0)), ("2023-02".to_string(), Some(58.0))]
    );
    assert_eq!(summary.yearly.len(), 1);
    assert_eq!(summary.yearly[0].granularity, Granularity::Year);
    assert_eq!(summary.yearly[0].mean_value, Some(182.0 / 3.0));
}

#[tokio::test]
async fn summary_of_valueless_days_is_no_data_found() {
    let client = ScriptedClient::new(vec![Ok(heart_body(&[
        ("2023-01-05", None),
        ("2023-01-06", None),
    ]))]);
    let observer = RecordingObserver::new();
    let ctx = FetchContext::new(&client, "https://api.test").with_observer(&observer);
    let request = heart_request(d(2023, 1, 1), d(2023, 1, 31));

    let summary = fetch_summary(&ctx, &request, &CancellationToken::new()).await.unwrap();
    assert_eq!(
        summary,
        FetchResult::NoDataFound {
            failures: vec![],
            cancelled: false
        }
    );
    assert_eq!(observer.count(Level::Error), 1);

    // the daily series still lists the days themselves
    let client = ScriptedClient::new(vec![Ok(heart_body(&[
        ("2023-01-05", None),
        ("2023-01-06", None),
    ]))]);
    let ctx = FetchContext::new(&client, "https://api.test");
    let series = fetch_series(&ctx, &request, &CancellationToken::new())
        .await
        .unwrap()
        .data()
        .unwrap();
    assert_eq!(series.series.len(), 2);
    assert_eq!(series.series.valued_len(), 0);
}

#[tokio::test]
async fn invalid_requests_fail_before_any_call() {
    let client = ScriptedClient::new(vec![]);
    let ctx = FetchContext::new(&client, "https://api.test");
    let cancel = CancellationToken::new();

    let inverted = heart_request(d(2023, 2, 1), d(2023, 1, 1));
    assert!(matches!(
        fetch_series(&ctx, &inverted, &cancel).await,
        Err(Error::InvalidRange { .. })
    ));

    let zero_span = heart_request(d(2023, 1, 1), d(2023, 2, 1)).with_chunk_span(ChunkSpan::Months(0));
    assert!(matches!(
        fetch_series(&ctx, &zero_span, &cancel).await,
        Err(Error::InvalidConfig(_))
    ));

    let no_attempts = heart_request(d(2023, 1, 1), d(2023, 2, 1)).with_retry(RetryConfig {
        max_attempts: 0,
        backoff_factor: Duration::ZERO,
    });
    assert!(matches!(
        fetch_series(&ctx, &no_attempts, &cancel).await,
        Err(Error::InvalidConfig(_))
    ));
    assert_eq!(client.calls(), 0);
}

/// Cancels the token as soon as the first request has been answered.
struct CancelAfterFirst {
    inner: ScriptedClient,
    token: CancellationToken,
}

#[async_trait]
impl AuthenticatedClient for CancelAfterFirst {
    async fn get(&self, url: &str) -> Result<Value, ProviderError> {
        let body = self.inner.get(url).await;
        self.token.cancel();
        body
    }
}

#[tokio::test]
async fn cancellation_stops_before_the_next_chunk() {
    let token = CancellationToken::new();
    let client = CancelAfterFirst {
        inner: ScriptedClient::new(vec![
            Ok(heart_body(&[("2023-01-01", Some(61))])),
            Ok(heart_body(&[("2023-01-02", Some(62))])),
        ]),
        token: token.clone(),
    };
    let ctx = FetchContext::new(&client, "https://api.test");
    let request = heart_request(d(2023, 1, 1), d(2023, 1, 3)).with_chunk_span(ChunkSpan::Days(1));

    let report = fetch_series(&ctx, &request, &token).await.unwrap().data().unwrap();

    assert!(report.cancelled);
    assert_eq!(report.series.len(), 1);
    assert_eq!(client.inner.calls(), 1);
}

#[tokio::test]
async fn already_cancelled_run_reports_no_data() {
    let client = ScriptedClient::new(vec![]);
    let ctx = FetchContext::new(&client, "https://api.test");
    let token = CancellationToken::new();
    token.cancel();

    let result = fetch_series(&ctx, &heart_request(d(2023, 1, 1), d(2023, 1, 3)), &token)
        .await
        .unwrap();

    assert_eq!(
        result,
        FetchResult::NoDataFound {
            failures: vec![],
            cancelled: true
        }
    );
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn sleep_nights_sum_naps_into_the_night_whatever_the_order() {
    let client = ScriptedClient::new(vec![Ok(json!({"sleep": [
        {"dateOfSleep": "2023-03-02", "minutesAsleep": 35, "isMainSleep": false},
        {"dateOfSleep": "2023-03-02", "minutesAsleep": 400, "isMainSleep": true},
        {"dateOfSleep": "2023-03-01", "minutesAsleep": 380, "isMainSleep": true}
    ]}))]);
    let observer = RecordingObserver::new();
    let ctx = FetchContext::new(&client, "https://api.test").with_observer(&observer);
    let descriptor = MetricRegistry::standard().descriptor(MetricKind::Sleep).unwrap().clone();
    let request = FetchRequest::new(descriptor, d(2023, 3, 1), d(2023, 3, 2));

    let report = fetch_series(&ctx, &request, &CancellationToken::new())
        .await
        .unwrap()
        .data()
        .unwrap();

    assert_eq!(
        client.urls(),
        vec!["https://api.test/1.2/user/-/sleep/date/2023-03-01/2023-03-02.json"]
    );
    let values: Vec<_> = report.series.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![Some(380.0), Some(435.0)]);
    assert!(observer.events().is_empty());
}
