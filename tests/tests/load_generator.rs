use mock_service::MockConfig;
use std::collections::HashSet;
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;
use tokio::time::timeout;
use volley::prelude::*;
use volley::IterationError;
use volley_tests::*;

const ASSERTION_MESSAGE: &str = "assertion statusCode === 200 failed";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

#[tokio::test]
async fn every_request_carries_the_fixed_form() {
    init();
    let handle = mock(MockConfig::default()).await.unwrap();
    let generator = generator_for(&handle).unwrap();

    let report = generator.run(25, true).await;
    assert!(report.is_success(), "{:?}", report.errors);

    let requests = handle.requests();
    assert_eq!(requests.len(), 25);
    for request in requests {
        assert_eq!(request.method, "POST");
        assert_eq!(request.content_type.as_deref(), Some(FORM_CONTENT_TYPE));
        assert_eq!(request.body, "salt=benchmark");
    }
}

#[tokio::test]
async fn success_statuses_pass() {
    init();
    for status in [200u16, 201, 204, 299] {
        let config = MockConfig::default().status(status.try_into().unwrap());
        let handle = mock(config).await.unwrap();
        let generator = generator_for(&handle).unwrap();

        generator
            .run_iteration()
            .await
            .unwrap_or_else(|err| panic!("{status} should pass: {err}"));
        assert_eq!(handle.request_count(), 1);
    }
}

#[tokio::test]
async fn non_success_statuses_fail_the_assertion() {
    init();
    for status in [404u16, 500, 403, 429] {
        let config = MockConfig::default().status(status.try_into().unwrap());
        let handle = mock(config).await.unwrap();
        let generator = generator_for(&handle).unwrap();

        let err = generator.run_iteration().await.unwrap_err();
        assert_eq!(err.to_string(), ASSERTION_MESSAGE);
        assert_eq!(err.status().map(|s| s.as_u16()), Some(status));
    }
}

#[tokio::test]
async fn unreachable_target_is_a_transport_error() {
    init();
    let generator = LoadGenerator::new(&unreachable_url().await.unwrap()).unwrap();

    let err = generator.run_iteration().await.unwrap_err();
    assert!(matches!(err, IterationError::Http(_)), "{err:?}");
    assert_ne!(err.to_string(), ASSERTION_MESSAGE);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_run_sends_exactly_the_requested_count() {
    init();
    let handle = mock(MockConfig::default()).await.unwrap();
    let generator = generator_for(&handle).unwrap();

    let report = timeout(Duration::from_secs(30), generator.run(500, true))
        .await
        .expect("run timed out");

    assert_eq!(handle.request_count(), 500);
    assert_eq!(report.stats.repetitions, 500);
    assert_eq!(report.stats.succeeded, 500);
    assert!(report.ensure_success().is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_run_surfaces_injected_failure() {
    init();
    let handle = mock(MockConfig::default().fail_on(3)).await.unwrap();
    let generator = generator_for(&handle).unwrap();

    let report = timeout(Duration::from_secs(30), generator.run(500, true))
        .await
        .expect("run timed out");

    assert!(report.stats.failed >= 1);
    assert!(report.errors.iter().any(|e| e == ASSERTION_MESSAGE));

    let err = report.ensure_success().unwrap_err();
    assert!(err.to_string().ends_with(ASSERTION_MESSAGE));
}

#[tokio::test]
async fn sequential_run_attempts_every_iteration() {
    init();
    let handle = mock(MockConfig::default().fail_on(2)).await.unwrap();
    let generator = generator_for(&handle).unwrap();

    let report = generator.run(10, false).await;
    assert_eq!(handle.request_count(), 10);
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.succeeded, 9);
    assert_eq!(report.errors, vec![ASSERTION_MESSAGE.to_string()]);
}

#[tokio::test]
async fn unreachable_target_fails_every_iteration() {
    init();
    let generator = LoadGenerator::new(&unreachable_url().await.unwrap()).unwrap();

    let report = generator.run(5, true).await;
    assert_eq!(report.stats.failed, 5);
    assert!(report.errors.iter().all(|e| e != ASSERTION_MESSAGE));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn tps_limit_paces_the_run() {
    init();
    let handle = mock(MockConfig::default()).await.unwrap();
    let generator = generator_for(&handle).unwrap();
    let config = SuiteConfig::new().tps_limit(NonZeroU32::new(50).unwrap());

    let start = std::time::Instant::now();
    let report = generator.run_with(config, 11).await;

    assert!(report.is_success());
    assert!(start.elapsed() >= Duration::from_millis(180));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn overlapping_requests_reach_the_stub() {
    init();
    let handle = mock(MockConfig::default().delay(Duration::from_millis(50)))
        .await
        .unwrap();
    let generator = generator_for(&handle).unwrap();
    let config = SuiteConfig::new().concurrency(NonZeroUsize::new(20).unwrap());

    let start = std::time::Instant::now();
    let report = generator.run_with(config, 40).await;

    assert!(report.is_success());
    // 40 requests at 50ms each would take 2s if serialized.
    assert!(start.elapsed() < Duration::from_secs(1));
    let bodies: HashSet<_> = handle.requests().into_iter().map(|r| r.body).collect();
    assert_eq!(bodies.len(), 1);
}

#[tokio::test]
async fn truncated_body_fails_the_iteration() {
    init();
    let handle = mock(MockConfig::default().truncate_body()).await.unwrap();
    let generator = generator_for(&handle).unwrap();

    let err = generator.run_iteration().await.unwrap_err();
    assert!(matches!(err, IterationError::Http(_)), "{err:?}");
    assert_ne!(err.to_string(), ASSERTION_MESSAGE);
    assert_eq!(handle.request_count(), 1);
}

#[tokio::test]
async fn custom_descriptor_reaches_the_stub() {
    init();
    let handle = mock(MockConfig::default()).await.unwrap();
    let mut descriptor = RequestDescriptor::default();
    descriptor.body = "salt=custom".to_string();
    let generator = generator_for(&handle).unwrap().with_descriptor(descriptor);
    assert_eq!(generator.descriptor().body, "salt=custom");

    generator.run_iteration().await.unwrap();

    let requests = handle.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].body, "salt=custom");
    assert_eq!(requests[0].content_type.as_deref(), Some(FORM_CONTENT_TYPE));
}
