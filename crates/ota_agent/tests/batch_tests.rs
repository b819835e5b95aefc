//! Batch ordering and failure policy.

mod support;

use ota_agent::{run_batch, Dispatcher, FailurePolicy, OtaError, Outcome};
use ota_common::{ActionKind, SkipReason};
use support::*;

#[test]
fn test_directives_run_in_server_order() {
    let (_dir, config) = test_config();
    let device = FakeDevice::new()
        .with_package("tv.example.one", 1)
        .with_package("tv.example.two", 4);
    let fetcher = FakeFetcher::new(config.paths.clone());
    let dispatcher = Dispatcher::new(&device, &fetcher, &config);

    let directives = vec![
        package_directive(ActionKind::Uninstall, "tv.example.two", 0),
        package_directive(ActionKind::Uninstall, "tv.example.one", 0),
    ];
    let report = run_batch(&dispatcher, &directives, FailurePolicy::Abort);

    assert!(report.is_success());
    assert_eq!(
        device.calls(),
        vec![
            "pm uninstall tv.example.two".to_string(),
            "pm uninstall tv.example.one".to_string(),
        ]
    );
    assert_eq!(report.reports[0].index, 0);
    assert_eq!(report.reports[1].index, 1);
}

#[test]
fn test_abort_stops_at_first_failure() {
    let (_dir, config) = test_config();
    let device = FakeDevice::new()
        .with_digest(BAD_MD5)
        .with_package("tv.example.keep", 2);
    let fetcher = FakeFetcher::new(config.paths.clone());
    let dispatcher = Dispatcher::new(&device, &fetcher, &config);

    let directives = vec![
        package_directive(ActionKind::Upgrade, "tv.example.app", 1),
        package_directive(ActionKind::Install, "tv.example.app", 1),
        package_directive(ActionKind::Uninstall, "tv.example.keep", 0),
        package_directive(ActionKind::Uninstall, "tv.example.keep", 0),
    ];
    let report = run_batch(&dispatcher, &directives, FailurePolicy::Abort);

    assert!(!report.is_success());
    assert_eq!(report.reports.len(), 2);
    assert_eq!(report.not_attempted, 2);
    assert!(matches!(report.reports[0].result, Ok(Outcome::NoOp)));
    assert!(matches!(
        report.first_error(),
        Some(OtaError::ChecksumMismatch { .. })
    ));
    assert!(!device.called("pm uninstall"));
    assert_eq!(device.version_of("tv.example.keep"), Some(2));
}

#[test]
fn test_continue_attempts_every_directive() {
    let (_dir, config) = test_config();
    let device = FakeDevice::new().with_package("tv.example.keep", 2);
    let fetcher = FakeFetcher::failing(config.paths.clone());
    let dispatcher = Dispatcher::new(&device, &fetcher, &config);

    let directives = vec![
        package_directive(ActionKind::Install, "tv.example.app", 1),
        package_directive(ActionKind::Install, "tv.example.keep", 2),
        package_directive(ActionKind::Uninstall, "tv.example.keep", 0),
    ];
    let report = run_batch(&dispatcher, &directives, FailurePolicy::Continue);

    assert!(!report.is_success());
    assert_eq!(report.reports.len(), 3);
    assert_eq!(report.not_attempted, 0);
    assert_eq!(report.failures().count(), 1);
    assert!(matches!(
        report.reports[1].result,
        Ok(Outcome::Skipped(SkipReason::UpToDate))
    ));
    assert!(matches!(report.reports[2].result, Ok(Outcome::Removed { .. })));
    assert_eq!(device.version_of("tv.example.keep"), None);
}

#[test]
fn test_report_labels_follow_directives() {
    let (_dir, config) = test_config();
    let device = FakeDevice::new();
    let fetcher = FakeFetcher::new(config.paths.clone());
    let dispatcher = Dispatcher::new(&device, &fetcher, &config);

    let directives = vec![package_directive(ActionKind::Upgrade, "tv.example.app", 9)];
    let report = run_batch(&dispatcher, &directives, FailurePolicy::default());

    assert_eq!(report.reports[0].label, directives[0].label());
    assert!(report.is_success());
}

#[test]
fn test_empty_batch() {
    let (_dir, config) = test_config();
    let device = FakeDevice::new();
    let fetcher = FakeFetcher::new(config.paths.clone());
    let dispatcher = Dispatcher::new(&device, &fetcher, &config);

    let report = run_batch(&dispatcher, &[], FailurePolicy::Abort);

    assert!(report.is_success());
    assert!(report.reports.is_empty());
    assert!(device.calls().is_empty());
}
