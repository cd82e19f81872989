use chrono::{Duration, TimeZone, Utc};

use jobgraph_core::{CycleEvaluator, ScheduleError};
use jobgraph_engine::CronCycleEvaluator;

#[test]
fn test_next_time_is_boundary_plus_offsets() {
    let evaluator = CronCycleEvaluator;
    let from = Utc.with_ymd_and_hms(2026, 1, 1, 10, 30, 0).unwrap();

    // 每小时整点，偏移 60 秒
    let next = evaluator
        .next_time("0 0 * * * *", &[Duration::seconds(60)], from)
        .unwrap();

    assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 11, 1, 0).unwrap());
}

#[test]
fn test_next_time_sums_multiple_offsets() {
    let evaluator = CronCycleEvaluator;
    let from = Utc.with_ymd_and_hms(2026, 1, 1, 10, 30, 0).unwrap();

    let next = evaluator
        .next_time(
            "0 0 * * * *",
            &[Duration::seconds(30), Duration::minutes(2)],
            from,
        )
        .unwrap();

    assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 11, 2, 30).unwrap());
}

#[test]
fn test_next_time_is_deterministic_for_fixed_base() {
    let evaluator = CronCycleEvaluator;
    let from = Utc.with_ymd_and_hms(2026, 1, 1, 10, 30, 0).unwrap();

    let a = evaluator.next_time("0 0 0 * * *", &[], from).unwrap();
    let b = evaluator.next_time("0 0 0 * * *", &[], from).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap());
}

#[test]
fn test_malformed_cycle_spec_is_an_error() {
    let evaluator = CronCycleEvaluator;
    let from = Utc.with_ymd_and_hms(2026, 1, 1, 10, 30, 0).unwrap();

    let err = evaluator.next_time("not a cycle", &[], from).unwrap_err();
    assert!(matches!(err, ScheduleError::InvalidCycle { .. }));
}

#[test]
fn test_validate_cycle_expression() {
    assert!(CronCycleEvaluator::validate_cycle_expression("0 0 * * * *").is_ok());
    assert!(CronCycleEvaluator::validate_cycle_expression("every hour").is_err());
}
