use chrono::{Duration, TimeZone, Utc};

use jobgraph_core::{DependencyTimePolicy, ScheduleError};
use jobgraph_engine::Schedule;
use jobgraph_testing_utils::{FixedCycleEvaluator, TaskBuilder};

#[test]
fn test_resolve_with_absent_dependency_is_tolerated() {
    let schedule = Schedule::new();
    let mut task = TaskBuilder::new().with_id(1).build();

    schedule.resolve_dependencies(&mut task, vec![99]);

    assert_eq!(task.resolved_dep_count, 0);
    assert_eq!(task.dep_ids, vec![99]);
    assert_eq!(task.deps.get("99"), Some(&None));
}

#[test]
fn test_resolution_is_idempotent_against_unchanged_schedule() {
    let mut schedule = Schedule::new();
    schedule.add_task_list(TaskBuilder::new().with_id(10).build());

    let mut task = TaskBuilder::new().with_id(1).build();
    schedule.resolve_dependencies(&mut task, vec![10, 99]);
    let first_deps = task.deps.clone();
    let first_count = task.resolved_dep_count;

    schedule.resolve_dependencies(&mut task, vec![10, 99]);

    assert_eq!(task.deps, first_deps);
    assert_eq!(task.resolved_dep_count, first_count);
    assert_eq!(task.resolved_dep_count, 1);
}

#[test]
fn test_resolution_fully_replaces_prior_content() {
    let mut schedule = Schedule::new();
    schedule.add_task_list(TaskBuilder::new().with_id(10).build());

    let mut task = TaskBuilder::new().with_id(1).build();
    schedule.resolve_dependencies(&mut task, vec![10]);
    assert_eq!(task.resolved_dep_count, 1);

    schedule.resolve_dependencies(&mut task, vec![99]);
    assert_eq!(task.resolved_dep_count, 0);
    assert!(!task.deps.contains_key("10"));
}

#[test]
fn test_duplicate_registration_is_skipped() {
    let mut schedule = Schedule::new();
    assert!(schedule.add_task_list(TaskBuilder::new().with_id(1).build()));
    assert!(!schedule.add_task_list(TaskBuilder::new().with_id(1).build()));
    assert_eq!(schedule.task_count(), 1);
}

#[test]
fn test_next_run_time_without_deps_uses_cycle_and_offset() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
    let evaluator = FixedCycleEvaluator::returning(anchor);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 30, 0).unwrap();

    let mut schedule = Schedule::new();
    schedule.add_task_list(
        TaskBuilder::new()
            .with_id(1)
            .with_start_offset_seconds(60)
            .build(),
    );

    let next = schedule.compute_next_run_time(1, &evaluator, now).unwrap();
    assert_eq!(next, anchor + Duration::seconds(60));

    // 固定求值器与固定基准下结果确定
    let again = schedule.compute_next_run_time(1, &evaluator, now).unwrap();
    assert_eq!(again, next);
    assert_eq!(schedule.get_task_by_id(1).unwrap().next_run_time, Some(next));
}

#[test]
fn test_next_run_time_propagates_from_dependency() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
    let evaluator = FixedCycleEvaluator::returning(anchor);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let mut schedule = Schedule::new();
    schedule.add_task_list(TaskBuilder::new().with_id(1).with_name("a").build());

    let mut b = TaskBuilder::new().with_id(2).with_name("b").build();
    schedule.resolve_dependencies(&mut b, vec![1]);
    schedule.add_task_list(b);

    let t = schedule.compute_next_run_time(1, &evaluator, now).unwrap();
    let propagated = schedule.compute_next_run_time(2, &evaluator, now).unwrap();

    assert_eq!(propagated, t);
}

#[test]
fn test_first_listed_rule_fails_when_first_dep_unresolved() {
    // dep_ids = [99(不存在), 10(存在)]：规则取字面上的首个依赖，不回退
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
    let evaluator = FixedCycleEvaluator::returning(anchor);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let mut schedule = Schedule::new();
    schedule.add_task_list(TaskBuilder::new().with_id(10).build());
    schedule.compute_next_run_time(10, &evaluator, now).unwrap();

    let mut c = TaskBuilder::new().with_id(3).build();
    schedule.resolve_dependencies(&mut c, vec![99, 10]);
    assert_eq!(c.resolved_dep_count, 1);
    assert_eq!(c.deps.get("99"), Some(&None));
    assert_eq!(c.deps.get("10"), Some(&Some(10)));
    schedule.add_task_list(c);

    let err = schedule.compute_next_run_time(3, &evaluator, now).unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::DependencyUnresolved {
            task_id: 3,
            dep_id: 99
        }
    ));
}

#[test]
fn test_first_listed_rule_uses_first_dep_when_resolved() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
    let evaluator = FixedCycleEvaluator::returning(anchor);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let mut schedule = Schedule::new();
    schedule.add_task_list(TaskBuilder::new().with_id(10).build());
    let t = schedule.compute_next_run_time(10, &evaluator, now).unwrap();

    let mut c = TaskBuilder::new().with_id(3).build();
    schedule.resolve_dependencies(&mut c, vec![10, 99]);
    schedule.add_task_list(c);

    assert_eq!(schedule.compute_next_run_time(3, &evaluator, now).unwrap(), t);
}

#[test]
fn test_dependency_time_missing_is_an_error() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
    let evaluator = FixedCycleEvaluator::returning(anchor);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let mut schedule = Schedule::new();
    // 依赖已注册但其下次运行时间尚未计算
    schedule.add_task_list(TaskBuilder::new().with_id(10).build());

    let mut c = TaskBuilder::new().with_id(3).build();
    schedule.resolve_dependencies(&mut c, vec![10]);
    schedule.add_task_list(c);

    let err = schedule.compute_next_run_time(3, &evaluator, now).unwrap_err();
    assert!(matches!(
        err,
        ScheduleError::DependencyTimeMissing {
            task_id: 3,
            dep_id: 10
        }
    ));
}

#[test]
fn test_latest_of_all_policy_takes_max_across_resolved_deps() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();

    let mut schedule = Schedule::with_policy(DependencyTimePolicy::LatestOfAll);
    schedule.add_task_list(
        TaskBuilder::new()
            .with_id(10)
            .with_start_offset_seconds(0)
            .build(),
    );
    schedule.add_task_list(
        TaskBuilder::new()
            .with_id(11)
            .with_start_offset_seconds(3600)
            .build(),
    );

    let evaluator = FixedCycleEvaluator::returning(anchor);
    let early = schedule.compute_next_run_time(10, &evaluator, now).unwrap();
    let late = schedule.compute_next_run_time(11, &evaluator, now).unwrap();
    assert!(late > early);

    let mut c = TaskBuilder::new().with_id(3).build();
    schedule.resolve_dependencies(&mut c, vec![10, 11]);
    schedule.add_task_list(c);

    assert_eq!(
        schedule.compute_next_run_time(3, &evaluator, now).unwrap(),
        late
    );
}

#[test]
fn test_cycle_probe_detects_mutual_dependency() {
    let mut schedule = Schedule::new();
    schedule.add_task_list(TaskBuilder::new().with_id(1).build());

    let mut b = TaskBuilder::new().with_id(2).build();
    schedule.resolve_dependencies(&mut b, vec![1]);
    schedule.add_task_list(b);

    // A 的新定义反过来依赖 B，形成环
    let mut a = TaskBuilder::new().with_id(1).build();
    schedule.resolve_dependencies(&mut a, vec![2]);
    assert!(schedule.dependency_cycle_exists(&a));

    // 无环的探测返回 false
    let mut c = TaskBuilder::new().with_id(3).build();
    schedule.resolve_dependencies(&mut c, vec![2]);
    assert!(!schedule.dependency_cycle_exists(&c));
}

#[test]
fn test_get_job_by_id_reports_missing_job() {
    let schedule = Schedule::new();
    assert!(matches!(
        schedule.get_job_by_id(5).unwrap_err(),
        ScheduleError::JobNotFound { id: 5 }
    ));
}
