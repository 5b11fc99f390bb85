//! Tests for worker pool creation and resizing

use crate::error::SweepError;
use crate::pool::{PoolProfile, WORKER_THREAD_PREFIX, WorkerPool};

#[test]
fn test_pool_threads_are_named() {
    let pool = WorkerPool::new(2).unwrap();
    assert_eq!(pool.workers(), 2);

    let name = pool.install(|| std::thread::current().name().map(str::to_string));
    assert!(name.unwrap().starts_with(WORKER_THREAD_PREFIX));
}

#[test]
fn test_zero_workers_rejected() {
    assert!(matches!(WorkerPool::new(0), Err(SweepError::Pool(_))));
}

#[test]
fn test_resize_changes_worker_count() {
    let mut pool = WorkerPool::new(2).unwrap();
    pool.resize(5).unwrap();

    assert_eq!(pool.workers(), 5);
    assert_eq!(pool.profile().workers, 5);
    assert_eq!(pool.install(rayon::current_num_threads), 5);
}

#[test]
fn test_failed_resize_keeps_old_pool() {
    let mut pool = WorkerPool::new(3).unwrap();

    assert!(matches!(pool.resize(0), Err(SweepError::Pool(_))));
    assert_eq!(pool.workers(), 3);
    assert_eq!(pool.install(|| (1..=4).sum::<i32>()), 10);
}

#[test]
fn test_resize_keeps_stack_size() {
    let profile = PoolProfile {
        workers: 1,
        stack_size_mb: Some(4),
    };
    let mut pool = WorkerPool::from_profile(&profile).unwrap();
    pool.resize(2).unwrap();
    assert_eq!(pool.profile().stack_size_mb, Some(4));
}

#[test]
fn test_oversized_stack_is_pool_error() {
    let profile = PoolProfile {
        workers: 1,
        stack_size_mb: Some(usize::MAX),
    };
    assert!(matches!(
        WorkerPool::from_profile(&profile),
        Err(SweepError::Pool(_))
    ));
}
