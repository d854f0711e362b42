use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::*;

#[test]
fn success_value_reaches_every_continuation_in_order() {
    let exec = Executor::new(2);
    let seen: Arc<Mutex<Vec<(&'static str, i32)>>> = Arc::new(Mutex::new(Vec::new()));
    let failures = Arc::new(AtomicUsize::new(0));

    let op = Operation::new(|| Ok(41 + 1));
    let s1 = Arc::clone(&seen);
    let s2 = Arc::clone(&seen);
    let f = Arc::clone(&failures);
    let op = op
        .on_success(move |v| s1.lock().unwrap().push(("first", *v)))
        .on_success(move |v| s2.lock().unwrap().push(("second", *v)))
        .on_failure(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

    op.execute(&exec);
    assert_eq!(op.join().unwrap(), 42);

    // A continuation registered after completion runs immediately, on the
    // registering thread, after the earlier ones.
    let s3 = Arc::clone(&seen);
    let _op = op.clone().on_success(move |v| s3.lock().unwrap().push(("late", *v)));

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![("first", 42), ("second", 42), ("late", 42)]);
    assert_eq!(failures.load(Ordering::SeqCst), 0);
}

#[test]
fn failure_reaches_every_failure_continuation_exactly_once() {
    let exec = Executor::new(1);
    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let successes = Arc::new(AtomicUsize::new(0));

    let op: Operation<i32> = Operation::new(|| Err(StoreError::Transport("boom".to_string())));
    let e1 = Arc::clone(&errors);
    let e2 = Arc::clone(&errors);
    let s = Arc::clone(&successes);
    let op = op
        .on_failure(move |e| e1.lock().unwrap().push(e.to_string()))
        .on_failure(move |e| e2.lock().unwrap().push(e.to_string()))
        .on_success(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

    op.execute(&exec);
    let err = op.join().unwrap_err();
    assert!(matches!(err, StoreError::Transport(_)));

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("boom"));
    assert_eq!(successes.load(Ordering::SeqCst), 0);
}

#[test]
fn join_is_idempotent() {
    let exec = Executor::new(1);
    let op = Operation::new(|| Ok("done".to_string()));
    op.execute(&exec);
    assert_eq!(op.join().unwrap(), "done");
    assert_eq!(op.join().unwrap(), "done");
}

#[test]
fn join_without_execute_is_an_error_not_a_deadlock() {
    let op: Operation<i32> = Operation::new(|| Ok(1));
    let err = op.join().unwrap_err();
    assert!(matches!(err, StoreError::LocalIo(_)));
}

#[test]
fn execute_twice_runs_the_work_once() {
    let exec = Executor::new(2);
    let runs = Arc::new(AtomicUsize::new(0));
    let r = Arc::clone(&runs);
    let op = Operation::new(move || {
        r.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    op.execute(&exec);
    op.execute(&exec);
    op.join().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn continuations_on_a_never_executed_operation_never_fire() {
    let fired = Arc::new(AtomicUsize::new(0));
    let f1 = Arc::clone(&fired);
    let f2 = Arc::clone(&fired);
    let op: Operation<i32> = Operation::new(|| Ok(1));
    let op = op
        .on_success(move |_| {
            f1.fetch_add(1, Ordering::SeqCst);
        })
        .on_failure(move |_| {
            f2.fetch_add(1, Ordering::SeqCst);
        });
    drop(op);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn pool_queues_more_operations_than_workers() {
    let exec = Executor::new(2);
    let ops: Vec<Operation<usize>> = (0..16)
        .map(|i| {
            let op = Operation::new(move || Ok(i));
            op.execute(&exec);
            op
        })
        .collect();
    for (i, op) in ops.iter().enumerate() {
        assert_eq!(op.join().unwrap(), i);
    }
}
