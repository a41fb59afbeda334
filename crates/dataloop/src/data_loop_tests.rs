use super::*;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn add_item_starts_thread_lazily_and_stop_joins_it() {
    let data_loop = DataLoop::new(DEFAULT_RING_CAPACITY).unwrap();
    assert!(!data_loop.is_running());

    let ticks = Arc::new(Mutex::new(0u32));
    let item_ticks = ticks.clone();
    let mut item = PollItem::new();
    item.idle = Some(Box::new(move || {
        *item_ticks.lock().unwrap() += 1;
        true
    }));
    let id = data_loop.add_item(item).unwrap();
    assert!(id > 0);

    assert!(wait_until(Duration::from_secs(1), || *ticks.lock().unwrap() > 0));
    data_loop.stop();
    assert!(!data_loop.is_running());
}

#[test]
fn invoke_off_thread_is_drained_and_reported_async() {
    static CALLS: Mutex<Vec<(bool, Option<u32>, Vec<u8>)>> = Mutex::new(Vec::new());

    fn record(_loop: &DataLoop, is_async: bool, seq: Option<u32>, payload: &[u8], _user: usize) -> i32 {
        CALLS.lock().unwrap().push((is_async, seq, payload.to_vec()));
        0
    }

    let data_loop = DataLoop::new(DEFAULT_RING_CAPACITY).unwrap();
    let mut item = PollItem::new();
    item.idle = Some(Box::new(|| true));
    data_loop.add_item(item).unwrap();

    let outcome = data_loop.invoke(record, Some(42), &[1, 2, 3, 4, 5, 6, 7, 8], 0).unwrap();
    assert_eq!(outcome, InvokeOutcome::Async(42));

    assert!(wait_until(Duration::from_secs(1), || !CALLS.lock().unwrap().is_empty()));
    let calls = CALLS.lock().unwrap();
    assert_eq!(calls[0].0, true);
    assert_eq!(calls[0].1, Some(42));
    assert_eq!(calls[0].2, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    data_loop.stop();
}

#[test]
fn remove_item_stops_thread_when_loop_becomes_empty() {
    let data_loop = DataLoop::new(DEFAULT_RING_CAPACITY).unwrap();
    let mut item = PollItem::new();
    item.idle = Some(Box::new(|| true));
    let id = data_loop.add_item(item).unwrap();
    assert!(wait_until(Duration::from_secs(1), || data_loop.is_running()));

    data_loop.remove_item(id).unwrap();
    assert!(wait_until(Duration::from_secs(1), || !data_loop.is_running()));
}
