use super::*;
use std::sync::Mutex;

// Environment variables are process-global; serialize the tests that touch
// them so they don't race each other under the default parallel test runner.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn ring_capacity_defaults_to_the_data_loop_default() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::remove_var("SGD_RING_CAPACITY");
    assert_eq!(ring_capacity(), sg_dataloop::DEFAULT_RING_CAPACITY);
}

#[test]
fn ring_capacity_reads_the_env_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("SGD_RING_CAPACITY", "4096");
    assert_eq!(ring_capacity(), 4096);
    std::env::remove_var("SGD_RING_CAPACITY");
}

#[test]
fn log_filter_defaults_to_info() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::remove_var("SGD_LOG");
    assert_eq!(log_filter(), "info");
}

#[test]
fn socket_dir_defaults_to_run_sgd() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::remove_var("SGD_SOCKET_DIR");
    assert_eq!(socket_dir(), PathBuf::from("/run/sgd"));
}
