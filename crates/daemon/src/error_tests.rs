use super::*;

#[test]
fn not_found_wraps_a_core_not_found_error() {
    let err = Error::not_found("can't find factory");
    assert_eq!(err.to_string(), "not found: can't find factory");
}

#[test]
fn invalid_wraps_a_core_invalid_error() {
    let err = Error::invalid("can't create node");
    assert_eq!(err.to_string(), "invalid: can't create node");
}
