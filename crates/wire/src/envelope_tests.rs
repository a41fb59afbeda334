use super::*;
use serde_json::json;

#[test]
fn round_trips_a_command_through_the_length_prefixed_frame() {
    let envelope = Envelope::Command(Command::Generic(json!({"rate": 48000})));

    let mut buffer = Vec::new();
    write_frame(&mut buffer, &envelope).unwrap();

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, buffer.len() - 4);

    let mut cursor = io::Cursor::new(buffer);
    let decoded = read_frame(&mut cursor).unwrap();
    match decoded {
        Envelope::Command(Command::Generic(body)) => assert_eq!(body, json!({"rate": 48000})),
        _ => panic!("expected a command"),
    }
}

#[test]
fn round_trips_an_event() {
    let envelope = Envelope::Event(Event::Generic(json!(7)));
    let mut buffer = Vec::new();
    write_frame(&mut buffer, &envelope).unwrap();
    let mut cursor = io::Cursor::new(buffer);
    let decoded = read_frame(&mut cursor).unwrap();
    assert!(matches!(decoded, Envelope::Event(_)));
}

#[test]
fn short_read_is_an_io_error() {
    let mut cursor = io::Cursor::new(vec![0u8, 0, 0, 5]);
    let err = read_frame(&mut cursor).unwrap_err();
    assert!(matches!(err, FrameError::Io(_)));
}

#[test]
fn two_frames_back_to_back_read_independently() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, &Envelope::Event(Event::Generic(json!(1)))).unwrap();
    write_frame(&mut buffer, &Envelope::Event(Event::Generic(json!(2)))).unwrap();

    let mut cursor = io::Cursor::new(buffer);
    let first = read_frame(&mut cursor).unwrap();
    let second = read_frame(&mut cursor).unwrap();
    match (first, second) {
        (Envelope::Event(Event::Generic(a)), Envelope::Event(Event::Generic(b))) => {
            assert_eq!(a, json!(1));
            assert_eq!(b, json!(2));
        }
        _ => panic!("expected two events"),
    }
}
