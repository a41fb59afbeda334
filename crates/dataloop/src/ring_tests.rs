use super::*;

#[test]
fn contiguous_reserve_round_trips() {
    let mut ring = Ring::new(128);
    let payload = b"hello";
    let reservation = ring.reserve(payload.len()).expect("reserve");
    ring.write_payload(reservation.payload_offset, payload);
    assert_eq!(ring.read_payload(reservation.payload_offset, payload.len()), payload);
    assert_eq!(reservation.item_size, HEADER_RESERVE + payload.len());
    ring.advance_read(reservation.item_size);
}

#[test]
fn queue_full_when_payload_exceeds_capacity() {
    let mut ring = Ring::new(HEADER_RESERVE + 4);
    let err = ring.reserve(64).unwrap_err();
    assert!(matches!(err, Error::QueueFull));
}

/// The item after a wrap must land exactly where the writer's cursor
/// arithmetic says it should, with no off-by-one slack. A stray `+ 1` in
/// the wrapped-item-size formula (present in the code this crate was
/// translated from) would leave one byte of the next item unread.
#[test]
fn wrap_does_not_lose_a_byte() {
    let capacity = HEADER_RESERVE + 16;
    let mut ring = Ring::new(capacity);

    // Push the write cursor to just short of the wrap boundary so the next
    // reservation's header fits in area0 but its payload does not.
    let write_start = capacity - (HEADER_RESERVE + 5);
    ring.write = write_start;
    ring.read = write_start;

    let payload = vec![0xBBu8; 10];
    let reservation = ring.reserve(payload.len()).expect("reserve");
    ring.write_payload(reservation.payload_offset, &payload);

    // A wrapped payload always starts at offset 0.
    assert_eq!(reservation.payload_offset, 0);
    assert_eq!(ring.read_payload(0, payload.len()), payload.as_slice());

    let area0_len_at_reserve = capacity - (write_start % capacity);
    assert_eq!(reservation.item_size, area0_len_at_reserve + payload.len());

    // Advancing the read cursor by item_size must land exactly on the
    // payload's own length into the arena (mod capacity) — one byte more
    // or fewer here means the reader either skips real bytes or starts
    // re-reading filler as if it were the next item's header.
    let start_read = ring.read;
    ring.advance_read(reservation.item_size);
    assert_eq!((ring.read - start_read) % capacity, payload.len() % capacity);
}

/// A wrap whose `item_size` would exceed the space actually free (unread
/// data still occupies the tail of the arena) must fail with `QueueFull`
/// rather than silently stomp those unread bytes and drive `write - read`
/// past `capacity`.
#[test]
fn wrap_refuses_to_overrun_unread_data() {
    let capacity = 64;
    let mut ring = Ring::new(capacity);
    ring.read = 8;
    ring.write = 30;

    let err = ring.reserve(14).unwrap_err();
    assert!(matches!(err, Error::QueueFull));
    // A failed reservation must not move the write cursor.
    assert_eq!(ring.write, 30);
}
