//! End-to-end scenarios exercised against the full stack: registry, both
//! loops, the graph domain types, the wire DTOs, and the daemon
//! composition root together.

use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use sg_core::Properties;
use sg_dataloop::{DataLoop, InvokeOutcome, PollFdSpec, PollItem, DEFAULT_RING_CAPACITY, READABLE};
use sg_graph::node::{Node, NodeState};
use sg_graph::port::Direction;
use sg_wire::control::{CreateNodeRequest, ERR_CANT_FIND_FACTORY};
use sg_wire::PropertyMap;

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

fn test_daemon() -> Arc<sg_daemon::Daemon> {
    let config = sg_daemon::Config {
        socket_dir: std::env::temp_dir(),
        ring_capacity: DEFAULT_RING_CAPACITY,
        log_filter: "info".to_string(),
    };
    sg_daemon::Daemon::new(&config).unwrap()
}

fn make_src(name: &str, properties: Properties) -> Arc<Node> {
    let node = Node::new(name, properties, None);
    node.add_port(Direction::Output).unwrap();
    node
}

fn make_sink(name: &str, properties: Properties) -> Arc<Node> {
    let node = Node::new(name, properties, None);
    node.add_port(Direction::Input).unwrap();
    node
}

fn find_node_by_name(daemon: &sg_daemon::Daemon, name: &str) -> Arc<Node> {
    daemon
        .registry
        .iter()
        .into_iter()
        .find_map(|(_, object)| object.as_node().filter(|n| n.name() == name).cloned())
        .unwrap_or_else(|| panic!("no node named {name} in the registry"))
}

#[test]
fn s1_create_node_via_missing_factory() {
    let daemon = test_daemon();
    let before = daemon.registry.len();

    let request = CreateNodeRequest {
        factory_name: "foo".to_string(),
        name: "x".to_string(),
        properties: PropertyMap::default(),
    };
    let err = daemon.create_node(None, request).unwrap_err();
    assert!(err.to_string().contains(ERR_CANT_FIND_FACTORY));
    assert_eq!(daemon.registry.len(), before);
}

#[test]
fn s2_auto_link_to_a_named_target_then_destroy_the_sink() {
    let daemon = test_daemon();
    daemon.register_factory("src", make_src);
    daemon.register_factory("sink", make_sink);

    let sink_response = daemon
        .create_node(
            None,
            CreateNodeRequest { factory_name: "sink".to_string(), name: "sink".to_string(), properties: PropertyMap::default() },
        )
        .unwrap();

    let mut src_props = Properties::new();
    src_props.set(sg_core::TARGET_NODE, sink_response.object_path.clone());
    let src_response = daemon
        .create_node(
            None,
            CreateNodeRequest { factory_name: "src".to_string(), name: "src".to_string(), properties: (&src_props).into() },
        )
        .unwrap();
    assert!(src_response.object_path.starts_with("/node/src/"));

    let src_node = find_node_by_name(&daemon, "src");
    let sink_node = find_node_by_name(&daemon, "sink");
    assert_eq!(src_node.state(), NodeState::Running);
    assert_eq!(sink_node.state(), NodeState::Running);

    let link = daemon
        .registry
        .iter()
        .into_iter()
        .find_map(|(_, object)| object.as_link().cloned())
        .expect("auto-link should have created a link");
    assert_eq!(link.state(), sg_graph::link::LinkState::Running);

    let port_unlinked_side = Arc::new(Mutex::new(None));
    let recorder = port_unlinked_side.clone();
    link.port_unlinked.subscribe(move |side| *recorder.lock().unwrap() = Some(*side));

    let sink_id = daemon
        .registry
        .iter()
        .into_iter()
        .find_map(|(id, object)| object.as_node().filter(|n| n.name() == "sink").map(|_| id))
        .unwrap();
    daemon.remove_object(sink_id);

    assert_eq!(link.state(), sg_graph::link::LinkState::Unlinked);
    assert_eq!(*port_unlinked_side.lock().unwrap(), Some(Direction::Input));
    assert_eq!(src_node.state(), NodeState::Error(sg_daemon::ERR_PEER_NODE_REMOVED.to_string()));
}

#[test]
fn s3_invoke_round_trip_off_thread() {
    static CALLS: Mutex<Vec<(bool, Option<u32>, Vec<u8>)>> = Mutex::new(Vec::new());

    fn record(_loop: &DataLoop, is_async: bool, seq: Option<u32>, payload: &[u8], _user: usize) -> i32 {
        CALLS.lock().unwrap().push((is_async, seq, payload.to_vec()));
        0
    }

    let data_loop = DataLoop::new(DEFAULT_RING_CAPACITY).unwrap();
    let mut item = PollItem::new();
    item.idle = Some(Box::new(|| true));
    data_loop.add_item(item).unwrap();

    let payload: Vec<u8> = (1..=8).collect();
    let outcome = data_loop.invoke(record, Some(42), &payload, 0).unwrap();
    assert_eq!(outcome, InvokeOutcome::Async(42));

    assert!(wait_until(Duration::from_secs(1), || !CALLS.lock().unwrap().is_empty()));
    let calls = CALLS.lock().unwrap();
    assert_eq!(calls[0], (true, Some(42), payload));

    data_loop.stop();
}

#[test]
fn s4_invoke_ring_overflow_returns_queue_full() {
    fn noop(_loop: &DataLoop, _is_async: bool, _seq: Option<u32>, _payload: &[u8], _user: usize) -> i32 {
        0
    }

    // No item is ever added, so the loop thread never starts and nothing
    // drains the ring; every invoke lands on the write side deterministically.
    let data_loop = DataLoop::new(128).unwrap();
    let payload = vec![0u8; 32];

    let mut saw_queue_full = false;
    for _ in 0..32 {
        match data_loop.invoke(noop, None, &payload, 0) {
            Ok(_) => {}
            Err(sg_dataloop::Error::QueueFull) => {
                saw_queue_full = true;
                break;
            }
            Err(other) => panic!("unexpected data loop error: {other}"),
        }
    }
    assert!(saw_queue_full, "ring never reported QueueFull under sustained, undrained submission");
}

#[test]
fn s5_client_vanish_cascade_removes_in_lifo_order() {
    let daemon = test_daemon();
    daemon.register_factory("src", make_src);

    daemon
        .create_node(
            Some("peer-1"),
            CreateNodeRequest { factory_name: "src".to_string(), name: "n1".to_string(), properties: PropertyMap::default() },
        )
        .unwrap();
    daemon
        .create_node(
            Some("peer-1"),
            CreateNodeRequest { factory_name: "src".to_string(), name: "n2".to_string(), properties: PropertyMap::default() },
        )
        .unwrap();

    let removed_order = Arc::new(Mutex::new(Vec::new()));
    let recorder = removed_order.clone();
    daemon.registry.object_removed.subscribe(move |evt| {
        if let Some(node) = evt.object.as_node() {
            recorder.lock().unwrap().push(node.name().to_string());
        }
    });

    daemon.client_vanished("peer-1");

    assert_eq!(*removed_order.lock().unwrap(), vec!["n2".to_string(), "n1".to_string()]);

    // the client's own slot is gone too: a second vanish call is a no-op.
    daemon.client_vanished("peer-1");
}

#[test]
fn s6_poll_item_lifecycle_with_an_eventfd_like_socket() {
    let (mut tx, rx) = UnixStream::pair().unwrap();

    let data_loop = DataLoop::new(DEFAULT_RING_CAPACITY).unwrap();
    let seen = Arc::new(Mutex::new(false));
    let seen2 = seen.clone();
    let mut item = PollItem::new();
    item.fds.push(PollFdSpec { fd: rx.as_raw_fd(), events: READABLE });
    item.after = Some(Box::new(move |fds| {
        if fds.iter().any(|f| f.revents & READABLE != 0) {
            *seen2.lock().unwrap() = true;
        }
        true
    }));
    let id = data_loop.add_item(item).unwrap();
    assert!(wait_until(Duration::from_secs(1), || data_loop.is_running()));

    use std::io::Write;
    tx.write_all(b"x").unwrap();

    assert!(wait_until(Duration::from_secs(1), || *seen.lock().unwrap()));

    data_loop.remove_item(id).unwrap();
    assert!(wait_until(Duration::from_secs(1), || !data_loop.is_running()));
}
