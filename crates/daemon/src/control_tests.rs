use super::*;
use sg_core::Properties;
use sg_graph::node::Node;
use sg_graph::port::Direction;
use sg_wire::control::{CreateClientNodeRequest, CreateNodeRequest, ERR_CANT_FIND_FACTORY};
use sg_wire::PropertyMap;

fn test_daemon() -> std::sync::Arc<Daemon> {
    let config = crate::config::Config {
        socket_dir: std::env::temp_dir(),
        ring_capacity: sg_dataloop::DEFAULT_RING_CAPACITY,
        log_filter: "info".to_string(),
    };
    Daemon::new(&config).unwrap()
}

fn make_sink(name: &str, properties: Properties) -> std::sync::Arc<Node> {
    let node = Node::new(name, properties, None);
    node.add_port(Direction::Input).unwrap();
    node
}

#[test]
fn create_node_rejects_an_unknown_factory() {
    let daemon = test_daemon();
    let request = CreateNodeRequest {
        factory_name: "nope".to_string(),
        name: "anything".to_string(),
        properties: PropertyMap::default(),
    };
    let err = daemon.create_node(None, request).unwrap_err();
    assert!(err.to_string().contains(ERR_CANT_FIND_FACTORY));
}

#[test]
fn create_node_publishes_and_returns_the_object_path() {
    let daemon = test_daemon();
    daemon.register_factory("sink", make_sink);

    let request = CreateNodeRequest {
        factory_name: "sink".to_string(),
        name: "my-sink".to_string(),
        properties: PropertyMap::default(),
    };
    let response = daemon.create_node(Some("peer-1"), request).unwrap();
    assert!(response.object_path.starts_with("/node/my-sink/"));

    // owned by the peer's client.
    let client = daemon.client_for_peer("peer-1");
    assert_eq!(client.owned_ids_lifo().len(), 1);
}

#[test]
fn create_client_node_returns_distinct_live_fds() {
    let daemon = test_daemon();
    let request = CreateClientNodeRequest { name: "peer-node".to_string(), properties: PropertyMap::default() };

    let response = daemon.create_client_node(Some("peer-2"), request).unwrap();
    assert!(response.object_path.starts_with("/node/peer-node/"));
    assert_ne!(response.control_fd, response.rt_fd);
    assert!(response.control_fd >= 0);
    assert!(response.rt_fd >= 0);
}
