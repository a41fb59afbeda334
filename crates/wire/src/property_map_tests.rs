use super::*;

#[test]
fn round_trips_through_properties_and_back() {
    let mut props = Properties::new();
    props.set("target.node", "/sink/0");
    props.set("media.class", "Audio/Sink");

    let map = PropertyMap::from(&props);
    assert_eq!(map.len(), 2);

    let back: Properties = map.into();
    assert_eq!(back.iter().collect::<Vec<_>>(), props.iter().collect::<Vec<_>>());
}

#[test]
fn empty_properties_round_trip_to_an_empty_map() {
    let props = Properties::new();
    let map = PropertyMap::from(&props);
    assert!(map.is_empty());

    let back: Properties = map.into();
    assert!(back.is_empty());
}

#[test]
fn serializes_as_a_plain_json_array_of_pairs() {
    let mut props = Properties::new();
    props.set("a", "1");
    let map = PropertyMap::from(&props);

    let json = serde_json::to_string(&map).unwrap();
    assert_eq!(json, r#"[["a","1"]]"#);
}
