use lexica_common::error::ErrorKind;

use crate::builder::StringTableBuilder;
use crate::table::StringTable;

fn build(pairs: &[(&str, f64)]) -> Vec<u8> {
    let mut builder = StringTableBuilder::new();
    for (key, weight) in pairs {
        builder.add(key, *weight).expect("add");
    }
    builder.build().expect("build");
    builder.blob().to_vec()
}

fn hello_pairs() -> Vec<(&'static str, f64)> {
    vec![
        ("h", 1.0),
        ("he", 1.0),
        ("hell", 1.0),
        ("hello", 1.0),
        ("help", 1.0),
    ]
}

#[test]
fn test_round_trip() {
    let pairs = hello_pairs();
    let blob = build(&pairs);
    let table = StringTable::map(&blob).expect("map");

    assert_eq!(table.num_keys(), pairs.len());
    assert_eq!(table.binary_size(), blob.len());

    let mut seen = vec![false; pairs.len()];
    for (key, _) in &pairs {
        let id = table.lookup(key).expect("present key");
        assert!((id as usize) < pairs.len(), "id in dense range");
        assert!(!seen[id as usize], "ids are distinct");
        seen[id as usize] = true;
        assert_eq!(table.get_string(id).expect("reverse lookup"), *key);
        assert!(table.has_key(key));
    }
}

#[test]
fn test_lookup_miss() {
    let blob = build(&hello_pairs());
    let table = StringTable::map(&blob).expect("map");
    assert_eq!(table.lookup("helicopter"), None);
    assert_eq!(table.lookup("hel"), None, "interior node is not a key");
    assert_eq!(table.lookup("x"), None);
    assert!(!table.has_key("hel"));
}

#[test]
fn test_common_prefix_match() {
    let blob = build(&hello_pairs());
    let table = StringTable::map(&blob).expect("map");

    let matches: Vec<String> = table
        .common_prefix_match("hello")
        .into_iter()
        .map(|id| table.get_string(id).expect("get_string"))
        .collect();
    assert_eq!(matches, ["h", "he", "hell", "hello"]);

    assert!(table.common_prefix_match("x").is_empty());
    assert!(table.common_prefix_match("").is_empty());
}

#[test]
fn test_predict() {
    let blob = build(&hello_pairs());
    let table = StringTable::map(&blob).expect("map");

    let completions: Vec<String> = table
        .predict("he")
        .into_iter()
        .map(|id| table.get_string(id).expect("get_string"))
        .collect();
    assert_eq!(completions, ["he", "hell", "hello", "help"]);

    // A query ending inside an edge still matches the subtree below it.
    let completions: Vec<String> = table
        .predict("hel")
        .into_iter()
        .map(|id| table.get_string(id).expect("get_string"))
        .collect();
    assert_eq!(completions, ["hell", "hello", "help"]);

    assert!(table.predict("hex").is_empty());
    assert_eq!(table.predict("").len(), 5, "empty query matches every key");
}

#[test]
fn test_predict_prefers_higher_weight() {
    let blob = build(&[("ab", 1.0), ("ac", 9.0), ("ad", 5.0)]);
    let table = StringTable::map(&blob).expect("map");
    let completions: Vec<String> = table
        .predict("a")
        .into_iter()
        .map(|id| table.get_string(id).expect("get_string"))
        .collect();
    assert_eq!(completions, ["ac", "ad", "ab"]);
}

#[test]
fn test_predict_orders_prefix_before_completions() {
    let blob = build(&[("he", 1.0), ("hello", 9.0), ("help", 2.0)]);
    let table = StringTable::map(&blob).expect("map");
    let completions: Vec<String> = table
        .predict("h")
        .into_iter()
        .map(|id| table.get_string(id).expect("get_string"))
        .collect();
    // A stored prefix key comes first regardless of weight; below it the
    // siblings order by descending weight.
    assert_eq!(completions, ["he", "hello", "help"]);
}

#[test]
fn test_overlong_key_rejected() {
    let mut builder = StringTableBuilder::new();
    let err = builder
        .add(vec![b'a'; 70_000], 1.0)
        .expect_err("key longer than an edge can encode");
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));

    // The longest representable key still round-trips.
    let long = vec![b'x'; crate::format::MAX_KEY_LEN];
    builder.add(&long, 1.0).expect("add");
    builder.build().expect("build");
    let table = StringTable::map(builder.blob()).expect("map");
    let id = table.lookup(&long).expect("present key");
    assert_eq!(table.get_string(id).expect("get_string").into_bytes(), long);
}

#[test]
fn test_get_string_out_of_range() {
    let blob = build(&hello_pairs());
    let table = StringTable::map(&blob).expect("map");
    let err = table.get_string(999).expect_err("out of range");
    assert!(matches!(err.kind(), ErrorKind::IdOutOfRange { .. }));
    // Unrelated lookups keep working afterwards.
    assert!(table.lookup("hello").is_some());
}

#[test]
fn test_deterministic_build() {
    let forward = build(&hello_pairs());
    let mut reversed = hello_pairs();
    reversed.reverse();
    let backward = build(&reversed);
    assert_eq!(forward, backward, "insertion order must not affect bytes");
}

#[test]
fn test_duplicate_keys() {
    let mut builder = StringTableBuilder::new();
    let first = builder.add("dup", 1.0).expect("add");
    let second = builder.add("dup", 2.0).expect("add");
    builder.add("other", 1.0).expect("add");
    builder.build().expect("build");

    assert_eq!(builder.resolve(first), builder.resolve(second));
    let table = StringTable::map(builder.blob()).expect("map");
    assert_eq!(table.num_keys(), 2, "duplicates collapse to one key");
}

#[test]
fn test_tokens_resolve_after_build() {
    let mut builder = StringTableBuilder::new();
    let tokens: Vec<_> = hello_pairs()
        .iter()
        .map(|(key, weight)| builder.add(key, *weight).expect("add"))
        .collect();
    assert_eq!(builder.resolve(tokens[0]), None, "unresolved before build");
    builder.build().expect("build");

    let table = StringTable::map(builder.blob()).expect("map");
    for (token, (key, _)) in tokens.iter().zip(hello_pairs()) {
        assert_eq!(builder.resolve(*token), table.lookup(key));
    }
}

#[test]
fn test_empty_key_rejected() {
    let mut builder = StringTableBuilder::new();
    let err = builder.add("", 1.0).expect_err("empty key");
    assert!(matches!(err.kind(), ErrorKind::InvalidArgument { .. }));
}

#[test]
fn test_clear() {
    let mut builder = StringTableBuilder::new();
    let token = builder.add("key", 1.0).expect("add");
    builder.build().expect("build");
    assert!(builder.resolve(token).is_some());
    assert!(builder.binary_size() > 0);

    builder.clear();
    assert_eq!(builder.binary_size(), 0);
    assert_eq!(builder.resolve(token), None, "stale token after clear");

    builder.add("fresh", 1.0).expect("add");
    builder.build().expect("rebuild");
    let table = StringTable::map(builder.blob()).expect("map");
    assert_eq!(table.num_keys(), 1);
    assert!(table.has_key("fresh"));
}

#[test]
fn test_dump() {
    let mut builder = StringTableBuilder::new();
    for (key, weight) in hello_pairs() {
        builder.add(key, weight).expect("add");
    }
    builder.build().expect("build");

    let size = builder.binary_size();
    let mut buf = vec![0u8; size];
    let written = builder.dump(&mut buf).expect("dump");
    assert_eq!(written, size);
    assert_eq!(buf, builder.blob());

    // Wrapping the dumped bytes reproduces identical query results.
    let table = StringTable::map(&buf).expect("map");
    assert!(table.has_key("hello"));
}

#[test]
fn test_dump_undersized_buffer() {
    let mut builder = StringTableBuilder::new();
    builder.add("key", 1.0).expect("add");
    builder.build().expect("build");

    let mut buf = vec![0xEE; builder.binary_size() - 1];
    let err = builder.dump(&mut buf).expect_err("undersized");
    assert!(matches!(err.kind(), ErrorKind::DestBufferTooSmall));
    assert!(
        buf.iter().all(|&b| b == 0xEE),
        "buffer must be left untouched"
    );
}

#[test]
fn test_dump_before_build() {
    let builder = StringTableBuilder::new();
    let mut buf = vec![0u8; 64];
    assert!(builder.dump(&mut buf).is_err());
}

#[test]
fn test_map_rejects_garbage() {
    assert!(StringTable::map(&[]).is_err());
    assert!(StringTable::map(&[0u8; 10]).is_err());
    assert!(StringTable::map(&[0u8; 64]).is_err(), "bad magic");

    let mut blob = build(&[("key", 1.0)]);
    blob[0] ^= 0xFF;
    assert!(StringTable::map(&blob).is_err());
}

#[test]
fn test_blob_inside_larger_buffer() {
    let blob = build(&hello_pairs());
    let mut buffer = blob.clone();
    buffer.extend_from_slice(&[0xAB; 100]);

    let table = StringTable::map(&buffer).expect("map");
    assert_eq!(table.binary_size(), blob.len());
    assert_eq!(table.num_keys(), 5);
    assert!(table.has_key("hello"));
}

#[test]
fn test_empty_table() {
    let mut builder = StringTableBuilder::new();
    builder.build().expect("build");
    let table = StringTable::map(builder.blob()).expect("map");
    assert_eq!(table.num_keys(), 0);
    assert_eq!(table.lookup("anything"), None);
    assert!(table.predict("").is_empty());
}

#[test]
fn test_randomized_round_trip() {
    fastrand::seed(42);
    let mut keys = std::collections::BTreeSet::new();
    while keys.len() < 300 {
        let len = fastrand::usize(1..12);
        let key: String = (0..len)
            .map(|_| fastrand::char('a'..='z'))
            .collect();
        keys.insert(key);
    }

    let mut builder = StringTableBuilder::new();
    for key in &keys {
        builder.add(key, fastrand::f64() * 100.0).expect("add");
    }
    builder.build().expect("build");

    let table = StringTable::map(builder.blob()).expect("map");
    assert_eq!(table.num_keys(), keys.len());
    let mut seen = vec![false; keys.len()];
    for key in &keys {
        let id = table.lookup(key).expect("present key");
        assert!(!seen[id as usize]);
        seen[id as usize] = true;
        assert_eq!(&table.get_string(id).expect("get_string"), key);
    }

    // Spot-check prefix semantics against a naive scan.
    for _ in 0..20 {
        let probe: String = (0..fastrand::usize(1..4))
            .map(|_| fastrand::char('a'..='z'))
            .collect();
        let mut expected: Vec<&String> =
            keys.iter().filter(|k| k.starts_with(&probe)).collect();
        let mut actual: Vec<String> = table
            .predict(&probe)
            .into_iter()
            .map(|id| table.get_string(id).expect("get_string"))
            .collect();
        expected.sort();
        actual.sort();
        let actual: Vec<&String> = actual.iter().collect();
        assert_eq!(actual, expected);
    }
}
