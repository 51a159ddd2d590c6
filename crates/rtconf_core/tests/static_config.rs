//! Static configuration loads through the facade.

use bson::{doc, oid::ObjectId};
use rtconf_core::{
    ConfigTree, CoreError, NoIncludes, RealtimeBridge, TableIncludes, MAX_INCLUDE_DEPTH,
    SETTINGS_FILE,
};
use rtconf_store::InMemoryPool;
use rtconf_testkit::{partitioned, StaticFile, DATABASE, STATIC_TABLE};
use std::sync::Arc;

fn bridge_over(pool: &InMemoryPool, partition: Option<ObjectId>) -> RealtimeBridge {
    RealtimeBridge::new(Arc::new(pool.clone()), partition)
}

fn load(bridge: &RealtimeBridge, file: &str) -> ConfigTree {
    let mut includes = TableIncludes::new(bridge, DATABASE, STATIC_TABLE);
    bridge
        .load_static(DATABASE, STATIC_TABLE, file, &mut includes)
        .unwrap()
        .unwrap()
}

fn section_names(tree: &ConfigTree) -> Vec<&str> {
    tree.sections().iter().map(|s| s.name()).collect()
}

#[test]
fn sections_follow_metric_order() {
    let pool = InMemoryPool::new();
    StaticFile::new("sip.conf")
        .section("general")
        .var("bindport", "5060")
        .commented("bindaddr", "0.0.0.0")
        .var("context", "default")
        .section("6001")
        .var("type", "friend")
        .seed_into(&pool, STATIC_TABLE);
    let bridge = bridge_over(&pool, None);

    let tree = load(&bridge, "sip.conf");
    assert_eq!(
        tree.to_string(),
        "[general]\nbindport = 5060\ncontext = default\n\n[6001]\ntype = friend\n"
    );
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn includes_splice_in_place() {
    let pool = InMemoryPool::new();
    StaticFile::new("extensions.conf")
        .section("general")
        .var("static", "yes")
        .section("default")
        .var("exten", "6001,1,Dial(PJSIP/6001)")
        .include("users.conf")
        .var("exten", "6002,1,Dial(PJSIP/6002)")
        .section("office")
        .var("exten", "7001,1,Dial(PJSIP/7001)")
        .seed_into(&pool, STATIC_TABLE);
    StaticFile::new("users.conf")
        .section("6001")
        .var("fullname", "Alice")
        .seed_into(&pool, STATIC_TABLE);
    let bridge = bridge_over(&pool, None);

    let tree = load(&bridge, "extensions.conf");
    assert_eq!(section_names(&tree), ["general", "default", "6001", "office"]);
    let default = tree.section("default").unwrap();
    assert_eq!(default.len(), 2);
    assert_eq!(tree.section("6001").unwrap().get("fullname"), Some("Alice"));
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn self_include_stops_at_depth_limit() {
    let pool = InMemoryPool::new();
    StaticFile::new("loop.conf")
        .section("a")
        .var("x", "1")
        .include("loop.conf")
        .seed_into(&pool, STATIC_TABLE);
    let bridge = bridge_over(&pool, None);

    let tree = load(&bridge, "loop.conf");
    assert_eq!(tree.len(), MAX_INCLUDE_DEPTH + 1);
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn settings_file_cannot_be_included() {
    let pool = InMemoryPool::new();
    StaticFile::new("main.conf")
        .section("first")
        .var("a", "1")
        .include(SETTINGS_FILE)
        .section("never")
        .var("b", "2")
        .seed_into(&pool, STATIC_TABLE);
    let bridge = bridge_over(&pool, None);

    let tree = load(&bridge, "main.conf");
    assert_eq!(section_names(&tree), ["first"]);
}

#[test]
fn includes_fail_without_a_loader() {
    let pool = InMemoryPool::new();
    StaticFile::new("main.conf")
        .section("first")
        .var("a", "1")
        .include("other.conf")
        .seed_into(&pool, STATIC_TABLE);
    let bridge = bridge_over(&pool, None);

    let tree = bridge
        .load_static(DATABASE, STATIC_TABLE, "main.conf", &mut NoIncludes)
        .unwrap()
        .unwrap();
    assert_eq!(section_names(&tree), ["first"]);
}

#[test]
fn custom_loader_sees_the_tree() {
    let pool = InMemoryPool::new();
    StaticFile::new("main.conf")
        .section("first")
        .include("extra")
        .seed_into(&pool, STATIC_TABLE);
    let bridge = bridge_over(&pool, None);

    let mut seen = Vec::new();
    let mut loader = |resource: &str, tree: &mut ConfigTree| -> Result<(), CoreError> {
        seen.push((resource.to_string(), tree.len()));
        Ok(())
    };
    let tree = bridge
        .load_static(DATABASE, STATIC_TABLE, "main.conf", &mut loader)
        .unwrap()
        .unwrap();
    assert!(tree.is_empty());
    assert_eq!(seen, [("extra".to_string(), 0)]);
}

#[test]
fn partition_limits_static_records() {
    let ours = ObjectId::new();
    let theirs = ObjectId::new();
    let pool = InMemoryPool::new();
    let file = |value: &str| {
        StaticFile::new("pjsip.conf")
            .section("transport-udp")
            .var("bind", value)
            .build()
    };
    pool.seed(DATABASE, STATIC_TABLE, partitioned(file("0.0.0.0:5060"), ours));
    pool.seed(DATABASE, STATIC_TABLE, partitioned(file("0.0.0.0:5070"), theirs));
    let bridge = bridge_over(&pool, Some(ours));

    let tree = load(&bridge, "pjsip.conf");
    assert_eq!(tree.len(), 1);
    assert_eq!(
        tree.section("transport-udp").unwrap().get("bind"),
        Some("0.0.0.0:5060")
    );
}

#[test]
fn unreadable_record_stops_the_load() {
    let pool = InMemoryPool::new();
    StaticFile::new("broken.conf")
        .section("good")
        .var("a", "1")
        .seed_into(&pool, STATIC_TABLE);
    pool.seed(
        DATABASE,
        STATIC_TABLE,
        [doc! {
            "filename": "broken.conf",
            "category": "bad",
            "cat_metric": 1,
            "var_metric": 1,
            "var_name": "b",
            "commented": 0,
        }],
    );
    let bridge = bridge_over(&pool, None);

    let tree = load(&bridge, "broken.conf");
    assert_eq!(section_names(&tree), ["good"]);
}

#[test]
fn missing_file_is_an_empty_tree() {
    let pool = InMemoryPool::new();
    let bridge = bridge_over(&pool, None);
    assert!(load(&bridge, "absent.conf").is_empty());
}
