use std::any::Any;
use std::sync::{Arc, Mutex};

use serde_json::json;
use sokol_core::{
    Blueprint, Built, Component, EventDispatcher, NodeData, NodePath, NodeRef, Priority, Registry,
    Rule, Slot, StatLayer, StatMap, StatOp, System, SystemInstance, TreeChanged, TreeError,
    TreeNode,
};

type Log = Arc<Mutex<Vec<String>>>;

/// Records structural notifications and build passes of its node.
#[derive(Debug)]
struct Recorder {
    log: Log,
}

#[derive(Clone, Debug)]
struct RecorderInstance {
    log: Log,
}

impl System for Recorder {
    fn id(&self) -> &str {
        "recorder"
    }

    fn instantiate(&self) -> Box<dyn SystemInstance> {
        Box::new(RecorderInstance {
            log: Arc::clone(&self.log),
        })
    }
}

impl SystemInstance for RecorderInstance {
    fn system_id(&self) -> &str {
        "recorder"
    }

    fn register(&self, events: &mut EventDispatcher) {
        let log = Arc::clone(&self.log);
        events.listen::<TreeChanged, _>(0, move |node, event| {
            log.lock()
                .unwrap()
                .push(format!("changed {} {}/{}", node.value().id(), event.path, event.slot));
        });
        let log = Arc::clone(&self.log);
        events.listen::<Built, _>(0, move |node, _| {
            log.lock().unwrap().push(format!("built {}", node.path()));
        });
    }

    fn copy(&self) -> Box<dyn SystemInstance> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Persistent use counter that wears durability down.
#[derive(Debug)]
struct Wear;

#[derive(Clone, Debug)]
struct WearInstance {
    uses: u32,
}

impl System for Wear {
    fn id(&self) -> &str {
        "wear"
    }

    fn instantiate(&self) -> Box<dyn SystemInstance> {
        Box::new(WearInstance { uses: 0 })
    }

    fn load(&self, payload: &serde_json::Value) -> Result<Box<dyn SystemInstance>, serde_json::Error> {
        let uses = serde_json::from_value(payload.clone())?;
        Ok(Box::new(WearInstance { uses }))
    }
}

impl SystemInstance for WearInstance {
    fn system_id(&self) -> &str {
        "wear"
    }

    fn build_stats(&self, _node: &NodeRef<'_>) -> Vec<StatLayer> {
        let stats = StatMap::from_ops([("durability", StatOp::sub(f64::from(self.uses)))])
            .expect("numeric subtraction is valid");
        vec![StatLayer::new(Priority::reverse(0), stats)]
    }

    fn save(&self) -> Option<serde_json::Value> {
        Some(json!(self.uses))
    }

    fn copy(&self) -> Box<dyn SystemInstance> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn layer(priority: Priority, ops: Vec<(&str, StatOp)>) -> StatLayer {
    StatLayer::new(priority, StatMap::from_ops(ops).expect("valid stat ops"))
}

fn barrel(log: &Log) -> Arc<Component> {
    Arc::new(
        Component::builder("barrel")
            .tag("rail")
            .slot(
                Slot::new("grip")
                    .expect("valid slot key")
                    .with_tag("required")
                    .with_rule(Rule::has_tags(["handle"])),
            )
            .slot(
                Slot::new("sight")
                    .expect("valid slot key")
                    .with_rule(Rule::as_parent(Rule::has_tags(["rail"]))),
            )
            .system(Arc::new(Recorder {
                log: Arc::clone(log),
            }))
            .stats(layer(Priority::forward(0), vec![("damage", StatOp::set(10.0))]))
            .build()
            .expect("barrel is valid"),
    )
}

fn grip(log: &Log) -> Arc<Component> {
    Arc::new(
        Component::builder("grip")
            .tag("handle")
            .slot(Slot::new("screw").expect("valid slot key"))
            .system(Arc::new(Recorder {
                log: Arc::clone(log),
            }))
            .stats(layer(Priority::reverse(0), vec![("damage", StatOp::add(5.0))]))
            .build()
            .expect("grip is valid"),
    )
}

fn plain(id: &str, tags: &[&str]) -> Arc<Component> {
    Arc::new(
        Component::builder(id)
            .tags(tags.iter().copied())
            .build()
            .expect("component is valid"),
    )
}

fn node(component: Arc<Component>) -> TreeNode {
    TreeNode::new(component).expect("no system dependencies")
}

/// Barrel with a required handle grip and an optional rail sight.
///
/// 1. Empty barrel is incomplete
/// 2. A non-handle grip is refused and handed back
/// 3. A handle grip completes the barrel and adds reverse-phase damage
/// 4. The sight slot only accepts children while the parent has a rail
#[test]
fn barrel_grip_sight() {
    let log = Log::default();
    let mut root = node(barrel(&log));
    assert!(!root.complete());

    let rejected = root
        .attach("grip", node(plain("stock", &["wooden"])))
        .expect_err("stock is not a handle");
    assert!(matches!(rejected.error, TreeError::Incompatible { .. }));
    assert_eq!(rejected.candidate.id(), "stock");

    let replaced = root.attach("grip", node(grip(&log))).expect("handle is accepted");
    assert!(replaced.is_none());
    assert!(root.complete());
    assert_eq!(root.stats().number("damage"), Some(15.0));

    root.attach("sight", node(plain("scope", &[])))
        .expect("barrel has a rail");
    assert_eq!(root.children().len(), 2);
    assert_eq!(root.cursor().child("sight").expect("attached").key(), Some("sight"));
}

#[test]
fn failed_attach_leaves_tree_untouched() {
    let log = Log::default();
    let mut root = node(barrel(&log));
    root.attach("grip", node(grip(&log))).expect("handle is accepted");

    let before: *const TreeNode = root.child("grip").expect("attached");
    let stats_before = root.stats().clone();
    log.lock().unwrap().clear();

    let rejected = root
        .attach("grip", node(plain("stock", &[])))
        .expect_err("stock is not a handle");

    assert_eq!(rejected.candidate.id(), "stock");
    assert_eq!(root.children().keys().collect::<Vec<_>>(), vec!["grip"]);
    assert!(std::ptr::eq(before, root.child("grip").expect("still attached")));
    assert_eq!(root.stats(), &stats_before);
    assert!(log.lock().unwrap().is_empty(), "no rebuild or notification");
}

#[test]
fn forward_set_then_reverse_add_in_any_declaration_order() {
    for reverse_first in [false, true] {
        let set = layer(Priority::forward(0), vec![("damage", StatOp::set(10.0))]);
        let add = layer(Priority::reverse(0), vec![("damage", StatOp::add(5.0))]);
        let layers = if reverse_first { [add, set] } else { [set, add] };

        let mut builder = Component::builder("rifle");
        for layer in layers {
            builder = builder.stats(layer);
        }
        let mut root = node(Arc::new(builder.build().expect("valid")));
        root.build();

        assert_eq!(root.stats().number("damage"), Some(15.0));
    }
}

#[test]
fn completeness_follows_required_children_only() {
    let log = Log::default();
    let required_screw = Arc::new(
        Component::builder("grip")
            .tag("handle")
            .slot(Slot::new("screw").expect("valid").with_tag("required"))
            .build()
            .expect("valid"),
    );

    let mut root = node(barrel(&log));
    root.attach("sight", node(plain("scope", &[]))).expect("rail");
    assert!(!root.complete(), "optional sight does not help");

    root.attach("grip", node(required_screw)).expect("handle");
    assert!(root.required_filled());
    assert!(!root.complete(), "grip is missing its screw");

    root.attach_at(&NodePath::from("grip"), "screw", node(plain("screw", &[])))
        .expect("any screw");
    assert!(root.complete());

    root.detach("sight").expect("known slot");
    assert!(root.complete(), "empty optional slot never matters");
}

#[test]
fn copies_are_isolated() {
    let log = Log::default();
    let mut original = node(barrel(&log));
    original.attach("grip", node(grip(&log))).expect("handle");

    let mut copy = original.copy();
    assert!(Arc::ptr_eq(original.value(), copy.value()));

    copy.attach("sight", node(plain("scope", &[]))).expect("rail");
    copy.detach_at(&NodePath::new(), "grip").expect("known slot");

    assert!(original.child("sight").is_none());
    assert!(original.child("grip").is_some());
    assert_eq!(original.stats().number("damage"), Some(15.0));
    assert_eq!(copy.stats().number("damage"), Some(10.0));

    original
        .attach_at(&NodePath::from("grip"), "screw", node(plain("screw", &[])))
        .expect("any screw");
    assert!(copy.node(&NodePath::from("grip/screw")).is_none());
}

#[test]
fn copied_nodes_keep_their_listeners() {
    let log = Log::default();
    let original = node(barrel(&log));
    let mut copy = original.clone();

    copy.build();
    assert_eq!(*log.lock().unwrap(), vec!["built ".to_owned()]);
}

#[test]
fn changes_notify_modified_node_then_ancestors() {
    let log = Log::default();
    let mut root = node(barrel(&log));
    root.attach("grip", node(grip(&log))).expect("handle");
    log.lock().unwrap().clear();

    root.attach_at(&NodePath::from("grip"), "screw", node(plain("screw", &[])))
        .expect("any screw");

    let log = log.lock().unwrap();
    let changes: Vec<&str> = log
        .iter()
        .map(String::as_str)
        .filter(|line| line.starts_with("changed"))
        .collect();
    assert_eq!(changes, vec!["changed grip grip/screw", "changed barrel grip/screw"]);

    // Built fires top-down before the change notifications.
    assert_eq!(log[0], "built ");
    assert_eq!(log[1], "built grip");
}

#[test]
fn detach_notifies_modified_node_then_ancestors() {
    let log = Log::default();
    let mut root = node(barrel(&log));
    root.attach("grip", node(grip(&log))).expect("handle");
    root.attach_at(&NodePath::from("grip"), "screw", node(plain("screw", &[])))
        .expect("any screw");
    log.lock().unwrap().clear();

    let screw = root
        .detach_at(&NodePath::from("grip"), "screw")
        .expect("known slot")
        .expect("screw was attached");
    assert!(screw.cursor().is_root());

    let log = log.lock().unwrap();
    let changes: Vec<&str> = log
        .iter()
        .map(String::as_str)
        .filter(|line| line.starts_with("changed"))
        .collect();
    assert_eq!(changes, vec!["changed grip grip/screw", "changed barrel grip/screw"]);
}

#[test]
fn root_detach_notifies_only_the_root() {
    let log = Log::default();
    let mut root = node(barrel(&log));
    root.attach("grip", node(grip(&log))).expect("handle");
    log.lock().unwrap().clear();

    root.detach("grip").expect("known slot").expect("grip was attached");

    let changes: Vec<String> = log
        .lock()
        .unwrap()
        .iter()
        .filter(|line| line.starts_with("changed"))
        .cloned()
        .collect();
    assert_eq!(changes, vec!["changed barrel /grip"]);
}

/// Mutation is only reachable through the tree's receiver, so a change deep
/// in the tree rebuilds every ancestor's aggregate.
#[test]
fn nested_attach_rebuilds_the_whole_tree() {
    let log = Log::default();
    let mut root = node(barrel(&log));
    root.attach("grip", node(grip(&log))).expect("handle");
    assert_eq!(root.stats().number("damage"), Some(15.0));

    let screw = Arc::new(
        Component::builder("heavy-screw")
            .stats(layer(Priority::forward(0), vec![("damage", StatOp::add(3.0))]))
            .build()
            .expect("valid"),
    );
    root.attach_at(&NodePath::from("grip"), "screw", node(screw))
        .expect("any screw");

    // Forward: =10 +3, reverse: +5.
    assert_eq!(root.stats().number("damage"), Some(18.0));
    assert_eq!(
        root.child("grip").expect("attached").stats().number("damage"),
        Some(8.0)
    );

    root.detach_at(&NodePath::from("grip"), "screw").expect("known slot");
    assert_eq!(root.stats().number("damage"), Some(15.0));
}

#[test]
fn snapshots_restore_system_state() {
    let log = Log::default();
    let mut components: Registry<Component> = Registry::new();
    components.register(barrel(&log)).expect("valid id");
    components
        .register(
            Component::builder("old-grip")
                .tag("handle")
                .system(Arc::new(Wear))
                .stats(layer(Priority::forward(0), vec![("durability", StatOp::set(100.0))]))
                .build()
                .expect("valid"),
        )
        .expect("valid id");

    let blueprint = Blueprint::new(
        "worn-rifle",
        NodeData::new("barrel").with_slot("grip", NodeData::new("old-grip").with_system("wear", json!(30))),
    );

    let root = blueprint.build(&components).expect("all components known");
    assert_eq!(root.stats().number("durability"), Some(70.0));
    assert_eq!(
        root.child("grip")
            .and_then(|grip| grip.system::<WearInstance>())
            .map(|wear| wear.uses),
        Some(30)
    );

    let restored = TreeNode::from_data(&root.to_data(), &components).expect("round trip");
    assert_eq!(restored.to_data(), blueprint.tree);
    assert!(restored.stats().is_empty(), "restored trees are not built");
}

#[test]
fn bad_system_payload_is_reported() {
    let mut components: Registry<Component> = Registry::new();
    components
        .register(Component::builder("old-grip").system(Arc::new(Wear)).build().expect("valid"))
        .expect("valid id");

    let data = NodeData::new("old-grip").with_system("wear", json!("many"));
    let err = TreeNode::from_data(&data, &components).expect_err("payload is not a number");
    assert!(matches!(err, TreeError::SystemLoad { system, .. } if system == "wear"));
}

#[test]
fn layer_rules_gate_stats() {
    let log = Log::default();
    let scope = Arc::new(
        Component::builder("scope")
            .stats(
                layer(Priority::forward(0), vec![("zoom", StatOp::set(4.0))])
                    .with_rule(Rule::at_root("grip", Rule::has_tags(["handle"]))),
            )
            .build()
            .expect("valid"),
    );

    let mut root = node(barrel(&log));
    root.attach("sight", node(scope)).expect("rail");
    assert_eq!(root.stats().number("zoom"), None);

    root.attach("grip", node(grip(&log))).expect("handle");
    assert_eq!(root.stats().number("zoom"), Some(4.0));
    assert_eq!(
        root.child("sight").expect("attached").stats().number("zoom"),
        Some(4.0)
    );
}

#[test]
fn saved_state_for_a_foreign_system_is_rejected() {
    let mut components: Registry<Component> = Registry::new();
    components.register(plain("grip", &["handle"])).expect("valid id");

    let data = NodeData::new("grip").with_system("wear", json!(3));
    let err = TreeNode::from_data(&data, &components).expect_err("grip has no wear system");
    assert!(matches!(
        err,
        TreeError::UnknownSystem { component, system } if component == "grip" && system == "wear"
    ));
}
