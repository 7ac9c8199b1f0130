use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{NodeData, NodePath, NodeRef, Rejected, TreeError};
use crate::component::Component;
use crate::event::{Built, EventDispatcher, TreeChanged};
use crate::registry::Registry;
use crate::rule::RuleContext;
use crate::stat::{StatLayer, StatMap, resolve};
use crate::system::SystemInstance;

/// Mutable runtime instance of a [`Component`].
pub struct TreeNode {
    pub(super) value: Arc<Component>,
    pub(super) children: BTreeMap<String, TreeNode>,
    pub(super) systems: BTreeMap<String, Box<dyn SystemInstance>>,
    pub(super) events: EventDispatcher,
    pub(super) stats: StatMap,
}

impl TreeNode {
    /// Instantiates `value` as a detached node with no children.
    pub fn new(value: Arc<Component>) -> Result<Self, TreeError> {
        check_dependencies(&value)?;
        let systems = value
            .systems()
            .map(|system| (system.id().to_owned(), system.instantiate()))
            .collect();
        Ok(Self::assemble(value, systems))
    }

    fn assemble(value: Arc<Component>, systems: BTreeMap<String, Box<dyn SystemInstance>>) -> Self {
        let mut events = EventDispatcher::new();
        for instance in systems.values() {
            instance.register(&mut events);
        }
        Self {
            value,
            children: BTreeMap::new(),
            systems,
            events,
            stats: StatMap::new(),
        }
    }

    pub fn value(&self) -> &Arc<Component> {
        &self.value
    }

    pub fn id(&self) -> &str {
        self.value.id()
    }

    pub fn children(&self) -> &BTreeMap<String, TreeNode> {
        &self.children
    }

    pub fn child(&self, slot: &str) -> Option<&TreeNode> {
        self.children.get(slot)
    }

    pub fn node(&self, path: &NodePath) -> Option<&TreeNode> {
        path.iter().try_fold(self, |node, key| node.children.get(key))
    }

    fn node_mut(&mut self, path: &NodePath) -> Option<&mut TreeNode> {
        path.iter()
            .try_fold(self, |node, key| node.children.get_mut(key))
    }

    /// Cursor with this node as the root.
    pub fn cursor(&self) -> NodeRef<'_> {
        NodeRef::root_of(self)
    }

    pub fn cursor_at(&self, path: &NodePath) -> Option<NodeRef<'_>> {
        self.cursor().node_at(path)
    }

    /// Visits the tree pre-order from this node.
    pub fn visit<'a>(&'a self, mut f: impl FnMut(&NodeRef<'a>)) {
        self.cursor().visit(&mut f);
    }

    /// Stats resolved by the last build pass.
    pub fn stats(&self) -> &StatMap {
        &self.stats
    }

    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    pub fn system<T: SystemInstance>(&self) -> Option<&T> {
        self.systems
            .values()
            .find_map(|instance| instance.as_any().downcast_ref::<T>())
    }

    /// Returns true if every required slot is filled.
    pub fn required_filled(&self) -> bool {
        self.value
            .slots()
            .iter()
            .filter(|slot| slot.required())
            .all(|slot| self.children.contains_key(slot.key()))
    }

    /// Returns true if every required slot is filled by a complete child.
    pub fn complete(&self) -> bool {
        self.value
            .slots()
            .iter()
            .filter(|slot| slot.required())
            .all(|slot| self.children.get(slot.key()).is_some_and(TreeNode::complete))
    }

    pub fn attach(&mut self, slot: &str, candidate: TreeNode) -> Result<Option<TreeNode>, Rejected> {
        self.attach_at(&NodePath::new(), slot, candidate)
    }

    /// Attaches `candidate` to `slot` of the node at `path`.
    ///
    /// Returns the child it replaced. On failure the tree is untouched and the
    /// candidate is handed back in the error.
    pub fn attach_at(
        &mut self,
        path: &NodePath,
        slot: &str,
        candidate: TreeNode,
    ) -> Result<Option<TreeNode>, Rejected> {
        if let Err(error) = self.check_attach(path, slot, &candidate) {
            return Err(Rejected { error, candidate });
        }

        let candidate_id = candidate.id().to_owned();
        let previous = match self.node_mut(path) {
            Some(parent) => parent.children.insert(slot.to_owned(), candidate),
            None => {
                return Err(Rejected {
                    error: TreeError::NoNode(path.clone()),
                    candidate,
                });
            }
        };

        debug!(
            target: "sokol::tree",
            path = %path,
            slot,
            child = candidate_id.as_str(),
            replaced = previous.is_some(),
            "attached child"
        );

        self.build();
        self.notify(path, slot);
        Ok(previous)
    }

    fn check_attach(&self, path: &NodePath, slot: &str, candidate: &TreeNode) -> Result<(), TreeError> {
        let parent = self
            .cursor_at(path)
            .ok_or_else(|| TreeError::NoNode(path.clone()))?;
        let component = parent.value();
        let definition = component.slot(slot).ok_or_else(|| TreeError::NoSlot {
            component: component.id().to_owned(),
            slot: slot.to_owned(),
        })?;

        if !definition.compatible(&parent, Some(candidate)) {
            return Err(TreeError::Incompatible {
                component: component.id().to_owned(),
                slot: slot.to_owned(),
                candidate: candidate.id().to_owned(),
            });
        }
        Ok(())
    }

    pub fn detach(&mut self, slot: &str) -> Result<Option<TreeNode>, TreeError> {
        self.detach_at(&NodePath::new(), slot)
    }

    /// Removes the child in `slot` of the node at `path`.
    ///
    /// The removed child becomes its own root.
    pub fn detach_at(&mut self, path: &NodePath, slot: &str) -> Result<Option<TreeNode>, TreeError> {
        let parent = self
            .node_mut(path)
            .ok_or_else(|| TreeError::NoNode(path.clone()))?;
        if parent.value.slot(slot).is_none() {
            return Err(TreeError::NoSlot {
                component: parent.id().to_owned(),
                slot: slot.to_owned(),
            });
        }

        let removed = parent.children.remove(slot);
        if removed.is_some() {
            debug!(target: "sokol::tree", path = %path, slot, "detached child");
            self.build();
            self.notify(path, slot);
        }
        Ok(removed)
    }

    /// Fires [`TreeChanged`] on the node at `path`, then on each ancestor.
    fn notify(&self, path: &NodePath, slot: &str) {
        let mut event = TreeChanged {
            path: path.clone(),
            slot: slot.to_owned(),
        };
        let mut cursor = self.cursor_at(path);
        while let Some(node) = cursor {
            node.call(&mut event);
            cursor = node.parent();
        }
    }

    /// Resolves the stats of this node and every descendant, then fires
    /// [`Built`] on each of them.
    ///
    /// A node's map covers its own active layers and every descendant's.
    pub fn build(&mut self) {
        let resolved = {
            let mut resolved = Vec::new();
            collect_layers(&self.cursor(), &mut resolved);
            resolved
        };

        let nodes = resolved.len();
        for (path, stats) in resolved {
            if let Some(node) = self.node_mut(&path) {
                node.stats = stats;
            }
        }

        self.cursor().visit(&mut |node| node.call(&mut Built));
        debug!(
            target: "sokol::tree",
            root = self.id(),
            nodes,
            stats = self.stats.len(),
            "built tree"
        );
    }

    /// Deep copy with fresh system instances and dispatchers.
    pub fn copy(&self) -> TreeNode {
        let systems = self
            .systems
            .iter()
            .map(|(id, instance)| (id.clone(), instance.copy()))
            .collect();
        let mut node = Self::assemble(Arc::clone(&self.value), systems);
        node.children = self
            .children
            .iter()
            .map(|(key, child)| (key.clone(), child.copy()))
            .collect();
        node.stats = self.stats.clone();
        node
    }

    pub fn to_data(&self) -> NodeData {
        NodeData {
            value: self.value.id().to_owned(),
            slots: self
                .children
                .iter()
                .map(|(key, child)| (key.clone(), child.to_data()))
                .collect(),
            systems: self
                .systems
                .iter()
                .filter_map(|(id, instance)| Some((id.clone(), instance.save()?)))
                .collect(),
        }
    }

    /// Reconstructs a detached tree from a snapshot.
    ///
    /// Children are checked against their slot rules in declaration order,
    /// with the partially restored node as their parent. The result is not
    /// built.
    pub fn from_data(data: &NodeData, components: &Registry<Component>) -> Result<TreeNode, TreeError> {
        let value = components
            .get(&data.value)
            .ok_or_else(|| TreeError::UnknownComponent(data.value.clone()))?;
        check_dependencies(value)?;

        if let Some(key) = data.slots.keys().find(|key| value.slot(key).is_none()) {
            return Err(TreeError::NoSlot {
                component: value.id().to_owned(),
                slot: key.clone(),
            });
        }
        if let Some(id) = data.systems.keys().find(|id| !value.has_system(id)) {
            return Err(TreeError::UnknownSystem {
                component: value.id().to_owned(),
                system: id.clone(),
            });
        }

        let mut systems = BTreeMap::new();
        for system in value.systems() {
            let instance = match data.systems.get(system.id()) {
                Some(payload) => system.load(payload).map_err(|source| TreeError::SystemLoad {
                    system: system.id().to_owned(),
                    source,
                })?,
                None => system.instantiate(),
            };
            systems.insert(system.id().to_owned(), instance);
        }

        let mut node = Self::assemble(Arc::clone(value), systems);
        for slot in value.slots() {
            let Some(child) = data.slots.get(slot.key()) else {
                continue;
            };
            let child = Self::from_data(child, components)?;
            if !slot.compatible(&node.cursor(), Some(&child)) {
                return Err(TreeError::Incompatible {
                    component: value.id().to_owned(),
                    slot: slot.key().to_owned(),
                    candidate: child.id().to_owned(),
                });
            }
            node.children.insert(slot.key().to_owned(), child);
        }
        Ok(node)
    }
}

/// Gathers the active layers of `node` and its subtree, pushing the resolved
/// map of every visited node into `out`.
///
/// Each layer's rule is evaluated against the node that owns it. Owner layers
/// come before children's, children in slot declaration order.
fn collect_layers<'a>(node: &NodeRef<'a>, out: &mut Vec<(NodePath, StatMap)>) -> Vec<Cow<'a, StatLayer>> {
    let ctx = RuleContext::of(node);
    let active = |layer: &StatLayer| {
        layer
            .rule
            .as_ref()
            .is_none_or(|rule| rule.applies(node, &ctx))
    };

    let mut layers: Vec<Cow<'a, StatLayer>> = node
        .value()
        .stats()
        .iter()
        .filter(|layer| active(*layer))
        .map(Cow::Borrowed)
        .collect();

    for instance in node.node().systems.values() {
        layers.extend(
            instance
                .build_stats(node)
                .into_iter()
                .filter(|layer| active(layer))
                .map(Cow::Owned),
        );
    }

    for child in node.children() {
        layers.extend(collect_layers(&child, out));
    }

    out.push((node.path(), resolve(layers.iter().map(|layer| &**layer))));
    layers
}

fn check_dependencies(value: &Component) -> Result<(), TreeError> {
    for system in value.systems() {
        if let Some(missing) = system
            .dependencies()
            .iter()
            .find(|dependency| !value.has_system(dependency))
        {
            return Err(TreeError::MissingDependency {
                component: value.id().to_owned(),
                system: system.id().to_owned(),
                dependency: (*missing).to_owned(),
            });
        }
    }
    Ok(())
}

impl Clone for TreeNode {
    fn clone(&self) -> Self {
        self.copy()
    }
}

impl fmt::Debug for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("value", &self.value.id())
            .field("children", &self.children)
            .field("systems", &self.systems.keys().collect::<Vec<_>>())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Slot;
    use crate::rule::Rule;
    use crate::stat::{Priority, StatOp};

    fn leaf(id: &str, tags: &[&str], layers: Vec<StatLayer>) -> Arc<Component> {
        let mut builder = Component::builder(id).tags(tags.iter().copied());
        for layer in layers {
            builder = builder.stats(layer);
        }
        Arc::new(builder.build().unwrap())
    }

    fn layer(priority: Priority, ops: Vec<(&str, StatOp)>) -> StatLayer {
        StatLayer::new(priority, StatMap::from_ops(ops).unwrap())
    }

    fn barrel() -> Arc<Component> {
        Arc::new(
            Component::builder("barrel")
                .slot(
                    Slot::new("grip")
                        .unwrap()
                        .with_tag("required")
                        .with_rule(Rule::has_tags(["handle"])),
                )
                .slot(Slot::new("sight").unwrap())
                .stats(layer(Priority::forward(0), vec![("damage", StatOp::set(10.0))]))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn attach_rejects_unknown_slot() {
        let mut root = TreeNode::new(barrel()).unwrap();
        let grip = TreeNode::new(leaf("grip", &["handle"], Vec::new())).unwrap();

        let rejected = root.attach("stock", grip).unwrap_err();
        assert!(matches!(rejected.error, TreeError::NoSlot { .. }));
        assert_eq!(rejected.candidate.id(), "grip");
        assert!(root.children().is_empty());
    }

    #[test]
    fn attach_at_unresolved_path() {
        let mut root = TreeNode::new(barrel()).unwrap();
        let grip = TreeNode::new(leaf("grip", &["handle"], Vec::new())).unwrap();

        let rejected = root
            .attach_at(&NodePath::from("sight"), "grip", grip)
            .unwrap_err();
        assert!(matches!(rejected.error, TreeError::NoNode(_)));
    }

    #[test]
    fn attach_returns_replaced_child() {
        let mut root = TreeNode::new(barrel()).unwrap();
        let first = TreeNode::new(leaf("grip", &["handle"], Vec::new())).unwrap();
        let second = TreeNode::new(leaf("long-grip", &["handle"], Vec::new())).unwrap();

        assert!(root.attach("grip", first).unwrap().is_none());
        let replaced = root.attach("grip", second).unwrap().unwrap();

        assert_eq!(replaced.id(), "grip");
        assert!(replaced.cursor().is_root());
        assert_eq!(root.child("grip").unwrap().id(), "long-grip");
    }

    #[test]
    fn detach_orphans_child() {
        let mut root = TreeNode::new(barrel()).unwrap();
        root.attach("grip", TreeNode::new(leaf("grip", &["handle"], Vec::new())).unwrap())
            .unwrap();

        let grip = root.detach("grip").unwrap().unwrap();
        assert!(grip.cursor().is_root());
        assert!(root.child("grip").is_none());
        assert!(root.detach("grip").unwrap().is_none());
        assert!(matches!(root.detach("stock"), Err(TreeError::NoSlot { .. })));
    }

    #[test]
    fn visit_is_pre_order_in_slot_order() {
        let mut root = TreeNode::new(barrel()).unwrap();
        root.attach("sight", TreeNode::new(leaf("scope", &[], Vec::new())).unwrap())
            .unwrap();
        root.attach("grip", TreeNode::new(leaf("grip", &["handle"], Vec::new())).unwrap())
            .unwrap();

        let mut seen = Vec::new();
        root.visit(|node| seen.push(format!("{}@{}", node.value().id(), node.path())));
        assert_eq!(seen, vec!["barrel@", "grip@grip", "scope@sight"]);
    }

    #[test]
    fn children_contribute_to_parent_stats() {
        let mut root = TreeNode::new(barrel()).unwrap();
        let grip = leaf(
            "grip",
            &["handle"],
            vec![layer(Priority::forward(0), vec![("damage", StatOp::add(2.0))])],
        );
        root.attach("grip", TreeNode::new(grip).unwrap()).unwrap();

        assert_eq!(root.stats().number("damage"), Some(12.0));
        // The child's own map only covers its subtree.
        assert_eq!(root.child("grip").unwrap().stats().number("damage"), Some(2.0));
    }

    #[test]
    fn layer_rules_see_the_owner_in_its_tree() {
        let scope = leaf(
            "scope",
            &[],
            vec![
                layer(Priority::forward(0), vec![("zoom", StatOp::set(4.0))])
                    .with_rule(Rule::as_parent(Rule::IsRoot)),
            ],
        );
        let mut root = TreeNode::new(barrel()).unwrap();
        let mut detached = TreeNode::new(Arc::clone(&scope)).unwrap();
        detached.build();
        assert_eq!(detached.stats().number("zoom"), None);

        root.attach("sight", TreeNode::new(scope).unwrap()).unwrap();
        assert_eq!(root.stats().number("zoom"), Some(4.0));
    }

    #[test]
    fn completeness_is_recursive() {
        let grip = Arc::new(
            Component::builder("grip")
                .tag("handle")
                .slot(Slot::new("screw").unwrap().with_tag("required"))
                .build()
                .unwrap(),
        );
        let mut root = TreeNode::new(barrel()).unwrap();
        root.attach("grip", TreeNode::new(grip).unwrap()).unwrap();

        assert!(root.required_filled());
        assert!(!root.complete());

        root.attach_at(
            &NodePath::from("grip"),
            "screw",
            TreeNode::new(leaf("screw", &[], Vec::new())).unwrap(),
        )
        .unwrap();
        assert!(root.complete());
    }

    #[test]
    fn snapshot_round_trip() {
        let mut components: Registry<Component> = Registry::new();
        components.register(barrel()).unwrap();
        components
            .register(leaf("grip", &["handle"], Vec::new()))
            .unwrap();

        let data = NodeData::new("barrel").with_slot("grip", NodeData::new("grip"));
        let node = TreeNode::from_data(&data, &components).unwrap();
        assert_eq!(node.to_data(), data);
    }

    #[test]
    fn from_data_checks_components_and_slots() {
        let mut components: Registry<Component> = Registry::new();
        components.register(barrel()).unwrap();
        components.register(leaf("stock", &[], Vec::new())).unwrap();

        let unknown = NodeData::new("rifle");
        assert!(matches!(
            TreeNode::from_data(&unknown, &components),
            Err(TreeError::UnknownComponent(id)) if id == "rifle"
        ));

        let no_slot = NodeData::new("barrel").with_slot("muzzle", NodeData::new("stock"));
        assert!(matches!(
            TreeNode::from_data(&no_slot, &components),
            Err(TreeError::NoSlot { .. })
        ));

        let incompatible = NodeData::new("barrel").with_slot("grip", NodeData::new("stock"));
        assert!(matches!(
            TreeNode::from_data(&incompatible, &components),
            Err(TreeError::Incompatible { .. })
        ));

        let stray = NodeData::new("stock").with_system("wear", serde_json::json!(3));
        assert!(matches!(
            TreeNode::from_data(&stray, &components),
            Err(TreeError::UnknownSystem { system, .. }) if system == "wear"
        ));
    }
}
