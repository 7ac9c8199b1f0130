//! Per-node typed event dispatch.
//!
//! Every [`TreeNode`](crate::tree::TreeNode) owns an [`EventDispatcher`]
//! populated by its system instances. Events are plain structs; a listener
//! registers for one event type with a priority and runs synchronously when
//! the node is called with that type.
//!
//! # Execution Order
//!
//! Listeners run in ascending priority (lower values first). Listeners with
//! equal priority run in registration order.
//!
//! # Cancellation
//!
//! Events implementing [`Cancellable`] carry a flag any listener may set. The
//! code that called the event checks the flag afterwards and aborts the
//! pending operation; later listeners still run.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::tree::{NodePath, NodeRef};

type Handler = Arc<dyn Fn(&NodeRef<'_>, &mut dyn Any) + Send + Sync>;

struct Listener {
    priority: i32,
    handler: Handler,
}

/// An event whose pending operation a listener may veto.
pub trait Cancellable {
    fn cancelled(&self) -> bool;

    fn cancel(&mut self);
}

/// Fired on every node after a build pass has assigned resolved stats.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Built;

/// Fired after a child was attached or detached.
///
/// Called on the modified node first, then on each ancestor up to the node
/// the mutation was issued on. `path` is relative to that node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeChanged {
    pub path: NodePath,
    pub slot: String,
}

/// Typed event bus: event type → listeners ordered by priority.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: HashMap<TypeId, Vec<Listener>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of type `E`.
    pub fn listen<E, F>(&mut self, priority: i32, handler: F)
    where
        E: Any,
        F: Fn(&NodeRef<'_>, &mut E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |node: &NodeRef<'_>, event: &mut dyn Any| {
            if let Some(event) = event.downcast_mut::<E>() {
                handler(node, event);
            }
        });

        let listeners = self.listeners.entry(TypeId::of::<E>()).or_default();
        // After every listener of lower or equal priority.
        let at = listeners.partition_point(|l| l.priority <= priority);
        listeners.insert(at, Listener { priority, handler });
    }

    /// Runs every listener for `E` against `event`.
    pub fn call<E: Any>(&self, node: &NodeRef<'_>, event: &mut E) {
        let Some(listeners) = self.listeners.get(&TypeId::of::<E>()) else {
            return;
        };
        for listener in listeners {
            (listener.handler)(node, &mut *event);
        }
    }

    /// Number of listeners registered for `E`.
    pub fn listeners_of<E: Any>(&self) -> usize {
        self.listeners.get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("event_types", &self.listeners.len())
            .field("listeners", &self.len())
            .finish()
    }
}
