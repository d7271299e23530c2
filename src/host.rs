//! The capabilities the reconciler and event manager require from the surrounding rendering environment.

use crate::spec::Value;
use core::{fmt::Debug, hash::Hash};

/// Stable handle to a node in an arena-backed host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
	#[must_use]
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// A retained-mode tree the reconciler can mutate.
///
/// The reconciler never reads node state through this trait except for child order (to pair
/// host nodes with the previously applied spec) and focus.
///
/// Implementations may treat misuse (for example unknown handles) as a fatal precondition violation.
pub trait Host {
	/// Node identity. Equality must be identity.
	type Node: Clone + Eq + Hash + Debug;
	type Event: HostEvent<Node = Self::Node>;
	/// Handle returned when a listener is attached, needed to detach it again.
	type Listener;

	fn create_element(&mut self, tag: &str) -> Self::Node;
	fn create_text(&mut self, text: &str) -> Self::Node;
	/// Creates a node from opaque markup.
	fn create_markup(&mut self, html: &str) -> Self::Node;

	fn set_text(&mut self, node: &Self::Node, text: &str);
	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str);
	fn remove_attribute(&mut self, node: &Self::Node, name: &str);
	/// Assigns one of the special properties that only take effect through direct assignment.
	fn set_property(&mut self, node: &Self::Node, name: &str, value: &Value);
	/// Resets a special property to a falsy value.
	fn clear_property(&mut self, node: &Self::Node, name: &str);

	fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;
	/// Makes `children` the exact ordered child list of `parent`, detaching any other current children.
	fn replace_child_nodes(&mut self, parent: &Self::Node, children: &[Self::Node]);
	/// Detaches `node` from its parent, if any.
	fn remove_node(&mut self, node: &Self::Node);

	/// The currently focused node, if it is one this host can name.
	fn focused(&self) -> Option<Self::Node>;
	/// Whether focus currently rests on the environment's default (body-level) target.
	fn focus_is_default(&self) -> bool;
	fn focus(&mut self, node: &Self::Node);

	fn add_listener(&mut self, target: &Self::Node, event_name: &str) -> Self::Listener;
	fn remove_listener(&mut self, target: &Self::Node, event_name: &str, listener: Self::Listener);

	/// Whether events of this name reliably reach ancestors during bubbling.
	fn bubbles(&self, event_name: &str) -> bool {
		let _ = event_name;
		true
	}
}

/// An event as delivered to a listener.
pub trait HostEvent {
	type Node;

	/// The node the event was originally fired at.
	fn target(&self) -> Option<Self::Node>;
	fn event_type(&self) -> &str;
}
