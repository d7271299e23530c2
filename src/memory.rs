//! An in-process host tree addressed by stable [`NodeId`] handles.
//!
//! [`MemoryDom`] behaves like a minimal browser document where the reconciler can observe it:
//! focus falls back to the document (see [`Host::focus_is_default`]) when the focused subtree is moved or detached,
//! and [`MemoryDom::fire`] propagates events to the listeners they would reach.
//!
//! It's meant for tests and inspection: removed nodes are only detached, never reclaimed,
//! so their handles stay valid for assertions and the arena grows with every created node.

use crate::{
	host::{Host, HostEvent, NodeId},
	spec::Value,
};
use core::fmt::Write as _;
use std::collections::BTreeMap;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum MemoryNodeKind {
	Element {
		tag: String,
		/// In insertion order.
		attributes: Vec<(String, String)>,
		properties: BTreeMap<String, Value>,
	},
	Text(String),
	Markup(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

#[derive(Debug)]
struct Slot {
	kind: MemoryNodeKind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	listeners: Vec<(String, ListenerId)>,
}

/// An event delivery, as seen by one listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub event_type: String,
	pub target: NodeId,
	/// The node whose listener received this delivery.
	pub current_target: NodeId,
	pub bubbles: bool,
}

impl HostEvent for MemoryEvent {
	type Node = NodeId;

	fn target(&self) -> Option<NodeId> {
		Some(self.target)
	}

	fn event_type(&self) -> &str {
		&self.event_type
	}
}

/// The document body is [`MemoryDom::body`], which always exists.
#[derive(Debug)]
pub struct MemoryDom {
	nodes: Vec<Slot>,
	focused: Option<NodeId>,
	next_listener: u32,
	mutations: usize,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	#[must_use]
	pub fn new() -> Self {
		let mut dom = Self {
			nodes: Vec::new(),
			focused: None,
			next_listener: 0,
			mutations: 0,
		};
		dom.allocate(MemoryNodeKind::Element {
			tag: "body".to_owned(),
			attributes: Vec::new(),
			properties: BTreeMap::new(),
		});
		dom
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		NodeId(0)
	}

	/// Creates an element and appends it to the body, ready to serve as a reconciliation root.
	pub fn create_root(&mut self, tag: &str) -> NodeId {
		let root = self.create_element(tag);
		let body = self.body();
		self.append_child(body, root);
		root
	}

	pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
		self.detach(child);
		self.slot_mut(parent).children.push(child);
		self.slot_mut(child).parent = Some(parent);
		self.mutations += 1;
	}

	/// Total number of mutations applied so far.
	#[must_use]
	pub fn mutation_count(&self) -> usize {
		self.mutations
	}

	#[must_use]
	pub fn kind(&self, node: NodeId) -> &MemoryNodeKind {
		&self.slot(node).kind
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.slot(node).parent
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.slot(node).children
	}

	#[must_use]
	pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
		self.children(node).first().copied()
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.slot(node).kind {
			MemoryNodeKind::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str()),
			_ => None,
		}
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<&Value> {
		match &self.slot(node).kind {
			MemoryNodeKind::Element { properties, .. } => properties.get(name),
			_ => None,
		}
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId, event_name: &str) -> usize {
		self.slot(node).listeners.iter().filter(|(name, _)| name == event_name).count()
	}

	/// Whether `node` is `ancestor` or one of its descendants.
	#[must_use]
	pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(n) = current {
			if n == ancestor {
				return true;
			}
			current = self.slot(n).parent;
		}
		false
	}

	/// Fires an event at `target`.
	///
	/// Returns one delivery per listener reached, target first, then (if `bubbles`) each ancestor's.
	/// Pass each to [`EventManager::dispatch`](`crate::events::EventManager::dispatch`).
	#[must_use]
	pub fn fire(&self, target: NodeId, event_type: &str, bubbles: bool) -> Vec<MemoryEvent> {
		let mut deliveries = Vec::new();
		let mut current = Some(target);
		while let Some(node) = current {
			for (name, _) in &self.slot(node).listeners {
				if name == event_type {
					deliveries.push(MemoryEvent {
						event_type: event_type.to_owned(),
						target,
						current_target: node,
						bubbles,
					});
				}
			}
			if !bubbles {
				break;
			}
			current = self.slot(node).parent;
		}
		deliveries
	}

	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for &child in self.children(node) {
			self.write_html(&mut html, child);
		}
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(&mut html, node);
		html
	}

	fn write_html(&self, html: &mut String, node: NodeId) {
		match &self.slot(node).kind {
			MemoryNodeKind::Element { tag, attributes, .. } => {
				html.push('<');
				html.push_str(tag);
				for (name, value) in attributes {
					// Writing to a `String` can't fail.
					let _ = write!(html, " {}=\"{}\"", name, escape(value, true));
				}
				html.push('>');
				for &child in self.children(node) {
					self.write_html(html, child);
				}
				let _ = write!(html, "</{}>", tag);
			}
			MemoryNodeKind::Text(text) => html.push_str(&escape(text, false)),
			MemoryNodeKind::Markup(markup) => html.push_str(markup),
		}
	}

	fn allocate(&mut self, kind: MemoryNodeKind) -> NodeId {
		let id = NodeId(u32::try_from(self.nodes.len()).expect("Too many nodes."));
		self.nodes.push(Slot {
			kind,
			parent: None,
			children: Vec::new(),
			listeners: Vec::new(),
		});
		self.mutations += 1;
		id
	}

	fn slot(&self, node: NodeId) -> &Slot {
		self.nodes.get(node.index()).unwrap_or_else(|| panic!("Unknown node {:?}.", node))
	}

	fn slot_mut(&mut self, node: NodeId) -> &mut Slot {
		self.nodes.get_mut(node.index()).unwrap_or_else(|| panic!("Unknown node {:?}.", node))
	}

	/// Unlinks `node` from its parent. Focus inside it falls back to the body.
	fn detach(&mut self, node: NodeId) {
		if let Some(focused) = self.focused {
			if self.contains(node, focused) {
				trace!(?focused, "Focused subtree detached. Blurring.");
				self.focused = None;
			}
		}
		if let Some(parent) = self.slot_mut(node).parent.take() {
			self.slot_mut(parent).children.retain(|&child| child != node);
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<(&mut Vec<(String, String)>, &mut BTreeMap<String, Value>)> {
		match &mut self.slot_mut(node).kind {
			MemoryNodeKind::Element { attributes, properties, .. } => Some((attributes, properties)),
			_ => None,
		}
	}
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

impl Host for MemoryDom {
	type Node = NodeId;
	type Event = MemoryEvent;
	type Listener = ListenerId;

	fn create_element(&mut self, tag: &str) -> NodeId {
		self.allocate(MemoryNodeKind::Element {
			tag: tag.to_owned(),
			attributes: Vec::new(),
			properties: BTreeMap::new(),
		})
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		self.allocate(MemoryNodeKind::Text(text.to_owned()))
	}

	fn create_markup(&mut self, html: &str) -> NodeId {
		self.allocate(MemoryNodeKind::Markup(html.to_owned()))
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		match &mut self.slot_mut(*node).kind {
			MemoryNodeKind::Text(data) => *data = text.to_owned(),
			other => panic!("Tried to set text of {:?}.", other),
		}
		self.mutations += 1;
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		let (attributes, _) = self.element_mut(*node).unwrap_or_else(|| panic!("Tried to set attribute {:?} on a non-element.", name));
		match attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, v)) => *v = value.to_owned(),
			None => attributes.push((name.to_owned(), value.to_owned())),
		}
		self.mutations += 1;
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		if let Some((attributes, _)) = self.element_mut(*node) {
			attributes.retain(|(n, _)| n != name);
		}
		self.mutations += 1;
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: &Value) {
		let (_, properties) = self.element_mut(*node).unwrap_or_else(|| panic!("Tried to set property {:?} on a non-element.", name));
		properties.insert(name.to_owned(), value.clone());
		self.mutations += 1;
	}

	fn clear_property(&mut self, node: &NodeId, name: &str) {
		self.set_property(node, name, &Value::Bool(false));
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		self.children(*node).to_vec()
	}

	fn replace_child_nodes(&mut self, parent: &NodeId, children: &[NodeId]) {
		let parent = *parent;
		for old in self.child_nodes(&parent) {
			self.detach(old);
		}
		for &child in children {
			self.detach(child);
			self.slot_mut(child).parent = Some(parent);
			self.slot_mut(parent).children.push(child);
		}
		self.mutations += 1;
	}

	fn remove_node(&mut self, node: &NodeId) {
		self.detach(*node);
		self.mutations += 1;
	}

	fn focused(&self) -> Option<NodeId> {
		self.focused
	}

	fn focus_is_default(&self) -> bool {
		self.focused.is_none()
	}

	fn focus(&mut self, node: &NodeId) {
		// Only nodes in the document can take focus.
		if self.contains(self.body(), *node) {
			self.focused = Some(*node);
		}
		self.mutations += 1;
	}

	fn add_listener(&mut self, target: &NodeId, event_name: &str) -> ListenerId {
		let id = ListenerId(self.next_listener);
		self.next_listener += 1;
		self.slot_mut(*target).listeners.push((event_name.to_owned(), id));
		self.mutations += 1;
		id
	}

	fn remove_listener(&mut self, target: &NodeId, event_name: &str, listener: ListenerId) {
		self.slot_mut(*target).listeners.retain(|(name, id)| !(name == event_name && *id == listener));
		self.mutations += 1;
	}
}
