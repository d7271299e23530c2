use crate::{
	events::Events,
	host::Host,
	props,
	spec::{self, Element, EventMap, PropMap, Spec, VNode, Versioned},
};
use core::fmt;
use hashbrown::{hash_map::Entry, HashMap};
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span, warn};

/// A host child paired with the spec it was last reconciled against.
struct Applied<N> {
	node: N,
	spec: Spec,
}

type SpecMap<N> = HashMap<String, Applied<N>>;

/// Applies spec trees to a host tree, reusing host nodes by effective key.
///
/// Also keeps track of focus across a pass: if the focused node is moved or replaced and focus
/// falls back to the host's default target, it's restored afterwards.
/// A freshly created element with an `autofocus` prop takes precedence.
pub struct Reconciler<H: Host> {
	active: Option<H::Node>,
	auto_focus: Option<H::Node>,
}

impl<H: Host> Default for Reconciler<H> {
	fn default() -> Self {
		Self::new()
	}
}

impl<H: Host> fmt::Debug for Reconciler<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Reconciler")
			.field("active", &self.active)
			.field("auto_focus", &self.auto_focus)
			.finish()
	}
}

impl<H: Host> Reconciler<H> {
	#[must_use]
	pub fn new() -> Self {
		Self { active: None, auto_focus: None }
	}

	/// Makes the children of `root` match `after`, given that they currently match `before`.
	///
	/// `before` must be the spec returned by the previous call for this `root` (or [`spec::empty`] initially).
	/// It's read as-is. `after` is resolved to its latest version at every level.
	///
	/// Returns the fully resolved spec that now describes `root`'s children.
	#[instrument(skip(self, host, events, before, after))]
	pub fn reconcile<E: Events<H> + ?Sized>(&mut self, host: &mut H, events: &mut E, root: &H::Node, before: &Spec, after: &Spec) -> Spec {
		self.auto_focus = None;
		self.active = host.focused().filter(|focused| focused != root);

		let spec = self.update_children(host, events, root, before, after);

		let restore = self.auto_focus.take().or_else(|| self.active.take());
		self.active = None;
		if let Some(node) = restore {
			if host.focus_is_default() {
				trace!(?node, "Restoring focus.");
				host.focus(&node);
			}
		}
		spec
	}

	fn update_children<E: Events<H> + ?Sized>(&mut self, host: &mut H, events: &mut E, parent: &H::Node, before: &Spec, after: &Spec) -> Spec {
		let (mut before_map, shadowed) = Self::to_spec_map(host, parent, before);

		let after = spec::latest(after);
		let mut child_nodes = Vec::new();
		let spec = spec::map_child("", &after, &mut |key, spec| {
			let was_active = match (&self.active, before_map.get(&key)) {
				(Some(active), Some(applied)) => *active == applied.node,
				_ => false,
			};
			let Applied { node, spec } = self.update_node(host, events, &mut before_map, key, spec);
			if was_active {
				self.active = Some(node.clone());
			}
			child_nodes.push(node);
			spec
		});

		for (key, removed) in before_map.into_iter().chain(shadowed) {
			let span = trace_span!("Removing", key = key.as_str(), kind = kind_name(removed.spec.value()));
			let _enter = span.enter();
			self.release_subtree(host, events, &removed.node);
			host.remove_node(&removed.node);
		}

		Self::replace_child_nodes(host, parent, &child_nodes);
		spec
	}

	/// Pairs the current host children of `parent` with the leaves of `before`.
	///
	/// This relies on the previous pass having left them in the same order.
	/// Of siblings sharing an effective key, the last one is mapped and the others are returned separately.
	fn to_spec_map(host: &H, parent: &H::Node, before: &Spec) -> (SpecMap<H::Node>, Vec<(String, Applied<H::Node>)>) {
		let mut map = SpecMap::new();
		let mut shadowed = Vec::new();
		let mut children = host.child_nodes(parent).into_iter();
		spec::for_each_child("", before, &mut |key, spec| {
			let node = match children.next() {
				Some(node) => node,
				None => {
					error!(key = key.as_str(), "Expected host child beyond end of child list. Will recreate.");
					return;
				}
			};
			match map.entry(key) {
				Entry::Occupied(mut occupied) => {
					warn!(key = occupied.key().as_str(), "Duplicate effective key. The later sibling wins.");
					let earlier = occupied.insert(Applied { node, spec: spec.clone() });
					shadowed.push((occupied.key().clone(), earlier));
				}
				Entry::Vacant(vacant) => {
					vacant.insert(Applied { node, spec: spec.clone() });
				}
			}
		});
		(map, shadowed)
	}

	fn update_node<E: Events<H> + ?Sized>(&mut self, host: &mut H, events: &mut E, before_map: &mut SpecMap<H::Node>, key: String, spec: &Spec) -> Applied<H::Node> {
		let Applied { node, spec: before } = match before_map.remove(&key) {
			Some(applied) if applied.spec.value().same_kind(spec.value()) => applied,
			mismatched => {
				// A mismatched predecessor stays mapped, to be removed with the unmatched ones.
				if let Some(applied) = mismatched {
					before_map.insert(key.clone(), applied);
				}
				let span = trace_span!("Creating", key = key.as_str(), kind = kind_name(spec.value()));
				let _enter = span.enter();
				return self.create_node(host, events, spec);
			}
		};
		let span = trace_span!("Updating", key = key.as_str(), kind = kind_name(spec.value()));
		let _enter = span.enter();
		match (before.value(), spec.value()) {
			(VNode::Text { value: before, .. }, VNode::Text { value: after, .. }) => {
				if before != after {
					trace!("Updating text.");
					host.set_text(&node, after);
				}
				Applied { node, spec: spec.clone() }
			}
			(VNode::RawMarkup { html: before, .. }, VNode::RawMarkup { html: after, .. }) => {
				if before == after {
					return Applied { node, spec: spec.clone() };
				}
				trace!("Replacing raw markup.");
				self.release_subtree(host, events, &node);
				host.remove_node(&node);
				Applied {
					node: host.create_markup(after),
					spec: spec.clone(),
				}
			}
			(VNode::Element(before), VNode::Element(_)) => {
				let spec = self.update_element(host, events, &node, before, spec);
				Applied { node, spec }
			}
			_ => unreachable!("`same_kind` only matches leaves of the same kind."),
		}
	}

	fn create_node<E: Events<H> + ?Sized>(&mut self, host: &mut H, events: &mut E, spec: &Spec) -> Applied<H::Node> {
		match spec.value() {
			VNode::Text { value, .. } => Applied {
				node: host.create_text(value),
				spec: spec.clone(),
			},
			VNode::RawMarkup { html, .. } => Applied {
				node: host.create_markup(html),
				spec: spec.clone(),
			},
			VNode::Element(element) => {
				let node = host.create_element(&element.tag);
				if spec::latest(&element.props).value().contains_key("autofocus") {
					trace!(?node, "Remembering autofocus target.");
					self.auto_focus = Some(node.clone());
				}
				let blank = Element {
					tag: element.tag.clone(),
					key: element.key.clone(),
					props: Versioned::new(PropMap::new()),
					events: EventMap::new(),
					contents: spec::empty(),
				};
				let spec = self.update_element(host, events, &node, &blank, spec);
				Applied { node, spec }
			}
			VNode::Empty | VNode::Fragment { .. } => unreachable!("Fragments are flattened before matching."),
		}
	}

	/// Syncs props, events and children of an element node.
	///
	/// Returns `after` itself if neither its props nor its contents resolved to anything new.
	fn update_element<E: Events<H> + ?Sized>(&mut self, host: &mut H, events: &mut E, node: &H::Node, before: &Element, after: &Spec) -> Spec {
		let element = match after.value() {
			VNode::Element(element) => element,
			other => unreachable!("Expected element, found {:?}.", kind_name(other)),
		};

		let props = spec::latest(&element.props);
		props::update(host, node, before.props.value(), props.value());
		events.update(host, node, &before.events, &element.events);

		let contents = self.update_children(host, events, node, &before.contents, &element.contents);
		if Rc::ptr_eq(&contents, &element.contents) && Rc::ptr_eq(&props, &element.props) {
			return after.clone();
		}
		Versioned::new(VNode::Element(Element {
			props,
			contents,
			..element.clone()
		}))
	}

	/// Releases event bindings of `node` and all its descendants.
	///
	/// Forgets the focused node if it is among them, as it's about to leave the tree.
	fn release_subtree<E: Events<H> + ?Sized>(&mut self, host: &mut H, events: &mut E, node: &H::Node) {
		for child in host.child_nodes(node) {
			self.release_subtree(host, events, &child);
		}
		if self.active.as_ref() == Some(node) {
			trace!(?node, "Focused node is being removed.");
			self.active = None;
		}
		events.release(host, node);
	}

	/// Skips the host update if `children` already is the exact child list, to leave e.g. selections alone.
	fn replace_child_nodes(host: &mut H, parent: &H::Node, children: &[H::Node]) {
		if host.child_nodes(parent) == children {
			return;
		}
		trace!(count = children.len(), "Replacing child nodes.");
		host.replace_child_nodes(parent, children);
	}
}

fn kind_name(node: &VNode) -> &str {
	match node {
		VNode::Empty => "empty",
		VNode::Text { .. } => "text",
		VNode::RawMarkup { .. } => "raw markup",
		VNode::Element(element) => &element.tag,
		VNode::Fragment { .. } => "fragment",
	}
}
