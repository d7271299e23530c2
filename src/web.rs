//! The browser DOM as [`Host`].
//!
//! DOM nodes are addressed through [`NodeId`] handles. Each adopted node carries its handle in an expando property,
//! which is how event targets are resolved.
//! Handles are freed when the reconciler removes a node.

use crate::{
	host::{Host, HostEvent, NodeId},
	spec::Value,
};
use core::cell::RefCell;
use js_sys::{Array, Function, Object, Reflect};
use tracing::{error, instrument, trace, warn};
use wasm_bindgen::{JsCast, JsValue, UnwrapThrowExt};

const HANDLE_PROPERTY: &str = "__reconcileDomHandle";

#[derive(Debug, Default)]
struct Arena {
	nodes: Vec<Option<web_sys::Node>>,
	free: Vec<u32>,
}

impl Arena {
	fn adopt(&mut self, node: &web_sys::Node) -> NodeId {
		let id = match self.free.pop() {
			Some(index) => {
				self.nodes[index as usize] = Some(node.clone());
				NodeId(index)
			}
			None => {
				self.nodes.push(Some(node.clone()));
				NodeId(u32::try_from(self.nodes.len() - 1).expect_throw("reconcile-dom: Too many DOM nodes."))
			}
		};
		if let Err(error) = Reflect::set(node, &HANDLE_PROPERTY.into(), &JsValue::from(id.0)) {
			error!("Failed to tag DOM node with its handle: {:?}", error);
		}
		id
	}

	fn lookup(&self, value: &JsValue) -> Option<NodeId> {
		let index = Reflect::get(value, &HANDLE_PROPERTY.into()).ok()?.as_f64()?;
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let id = NodeId(index as u32);
		match self.nodes.get(id.index()) {
			Some(Some(node)) if Object::is(node, value) => Some(id),
			_ => None,
		}
	}

	fn free(&mut self, id: NodeId) {
		if let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) {
			if let Err(error) = Reflect::delete_property(node.unchecked_ref::<Object>(), &HANDLE_PROPERTY.into()) {
				warn!("Failed to untag freed DOM node: {:?}", error);
			}
			self.free.push(id.0);
		}
	}
}

/// An event together with its resolved target handle.
#[derive(Debug, Clone)]
pub struct DomEvent {
	pub event: web_sys::Event,
	event_type: String,
	target: Option<NodeId>,
}

impl HostEvent for DomEvent {
	type Node = NodeId;

	fn target(&self) -> Option<NodeId> {
		self.target
	}

	fn event_type(&self) -> &str {
		&self.event_type
	}
}

/// The browser host.
///
/// Every listener this host installs calls `dispatcher` with the raw [`web_sys::Event`].
/// Route it back with [`DomHost::event`] and [`Session::dispatch`](`crate::session::Session::dispatch`).
#[derive(Debug)]
pub struct DomHost {
	document: web_sys::Document,
	dispatcher: Function,
	arena: RefCell<Arena>,
}

impl DomHost {
	#[must_use]
	pub fn new(document: web_sys::Document, dispatcher: Function) -> Self {
		Self {
			document,
			dispatcher,
			arena: RefCell::default(),
		}
	}

	/// Makes an existing DOM node addressable, for example the reconciliation root.
	pub fn adopt(&mut self, node: &web_sys::Node) -> NodeId {
		let known = self.arena.borrow().lookup(node);
		known.unwrap_or_else(|| self.arena.borrow_mut().adopt(node))
	}

	#[must_use]
	pub fn node(&self, id: NodeId) -> Option<web_sys::Node> {
		self.arena.borrow().nodes.get(id.index()).cloned().flatten()
	}

	/// Resolves the target of a raw event.
	#[must_use]
	pub fn event(&self, event: web_sys::Event) -> DomEvent {
		let target = event.target().and_then(|target| self.arena.borrow().lookup(&target));
		DomEvent {
			event_type: event.type_(),
			event,
			target,
		}
	}

	fn get(&self, id: NodeId) -> web_sys::Node {
		self.node(id).expect_throw("reconcile-dom: Unknown or freed node handle.")
	}

	fn element(&self, id: NodeId) -> Option<web_sys::Element> {
		let element = self.get(id).dyn_into::<web_sys::Element>().ok();
		if element.is_none() {
			error!(?id, "Expected an element.");
		}
		element
	}

	fn free_subtree(&self, node: &web_sys::Node) {
		let child_nodes = node.child_nodes();
		for i in 0..child_nodes.length() {
			if let Some(child) = child_nodes.get(i) {
				self.free_subtree(&child);
			}
		}
		let id = self.arena.borrow().lookup(node);
		if let Some(id) = id {
			self.arena.borrow_mut().free(id);
		}
	}
}

fn to_js(value: &Value) -> JsValue {
	match value {
		Value::Null => JsValue::NULL,
		Value::Bool(b) => JsValue::from_bool(*b),
		Value::Number(n) => JsValue::from_f64(*n),
		Value::Str(s) => JsValue::from_str(s),
		Value::List(items) => items.iter().map(to_js).collect::<Array>().into(),
		Value::Map(entries) => {
			let object = Object::new();
			for (key, value) in entries {
				if let Err(error) = Reflect::set(&object, &JsValue::from_str(key), &to_js(value)) {
					error!("Failed to convert map entry {:?}: {:?}", key, error);
				}
			}
			object.into()
		}
	}
}

impl Host for DomHost {
	type Node = NodeId;
	type Event = DomEvent;
	type Listener = ();

	#[instrument(skip(self))]
	fn create_element(&mut self, tag: &str) -> NodeId {
		let element = self.document.create_element(tag).expect_throw("reconcile-dom: Failed to create element.");
		self.arena.borrow_mut().adopt(&element)
	}

	fn create_text(&mut self, text: &str) -> NodeId {
		let text = self.document.create_text_node(text);
		self.arena.borrow_mut().adopt(&text)
	}

	#[instrument(skip(self, html))]
	fn create_markup(&mut self, html: &str) -> NodeId {
		let scratch = self.document.create_element("div").expect_throw("reconcile-dom: Failed to create scratch element.");
		scratch.set_inner_html(html);
		let node = match scratch.first_child() {
			Some(first) => first,
			None => scratch.into(),
		};
		self.arena.borrow_mut().adopt(&node)
	}

	fn set_text(&mut self, node: &NodeId, text: &str) {
		self.get(*node).set_node_value(Some(text));
	}

	fn set_attribute(&mut self, node: &NodeId, name: &str, value: &str) {
		if let Some(element) = self.element(*node) {
			if let Err(error) = element.set_attribute(name, value) {
				error!("Could not set attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn remove_attribute(&mut self, node: &NodeId, name: &str) {
		if let Some(element) = self.element(*node) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Could not remove attribute {:?}: {:?}", name, error);
			}
		}
	}

	fn set_property(&mut self, node: &NodeId, name: &str, value: &Value) {
		if let Err(error) = Reflect::set(&self.get(*node), &name.into(), &to_js(value)) {
			error!("Could not set property {:?}: {:?}", name, error);
		}
	}

	fn clear_property(&mut self, node: &NodeId, name: &str) {
		if let Err(error) = Reflect::set(&self.get(*node), &name.into(), &JsValue::FALSE) {
			error!("Could not clear property {:?}: {:?}", name, error);
		}
	}

	fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
		let child_nodes = self.get(*node).child_nodes();
		(0..child_nodes.length())
			.filter_map(|i| child_nodes.get(i))
			.map(|child| {
				let known = self.arena.borrow().lookup(&child);
				known.unwrap_or_else(|| {
					trace!("Adopting unknown child node.");
					self.arena.borrow_mut().adopt(&child)
				})
			})
			.collect()
	}

	#[instrument(skip(self, children), fields(children.len = children.len()))]
	fn replace_child_nodes(&mut self, parent: &NodeId, children: &[NodeId]) {
		let parent = self.get(*parent);
		let children: Vec<web_sys::Node> = children.iter().map(|&child| self.get(child)).collect();
		for child in &children {
			if let Err(error) = parent.append_child(child) {
				error!("Failed to append child node: {:?}", error);
			}
		}
		// Appending moved the new list behind any leftovers.
		while let Some(first) = parent.first_child() {
			if children.first().map_or(false, |expected| Object::is(expected, &first)) {
				break;
			}
			if let Err(error) = parent.remove_child(&first) {
				error!("Failed to remove leftover child node: {:?}", error);
				break;
			}
			self.free_subtree(&first);
		}
	}

	fn remove_node(&mut self, node: &NodeId) {
		let dom_node = self.get(*node);
		if let Some(parent) = dom_node.parent_node() {
			if let Err(error) = parent.remove_child(&dom_node) {
				error!("Failed to remove node: {:?}", error);
			}
		}
		self.free_subtree(&dom_node);
	}

	fn focused(&self) -> Option<NodeId> {
		let active = self.document.active_element()?;
		self.arena.borrow().lookup(&active)
	}

	fn focus_is_default(&self) -> bool {
		match (self.document.active_element(), self.document.body()) {
			(None, _) => true,
			(Some(active), Some(body)) => Object::is(&active, &body),
			(Some(_), None) => false,
		}
	}

	fn focus(&mut self, node: &NodeId) {
		match self.get(*node).dyn_into::<web_sys::HtmlElement>() {
			Ok(element) => {
				if let Err(error) = element.focus() {
					error!("Failed to restore focus: {:?}", error);
				}
			}
			Err(node) => warn!("Can't focus {:?}.", node),
		}
	}

	fn add_listener(&mut self, target: &NodeId, event_name: &str) {
		if let Err(error) = self.get(*target).add_event_listener_with_callback(event_name, &self.dispatcher) {
			error!("Failed to add event listener {:?}: {:?}", event_name, error);
		}
	}

	fn remove_listener(&mut self, target: &NodeId, event_name: &str, (): ()) {
		// The node may already be freed.
		if let Some(node) = self.node(*target) {
			if let Err(error) = node.remove_event_listener_with_callback(event_name, &self.dispatcher) {
				error!("Failed to remove event listener {:?}: {:?}", event_name, error);
			}
		}
	}
}
