//! Declarative event bindings, delegated to a single root node wherever possible.

use crate::{
	host::{Host, HostEvent},
	rc_hash_map::{CountSaturatedError, RcHashMap},
	spec::{EventMap, Value},
};
use core::fmt::{self, Debug, Formatter};
use hashbrown::{HashMap, HashSet};
use tracing::{error, instrument, trace, trace_span};

/// Keeps the listeners on a host tree in line with the [`EventMap`]s of the spec nodes bound to it.
///
/// This is the seam between the [`Reconciler`](`crate::reconcile::Reconciler`) and event handling.
/// [`EventManager`] is the stock implementation.
pub trait Events<H: Host> {
	/// Replaces the bindings of `node` described by `before` with those described by `after`.
	fn update(&mut self, host: &mut H, node: &H::Node, before: &EventMap, after: &EventMap);

	/// Drops every binding of `node`, which is about to be detached.
	fn release(&mut self, host: &mut H, node: &H::Node);
}

/// Which event names bypass delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
	/// Lowercase names of events that are bound directly on each interested node.
	pub direct: HashSet<String>,
}

impl Default for EventConfig {
	fn default() -> Self {
		Self::with_direct(["move", "blur", "focus"])
	}
}

impl EventConfig {
	#[must_use]
	pub fn with_direct<I>(names: I) -> Self
	where
		I: IntoIterator,
		I::Item: AsRef<str>,
	{
		Self {
			direct: names.into_iter().map(|name| name.as_ref().to_lowercase()).collect(),
		}
	}
}

struct Binding<L> {
	value: Value,
	/// Only present for direct bindings.
	listener: Option<L>,
}

/// Delegated event manager.
///
/// Bubbling events get one listener on the root node per event name, installed while at least one bound node
/// is interested in that name. Other events are bound on each node directly.
///
/// Incoming events are routed through [`EventManager::dispatch`] to the handler supplied at construction,
/// together with the value bound to the event's target.
pub struct EventManager<H: Host, R = ()> {
	root: H::Node,
	config: EventConfig,
	handler: Box<dyn FnMut(&H::Event, &Value) -> R>,
	bindings: HashMap<H::Node, HashMap<String, Binding<H::Listener>>>,
	delegated: RcHashMap<String, u32, H::Listener>,
}

impl<H: Host, R> Debug for EventManager<H, R> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventManager")
			.field("root", &self.root)
			.field("config", &self.config)
			.field("bound nodes", &self.bindings.len())
			.field("delegated names", &self.delegated.len())
			.finish_non_exhaustive()
	}
}

impl<H: Host, R> EventManager<H, R> {
	#[must_use]
	pub fn new(root: H::Node, handler: impl FnMut(&H::Event, &Value) -> R + 'static) -> Self {
		Self::with_config(root, EventConfig::default(), handler)
	}

	#[must_use]
	pub fn with_config(root: H::Node, config: EventConfig, handler: impl FnMut(&H::Event, &Value) -> R + 'static) -> Self {
		Self {
			root,
			config,
			handler: Box::new(handler),
			bindings: HashMap::new(),
			delegated: RcHashMap::new(),
		}
	}

	#[must_use]
	pub fn root(&self) -> &H::Node {
		&self.root
	}

	#[must_use]
	pub fn config(&self) -> &EventConfig {
		&self.config
	}

	/// Whether `event_name` is handled through the root listener.
	#[must_use]
	pub fn is_delegated(&self, host: &H, event_name: &str) -> bool {
		let event_name = event_name.to_lowercase();
		!self.config.direct.contains(&event_name) && host.bubbles(&event_name)
	}

	/// How many bound nodes currently keep the root listener for `event_name` alive.
	#[must_use]
	pub fn delegated_count(&self, event_name: &str) -> u32 {
		self.delegated.count(event_name.to_lowercase().as_str())
	}

	/// The value currently bound to `event_name` on `node`.
	#[must_use]
	pub fn binding(&self, node: &H::Node, event_name: &str) -> Option<&Value> {
		self.bindings.get(node)?.get(&event_name.to_lowercase()).map(|binding| &binding.value)
	}

	/// Number of nodes with at least one binding.
	#[must_use]
	pub fn bound_node_count(&self) -> usize {
		self.bindings.len()
	}

	/// Routes `event` to the handler with the value bound on its target.
	///
	/// Returns the handler's result, or [`None`] if the target has no binding for the event
	/// (which is expected for nodes removed between capture and dispatch).
	#[instrument(skip(self, host, event), fields(event_type = event.event_type()))]
	pub fn dispatch(&mut self, host: &mut H, event: &H::Event) -> Option<R> {
		let target = event.target()?;
		let event_type = event.event_type().to_lowercase();
		let value = match self.bindings.get(&target).and_then(|events| events.get(&event_type)) {
			Some(binding) => binding.value.clone(),
			None => {
				trace!(?target, "Stale dispatch target. Clearing.");
				self.remove(host, &target, &event_type);
				return None;
			}
		};
		let span = trace_span!("Calling handler", ?target);
		let _enter = span.enter();
		Some((self.handler)(event, &value))
	}

	fn add(&mut self, host: &mut H, node: &H::Node, event_name: String, value: Value) {
		let listener = if self.is_delegated(host, &event_name) {
			let root = &self.root;
			match self.delegated.increment_or_insert_with(event_name.clone(), || {
				trace!(event_name = event_name.as_str(), "Installing root listener.");
				host.add_listener(root, &event_name)
			}) {
				Ok(_) => (),
				Err(CountSaturatedError) => {
					error!(event_name = event_name.as_str(), "Too many delegated bindings. Ignoring.");
					return;
				}
			}
			None
		} else {
			trace!(event_name = event_name.as_str(), ?node, "Binding directly.");
			Some(host.add_listener(node, &event_name))
		};
		self.bindings
			.entry(node.clone())
			.or_default()
			.insert(event_name, Binding { value, listener });
	}

	fn remove(&mut self, host: &mut H, node: &H::Node, event_name: &str) {
		let events = match self.bindings.get_mut(node) {
			Some(events) => events,
			None => return,
		};
		let binding = match events.remove(event_name) {
			Some(binding) => binding,
			None => return,
		};
		if events.is_empty() {
			self.bindings.remove(node);
		}

		match binding.listener {
			Some(listener) => {
				trace!(event_name, ?node, "Unbinding directly.");
				host.remove_listener(node, event_name, listener);
			}
			None => match self.delegated.decrement(event_name) {
				Ok(Some(listener)) => {
					trace!(event_name, "Removing root listener.");
					host.remove_listener(&self.root, event_name, listener);
				}
				Ok(None) => (),
				Err(CountSaturatedError) => error!(event_name, "Delegated binding count underflow."),
			},
		}
	}
}

impl<H: Host, R> Events<H> for EventManager<H, R> {
	#[instrument(skip(self, host, before, after))]
	fn update(&mut self, host: &mut H, node: &H::Node, before: &EventMap, after: &EventMap) {
		let mut stale: HashSet<String> = before.keys().map(|name| name.to_lowercase()).collect();
		for (name, value) in after {
			let name = name.to_lowercase();
			stale.remove(&name);
			match self.bindings.get_mut(node).and_then(|events| events.get_mut(&name)) {
				Some(binding) => binding.value = value.clone(),
				None => self.add(host, node, name, value.clone()),
			}
		}
		for name in stale {
			self.remove(host, node, &name);
		}
	}

	fn release(&mut self, host: &mut H, node: &H::Node) {
		let names: Vec<String> = match self.bindings.get(node) {
			Some(events) => events.keys().cloned().collect(),
			None => return,
		};
		trace!(?node, count = names.len(), "Releasing bindings.");
		for name in names {
			self.remove(host, node, &name);
		}
	}
}
