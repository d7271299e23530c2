//! The plain-data tree description the [`Reconciler`](`crate::reconcile::Reconciler`) applies.
//!
//! Every [`Spec`] (and every [`Props`] table) is a [`Versioned`] value:
//! a previously returned tree can be updated in place by [superseding](`Versioned::supersede`) any node,
//! any [`Element::props`] or any [`Element::contents`], and then be resubmitted as-is.
//! The reconciler resolves each of these independently to its [`latest`](`Versioned::latest`) version.

use core::{
	cell::RefCell,
	fmt::{self, Display, Formatter},
};
use std::{collections::BTreeMap, rc::Rc};

/// A value that may later be replaced by a newer version of itself.
///
/// Chains of [`next`](`Versioned::next`) references must be acyclic.
/// A cyclic chain makes [`Versioned::latest`] loop forever.
pub struct Versioned<T> {
	value: T,
	next: RefCell<Option<Rc<Versioned<T>>>>,
}

impl<T> Versioned<T> {
	#[must_use]
	pub fn new(value: T) -> Rc<Self> {
		Rc::new(Self { value, next: RefCell::new(None) })
	}

	/// The value of this exact version, ignoring any newer ones.
	#[must_use]
	pub fn value(&self) -> &T {
		&self.value
	}

	#[must_use]
	pub fn next(&self) -> Option<Rc<Self>> {
		self.next.borrow().clone()
	}

	#[must_use]
	pub fn has_next(&self) -> bool {
		self.next.borrow().is_some()
	}

	/// Marks `newer` as the replacement of this version.
	///
	/// Any previously attached replacement is discarded.
	pub fn supersede(&self, newer: Rc<Self>) {
		*self.next.borrow_mut() = Some(newer);
	}

	/// Follows [`next`](`Versioned::next`) until no newer version remains.
	#[must_use]
	pub fn latest(this: &Rc<Self>) -> Rc<Self> {
		let mut current = this.clone();
		while let Some(next) = current.next() {
			current = next;
		}
		current
	}
}

impl<T: fmt::Debug> fmt::Debug for Versioned<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Versioned");
		debug.field("value", &self.value);
		if let Some(next) = &*self.next.borrow() {
			debug.field("next", next);
		}
		debug.finish()
	}
}

impl<T: PartialEq> PartialEq for Versioned<T> {
	fn eq(&self, other: &Self) -> bool {
		self.value == other.value && *self.next.borrow() == *other.next.borrow()
	}
}

/// Shorthand for [`Versioned::latest`].
#[must_use]
pub fn latest<T>(versioned: &Rc<Versioned<T>>) -> Rc<Versioned<T>> {
	Versioned::latest(versioned)
}

pub type Spec = Rc<Versioned<VNode>>;
pub type PropMap = BTreeMap<String, Value>;
pub type Props = Rc<Versioned<PropMap>>;
/// Event name → bound value. Names are matched case-insensitively.
pub type EventMap = BTreeMap<String, Value>;

/// One node of a [`Spec`] tree.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
	/// Renders nothing.
	Empty,
	Text { key: Option<String>, value: String },
	/// Opaque markup, inserted verbatim and replaced wholesale whenever it changes.
	RawMarkup { key: Option<String>, html: String },
	Element(Element),
	/// A positional list of children without a wrapping host node.
	Fragment { key: Option<String>, nodes: Vec<Spec> },
}

impl VNode {
	/// The declared key, if any.
	#[must_use]
	pub fn key(&self) -> Option<&str> {
		match self {
			VNode::Empty => None,
			VNode::Text { key, .. } | VNode::RawMarkup { key, .. } | VNode::Fragment { key, .. } => key.as_deref(),
			VNode::Element(element) => element.key.as_deref(),
		}
	}

	/// Whether an existing host node for `self` may be updated to match `other`.
	#[must_use]
	pub fn same_kind(&self, other: &VNode) -> bool {
		match (self, other) {
			(VNode::Text { .. }, VNode::Text { .. }) | (VNode::RawMarkup { .. }, VNode::RawMarkup { .. }) => true,
			(VNode::Element(a), VNode::Element(b)) => a.tag == b.tag,
			_ => false,
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			VNode::Element(element) => Some(element),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
	pub tag: String,
	pub key: Option<String>,
	pub props: Props,
	pub events: EventMap,
	pub contents: Spec,
}

impl Element {
	#[must_use]
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			key: None,
			props: Versioned::new(PropMap::new()),
			events: EventMap::new(),
			contents: empty(),
		}
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Adds a prop to a fresh [`Props`] version.
	#[must_use]
	pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		let mut props = self.props.value().clone();
		props.insert(name.into(), value.into());
		self.props = Versioned::new(props);
		self
	}

	#[must_use]
	pub fn with_props(mut self, props: Props) -> Self {
		self.props = props;
		self
	}

	#[must_use]
	pub fn event(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.events.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn contents(mut self, contents: Spec) -> Self {
		self.contents = contents;
		self
	}

	#[must_use]
	pub fn build(self) -> Spec {
		Versioned::new(VNode::Element(self))
	}
}

impl From<Element> for Spec {
	fn from(element: Element) -> Self {
		element.build()
	}
}

#[must_use]
pub fn empty() -> Spec {
	Versioned::new(VNode::Empty)
}

#[must_use]
pub fn text(value: impl Into<String>) -> Spec {
	Versioned::new(VNode::Text { key: None, value: value.into() })
}

#[must_use]
pub fn keyed_text(key: impl Into<String>, value: impl Into<String>) -> Spec {
	Versioned::new(VNode::Text {
		key: Some(key.into()),
		value: value.into(),
	})
}

#[must_use]
pub fn raw_markup(html: impl Into<String>) -> Spec {
	Versioned::new(VNode::RawMarkup { key: None, html: html.into() })
}

#[must_use]
pub fn fragment(nodes: impl IntoIterator<Item = Spec>) -> Spec {
	Versioned::new(VNode::Fragment {
		key: None,
		nodes: nodes.into_iter().collect(),
	})
}

#[must_use]
pub fn keyed_fragment(key: impl Into<String>, nodes: impl IntoIterator<Item = Spec>) -> Spec {
	Versioned::new(VNode::Fragment {
		key: Some(key.into()),
		nodes: nodes.into_iter().collect(),
	})
}

/// Dynamically typed data, used for props and for bound event values.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Null,
	Bool(bool),
	Number(f64),
	Str(String),
	List(Vec<Value>),
	Map(BTreeMap<String, Value>),
}

impl Value {
	/// Whether a property set to this value reads as unset.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::Str(s) => !s.is_empty(),
			Value::List(_) | Value::Map(_) => true,
		}
	}
}

/// The attribute string form.
impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Bool(b) => Display::fmt(b, f),
			Value::Number(n) => Display::fmt(n, f),
			Value::Str(s) => f.write_str(s),
			Value::List(items) => {
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(",")?;
					}
					Display::fmt(item, f)?;
				}
				Ok(())
			}
			Value::Map(_) => f.write_str("[object Object]"),
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Number(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Number(n.into())
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

impl From<Vec<Value>> for Value {
	fn from(items: Vec<Value>) -> Self {
		Value::List(items)
	}
}

/// Calls `f(effective_key, spec)` for each leaf of `spec`, in order.
///
/// Reads every node as-is, without resolving newer versions.
/// This is how the previously applied tree is walked.
pub fn for_each_child(prefix: &str, spec: &Spec, f: &mut dyn FnMut(String, &Spec)) {
	let node = spec.value();
	let key = format!("{}.{}", prefix, node.key().unwrap_or_default());
	match node {
		VNode::Empty => (),
		VNode::Text { .. } | VNode::RawMarkup { .. } | VNode::Element(_) => f(key, spec),
		VNode::Fragment { nodes, .. } => {
			for (i, child) in nodes.iter().enumerate() {
				for_each_child(&child_prefix(&key, i, child), child, f);
			}
		}
	}
}

/// Like [`for_each_child`], but resolves each level to its latest version and
/// expects `f` to return the (possibly updated) leaf.
///
/// Returns the updated `spec`. Fragments whose children all came back unchanged (by reference)
/// are returned as-is.
pub fn map_child(prefix: &str, spec: &Spec, f: &mut dyn FnMut(String, &Spec) -> Spec) -> Spec {
	let spec = Versioned::latest(spec);
	let node = spec.value();
	let key = format!("{}.{}", prefix, node.key().unwrap_or_default());
	match node {
		VNode::Empty => spec.clone(),
		VNode::Text { .. } | VNode::RawMarkup { .. } | VNode::Element(_) => f(key, &spec),
		VNode::Fragment { key: own_key, nodes } => {
			let mut updated: Option<Vec<Spec>> = None;
			for (i, child) in nodes.iter().enumerate() {
				let mapped = map_child(&child_prefix(&key, i, child), child, f);
				if Rc::ptr_eq(&mapped, child) {
					continue;
				}
				updated.get_or_insert_with(|| nodes.clone())[i] = mapped;
			}
			match updated {
				None => spec.clone(),
				Some(nodes) => Versioned::new(VNode::Fragment { key: own_key.clone(), nodes }),
			}
		}
	}
}

fn child_prefix(fragment_key: &str, index: usize, child: &Spec) -> String {
	if child.value().key().is_some() {
		fragment_key.to_owned()
	} else {
		format!("{}{}", fragment_key, index)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn keys(spec: &Spec) -> Vec<String> {
		let mut keys = Vec::new();
		for_each_child("", spec, &mut |key, _| keys.push(key));
		keys
	}

	#[test]
	fn single_leaf_key() {
		assert_eq!(keys(&text("Hello")), ["."]);
		assert_eq!(keys(&keyed_text("a", "Hello")), [".a"]);
		assert!(keys(&empty()).is_empty());
	}

	#[test]
	fn fragment_keys() {
		let spec = fragment([
			text("a"),
			keyed_text("one", "b"),
			fragment([text("c"), Element::new("div").key("x").build()]),
		]);
		assert_eq!(keys(&spec), [".0.", "..one", ".2.0.", ".2..x"]);
	}

	#[test]
	fn latest_follows_chain() {
		let first = text("1");
		let second = text("2");
		let third = text("3");
		second.supersede(third.clone());
		first.supersede(second);
		assert!(Rc::ptr_eq(&latest(&first), &third));
		assert_eq!(first.value(), &VNode::Text { key: None, value: "1".into() });
	}

	#[test]
	fn for_each_child_ignores_newer_versions() {
		let spec = fragment([text("a")]);
		if let VNode::Fragment { nodes, .. } = spec.value() {
			nodes[0].supersede(text("b"));
		}
		let mut seen = Vec::new();
		for_each_child("", &spec, &mut |_, leaf| seen.push(leaf.value().clone()));
		assert_eq!(seen, [VNode::Text { key: None, value: "a".into() }]);
	}

	#[test]
	fn map_child_keeps_unchanged_fragments() {
		let spec = fragment([text("a"), text("b")]);
		let mapped = map_child("", &spec, &mut |_, leaf| leaf.clone());
		assert!(Rc::ptr_eq(&mapped, &spec));
	}

	#[test]
	fn map_child_resolves_and_copies() {
		let spec = fragment([text("a"), text("b")]);
		let newer = text("c");
		if let VNode::Fragment { nodes, .. } = spec.value() {
			nodes[1].supersede(newer.clone());
		}
		let mapped = map_child("", &spec, &mut |_, leaf| leaf.clone());
		assert!(!Rc::ptr_eq(&mapped, &spec));
		match mapped.value() {
			VNode::Fragment { nodes, .. } => assert!(Rc::ptr_eq(&nodes[1], &newer)),
			other => panic!("Expected fragment, got {:?}", other),
		}
	}

	#[test]
	fn attribute_strings() {
		assert_eq!(Value::from(true).to_string(), "true");
		assert_eq!(Value::from(1).to_string(), "1");
		assert_eq!(Value::from(1.5).to_string(), "1.5");
		assert_eq!(Value::from(vec![Value::from("a"), Value::from(2)]).to_string(), "a,2");
	}

	#[test]
	fn same_kind() {
		assert!(text("a").value().same_kind(text("b").value()));
		assert!(!text("a").value().same_kind(raw_markup("a").value()));
		assert!(!Element::new("div").build().value().same_kind(Element::new("span").build().value()));
	}
}
