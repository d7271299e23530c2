//! Applies the delta between two [`PropMap`]s to a single host node.

use crate::{
	host::Host,
	spec::{PropMap, Value},
};
use tracing::{instrument, trace};

/// Keys that must be written as properties to take effect reliably.
const PROPERTIES: &[&str] = &["value", "checked"];
/// Keys that exist *only* as properties.
const PROPERTY_ONLY: &[&str] = &["value"];

fn property(key: &str) -> Option<&str> {
	PROPERTIES.iter().copied().find(|&p| p == key)
}

fn attribute(key: &str) -> Option<&str> {
	if PROPERTY_ONLY.contains(&key) {
		None
	} else {
		Some(key)
	}
}

/// Clears each key of `before` that is missing from `after`, then sets each key of `after` whose value changed.
#[instrument(skip(host, before, after))]
pub fn update<H: Host>(host: &mut H, node: &H::Node, before: &PropMap, after: &PropMap) {
	for key in before.keys() {
		if !after.contains_key(key) {
			remove(host, node, key);
		}
	}

	for (key, value) in after {
		if before.get(key) == Some(value) {
			continue;
		}
		add(host, node, key, value);
	}
}

fn add<H: Host>(host: &mut H, node: &H::Node, key: &str, value: &Value) {
	if cfg!(feature = "dangerous-logging") {
		trace!(key, %value, "Setting prop");
	} else {
		trace!(key, "Setting prop");
	}
	if let Some(property) = property(key) {
		host.set_property(node, property, value);
	}
	if let Some(attribute) = attribute(key) {
		host.set_attribute(node, attribute, &value.to_string());
	}
}

fn remove<H: Host>(host: &mut H, node: &H::Node, key: &str) {
	trace!(key, "Removing prop");
	if let Some(property) = property(key) {
		host.clear_property(node, property);
	}
	if let Some(attribute) = attribute(key) {
		host.remove_attribute(node, attribute);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDom;

	fn props(entries: &[(&str, Value)]) -> PropMap {
		entries.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect()
	}

	#[test]
	fn routing() {
		assert_eq!(property("value"), Some("value"));
		assert_eq!(attribute("value"), None);
		assert_eq!(property("checked"), Some("checked"));
		assert_eq!(attribute("checked"), Some("checked"));
		assert_eq!(property("id"), None);
		assert_eq!(attribute("id"), Some("id"));
	}

	#[test]
	fn minimal_updates() {
		let mut dom = MemoryDom::new();
		let input = dom.create_element("input");
		let before = props(&[("id", "a".into()), ("class", "x".into()), ("value", "v".into())]);
		update(&mut dom, &input, &PropMap::new(), &before);
		assert_eq!(dom.attribute(input, "id"), Some("a"));
		assert_eq!(dom.attribute(input, "value"), None);
		assert_eq!(dom.property(input, "value"), Some(&Value::from("v")));

		let mutations = dom.mutation_count();
		let after = props(&[("id", "a".into()), ("class", "y".into()), ("value", "v".into())]);
		update(&mut dom, &input, &before, &after);
		assert_eq!(dom.mutation_count(), mutations + 1);
		assert_eq!(dom.attribute(input, "class"), Some("y"));
	}

	#[test]
	fn removal_clears_both_forms() {
		let mut dom = MemoryDom::new();
		let checkbox = dom.create_element("input");
		let before = props(&[("checked", true.into()), ("value", "on".into())]);
		update(&mut dom, &checkbox, &PropMap::new(), &before);
		assert_eq!(dom.attribute(checkbox, "checked"), Some("true"));
		assert_eq!(dom.property(checkbox, "checked"), Some(&Value::Bool(true)));

		update(&mut dom, &checkbox, &before, &PropMap::new());
		assert_eq!(dom.attribute(checkbox, "checked"), None);
		assert_eq!(dom.property(checkbox, "checked"), Some(&Value::Bool(false)));
		assert_eq!(dom.property(checkbox, "value"), Some(&Value::Bool(false)));
	}
}
