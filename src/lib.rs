//! A keyed virtual tree reconciler.
//!
//! Describe the desired children of a host node as a [`Spec`](`spec::Spec`) tree and hand it to a [`Session`].
//! The session compares it with the previously applied tree and applies the minimal set of mutations to the
//! [`Host`](`host::Host`) tree, reusing host nodes by key so that node identity and focus survive updates.
//!
//! Event bindings are declared on elements and managed by an [`EventManager`], which delegates bubbling events
//! to a single listener per event name on the root node.

#![doc(html_root_url = "https://docs.rs/reconcile-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod events;
pub mod host;
pub mod memory;
pub mod props;
mod rc_hash_map;
pub mod reconcile;
pub mod session;
pub mod spec;
#[cfg(feature = "web")]
pub mod web;

pub use events::{EventConfig, EventManager, Events};
pub use host::{Host, HostEvent, NodeId};
pub use rc_hash_map::CountSaturatedError;
pub use reconcile::Reconciler;
pub use session::Session;
pub use spec::{Element, Spec, VNode, Value, Versioned};
