use crate::{
	events::{EventManager, Events},
	host::Host,
	reconcile::Reconciler,
	spec::{self, Spec},
};
use core::fmt::{self, Debug, Formatter};
use tracing::instrument;

/// Owns a host tree, the node whose children it manages and the last applied [`Spec`].
///
/// # Correct Use
///
/// Only this session may change the children of `root` (recursively), except for nodes created from raw markup.
/// Calls must not overlap, so handlers invoked through [`Session::dispatch`] mustn't reconcile synchronously.
pub struct Session<H: Host, E: Events<H>> {
	host: H,
	root: H::Node,
	events: E,
	reconciler: Reconciler<H>,
	vdom: Spec,
}

impl<H: Host + Debug, E: Events<H> + Debug> Debug for Session<H, E> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Session")
			.field("host", &self.host)
			.field("root", &self.root)
			.field("events", &self.events)
			.field("vdom", &self.vdom)
			.finish()
	}
}

impl<H: Host, E: Events<H>> Session<H, E> {
	#[must_use]
	pub fn new(host: H, root: H::Node, events: E) -> Self {
		Self {
			host,
			root,
			events,
			reconciler: Reconciler::new(),
			vdom: spec::empty(),
		}
	}

	/// The spec that currently describes the children of [`Session::root`].
	#[must_use]
	pub fn vdom(&self) -> &Spec {
		&self.vdom
	}

	/// Updates the children of [`Session::root`] to match `spec` and returns the effective spec.
	///
	/// `spec` may be the value of [`Session::vdom`] itself, after superseding parts of it.
	#[instrument(skip(self, spec))]
	pub fn reconcile(&mut self, spec: &Spec) -> Spec {
		let Self {
			host,
			root,
			events,
			reconciler,
			vdom,
		} = self;
		*vdom = reconciler.reconcile(host, events, root, vdom, spec);
		vdom.clone()
	}

	#[must_use]
	pub fn root(&self) -> &H::Node {
		&self.root
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	#[must_use]
	pub fn events(&self) -> &E {
		&self.events
	}

	pub fn into_parts(self) -> (H, E, Spec) {
		(self.host, self.events, self.vdom)
	}
}

impl<H: Host, R> Session<H, EventManager<H, R>> {
	/// Routes a host event to the bound handler. See [`EventManager::dispatch`].
	pub fn dispatch(&mut self, event: &H::Event) -> Option<R> {
		self.events.dispatch(&mut self.host, event)
	}
}
