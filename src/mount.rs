use crate::{
	element::Element,
	host::Host,
	instance::Instance,
	reconcile::{Reconciler, DEFAULT_DEPTH_LIMIT},
	Result,
};
use std::rc::Rc;
use tracing::instrument;

/// Configuration for a [`MountHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountOptions {
	/// How deeply elements (including component renders) may nest.
	pub depth_limit: usize,
}
impl Default for MountOptions {
	fn default() -> Self {
		Self {
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}
}

/// Mounts element trees into `container`, with default [`MountOptions`].
pub fn mount<H: Host>(host: Rc<H>, container: H::Node) -> MountHandle<H> {
	MountHandle::new(host, container, MountOptions::default())
}

/// Owns the root instance rendered into one container node.
///
/// Mounts are independent of each other. Dropping a handle leaves the host tree as it is.
pub struct MountHandle<H: Host> {
	reconciler: Reconciler<H>,
	container: H::Node,
	root: Option<Instance<H>>,
}
impl<H: Host> MountHandle<H> {
	#[must_use]
	pub fn new(host: Rc<H>, container: H::Node, options: MountOptions) -> Self {
		Self {
			reconciler: Reconciler::new(host).with_depth_limit(options.depth_limit),
			container,
			root: None,
		}
	}

	/// Renders `element` into the container, reconciling against what was rendered before.
	///
	/// # Errors
	///
	/// Forwarded from the [`Reconciler`].
	/// If a pass over an existing root fails, the root instance is kept but the host tree may be partially updated.
	#[instrument(skip(self, element))]
	pub fn render(&mut self, element: &Element) -> Result<()> {
		if let Some(root) = self.root.as_mut() {
			return self.reconciler.update(&self.container, root, element);
		}
		self.root = self.reconciler.reconcile(&self.container, None, Some(element))?;
		Ok(())
	}

	/// Removes the rendered tree from the container.
	///
	/// Components inside it are detached: Their [`Updater`](`crate::Updater`)s fail from now on.
	///
	/// # Errors
	///
	/// Forwarded from the [`Reconciler`].
	#[instrument(skip(self))]
	pub fn unmount(&mut self) -> Result<()> {
		let root = self.root.take();
		self.root = self.reconciler.reconcile(&self.container, root, None)?;
		Ok(())
	}

	#[must_use]
	pub fn root(&self) -> Option<&Instance<H>> {
		self.root.as_ref()
	}

	#[must_use]
	pub fn container(&self) -> &H::Node {
		&self.container
	}

	#[must_use]
	pub fn reconciler(&self) -> &Reconciler<H> {
		&self.reconciler
	}
}
