//! The live instance tree mirroring the last reconciled element tree.

use crate::{
	component::{PublicInstance, State},
	element::{Element, Props},
	host::Host,
	reconcile::Reconciler,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;

/// Pairs an element with the host node(s) it produced.
///
/// Host-type instances own their node and their children, positionally aligned with the element's children.
/// Component instances are shared (so that their [`Updater`](`crate::Updater`) can find them again)
/// and borrow their node from their single child instance.
pub enum Instance<H: Host> {
	Host(HostInstance<H>),
	Component(Rc<ComponentInstance<H>>),
}
impl<H: Host> Instance<H> {
	/// The host node this instance currently renders as.
	#[must_use]
	pub fn dom(&self) -> H::Node {
		match self {
			Self::Host(instance) => instance.dom.clone(),
			Self::Component(instance) => instance.slot.borrow().child.dom(),
		}
	}

	/// The element most recently reconciled into this instance.
	#[must_use]
	pub fn element(&self) -> Element {
		match self {
			Self::Host(instance) => instance.element.clone(),
			Self::Component(instance) => instance.element(),
		}
	}

	#[must_use]
	pub fn as_host(&self) -> Option<&HostInstance<H>> {
		match self {
			Self::Host(instance) => Some(instance),
			Self::Component(_) => None,
		}
	}

	#[must_use]
	pub fn as_component(&self) -> Option<&Rc<ComponentInstance<H>>> {
		match self {
			Self::Host(_) => None,
			Self::Component(instance) => Some(instance),
		}
	}
}
impl<H: Host> Debug for Instance<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Self::Host(instance) => Debug::fmt(instance, f),
			Self::Component(instance) => Debug::fmt(instance, f),
		}
	}
}

pub struct HostInstance<H: Host> {
	pub(crate) element: Element,
	pub(crate) dom: H::Node,
	pub(crate) children: Vec<Instance<H>>,
}
impl<H: Host> HostInstance<H> {
	#[must_use]
	pub fn element(&self) -> &Element {
		&self.element
	}

	#[must_use]
	pub fn dom(&self) -> &H::Node {
		&self.dom
	}

	#[must_use]
	pub fn children(&self) -> &[Instance<H>] {
		&self.children
	}
}
impl<H: Host> Debug for HostInstance<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("HostInstance")
			.field("type", self.element.element_type())
			.field("dom", &self.dom)
			.field("children", &self.children)
			.finish()
	}
}

pub struct ComponentInstance<H: Host> {
	pub(crate) reconciler: Reconciler<H>,
	/// The remaining depth budget at this instance's position.
	pub(crate) depth_limit: usize,
	/// Set once the instance's subtree was removed or replaced.
	pub(crate) released: Cell<bool>,
	pub(crate) slot: RefCell<ComponentSlot<H>>,
}
pub(crate) struct ComponentSlot<H: Host> {
	pub(crate) element: Element,
	pub(crate) public: PublicInstance,
	pub(crate) child: Instance<H>,
}
impl<H: Host> ComponentInstance<H> {
	#[must_use]
	pub fn element(&self) -> Element {
		self.slot.borrow().element.clone()
	}

	/// The props the component last rendered with.
	#[must_use]
	pub fn props(&self) -> Props {
		self.slot.borrow().public.props.clone()
	}

	#[must_use]
	pub fn state(&self) -> State {
		self.slot.borrow().public.state.clone()
	}

	/// Whether this instance is still part of a mounted tree.
	///
	/// Once its subtree is removed or replaced, this stays `false` even while the instance is kept alive elsewhere.
	#[must_use]
	pub fn is_mounted(&self) -> bool {
		!self.released.get()
	}

	/// Calls `f` with the instance produced by the component's last render.
	pub fn with_child<R>(&self, f: impl FnOnce(&Instance<H>) -> R) -> R {
		f(&self.slot.borrow().child)
	}
}
impl<H: Host> Debug for ComponentInstance<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self.slot.try_borrow() {
			Ok(slot) => f
				.debug_struct("ComponentInstance")
				.field("type", slot.element.element_type())
				.field("child", &slot.child)
				.finish(),
			Err(_) => f.write_str("ComponentInstance { <reconciling> }"),
		}
	}
}
