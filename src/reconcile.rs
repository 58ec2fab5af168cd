//! The diff/patch algorithm.
//!
//! Children are matched purely by position. Inserting or removing an element in the middle of a child list
//! therefore updates or replaces every following sibling against its former neighbour.

use crate::{
	component::{PublicInstance, Rerender, State, Updater},
	element::{Element, ElementType, Props},
	host::Host,
	instance::{ComponentInstance, ComponentSlot, HostInstance, Instance},
	Error, Result,
};
use core::{
	cell::{Cell, RefCell},
	mem,
};
use std::rc::{Rc, Weak};
use tracing::{error, instrument, trace, trace_span, warn};

thread_local! {
	static IN_PASS: Cell<bool> = Cell::new(false);
}

/// Marks a running reconciliation pass on this thread.
struct ReconcilePass(());
impl ReconcilePass {
	fn begin() -> Result<Self> {
		IN_PASS.with(|in_pass| {
			if in_pass.replace(true) {
				warn!("Rejected nested reconciliation.");
				Err(Error::Reentrant)
			} else {
				Ok(Self(()))
			}
		})
	}
}
impl Drop for ReconcilePass {
	fn drop(&mut self) {
		IN_PASS.with(|in_pass| in_pass.set(false))
	}
}

/// Whether a reconciliation pass (including component renders) is currently running on this thread.
#[must_use]
pub fn is_reconciling() -> bool {
	IN_PASS.with(Cell::get)
}

pub const DEFAULT_DEPTH_LIMIT: usize = 1024;

/// Synchronizes a host tree with element trees, through `H`.
///
/// Each public method runs one complete, synchronous pass.
/// Starting a pass while another one is running on the same thread fails with [`Error::Reentrant`].
pub struct Reconciler<H: Host> {
	host: Rc<H>,
	depth_limit: usize,
}
impl<H: Host> Clone for Reconciler<H> {
	fn clone(&self) -> Self {
		Self {
			host: Rc::clone(&self.host),
			depth_limit: self.depth_limit,
		}
	}
}
impl<H: Host> Reconciler<H> {
	#[must_use]
	pub fn new(host: Rc<H>) -> Self {
		Self {
			host,
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}

	/// Sets how deeply elements (including component renders) may nest before [`Error::DepthLimit`].
	#[must_use]
	pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}

	#[must_use]
	pub fn host(&self) -> &Rc<H> {
		&self.host
	}

	#[must_use]
	pub fn depth_limit(&self) -> usize {
		self.depth_limit
	}

	/// Builds a fresh instance and detached host subtree for `element`.
	///
	/// # Errors
	///
	/// [`Error::MalformedElement`], [`Error::DepthLimit`], [`Error::Reentrant`] or any host failure.
	pub fn instantiate(&self, element: &Element) -> Result<Instance<H>> {
		let _pass = ReconcilePass::begin()?;
		self.instantiate_at(element, self.depth_limit)
	}

	/// Updates `instance` under `parent` to match `element`, creating or removing it as needed.
	///
	/// Returns the surviving instance, which is [`None`] iff `element` is [`None`].
	///
	/// # Errors
	///
	/// As [`Reconciler::instantiate`], or if `parent` doesn't contain the instance's host node.
	pub fn reconcile(&self, parent: &H::Node, instance: Option<Instance<H>>, element: Option<&Element>) -> Result<Option<Instance<H>>> {
		let _pass = ReconcilePass::begin()?;
		self.reconcile_at(parent, instance, element, self.depth_limit)
	}

	/// Like [`Reconciler::reconcile`] with both instance and element present, but in place.
	///
	/// # Errors
	///
	/// As [`Reconciler::reconcile`].
	pub fn update(&self, parent: &H::Node, instance: &mut Instance<H>, element: &Element) -> Result<()> {
		let _pass = ReconcilePass::begin()?;
		self.update_at(parent, instance, element, self.depth_limit)
	}

	#[instrument(skip(self, element), fields(element_type = ?element.element_type()))]
	fn instantiate_at(&self, element: &Element, depth_limit: usize) -> Result<Instance<H>> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Err(Error::DepthLimit { limit: self.depth_limit });
		}

		match element.element_type() {
			ElementType::Tag(_) | ElementType::Text => {
				validate_host_element(element)?;
				let dom = self.host.create_node(element)?;
				self.host.apply_property_diff(&dom, &Props::new(), element.props())?;

				let children = element
					.children()
					.iter()
					.map(|child| self.instantiate_at(child, depth_limit - 1))
					.collect::<Result<Vec<_>>>()?;
				for child in &children {
					self.host.append_child(&dom, &child.dom())?;
				}

				trace!(children = children.len(), "Instantiated host element.");
				Ok(Instance::Host(HostInstance {
					element: element.clone(),
					dom,
					children,
				}))
			}

			ElementType::Component(component_type) => {
				let updater = Updater::unbound();
				let public = PublicInstance::construct(component_type, element.props(), updater.clone());
				let child = {
					let span = trace_span!("Rendering component", component = component_type.name());
					let _enter = span.enter();
					public.render()
				};
				let child = self.instantiate_at(&child, depth_limit - 1)?;

				let instance = Rc::new(ComponentInstance {
					reconciler: self.clone(),
					depth_limit,
					released: Cell::new(false),
					slot: RefCell::new(ComponentSlot {
						element: element.clone(),
						public,
						child,
					}),
				});
				let weak = Rc::downgrade(&instance);
				let weak: Weak<dyn Rerender> = weak;
				updater.bind(weak);
				Ok(Instance::Component(instance))
			}
		}
	}

	fn reconcile_at(&self, parent: &H::Node, instance: Option<Instance<H>>, element: Option<&Element>, depth_limit: usize) -> Result<Option<Instance<H>>> {
		match (instance, element) {
			(None, None) => Ok(None),

			(None, Some(element)) => {
				let span = trace_span!("Creating", element_type = ?element.element_type());
				let _enter = span.enter();
				let instance = self.instantiate_at(element, depth_limit)?;
				self.host.append_child(parent, &instance.dom())?;
				Ok(Some(instance))
			}

			(Some(instance), None) => {
				self.remove(parent, &instance)?;
				Ok(None)
			}

			(Some(mut instance), Some(element)) => {
				self.update_at(parent, &mut instance, element, depth_limit)?;
				Ok(Some(instance))
			}
		}
	}

	#[instrument(skip(self, parent, instance, element), fields(element_type = ?element.element_type()))]
	fn update_at(&self, parent: &H::Node, instance: &mut Instance<H>, element: &Element, depth_limit: usize) -> Result<()> {
		if depth_limit == 0 {
			error!("Depth limit reached");
			return Err(Error::DepthLimit { limit: self.depth_limit });
		}

		let previous = instance.element();
		if previous.element_type() != element.element_type() {
			let span = trace_span!("Replacing mismatching", previous = ?previous.element_type());
			let _enter = span.enter();
			let replacement = self.instantiate_at(element, depth_limit)?;
			self.host.replace_child(parent, &replacement.dom(), &instance.dom())?;
			let replaced = mem::replace(instance, replacement);
			self.release(&replaced);
			return Ok(());
		}

		match instance {
			Instance::Host(instance) => {
				let span = trace_span!("Updating host element");
				let _enter = span.enter();
				self.host.apply_property_diff(&instance.dom, instance.element.props(), element.props())?;
				instance.element = element.clone();
				self.reconcile_children(&instance.dom, &mut instance.children, element.children(), depth_limit - 1)?;
			}

			Instance::Component(instance) => {
				let span = trace_span!("Re-rendering component");
				let _enter = span.enter();
				let mut slot = instance.slot.try_borrow_mut().map_err(|_| Error::Reentrant)?;
				let slot = &mut *slot;
				let previous_props = mem::replace(&mut slot.public.props, element.props().clone());
				let child = slot.public.render();
				if let Err(error) = self.update_at(parent, &mut slot.child, &child, depth_limit - 1) {
					slot.public.props = previous_props;
					return Err(error);
				}
				slot.element = element.clone();
			}
		}
		Ok(())
	}

	/// Reconciles `children` against `elements` position by position.
	///
	/// On error, `children` still lists exactly the instances whose nodes are attached to `dom`.
	fn reconcile_children(&self, dom: &H::Node, children: &mut Vec<Instance<H>>, elements: &[Element], depth_limit: usize) -> Result<()> {
		let mut previous = mem::take(children).into_iter();
		let count = previous.len().max(elements.len());
		children.reserve(elements.len());
		for i in 0..count {
			let result = match (previous.next(), elements.get(i)) {
				(Some(mut child), Some(element)) => {
					let result = self.update_at(dom, &mut child, element, depth_limit);
					children.push(child);
					result
				}
				(Some(child), None) => self.remove(dom, &child).map_err(|error| {
					children.push(child);
					error
				}),
				(None, Some(element)) => self.reconcile_at(dom, None, Some(element), depth_limit).map(|child| children.extend(child)),
				(None, None) => Ok(()),
			};
			if let Err(error) = result {
				children.extend(previous);
				return Err(error);
			}
		}
		Ok(())
	}

	/// Detaches `instance` from `parent` and releases its subtree.
	fn remove(&self, parent: &H::Node, instance: &Instance<H>) -> Result<()> {
		let span = trace_span!("Removing", element_type = ?instance.element().element_type());
		let _enter = span.enter();
		self.host.remove_child(parent, &instance.dom())?;
		self.release(instance);
		Ok(())
	}

	/// Lets the host release resources of a discarded subtree.
	fn release(&self, instance: &Instance<H>) {
		match instance {
			Instance::Host(instance) => {
				self.host.release_node(&instance.dom, instance.element.props());
				for child in &instance.children {
					self.release(child)
				}
			}
			Instance::Component(instance) => {
				instance.released.set(true);
				match instance.slot.try_borrow() {
					Ok(slot) => self.release(&slot.child),
					Err(_) => error!("meact-dom bug: Released a component that is being reconciled."),
				}
			}
		}
	}
}

fn validate_host_element(element: &Element) -> Result<()> {
	match element.element_type() {
		ElementType::Tag(name) => {
			if name.is_empty() {
				Err(Error::malformed("empty tag name"))
			} else if let Some(c) = name.chars().find(|&c| c.is_whitespace() || matches!(c, '<' | '>' | '/' | '"' | '\'' | '=')) {
				Err(Error::malformed(format!("invalid character {:?} in tag name {:?}", c, name)))
			} else {
				Ok(())
			}
		}
		ElementType::Text if !element.children().is_empty() => Err(Error::malformed("text element with children")),
		ElementType::Text => Ok(()),
		ElementType::Component(component) => Err(Error::malformed(format!("{:?} has no host node of its own", component))),
	}
}

impl<H: Host> Rerender for ComponentInstance<H> {
	#[instrument(skip(self, partial))]
	fn set_state(self: Rc<Self>, partial: State) -> Result<()> {
		let _pass = ReconcilePass::begin()?;

		if self.released.get() {
			warn!("Tried to update the state of a component that was unmounted.");
			return Err(Error::Detached);
		}
		let (dom, element) = {
			let slot = self.slot.try_borrow().map_err(|_| Error::Reentrant)?;
			(slot.child.dom(), slot.element.clone())
		};
		let parent = match self.reconciler.host.parent_of(&dom) {
			Some(parent) => parent,
			None => {
				warn!("Tried to update the state of a component that isn't attached.");
				return Err(Error::Detached);
			}
		};

		let previous_state = {
			let mut slot = self.slot.borrow_mut();
			let previous = slot.public.state.clone();
			slot.public.state.merge(partial);
			previous
		};

		let reconciler = self.reconciler.clone();
		let depth_limit = self.depth_limit;
		let mut instance = Instance::Component(Rc::clone(&self));
		let result = reconciler.update_at(&parent, &mut instance, &element, depth_limit);
		if result.is_err() {
			self.slot.borrow_mut().public.state = previous_state;
		}
		result
	}

	fn is_released(&self) -> bool {
		self.released.get()
	}
}
