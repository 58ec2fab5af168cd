//! Stateful units that render element trees and schedule their own re-render.

use crate::{
	element::{Element, Prop, Props},
	Error, Result,
};
use core::{
	any::{type_name, TypeId},
	cell::OnceCell,
	fmt::{self, Debug, Formatter},
};
use hashbrown::HashMap;
use std::{
	borrow::Cow,
	rc::{Rc, Weak},
};
use tracing::{instrument, trace};

/// A stateful unit whose [`render`](`Component::render`) output is reconciled as its only child.
///
/// The runtime owns the component's props and state and passes them into each render.
/// Keep the [`Updater`] handed to [`Component::new`] to request state changes, for example from listeners.
///
/// ```
/// use meact_dom::{children, create_element, Component, Element, Listener, Props, State, Updater};
///
/// struct Counter {
/// 	updater: Updater,
/// }
/// impl Component for Counter {
/// 	fn new(_: &Props, updater: Updater) -> Self {
/// 		Self { updater }
/// 	}
///
/// 	fn initial_state(&self, _: &Props) -> State {
/// 		State::new().with("count", 0)
/// 	}
///
/// 	fn render(&self, _: &Props, state: &State) -> Element {
/// 		let count = state.get("count").and_then(|count| count.as_number()).unwrap_or_default();
/// 		let updater = self.updater.clone();
/// 		let on_click = Listener::new(move |_| {
/// 			updater.set_state(State::new().with("count", count + 1.0)).ok();
/// 		});
/// 		create_element("button", Some(Props::new().with("onClick", on_click)), children![count])
/// 	}
/// }
/// ```
pub trait Component: 'static {
	fn new(props: &Props, updater: Updater) -> Self
	where
		Self: Sized;

	/// Defaults to empty.
	fn initial_state(&self, props: &Props) -> State {
		let _ = props;
		State::new()
	}

	fn render(&self, props: &Props, state: &State) -> Element;
}

/// Identifies a [`Component`] implementation and knows how to construct it.
#[derive(Clone, Copy)]
pub struct ComponentType {
	type_id: TypeId,
	name: &'static str,
	construct: fn(&Props, Updater) -> Box<dyn Component>,
}
impl ComponentType {
	#[must_use]
	pub fn of<C: Component>() -> Self {
		fn construct<C: Component>(props: &Props, updater: Updater) -> Box<dyn Component> {
			Box::new(C::new(props, updater))
		}

		Self {
			type_id: TypeId::of::<C>(),
			name: type_name::<C>(),
			construct: construct::<C>,
		}
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}
}
impl PartialEq for ComponentType {
	fn eq(&self, other: &Self) -> bool {
		self.type_id == other.type_id
	}
}
impl Eq for ComponentType {}
impl Debug for ComponentType {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "<{} />", self.name)
	}
}

/// A component's state: named values, merged shallowly by [`Updater::set_state`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State(HashMap<Cow<'static, str>, Prop>);
impl State {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Prop>) -> Self {
		self.insert(name, value);
		self
	}

	pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Prop>) -> Option<Prop> {
		self.0.insert(name.into(), value.into())
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Prop> {
		self.0.get(name)
	}

	/// Shallow merge. Keys in `partial` win.
	pub fn merge(&mut self, partial: State) {
		self.0.extend(partial.0)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// The runtime-owned object behind a component instance.
pub(crate) struct PublicInstance {
	pub(crate) props: Props,
	pub(crate) state: State,
	component: Box<dyn Component>,
}
impl PublicInstance {
	#[instrument(skip(props, updater))]
	pub(crate) fn construct(component_type: &ComponentType, props: &Props, updater: Updater) -> Self {
		let component = (component_type.construct)(props, updater);
		let state = component.initial_state(props);
		trace!(state_len = state.len(), "Constructed component.");
		Self {
			props: props.clone(),
			state,
			component,
		}
	}

	pub(crate) fn render(&self) -> Element {
		self.component.render(&self.props, &self.state)
	}
}

/// Implemented by component instances so that [`Updater`] can stay independent of the host.
pub(crate) trait Rerender {
	fn set_state(self: Rc<Self>, partial: State) -> Result<()>;
	fn is_released(&self) -> bool;
}

/// A non-owning handle to the component instance that constructed a [`Component`].
///
/// The handle is bound once the instance exists. Until then, and after the instance has been unmounted,
/// [`Updater::set_state`] fails with [`Error::Detached`].
#[derive(Clone)]
pub struct Updater(Rc<OnceCell<Weak<dyn Rerender>>>);
impl Updater {
	pub(crate) fn unbound() -> Self {
		Self(Rc::new(OnceCell::new()))
	}

	pub(crate) fn bind(&self, instance: Weak<dyn Rerender>) {
		if self.0.set(instance).is_err() {
			tracing::error!("meact-dom bug: `Updater` bound twice. Keeping the first binding.");
		}
	}

	/// Merges `partial` into the component's state and synchronously reconciles it.
	///
	/// # Errors
	///
	/// - [`Error::Detached`] if the component isn't mounted (anymore) or its host node has no parent.
	///   This includes instances that were unmounted but are still kept alive through an [`Instance`](`crate::Instance`).
	/// - [`Error::Reentrant`] if called while a render or reconciliation is in progress.
	///
	/// In both cases, the state is left untouched.
	/// Errors from the reconciliation pass itself are forwarded, and the state is restored as well.
	pub fn set_state(&self, partial: State) -> Result<()> {
		let instance = self.0.get().and_then(Weak::upgrade).ok_or(Error::Detached)?;
		instance.set_state(partial)
	}

	/// Whether the component is currently mounted.
	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.0.get().and_then(Weak::upgrade).map_or(false, |instance| !instance.is_released())
	}
}
impl Debug for Updater {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Updater").field("is_mounted", &self.is_mounted()).finish()
	}
}
