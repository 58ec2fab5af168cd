//! The interface to the mutable tree that gets synchronized.

use crate::{
	element::{Element, Listener, Prop, Props},
	Result,
};
use core::fmt::Debug;
use std::borrow::Cow;
use tracing::warn;

/// Primitives to create and mutate host nodes, like [`crate::dom::DomHost`] for the browser DOM.
///
/// The reconciler trusts these to be correct and only ever calls them for host-type elements.
pub trait Host: 'static {
	/// A handle to a host node. Clones must refer to the same node.
	type Node: Clone + Debug + 'static;

	/// Creates a detached node for a tag or text element.
	///
	/// Properties aren't set yet: The reconciler follows up with [`Host::apply_property_diff`] from empty props.
	///
	/// # Errors
	///
	/// Iff the host refuses to create the node.
	fn create_node(&self, element: &Element) -> Result<Self::Node>;

	/// Applies the difference between `old` and `new` onto `node`, as computed by [`diff_props`].
	///
	/// # Errors
	///
	/// Iff a property or listener can't be applied.
	fn apply_property_diff(&self, node: &Self::Node, old: &Props, new: &Props) -> Result<()>;

	/// # Errors
	///
	/// Iff the host refuses the insertion.
	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

	/// # Errors
	///
	/// Iff `child` isn't a child of `parent`.
	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

	/// Puts `new_child` at the position of `old_child`, which is detached.
	///
	/// # Errors
	///
	/// Iff `old_child` isn't a child of `parent`.
	fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) -> Result<()>;

	/// The live parent of `node`, if it has one.
	fn parent_of(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Called once for each host node of a subtree that was removed or replaced, after it was detached.
	/// `props` are the props last applied to the node.
	///
	/// Does nothing by default.
	fn release_node(&self, node: &Self::Node, props: &Props) {
		let _ = (node, props);
	}
}

/// A single step of a property diff.
#[derive(Debug, Clone, PartialEq)]
pub enum PropChange<'a> {
	RemoveListener { event: Cow<'a, str>, listener: &'a Listener },
	AddListener { event: Cow<'a, str>, listener: &'a Listener },
	Clear { name: &'a str },
	Set { name: &'a str, value: &'a Prop },
}

#[must_use]
pub fn is_listener(name: &str) -> bool {
	name.starts_with("on")
}

/// `"onClick"` → `"click"`.
#[must_use]
pub fn event_type(name: &str) -> Cow<'_, str> {
	let event = name.get(2..).unwrap_or_default();
	if event.bytes().any(|b| b.is_ascii_uppercase()) {
		Cow::Owned(event.to_ascii_lowercase())
	} else {
		Cow::Borrowed(event)
	}
}

/// Computes the changes that turn an element with `old` props into one with `new` props.
///
/// - `on*` props are listeners: A changed or missing old listener is removed and a changed or new one is added.
///   Identical listeners are left alone.
/// - Other props are cleared when missing from `new`, and (re)set whenever present in `new`.
/// - [`CHILDREN`](`crate::element::CHILDREN`) isn't a named prop and is never touched.
///
/// All removals come before all additions.
#[must_use]
pub fn diff_props<'a>(old: &'a Props, new: &'a Props) -> Vec<PropChange<'a>> {
	let mut removals = Vec::new();
	let mut additions = Vec::new();

	for (name, value) in old.iter() {
		if is_listener(name) {
			let old_listener = match value.as_listener() {
				Some(listener) => listener,
				None => continue,
			};
			if new.get(name).and_then(Prop::as_listener) != Some(old_listener) {
				removals.push(PropChange::RemoveListener {
					event: event_type(name),
					listener: old_listener,
				})
			}
		} else if new.get(name).is_none() {
			removals.push(PropChange::Clear { name })
		}
	}

	for (name, value) in new.iter() {
		if is_listener(name) {
			let new_listener = match value.as_listener() {
				Some(listener) => listener,
				None => {
					warn!(name, "Ignoring non-listener value of listener prop.");
					continue;
				}
			};
			if old.get(name).and_then(Prop::as_listener) != Some(new_listener) {
				additions.push(PropChange::AddListener {
					event: event_type(name),
					listener: new_listener,
				})
			}
		} else {
			additions.push(PropChange::Set { name, value })
		}
	}

	removals.extend(additions);
	removals
}
