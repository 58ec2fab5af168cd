//! [`Host`] for the browser DOM through [`web_sys`].

use crate::{
	closure_map::ClosureMap,
	element::{Element, ElementType, Prop, Props},
	host::{diff_props, event_type, is_listener, Host, PropChange},
	Error, Result,
};
use core::cell::RefCell;
use js_sys::Reflect;
use tracing::{error, instrument, trace, warn};
use wasm_bindgen::JsValue;

/// Creates and patches [`web_sys::Node`]s in one [`web_sys::Document`].
///
/// Properties are assigned as JavaScript properties (so `nodeValue`, `value` and `className` work as expected),
/// not as attributes. Listeners are shared per [`Listener`](`crate::Listener`) identity.
///
/// Event listeners stop working once the instance is dropped.
pub struct DomHost {
	document: web_sys::Document,
	closures: RefCell<ClosureMap>,
}
impl DomHost {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			closures: RefCell::default(),
		}
	}

	/// Uses the current window's document.
	///
	/// # Errors
	///
	/// Iff there is no such document, for example outside of a browser main thread.
	pub fn from_window() -> Result<Self> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| Error::Host("No document found.".to_string()))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// How many distinct listeners are currently attached to any node.
	#[must_use]
	pub fn listener_count(&self) -> usize {
		self.closures.borrow().live_len()
	}

	fn detach_listener(closures: &mut ClosureMap, node: &web_sys::Node, event: &str, listener: &crate::Listener) -> Result<()> {
		match closures.unpublish(listener)? {
			Some(function) => node.remove_event_listener_with_callback(event, &function).map_err(host_error),
			None => {
				error!(event, "Tried to remove a listener that was never added.");
				Ok(())
			}
		}
	}
}

impl Host for DomHost {
	type Node = web_sys::Node;

	fn create_node(&self, element: &Element) -> Result<Self::Node> {
		match element.element_type() {
			ElementType::Text => Ok(self.document.create_text_node("").into()),
			ElementType::Tag(name) => self.document.create_element(name).map(Into::into).map_err(host_error),
			ElementType::Component(component) => Err(Error::MalformedElement {
				reason: format!("{:?} has no host node of its own", component),
			}),
		}
	}

	#[instrument(skip(self, old, new))]
	fn apply_property_diff(&self, node: &Self::Node, old: &Props, new: &Props) -> Result<()> {
		let mut closures = self.closures.borrow_mut();
		for change in diff_props(old, new) {
			match change {
				PropChange::RemoveListener { event, listener } => {
					trace!(event = &*event, "Removing event listener.");
					Self::detach_listener(&mut closures, node, &event, listener)?;
				}
				PropChange::AddListener { event, listener } => {
					trace!(event = &*event, "Adding event listener.");
					let function = closures.publish(listener)?;
					node.add_event_listener_with_callback(&event, &function).map_err(host_error)?;
				}
				PropChange::Clear { name } => {
					trace!(name, "Clearing property.");
					Reflect::set(node, &JsValue::from_str(name), &JsValue::NULL).map_err(host_error)?;
				}
				PropChange::Set { name, value } => {
					if cfg!(feature = "dangerous-logging") {
						trace!(name, ?value, "Setting property.");
					} else {
						trace!(name, "Setting property.");
					}
					Reflect::set(node, &JsValue::from_str(name), &to_js(name, value)).map_err(host_error)?;
				}
			}
		}
		closures.collect();
		Ok(())
	}

	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()> {
		parent.append_child(child).map(drop).map_err(host_error)
	}

	fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()> {
		parent.remove_child(child).map(drop).map_err(host_error)
	}

	fn replace_child(&self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) -> Result<()> {
		parent.replace_child(new_child, old_child).map(drop).map_err(host_error)
	}

	fn parent_of(&self, node: &Self::Node) -> Option<Self::Node> {
		node.parent_node()
	}

	fn release_node(&self, node: &Self::Node, props: &Props) {
		let mut closures = self.closures.borrow_mut();
		for (name, value) in props.iter().filter(|(name, _)| is_listener(name)) {
			if let Some(listener) = value.as_listener() {
				if let Err(error) = Self::detach_listener(&mut closures, node, &event_type(name), listener) {
					error!("Failed to release listener {:?}: {}", name, error)
				}
			}
		}
		closures.collect();
	}
}

fn to_js(name: &str, value: &Prop) -> JsValue {
	match value {
		Prop::Str(str) => JsValue::from_str(str),
		Prop::Number(number) => JsValue::from_f64(*number),
		Prop::Bool(bool) => JsValue::from_bool(*bool),
		Prop::Listener(_) => {
			warn!(name, "Listener assigned to a prop without `on` prefix. Assigning `undefined`.");
			JsValue::UNDEFINED
		}
	}
}

#[allow(clippy::needless_pass_by_value)]
fn host_error(error: JsValue) -> Error {
	Error::Host(format!("{:?}", error))
}
