use crate::{element::Listener, rc_hash_map::RcHashMap, Error, Result};
use core::cell::Cell;
use js_sys::Function;
use tracing::trace;
use wasm_bindgen::{closure::Closure, JsCast};

thread_local! {
	/// How many published closures are currently running.
	static DISPATCHING: Cell<usize> = Cell::new(0);
}

/// JavaScript closures for [`Listener`]s, shared by identity and reference-counted per attachment.
///
/// Each closure keeps its listener alive, so a listener's address can't be reused while it is published.
#[derive(Default)]
pub(crate) struct ClosureMap(RcHashMap<*const (), u16, Closure<dyn Fn(web_sys::Event)>>);
impl ClosureMap {
	/// Returns the JavaScript function for `listener`, creating it on first use.
	pub(crate) fn publish(&mut self, listener: &Listener) -> Result<Function> {
		let closure = self
			.0
			.acquire_or_insert_with(listener.as_ptr(), || {
				let listener = listener.clone();
				trace!(?listener, "Created Closure.");
				Closure::wrap(Box::new(move |event: web_sys::Event| {
					DISPATCHING.with(|dispatching| dispatching.set(dispatching.get() + 1));
					listener.call(&event);
					DISPATCHING.with(|dispatching| dispatching.set(dispatching.get() - 1));
				}) as Box<dyn Fn(web_sys::Event)>)
			})
			.map_err(|_| Error::ListenerCountSaturated)?;
		Ok(closure.as_ref().unchecked_ref::<Function>().clone())
	}

	/// Gives up one attachment of `listener`, returning its function so it can be detached.
	///
	/// The closure itself stays valid until [`ClosureMap::collect`].
	pub(crate) fn unpublish(&mut self, listener: &Listener) -> Result<Option<Function>> {
		match self.0.release(&listener.as_ptr()) {
			Ok(closure) => Ok(closure.map(|closure| closure.as_ref().unchecked_ref::<Function>().clone())),
			Err(_) => Err(Error::Host(format!("{:?} was detached more often than attached", listener))),
		}
	}

	/// Drops closures that are no longer attached anywhere.
	///
	/// Skipped while a listener runs, since that listener's closure may be among them.
	/// They are then dropped by a later call.
	pub(crate) fn collect(&mut self) {
		if DISPATCHING.with(Cell::get) > 0 {
			return;
		}
		let freed = self.0.collect();
		if freed > 0 {
			trace!("Destroyed {} Closure(s).", freed);
		}
	}

	/// How many listeners are currently attached at least once.
	pub(crate) fn live_len(&self) -> usize {
		self.0.live_len()
	}
}
