//! A minimal virtual DOM.
//!
//! Build element trees with [`create_element`], then [`mount`] them into a host container.
//! Each [`MountHandle::render`] reconciles the new tree against the previous one,
//! reusing host nodes where the element type at a position stays the same.
//! [`Component`]s re-render themselves through their [`Updater`].
//!
//! Reconciliation is synchronous. Nested passes (for example a state update from inside a render)
//! are rejected with [`Error::Reentrant`].

#![doc(html_root_url = "https://docs.rs/meact-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod closure_map;
mod rc_hash_map;

pub mod component;
pub mod dom;
pub mod element;
mod error;
pub mod host;
pub mod instance;
mod mount;
pub mod reconcile;

pub use component::{Component, ComponentType, State, Updater};
pub use element::{create_element, create_text_element, Child, ChildArg, Element, ElementType, Listener, Prop, Props};
pub use error::{Error, Result};
pub use host::Host;
pub use instance::Instance;
pub use mount::{mount, MountHandle, MountOptions};
pub use reconcile::Reconciler;
