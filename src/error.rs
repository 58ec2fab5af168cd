use thiserror::Error;

/// Everything that can go wrong while (re)building a host tree.
///
/// Nothing here is retried internally. When a pass fails, the host tree may be partially updated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
	/// The element can't be turned into a host node, for example because its tag name is empty
	/// or because a text element carries children.
	#[error("Malformed element: {reason}")]
	MalformedElement { reason: String },

	/// The component is no longer mounted, or its host node has no parent to reconcile under.
	///
	/// This is recoverable: the partial state was **not** merged.
	#[error("Component instance is detached from the host tree")]
	Detached,

	/// A state update or render was requested while a reconciliation pass was already running.
	///
	/// Nested reconciliation is rejected. The partial state was **not** merged.
	#[error("Reconciliation is already in progress on this thread")]
	Reentrant,

	/// The element tree nests deeper than the configured limit.
	#[error("Depth limit ({limit}) reached")]
	DepthLimit { limit: usize },

	/// A host adapter operation failed.
	#[error("Host operation failed: {0}")]
	Host(String),

	/// The same listener was attached too many times at once.
	#[error("Too many (more than 65k) active references to the same listener")]
	ListenerCountSaturated,
}

impl Error {
	pub(crate) fn malformed(reason: impl Into<String>) -> Self {
		Self::MalformedElement { reason: reason.into() }
	}
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
