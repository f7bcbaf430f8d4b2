use apphandlers_core::{Bridge, TypeRegistry};

/// The boxed registry the boundary operates against.
pub type DynRegistry = Box<dyn TypeRegistry>;

/// Opaque bridge state handed across the boundary.
///
/// The embedding host constructs one around a concrete [`TypeRegistry`] and
/// passes the raw pointer to the foreign side; every operation borrows it,
/// and [`crate::apphandlers_bridge_free`] reclaims it exactly once.
pub struct BridgeHandle {
	bridge: Bridge<DynRegistry>,
}

impl BridgeHandle {
	#[must_use]
	pub fn new(registry: impl TypeRegistry + 'static) -> Self {
		Self::with_bridge(Bridge::new(Box::new(registry)))
	}

	#[must_use]
	pub fn with_bridge(bridge: Bridge<DynRegistry>) -> Self {
		Self { bridge }
	}

	/// Transfer ownership across the boundary.
	#[must_use]
	pub fn into_raw(self) -> *mut Self {
		Box::into_raw(Box::new(self))
	}

	/// Reclaim a handle previously produced by [`Self::into_raw`].
	///
	/// SAFETY: `ptr` must come from `into_raw` and must never be used again
	/// after this call.
	#[must_use]
	pub unsafe fn from_raw(ptr: *mut Self) -> Box<Self> {
		Box::from_raw(ptr)
	}

	#[must_use]
	pub fn bridge(&self) -> &Bridge<DynRegistry> {
		&self.bridge
	}
}
