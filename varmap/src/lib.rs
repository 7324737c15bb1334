#[cfg(feature = "core")]
#[doc(inline)]
pub use varmap_core as core;

#[cfg(feature = "query")]
#[doc(inline)]
pub use varmap_query as query;
