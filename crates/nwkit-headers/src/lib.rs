//! Header collection for nwkit.
//!
//! An ordered multi-map of header name/value pairs with ASCII
//! case-insensitive lookup, additive and replacing mutation, and a
//! canonical, comma-split view of list-valued headers.

pub mod compare;
pub mod error;
pub mod headers;
#[cfg(feature = "http")]
pub mod http_compat;
pub mod keep_alive;
pub mod names;

pub use compare::eq_ignore_ascii_case_bytes;
pub use error::InvalidHeaderName;
pub use headers::{HeaderIndex, Headers, Iter};
#[cfg(feature = "http")]
pub use http_compat::HeaderConversionError;
pub use keep_alive::{HttpVersion, KeepAliveState};
