//! Vel Interop - host-integration values
//!
//! Hosts that predate the runtime's value model exchange data as
//! [`ExternalValue`]s: plain scalars plus host-owned lists, maps and
//! messages reached through trait objects. This crate converts between the
//! two models in both directions.
//!
//! # Adapters
//!
//! A container crossing the bridge is wrapped, never copied. A runtime list
//! handed to the host becomes an [`ExternalList`] adapter retained by the
//! caller's [`Arena`](vel_memory::Arena); a host list handed to the runtime
//! becomes a legacy [`ListValue`](vel_value::ListValue) backing. Crossing
//! back unwraps the adapter instead of stacking a second one.

mod adapters;
mod builders;
mod convert;
mod external;

pub use builders::ExternalContainerBuilders;
pub use convert::{from_external, from_external_or_die, to_external, to_external_or_die};
pub use external::{ExternalList, ExternalMap, ExternalValue, ExternalValueKind};
