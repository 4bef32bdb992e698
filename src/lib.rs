#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// Hashing and equality policies supplied by the caller.
///
/// The table stores items it knows nothing about; a [`HashPolicy`] tells it
/// how to hash them (twice, for double hashing) and when two of them are
/// equal.
pub mod policy;

pub mod table;

pub use policy::DefaultHashPolicy;
pub use policy::FnPolicy;
pub use policy::HashPolicy;
pub use policy::HasherPolicy;
pub use table::SlotRef;
pub use table::Table;
pub use table::TableStats;
