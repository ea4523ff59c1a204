//! Remote record types implementing the [`Resource`](resource_framework::Resource) trait.

pub mod contact;
pub mod field;
pub mod list;

pub use contact::*;
pub use field::*;
pub use list::*;
