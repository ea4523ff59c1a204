//! Domain clients wrapping [`ResourceClient`](resource_framework::ResourceClient)s.

pub mod contact_client;
pub mod field_client;
pub mod list_client;

pub use contact_client::ContactClient;
pub use field_client::FieldClient;
pub use list_client::ListClient;

use crate::error::MailingError;
use resource_framework::Resource;

/// Turns per-item rejections left by a save into a validation error.
pub(crate) fn ensure_accepted<T: Resource>(item: &T) -> Result<(), MailingError> {
    if item.errors().is_empty() {
        Ok(())
    } else {
        Err(MailingError::ValidationError(
            item.errors().full_messages().join(", "),
        ))
    }
}
