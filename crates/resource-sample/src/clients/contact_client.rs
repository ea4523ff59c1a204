//! # Contact Client
//!
//! Provides a high-level API for contacts and their list memberships.
use super::ensure_accepted;
use crate::error::MailingError;
use crate::model::{Contact, List};
use async_trait::async_trait;
use resource_framework::{Criteria, FrameworkError, ResourceApi, ResourceClient};
use tracing::{debug, info, instrument};

/// Client for the remote `contacts` collection.
#[derive(Clone, Debug)]
pub struct ContactClient {
    inner: ResourceClient<Contact>,
}

impl ContactClient {
    pub fn new(inner: ResourceClient<Contact>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ResourceApi<Contact> for ContactClient {
    type Error = MailingError;

    fn inner(&self) -> &ResourceClient<Contact> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        MailingError::from(e)
    }
}

impl ContactClient {
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Contact>, MailingError> {
        debug!("Sending request");
        let found = self.find(&Criteria::new().eq("email", email)).await?;
        Ok(found.into_iter().next())
    }

    /// First page of contacts subscribed to `list`.
    #[instrument(skip(self, list), fields(list = %list.name))]
    pub async fn members_of(&self, list: &List) -> Result<Vec<Contact>, MailingError> {
        let list_id = list
            .id
            .as_ref()
            .ok_or_else(|| MailingError::NotFound(format!("list `{}` is not saved", list.name)))?;
        self.find(&Criteria::new().eq("list_ids", list_id)).await
    }

    /// Adds `contact` to `list` and saves it; an unsaved contact is created on the way.
    #[instrument(skip(self, contact, list), fields(email = %contact.email, list = %list.name))]
    pub async fn subscribe(&self, contact: &mut Contact, list: &List) -> Result<(), MailingError> {
        let list_id = list
            .id
            .clone()
            .ok_or_else(|| MailingError::NotFound(format!("list `{}` is not saved", list.name)))?;
        if !contact.is_on(&list_id) {
            contact.list_ids.push(list_id);
        }

        self.inner
            .save_one(contact)
            .await
            .map_err(Self::map_error)?;
        ensure_accepted(contact)?;
        info!("Subscribed");
        Ok(())
    }
}
