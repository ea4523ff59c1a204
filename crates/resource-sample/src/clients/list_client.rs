//! # List Client
//!
//! Provides a high-level API for mailing lists.
//! It wraps a `ResourceClient<List>` and exposes domain-specific methods.
use super::ensure_accepted;
use crate::error::MailingError;
use crate::model::List;
use async_trait::async_trait;
use resource_framework::{Criteria, FrameworkError, ResourceApi, ResourceClient};
use tracing::{debug, instrument};

/// Client for the remote `lists` collection.
#[derive(Clone, Debug)]
pub struct ListClient {
    inner: ResourceClient<List>,
}

impl ListClient {
    pub fn new(inner: ResourceClient<List>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ResourceApi<List> for ListClient {
    type Error = MailingError;

    fn inner(&self) -> &ResourceClient<List> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        MailingError::from(e)
    }
}

impl ListClient {
    /// Saves a new list and returns it with its remote id.
    #[instrument(skip(self, list), fields(name = %list.name))]
    pub async fn create_list(&self, mut list: List) -> Result<List, MailingError> {
        debug!("Sending request");
        self.inner
            .create_one(&mut list)
            .await
            .map_err(Self::map_error)?;
        ensure_accepted(&list)?;
        Ok(list)
    }

    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<List>, MailingError> {
        debug!("Sending request");
        let found = self.find(&Criteria::new().eq("name", name)).await?;
        Ok(found.into_iter().next())
    }
}
