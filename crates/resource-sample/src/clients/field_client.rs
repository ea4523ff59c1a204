//! # Field Client
//!
//! Custom contact fields. There are few of them, so they are usually read all at once.
use crate::error::MailingError;
use crate::model::Field;
use async_trait::async_trait;
use resource_framework::{Criteria, FrameworkError, ResourceApi, ResourceClient};
use tracing::instrument;

#[derive(Clone, Debug)]
pub struct FieldClient {
    inner: ResourceClient<Field>,
}

impl FieldClient {
    pub fn new(inner: ResourceClient<Field>) -> Self {
        Self { inner }
    }

    /// Every field defined on the account (first page).
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Field>, MailingError> {
        self.find(&Criteria::new()).await
    }
}

#[async_trait]
impl ResourceApi<Field> for FieldClient {
    type Error = MailingError;

    fn inner(&self) -> &ResourceClient<Field> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        MailingError::from(e)
    }
}
