//! # ResourceApi Trait
//!
//! Provides a common interface for resource-specific clients, adding default `find`, `save` and
//! `destroy` methods built on top of a generic [`ResourceClient`].
use crate::{Filter, FrameworkError, Resource, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit the standard lifecycle operations.
///
/// # Example
///
/// ```rust
/// use resource_framework::{Errors, FrameworkError, Resource, ResourceApi, ResourceClient, ResourceId};
/// use async_trait::async_trait;
/// use serde::{Deserialize, Serialize};
///
/// // 1. Define the resource
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Segment {
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     id: Option<ResourceId>,
///     #[serde(default)]
///     name: String,
///     #[serde(skip)]
///     errors: Errors,
/// }
///
/// impl Resource for Segment {
///     fn id(&self) -> Option<&ResourceId> { self.id.as_ref() }
///     fn set_id(&mut self, id: Option<ResourceId>) { self.id = id; }
///     fn errors(&self) -> &Errors { &self.errors }
///     fn errors_mut(&mut self) -> &mut Errors { &mut self.errors }
/// }
///
/// #[derive(Debug)]
/// struct SegmentError(String);
///
/// // 2. Wrap the generic client
/// struct SegmentClient {
///     inner: ResourceClient<Segment>,
/// }
///
/// #[async_trait]
/// impl ResourceApi<Segment> for SegmentClient {
///     type Error = SegmentError;
///
///     fn inner(&self) -> &ResourceClient<Segment> {
///         &self.inner
///     }
///
///     fn map_error(e: FrameworkError) -> Self::Error {
///         SegmentError(e.to_string())
///     }
/// }
///
/// // 3. find(), save() and destroy() are provided automatically
/// async fn usage(client: SegmentClient) -> Result<(), SegmentError> {
///     let mut segments = vec![Segment { name: "VIP".into(), ..Segment::default() }];
///     client.save(&mut segments).await?;
///     client.destroy(&mut segments).await
/// }
/// ```
#[async_trait]
pub trait ResourceApi<T: Resource>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// First page of matching records.
    #[tracing::instrument(skip(self, filter), fields(collection = %self.inner().collection()))]
    async fn find<F: Filter + ?Sized>(&self, filter: &F) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().find(filter).await.map_err(Self::map_error)
    }

    /// Create or update each instance; per-item failures land in its `errors`.
    #[tracing::instrument(skip(self, items), fields(collection = %self.inner().collection()))]
    async fn save(&self, items: &mut [T]) -> Result<(), Self::Error> {
        tracing::debug!(count = items.len(), "Sending request");
        self.inner()
            .save(items)
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }

    #[tracing::instrument(skip(self, items), fields(collection = %self.inner().collection()))]
    async fn destroy(&self, items: &mut [T]) -> Result<(), Self::Error> {
        tracing::debug!(count = items.len(), "Sending request");
        self.inner()
            .destroy(items)
            .await
            .map(|_| ())
            .map_err(Self::map_error)
    }
}
