use resource_framework::resource::null_as_default;
use resource_framework::{Errors, Resource, ResourceId};
use serde::{Deserialize, Serialize};

/// A person on one or more mailing lists.
///
/// # Resource Framework
/// Implements [`Resource`], so a [`ResourceClient<Contact>`](resource_framework::ResourceClient)
/// can save, find and destroy it in the remote `contacts` collection.
///
/// - `id` is `None` until the service has accepted the contact.
/// - `list_ids` holds the ids of the [`List`](super::List)s the contact belongs to.
/// - `errors` is never sent; it holds the rejections from the last save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub list_ids: Vec<ResourceId>,
    #[serde(skip)]
    pub errors: Errors,
}

impl Contact {
    /// Creates an unsaved contact.
    ///
    /// # Arguments
    /// * `email` - Address the contact is reached at
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn is_on(&self, list_id: &ResourceId) -> bool {
        self.list_ids.contains(list_id)
    }
}

impl Resource for Contact {
    fn id(&self) -> Option<&ResourceId> {
        self.id.as_ref()
    }

    fn set_id(&mut self, id: Option<ResourceId>) {
        self.id = id;
    }

    fn errors(&self) -> &Errors {
        &self.errors
    }

    fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }
}
