use resource_framework::mock::MockTransport;
use resource_framework::{Client, ClientConfig, FrameworkError, ResourceApi, ResourceId};
use resource_sample::clients::{ContactClient, ListClient};
use resource_sample::model::{Contact, List};
use resource_sample::MailingError;
use serde_json::json;

/// Domain clients against a scripted remote service.
/// Each test checks the exact wire traffic a client method produces.
fn clients(mock: &MockTransport) -> (ListClient, ContactClient) {
    let client = Client::new(mock.transport(), ClientConfig::new("key"));
    (
        ListClient::new(client.resource()),
        ContactClient::new(client.resource()),
    )
}

#[tokio::test]
async fn test_find_by_email_sends_equality_filter() {
    let mock = MockTransport::new();
    mock.expect_login("s-1");
    mock.expect_call("read_contacts").return_body(json!({"return": {
        "id": 12, "email": "ada@example.com", "first_name": "Ada", "list_ids": [3]
    }}));

    let (_, contacts) = clients(&mock);
    let ada = contacts
        .find_by_email("ada@example.com")
        .await
        .unwrap()
        .expect("Contact not found");

    assert_eq!(ada.id, Some(ResourceId::from(12u64)));
    assert_eq!(ada.list_ids, vec![ResourceId::from(3u64)]);
    assert_eq!(
        mock.calls_to("read_contacts")[0].body,
        json!({"filter": {"email": "ada@example.com"}, "page_number": 1})
    );
    mock.verify();
}

#[tokio::test]
async fn test_find_by_name_with_no_match() {
    let mock = MockTransport::new();
    mock.expect_login("s-1");
    mock.expect_call("read_lists").return_body(json!({}));

    let (lists, _) = clients(&mock);
    assert_eq!(lists.find_by_name("Missing").await.unwrap(), None);
    mock.verify();
}

#[tokio::test]
async fn test_subscribe_updates_existing_contact() {
    let mock = MockTransport::new();
    mock.expect_login("s-1");
    mock.expect_call("update_contacts")
        .return_body(json!({"return": {"is_new": false, "is_error": false, "id": 12}}));
    mock.expect_call("add_contacts").return_body(json!({}));

    let (_, contacts) = clients(&mock);
    let list = List {
        id: Some("3".into()),
        ..List::new("Newsletter")
    };
    let mut ada = Contact {
        id: Some("12".into()),
        ..Contact::new("ada@example.com")
    };

    contacts.subscribe(&mut ada, &list).await.unwrap();
    assert_eq!(ada.list_ids, vec![ResourceId::from("3")]);

    let update = &mock.calls_to("update_contacts")[0].body;
    assert_eq!(update["contacts"][0]["id"], json!("12"));
    assert_eq!(update["contacts"][0]["list_ids"], json!(["3"]));
    assert_eq!(mock.calls_to("add_contacts")[0].body, json!({"contacts": []}));
    mock.verify();
}

#[tokio::test]
async fn test_create_list_rejection_becomes_validation_error() {
    let mock = MockTransport::new();
    mock.expect_login("s-1");
    mock.expect_call("add_lists").return_body(json!({"return": {
        "is_new": false, "is_error": true, "error_string": "Name has already been taken"
    }}));

    let (lists, _) = clients(&mock);
    let result = lists.create_list(List::new("Newsletter")).await;

    assert_eq!(
        result,
        Err(MailingError::ValidationError(
            "Name has already been taken".to_string()
        ))
    );
    mock.verify();
}

#[tokio::test]
async fn test_login_failure_maps_to_authentication_error() {
    let mock = MockTransport::new();
    mock.expect_call("login")
        .return_err(FrameworkError::Authentication("invalid api token".into()));

    let (lists, _) = clients(&mock);
    let result = lists.find(&json!({})).await;

    assert_eq!(
        result,
        Err(MailingError::AuthenticationError(
            "invalid api token".to_string()
        ))
    );
    mock.verify();
}

#[tokio::test]
async fn test_transport_failure_maps_to_communication_error() {
    let mock = MockTransport::new();
    mock.expect_login("s-1");
    mock.expect_call("delete_contacts")
        .return_err(FrameworkError::Transport("connection reset".into()));

    let (_, contacts) = clients(&mock);
    let mut items = vec![Contact {
        id: Some("1".into()),
        ..Contact::new("a@example.com")
    }];
    let result = contacts.destroy(&mut items).await;

    assert!(matches!(result, Err(MailingError::CommunicationError(_))));
    assert_eq!(items[0].id, Some(ResourceId::from("1")));
    mock.verify();
}

#[tokio::test]
async fn test_find_tolerates_null_attributes() {
    let mock = MockTransport::new();
    mock.expect_login("s-1");
    mock.expect_call("read_contacts").return_body(json!({"return": [
        {"id": 1, "email": "a@x.io"},
        {"id": 2, "email": null, "list_ids": null}
    ]}));

    let (_, contacts) = clients(&mock);
    let found = contacts.find(&json!({})).await.unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].email, "a@x.io");
    assert_eq!(found[1].id, Some(ResourceId::from(2u64)));
    assert_eq!(found[1].email, "");
    assert!(found[1].list_ids.is_empty());
    mock.verify();
}
