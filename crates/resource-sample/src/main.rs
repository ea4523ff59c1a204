use resource_framework::tracing::setup_tracing;
use resource_framework::{ClientConfig, ResourceApi, UpdateErrors};
use resource_sample::lifecycle::MailingSystem;
use resource_sample::model::{Contact, Field, List};
use resource_sample::MailingError;
use tracing::{error, info, warn, Instrument};

const DEMO_API_KEY: &str = "demo-key";

#[tokio::main]
async fn main() -> Result<(), MailingError> {
    dotenvy::dotenv().ok();
    setup_tracing();

    let config = ClientConfig::from_env()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to the demo API key");
            ClientConfig::new(DEMO_API_KEY)
        })
        .with_update_errors(UpdateErrors::Record);

    info!("Starting mailing system");
    let system = MailingSystem::start(config);

    // Custom fields
    let mut fields = vec![Field::new("birthday", "date"), Field::new("company", "text")];
    system.field_client.save(&mut fields).await?;
    let names: Vec<String> = system
        .field_client
        .all()
        .await?
        .into_iter()
        .map(|f| f.name)
        .collect();
    info!(?names, "Fields defined");

    // A list
    let span = tracing::info_span!("list_setup");
    let newsletter = async {
        info!("Creating newsletter list");
        system
            .list_client
            .create_list(List::new("Newsletter").with_description("Monthly product news"))
            .await
    }
    .instrument(span)
    .await?;

    // Contacts, one of them invalid
    let span = tracing::info_span!("contact_import");
    let mut contacts = vec![
        Contact::new("ada@example.com").with_name("Ada", "Lovelace"),
        Contact::new("").with_name("No", "Email"),
        Contact::new("grace@example.com").with_name("Grace", "Hopper"),
    ];
    async {
        info!(count = contacts.len(), "Importing contacts");
        system.contact_client.save(&mut contacts).await
    }
    .instrument(span)
    .await?;

    for contact in contacts.iter().filter(|c| !c.errors.is_empty()) {
        warn!(errors = ?contact.errors.full_messages(), "Contact rejected");
    }

    // Sessions can expire between calls; the next call logs in again
    let expired = system.service.expire_sessions().await?;
    info!(expired, "Expired remote sessions");

    for contact in contacts.iter_mut().filter(|c| c.id.is_some()) {
        if let Err(e) = system.contact_client.subscribe(contact, &newsletter).await {
            error!(error = %e, email = %contact.email, "Subscription failed");
        }
    }

    let members = system.contact_client.members_of(&newsletter).await?;
    info!(members = members.len(), "Newsletter members");

    if let Some(mut ada) = system.contact_client.find_by_email("ada@example.com").await? {
        system
            .contact_client
            .destroy(std::slice::from_mut(&mut ada))
            .await?;
        info!(removed = ada.id.is_none(), "Removed Ada");
    }

    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
