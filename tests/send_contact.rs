mod common;

use axum::http::StatusCode;
use common::{jane, relay, spawn_relay};
use leptos::prelude::{provide_context, Owner};
use portfolio_site::{
    app::{send_contact, ServerFnGateway},
    contact::{
        Field, FormFields, RelayReply, SubmissionClient, SubmissionState, FALLBACK_MESSAGE,
    },
    relay::RelayProvider,
};

/// Makes a fresh reactive owner current for this thread, optionally carrying a relay.
fn enter_owner(relay: Option<portfolio_site::relay::HttpRelay>) -> Owner {
    let owner = Owner::new();
    owner.set();
    if let Some(relay) = relay {
        provide_context(relay);
    }
    owner
}

#[tokio::test]
async fn test_invalid_fields_rejected_without_relay_call() {
    let (url, captured) = spawn_relay(StatusCode::OK, r#"{"success":true}"#).await;
    let _owner = enter_owner(Some(relay(RelayProvider::Json { endpoint: url })));

    let missing = FormFields {
        subject: String::new(),
        ..jane()
    };
    assert_eq!(
        send_contact(missing).await.unwrap(),
        RelayReply::rejected("All fields are required")
    );

    let bad_email = FormFields {
        email: "foo@bar".to_string(),
        ..jane()
    };
    assert_eq!(
        send_contact(bad_email).await.unwrap(),
        RelayReply::rejected("Invalid email address")
    );

    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_fields_are_forwarded() {
    let (url, captured) = spawn_relay(StatusCode::OK, r#"{"success":true}"#).await;
    let _owner = enter_owner(Some(relay(RelayProvider::Json { endpoint: url })));

    let reply = send_contact(jane()).await.unwrap();
    assert!(reply.success);
    assert_eq!(captured.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_relay_outage_is_an_error() {
    let (url, captured) = spawn_relay(StatusCode::SERVICE_UNAVAILABLE, "upstream down").await;
    let _owner = enter_owner(Some(relay(RelayProvider::Json { endpoint: url })));

    assert!(send_contact(jane()).await.is_err());
    assert_eq!(captured.lock().unwrap().len(), 1);

    // the browser gateway turns the server error into the generic message
    let mut client = SubmissionClient::new(ServerFnGateway);
    for field in Field::ALL {
        client.update_field(field, jane().get(field).to_string());
    }
    assert_eq!(
        client.submit().await,
        &SubmissionState::Error(FALLBACK_MESSAGE.to_string())
    );
    assert_eq!(captured.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_missing_relay_context_is_an_error() {
    let _owner = enter_owner(None);

    assert!(send_contact(jane()).await.is_err());
}
