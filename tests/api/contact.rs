use formdesk::configuration::Environment;
use formdesk::record_store::{MemoryStore, Table};
use serde_json::json;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{read_json, spawn_app, spawn_app_with_memory_store};

const THANK_YOU: &str = "Thank you for your message! We'll get back to you soon.";

#[tokio::test]
async fn contact_returns_201_with_a_thank_you_for_a_valid_form() {
    let app = spawn_app().await;

    Mock::given(path("/rest/v1/user_queries"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let response = app
        .post_contact(&json!({
            "name": "Ursula Le Guin",
            "email": "ursula@le-guin.com",
            "phone": "+1 (123) 456-7890",
            "message": "When does the next cohort start?"
        }))
        .await;

    assert_eq!(201, response.status().as_u16());
    let body = read_json(response).await;
    assert_eq!(body, json!({ "success": true, "message": THANK_YOU }));
}

#[tokio::test]
async fn contact_succeeds_when_the_store_answers_without_a_body() {
    let app = spawn_app().await;

    Mock::given(path("/rest/v1/user_queries"))
        .and(header("Prefer", "return=minimal"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let response = app
        .post_contact(&json!({
            "name": "Ursula Le Guin",
            "email": "ursula@le-guin.com",
            "message": "Is there a waiting list?"
        }))
        .await;

    assert_eq!(201, response.status().as_u16());
    assert_eq!(read_json(response).await["message"], THANK_YOU);
}

#[tokio::test]
async fn contact_persists_a_trimmed_inquiry_with_the_anon_key() {
    let app = spawn_app().await;

    Mock::given(path("/rest/v1/user_queries"))
        .and(header("apikey", app.anon_key.as_str()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(1)
        .mount(&app.store_server)
        .await;

    app.post_contact(&json!({
        "name": "  Ursula  ",
        "email": "ursula@le-guin.com",
        "phone": "   ",
        "message": "  Hello  "
    }))
    .await;

    let requests = app.store_requests().await;
    assert_eq!(
        requests[0],
        json!([{
            "name": "Ursula",
            "email": "ursula@le-guin.com",
            "phone": null,
            "message": "Hello"
        }])
    );
}

#[tokio::test]
async fn contact_with_an_empty_name_reports_the_name_field() {
    let app = spawn_app_with_memory_store(Environment::Production, MemoryStore::new()).await;

    let response = app
        .post_contact(&json!({ "name": "", "email": "x@y.com", "message": "hi" }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body = read_json(response).await;
    assert_eq!(body["field"], "name");
    assert_eq!(body["error"], "Please enter your name.");
    assert_eq!(app.memory_store.insert_calls(), 0);
}

#[tokio::test]
async fn contact_reports_only_the_first_missing_field() {
    let app = spawn_app_with_memory_store(Environment::Production, MemoryStore::new()).await;

    let test_cases = vec![
        (json!({}), "name", "Please enter your name."),
        (json!({ "name": "Ursula" }), "email", "Please enter your email address."),
        (
            json!({ "name": "Ursula", "email": "ursula" }),
            "email",
            "Please enter a valid email address.",
        ),
        (
            json!({ "name": "Ursula", "email": "x@y.com", "message": " " }),
            "message",
            "Please enter a message.",
        ),
    ];

    for (invalid_body, field, message) in test_cases {
        let response = app.post_contact(&invalid_body).await;
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when {} was invalid.",
            field
        );
        let body = read_json(response).await;
        assert_eq!(body["field"], field);
        assert_eq!(body["error"], message);
    }
    assert_eq!(app.memory_store.insert_calls(), 0);
}

#[tokio::test]
async fn contact_returns_503_without_store_calls_when_unconfigured() {
    for environment in [Environment::Production, Environment::Development] {
        let app = spawn_app_with_memory_store(environment, MemoryStore::unconfigured()).await;

        let response = app
            .post_contact(&json!({ "name": "Ursula", "email": "x@y.com", "message": "hi" }))
            .await;

        assert_eq!(503, response.status().as_u16());
        assert_eq!(
            read_json(response).await["error"],
            "Database connection not available. Please try again later."
        );
        assert_eq!(app.memory_store.insert_calls(), 0);
    }
}

#[tokio::test]
async fn contact_hides_store_diagnostics_behind_a_generic_500() {
    let app = spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy for table \"user_queries\""
        })))
        .expect(1)
        .mount(&app.store_server)
        .await;

    let response = app
        .post_contact(&json!({ "name": "Ursula", "email": "x@y.com", "message": "hi" }))
        .await;

    assert_eq!(500, response.status().as_u16());
    let body = read_json(response).await;
    assert_eq!(body["error"], "Failed to submit the form. Please try again later.");
    assert!(!body.to_string().contains("row-level security"));
}

#[tokio::test]
async fn contact_returns_500_for_a_malformed_body() {
    let app = spawn_app_with_memory_store(Environment::Production, MemoryStore::new()).await;

    let response = app.post_raw("contact", "{\"name\": ".to_string()).await;

    assert_eq!(500, response.status().as_u16());
    assert_eq!(read_json(response).await["error"], "Internal server error");
    assert_eq!(app.memory_store.insert_calls(), 0);
}

#[tokio::test]
async fn repeated_inquiries_are_all_recorded() {
    let app = spawn_app_with_memory_store(Environment::Production, MemoryStore::new()).await;
    let body = json!({ "name": "Ursula", "email": "x@y.com", "message": "hi" });

    for _ in 0..2 {
        let response = app.post_contact(&body).await;
        assert_eq!(201, response.status().as_u16());
    }
    assert_eq!(app.memory_store.records(Table::UserQueries).len(), 2);
}
