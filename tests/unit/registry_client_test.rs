use crate::common::*;
use mdml_streams::mdml::schema::{AuthConfig, RegistryClientConfig};
use mdml_streams::SchemaRegistryClient;
use mockito::Matcher;

const REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

#[tokio::test]
async fn test_register_posts_json_schema() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/subjects/mdml-example-kafkajs-value/versions")
        .match_header("content-type", REGISTRY_CONTENT_TYPE)
        .match_body(Matcher::Json(json!({
            "schema": EXAMPLE_SCHEMA,
            "schemaType": "JSON"
        })))
        .with_status(200)
        .with_header("content-type", REGISTRY_CONTENT_TYPE)
        .with_body(r#"{"id": 7}"#)
        .create_async()
        .await;

    let client = SchemaRegistryClient::new(&server.url()).unwrap();
    let id = client
        .register(SchemaType::Json, EXAMPLE_SCHEMA, EXAMPLE_SUBJECT)
        .await
        .unwrap();

    assert_eq!(id, 7);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rejected_schema() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/subjects/bad-value/versions")
        .with_status(422)
        .with_body(r#"{"error_code": 42201, "message": "Invalid schema"}"#)
        .create_async()
        .await;

    let client = SchemaRegistryClient::new(&server.url()).unwrap();
    let err = client
        .register(SchemaType::Json, "{}", "bad-value")
        .await
        .unwrap_err();

    match err {
        SchemaError::Rejected { subject, reason } => {
            assert_eq!(subject, "bad-value");
            assert!(reason.contains("Invalid schema"));
            assert!(reason.contains("42201"));
        }
        other => panic!("expected a rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_keeps_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/subjects/s-value/versions")
        .with_status(500)
        .with_body("backend unavailable")
        .create_async()
        .await;

    let client = SchemaRegistryClient::new(&server.url()).unwrap();
    let err = client
        .register(SchemaType::Json, "{}", "s-value")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SchemaError::Registry { status: 500, ref message } if message == "backend unavailable"
    ));
}

#[tokio::test]
async fn test_get_schema_is_cached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/schemas/ids/3")
        .with_status(200)
        .with_body(json!({"schema": EXAMPLE_SCHEMA, "schemaType": "JSON"}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = SchemaRegistryClient::new(&server.url()).unwrap();
    let first = client.get_schema(3).await.unwrap();
    let second = client.get_schema(3).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.schema_type, SchemaType::Json);
    assert_eq!(first.schema, EXAMPLE_SCHEMA);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_schema_type_means_avro() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/schemas/ids/4")
        .with_status(200)
        .with_body(r#"{"schema": "\"string\""}"#)
        .create_async()
        .await;

    let client = SchemaRegistryClient::new(&server.url()).unwrap();
    let schema = client.get_schema(4).await.unwrap();
    assert_eq!(schema.schema_type, SchemaType::Avro);

    let serde = RegistrySerde::new(client);
    let framed = mdml_streams::mdml::schema::wire::frame(4, b"\"text\"");
    assert!(matches!(
        serde.decode(&framed).await,
        Err(SchemaError::UnsupportedType(SchemaType::Avro))
    ));
}

#[tokio::test]
async fn test_unknown_id() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/schemas/ids/99")
        .with_status(404)
        .with_body(r#"{"error_code": 40403, "message": "Schema not found"}"#)
        .create_async()
        .await;

    let client = SchemaRegistryClient::new(&server.url()).unwrap();
    assert!(matches!(
        client.get_schema(99).await,
        Err(SchemaError::NotFound(99))
    ));
}

#[tokio::test]
async fn test_basic_auth_header() {
    let mut server = mockito::Server::new_async().await;
    // "user:secret" in base64
    let mock = server
        .mock("GET", "/schemas/ids/1")
        .match_header("authorization", "Basic dXNlcjpzZWNyZXQ=")
        .with_status(200)
        .with_body(r#"{"schema": "{}", "schemaType": "JSON"}"#)
        .create_async()
        .await;

    let config = RegistryClientConfig {
        auth: AuthConfig::Basic {
            username: "user".to_string(),
            password: "secret".to_string(),
        },
        ..RegistryClientConfig::default()
    };
    let client = SchemaRegistryClient::with_config(&server.url(), config).unwrap();
    client.get_schema(1).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_registry() {
    // nothing listens on port 1
    let client = SchemaRegistryClient::with_config(
        "http://127.0.0.1:1",
        RegistryClientConfig {
            timeout: Duration::from_secs(2),
            ..RegistryClientConfig::default()
        },
    )
    .unwrap();

    let err = client
        .register(SchemaType::Json, EXAMPLE_SCHEMA, EXAMPLE_SUBJECT)
        .await
        .unwrap_err();
    assert!(err.is_unreachable());

    let flow_err = MdmlError::registration(EXAMPLE_SUBJECT, err);
    assert!(flow_err.is_connection());
}
