//! Error normalization integration tests.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use es_dispatch::{
        Credentials, DispatchError, Dispatcher, DispatcherConfig, ReqwestTransport, RequestParams,
        StaticCredentialProvider,
    };
    use http::StatusCode;
    use serde_json::json;

    use crate::{ACCESS_KEY, REGION, SearchServer, closed_endpoint};

    #[tokio::test]
    async fn test_should_use_message_field_of_error_response() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let err = es
            .send(&RequestParams::new("GET", "/missing/_search"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.to_string(), "no such index [/missing/_search]");
    }

    #[tokio::test]
    async fn test_should_fall_back_to_raw_text_of_error_response() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let err = es
            .send(&RequestParams::new("DELETE", "/_plain_error"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(err.to_string(), "plain text");
    }

    #[tokio::test]
    async fn test_should_report_invalid_json_with_response_text() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let err = es
            .send(&RequestParams::new("GET", "/_broken"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid JSON response");
        assert_eq!(err.response_text(), Some("response text expecting json"));
    }

    #[tokio::test]
    async fn test_should_be_rejected_with_wrong_secret() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher_with(Credentials::new(ACCESS_KEY, "not-the-secret"));

        let err = es
            .send(&RequestParams::new("GET", "/_cat/indices").with_json(false))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "Signature does not match");
    }

    #[tokio::test]
    async fn test_should_reject_invalid_params_without_sending() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let err = es.send_value(&json!(null)).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingParams));

        let err = es.send_value(&json!({ "path": "/_echo" })).await.unwrap_err();
        assert!(matches!(err, DispatchError::MissingMethod));
        assert!(err.is_caller_error());
    }

    #[tokio::test]
    async fn test_should_surface_connection_errors_as_transport_errors() {
        let endpoint = closed_endpoint().await.unwrap();
        let es = Dispatcher::new(
            Arc::new(ReqwestTransport::new()),
            Arc::new(StaticCredentialProvider::new(Credentials::new(ACCESS_KEY, "secret"))),
            &DispatcherConfig::new(endpoint, REGION),
        )
        .unwrap();

        let err = es
            .send(&RequestParams::new("GET", "/_cat/indices"))
            .await
            .unwrap_err();

        let source = err
            .as_transport()
            .and_then(|e| e.get_ref())
            .and_then(|e| e.downcast_ref::<reqwest::Error>())
            .expect("reqwest error");
        assert!(source.is_connect());
    }
}
