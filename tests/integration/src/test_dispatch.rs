//! End-to-end dispatch tests against the signature-checking server.

#[cfg(test)]
mod tests {
    use es_dispatch::{Message, RequestParams, Response};
    use serde_json::json;

    use crate::{CHUNKS, SearchServer};

    #[tokio::test]
    async fn test_should_return_text_when_json_disabled() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let response = es
            .send(&RequestParams::new("get", "/_cat/indices").with_json(false))
            .await
            .unwrap();

        assert_eq!(response, Response::Text("green open logs 1 0\n".to_owned()));
    }

    #[tokio::test]
    async fn test_should_send_signed_json_body() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();
        let query = json!({ "query": { "match": { "title": "rust" } } });

        let response = es
            .send(&RequestParams::new("post", "/_echo").with_message(query.clone()))
            .await
            .unwrap();

        let echoed = response.into_json().unwrap();
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["presignedExpires"], "false");
        let body: serde_json::Value =
            serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
        assert_eq!(body, query);
    }

    #[tokio::test]
    async fn test_should_send_text_message_verbatim() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();
        let bulk = "{\"index\":{\"_id\":\"1\"}}\n{\"level\":\"warn\"}\n";

        let response = es
            .send(&RequestParams::new("PUT", "/_echo").with_message(Message::from(bulk)))
            .await
            .unwrap();

        assert_eq!(response.as_json().unwrap()["body"], bulk);
    }

    #[tokio::test]
    async fn test_should_sign_query_strings_with_reserved_characters() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let response = es
            .send(&RequestParams::new(
                "GET",
                "/_echo?q=title:rust*&size=10&filter_path=hits.hits",
            ))
            .await
            .unwrap();

        assert_eq!(
            response.as_json().unwrap()["query"],
            "q=title:rust*&size=10&filter_path=hits.hits"
        );
    }

    #[tokio::test]
    async fn test_should_reassemble_chunked_response() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let response = es
            .send(&RequestParams::new("GET", "/_chunked"))
            .await
            .unwrap();

        assert_eq!(response, Response::Json(json!({ "results": ["one", "two"] })));
        assert_eq!(CHUNKS.concat(), r#"{"results":["one","two"]}"#);
    }

    #[tokio::test]
    async fn test_should_return_redirect_response_without_following_it() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let response = es
            .send(&RequestParams::new("GET", "/_moved"))
            .await
            .unwrap();

        assert_eq!(response, Response::Json(json!({ "moved": true })));
    }

    #[tokio::test]
    async fn test_should_deliver_result_through_callback() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();
        let (tx, rx) = tokio::sync::oneshot::channel();

        let params = json!({ "method": "get", "path": "_cat/indices", "json": false });
        es.send_with_callback(params, move |result| {
            tx.send(result).ok();
        })
        .await
        .unwrap();

        let response = rx.await.unwrap().unwrap();
        assert_eq!(response.as_text(), Some("green open logs 1 0\n"));
    }

    #[tokio::test]
    async fn test_should_handle_concurrent_requests() {
        let server = SearchServer::start().await.unwrap();
        let es = server.dispatcher();

        let requests = (0..8).map(|i| {
            let es = es.clone();
            async move {
                es.send(&RequestParams::new("POST", "/_echo").with_message(json!({ "n": i })))
                    .await
            }
        });
        let responses = futures::future::join_all(requests).await;

        for (i, response) in responses.into_iter().enumerate() {
            let echoed = response.unwrap().into_json().unwrap();
            assert_eq!(echoed["body"], format!("{{\"n\":{i}}}"));
        }
    }
}
