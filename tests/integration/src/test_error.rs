//! Error reporting integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::{cleanup_database, client, create_test_database, json_body, url};

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_return_document_not_found_with_correlation_id() {
        let client = client();
        let db = create_test_database(&client, "missing").await;

        let resp = client
            .get(url(&format!("/{db}/nope")))
            .header("x-correlation-id", "it-corr-1")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()["x-correlation-id"], "it-corr-1");
        let body = json_body(resp).await;
        assert_eq!(body["error"], "document_not_found");
        assert_eq!(body["correlationId"], "it-corr-1");
        assert!(body["message"].as_str().is_some());

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_reject_invalid_json() {
        let client = client();
        let db = create_test_database(&client, "badjson").await;

        let resp = client
            .post(url(&format!("/{db}")))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "invalid_json");

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_return_missing_revision_for_absent_document_update() {
        let client = client();
        let db = create_test_database(&client, "norev").await;

        let resp = client
            .put(url(&format!("/{db}/ghost")))
            .body(r#"{"title":"x"}"#)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(resp).await["error"], "missing_revision");

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_reject_unknown_route_and_method() {
        let client = client();

        let resp = client.get(url("/a/b/c")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["error"], "route_not_found");

        let resp = client.patch(url("/songs/1")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["allow"], "GET, PUT, DELETE");
    }
}
