//! Document CRUD integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::{cleanup_database, client, create_test_database, json_body, url};

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_create_and_get_document() {
        let client = client();
        let db = create_test_database(&client, "crud").await;

        let resp = client
            .post(url(&format!("/{db}")))
            .json(&json!({"_id": "song-1", "title": "Blue"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = client
            .get(url(&format!("/{db}/song-1")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let doc = json_body(resp).await;
        assert_eq!(doc["title"], "Blue");
        assert!(doc["_rev"].as_str().unwrap().starts_with("1-"));

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_update_without_revision() {
        let client = client();
        let db = create_test_database(&client, "update").await;
        client
            .post(url(&format!("/{db}")))
            .json(&json!({"_id": "song-1", "title": "Blue"}))
            .send()
            .await
            .unwrap();

        let resp = client
            .put(url(&format!("/{db}/song-1")))
            .json(&json!({"_id": "song-1", "title": "Green"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let doc = json_body(
            client
                .get(url(&format!("/{db}/song-1")))
                .send()
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(doc["title"], "Green");
        assert!(doc["_rev"].as_str().unwrap().starts_with("2-"));

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_reject_stale_revision_with_conflict() {
        let client = client();
        let db = create_test_database(&client, "stale").await;
        client
            .post(url(&format!("/{db}")))
            .json(&json!({"_id": "song-1", "title": "Blue"}))
            .send()
            .await
            .unwrap();

        let resp = client
            .put(url(&format!("/{db}/song-1")))
            .json(&json!({"_rev": "1-00000000000000000000000000000000", "title": "Red"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(resp).await["error"], "document_conflict");

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_delete_document() {
        let client = client();
        let db = create_test_database(&client, "delete").await;
        client
            .post(url(&format!("/{db}")))
            .json(&json!({"_id": "song-1"}))
            .send()
            .await
            .unwrap();

        let resp = client
            .delete(url(&format!("/{db}/song-1")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client
            .get(url(&format!("/{db}/song-1")))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_list_documents() {
        let client = client();
        let db = create_test_database(&client, "list").await;
        for id in ["a", "b"] {
            client
                .post(url(&format!("/{db}")))
                .json(&json!({"_id": id}))
                .send()
                .await
                .unwrap();
        }

        let resp = client.get(url(&format!("/{db}/docs"))).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let docs = json_body(resp).await;
        let ids: Vec<_> = docs
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["_id"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        cleanup_database(&client, &db).await;
    }
}
