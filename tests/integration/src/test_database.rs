//! Database lifecycle integration tests.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::{
        cleanup_database, client, create_test_database, json_body, test_database_name, url,
    };

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_report_health() {
        let client = client();

        let resp = client.get(url("/health")).send().await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-correlation-id"));
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_create_database_idempotently() {
        let client = client();
        let db = create_test_database(&client, "idem").await;

        let resp = client.put(url(&format!("/{db}"))).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_get_database_info() {
        let client = client();
        let db = create_test_database(&client, "info").await;

        let resp = client.get(url(&format!("/{db}"))).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let info = json_body(resp).await;
        assert_eq!(info["db_name"], db.as_str());
        assert_eq!(info["doc_count"], 0);

        cleanup_database(&client, &db).await;
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_delete_database() {
        let client = client();
        let db = create_test_database(&client, "drop").await;

        let resp = client.delete(url(&format!("/{db}"))).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = client.get(url(&format!("/{db}"))).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["error"], "database_not_found");
    }

    #[tokio::test]
    #[ignore = "requires running gateway"]
    async fn test_should_fail_to_delete_missing_database() {
        let client = client();
        let db = test_database_name("ghost");

        let resp = client.delete(url(&format!("/{db}"))).send().await.unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["error"], "delete_database_failed");
    }
}
