//! # JSON Batch Ingest
//!
//! Batches posted to the ingest endpoint are published in array order.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{collect, http, TestFabric};
    use shared_types::{paths, Envelope};
    use std::time::Duration;
    use switchyard_gateway::{ClientError, Endpoint, LongPollClient, PublishClient};

    const DEADLINE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_batch_delivered_in_order() {
        let fabric = TestFabric::spawn_fast();
        let poll_addr = fabric.serve(Endpoint::LongPoll).await;
        let ingest_addr = fabric.serve(Endpoint::Ingest).await;

        let mut subscriber = LongPollClient::new(http(poll_addr));
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();

        let batch = vec![
            Envelope::new(paths::CONNECT, paths::control_message(id.as_str(), "feed")),
            Envelope::new("feed", "one"),
            Envelope::new("elsewhere", "skip"),
            Envelope::new("feed", "two"),
            Envelope::new("feed", "three"),
        ];
        PublishClient::new(http(ingest_addr))
            .ingest(&batch)
            .await
            .unwrap();

        let updates = collect(&mut subscriber, 4, DEADLINE).await;
        let messages: Vec<_> = updates.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["", "one", "two", "three"]);
        assert!(updates.iter().all(|e| e.path == "feed"));
    }

    #[tokio::test]
    async fn test_separate_ingest_url() {
        let fabric = TestFabric::spawn_fast();
        let text_addr = fabric.serve(Endpoint::TextHttp).await;
        let ingest_addr = fabric.serve(Endpoint::Ingest).await;

        let client = PublishClient::new(http(text_addr)).with_ingest(http(ingest_addr));
        client.ingest(&[Envelope::new("t", "m")]).await.unwrap();
        client.update("t", "m").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_array_body_rejected() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::Ingest).await;

        let response = reqwest::Client::new()
            .post(format!("{}/", http(addr)))
            .body(r#"{"path":"t","message":"m"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body, serde_json::json!({"error": true}));
    }

    #[tokio::test]
    async fn test_ingest_against_text_endpoint_fails() {
        let fabric = TestFabric::spawn_fast();
        let text_addr = fabric.serve(Endpoint::TextHttp).await;

        // No ingest URL: the batch goes to the text endpoint, which does not
        // answer with an ingest reply
        let result = PublishClient::new(http(text_addr))
            .ingest(&[Envelope::new("t", "m")])
            .await;
        assert!(matches!(
            result,
            Err(ClientError::Rejected(_) | ClientError::Decode(_))
        ));
    }
}
