//! # Long-Poll Over HTTP
//!
//! A subscriber holding long polls against a real axum server, fed by the
//! text-protocol endpoint.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{collect, http, TestFabric};
    use shared_types::{Envelope, LongPollBatch, ReconnectToken};
    use std::time::Duration;
    use switchyard_gateway::{Endpoint, GatewayConfig, LongPollClient, PublishClient};

    const DEADLINE: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_publish_reaches_long_poll_subscriber() {
        let fabric = TestFabric::spawn_fast();
        let poll_addr = fabric.serve(Endpoint::LongPoll).await;
        let text_addr = fabric.serve(Endpoint::TextHttp).await;

        let mut subscriber = LongPollClient::new(http(poll_addr));
        let first = subscriber.poll().await.unwrap();
        assert!(first.updates.is_empty());
        let id = subscriber.identity().unwrap();

        let publisher = PublishClient::new(http(text_addr));
        publisher.connect(id.as_str(), "news").await.unwrap();
        publisher.update("news", "extra; extra").await.unwrap();
        publisher.update("other", "ignored").await.unwrap();
        publisher.update("news", "second").await.unwrap();

        let updates = collect(&mut subscriber, 3, DEADLINE).await;
        assert_eq!(
            updates,
            vec![
                Envelope::new("news", ""),
                Envelope::new("news", "extra; extra"),
                Envelope::new("news", "second"),
            ]
        );
    }

    #[tokio::test]
    async fn test_idle_poll_returns_empty_batch() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::LongPoll).await;

        let mut subscriber = LongPollClient::new(http(addr));
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();

        let idle = tokio::time::timeout(DEADLINE, subscriber.poll())
            .await
            .unwrap()
            .unwrap();
        assert!(idle.updates.is_empty());
        assert_eq!(idle.reconnect_with, format!("{id}/0"));
    }

    #[tokio::test]
    async fn test_unconfirmed_items_are_redelivered() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::LongPoll).await;
        let base = http(addr);

        let mut subscriber = LongPollClient::new(&base);
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();
        fabric
            .handle
            .update(
                shared_types::Source::System,
                shared_types::paths::CONNECT,
                shared_types::paths::control_message(id.as_str(), "t"),
            )
            .unwrap();

        let delivered = collect(&mut subscriber, 1, DEADLINE).await;
        assert_eq!(delivered, vec![Envelope::new("t", "")]);

        // Reconnect without confirming: the same item comes back
        let body = reqwest::get(format!("{base}/{id}/0"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let again: LongPollBatch =
            serde_json::from_str(body.trim_end()).unwrap();
        assert_eq!(again.updates, vec![Envelope::new("t", "")]);
        assert_eq!(again.reconnect_with, format!("{id}/1"));
    }

    #[tokio::test]
    async fn test_garbage_token_starts_new_session() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::LongPoll).await;

        let body = reqwest::get(format!("{}/not-a-session/zz", http(addr)))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.ends_with(LongPollBatch::TERMINATOR));
        let batch: LongPollBatch = serde_json::from_str(body.trim_end()).unwrap();
        let token = ReconnectToken::parse(&batch.reconnect_with).unwrap();
        assert!(token.identity.as_str().starts_with("SWITCHYARD-"));
        assert_eq!(token.confirm, 0);
    }

    #[tokio::test]
    async fn test_prefixed_mount_over_http() {
        let fabric = TestFabric::spawn_fast();
        let config = GatewayConfig {
            longpoll_prefix: "comet".to_string(),
            ..GatewayConfig::default()
        };
        let addr = fabric.serve_with(Endpoint::LongPoll, config).await;

        let mut subscriber = LongPollClient::new(format!("{}/comet/", http(addr)));
        subscriber.poll().await.unwrap();
        assert!(subscriber.identity().is_some());

        let status = reqwest::get(http(addr)).await.unwrap().status();
        assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
    }
}
