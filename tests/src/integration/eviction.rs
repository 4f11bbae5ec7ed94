//! # Session Eviction
//!
//! Sessions nobody polls are abandoned: removed from the registry and
//! every topic, announced on `::gone`, and their tokens stop resolving.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{http, TestFabric};
    use shared_bus::FabricStats;
    use shared_types::{paths, LongPollBatch, ReconnectToken, Source};
    use std::time::Duration;
    use switchyard_gateway::{Endpoint, LongPollClient};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpStream;

    const DEADLINE: Duration = Duration::from_secs(5);

    async fn wait_for_stats(fabric: &TestFabric, done: impl Fn(&FabricStats) -> bool) -> FabricStats {
        tokio::time::timeout(DEADLINE, async {
            loop {
                let stats = fabric.handle.stats().await.unwrap();
                if done(&stats) {
                    return stats;
                }
                tokio::time::sleep(Duration::from_millis(25)).await;
            }
        })
        .await
        .expect("stats reached in time")
    }

    fn subscribe(fabric: &TestFabric, identity: &str, topic: &str) {
        fabric
            .handle
            .update(
                Source::System,
                paths::CONNECT,
                paths::control_message(identity, topic),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_session_leaves_no_subscriptions() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::LongPoll).await;

        let mut subscriber = LongPollClient::new(http(addr));
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();
        subscribe(&fabric, id.as_str(), "a");
        subscribe(&fabric, id.as_str(), "b");

        let before = wait_for_stats(&fabric, |s| s.subscriptions == 2).await;
        assert_eq!(before.sessions, 1);
        assert_eq!(before.topics, 2);

        let after = wait_for_stats(&fabric, |s| s.sessions == 0).await;
        assert_eq!(after, FabricStats::default());
    }

    #[tokio::test]
    async fn test_stale_token_starts_new_session() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::LongPoll).await;

        let mut subscriber = LongPollClient::new(http(addr));
        subscriber.poll().await.unwrap();
        let stale = subscriber.token().unwrap().to_string();
        let old_id = subscriber.identity().unwrap();

        wait_for_stats(&fabric, |s| s.sessions == 0).await;

        let body = reqwest::get(format!("{}/{stale}", http(addr)))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        let batch: LongPollBatch = serde_json::from_str(body.trim_end()).unwrap();
        assert!(batch.updates.is_empty());
        let token = ReconnectToken::parse(&batch.reconnect_with).unwrap();
        assert_ne!(token.identity, old_id);
        assert_eq!(token.confirm, 0);
    }

    #[tokio::test]
    async fn test_abandon_announced_on_gone() {
        let fabric = TestFabric::spawn_fast();
        let poll_addr = fabric.serve(Endpoint::LongPoll).await;
        let line_addr = fabric.serve(Endpoint::Line).await;

        let (reader, mut writer) = TcpStream::connect(line_addr).await.unwrap().into_split();
        let mut lines = BufReader::new(reader).lines();
        let greeting = lines.next_line().await.unwrap().unwrap();
        let watcher = greeting
            .strip_prefix(&format!("{}; ", paths::IDENTITY))
            .unwrap()
            .to_string();
        let subscribe = format!(
            "{};{}\n",
            paths::CONNECT,
            paths::control_message(&watcher, paths::GONE)
        );
        writer.write_all(subscribe.as_bytes()).await.unwrap();
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            format!("{}; ", paths::GONE)
        );

        let mut subscriber = LongPollClient::new(http(poll_addr));
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();

        let gone = tokio::time::timeout(DEADLINE, lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(gone, format!("{}; {id}", paths::GONE));
    }

    #[tokio::test]
    async fn test_polling_keeps_session_alive() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::LongPoll).await;

        let mut subscriber = LongPollClient::new(http(addr));
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();

        // Idle answers every 200ms; each repoll lands well inside the
        // 300ms abandon window
        for _ in 0..3 {
            let batch = subscriber.poll().await.unwrap();
            assert_eq!(batch.reconnect_with, format!("{id}/0"));
        }
        assert_eq!(fabric.handle.stats().await.unwrap().sessions, 1);
    }
}
