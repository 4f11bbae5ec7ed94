//! # Line Protocol Across Transports
//!
//! Line-protocol peers exchanging updates with HTTP publishers and
//! long-poll subscribers through one fabric.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{collect, http, TestFabric};
    use shared_types::{paths, Envelope};
    use std::net::SocketAddr;
    use std::time::Duration;
    use switchyard_gateway::{Endpoint, LongPollClient, PublishClient};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::net::TcpStream;

    const DEADLINE: Duration = Duration::from_secs(5);

    struct LineClient {
        identity: String,
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    impl LineClient {
        async fn connect(addr: SocketAddr) -> Self {
            let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
            let mut lines = BufReader::new(reader).lines();
            let greeting = lines.next_line().await.unwrap().unwrap();
            let identity = greeting
                .strip_prefix(&format!("{}; ", paths::IDENTITY))
                .unwrap()
                .to_string();
            Self {
                identity,
                lines,
                writer,
            }
        }

        async fn send(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
        }

        async fn next(&mut self) -> String {
            tokio::time::timeout(DEADLINE, self.lines.next_line())
                .await
                .unwrap()
                .unwrap()
                .unwrap()
        }

        async fn subscribe(&mut self, topic: &str) {
            let line = format!(
                "{};{}",
                paths::CONNECT,
                paths::control_message(&self.identity, topic)
            );
            self.send(&line).await;
            assert_eq!(self.next().await, format!("{topic}; "));
        }
    }

    #[tokio::test]
    async fn test_text_publish_reaches_line_peer() {
        let fabric = TestFabric::spawn_fast();
        let line_addr = fabric.serve(Endpoint::Line).await;
        let text_addr = fabric.serve(Endpoint::TextHttp).await;

        let mut peer = LineClient::connect(line_addr).await;
        peer.subscribe("alerts").await;

        PublishClient::new(http(text_addr))
            .update("alerts", "disk full")
            .await
            .unwrap();
        assert_eq!(peer.next().await, "alerts; disk full");
    }

    #[tokio::test]
    async fn test_line_publish_reaches_long_poll_subscriber() {
        let fabric = TestFabric::spawn_fast();
        let line_addr = fabric.serve(Endpoint::Line).await;
        let poll_addr = fabric.serve(Endpoint::LongPoll).await;

        let mut subscriber = LongPollClient::new(http(poll_addr));
        subscriber.poll().await.unwrap();
        let id = subscriber.identity().unwrap();

        // The line peer subscribes the session on its behalf
        let mut publisher = LineClient::connect(line_addr).await;
        publisher
            .send(&format!(
                "{};{}",
                paths::CONNECT,
                paths::control_message(id.as_str(), "chat")
            ))
            .await;
        publisher.send("chat;hi there").await;

        let updates = collect(&mut subscriber, 2, DEADLINE).await;
        assert_eq!(
            updates,
            vec![Envelope::new("chat", ""), Envelope::new("chat", "hi there")]
        );
    }

    #[tokio::test]
    async fn test_line_peers_see_each_other_leave() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::Line).await;

        let mut watcher = LineClient::connect(addr).await;
        watcher.subscribe(paths::GONE).await;

        let leaver = LineClient::connect(addr).await;
        let leaver_id = leaver.identity.clone();
        drop(leaver);

        assert_eq!(watcher.next().await, format!("{}; {leaver_id}", paths::GONE));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let fabric = TestFabric::spawn_fast();
        let addr = fabric.serve(Endpoint::Line).await;

        let mut peer = LineClient::connect(addr).await;
        peer.subscribe("t").await;
        let control = paths::control_message(&peer.identity, "t");
        peer.send(&format!("{};{control}", paths::DISCONNECT)).await;
        assert_eq!(peer.next().await, format!("{}; t", paths::UNSUBSCRIBED));

        peer.send("t;dropped").await;
        peer.send("other;marker").await;
        peer.subscribe("other").await;
        peer.send("other;after").await;
        assert_eq!(peer.next().await, "other; after");
    }
}
