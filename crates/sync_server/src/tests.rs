// End-to-end tests over real WebSocket connections.
#[cfg(test)]
mod tests {
    use crate::*;
    use futures::{SinkExt, StreamExt};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpStream;
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn start_server(config: ServerConfig) -> (Arc<SyncServer>, String) {
        let server = Arc::new(SyncServer::new(ServerConfig {
            bind_address: "127.0.0.1:0".parse().expect("valid address"),
            ..config
        }));
        let listener = server.bind().await.expect("bind ephemeral port");
        let url = format!("ws://{}", listener.local_addr().expect("bound address"));

        let serving = server.clone();
        tokio::spawn(async move { serving.serve(listener, None).await });
        (server, url)
    }

    async fn connect(url: &str) -> (Client, Option<ConnectionId>) {
        let (client, response) = connect_async(url).await.expect("client connects");
        let id = response
            .headers()
            .get(CONNECTION_ID_HEADER)
            .map(|value| {
                value
                    .to_str()
                    .expect("ascii header")
                    .parse::<ConnectionId>()
                    .expect("header holds a connection id")
            });
        (client, id)
    }

    async fn next_event(client: &mut Client) -> ServerEvent {
        loop {
            let frame = timeout(Duration::from_secs(5), client.next())
                .await
                .expect("event arrives in time")
                .expect("stream still open")
                .expect("valid frame");
            if let Message::Text(text) = frame {
                return ServerEvent::decode(text.as_str()).expect("valid server event");
            }
        }
    }

    async fn send(client: &mut Client, message: &ClientMessage) {
        let text = message.encode().expect("message encodes");
        client.send(Message::text(text)).await.expect("frame sent");
    }

    /// Connects and reads the initial snapshot. Returns the id the server
    /// announced in the handshake.
    async fn join(url: &str) -> (Client, ConnectionId, PlayerSnapshot) {
        let (mut client, id) = connect(url).await;
        let id = id.expect("handshake announces the connection id");
        match next_event(&mut client).await {
            ServerEvent::CurrentPlayers(snapshot) => (client, id, snapshot),
            other => panic!("expected currentPlayers first, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_join_move_leave_over_websocket() {
        let (server, url) = start_server(ServerConfig::default()).await;

        let (mut c1, s1, snapshot) = join(&url).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!((snapshot[&s1].x, snapshot[&s1].y), (100.0, 100.0));

        let (mut c2, s2, snapshot) = join(&url).await;
        assert_eq!(snapshot.len(), 2);
        assert_ne!(s1, s2);
        assert_eq!((snapshot[&s1].x, snapshot[&s1].y), (100.0, 100.0));
        assert_eq!(snapshot[&s2].id, s2);

        match next_event(&mut c1).await {
            ServerEvent::NewPlayer(state) => {
                assert_eq!(state.id, s2);
                assert_eq!((state.x, state.y), (100.0, 100.0));
            }
            other => panic!("expected newPlayer, got {other:?}"),
        }

        send(&mut c1, &ClientMessage::PlayerMovement(PlayerUpdate::position(120.0, 100.0))).await;
        match next_event(&mut c2).await {
            ServerEvent::PlayerMoved(state) => {
                assert_eq!(state.id, s1);
                assert_eq!((state.x, state.y), (120.0, 100.0));
            }
            other => panic!("expected playerMoved, got {other:?}"),
        }

        // c1 must not see its own update: the next thing it hears is c2 moving.
        send(&mut c2, &ClientMessage::PlayerMovement(PlayerUpdate::position(50.0, 60.0))).await;
        match next_event(&mut c1).await {
            ServerEvent::PlayerMoved(state) => assert_eq!(state.id, s2),
            other => panic!("expected c2's playerMoved, got {other:?}"),
        }

        c1.close(None).await.expect("close handshake starts");
        assert_eq!(next_event(&mut c2).await, ServerEvent::PlayerDisconnected(s1));

        let (_c3, _, snapshot) = join(&url).await;
        assert!(!snapshot.contains_key(&s1));
        assert_eq!(snapshot[&s2].x, 50.0);

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_frames_do_not_disconnect() {
        let (server, url) = start_server(ServerConfig::default()).await;
        let (mut c1, s1, _) = join(&url).await;
        let (mut c2, _, _) = join(&url).await;
        let _ = next_event(&mut c1).await;

        c1.send(Message::text("{not json")).await.expect("frame sent");
        c1.send(Message::text(r#"{"event":"becomeAdmin","data":{}}"#)).await.expect("frame sent");
        c1.send(Message::binary(vec![1, 2, 3])).await.expect("frame sent");
        send(&mut c1, &ClientMessage::PlayerMovement(PlayerUpdate::position(1.0, 2.0))).await;

        match next_event(&mut c2).await {
            ServerEvent::PlayerMoved(state) => {
                assert_eq!(state.id, s1);
                assert_eq!((state.x, state.y), (1.0, 2.0));
            }
            other => panic!("expected playerMoved, got {other:?}"),
        }

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_limit_refuses_extra_clients() {
        let (server, url) = start_server(ServerConfig {
            max_connections: 1,
            ..Default::default()
        })
        .await;
        let (_c1, _, _) = join(&url).await;

        let (mut refused, _) = connect(&url).await;
        let frame = timeout(Duration::from_secs(5), refused.next())
            .await
            .expect("close arrives in time");
        assert!(matches!(frame, Some(Ok(Message::Close(_)))));
        assert_eq!(server.get_hub().player_count().await, 1);

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_closes_open_connections() {
        let (server, url) = start_server(ServerConfig::default()).await;
        let (mut c1, _, _) = join(&url).await;

        server.shutdown();

        let frame = timeout(Duration::from_secs(5), c1.next())
            .await
            .expect("close arrives in time");
        assert!(matches!(frame, Some(Ok(Message::Close(_))) | None));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_custom_spawn_point() {
        let (server, url) = start_server(ServerConfig {
            spawn: SpawnPoint { x: -5.0, y: 12.5 },
            ..Default::default()
        })
        .await;

        let (_c1, s1, snapshot) = join(&url).await;
        let state = &snapshot[&s1];
        assert_eq!((state.x, state.y), (-5.0, 12.5));

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_finds_itself_in_crowded_snapshot() {
        let (server, url) = start_server(ServerConfig::default()).await;
        let (mut c1, s1, _) = join(&url).await;
        let (mut c2, s2, _) = join(&url).await;
        let _ = next_event(&mut c1).await;

        // Once c2 has seen the move relayed, the registry holds it.
        send(&mut c1, &ClientMessage::PlayerMovement(PlayerUpdate::position(300.0, 40.0))).await;
        let _ = next_event(&mut c2).await;

        let (_c3, s3, snapshot) = join(&url).await;
        assert_eq!(snapshot.len(), 3);

        let own = &snapshot[&s3];
        assert_eq!(own.id, s3);
        assert_eq!((own.x, own.y), (100.0, 100.0));

        let others: Vec<_> = snapshot.keys().filter(|id| **id != s3).copied().collect();
        assert_eq!(others.len(), 2);
        assert!(others.contains(&s1));
        assert!(others.contains(&s2));
        assert_eq!(snapshot[&s1].x, 300.0);

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_movement_burst_arrives_in_order() {
        const BURST: usize = 50;
        let (server, url) = start_server(ServerConfig::default()).await;
        let (mut c1, s1, _) = join(&url).await;
        let (mut c2, _, _) = join(&url).await;
        let _ = next_event(&mut c1).await;

        for step in 0..BURST {
            let x = step as f64;
            send(&mut c1, &ClientMessage::PlayerMovement(PlayerUpdate::position(x, 0.0))).await;
        }

        let mut seen = Vec::with_capacity(BURST);
        for _ in 0..BURST {
            match next_event(&mut c2).await {
                ServerEvent::PlayerMoved(state) => {
                    assert_eq!(state.id, s1);
                    seen.push(state.x);
                }
                other => panic!("expected playerMoved, got {other:?}"),
            }
        }

        assert_eq!(seen.len(), BURST);
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]), "out of order: {seen:?}");
        assert_eq!(seen.last().copied(), Some((BURST - 1) as f64));

        server.shutdown();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_client_close_is_acknowledged() {
        let (server, url) = start_server(ServerConfig::default()).await;
        let (mut c1, _, _) = join(&url).await;

        c1.close(None).await.expect("close handshake starts");

        let frame = timeout(Duration::from_secs(5), c1.next())
            .await
            .expect("acknowledgement arrives in time");
        assert!(
            matches!(frame, Some(Ok(Message::Close(_)))),
            "expected a close reply, got {frame:?}"
        );

        server.shutdown();
    }
}
