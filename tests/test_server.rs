//! Startup failures and the plain-TCP accept loop

use expresso::config::Config;
use expresso::Server;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn config_on(port: u16) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = port;
    config
}

#[tokio::test]
async fn test_listen_on_occupied_port_is_an_error() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let result = Server::new(config_on(port))
        .get("/", |_req, res| res.send("unreachable"))
        .listen()
        .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains(&format!("127.0.0.1:{port}")));
}

#[tokio::test]
async fn test_listen_tls_with_missing_files_is_an_error() {
    let result = Server::new(config_on(0))
        .listen_tls("missing.pem", "missing.key")
        .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("missing.pem"));
}

#[tokio::test]
async fn test_listen_tls_with_garbage_certificate_is_an_error() {
    let dir = std::env::temp_dir().join(format!("expresso-tls-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let cert = dir.join("cert.pem");
    let key = dir.join("key.pem");
    std::fs::write(&cert, "not a certificate").unwrap();
    std::fs::write(&key, "not a key").unwrap();

    let result = Server::new(config_on(0)).listen_tls(&cert, &key).await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("cert.pem"));
}

#[tokio::test]
async fn test_listen_serves_requests_over_tcp() {
    let port = {
        let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
        probe.local_addr().unwrap().port()
    };

    let server = tokio::spawn(
        Server::new(config_on(port))
            .get("/ping", |_req, res| res.send("pong"))
            .listen(),
    );

    let mut stream = None;
    for _ in 0..50 {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(s) => {
                stream = Some(s);
                break;
            }
            Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    }
    let mut stream = stream.expect("server accepted a connection");

    stream
        .write_all(b"GET /ping HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    let raw = String::from_utf8_lossy(&out);

    assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(raw.ends_with("\r\n\r\npong"));
    assert!(!server.is_finished());
    server.abort();
}
