// tests/trends_session.rs
use hotspot_mapper::ingest::http_client;
use hotspot_mapper::ingest::providers::google_trends::{GoogleTrendsProvider, TrendsQuery};
use hotspot_mapper::ingest::types::SourceProvider;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const EXPLORE: &str = r#")]}'
{"widgets":[{"id":"RELATED_QUERIES","token":"tok1","request":{"restriction":{"complexKeywordsRestriction":{"keyword":[{"type":"BROAD","value":"crypto"}]}}}}]}"#;

/// Minimal HTTP/1.1 server: hands out a cookie on the landing page, records
/// (path, sent cookie) for every request.
async fn serve(listener: TcpListener, requests: usize, log: Arc<Mutex<Vec<(String, bool)>>>) {
    let related = std::fs::read_to_string("tests/fixtures/trends_related.json").unwrap();
    for _ in 0..requests {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let head = String::from_utf8_lossy(&buf).to_string();
        let path = head.split_whitespace().nth(1).unwrap_or_default().to_string();
        let has_cookie = head.to_ascii_lowercase().contains("\r\ncookie: nid=abc");
        log.lock().unwrap().push((path.clone(), has_cookie));

        let (extra, body) = if path.starts_with("/trends/?geo=") {
            ("Set-Cookie: NID=abc; Path=/\r\n", String::new())
        } else if path.starts_with("/trends/api/explore") {
            ("", EXPLORE.to_string())
        } else {
            ("", related.clone())
        };
        let resp = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n{extra}\r\n{body}",
            body.len()
        );
        sock.write_all(resp.as_bytes()).await.unwrap();
        let _ = sock.shutdown().await;
    }
}

#[tokio::test]
async fn session_cookie_is_fetched_first_and_replayed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let server = tokio::spawn(serve(listener, 3, log.clone()));

    let client = http_client("hotspot-mapper-test").unwrap();
    let p = GoogleTrendsProvider::from_client(
        client,
        TrendsQuery {
            regions: vec!["US".into()],
            kw_seed: vec!["crypto".into()],
            top_n: 2,
        },
    )
    .with_base(format!("http://{addr}/trends"));
    assert_eq!(p.session_url(), format!("http://{addr}/trends/?geo=US"));

    let items = p.fetch_latest().await.unwrap();
    server.await.unwrap();

    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["pepe coin", "solana price", "moon coin", "pump fun"]);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0], ("/trends/?geo=US".to_string(), false));
    assert!(log[1].0.starts_with("/trends/api/explore?"));
    assert!(log[2].0.starts_with("/trends/api/widgetdata/relatedsearches?"));
    assert!(log[1].1 && log[2].1, "session cookie not replayed: {log:?}");
}
