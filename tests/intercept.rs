//! End-to-end tests: client → proxy → echo backend.

use intercept_proxy::config::{HeaderRule, ProxyConfig, RewriteRule};

mod common;

fn rule(name: &str, path_prefix: &str) -> RewriteRule {
    RewriteRule {
        name: name.into(),
        path_prefix: Some(path_prefix.into()),
        set_headers: Vec::new(),
        remove_headers: Vec::new(),
        set_body: None,
        read_body: false,
    }
}

#[tokio::test]
async fn test_header_rewrite_reaches_backend() {
    let backend = common::start_echo_backend().await;

    let mut tag = rule("tag-api", "/api");
    tag.set_headers.push(HeaderRule {
        name: "X-Intercepted".into(),
        value: "yes".into(),
    });
    tag.remove_headers.push("x-secret".into());

    let mut config = ProxyConfig::default();
    config.rewrites.push(tag);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::client_via(proxy);
    let echoed = client
        .get(format!("http://{}/api/users?page=2", backend))
        .header("X-Secret", "hunter2")
        .send()
        .await
        .expect("Proxy unreachable")
        .text()
        .await
        .unwrap()
        .to_lowercase();

    assert!(echoed.starts_with("get /api/users?page=2 http/1.1\r\n"), "{}", echoed);
    assert!(echoed.contains("x-intercepted: yes\r\n"), "{}", echoed);
    assert!(!echoed.contains("hunter2"), "{}", echoed);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unmatched_request_is_forwarded_untouched() {
    let backend = common::start_echo_backend().await;

    let mut tag = rule("tag-api", "/api");
    tag.set_headers.push(HeaderRule {
        name: "X-Intercepted".into(),
        value: "yes".into(),
    });

    let mut config = ProxyConfig::default();
    config.rewrites.push(tag);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::client_via(proxy);
    let echoed = client
        .post(format!("http://{}/static/form", backend))
        .body("a=1&b=2")
        .send()
        .await
        .expect("Proxy unreachable")
        .text()
        .await
        .unwrap();

    assert!(echoed.starts_with("POST /static/form HTTP/1.1\r\n"), "{}", echoed);
    assert!(!echoed.to_lowercase().contains("x-intercepted"), "{}", echoed);
    assert!(echoed.ends_with("\r\n\r\na=1&b=2"), "{}", echoed);

    shutdown.trigger();
}

#[tokio::test]
async fn test_read_body_forwards_same_bytes() {
    let backend = common::start_echo_backend().await;

    let mut inspect = rule("inspect", "/");
    inspect.read_body = true;

    let mut config = ProxyConfig::default();
    config.rewrites.push(inspect);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::client_via(proxy);
    let echoed = client
        .post(format!("http://{}/login", backend))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("user=alice&pass=s%20cret")
        .send()
        .await
        .expect("Proxy unreachable")
        .text()
        .await
        .unwrap();

    assert!(echoed.to_lowercase().contains("content-length: 24\r\n"), "{}", echoed);
    assert!(echoed.ends_with("\r\n\r\nuser=alice&pass=s%20cret"), "{}", echoed);

    shutdown.trigger();
}

#[tokio::test]
async fn test_body_replacement_updates_length() {
    let backend = common::start_echo_backend().await;

    let mut replace = rule("replace", "/submit");
    replace.set_body = Some("replaced=1".into());

    let mut config = ProxyConfig::default();
    config.rewrites.push(replace);
    let (proxy, shutdown) = common::start_proxy(config).await;

    let client = common::client_via(proxy);
    let echoed = client
        .post(format!("http://{}/submit", backend))
        .body("original body that is longer")
        .send()
        .await
        .expect("Proxy unreachable")
        .text()
        .await
        .unwrap();

    assert!(echoed.to_lowercase().contains("content-length: 10\r\n"), "{}", echoed);
    assert!(echoed.ends_with("\r\n\r\nreplaced=1"), "{}", echoed);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let (proxy, shutdown) = common::start_proxy(ProxyConfig::default()).await;

    // Bind then drop to get a port with nothing listening.
    let closed = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let client = common::client_via(proxy);
    let res = client
        .get(format!("http://{}/", closed))
        .send()
        .await
        .expect("Proxy unreachable");
    assert_eq!(res.status(), 502);

    shutdown.trigger();
}
