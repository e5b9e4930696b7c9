use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use mercury_probe::device::{MercurySwitchConnector, SwitchApi};
use mercury_probe::error::{ErrorKind, SwitchError};
use mercury_probe::info::InfoValue;
use mercury_probe::probe::{self, ProbeFailure};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const LOGIN_PAGE: &str = include_str!("fixtures/login_page.htm");
const UNKNOWN_LOGIN_PAGE: &str = include_str!("fixtures/unknown_login_page.htm");
const LOGON_OK: &str = include_str!("fixtures/logon_ok.htm");
const LOGON_BAD: &str = include_str!("fixtures/logon_bad.htm");
const SYSTEM_INFO: &str = include_str!("fixtures/system_info.htm");
const PORT_STATISTICS: &str = include_str!("fixtures/port_statistics.htm");
const VLAN_8021Q: &str = include_str!("fixtures/vlan_8021q.htm");
const PORT_STATISTICS_PADDED: &str = include_str!("fixtures/port_statistics_padded.htm");

const COOKIE: &str = "H_P_SSID=f00dcafe";

#[derive(Clone)]
struct Route {
    status: u16,
    body: &'static str,
    set_cookie: Option<&'static str>,
}

fn ok(body: &'static str) -> Route {
    Route {
        status: 200,
        body,
        set_cookie: None,
    }
}

/// One request as the fake switch saw it.
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    path: String,
    cookie: Option<String>,
    body: String,
}

type Log = Arc<Mutex<Vec<Seen>>>;

async fn read_request(stream: &mut TcpStream) -> Option<Seen> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(Seen {
        method,
        path,
        cookie: headers.get("cookie").cloned(),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    })
}

/// Starts a fake switch and returns its `host:port` and request log.
async fn serve(routes: Vec<(&'static str, Route)>) -> (String, Log) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let routes: Arc<HashMap<&'static str, Route>> = Arc::new(routes.into_iter().collect());
    let log = Log::default();
    let server_log = log.clone();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let routes = routes.clone();
            let log = server_log.clone();
            tokio::spawn(async move {
                let Some(seen) = read_request(&mut stream).await else {
                    return;
                };
                let route = routes.get(seen.path.as_str()).cloned().unwrap_or(Route {
                    status: 404,
                    body: "not found",
                    set_cookie: None,
                });
                log.lock().expect("log lock").push(seen);

                let mut response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n",
                    route.status,
                    route.body.len()
                );
                if let Some(cookie) = route.set_cookie {
                    response.push_str(&format!("Set-Cookie: {cookie}; Path=/\r\n"));
                }
                response.push_str("\r\n");
                response.push_str(route.body);
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    (addr.to_string(), log)
}

fn healthy_routes() -> Vec<(&'static str, Route)> {
    vec![
        ("/", ok(LOGIN_PAGE)),
        (
            "/logon.cgi",
            Route {
                status: 200,
                body: LOGON_OK,
                set_cookie: Some(COOKIE),
            },
        ),
        ("/SystemInfoRpm.htm", ok(SYSTEM_INFO)),
        ("/PortStatisticsRpm.htm", ok(PORT_STATISTICS)),
        ("/Vlan8021QRpm.htm", ok(VLAN_8021Q)),
    ]
}

fn text(value: &str) -> Option<InfoValue> {
    Some(InfoValue::from(value))
}

#[tokio::test]
async fn detects_model_from_login_page() {
    let (host, _) = serve(healthy_routes()).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let model = switch.autodetect_model().await.expect("model detected");

    assert_eq!(model.name, "SG108Pro");
    assert_eq!(switch.ports(), 8);
}

#[tokio::test]
async fn unknown_page_is_model_not_detected() {
    let mut routes = healthy_routes();
    routes[0] = ("/", ok(UNKNOWN_LOGIN_PAGE));
    let (host, _) = serve(routes).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let err = switch.autodetect_model().await.expect_err("no model");

    assert_eq!(err.kind(), ErrorKind::ModelNotDetected);
    assert_eq!(switch.ports(), 0);
}

#[tokio::test]
async fn login_posts_form_and_returns_cookie() {
    let (host, log) = serve(healthy_routes()).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "s3cret").expect("connector");

    let cookie = switch.login_cookie().await.expect("login");

    assert_eq!(cookie.as_deref(), Some(COOKIE));
    let seen = log.lock().expect("log lock").clone();
    let post = seen.iter().find(|s| s.path == "/logon.cgi").expect("login request");
    assert_eq!(post.method, "POST");
    assert!(post.body.contains("username=admin"));
    assert!(post.body.contains("password=s3cret"));
    assert!(post.body.contains("logon=Login"));
}

#[tokio::test]
async fn bad_credentials_are_login_failed() {
    let mut routes = healthy_routes();
    routes[1] = (
        "/logon.cgi",
        Route {
            status: 200,
            body: LOGON_BAD,
            set_cookie: Some(COOKIE),
        },
    );
    let (host, _) = serve(routes).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "wrong").expect("connector");

    let err = switch.login_cookie().await.expect_err("login rejected");

    assert_eq!(err.kind(), ErrorKind::LoginFailed);
    assert!(err.to_string().contains("wrong username or password"));
}

#[tokio::test]
async fn accepted_login_without_cookie_ends_probe() {
    let mut routes = healthy_routes();
    routes[1] = ("/logon.cgi", ok(LOGON_OK));
    let (host, log) = serve(routes).await;

    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");
    assert_eq!(switch.login_cookie().await.expect("login accepted"), None);

    let mut input = Cursor::new(format!("{host}\n\nsecret\n").into_bytes());
    let mut out = Vec::new();
    let mut trace = Vec::new();
    let result = probe::run(&mut input, &mut out, &mut trace, |creds| {
        MercurySwitchConnector::new(&creds.host, &creds.username, &creds.password)
    })
    .await;

    let out = String::from_utf8(out).expect("utf8");
    assert!(matches!(result, Err(ProbeFailure::NoCookie)), "{out}");
    assert!(out.contains("✗ Login failed - no cookie received"));
    let seen = log.lock().expect("log lock").clone();
    assert!(!seen.iter().any(|s| s.path == "/SystemInfoRpm.htm"));
}

#[tokio::test]
async fn switch_infos_scrapes_all_pages_with_session_cookie() {
    let (host, log) = serve(healthy_routes()).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let info = switch.switch_infos().await.expect("infos");

    assert_eq!(info.get("switch_model").cloned(), text("SG108Pro"));
    assert_eq!(info.get("switch_mac").cloned(), text("AA-BB-CC-DD-EE-FF"));
    assert_eq!(info.get("switch_ip").cloned(), text("192.168.1.10"));
    assert_eq!(
        info.get("switch_firmware").cloned(),
        text("1.0.0 Build 20230815 Rel.51622")
    );
    assert_eq!(info.get("port_1_status").cloned(), text("up"));
    assert_eq!(info.get("port_1_connection_speed").cloned(), text("1000M Full"));
    assert_eq!(info.get("port_1_tx_good").cloned(), Some(InfoValue::from(1234567u64)));
    assert_eq!(info.get("port_2_status").cloned(), text("down"));
    assert_eq!(info.get("port_3_connection_speed").cloned(), text("100M Full"));
    assert_eq!(info.get("port_8_enabled").cloned(), Some(InfoValue::from(false)));
    assert_eq!(info.get("vlan_enabled").cloned(), Some(InfoValue::from(true)));
    assert_eq!(info.get("vlan_count").cloned(), Some(InfoValue::from(2u64)));
    assert_eq!(info.get("vlan_10_name").cloned(), text("iot"));
    assert_eq!(info.get("vlan_10_tagged_ports").cloned(), text("8"));
    assert_eq!(info.get("vlan_10_untagged_ports").cloned(), text("2,3"));
    assert_eq!(info.get("vlan_1_untagged_ports").cloned(), text("1,2,3,4,5,6,7"));
    assert_eq!(info.get("vlan_1_tagged_ports").cloned(), text(""));

    let seen = log.lock().expect("log lock").clone();
    let paths: Vec<&str> = seen.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/",
            "/logon.cgi",
            "/SystemInfoRpm.htm",
            "/PortStatisticsRpm.htm",
            "/Vlan8021QRpm.htm"
        ]
    );
    for page in seen.iter().skip(2) {
        assert_eq!(page.cookie.as_deref(), Some(COOKIE), "{}", page.path);
    }
}

#[tokio::test]
async fn undetected_model_takes_ports_from_statistics() {
    let mut routes = healthy_routes();
    routes[0] = ("/", ok(UNKNOWN_LOGIN_PAGE));
    let (host, _) = serve(routes).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let info = switch.switch_infos().await.expect("infos");

    assert_eq!(switch.ports(), 8);
    assert_eq!(info.get("switch_model").cloned(), text("SG108Pro"));
}

#[tokio::test]
async fn padded_statistics_stop_at_max_port_num() {
    let mut routes = healthy_routes();
    routes[0] = ("/", ok(UNKNOWN_LOGIN_PAGE));
    routes[3] = ("/PortStatisticsRpm.htm", ok(PORT_STATISTICS_PADDED));
    let (host, _) = serve(routes).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let info = switch.switch_infos().await.expect("infos");

    assert_eq!(switch.ports(), 8);
    assert_eq!(info.get("port_8_enabled").cloned(), Some(InfoValue::from(true)));
    assert!(!info.contains_key("port_9_status"));
    assert!(!info.contains_key("port_10_enabled"));
}

#[tokio::test]
async fn login_form_on_data_page_means_session_rejected() {
    let mut routes = healthy_routes();
    routes[2] = ("/SystemInfoRpm.htm", ok(LOGIN_PAGE));
    let (host, _) = serve(routes).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let err = switch.switch_infos().await.expect_err("session rejected");

    assert_eq!(err.kind(), ErrorKind::LoginFailed);
}

#[tokio::test]
async fn http_error_status_is_connection_error() {
    let mut routes = healthy_routes();
    routes[3] = (
        "/PortStatisticsRpm.htm",
        Route {
            status: 500,
            body: "boom",
            set_cookie: None,
        },
    );
    let (host, _) = serve(routes).await;
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let err = switch.switch_infos().await.expect_err("server error");

    assert_eq!(err.kind(), ErrorKind::ConnectionError);
    assert!(matches!(err, SwitchError::Connection(_)));
}

#[tokio::test]
async fn unreachable_switch_is_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let host = listener.local_addr().expect("addr").to_string();
    drop(listener);
    let mut switch = MercurySwitchConnector::new(&host, "admin", "secret").expect("connector");

    let err = switch.autodetect_model().await.expect_err("nothing listening");

    assert_eq!(err.kind(), ErrorKind::ConnectionError);
}

#[tokio::test]
async fn probe_runs_end_to_end_against_fake_switch() {
    let (host, _) = serve(healthy_routes()).await;
    let mut input = Cursor::new(format!("{host}\n\nsecret\n").into_bytes());
    let mut out = Vec::new();
    let mut trace = Vec::new();

    let result = probe::run(&mut input, &mut out, &mut trace, |creds| {
        MercurySwitchConnector::new(&creds.host, &creds.username, &creds.password)
    })
    .await;

    let out = String::from_utf8(out).expect("utf8");
    assert!(result.is_ok(), "{out}");
    assert!(out.contains("✓ Detected model: SG108Pro"));
    assert!(out.contains("✓ Login successful"));
    assert!(out.contains("MAC Address: AA-BB-CC-DD-EE-FF"));
    assert!(out.contains("Port 1: up   | Speed: 1000M Full      | TX:    1,234,567 | RX:    7,654,321"));
    assert!(out.contains("  vlan_10_untagged_ports: 2,3"));
    assert!(trace.is_empty());
}
