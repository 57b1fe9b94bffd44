//! Loopback stand-ins for management controllers

#![allow(dead_code)]

use findilo::config::ScanConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_native_tls::native_tls;

pub const ILO2_METADATA: &str = r#"<?xml version="1.0"?>
<RIMP>
  <HSI><SBSN>USE1234XYZ  </SBSN><SPN>ProLiant DL380 G5</SPN></HSI>
  <MP><ST>1</ST><PN>Integrated Lights-Out 2 (iLO 2)</PN><FWRI>2.29</FWRI><HWRI>ASIC: 7</HWRI></MP>
</RIMP>"#;

pub const ILO4_METADATA: &str = r#"<?xml version="1.0"?>
<RIMP>
  <HSI><SBSN>CZ3456ABCD</SBSN><SPN>ProLiant DL360p Gen8</SPN></HSI>
  <MP><PN>Integrated Lights-Out 4 (iLO 4)</PN><FWRI>2.55</FWRI></MP>
</RIMP>"#;

pub const LOGIN_SESSION: &str = r#"{"server_name":"web-01","cn":"ilo-web-01","user_account":"admin"}"#;

pub const LEGACY_LOGIN_PAGE: &str = r#"<html><head><script>
var serverName="dbhost-07";
var nicName="ilo-dbhost-07";
</script></head><body>Integrated Lights-Out 2</body></html>"#;

/// Accepts and immediately drops connections, like the management port
pub async fn spawn_port_listener() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });
    port
}

/// A port nothing listens on
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

type Routes = Arc<HashMap<String, String>>;

fn route_table(routes: &[(&str, &str)]) -> Routes {
    Arc::new(
        routes
            .iter()
            .map(|(path, body)| (path.to_string(), body.to_string()))
            .collect(),
    )
}

/// Answer a single `GET <path>` from the route table, 404 otherwise
async fn respond<S>(mut stream: S, routes: Routes)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
        if request.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let request = String::from_utf8_lossy(&request);
    let path = request.split_whitespace().nth(1).unwrap_or("/");

    let response = match routes.get(path) {
        Some(body) => format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
        None => "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
    };

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Minimal HTTP/1.1 server answering `GET <path>` from a fixed route table
pub async fn spawn_http_server(routes: &[(&str, &str)]) -> u16 {
    let routes = route_table(routes);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(respond(stream, routes.clone()));
        }
    });

    port
}

/// Same routes over TLS with a freshly generated self-signed certificate
pub async fn spawn_https_server(routes: &[(&str, &str)]) -> u16 {
    let routes = route_table(routes);

    let cert = rcgen::generate_simple_self_signed(vec![
        "127.0.0.1".to_string(),
        "localhost".to_string(),
    ])
    .unwrap();
    let identity = native_tls::Identity::from_pkcs8(
        cert.cert.pem().as_bytes(),
        cert.key_pair.serialize_pem().as_bytes(),
    )
    .unwrap();
    let acceptor =
        tokio_native_tls::TlsAcceptor::from(native_tls::TlsAcceptor::new(identity).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let routes = routes.clone();
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(stream).await {
                    respond(stream, routes).await;
                }
            });
        }
    });

    port
}

/// Config pointing every protocol at loopback fixtures
pub fn fixture_config(probe_port: u16, http_port: u16, https_port: u16) -> ScanConfig {
    ScanConfig::default()
        .with_port(probe_port)
        .with_http_ports(http_port, https_port)
        .with_http_timeout(2000)
        .with_workers(2)
        .with_progress(false)
}
