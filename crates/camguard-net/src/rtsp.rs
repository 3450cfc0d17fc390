//! Minimal raw-TCP RTSP client: `OPTIONS` and `DESCRIBE` only, just enough
//! to probe a stream's existence and auth requirements.
//!
//! The socket is opened fresh per call and dropped on every exit path
//! (success, header-complete, timeout, error) simply by virtue of owning it
//! in a single async function body — there is no path that returns without
//! the `TcpStream` going out of scope exactly once.

use crate::error::{NetError, NetResult};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// How long `describe` waits for an SDP body after the header terminator,
/// once headers have already arrived. A magic constant: devices with slow
/// SDP generation may be misclassified as non-responsive.
const SDP_BODY_WAIT: Duration = Duration::from_millis(150);

#[derive(Debug, Clone)]
pub struct RtspResponse {
    pub status_code: u16,
    pub headers: Option<HashMap<String, String>>,
    pub raw: String,
}

fn parse_status_line(raw: &str) -> u16 {
    raw.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

fn parse_headers(raw: &str) -> Option<HashMap<String, String>> {
    let header_block = raw.split("\r\n\r\n").next()?;
    let mut headers = HashMap::new();
    for line in header_block.lines().skip(1) {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    Some(headers)
}

async fn read_until_headers_complete(stream: &mut TcpStream, overall: Duration) -> NetResult<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    timeout(overall, async {
        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(NetError::Socket)?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = find_double_crlf(&buf) {
                let _ = pos;
                break;
            }
        }
        Ok::<(), NetError>(())
    })
    .await
    .map_err(|_| NetError::Timeout(overall))??;

    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

async fn read_more_for(stream: &mut TcpStream, wait: Duration, prefix: String) -> String {
    let mut buf = prefix.into_bytes();
    let mut chunk = [0u8; 4096];
    let _ = timeout(wait, async {
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
    })
    .await;
    String::from_utf8_lossy(&buf).to_string()
}

fn basic_auth_header(creds: Option<(&str, &str)>) -> Option<String> {
    use std::io::Write;
    creds.map(|(user, pass)| {
        let mut raw = Vec::new();
        write!(raw, "{}:{}", user, pass).ok();
        format!("Basic {}", base64_encode(&raw))
    })
}

/// A small dependency-free base64 encoder; RTSP Basic auth is the only
/// caller and doesn't warrant pulling in the `base64` crate for one path.
fn base64_encode(data: &[u8]) -> String {
    const TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::new();
    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = *chunk.get(1).unwrap_or(&0);
        let b2 = *chunk.get(2).unwrap_or(&0);
        out.push(TABLE[(b0 >> 2) as usize] as char);
        out.push(TABLE[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        out.push(if chunk.len() > 1 {
            TABLE[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            TABLE[(b2 & 0x3f) as usize] as char
        } else {
            '='
        });
    }
    out
}

pub struct RtspClient;

impl RtspClient {
    pub async fn options(
        host: &str,
        port: u16,
        url: &str,
        basic_auth: Option<(&str, &str)>,
        connect_timeout: Duration,
    ) -> NetResult<RtspResponse> {
        let mut request = format!("OPTIONS {} RTSP/1.0\r\nCSeq: 1\r\n", url);
        if let Some(auth) = basic_auth_header(basic_auth) {
            request.push_str(&format!("Authorization: {}\r\n", auth));
        }
        request.push_str("\r\n");

        let raw = Self::send(host, port, &request, connect_timeout, None).await?;
        Ok(RtspResponse {
            status_code: parse_status_line(&raw),
            headers: parse_headers(&raw),
            raw,
        })
    }

    pub async fn describe(
        host: &str,
        port: u16,
        url: &str,
        basic_auth: Option<(&str, &str)>,
        connect_timeout: Duration,
    ) -> NetResult<RtspResponse> {
        let mut request = format!(
            "DESCRIBE {} RTSP/1.0\r\nCSeq: 2\r\nAccept: application/sdp\r\n",
            url
        );
        if let Some(auth) = basic_auth_header(basic_auth) {
            request.push_str(&format!("Authorization: {}\r\n", auth));
        }
        request.push_str("\r\n");

        let raw = Self::send(host, port, &request, connect_timeout, Some(SDP_BODY_WAIT)).await?;
        Ok(RtspResponse {
            status_code: parse_status_line(&raw),
            headers: parse_headers(&raw),
            raw,
        })
    }

    async fn send(
        host: &str,
        port: u16,
        request: &str,
        connect_timeout: Duration,
        sdp_wait: Option<Duration>,
    ) -> NetResult<String> {
        let addr = format!("{}:{}", host, port);
        let mut stream = timeout(connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| NetError::Timeout(connect_timeout))?
            .map_err(NetError::Socket)?;

        stream
            .write_all(request.as_bytes())
            .await
            .map_err(NetError::Socket)?;

        let headers_raw = read_until_headers_complete(&mut stream, connect_timeout).await?;

        let raw = if let Some(wait) = sdp_wait {
            read_more_for(&mut stream, wait, headers_raw).await
        } else {
            headers_raw
        };

        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn unparseable_status_line_yields_zero() {
        assert_eq!(parse_status_line("garbage"), 0);
    }

    #[test]
    fn parses_standard_status_line() {
        assert_eq!(parse_status_line("RTSP/1.0 200 OK\r\n"), 200);
        assert_eq!(parse_status_line("RTSP/1.0 401 Unauthorized\r\n"), 401);
    }

    #[test]
    fn header_block_parses_key_value_pairs() {
        let raw = "RTSP/1.0 200 OK\r\nCSeq: 1\r\nServer: test\r\n\r\n";
        let headers = parse_headers(raw).unwrap();
        assert_eq!(headers.get("CSeq"), Some(&"1".to_string()));
        assert_eq!(headers.get("Server"), Some(&"test".to_string()));
    }

    #[tokio::test]
    async fn options_round_trips_against_a_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(b"RTSP/1.0 200 OK\r\nCSeq: 1\r\nPublic: OPTIONS, DESCRIBE\r\n\r\n")
                    .await;
            }
        });

        let response = RtspClient::options(
            "127.0.0.1",
            addr.port(),
            "rtsp://127.0.0.1/stream",
            None,
            Duration::from_secs(2),
        )
        .await
        .unwrap();

        assert_eq!(response.status_code, 200);
    }
}
