//! # camguard-net
//!
//! Network primitives: a self-signed-cert-tolerant HTTP(S) client, RFC 2617
//! Digest authentication, and a minimal raw-TCP RTSP client exposing
//! `OPTIONS`/`DESCRIBE`.

pub mod digest;
pub mod error;
pub mod http;
pub mod rtsp;

pub use digest::{compute_authorization, generate_cnonce, DigestChallenge, Qop};
pub use error::{NetError, NetResult};
pub use http::{HttpClient, HttpRequestConfig, HttpResponse};
pub use rtsp::{RtspClient, RtspResponse};
