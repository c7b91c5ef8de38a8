//! Request annotation.
//!
//! # Responsibilities
//! - Generate the per-request identifier
//! - Resolve the effective remote address
//!
//! # Design Decisions
//! - Identifiers are random, not sequential, and only used for correlation
//! - `X-Forwarded-For` is trusted as-is: the proxy in front is assumed honest

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;
use rand::Rng;

/// Header carrying the proxy chain, client first.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Generate a request identifier: `r` followed by a random non-negative
/// 63-bit integer in base 36.
pub fn generate_request_id() -> String {
    let n = rand::thread_rng().gen_range(0..=i64::MAX as u64);
    format!("r{}", to_base36(n))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(char::from_digit((n % 36) as u32, 36).unwrap_or('0'));
        n /= 36;
    }
    digits.iter().rev().collect()
}

/// First `X-Forwarded-For` entry when present, else the connection peer,
/// else empty.
pub fn remote_addr<B>(req: &Request<B>) -> String {
    let forwarded = req
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty());
    if let Some(forwarded) = forwarded {
        return forwarded
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(i64::MAX as u64), "1y2p0ij32e8e7");
    }

    #[test]
    fn test_request_ids_look_right() {
        let a = generate_request_id();
        let b = generate_request_id();
        assert!(a.starts_with('r'));
        assert!(a.len() > 1);
        assert!(a[1..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let req = Request::builder()
            .header(X_FORWARDED_FOR, " 10.0.0.5 , 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(remote_addr(&req), "10.0.0.5");
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = Request::new(Body::empty());
        assert_eq!(remote_addr(&req), "");

        let peer: SocketAddr = "192.168.1.20:51234".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));
        assert_eq!(remote_addr(&req), "192.168.1.20:51234");
    }
}
