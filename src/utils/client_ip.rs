use actix_web::HttpRequest;

/// Visitor address: first `X-Forwarded-For` hop when behind a proxy, else the peer.
pub fn client_ip(req: &HttpRequest) -> String {
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    match forwarded {
        Some(ip) => ip.to_string(),
        None => req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string()),
    }
}
