//! Default server endpoint
//!
//! Same origin as the page, `/ws` path, scheme matched to the page (`https:`
//! pages use `wss:`). The Vite dev server ports talk to the backend directly.

/// Backend address used during local development and on native builds
pub const DEV_ENDPOINT: &str = "ws://localhost:3000/ws";

/// Ports served by the frontend dev server
const DEV_SERVER_PORTS: [&str; 2] = ["5173", "5174"];

/// Derive the endpoint for a page served from `protocol` (e.g. `"https:"`) and `host` (`host[:port]`)
pub fn endpoint_for(protocol: &str, host: &str) -> String {
    let local = host.contains("localhost") || host.contains("127.0.0.1");
    if local && DEV_SERVER_PORTS.iter().any(|port| host.contains(port)) {
        return DEV_ENDPOINT.to_string();
    }

    let scheme = if protocol == "https:" { "wss:" } else { "ws:" };
    format!("{}//{}/ws", scheme, host)
}

/// Endpoint for the current page (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn default_url() -> String {
    let location = match web_sys::window() {
        Some(window) => window.location(),
        None => return DEV_ENDPOINT.to_string(),
    };

    match (location.protocol(), location.host()) {
        (Ok(protocol), Ok(host)) if !host.is_empty() => endpoint_for(&protocol, &host),
        _ => DEV_ENDPOINT.to_string(),
    }
}

/// Native builds have no page origin
#[cfg(not(target_arch = "wasm32"))]
pub fn default_url() -> String {
    DEV_ENDPOINT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_page_uses_wss() {
        assert_eq!(
            endpoint_for("https:", "tarot.example.com"),
            "wss://tarot.example.com/ws"
        );
    }

    #[test]
    fn test_plain_page_uses_ws() {
        assert_eq!(
            endpoint_for("http:", "192.168.1.20:8080"),
            "ws://192.168.1.20:8080/ws"
        );
    }

    #[test]
    fn test_dev_server_falls_back_to_backend_port() {
        assert_eq!(endpoint_for("http:", "localhost:5173"), DEV_ENDPOINT);
        assert_eq!(endpoint_for("http:", "127.0.0.1:5174"), DEV_ENDPOINT);
    }

    #[test]
    fn test_local_non_dev_port_stays_same_origin() {
        assert_eq!(
            endpoint_for("http:", "localhost:3000"),
            "ws://localhost:3000/ws"
        );
    }
}
