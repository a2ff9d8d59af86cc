//! HTTP and WebSocket surface for callcast.
//!
//! Webhook events arrive on `POST /vapi/webhook`, read-only views expose the
//! hub state, and live viewers subscribe on `GET /ws/transcript`.

mod cors;
mod error;
mod routes;
pub mod stream;

pub use cors::Cors;
pub use error::ServerError;

use callcast_config::CallcastConfig;
use callcast_core::CallHub;
use log::{debug, info};
use rocket::{Build, Rocket};
use std::net::{IpAddr, ToSocketAddrs};

/// Resolve the configured host to the IP address rocket binds to.
///
/// Literal addresses are used as-is; names such as `localhost` go through
/// the system resolver and the first result wins.
pub fn listen_address(host: &str) -> Result<IpAddr, ServerError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    let resolved = (host, 0)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip());
    match resolved {
        Some(ip) => {
            debug!("resolved listen host (host={}, address={})", host, ip);
            Ok(ip)
        }
        None => Err(ServerError::Address {
            host: host.to_string(),
        }),
    }
}

/// Assemble the rocket application around an existing hub.
pub fn build(hub: CallHub, config: &CallcastConfig) -> Result<Rocket<Build>, ServerError> {
    let address = listen_address(&config.server.host)?;
    let figment = rocket::Config::figment()
        .merge(("address", address))
        .merge(("port", config.server.port));
    let rocket = rocket::custom(figment)
        .manage(hub)
        .manage(config.server.clone())
        .mount("/", routes::routes());
    if config.server.cors {
        Ok(rocket.attach(Cors))
    } else {
        Ok(rocket)
    }
}

/// Run the server until shutdown.
pub async fn serve(hub: CallHub, config: &CallcastConfig) -> Result<(), ServerError> {
    info!(
        "starting server (host={}, port={}, webhook_url={}/vapi/webhook, websocket_url={}/ws/transcript)",
        config.server.host,
        config.server.port,
        config.server.http_base_url(),
        config.server.ws_base_url()
    );
    build(hub, config)?
        .launch()
        .await
        .map_err(|err| ServerError::Launch(err.to_string()))?;
    info!("server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ServerError, build, listen_address};
    use callcast_config::CallcastConfig;
    use callcast_core::CallHub;
    use pretty_assertions::assert_eq;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn literal_addresses_pass_through() {
        assert_eq!(
            listen_address("0.0.0.0").expect("address"),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
        assert_eq!(
            listen_address("::1").expect("address"),
            "::1".parse::<IpAddr>().expect("ip")
        );
    }

    #[test]
    fn hostnames_are_resolved() {
        let ip = listen_address("localhost").expect("localhost resolves");
        assert!(ip.is_loopback());
    }

    #[test]
    fn unresolvable_host_is_reported() {
        let err = listen_address("callcast.invalid").unwrap_err();
        assert!(matches!(err, ServerError::Address { ref host } if host == "callcast.invalid"));
    }

    #[test]
    fn build_accepts_hostname_config() {
        let mut config = CallcastConfig::default();
        config.server.host = "localhost".to_string();
        let hub = CallHub::new(config.hub.clone());
        assert!(build(hub, &config).is_ok());
    }
}
