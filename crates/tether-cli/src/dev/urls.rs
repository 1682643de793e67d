//! URL resolution for the browser preview and for devices.

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use tether_native::Platform;

/// Scheme the dev server speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the server listens. The port has already been negotiated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
}

/// URLs derived from one [`ServerAddress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrls {
    pub protocol: Protocol,
    pub port: u16,
    /// `protocol://<pretty host>:port/`
    pub local_url_for_browser: String,
    pub local_url_for_terminal: String,
    /// Bare private IPv4 host, present only for wildcard binds
    pub lan_url_for_config: Option<String>,
    pub lan_url_for_terminal: Option<String>,
    pub fallback_hosts: BTreeMap<Platform, String>,
}

impl ResolvedUrls {
    /// Host a device platform should use in its descriptor.
    ///
    /// The LAN address when one was found, else the platform's fallback.
    pub fn config_host(&self, platform: Platform) -> Option<&str> {
        self.lan_url_for_config
            .as_deref()
            .or_else(|| self.fallback_hosts.get(&platform).map(String::as_str))
    }

    /// `protocol://<config host>:port`, the descriptor `content@src` value.
    pub fn config_url(&self, platform: Platform) -> Option<String> {
        self.config_host(platform)
            .map(|host| format!("{}://{}:{}", self.protocol, host, self.port))
    }
}

/// Resolve URLs, discovering the LAN address from the interface list.
pub fn resolve(address: &ServerAddress) -> ResolvedUrls {
    let lan = if is_unspecified(&address.host) {
        lan_address()
    } else {
        None
    };
    resolve_with(address, lan)
}

/// Resolve URLs with a known LAN address.
pub fn resolve_with(address: &ServerAddress, lan: Option<Ipv4Addr>) -> ResolvedUrls {
    let ServerAddress {
        protocol,
        host,
        port,
    } = address;
    let unspecified = is_unspecified(host);
    let pretty_host = if unspecified { "localhost" } else { host.as_str() };
    let local = format!("{protocol}://{}:{port}/", bracket(pretty_host));

    let lan = lan.filter(|_| unspecified).map(|ip| ip.to_string());
    let lan_terminal = lan
        .as_ref()
        .map(|ip| format!("{protocol}://{ip}:{port}/"));

    let fallback_hosts = Platform::ALL
        .into_iter()
        .filter_map(|p| p.fallback_host().map(|h| (p, h.to_string())))
        .collect();

    ResolvedUrls {
        protocol: *protocol,
        port: *port,
        local_url_for_browser: local.clone(),
        local_url_for_terminal: local,
        lan_url_for_config: lan,
        lan_url_for_terminal: lan_terminal,
        fallback_hosts,
    }
}

fn is_unspecified(host: &str) -> bool {
    host.parse::<IpAddr>()
        .map(|ip| ip.is_unspecified())
        .unwrap_or(false)
}

fn bracket(host: &str) -> String {
    if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    }
}

fn is_private(ip: Ipv4Addr) -> bool {
    ip.is_private() && !ip.is_loopback()
}

/// First non-loopback private IPv4 address on this machine.
fn lan_address() -> Option<Ipv4Addr> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(err) => {
            tracing::debug!(error = %err, "interface discovery failed");
            return None;
        }
    };

    interfaces.into_iter().find_map(|iface| match iface.ip() {
        IpAddr::V4(ip) if !iface.is_loopback() && is_private(ip) => Some(ip),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(protocol: Protocol, host: &str, port: u16) -> ServerAddress {
        ServerAddress {
            protocol,
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn test_wildcard_host_prints_localhost() {
        let urls = resolve_with(&address(Protocol::Http, "0.0.0.0", 8080), None);
        assert_eq!(urls.local_url_for_browser, "http://localhost:8080/");
        assert_eq!(urls.lan_url_for_config, None);

        let urls = resolve_with(&address(Protocol::Https, "::", 9000), None);
        assert_eq!(urls.local_url_for_browser, "https://localhost:9000/");
    }

    #[test]
    fn test_lan_address_used_for_devices() {
        let lan = Ipv4Addr::new(192, 168, 1, 20);
        let urls = resolve_with(&address(Protocol::Http, "0.0.0.0", 8080), Some(lan));

        assert_eq!(urls.lan_url_for_config.as_deref(), Some("192.168.1.20"));
        assert_eq!(
            urls.lan_url_for_terminal.as_deref(),
            Some("http://192.168.1.20:8080/")
        );
        assert_eq!(
            urls.config_url(Platform::Android).as_deref(),
            Some("http://192.168.1.20:8080")
        );
        assert_eq!(
            urls.config_url(Platform::Ios).as_deref(),
            Some("http://192.168.1.20:8080")
        );
    }

    #[test]
    fn test_fallback_hosts_without_lan() {
        let urls = resolve_with(&address(Protocol::Https, "0.0.0.0", 8443), None);
        assert_eq!(
            urls.config_url(Platform::Android).as_deref(),
            Some("https://10.0.2.2:8443")
        );
        assert_eq!(
            urls.config_url(Platform::Ios).as_deref(),
            Some("https://localhost:8443")
        );
        assert_eq!(urls.config_url(Platform::Browser), None);
    }

    #[test]
    fn test_specific_host_has_no_lan_url() {
        let lan = Ipv4Addr::new(10, 0, 0, 5);
        let urls = resolve_with(&address(Protocol::Http, "127.0.0.1", 3000), Some(lan));
        assert_eq!(urls.local_url_for_browser, "http://127.0.0.1:3000/");
        assert_eq!(urls.lan_url_for_config, None);
        assert_eq!(urls.lan_url_for_terminal, None);
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let urls = resolve_with(&address(Protocol::Http, "::1", 3000), None);
        assert_eq!(urls.local_url_for_browser, "http://[::1]:3000/");
    }

    #[test]
    fn test_private_ranges() {
        assert!(is_private(Ipv4Addr::new(10, 1, 2, 3)));
        assert!(is_private(Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_private(Ipv4Addr::new(192, 168, 0, 1)));
        assert!(!is_private(Ipv4Addr::new(172, 32, 0, 1)));
        assert!(!is_private(Ipv4Addr::new(8, 8, 8, 8)));
        assert!(!is_private(Ipv4Addr::new(127, 0, 0, 1)));
    }
}
