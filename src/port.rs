//! Free TCP port lookup for ephemeral test servers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener};

use tracing::debug;

use crate::{Error, Result};

/// Ask the OS for a free TCP port on `ip` (default `127.0.0.1`).
///
/// The probe socket is closed before returning, so another process may
/// grab the port in between.
pub fn get_free(ip: Option<&str>) -> Result<u16> {
    let addr: IpAddr = match ip {
        None => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Some(raw) => raw.parse().map_err(|source| Error::InvalidIp {
            input: raw.to_owned(),
            source,
        })?,
    };

    let listener = TcpListener::bind(SocketAddr::new(addr, 0))?;
    let port = listener.local_addr()?.port();
    debug!(%addr, port, "found free port");
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn default_address_yields_bindable_port() {
        let port = get_free(None).unwrap();
        assert_ne!(port, 0);
        TcpListener::bind(("127.0.0.1", port)).unwrap();
    }

    #[test]
    fn explicit_ip_is_used() {
        assert_ne!(get_free(Some("127.0.0.1")).unwrap(), 0);
    }

    #[test]
    fn non_ip_is_rejected() {
        let err = get_free(Some("localhost")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(err, Error::InvalidIp { .. }));
    }

    #[test]
    fn unbindable_address_is_an_io_error() {
        // TEST-NET-1, never assigned to a local interface.
        let err = get_free(Some("192.0.2.1")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
