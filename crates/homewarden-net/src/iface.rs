//! Local network interface resolution

use crate::{NetError, NetResult};
use homewarden_util::MacAddr;
use nix::ifaddrs::getifaddrs;
use std::io;
use std::net::Ipv4Addr;

/// Identity of the local interface probes and wake frames are sent from
#[derive(Debug, Clone)]
pub struct Interface {
    pub name: String,
    pub index: u32,
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

/// Resolve an interface name to its index, IPv4 address and MAC address.
///
/// The first IPv4 address reported for the interface wins. An interface
/// without an IPv4 or link-layer address is a setup error, not something
/// the control loop can recover from.
pub fn resolve_interface(name: &str) -> NetResult<Interface> {
    let addrs =
        getifaddrs().map_err(|errno| NetError::Io(io::Error::from_raw_os_error(errno as i32)))?;

    let mut seen = false;
    let mut index = None;
    let mut ip = None;
    let mut mac = None;

    for ifaddr in addrs {
        if ifaddr.interface_name != name {
            continue;
        }
        seen = true;

        let Some(address) = ifaddr.address else {
            continue;
        };

        if let Some(link) = address.as_link_addr() {
            index = Some(link.ifindex() as u32);
            if let Some(octets) = link.addr() {
                mac = Some(MacAddr::new(octets));
            }
        } else if let Some(sin) = address.as_sockaddr_in() {
            let addr = Ipv4Addr::from(sin.ip());
            if ip.is_none() {
                ip = Some(addr);
            }
        }
    }

    if !seen {
        return Err(NetError::InterfaceNotFound(name.to_string()));
    }

    let mac = mac.ok_or_else(|| NetError::MissingMac(name.to_string()))?;
    let ip = ip.ok_or_else(|| NetError::MissingIpv4(name.to_string()))?;

    Ok(Interface {
        name: name.to_string(),
        index: index.unwrap_or(0),
        ip,
        mac,
    })
}
