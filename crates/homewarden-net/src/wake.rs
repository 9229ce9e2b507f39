//! Wake-on-LAN magic packet transmitter

use crate::iface::Interface;
use crate::{NetError, NetResult};
use homewarden_util::MacAddr;
use socket2::{Domain, SockAddr, Socket, Type};
use std::mem;
use tracing::debug;

/// EtherType for Wake-on-LAN frames
pub const WOL_ETHERTYPE: u16 = 0x0842;

const MAGIC_LEN: usize = 102;
const ETHERNET_HEADER_LEN: usize = 14;
const FRAME_LEN: usize = ETHERNET_HEADER_LEN + MAGIC_LEN;

/// Transmits Wake-on-LAN magic packets on the configured interface
///
/// Holds only the interface identity; each call opens, uses and drops its
/// own packet socket.
#[derive(Debug, Clone)]
pub struct WakeSender {
    interface_index: u32,
    local_mac: MacAddr,
}

impl WakeSender {
    pub fn new(iface: &Interface) -> Self {
        Self {
            interface_index: iface.index,
            local_mac: iface.mac,
        }
    }

    /// Send one magic packet to `target`.
    ///
    /// Success means the kernel accepted the frame for transmission;
    /// Wake-on-LAN is one-way, so there is no acknowledgment that the
    /// machine actually wakes.
    pub fn wake(&self, target: MacAddr) -> NetResult<()> {
        let frame = build_frame(self.local_mac, target);

        let socket = Socket::new(Domain::PACKET, Type::RAW, None)?;
        let addr = link_layer_addr(self.interface_index, target);

        debug!(target = %target, "Sending Wake-on-LAN magic packet");
        let written = socket.send_to(&frame, &addr)?;
        if written == 0 {
            return Err(NetError::NothingSent);
        }

        Ok(())
    }
}

/// The 102-byte magic payload: six 0xFF bytes, then the target MAC sixteen
/// times.
fn magic_packet(mac: MacAddr) -> [u8; MAGIC_LEN] {
    let mut payload = [0u8; MAGIC_LEN];
    payload[..6].fill(0xFF);

    let octets = mac.octets();
    for repetition in 0..16 {
        let base = 6 + repetition * 6;
        payload[base..base + 6].copy_from_slice(&octets);
    }
    payload
}

/// Wrap the magic payload in an Ethernet frame from `source` to
/// `destination`.
fn build_frame(source: MacAddr, destination: MacAddr) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..6].copy_from_slice(&destination.octets());
    frame[6..12].copy_from_slice(&source.octets());
    frame[12..14].copy_from_slice(&WOL_ETHERTYPE.to_be_bytes());
    frame[ETHERNET_HEADER_LEN..].copy_from_slice(&magic_packet(destination));
    frame
}

fn link_layer_addr(interface_index: u32, destination: MacAddr) -> SockAddr {
    let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };

    // sockaddr_ll overlays the head of sockaddr_storage.
    let sll = unsafe {
        &mut *(&mut storage as *mut libc::sockaddr_storage).cast::<libc::sockaddr_ll>()
    };
    sll.sll_family = libc::AF_PACKET as libc::sa_family_t;
    sll.sll_protocol = WOL_ETHERTYPE.to_be();
    sll.sll_ifindex = interface_index as i32;
    sll.sll_halen = 6;
    sll.sll_addr[..6].copy_from_slice(&destination.octets());

    unsafe { SockAddr::new(storage, mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t) }
}
