//! Batched ICMP echo sweep

use crate::icmp;
use crate::iface::Interface;
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashSet;
use std::io;
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const RECV_BUFFER_LEN: usize = 1500;

/// Sends one batch of echo requests and collects the replies
///
/// Stateless between calls apart from the local interface IP the requests
/// are sourced from. One sweep opens one raw socket, sends every request
/// up front, then drains replies until all targets answered or the timeout
/// window closes. Everything is released when the call returns.
#[derive(Debug, Clone)]
pub struct Prober {
    local_ip: Ipv4Addr,
}

impl Prober {
    pub fn new(iface: &Interface) -> Self {
        Self { local_ip: iface.ip }
    }

    /// Probe `targets` and return the set of addresses that replied within
    /// `timeout`.
    ///
    /// A target that stays silent is simply absent from the result; only
    /// socket setup failures surface as errors. Received datagrams that
    /// are not echo replies from a swept target are logged and dropped.
    pub fn sweep(
        &self,
        targets: &[Ipv4Addr],
        timeout: Duration,
    ) -> io::Result<HashSet<Ipv4Addr>> {
        let mut replied = HashSet::new();
        if targets.is_empty() {
            return Ok(replied);
        }

        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.bind(&SocketAddrV4::new(self.local_ip, 0).into())?;

        let wanted: HashSet<Ipv4Addr> = targets.iter().copied().collect();
        debug!(
            targets = wanted.len(),
            timeout_secs = timeout.as_secs(),
            "Sweeping"
        );

        // One batched send; replies are collected afterwards in whatever
        // order they arrive.
        for &target in targets {
            let packet = icmp::build_echo_request(rand::random(), 1);
            match socket.send_to(&packet, &SocketAddrV4::new(target, 0).into()) {
                Ok(_) => trace!(target = %target, "Echo request sent"),
                Err(e) => debug!(target = %target, error = %e, "Echo request not sent"),
            }
        }

        let deadline = Instant::now() + timeout;
        let mut buf = [MaybeUninit::<u8>::uninit(); RECV_BUFFER_LEN];

        while replied.len() < wanted.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            socket.set_read_timeout(Some(remaining))?;

            let len = match socket.recv_from(&mut buf) {
                Ok((len, _)) => len,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            // The kernel initialized the first `len` bytes.
            let datagram =
                unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), len) };

            match icmp::parse_echo_reply(datagram) {
                Ok(source) if wanted.contains(&source) => {
                    if replied.insert(source) {
                        debug!(source = %source, "Echo reply received");
                    }
                }
                Ok(source) => {
                    trace!(source = %source, "Reply from unswept address discarded");
                }
                Err(reason) => trace!(%reason, "Datagram discarded"),
            }
        }

        debug!(
            replied = replied.len(),
            targets = wanted.len(),
            "Sweep finished"
        );
        Ok(replied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sweep_is_a_no_op() {
        let prober = Prober {
            local_ip: Ipv4Addr::LOCALHOST,
        };
        let replied = prober.sweep(&[], Duration::from_secs(1)).unwrap();
        assert!(replied.is_empty());
    }
}
