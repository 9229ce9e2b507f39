//! Network primitives for homewarden
//!
//! This crate provides the three operations the engine drives, plus local
//! interface resolution:
//! - `Prober`: batched ICMP echo sweep over a raw socket
//! - `WakeSender`: Wake-on-LAN magic packet over an AF_PACKET socket
//! - `ShutdownClient`: fixed shutdown command over SSH
//!
//! All operations are blocking and bounded by explicit timeouts; callers
//! on an async runtime run them on a blocking thread. None of them keep
//! state between calls beyond the local interface identity.

mod error;
mod icmp;
mod iface;
mod probe;
mod ssh;
mod wake;

pub use error::*;
pub use icmp::ECHO_PAYLOAD;
pub use iface::*;
pub use probe::*;
pub use ssh::*;
pub use wake::*;
