//! The seam between portable fact logic and the host operating system.
//!
//! Everything above this module is written against [`OsBackend`]; exactly one
//! implementation is compiled for each target and exported as [`NativeBackend`].

use std::net::{IpAddr, Ipv4Addr};

use nix::net::if_::InterfaceFlags;

use crate::types::MacAddress;
use crate::Result;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod unsupported;

#[cfg(target_os = "linux")]
pub use linux::LinuxBackend as NativeBackend;
#[cfg(not(target_os = "linux"))]
pub use unsupported::UnsupportedBackend as NativeBackend;

/// How a backend finds an interface's hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwaddrStrategy {
    /// A single per-interface query returns the address.
    Direct,
    /// Link-layer records in the last interface-list reply carry the address.
    RawScan,
    /// Ask the neighbor (ARP) table for the interface's own protocol address.
    NeighborProbe,
}

/// Which interface-list records name an interface worth reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IfconfFilter {
    /// Only records with a link-layer address family count.
    pub link_layer_only: bool,
    /// The interface must also answer a full configuration query.
    pub require_configured: bool,
}

/// Address family of one interface-list record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFamily {
    Inet,
    Link,
    Other(u16),
}

/// A decoded interface-list record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfconfRecord {
    pub name: String,
    pub family: RecordFamily,
    /// The hardware address carried by link-layer records.
    pub link_addr: Option<MacAddress>,
}

/// Outcome of one interface-list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IfconfReply {
    /// The query succeeded and wrote this many bytes.
    Filled(usize),
    /// The buffer was too small; the OS reported this length.
    TooSmall(usize),
}

/// Answer of a forward or reverse host lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEntry {
    /// The canonical name.
    pub name: String,
    pub aliases: Vec<String>,
    pub addresses: Vec<IpAddr>,
}

/// One raw login record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    /// True for records describing an interactive user process.
    pub user_process: bool,
    pub user: String,
    pub line: String,
    pub host: String,
    pub time: i64,
}

/// Primitive OS queries.
///
/// Implementations do no retrying and no defaulting: each method is one
/// native call translated into a `Result`.
#[cfg_attr(test, mockall::automock)]
pub trait OsBackend {
    /// The local host name.
    fn hostname(&self) -> Result<String>;

    /// The local (NIS) domain name.
    fn domain_name(&self) -> Result<String>;

    /// Forward lookup of a host name.
    fn resolve_name(&self, name: &str) -> Result<HostEntry>;

    /// Reverse lookup of an address.
    fn resolve_addr(&self, addr: IpAddr) -> Result<HostEntry>;

    /// Size in bytes of one interface-list record.
    fn ifconf_record_size(&self) -> usize;

    /// Fill `buf` with interface-list records.
    fn interface_list(&self, buf: &mut [u8]) -> Result<IfconfReply>;

    /// Decode one record of an interface-list reply.
    fn decode_ifconf_record(&self, record: &[u8]) -> Option<IfconfRecord>;

    fn ifconf_filter(&self) -> IfconfFilter;

    fn hwaddr_strategy(&self) -> HwaddrStrategy;

    fn interface_address(&self, name: &str) -> Result<Ipv4Addr>;

    fn interface_netmask(&self, name: &str) -> Result<Ipv4Addr>;

    fn interface_flags(&self, name: &str) -> Result<InterfaceFlags>;

    fn interface_destination(&self, name: &str) -> Result<Ipv4Addr>;

    fn interface_broadcast(&self, name: &str) -> Result<Ipv4Addr>;

    fn interface_mtu(&self, name: &str) -> Result<u64>;

    fn interface_metric(&self, name: &str) -> Result<u64>;

    /// Hardware address through a dedicated per-interface query.
    fn interface_hwaddr(&self, name: &str) -> Result<MacAddress>;

    /// Hardware address through the neighbor table.
    fn neighbor_hwaddr(&self, name: &str, addr: Ipv4Addr) -> Result<MacAddress>;

    /// Current and maximum value of an OS resource limit.
    fn resource_limit(&self, resource: i32) -> Result<(u64, u64)>;

    /// The value the OS uses for "no limit".
    fn rlimit_infinity(&self) -> u64;

    /// Read a text file below the process-information root.
    fn read_procfs(&self, path: &str) -> Result<String>;

    /// List the entry names of a directory below the process-information root.
    fn list_procfs(&self, path: &str) -> Result<Vec<String>>;

    /// Scheduler clock ticks per second.
    fn clock_ticks(&self) -> Result<u64>;

    fn login_records(&self) -> Result<Vec<LoginRecord>>;

    /// Id of the calling process.
    fn getpid(&self) -> u32;

    fn kill(&self, pid: u32, signal: i32) -> Result<()>;
}
