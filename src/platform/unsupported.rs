use std::net::{IpAddr, Ipv4Addr};

use nix::net::if_::InterfaceFlags;

use super::{
    HostEntry, HwaddrStrategy, IfconfFilter, IfconfRecord, IfconfReply, LoginRecord, OsBackend,
};
use crate::collector::CollectorConfig;
use crate::types::MacAddress;
use crate::{Error, Result};

/// Backend for targets without a native implementation yet.
///
/// The host name comes from `gethostname`; every other query reports
/// "not implemented" so callers see one uniform error code.
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl UnsupportedBackend {
    /// # Errors
    /// Never fails; returns `Result` to match the other backends
    pub const fn new(_config: &CollectorConfig) -> Result<Self> {
        Ok(Self)
    }
}

fn not_implemented<T>(feature: &str) -> Result<T> {
    Err(Error::unsupported_platform(feature))
}

impl OsBackend for UnsupportedBackend {
    fn hostname(&self) -> Result<String> {
        let name = nix::unistd::gethostname()?;
        Ok(name.to_string_lossy().into_owned())
    }

    fn domain_name(&self) -> Result<String> {
        not_implemented("domain name")
    }

    fn resolve_name(&self, name: &str) -> Result<HostEntry> {
        not_implemented(&format!("forward resolution of {name}"))
    }

    fn resolve_addr(&self, addr: IpAddr) -> Result<HostEntry> {
        not_implemented(&format!("reverse resolution of {addr}"))
    }

    fn ifconf_record_size(&self) -> usize {
        40
    }

    fn interface_list(&self, _buf: &mut [u8]) -> Result<IfconfReply> {
        not_implemented("interface list")
    }

    fn decode_ifconf_record(&self, _record: &[u8]) -> Option<IfconfRecord> {
        None
    }

    fn ifconf_filter(&self) -> IfconfFilter {
        IfconfFilter::default()
    }

    fn hwaddr_strategy(&self) -> HwaddrStrategy {
        HwaddrStrategy::NeighborProbe
    }

    fn interface_address(&self, _name: &str) -> Result<Ipv4Addr> {
        not_implemented("interface address")
    }

    fn interface_netmask(&self, _name: &str) -> Result<Ipv4Addr> {
        not_implemented("interface netmask")
    }

    fn interface_flags(&self, _name: &str) -> Result<InterfaceFlags> {
        not_implemented("interface flags")
    }

    fn interface_destination(&self, _name: &str) -> Result<Ipv4Addr> {
        not_implemented("interface destination")
    }

    fn interface_broadcast(&self, _name: &str) -> Result<Ipv4Addr> {
        not_implemented("interface broadcast")
    }

    fn interface_mtu(&self, _name: &str) -> Result<u64> {
        not_implemented("interface mtu")
    }

    fn interface_metric(&self, _name: &str) -> Result<u64> {
        not_implemented("interface metric")
    }

    fn interface_hwaddr(&self, _name: &str) -> Result<MacAddress> {
        not_implemented("hardware address")
    }

    fn neighbor_hwaddr(&self, _name: &str, _addr: Ipv4Addr) -> Result<MacAddress> {
        not_implemented("neighbor table")
    }

    fn resource_limit(&self, _resource: i32) -> Result<(u64, u64)> {
        not_implemented("resource limits")
    }

    fn rlimit_infinity(&self) -> u64 {
        u64::MAX
    }

    fn read_procfs(&self, path: &str) -> Result<String> {
        not_implemented(&format!("procfs {path}"))
    }

    fn list_procfs(&self, path: &str) -> Result<Vec<String>> {
        not_implemented(&format!("procfs {path}"))
    }

    fn clock_ticks(&self) -> Result<u64> {
        not_implemented("clock ticks")
    }

    fn login_records(&self) -> Result<Vec<LoginRecord>> {
        not_implemented("login records")
    }

    fn getpid(&self) -> u32 {
        nix::unistd::getpid().as_raw().unsigned_abs()
    }

    fn kill(&self, _pid: u32, _signal: i32) -> Result<()> {
        not_implemented("kill")
    }
}
