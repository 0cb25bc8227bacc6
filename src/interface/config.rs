use std::net::Ipv4Addr;

use log::trace;

use super::InterfaceConfig;
use crate::platform::OsBackend;
use crate::types::MacAddress;
use crate::{Collector, Result};

impl<B: OsBackend> Collector<B> {
    /// Full configuration of the interface `name`.
    ///
    /// Address and flags are mandatory. Every other field is best effort and
    /// stays zero when the OS will not report it, except `metric` which
    /// falls back to 1.
    ///
    /// # Errors
    /// Returns the OS error if the address or flags query fails
    pub fn net_interface_config(&self, name: &str) -> Result<InterfaceConfig> {
        let mut config = InterfaceConfig::zeroed(name);

        config.address = self.backend.interface_address(name)?;
        config.netmask = or_unspecified(name, "netmask", self.backend.interface_netmask(name));
        config.flags = self.backend.interface_flags(name)?;

        if config.is_loopback() {
            config.destination = config.address;
            config.broadcast = Ipv4Addr::UNSPECIFIED;
            config.hwaddr = MacAddress::NULL;
        } else {
            config.destination =
                or_unspecified(name, "destination", self.backend.interface_destination(name));
            config.broadcast =
                or_unspecified(name, "broadcast", self.backend.interface_broadcast(name));
            config.hwaddr = self.resolve_hwaddr(name, config.address);
        }

        config.mtu = self.backend.interface_mtu(name).unwrap_or_else(|e| {
            trace!("mtu of {name} unavailable: {e}");
            0
        });
        config.metric = match self.backend.interface_metric(name) {
            Ok(metric) if metric != 0 => metric,
            _ => 1,
        };

        Ok(config)
    }
}

fn or_unspecified(name: &str, what: &str, value: Result<Ipv4Addr>) -> Ipv4Addr {
    value.unwrap_or_else(|e| {
        trace!("{what} of {name} unavailable: {e}");
        Ipv4Addr::UNSPECIFIED
    })
}
