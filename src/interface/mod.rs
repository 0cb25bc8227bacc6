mod config;
mod hwaddr;
mod list;

pub use hwaddr::hwaddr_format;

use std::net::Ipv4Addr;

use nix::net::if_::InterfaceFlags;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::types::MacAddress;

/// Configuration of one network interface.
///
/// Fields the OS would not report are left at their zero value; `metric` is
/// never zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct InterfaceConfig {
    pub name: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub hwaddr: MacAddress,
    #[cfg_attr(feature = "serde-support", serde(with = "flag_bits"))]
    pub flags: InterfaceFlags,
    pub mtu: u64,
    pub metric: u64,
}

impl InterfaceConfig {
    /// A configuration with every field at its zero value.
    #[must_use]
    pub fn zeroed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Ipv4Addr::UNSPECIFIED,
            netmask: Ipv4Addr::UNSPECIFIED,
            broadcast: Ipv4Addr::UNSPECIFIED,
            destination: Ipv4Addr::UNSPECIFIED,
            hwaddr: MacAddress::NULL,
            flags: InterfaceFlags::empty(),
            mtu: 0,
            metric: 0,
        }
    }

    #[must_use]
    pub const fn is_loopback(&self) -> bool {
        self.flags.contains(InterfaceFlags::IFF_LOOPBACK)
    }

    #[must_use]
    pub const fn is_up(&self) -> bool {
        self.flags.contains(InterfaceFlags::IFF_UP)
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.flags.contains(InterfaceFlags::IFF_RUNNING)
    }

    /// Upper-case colon separated hardware address.
    #[must_use]
    pub fn hwaddr_string(&self) -> String {
        self.hwaddr.to_string()
    }
}

impl std::fmt::Display for InterfaceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  HWaddr: {}", self.hwaddr)?;
        writeln!(
            f,
            "  inet addr: {}  Bcast: {}  Mask: {}",
            self.address, self.broadcast, self.netmask
        )?;
        if self.destination != self.address && !self.destination.is_unspecified() {
            writeln!(f, "  P-t-P: {}", self.destination)?;
        }
        writeln!(
            f,
            "  Status: {}{}",
            if self.is_up() { "UP" } else { "DOWN" },
            if self.is_loopback() { " LOOPBACK" } else { "" }
        )?;
        writeln!(f, "  MTU: {}  Metric: {}", self.mtu, self.metric)
    }
}

#[cfg(feature = "serde-support")]
mod flag_bits {
    use nix::net::if_::InterfaceFlags;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flags: &InterfaceFlags, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(i64::from(flags.bits()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<InterfaceFlags, D::Error> {
        let bits = i64::deserialize(d)?;
        Ok(InterfaceFlags::from_bits_truncate(bits as libc::c_int))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_config_has_null_hwaddr() {
        let config = InterfaceConfig::zeroed("eth0");
        assert_eq!(config.hwaddr_string(), "00:00:00:00:00:00");
        assert!(config.address.is_unspecified());
        assert!(!config.is_loopback());
        assert!(!config.is_up());
    }

    #[test]
    fn display_mentions_status() {
        let mut config = InterfaceConfig::zeroed("lo");
        config.flags = InterfaceFlags::IFF_UP | InterfaceFlags::IFF_LOOPBACK;
        config.metric = 1;
        let text = config.to_string();
        assert!(text.contains("UP LOOPBACK"));
        assert!(text.contains("Metric: 1"));
    }
}
