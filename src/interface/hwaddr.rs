use std::net::Ipv4Addr;

use log::debug;

use crate::platform::{HwaddrStrategy, OsBackend, RecordFamily};
use crate::types::MacAddress;
use crate::Collector;

/// Render six raw bytes as `XX:XX:XX:XX:XX:XX`.
#[must_use]
pub fn hwaddr_format(bytes: &[u8; 6]) -> String {
    MacAddress::new(*bytes).to_string()
}

impl<B: OsBackend> Collector<B> {
    /// Hardware address of `name`, or [`MacAddress::NULL`] when the backend's
    /// strategy comes up empty. Never fails.
    pub(crate) fn resolve_hwaddr(&self, name: &str, address: Ipv4Addr) -> MacAddress {
        match self.backend.hwaddr_strategy() {
            HwaddrStrategy::Direct => self.backend.interface_hwaddr(name).unwrap_or_else(|e| {
                debug!("hardware address query for {name} failed: {e}");
                MacAddress::NULL
            }),
            HwaddrStrategy::RawScan => self.scan_ifconf_hwaddr(name),
            HwaddrStrategy::NeighborProbe => self
                .backend
                .neighbor_hwaddr(name, address)
                .unwrap_or_else(|e| {
                    debug!("neighbor lookup of {address} for {name} failed: {e}");
                    MacAddress::NULL
                }),
        }
    }

    /// Look for a link-layer record of `name` in the last interface-list reply.
    fn scan_ifconf_hwaddr(&self, name: &str) -> MacAddress {
        let record_size = self.backend.ifconf_record_size();
        if record_size == 0 {
            return MacAddress::NULL;
        }

        self.ifconf
            .filled()
            .chunks_exact(record_size)
            .filter_map(|raw| self.backend.decode_ifconf_record(raw))
            .find(|record| record.family == RecordFamily::Link && record.name == name)
            .and_then(|record| record.link_addr)
            .unwrap_or(MacAddress::NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{IfconfFilter, IfconfRecord, IfconfReply, MockOsBackend};
    use crate::{CollectorConfig, Error};

    const RECORD: usize = 16;

    /// Fake record layout: name in 0..4, family in 4, hardware address in 8..14.
    fn encode(name: &str, link: bool, mac: [u8; 6]) -> [u8; RECORD] {
        let mut record = [0u8; RECORD];
        record[..name.len()].copy_from_slice(name.as_bytes());
        record[4] = u8::from(link);
        record[8..14].copy_from_slice(&mac);
        record
    }

    fn decode(raw: &[u8]) -> Option<IfconfRecord> {
        let end = raw[..4].iter().position(|b| *b == 0).unwrap_or(4);
        let link = raw[4] == 1;
        Some(IfconfRecord {
            name: String::from_utf8_lossy(&raw[..end]).into_owned(),
            family: if link {
                RecordFamily::Link
            } else {
                RecordFamily::Inet
            },
            link_addr: link.then(|| MacAddress::from_slice(&raw[8..14])).flatten(),
        })
    }

    #[test]
    fn format_is_upper_case_hex() {
        assert_eq!(hwaddr_format(&[0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]), "DE:AD:BE:EF:00:01");
        assert_eq!(hwaddr_format(&[0; 6]), "00:00:00:00:00:00");
        assert_eq!(hwaddr_format(&[0xff; 6]), "FF:FF:FF:FF:FF:FF");
    }

    #[test]
    fn direct_query_failure_yields_null() {
        let mut backend = MockOsBackend::new();
        backend
            .expect_hwaddr_strategy()
            .return_const(HwaddrStrategy::Direct);
        backend
            .expect_interface_hwaddr()
            .returning(|_| Err(Error::system_call("SIOCGIFHWADDR", libc::ENODEV)));
        let collector = Collector::with_backend(backend, CollectorConfig::default());

        let mac = collector.resolve_hwaddr("eth0", Ipv4Addr::new(10, 0, 0, 2));
        assert!(mac.is_null());
    }

    #[test]
    fn direct_query_result_is_used() {
        let mut backend = MockOsBackend::new();
        backend
            .expect_hwaddr_strategy()
            .return_const(HwaddrStrategy::Direct);
        backend
            .expect_interface_hwaddr()
            .returning(|_| Ok(MacAddress::new([0x52, 0x54, 0, 0x12, 0x34, 0x56])));
        let collector = Collector::with_backend(backend, CollectorConfig::default());

        let mac = collector.resolve_hwaddr("eth0", Ipv4Addr::UNSPECIFIED);
        assert_eq!(mac.to_string(), "52:54:00:12:34:56");
    }

    #[test]
    fn neighbor_probe_failure_yields_zero_address() {
        let mut backend = MockOsBackend::new();
        backend
            .expect_hwaddr_strategy()
            .return_const(HwaddrStrategy::NeighborProbe);
        backend
            .expect_neighbor_hwaddr()
            .withf(|name, addr| name == "hme0" && *addr == Ipv4Addr::new(192, 168, 3, 9))
            .returning(|_, _| Err(Error::system_call("SIOCGARP", libc::ENXIO)));
        let collector = Collector::with_backend(backend, CollectorConfig::default());

        let mac = collector.resolve_hwaddr("hme0", Ipv4Addr::new(192, 168, 3, 9));
        assert_eq!(mac, MacAddress::NULL);
    }

    #[test]
    fn raw_scan_reads_last_enumeration() {
        let records = vec![
            encode("en0", false, [0; 6]),
            encode("en0", true, [0x00, 0x0d, 0x93, 0xaa, 0xbb, 0xcc]),
            encode("en1", true, [0x00, 0x0d, 0x93, 0x11, 0x22, 0x33]),
        ];

        let mut backend = MockOsBackend::new();
        backend
            .expect_hwaddr_strategy()
            .return_const(HwaddrStrategy::RawScan);
        backend.expect_ifconf_record_size().return_const(RECORD);
        backend.expect_ifconf_filter().return_const(IfconfFilter {
            link_layer_only: true,
            require_configured: false,
        });
        backend
            .expect_decode_ifconf_record()
            .returning(|raw| decode(raw));
        backend.expect_interface_list().returning(move |buf| {
            for (slot, record) in buf.chunks_exact_mut(RECORD).zip(&records) {
                slot.copy_from_slice(record);
            }
            Ok(IfconfReply::Filled(3 * RECORD))
        });

        let mut collector = Collector::with_backend(backend, CollectorConfig::default());
        assert!(collector.resolve_hwaddr("en1", Ipv4Addr::UNSPECIFIED).is_null());

        let names = collector.net_interface_list().unwrap();
        assert_eq!(names.as_slice(), &["en0", "en1"]);

        assert_eq!(
            collector.resolve_hwaddr("en1", Ipv4Addr::UNSPECIFIED).to_string(),
            "00:0D:93:11:22:33"
        );
        assert_eq!(
            collector.resolve_hwaddr("en0", Ipv4Addr::UNSPECIFIED).to_string(),
            "00:0D:93:AA:BB:CC"
        );
        assert!(collector.resolve_hwaddr("en9", Ipv4Addr::UNSPECIFIED).is_null());
    }
}
