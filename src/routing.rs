//! The IPv4 routing table.

use log::debug;

use crate::collection::{increment, Collection};
use crate::platform::OsBackend;
use crate::socket::parse_hex_ipv4;
use crate::types::NetRoute;
use crate::{Collector, Error, Result};

/// Parse one data line of the kernel route table.
///
/// Columns: `Iface Destination Gateway Flags RefCnt Use Metric Mask MTU Window IRTT`,
/// addresses and flags in hex.
fn parse_route_line(line: &str) -> Result<NetRoute> {
    let bad = || Error::invalid_format("net/route", line.to_string());
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 11 {
        return Err(bad());
    }

    let addr = |s: &str| parse_hex_ipv4(s).ok_or_else(bad);
    Ok(NetRoute {
        ifname: fields[0].to_string(),
        destination: addr(fields[1])?,
        gateway: addr(fields[2])?,
        flags: u32::from_str_radix(fields[3], 16).map_err(|_| bad())?,
        refcnt: fields[4].parse()?,
        use_count: fields[5].parse()?,
        metric: fields[6].parse()?,
        mask: addr(fields[7])?,
        mtu: fields[8].parse()?,
        window: fields[9].parse()?,
        irtt: fields[10].parse()?,
    })
}

impl<B: OsBackend> Collector<B> {
    /// Every IPv4 route the kernel knows.
    ///
    /// Lines that do not parse are skipped.
    ///
    /// # Errors
    /// Returns an error if the route table cannot be read
    pub fn net_route_list(&self) -> Result<Collection<NetRoute>> {
        let table = self.backend.read_procfs("net/route")?;
        let mut routes = Collection::create(increment::NET_ROUTE_LIST)?;

        for line in table.lines().skip(1).filter(|l| !l.trim().is_empty()) {
            let route = match parse_route_line(line) {
                Ok(route) => route,
                Err(e) => {
                    debug!("skipping route line: {e}");
                    continue;
                }
            };
            if routes.is_full() {
                routes.grow()?;
            }
            routes.push(route);
        }

        Ok(routes)
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::platform::MockOsBackend;
    use crate::CollectorConfig;

    const ROUTE: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
docker0\t000011AC\t00000000\t0001\t0\t0\t0\t0000FFFF\t1500\t0\t0
";

    fn collector(content: &'static str) -> Collector<MockOsBackend> {
        let mut backend = MockOsBackend::new();
        backend
            .expect_read_procfs()
            .withf(|path| path == "net/route")
            .returning(move |_| Ok(content.to_string()));
        Collector::with_backend(backend, CollectorConfig::default())
    }

    #[test]
    fn default_route_and_subnets() {
        let routes = collector(ROUTE).net_route_list().unwrap();
        assert_eq!(routes.len(), 3);

        let default = &routes[0];
        assert!(default.destination.is_unspecified());
        assert_eq!(default.gateway, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(default.flags, 0x3);
        assert_eq!(default.metric, 100);
        assert_eq!(default.ifname, "eth0");

        assert_eq!(routes[1].destination, Ipv4Addr::new(192, 168, 1, 0));
        assert_eq!(routes[1].mask, Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(routes[2].destination, Ipv4Addr::new(172, 17, 0, 0));
        assert_eq!(routes[2].mtu, 1500);
        assert_eq!(
            routes[2].to_string(),
            "172.17.0.0/255.255.0.0 dev docker0 metric 0"
        );
    }

    #[test]
    fn broken_lines_are_skipped() {
        let table = "Iface\tDestination\n\
                     eth0\tZZZZZZZZ\t00000000\t0001\t0\t0\t0\t00000000\t0\t0\t0\n\
                     eth0\t00000000\n\
                     lo\t0000007F\t00000000\t0001\t0\t0\t0\t000000FF\t0\t0\t0\n";
        let routes = collector(table).net_route_list().unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].ifname, "lo");
        assert_eq!(routes[0].destination, Ipv4Addr::new(127, 0, 0, 0));
    }

    #[test]
    fn many_routes_grow_the_list() {
        let mut table = String::from("Iface\tDestination\n");
        for i in 0..(increment::NET_ROUTE_LIST * 2 + 1) {
            table.push_str(&format!(
                "eth0\t{:08X}\t00000000\t0001\t0\t0\t0\t00FFFFFF\t0\t0\t0\n",
                u32::from_ne_bytes([10, 0, u8::try_from(i).unwrap(), 0])
            ));
        }
        let table: &'static str = Box::leak(table.into_boxed_str());

        let routes = collector(table).net_route_list().unwrap();
        assert_eq!(routes.len(), increment::NET_ROUTE_LIST * 2 + 1);
        assert_eq!(routes[5].destination, Ipv4Addr::new(10, 0, 5, 0));
    }
}
