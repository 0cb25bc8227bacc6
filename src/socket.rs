//! Kernel socket tables.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use log::debug;

use crate::collection::{increment, Collection};
use crate::platform::OsBackend;
use crate::types::{ConnectionType, NetConnection, TcpState};
use crate::{Collector, Result};

/// Which sockets [`Collector::net_connection_list`] reports.
///
/// A socket is a server when it has no remote peer yet. At least one of
/// `client`/`server` and one of `tcp`/`udp` must be set for anything to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionFilter {
    pub client: bool,
    pub server: bool,
    pub tcp: bool,
    pub udp: bool,
}

impl ConnectionFilter {
    /// Every TCP and UDP socket.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            client: true,
            server: true,
            tcp: true,
            udp: true,
        }
    }

    #[must_use]
    pub const fn client(mut self, on: bool) -> Self {
        self.client = on;
        self
    }

    #[must_use]
    pub const fn server(mut self, on: bool) -> Self {
        self.server = on;
        self
    }

    #[must_use]
    pub const fn tcp(mut self, on: bool) -> Self {
        self.tcp = on;
        self
    }

    #[must_use]
    pub const fn udp(mut self, on: bool) -> Self {
        self.udp = on;
        self
    }

    fn admits(&self, conn: &NetConnection) -> bool {
        if conn.remote_port == 0 {
            self.server
        } else {
            self.client
        }
    }
}

/// An IPv4 address as the kernel prints it: one host-order 32-bit word.
pub(crate) fn parse_hex_ipv4(hex: &str) -> Option<Ipv4Addr> {
    if hex.len() != 8 {
        return None;
    }
    let word = u32::from_str_radix(hex, 16).ok()?;
    Some(Ipv4Addr::from(word.to_ne_bytes()))
}

/// An IPv6 address as the kernel prints it: four host-order 32-bit words.
fn parse_hex_ipv6(hex: &str) -> Option<Ipv6Addr> {
    if hex.len() != 32 {
        return None;
    }
    let mut bytes = [0u8; 16];
    for (i, chunk) in bytes.chunks_exact_mut(4).enumerate() {
        let word = u32::from_str_radix(hex.get(i * 8..i * 8 + 8)?, 16).ok()?;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    Some(Ipv6Addr::from(bytes))
}

/// Parse an `ADDRESS:PORT` pair of a socket table.
fn parse_hex_address(hex_addr: &str) -> Option<(IpAddr, u16)> {
    let (addr, port) = hex_addr.split_once(':')?;
    let port = u16::from_str_radix(port, 16).ok()?;

    let addr = match addr.len() {
        8 => IpAddr::V4(parse_hex_ipv4(addr)?),
        32 => IpAddr::V6(parse_hex_ipv6(addr)?),
        _ => return None,
    };
    Some((addr, port))
}

/// Parse one data line of `net/tcp`, `net/udp` or their IPv6 variants.
#[cfg_attr(feature = "linux-procfs", allow(dead_code))]
fn parse_socket_line(line: &str, connection_type: ConnectionType) -> Option<NetConnection> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 {
        return None;
    }

    let (local_address, local_port) = parse_hex_address(fields[1])?;
    let (remote_address, remote_port) = parse_hex_address(fields[2])?;
    let state = TcpState::from_kernel(u8::from_str_radix(fields[3], 16).ok()?);
    let (tx, rx) = fields[4].split_once(':')?;

    Some(NetConnection {
        local_address,
        local_port,
        remote_address,
        remote_port,
        connection_type,
        state,
        send_queue: u64::from_str_radix(tx, 16).ok()?,
        receive_queue: u64::from_str_radix(rx, 16).ok()?,
        uid: fields[7].parse().ok()?,
        inode: fields[9].parse().ok()?,
    })
}

#[cfg(not(feature = "linux-procfs"))]
fn parse_socket_table(
    path: &str,
    table: &str,
    connection_type: ConnectionType,
) -> Result<Vec<NetConnection>> {
    let mut conns = Vec::new();
    for line in table.lines().skip(1) {
        match parse_socket_line(line, connection_type) {
            Some(conn) => conns.push(conn),
            None if line.trim().is_empty() => {}
            None => debug!("skipping {path} line: {line:?}"),
        }
    }
    Ok(conns)
}

#[cfg(feature = "linux-procfs")]
fn parse_socket_table(
    path: &str,
    table: &str,
    connection_type: ConnectionType,
) -> Result<Vec<NetConnection>> {
    use procfs_core::net::{TcpNetEntries, UdpNetEntries, UdpState};
    use procfs_core::FromBufRead;

    let bad = |e: procfs_core::ProcError| crate::Error::invalid_format(path, e.to_string());

    let conns = match connection_type {
        ConnectionType::Udp => UdpNetEntries::from_buf_read(table.as_bytes())
            .map_err(bad)?
            .0
            .into_iter()
            .map(|entry| NetConnection {
                local_address: entry.local_address.ip(),
                local_port: entry.local_address.port(),
                remote_address: entry.remote_address.ip(),
                remote_port: entry.remote_address.port(),
                connection_type,
                state: match entry.state {
                    UdpState::Established => TcpState::Established,
                    UdpState::Close => TcpState::Close,
                    #[allow(unreachable_patterns)]
                    _ => TcpState::Unknown,
                },
                send_queue: u64::from(entry.tx_queue),
                receive_queue: u64::from(entry.rx_queue),
                uid: entry.uid,
                inode: entry.inode,
            })
            .collect(),
        _ => TcpNetEntries::from_buf_read(table.as_bytes())
            .map_err(bad)?
            .0
            .into_iter()
            .map(|entry| NetConnection {
                local_address: entry.local_address.ip(),
                local_port: entry.local_address.port(),
                remote_address: entry.remote_address.ip(),
                remote_port: entry.remote_address.port(),
                connection_type,
                state: tcp_state(&entry.state),
                send_queue: u64::from(entry.tx_queue),
                receive_queue: u64::from(entry.rx_queue),
                uid: entry.uid,
                inode: entry.inode,
            })
            .collect(),
    };
    Ok(conns)
}

#[cfg(feature = "linux-procfs")]
const fn tcp_state(state: &procfs_core::net::TcpState) -> TcpState {
    use procfs_core::net::TcpState as Kernel;

    match state {
        Kernel::Established => TcpState::Established,
        Kernel::SynSent => TcpState::SynSent,
        Kernel::SynRecv | Kernel::NewSynRecv => TcpState::SynRecv,
        Kernel::FinWait1 => TcpState::FinWait1,
        Kernel::FinWait2 => TcpState::FinWait2,
        Kernel::TimeWait => TcpState::TimeWait,
        Kernel::Close => TcpState::Close,
        Kernel::CloseWait => TcpState::CloseWait,
        Kernel::LastAck => TcpState::LastAck,
        Kernel::Listen => TcpState::Listen,
        Kernel::Closing => TcpState::Closing,
        #[allow(unreachable_patterns)]
        _ => TcpState::Unknown,
    }
}

impl<B: OsBackend> Collector<B> {
    /// TCP and UDP sockets matching `filter`, IPv4 first.
    ///
    /// A host without IPv6 simply has no IPv6 rows.
    ///
    /// # Errors
    /// Returns an error if an IPv4 socket table cannot be read
    pub fn net_connection_list(&self, filter: ConnectionFilter) -> Result<Collection<NetConnection>> {
        let mut list = Collection::create(increment::NET_CONNECTION_LIST)?;

        let tables = [
            ("net/tcp", ConnectionType::Tcp, filter.tcp, true),
            ("net/tcp6", ConnectionType::Tcp, filter.tcp, false),
            ("net/udp", ConnectionType::Udp, filter.udp, true),
            ("net/udp6", ConnectionType::Udp, filter.udp, false),
        ];

        for (path, connection_type, wanted, required) in tables {
            if !wanted {
                continue;
            }

            let table = match self.backend.read_procfs(path) {
                Ok(table) => table,
                Err(e) if !required && e.code() == libc::ENOENT => {
                    debug!("{path} not present");
                    continue;
                }
                Err(e) => return Err(e),
            };

            for conn in parse_socket_table(path, &table, connection_type)? {
                if !filter.admits(&conn) {
                    continue;
                }
                if list.is_full() {
                    list.grow()?;
                }
                list.push(conn);
            }
        }

        Ok(list)
    }
}
