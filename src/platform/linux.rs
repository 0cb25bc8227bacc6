use std::collections::HashSet;
use std::fs;
use std::mem;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::PathBuf;

use dns_lookup::{getaddrinfo, getnameinfo, AddrInfoHints};
use libc::{c_char, c_int, c_short, c_ulong, sockaddr, sockaddr_in};
use log::debug;
use nix::errno::Errno;
use nix::net::if_::InterfaceFlags;
use nix::sys::signal::{self, Signal};
use nix::sys::socket::{socket, AddressFamily, SockFlag, SockType};
use nix::unistd::{self, Pid};

use super::{
    HostEntry, HwaddrStrategy, IfconfFilter, IfconfRecord, IfconfReply, LoginRecord, OsBackend,
    RecordFamily,
};
use crate::collector::CollectorConfig;
use crate::types::MacAddress;
use crate::{Error, Result};

// linux/sockios.h
const SIOCGIFCONF: c_ulong = 0x8912;
const SIOCGIFFLAGS: c_ulong = 0x8913;
const SIOCGIFADDR: c_ulong = 0x8915;
const SIOCGIFDSTADDR: c_ulong = 0x8917;
const SIOCGIFBRDADDR: c_ulong = 0x8919;
const SIOCGIFNETMASK: c_ulong = 0x891b;
const SIOCGIFMETRIC: c_ulong = 0x891d;
const SIOCGIFMTU: c_ulong = 0x8921;
const SIOCGIFHWADDR: c_ulong = 0x8927;
const SIOCGARP: c_ulong = 0x8954;

const HOSTS_FILE: &str = "/etc/hosts";

#[repr(C)]
#[derive(Clone, Copy)]
union IfReqData {
    addr: sockaddr,
    flags: c_short,
    value: c_int,
    map: [c_ulong; 3],
}

/// `struct ifreq`
#[repr(C)]
struct IfReq {
    name: [c_char; libc::IFNAMSIZ],
    data: IfReqData,
}

/// `struct ifconf`
#[repr(C)]
struct IfConf {
    len: c_int,
    buf: *mut c_char,
}

/// `struct arpreq`
#[repr(C)]
struct ArpReq {
    pa: sockaddr,
    ha: sockaddr,
    flags: c_int,
    netmask: sockaddr,
    dev: [c_char; 16],
}

/// Backend for Linux: `SIOCGIF*` ioctls, procfs, `getaddrinfo` and utmp.
#[derive(Debug)]
pub struct LinuxBackend {
    proc_root: PathBuf,
    hosts_file: PathBuf,
    sock: OwnedFd,
}

impl LinuxBackend {
    /// Open the datagram socket used for interface ioctls.
    ///
    /// # Errors
    /// Returns an error if the socket cannot be created
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let sock = socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )?;

        Ok(Self {
            proc_root: config.proc_root_path().to_path_buf(),
            hosts_file: PathBuf::from(HOSTS_FILE),
            sock,
        })
    }

    fn ioctl<T>(&self, request: c_ulong, arg: &mut T, operation: &str) -> Result<()> {
        // SAFETY: `arg` is a live, correctly sized request structure for `request`.
        let rc = unsafe { libc::ioctl(self.sock.as_raw_fd(), request as _, arg as *mut T) };
        if rc < 0 {
            return Err(Error::last_os_error(operation));
        }
        Ok(())
    }

    fn ifreq_query(&self, name: &str, request: c_ulong, operation: &str) -> Result<IfReq> {
        let mut req = new_ifreq(name)?;
        self.ioctl(request, &mut req, operation)?;
        Ok(req)
    }

    fn ifreq_addr(&self, name: &str, request: c_ulong, operation: &str) -> Result<Ipv4Addr> {
        let req = self.ifreq_query(name, request, operation)?;
        // SAFETY: address requests fill the sockaddr arm.
        Ok(inet_addr(unsafe { &req.data.addr }))
    }

    fn ifreq_value(&self, name: &str, request: c_ulong, operation: &str) -> Result<u64> {
        let req = self.ifreq_query(name, request, operation)?;
        // SAFETY: MTU and metric requests fill the int arm.
        let value = unsafe { req.data.value };
        Ok(u64::try_from(value).unwrap_or(0))
    }

    /// Names listed for `name` (or any of `also`) in the hosts file.
    fn hosts_aliases(&self, name: &str, also: &[&str]) -> Vec<String> {
        let Ok(content) = fs::read_to_string(&self.hosts_file) else {
            return Vec::new();
        };
        hosts_file_aliases(&content, name, also)
    }
}

impl OsBackend for LinuxBackend {
    fn hostname(&self) -> Result<String> {
        let name = unistd::gethostname()?;
        Ok(name.to_string_lossy().into_owned())
    }

    fn domain_name(&self) -> Result<String> {
        let mut buf: [c_char; 256] = [0; 256];
        // SAFETY: the buffer is writable for `len - 1` bytes and stays NUL terminated.
        if unsafe { libc::getdomainname(buf.as_mut_ptr(), buf.len() - 1) } != 0 {
            return Err(Error::last_os_error("getdomainname"));
        }
        Ok(fixed_cstr(&buf))
    }

    fn resolve_name(&self, name: &str) -> Result<HostEntry> {
        let hints = AddrInfoHints {
            flags: libc::AI_CANONNAME,
            socktype: libc::SOCK_STREAM,
            ..AddrInfoHints::default()
        };

        let infos = getaddrinfo(Some(name), None, Some(hints))
            .map_err(|e| Error::resolve(name, format!("{e:?}")))?;

        let mut canonical = None;
        let mut addresses = Vec::new();
        for info in infos {
            let info = info?;
            if canonical.is_none() {
                canonical = info.canonname;
            }
            let ip = info.sockaddr.ip();
            if !addresses.contains(&ip) {
                addresses.push(ip);
            }
        }

        let canonical = canonical.unwrap_or_else(|| name.to_string());
        let aliases = self.hosts_aliases(&canonical, &[name]);

        Ok(HostEntry {
            name: canonical,
            aliases,
            addresses,
        })
    }

    fn resolve_addr(&self, addr: IpAddr) -> Result<HostEntry> {
        let (host, _service) = getnameinfo(&SocketAddr::new(addr, 0), libc::NI_NAMEREQD)
            .map_err(|e| Error::resolve(addr.to_string(), format!("{e:?}")))?;

        let aliases = self.hosts_aliases(&host, &[]);

        Ok(HostEntry {
            name: host,
            aliases,
            addresses: vec![addr],
        })
    }

    fn ifconf_record_size(&self) -> usize {
        mem::size_of::<IfReq>()
    }

    fn interface_list(&self, buf: &mut [u8]) -> Result<IfconfReply> {
        let mut ifc = IfConf {
            len: c_int::try_from(buf.len()).unwrap_or(c_int::MAX),
            buf: buf.as_mut_ptr().cast(),
        };

        // SAFETY: `ifc.buf` points at `ifc.len` writable bytes owned by `buf`.
        let rc = unsafe {
            libc::ioctl(
                self.sock.as_raw_fd(),
                SIOCGIFCONF as _,
                &mut ifc as *mut IfConf,
            )
        };
        let len = usize::try_from(ifc.len).unwrap_or(0).min(buf.len());

        if rc < 0 {
            let errno = Errno::last();
            // EINVAL means the interface list did not fit
            if errno == Errno::EINVAL {
                return Ok(IfconfReply::TooSmall(len));
            }
            return Err(Error::system_call("SIOCGIFCONF", errno as i32));
        }

        Ok(IfconfReply::Filled(len))
    }

    fn decode_ifconf_record(&self, record: &[u8]) -> Option<IfconfRecord> {
        decode_ifreq_bytes(record)
    }

    fn ifconf_filter(&self) -> IfconfFilter {
        IfconfFilter::default()
    }

    fn hwaddr_strategy(&self) -> HwaddrStrategy {
        HwaddrStrategy::Direct
    }

    fn interface_address(&self, name: &str) -> Result<Ipv4Addr> {
        self.ifreq_addr(name, SIOCGIFADDR, "SIOCGIFADDR")
    }

    fn interface_netmask(&self, name: &str) -> Result<Ipv4Addr> {
        self.ifreq_addr(name, SIOCGIFNETMASK, "SIOCGIFNETMASK")
    }

    fn interface_flags(&self, name: &str) -> Result<InterfaceFlags> {
        let req = self.ifreq_query(name, SIOCGIFFLAGS, "SIOCGIFFLAGS")?;
        // SAFETY: SIOCGIFFLAGS fills the short arm.
        let flags = unsafe { req.data.flags };
        Ok(InterfaceFlags::from_bits_truncate(c_int::from(flags as u16)))
    }

    fn interface_destination(&self, name: &str) -> Result<Ipv4Addr> {
        self.ifreq_addr(name, SIOCGIFDSTADDR, "SIOCGIFDSTADDR")
    }

    fn interface_broadcast(&self, name: &str) -> Result<Ipv4Addr> {
        self.ifreq_addr(name, SIOCGIFBRDADDR, "SIOCGIFBRDADDR")
    }

    fn interface_mtu(&self, name: &str) -> Result<u64> {
        self.ifreq_value(name, SIOCGIFMTU, "SIOCGIFMTU")
    }

    fn interface_metric(&self, name: &str) -> Result<u64> {
        self.ifreq_value(name, SIOCGIFMETRIC, "SIOCGIFMETRIC")
    }

    fn interface_hwaddr(&self, name: &str) -> Result<MacAddress> {
        let req = self.ifreq_query(name, SIOCGIFHWADDR, "SIOCGIFHWADDR")?;
        // SAFETY: SIOCGIFHWADDR fills the sockaddr arm.
        let data = unsafe { req.data.addr.sa_data };
        Ok(mac_from_sa_data(&data))
    }

    fn neighbor_hwaddr(&self, name: &str, addr: Ipv4Addr) -> Result<MacAddress> {
        // SAFETY: all-zero is a valid `arpreq`.
        let mut req: ArpReq = unsafe { mem::zeroed() };
        write_inet_addr(&mut req.pa, addr);
        copy_name(&mut req.dev, name)?;
        self.ioctl(SIOCGARP, &mut req, "SIOCGARP")?;
        Ok(mac_from_sa_data(&req.ha.sa_data))
    }

    fn resource_limit(&self, resource: i32) -> Result<(u64, u64)> {
        let mut rl = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: `rl` is a valid out pointer.
        if unsafe { libc::getrlimit(resource as _, &mut rl) } != 0 {
            return Err(Error::last_os_error("getrlimit"));
        }
        Ok((rl.rlim_cur as u64, rl.rlim_max as u64))
    }

    fn rlimit_infinity(&self) -> u64 {
        libc::RLIM_INFINITY as u64
    }

    fn read_procfs(&self, path: &str) -> Result<String> {
        let bytes = fs::read(self.proc_root.join(path))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn list_procfs(&self, path: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.proc_root.join(path))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn clock_ticks(&self) -> Result<u64> {
        // SAFETY: sysconf has no memory-safety preconditions.
        let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        u64::try_from(ticks)
            .ok()
            .filter(|t| *t > 0)
            .ok_or_else(|| Error::last_os_error("sysconf(_SC_CLK_TCK)"))
    }

    fn login_records(&self) -> Result<Vec<LoginRecord>> {
        let mut records = Vec::new();

        // SAFETY: the utmpx iteration functions are used from this thread only and
        // every entry is copied out before the next call.
        unsafe {
            libc::setutxent();
            loop {
                let entry = libc::getutxent();
                if entry.is_null() {
                    break;
                }
                let ut = &*entry;
                records.push(LoginRecord {
                    user_process: ut.ut_type == libc::USER_PROCESS,
                    user: fixed_cstr(&ut.ut_user),
                    line: fixed_cstr(&ut.ut_line),
                    host: fixed_cstr(&ut.ut_host),
                    time: i64::from(ut.ut_tv.tv_sec),
                });
            }
            libc::endutxent();
        }

        Ok(records)
    }

    fn getpid(&self) -> u32 {
        unistd::getpid().as_raw().unsigned_abs()
    }

    fn kill(&self, pid: u32, signal: i32) -> Result<()> {
        let pid = i32::try_from(pid).map_err(|_| Error::from(Errno::ESRCH))?;
        let signal = if signal == 0 {
            None
        } else {
            Some(Signal::try_from(signal)?)
        };
        signal::kill(Pid::from_raw(pid), signal)?;
        Ok(())
    }
}

fn new_ifreq(name: &str) -> Result<IfReq> {
    // SAFETY: all-zero is a valid `ifreq`.
    let mut req: IfReq = unsafe { mem::zeroed() };
    copy_name(&mut req.name, name)?;
    Ok(req)
}

fn copy_name(dst: &mut [c_char], name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.len() >= dst.len() || bytes.contains(&0) {
        return Err(Error::interface_not_found(name));
    }
    for (d, s) in dst.iter_mut().zip(bytes) {
        *d = *s as c_char;
    }
    Ok(())
}

fn inet_addr(sa: &sockaddr) -> Ipv4Addr {
    // SAFETY: `sockaddr` and `sockaddr_in` have the same size.
    let sin: sockaddr_in = unsafe { std::ptr::read_unaligned((sa as *const sockaddr).cast()) };
    Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))
}

fn write_inet_addr(sa: &mut sockaddr, addr: Ipv4Addr) {
    let sin = sockaddr_in {
        sin_family: libc::AF_INET as libc::sa_family_t,
        sin_port: 0,
        sin_addr: libc::in_addr {
            s_addr: u32::from(addr).to_be(),
        },
        sin_zero: [0; 8],
    };
    // SAFETY: `sockaddr` and `sockaddr_in` have the same size.
    unsafe { std::ptr::write_unaligned((sa as *mut sockaddr).cast(), sin) };
}

fn mac_from_sa_data(data: &[c_char]) -> MacAddress {
    let bytes: Vec<u8> = data.iter().take(6).map(|c| *c as u8).collect();
    MacAddress::from_slice(&bytes).unwrap_or(MacAddress::NULL)
}

fn fixed_cstr(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|c| **c != 0)
        .map(|c| *c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Decode one raw `struct ifreq` as written by `SIOCGIFCONF`.
fn decode_ifreq_bytes(record: &[u8]) -> Option<IfconfRecord> {
    let name_bytes = record.get(..libc::IFNAMSIZ)?;
    let end = name_bytes.iter().position(|b| *b == 0).unwrap_or(name_bytes.len());
    if end == 0 {
        return None;
    }
    let name = String::from_utf8_lossy(&name_bytes[..end]).into_owned();

    let family_bytes = record.get(libc::IFNAMSIZ..libc::IFNAMSIZ + 2)?;
    let family = u16::from_ne_bytes([family_bytes[0], family_bytes[1]]);
    let sa_data = record.get(libc::IFNAMSIZ + 2..)?;

    let (family, link_addr) = match c_int::from(family) {
        libc::AF_INET => (RecordFamily::Inet, None),
        libc::AF_PACKET => (RecordFamily::Link, MacAddress::from_slice(sa_data)),
        _ => (RecordFamily::Other(family), None),
    };

    Some(IfconfRecord {
        name,
        family,
        link_addr,
    })
}

/// Collect every other name on hosts-file lines that list `name` or one of `also`.
fn hosts_file_aliases(content: &str, name: &str, also: &[&str]) -> Vec<String> {
    let wanted: HashSet<&str> = std::iter::once(name).chain(also.iter().copied()).collect();
    let mut aliases = Vec::new();

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or_default();
        let mut fields = line.split_whitespace();
        if fields.next().is_none() {
            continue;
        }
        let names: Vec<&str> = fields.collect();
        if !names.iter().any(|n| wanted.contains(n)) {
            continue;
        }
        for n in names {
            if n != name && !aliases.iter().any(|a: &String| a == n) {
                aliases.push(n.to_string());
            }
        }
    }

    debug!("hosts file lists {} alias(es) for {name}", aliases.len());
    aliases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifreq_matches_kernel_layout() {
        #[cfg(target_pointer_width = "64")]
        assert_eq!(mem::size_of::<IfReq>(), 40);
        #[cfg(target_pointer_width = "32")]
        assert_eq!(mem::size_of::<IfReq>(), 32);
        assert_eq!(
            mem::size_of::<IfConf>(),
            2 * mem::size_of::<*mut c_char>()
        );
    }

    #[test]
    fn decodes_inet_records() {
        let mut record = vec![0u8; mem::size_of::<IfReq>()];
        record[..4].copy_from_slice(b"eth0");
        record[16..18].copy_from_slice(&(libc::AF_INET as u16).to_ne_bytes());

        let decoded = decode_ifreq_bytes(&record).unwrap();
        assert_eq!(decoded.name, "eth0");
        assert_eq!(decoded.family, RecordFamily::Inet);
        assert_eq!(decoded.link_addr, None);
    }

    #[test]
    fn skips_unnamed_records() {
        let record = vec![0u8; mem::size_of::<IfReq>()];
        assert!(decode_ifreq_bytes(&record).is_none());
        assert!(decode_ifreq_bytes(&record[..8]).is_none());
    }

    #[test]
    fn rejects_overlong_interface_names() {
        assert!(new_ifreq("a-name-well-past-ifnamsiz").is_err());
        assert!(new_ifreq("eth0").is_ok());
    }

    #[test]
    fn inet_addresses_round_trip_through_sockaddr() {
        // SAFETY: all-zero is a valid sockaddr.
        let mut sa: sockaddr = unsafe { mem::zeroed() };
        write_inet_addr(&mut sa, Ipv4Addr::new(192, 168, 1, 20));
        assert_eq!(inet_addr(&sa), Ipv4Addr::new(192, 168, 1, 20));
    }

    #[test]
    fn hosts_aliases_follow_matching_lines() {
        let hosts = "127.0.0.1 localhost\n\
                     10.0.0.5 web web.corp.example.com www # front\n\
                     # 10.0.0.6 web ignored.example.com\n";
        assert_eq!(
            hosts_file_aliases(hosts, "web", &[]),
            vec!["web.corp.example.com".to_string(), "www".to_string()]
        );
        assert!(hosts_file_aliases(hosts, "db", &[]).is_empty());
    }
}
