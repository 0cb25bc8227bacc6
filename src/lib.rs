#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Hostfacts
//!
//! Uniform, pull-based access to facts about the host operating system.
//!
//! Every fact is read through a [`Collector`], which hides per-OS system calls
//! behind common data structures and error codes:
//! - Processes, their arguments, and signalling
//! - Cpu time counters and processor descriptions
//! - Mounted file systems
//! - Network interfaces and their configuration
//! - Routes and TCP/UDP sockets
//! - Logged-in users and resource limits
//! - The host's fully qualified domain name
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hostfacts::Collector;
//!
//! let mut collector = Collector::open()?;
//!
//! for name in &collector.net_interface_list()? {
//!     let config = collector.net_interface_config(name)?;
//!     println!("{name}: {} ({})", config.address, config.hwaddr);
//! }
//!
//! println!("fqdn: {}", collector.fqdn(256)?);
//! # Ok::<(), hostfacts::Error>(())
//! ```
//!
//! ## Features
//!
//! - `serde-support` - Enable serialization support for all fact records

mod collection;
mod collector;
mod cpu;
mod error;
mod format;
mod fs;
mod interface;
mod proc;
mod routing;
mod socket;
mod types;
mod who;

pub mod dns;
pub mod platform;
pub mod rlimit;

pub use collection::{increment, Collection};
pub use collector::{Collector, CollectorConfig, DEFAULT_IFCONF_ROUNDS};
pub use error::{strerror, Error, Result, EFORMAT, ENOTIMPL, ERESOLVE, OS_START_ERROR, START_ERROR};
pub use format::{format_size, uptime_string};
pub use fs::fs_type;
pub use interface::{hwaddr_format, InterfaceConfig};
pub use platform::{NativeBackend, OsBackend};
pub use rlimit::{Limit, LimitValue, ResourceLimit};
pub use socket::ConnectionFilter;
pub use types::{
    ConnectionType, Cpu, CpuInfo, FileSystem, FsType, MacAddress, NetConnection, NetRoute,
    TcpState, Who,
};
