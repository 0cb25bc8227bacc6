//! The long-lived collector context.

use std::path::{Path, PathBuf};

use log::trace;

use crate::platform::{NativeBackend, OsBackend};
use crate::{Error, Result};

/// Growth rounds allowed for one interface-list query.
pub const DEFAULT_IFCONF_ROUNDS: usize = 8;

const DEFAULT_PROC_ROOT: &str = "/proc";

/// Runtime settings of a [`Collector`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    ifconf_rounds: usize,
    proc_root: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            ifconf_rounds: DEFAULT_IFCONF_ROUNDS,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the number of buffer growth rounds of one interface-list query.
    /// Zero is treated as one.
    #[must_use]
    pub const fn ifconf_rounds(mut self, rounds: usize) -> Self {
        self.ifconf_rounds = rounds;
        self
    }

    /// Where the process-information file system is mounted.
    #[must_use]
    pub fn proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    #[must_use]
    pub const fn max_ifconf_rounds(&self) -> usize {
        if self.ifconf_rounds == 0 {
            1
        } else {
            self.ifconf_rounds
        }
    }

    #[must_use]
    pub fn proc_root_path(&self) -> &Path {
        &self.proc_root
    }
}

/// Raw interface-list reply, kept across calls.
///
/// It only ever grows, and the raw-scan hardware-address strategy reads the
/// records captured by the most recent enumeration.
#[derive(Debug, Default)]
pub(crate) struct IfconfBuffer {
    buf: Vec<u8>,
    len: usize,
}

impl IfconfBuffer {
    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn grow(&mut self, by: usize) -> Result<()> {
        let requested = self.buf.len() + by;
        self.buf
            .try_reserve_exact(by)
            .map_err(|_| Error::OutOfMemory { requested })?;
        self.buf.resize(requested, 0);
        trace!("ifconf buffer grown to {requested} bytes");
        Ok(())
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        self.len = 0;
        &mut self.buf
    }

    pub(crate) fn set_filled(&mut self, len: usize) {
        self.len = len.min(self.buf.len());
    }

    /// The bytes written by the last successful query.
    pub(crate) fn filled(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Entry point for every host fact.
///
/// A collector is meant for one thread at a time: operations that touch the
/// interface-list buffer take `&mut self`, and callers sharing a collector
/// across threads must serialize access themselves.
#[derive(Debug)]
pub struct Collector<B: OsBackend = NativeBackend> {
    pub(crate) backend: B,
    pub(crate) ifconf: IfconfBuffer,
    pub(crate) config: CollectorConfig,
    pid: Option<u32>,
}

impl Collector<NativeBackend> {
    /// Open a collector for this host with default settings.
    ///
    /// # Errors
    /// Returns an error if the native backend cannot be initialized
    pub fn open() -> Result<Self> {
        Self::with_config(CollectorConfig::default())
    }

    /// Open a collector for this host.
    ///
    /// # Errors
    /// Returns an error if the native backend cannot be initialized
    pub fn with_config(config: CollectorConfig) -> Result<Self> {
        let backend = NativeBackend::new(&config)?;
        Ok(Self::with_backend(backend, config))
    }
}

impl<B: OsBackend> Collector<B> {
    /// Build a collector on an explicit backend.
    pub fn with_backend(backend: B, config: CollectorConfig) -> Self {
        Self {
            backend,
            ifconf: IfconfBuffer::default(),
            config,
            pid: None,
        }
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// The id of the current process, looked up once.
    pub fn pid(&mut self) -> u32 {
        let backend = &self.backend;
        *self.pid.get_or_insert_with(|| backend.getpid())
    }

    /// Send `signal` to `pid`; signal 0 only probes for existence.
    ///
    /// # Errors
    /// Returns the OS error of the underlying call
    pub fn kill(&self, pid: u32, signal: i32) -> Result<()> {
        self.backend.kill(pid, signal)
    }
}
