//! Processes.

use log::debug;

use crate::collection::{increment, Collection};
use crate::platform::OsBackend;
use crate::{Collector, Result};

impl<B: OsBackend> Collector<B> {
    /// Ids of every running process, in directory order.
    ///
    /// # Errors
    /// Returns an error if the process directory cannot be listed
    pub fn proc_list(&self) -> Result<Collection<u32>> {
        let entries = self.backend.list_procfs("")?;
        let mut pids = Collection::create(increment::PROC_LIST)?;

        for pid in entries.iter().filter_map(|name| name.parse::<u32>().ok()) {
            if pids.is_full() {
                pids.grow()?;
            }
            pids.push(pid);
        }

        debug!("found {} processes", pids.len());
        Ok(pids)
    }

    /// Command line arguments of `pid`.
    ///
    /// Kernel threads have an empty command line and yield an empty list.
    ///
    /// # Errors
    /// Returns an error if the process does not exist or cannot be read
    pub fn proc_args(&self, pid: u32) -> Result<Collection<String>> {
        let cmdline = self.backend.read_procfs(&format!("{pid}/cmdline"))?;
        let mut args = Collection::create(increment::PROC_ARGS)?;

        for arg in cmdline.split('\0') {
            if arg.is_empty() {
                continue;
            }
            if args.is_full() {
                args.grow()?;
            }
            args.push(arg.to_string());
        }

        Ok(args)
    }
}
