use log::{debug, trace, warn};

use crate::collection::{increment, Collection};
use crate::platform::{IfconfReply, OsBackend, RecordFamily};
use crate::{Collector, Error, Result};

impl<B: OsBackend> Collector<B> {
    /// Names of the network interfaces present on the host.
    ///
    /// The raw reply is kept in the collector so later hardware-address lookups
    /// can re-read it.
    ///
    /// # Errors
    /// Returns the OS error if the interface-list query itself fails
    pub fn net_interface_list(&mut self) -> Result<Collection<String>> {
        self.fill_ifconf()?;

        let record_size = self.backend.ifconf_record_size();
        let filter = self.backend.ifconf_filter();
        let mut names = Collection::create(increment::NET_INTERFACE_LIST)?;

        let this = &*self;
        for raw in this.ifconf.filled().chunks_exact(record_size) {
            let Some(record) = this.backend.decode_ifconf_record(raw) else {
                continue;
            };

            if filter.link_layer_only && record.family != RecordFamily::Link {
                continue;
            }

            if names.iter().any(|n| *n == record.name) {
                continue;
            }

            if filter.require_configured && this.net_interface_config(&record.name).is_err() {
                debug!("skipping unconfigured interface {}", record.name);
                continue;
            }

            if names.is_full() {
                names.grow()?;
            }
            names.push(record.name);
        }

        Ok(names)
    }

    /// Run the interface-list query, growing the buffer until the reply fits
    /// or the configured number of rounds is used up.
    fn fill_ifconf(&mut self) -> Result<()> {
        let record_size = self.backend.ifconf_record_size();
        if record_size == 0 {
            return Err(Error::invalid_format(
                "interface list",
                "zero-sized interface record",
            ));
        }
        let step = record_size * increment::NET_INTERFACE_LIST;
        let max_rounds = self.config.max_ifconf_rounds();

        let mut lastlen = 0;
        let mut round = 0;
        loop {
            round += 1;

            if self.ifconf.is_empty() || lastlen != 0 {
                self.ifconf.grow(step)?;
            }
            let capacity = self.ifconf.capacity();

            let (len, truncated) = match self.backend.interface_list(self.ifconf.as_mut_slice())? {
                IfconfReply::Filled(len) => (len, false),
                IfconfReply::TooSmall(len) => (len, true),
            };
            trace!("ifconf round {round}: {len} of {capacity} bytes, truncated={truncated}");

            if !truncated && len < capacity {
                self.ifconf.set_filled(len);
                return Ok(());
            }

            if len == lastlen {
                trace!("ifconf length unchanged at {len}, accepting reply");
                self.ifconf.set_filled(len);
                return Ok(());
            }

            if round >= max_rounds {
                warn!("ifconf still {len} of {capacity} bytes after {round} rounds, accepting reply");
                self.ifconf.set_filled(len);
                return Ok(());
            }

            lastlen = len;
        }
    }
}
