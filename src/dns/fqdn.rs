use log::{debug, trace};

use crate::platform::{HostEntry, OsBackend};
use crate::{Collector, Result};

/// A name counts as fully qualified once it has at least one dot.
#[must_use]
pub fn is_fqdn(name: &str) -> bool {
    name.contains('.')
}

/// True when `alias` is dotted and begins with `name`.
///
/// This is a raw prefix match: `host` matches `hostile.example.com` too.
#[must_use]
pub fn alias_match(alias: &str, name: &str) -> bool {
    is_fqdn(alias) && alias.starts_with(name)
}

/// Dotted canonical name of `entry`, else its first matching alias.
fn dotted_name(entry: &HostEntry) -> Option<&str> {
    if is_fqdn(&entry.name) {
        return Some(&entry.name);
    }
    entry
        .aliases
        .iter()
        .map(String::as_str)
        .find(|alias| alias_match(alias, &entry.name))
}

fn truncate(mut name: String, capacity: usize) -> String {
    let max = capacity.saturating_sub(1);
    if name.len() > max {
        let mut end = max;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}

impl<B: OsBackend> Collector<B> {
    /// Best known fully qualified name of this host.
    ///
    /// The answer is cut to `capacity - 1` bytes. Only a failing host name
    /// query is an error; every later source is optional and the result may
    /// still be undotted when none of them helps.
    ///
    /// # Errors
    /// Returns the OS error of the host name query
    pub fn fqdn(&mut self, capacity: usize) -> Result<String> {
        let name = self.backend.hostname()?;
        trace!("[fqdn] hostname returned '{name}'");

        let name = match self.backend.resolve_name(&name) {
            Ok(entry) => match self.fqdn_from_dns(&entry) {
                Some(found) => return Ok(truncate(found, capacity)),
                None => name,
            },
            Err(e) => {
                trace!("[fqdn] forward lookup of '{name}' failed: {e}");
                if is_fqdn(&name) {
                    trace!("[fqdn] hostname is already dotted");
                    return Ok(truncate(name, capacity));
                }
                name
            }
        };

        let name = self.append_domain(name);
        let name = if is_fqdn(&name) {
            name
        } else {
            self.fqdn_from_interfaces(name)
        };

        Ok(truncate(name, capacity))
    }

    /// Canonical name, aliases, then reverse lookups of every address.
    fn fqdn_from_dns(&self, entry: &HostEntry) -> Option<String> {
        if is_fqdn(&entry.name) {
            trace!("[fqdn] resolved using forward canonical name");
            return Some(entry.name.clone());
        }
        trace!("[fqdn] forward canonical name '{}' is undotted", entry.name);

        if let Some(alias) = dotted_name(entry) {
            trace!("[fqdn] resolved using forward aliases");
            return Some(alias.to_string());
        }
        trace!("[fqdn] unresolved using forward aliases");

        for addr in &entry.addresses {
            match self.backend.resolve_addr(*addr) {
                Ok(reverse) => {
                    if let Some(found) = dotted_name(&reverse) {
                        trace!("[fqdn] resolved using reverse lookup of {addr}");
                        return Some(found.to_string());
                    }
                }
                Err(e) => trace!("[fqdn] reverse lookup of {addr} failed: {e}"),
            }
        }
        trace!("[fqdn] unresolved using address list");

        None
    }

    fn append_domain(&self, name: String) -> String {
        if is_fqdn(&name) {
            return name;
        }

        match self.backend.domain_name() {
            Ok(domain) if !domain.is_empty() && !domain.starts_with('(') => {
                trace!("[fqdn] resolved using domain name '{domain}'");
                format!("{name}.{domain}")
            }
            Ok(domain) => {
                trace!("[fqdn] domain name '{domain}' is unset");
                name
            }
            Err(e) => {
                trace!("[fqdn] domain name query failed: {e}");
                name
            }
        }
    }

    /// Dotted-decimal address of the first configured non-loopback interface.
    fn fqdn_from_interfaces(&mut self, name: String) -> String {
        let names = match self.net_interface_list() {
            Ok(names) => names,
            Err(e) => {
                debug!("[fqdn] interface list failed: {e}");
                return name;
            }
        };

        for ifname in &names {
            let Ok(config) = self.net_interface_config(ifname) else {
                continue;
            };
            if config.is_loopback() {
                continue;
            }
            trace!("[fqdn] using address {} of {ifname}", config.address);
            return config.address.to_string();
        }

        trace!("[fqdn] no non-loopback interface, keeping '{name}'");
        name
    }
}
