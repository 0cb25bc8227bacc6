//! Logged-in users.

use crate::collection::{increment, Collection};
use crate::platform::OsBackend;
use crate::types::Who;
use crate::{Collector, Result};

impl<B: OsBackend> Collector<B> {
    /// Interactive login sessions, in login-record order.
    ///
    /// # Errors
    /// Returns an error if the login records cannot be read
    pub fn who_list(&self) -> Result<Collection<Who>> {
        let records = self.backend.login_records()?;
        let mut list = Collection::create(increment::WHO_LIST)?;

        for record in records {
            if record.user.is_empty() || !record.user_process {
                continue;
            }
            if list.is_full() {
                list.grow()?;
            }
            list.push(Who {
                user: record.user,
                device: record.line,
                host: record.host,
                time: record.time,
            });
        }

        Ok(list)
    }
}
