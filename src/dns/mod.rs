//! Host name resolution.

mod fqdn;

pub use fqdn::{alias_match, is_fqdn};
