//! Resource limits of the current process.

use std::fmt;

use bytesize::ByteSize;
use log::debug;
#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

use crate::platform::OsBackend;
use crate::{Collector, Result};

/// Resource id of rows the target OS has no limit for.
pub const UNSUPPORTED: i32 = -1;

/// One side of a resource limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum LimitValue {
    Limited(u64),
    Unlimited,
    /// The OS does not report this limit.
    #[default]
    NotImplemented,
}

impl LimitValue {
    #[must_use]
    pub const fn value(self) -> Option<u64> {
        match self {
            Self::Limited(v) => Some(v),
            Self::Unlimited | Self::NotImplemented => None,
        }
    }
}

/// Current and maximum value of one limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Limit {
    pub cur: LimitValue,
    pub max: LimitValue,
}

impl Limit {
    pub const NOT_IMPLEMENTED: Self = Self {
        cur: LimitValue::NotImplemented,
        max: LimitValue::NotImplemented,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct ResourceLimit {
    /// CPU time in seconds.
    pub cpu: Limit,
    pub file_size: Limit,
    pub data: Limit,
    pub stack: Limit,
    pub core: Limit,
    /// Resident set size.
    pub memory: Limit,
    pub processes: Limit,
    pub open_files: Limit,
    pub virtual_memory: Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Seconds,
    Bytes,
    Count,
}

struct RlimitField {
    name: &'static str,
    resource: i32,
    unit: Unit,
    get: fn(&ResourceLimit) -> &Limit,
    get_mut: fn(&mut ResourceLimit) -> &mut Limit,
}

macro_rules! rlimit_field {
    ($field:ident, $resource:expr, $unit:expr) => {
        RlimitField {
            name: stringify!($field),
            resource: $resource,
            unit: $unit,
            get: |r| &r.$field,
            get_mut: |r| &mut r.$field,
        }
    };
}

#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
#[allow(clippy::cast_possible_wrap)]
const RLIMIT_RSS: i32 = libc::RLIMIT_RSS as i32;
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
const RLIMIT_RSS: i32 = UNSUPPORTED;

#[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
#[allow(clippy::cast_possible_wrap)]
const RLIMIT_NPROC: i32 = libc::RLIMIT_NPROC as i32;
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
const RLIMIT_NPROC: i32 = UNSUPPORTED;

#[allow(clippy::cast_possible_wrap)]
const RLIMITS: &[RlimitField] = &[
    rlimit_field!(cpu, libc::RLIMIT_CPU as i32, Unit::Seconds),
    rlimit_field!(file_size, libc::RLIMIT_FSIZE as i32, Unit::Bytes),
    rlimit_field!(data, libc::RLIMIT_DATA as i32, Unit::Bytes),
    rlimit_field!(stack, libc::RLIMIT_STACK as i32, Unit::Bytes),
    rlimit_field!(core, libc::RLIMIT_CORE as i32, Unit::Bytes),
    rlimit_field!(memory, RLIMIT_RSS, Unit::Bytes),
    rlimit_field!(processes, RLIMIT_NPROC, Unit::Count),
    rlimit_field!(open_files, libc::RLIMIT_NOFILE as i32, Unit::Count),
    rlimit_field!(virtual_memory, libc::RLIMIT_AS as i32, Unit::Bytes),
];

fn classify(raw: u64, infinity: u64) -> LimitValue {
    if raw == infinity {
        LimitValue::Unlimited
    } else {
        LimitValue::Limited(raw)
    }
}

fn fill<B: OsBackend>(backend: &B, table: &[RlimitField]) -> ResourceLimit {
    let infinity = backend.rlimit_infinity();
    let mut limits = ResourceLimit::default();

    for row in table {
        let limit = if row.resource == UNSUPPORTED {
            Limit::NOT_IMPLEMENTED
        } else {
            match backend.resource_limit(row.resource) {
                Ok((cur, max)) => Limit {
                    cur: classify(cur, infinity),
                    max: classify(max, infinity),
                },
                Err(e) => {
                    debug!("{} limit unavailable: {e}", row.name);
                    Limit::NOT_IMPLEMENTED
                }
            }
        };
        *(row.get_mut)(&mut limits) = limit;
    }

    limits
}

impl<B: OsBackend> Collector<B> {
    /// Resource limits of the calling process.
    ///
    /// Rows the OS lacks or refuses to report come back as
    /// [`LimitValue::NotImplemented`].
    ///
    /// # Errors
    /// Currently never fails
    pub fn resource_limit(&self) -> Result<ResourceLimit> {
        Ok(fill(&self.backend, RLIMITS))
    }
}

fn fmt_value(value: LimitValue, unit: Unit) -> String {
    match (value, unit) {
        (LimitValue::NotImplemented, _) => "-".to_string(),
        (LimitValue::Unlimited, _) => "unlimited".to_string(),
        (LimitValue::Limited(v), Unit::Bytes) => ByteSize(v).to_string(),
        (LimitValue::Limited(v), Unit::Seconds) => format!("{v}s"),
        (LimitValue::Limited(v), Unit::Count) => v.to_string(),
    }
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {:>14} {:>14}", "resource", "current", "max")?;
        for row in RLIMITS {
            let limit = (row.get)(self);
            writeln!(
                f,
                "{:<16} {:>14} {:>14}",
                row.name,
                fmt_value(limit.cur, row.unit),
                fmt_value(limit.max, row.unit)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MockOsBackend;
    use crate::{CollectorConfig, Error};

    #[test]
    fn unsupported_rows_never_reach_the_backend() {
        let table = [
            rlimit_field!(cpu, 0, Unit::Seconds),
            rlimit_field!(memory, UNSUPPORTED, Unit::Bytes),
        ];

        let mut backend = MockOsBackend::new();
        backend.expect_rlimit_infinity().return_const(u64::MAX);
        backend
            .expect_resource_limit()
            .withf(|resource| *resource != UNSUPPORTED)
            .times(1)
            .returning(|_| Ok((10, u64::MAX)));

        let limits = fill(&backend, &table);
        assert_eq!(limits.cpu.cur, LimitValue::Limited(10));
        assert_eq!(limits.cpu.max, LimitValue::Unlimited);
        assert_eq!(limits.memory, Limit::NOT_IMPLEMENTED);
    }

    #[test]
    fn failed_query_yields_not_implemented() {
        let mut backend = MockOsBackend::new();
        backend.expect_rlimit_infinity().return_const(u64::MAX);
        backend
            .expect_resource_limit()
            .returning(|_| Err(Error::system_call("getrlimit", libc::EINVAL)));

        let collector = Collector::with_backend(backend, CollectorConfig::default());
        let limits = collector.resource_limit().unwrap();
        assert_eq!(limits.open_files, Limit::NOT_IMPLEMENTED);
        assert_eq!(limits.stack.cur.value(), None);
    }

    #[test]
    fn every_row_is_filled() {
        let mut backend = MockOsBackend::new();
        backend.expect_rlimit_infinity().return_const(u64::MAX);
        let supported = RLIMITS.iter().filter(|row| row.resource != UNSUPPORTED).count();
        backend
            .expect_resource_limit()
            .withf(|resource| *resource != UNSUPPORTED)
            .times(supported)
            .returning(|resource| Ok((resource as u64 + 1, u64::MAX)));

        let collector = Collector::with_backend(backend, CollectorConfig::default());
        let limits = collector.resource_limit().unwrap();
        for row in RLIMITS.iter().filter(|row| row.resource != UNSUPPORTED) {
            let limit = (row.get)(&limits);
            assert!(matches!(limit.cur, LimitValue::Limited(_)), "{}", row.name);
            assert_eq!(limit.max, LimitValue::Unlimited, "{}", row.name);
        }
    }

    #[test]
    fn table_rows_follow_target_limits() {
        let id = |name: &str| RLIMITS.iter().find(|row| row.name == name).map(|row| row.resource);

        #[cfg(not(any(target_os = "solaris", target_os = "illumos")))]
        {
            assert_eq!(id("memory"), Some(libc::RLIMIT_RSS as i32));
            assert_eq!(id("processes"), Some(libc::RLIMIT_NPROC as i32));
        }
        #[cfg(any(target_os = "solaris", target_os = "illumos"))]
        {
            assert_eq!(id("memory"), Some(UNSUPPORTED));
            assert_eq!(id("processes"), Some(UNSUPPORTED));
        }
        assert_eq!(id("open_files"), Some(libc::RLIMIT_NOFILE as i32));
        assert_eq!(RLIMITS.len(), 9);
    }

    #[test]
    fn production_table_skips_unsupported_rows() {
        let mut backend = MockOsBackend::new();
        backend.expect_rlimit_infinity().return_const(u64::MAX);
        backend
            .expect_resource_limit()
            .withf(|resource| *resource != UNSUPPORTED)
            .returning(|_| Ok((1, 2)));

        let limits = fill(&backend, RLIMITS);
        for row in RLIMITS {
            let limit = (row.get)(&limits);
            if row.resource == UNSUPPORTED {
                assert_eq!(*limit, Limit::NOT_IMPLEMENTED, "{}", row.name);
            } else {
                assert_eq!(limit.cur, LimitValue::Limited(1), "{}", row.name);
            }
        }
    }

    #[test]
    fn display_renders_each_row() {
        let limits = ResourceLimit {
            open_files: Limit {
                cur: LimitValue::Limited(1024),
                max: LimitValue::Limited(4096),
            },
            core: Limit {
                cur: LimitValue::Limited(0),
                max: LimitValue::Unlimited,
            },
            ..ResourceLimit::default()
        };
        let text = limits.to_string();
        assert!(text.lines().any(|l| l.starts_with("open_files") && l.contains("1024")));
        assert!(text.lines().any(|l| l.starts_with("core") && l.contains("unlimited")));
        assert!(text.lines().any(|l| l.starts_with("cpu") && l.contains('-')));
        assert_eq!(text.lines().count(), RLIMITS.len() + 1);
    }
}
