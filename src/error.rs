use std::io;
use std::num::ParseIntError;

use nix::errno::Errno;

/// Codes at or below this value are native OS error numbers.
pub const START_ERROR: i32 = 20000;

/// The facility is not available on this platform.
pub const ENOTIMPL: i32 = START_ERROR + 1;

/// A name lookup failed.
pub const ERESOLVE: i32 = START_ERROR + 2;

/// Data read from the OS could not be understood.
pub const EFORMAT: i32 = START_ERROR + 3;

/// Codes above this value are reserved for OS error spaces wider than errno.
pub const OS_START_ERROR: i32 = START_ERROR * 2;

/// The error type for host facts operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O error occurred while reading a system file
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to parse integer from system output
    #[error("Integer parse error: {0}")]
    ParseInt(#[from] ParseIntError),

    /// Platform-specific system call failed
    #[error("System call '{operation}' failed with code {code}")]
    SystemCall { operation: String, code: i32 },

    /// Feature not supported on this platform
    #[error("Feature '{feature}' not supported on {platform}")]
    UnsupportedPlatform { feature: String, platform: String },

    /// Invalid data format encountered
    #[error("Invalid data format in {0}: {1}")]
    InvalidFormat(String, String),

    /// Forward or reverse name resolution failed
    #[error("Failed to resolve {name}: {reason}")]
    Resolve { name: String, reason: String },

    /// Network interface not found
    #[error("Network interface '{name}' not found")]
    InterfaceNotFound { name: String },

    /// A collection could not reserve its next increment
    #[error("Out of memory growing collection to {requested} elements")]
    OutOfMemory { requested: usize },
}

impl Error {
    /// Create a new system call error
    pub fn system_call(operation: impl Into<String>, code: i32) -> Self {
        Self::SystemCall {
            operation: operation.into(),
            code,
        }
    }

    /// Create a system call error from the thread's current `errno`
    pub fn last_os_error(operation: impl Into<String>) -> Self {
        Self::system_call(operation, Errno::last_raw())
    }

    /// Create a new unsupported platform error
    pub fn unsupported_platform(feature: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            feature: feature.into(),
            platform: std::env::consts::OS.to_string(),
        }
    }

    /// Create a new invalid format error
    pub fn invalid_format(source: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidFormat(source.into(), details.into())
    }

    /// Create a new resolution error
    pub fn resolve(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolve {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new interface not found error
    pub fn interface_not_found(name: impl Into<String>) -> Self {
        Self::InterfaceNotFound { name: name.into() }
    }

    /// The integer code of this error.
    ///
    /// Native failures keep their OS error number so callers can hand it to
    /// platform tooling; this crate's own kinds live above [`START_ERROR`].
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            Self::SystemCall { code, .. } => *code,
            Self::UnsupportedPlatform { .. } => ENOTIMPL,
            Self::Resolve { .. } => ERESOLVE,
            Self::ParseInt(_) | Self::InvalidFormat(..) => EFORMAT,
            Self::InterfaceNotFound { .. } => libc::ENXIO,
            Self::OutOfMemory { .. } => libc::ENOMEM,
        }
    }

    /// True when the error means the facility does not exist on this platform.
    #[must_use]
    pub const fn is_not_implemented(&self) -> bool {
        matches!(self, Self::UnsupportedPlatform { .. })
    }
}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Self::system_call(errno.desc(), errno as i32)
    }
}

/// Render any error code returned by [`Error::code`].
#[must_use]
pub fn strerror(code: i32) -> String {
    if code > OS_START_ERROR {
        return "Unknown OS Error".to_string();
    }

    match code {
        ENOTIMPL => "This function has not been implemented on this platform".to_string(),
        ERESOLVE => "Name resolution failed".to_string(),
        EFORMAT => "Unrecognized data format".to_string(),
        c if c > START_ERROR => "Error string not specified yet".to_string(),
        c => io::Error::from_raw_os_error(c).to_string(),
    }
}

/// A specialized `Result` type for host facts operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_codes_pass_through() {
        let err = Error::from(Errno::EINVAL);
        assert_eq!(err.code(), libc::EINVAL);
        assert_eq!(strerror(err.code()), io::Error::from_raw_os_error(libc::EINVAL).to_string());
    }

    #[test]
    fn own_codes_live_above_native_band() {
        let err = Error::unsupported_platform("getdomainname");
        assert!(err.is_not_implemented());
        assert_eq!(err.code(), ENOTIMPL);
        assert!(err.code() > START_ERROR);
        assert!(strerror(ENOTIMPL).contains("not been implemented"));
        assert_eq!(strerror(START_ERROR + 99), "Error string not specified yet");
        assert_eq!(strerror(OS_START_ERROR + 1), "Unknown OS Error");
    }

    #[test]
    fn io_errors_keep_raw_code() {
        let err = Error::from(io::Error::from_raw_os_error(libc::ENOENT));
        assert_eq!(err.code(), libc::ENOENT);
    }
}
