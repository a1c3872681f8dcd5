//! Raw socket access for a `TCP` SYN trace.
//!
//! A trace holds one raw `IPPROTO_RAW` socket (with `IP_HDRINCL`) for sending probes and opens a
//! fresh raw `IPPROTO_ICMP` socket for every hop. Opening either kind of socket needs elevated
//! access, and because the `ICMP` sockets are opened as the trace progresses that access must be
//! held until the trace ends. Nothing in this crate gives it up.
//!
//! Access is granted in one of two ways:
//!
//! - On Linux, by `CAP_NET_RAW` in the effective capability set. [`Privilege::acquire_privileges`]
//!   raises it from the permitted set if it is there (e.g. after `setcap cap_net_raw+p`)
//! - On all Unix platforms, by running with an effective user of root
//!
//! # Examples
//!
//! ```rust
//! # fn main() -> anyhow::Result<()> {
//! use syntrace_privilege::{Privilege, RawSocketAccess};
//!
//! let privilege = Privilege::acquire_privileges()?;
//! match privilege.access() {
//!     RawSocketAccess::Root => println!("raw sockets allowed as root"),
//!     RawSocketAccess::Capability => println!("raw sockets allowed by CAP_NET_RAW"),
//!     RawSocketAccess::Unavailable => println!("{}", privilege.require().unwrap_err()),
//! }
//! # Ok(())
//! # }
//! ```

/// A privilege error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A privilege error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[cfg(target_os = "linux")]
    #[error("caps error: {0}")]
    CapsError(#[from] caps::errors::CapsError),
    #[error("privileges are required (hint: {})", RawSocketAccess::HINT)]
    Unprivileged,
}

/// How, if at all, this process may open raw sockets.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RawSocketAccess {
    /// The effective user is root.
    Root,
    /// The effective user is not root but `CAP_NET_RAW` is effective.
    Capability,
    /// Raw sockets cannot be opened.
    Unavailable,
}

impl RawSocketAccess {
    #[cfg(target_os = "linux")]
    const HINT: &'static str = "run as root or grant the CAP_NET_RAW capability";

    #[cfg(not(target_os = "linux"))]
    const HINT: &'static str = "run as root";

    /// Linux ignores the user id for raw sockets, only the effective capability matters.
    #[cfg(target_os = "linux")]
    const fn classify(is_root: bool, net_raw_effective: bool) -> Self {
        match (is_root, net_raw_effective) {
            (true, true) => Self::Root,
            (false, true) => Self::Capability,
            (_, false) => Self::Unavailable,
        }
    }

    #[cfg(not(target_os = "linux"))]
    const fn classify(is_root: bool, _net_raw_effective: bool) -> Self {
        if is_root {
            Self::Root
        } else {
            Self::Unavailable
        }
    }
}

/// Run-time raw socket privilege information.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Privilege {
    access: RawSocketAccess,
}

impl Privilege {
    #[must_use]
    pub const fn new(access: RawSocketAccess) -> Self {
        Self { access }
    }

    /// Acquire raw socket privileges, if possible, and report what is held.
    ///
    /// On Linux `CAP_NET_RAW` is raised to the effective set if it is permitted. Elsewhere this
    /// is the same as [`Privilege::discover`].
    pub fn acquire_privileges() -> Result<Self> {
        raise_net_raw()?;
        Self::discover()
    }

    /// Discover the raw socket privileges currently held, without changing them.
    pub fn discover() -> Result<Self> {
        let is_root = nix::unistd::Uid::effective().is_root();
        Ok(Self::new(RawSocketAccess::classify(
            is_root,
            net_raw_effective()?,
        )))
    }

    /// How raw sockets may be opened, if at all.
    #[must_use]
    pub const fn access(&self) -> RawSocketAccess {
        self.access
    }

    /// Can raw sockets be opened?
    #[must_use]
    pub const fn has_privileges(&self) -> bool {
        !matches!(self.access, RawSocketAccess::Unavailable)
    }

    /// Fail with a hint unless raw sockets can be opened.
    pub fn require(&self) -> Result<()> {
        if self.has_privileges() {
            Ok(())
        } else {
            Err(Error::Unprivileged)
        }
    }
}

#[cfg(target_os = "linux")]
fn raise_net_raw() -> Result<()> {
    if caps::has_cap(None, caps::CapSet::Permitted, caps::Capability::CAP_NET_RAW)? {
        caps::raise(None, caps::CapSet::Effective, caps::Capability::CAP_NET_RAW)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn net_raw_effective() -> Result<bool> {
    Ok(caps::has_cap(
        None,
        caps::CapSet::Effective,
        caps::Capability::CAP_NET_RAW,
    )?)
}

#[cfg(not(target_os = "linux"))]
#[expect(clippy::unnecessary_wraps)]
const fn raise_net_raw() -> Result<()> {
    Ok(())
}

#[cfg(not(target_os = "linux"))]
#[expect(clippy::unnecessary_wraps)]
const fn net_raw_effective() -> Result<bool> {
    Ok(false)
}
