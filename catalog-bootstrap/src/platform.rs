// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Platform
//!
//! Portable process/host facts the admin CLI reports in `status` output
//! and structured log fields (hostname, pid, cpu count). Unlike the
//! teacher's platform layer, there's no file-I/O page-size/alignment
//! surface to abstract here — the catalog engine's storage is SQLite via
//! `sqlx`, not a block-aligned custom format — so this module stays a
//! thin, std-only trait rather than a unix/windows libc split.

use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum PlatformError {
    #[error("failed to determine hostname")]
    HostnameUnavailable,
}

pub trait Platform: Send + Sync {
    fn cpu_count(&self) -> usize;
    fn process_id(&self) -> u32;
    fn hostname(&self) -> Result<String, PlatformError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HostPlatform;

impl fmt::Display for HostPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-platform")
    }
}

impl Platform for HostPlatform {
    fn cpu_count(&self) -> usize {
        std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }

    fn hostname(&self) -> Result<String, PlatformError> {
        hostname_impl::hostname().ok_or(PlatformError::HostnameUnavailable)
    }
}

#[cfg(unix)]
mod hostname_impl {
    pub fn hostname() -> Option<String> {
        let mut buf = vec![0u8; 256];
        // SAFETY: buf is a valid, writable byte buffer of the given length;
        // gethostname writes a NUL-terminated string into it on success.
        let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
        if rc != 0 {
            return None;
        }
        let nul = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        buf.truncate(nul);
        String::from_utf8(buf).ok()
    }
}

#[cfg(not(unix))]
mod hostname_impl {
    pub fn hostname() -> Option<String> {
        std::env::var("COMPUTERNAME").or_else(|_| std::env::var("HOSTNAME")).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_count_is_at_least_one() {
        assert!(HostPlatform.cpu_count() >= 1);
    }

    #[test]
    fn process_id_matches_std() {
        assert_eq!(HostPlatform.process_id(), std::process::id());
    }

    #[test]
    fn hostname_is_resolvable_in_test_environment() {
        // Not guaranteed in every sandbox, but exercises the happy path.
        let _ = HostPlatform.hostname();
    }
}
