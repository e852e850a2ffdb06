// /////////////////////////////////////////////////////////////////////////////
// Catalog Normalization & Classification System
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes
//!
//! Unix exit code mapping for the admin CLI (spec.md §6): `0` success,
//! `2` invalid configuration, `3` store unavailable, `4` another pipeline
//! already running. Anything else maps to `1`, the generic failure code.

use catalog_domain::CatalogError;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidConfiguration = 2,
    StoreUnavailable = 3,
    AlreadyRunning = 4,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps a domain error's `category()` onto the spec.md §6 exit codes.
pub fn map_error_to_exit_code(error: &CatalogError) -> ExitCode {
    match error.category() {
        "validation" => ExitCode::InvalidConfiguration,
        "database" | "io" => ExitCode::StoreUnavailable,
        "already_running" => ExitCode::AlreadyRunning,
        _ => ExitCode::GeneralError,
    }
}

pub fn result_to_exit_code<T>(result: Result<T, CatalogError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(e) => {
            tracing::error!(category = e.category(), "{e}");
            map_error_to_exit_code(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_maps_to_zero() {
        assert_eq!(result_to_exit_code::<()>(Ok(())), ExitCode::Success);
    }

    #[test]
    fn validation_error_maps_to_two() {
        let err = CatalogError::validation("bad config");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::InvalidConfiguration);
    }

    #[test]
    fn already_running_maps_to_four() {
        let err = CatalogError::already_running("pipeline busy");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::AlreadyRunning);
    }

    #[test]
    fn database_error_maps_to_three() {
        let err = CatalogError::database_error("connection refused");
        assert_eq!(map_error_to_exit_code(&err), ExitCode::StoreUnavailable);
    }
}
