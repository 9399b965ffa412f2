// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// sheetalign — Core types, configuration, and error definitions shared by the
// alignment pipeline and its hosts.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::AlignConfig;
pub use error::AlignError;
pub use types::*;
