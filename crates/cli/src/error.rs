// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type carrying a process exit code, grounded on oj-cli's
//! `exit_error.rs` shape: commands return this instead of calling
//! `std::process::exit()` directly, letting `main()` own termination.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<reqwest::Error> for ExitError {
    fn from(err: reqwest::Error) -> Self {
        ExitError::new(1, format!("request to daemon failed: {err}"))
    }
}
