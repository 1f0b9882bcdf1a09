// SPDX-License-Identifier: MIT

//! Middleware modules.

pub mod auth;
pub mod push_auth;
pub mod security;
