// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for persistence layer.
//!
//! This module contains all read-only queries for the persistence layer.
//!
//! ## Module Organization
//!
//! - `directory`: Users
//! - `catalog`: Suppliers, software families and softwares
//! - `licenses`: Licenses, coverage and keys
//! - `assignments`: Assignments and the inputs of bulk planning
//! - `assets`: Offices, locations, assets and exchanges
//! - `audit`: Audit event queries
//!
//! ## Backend-Specific Functions
//!
//! All query functions are generated in backend-specific monomorphic versions:
//! - Functions suffixed with `_sqlite` for `SQLite`
//! - Functions suffixed with `_mysql` for `MySQL`/`MariaDB`
//!
//! The `Persistence` adapter in `lib.rs` dispatches to the appropriate version
//! based on the active backend connection.

pub mod assets;
pub mod assignments;
pub mod audit;
pub mod catalog;
pub mod directory;
pub mod licenses;
