// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic mutation modules.
//!
//! Every function comes in `_sqlite` and `_mysql` flavours generated by
//! `backend_fn!`. Operations that touch seats open a write transaction and
//! lock the affected license rows before changing them.
//!
//! ## Module Organization
//!
//! - `directory`: Users and directory sync
//! - `catalog`: Suppliers, software families and softwares
//! - `licenses`: Licenses, coverage, keys and seat counters
//! - `assignments`: Single and bulk assignments, reconciliation
//! - `assets`: Offices, locations, assets and exchanges
//! - `audit`: Audit event persistence

pub mod assets;
pub mod assignments;
pub mod audit;
pub mod catalog;
pub mod directory;
pub mod licenses;
