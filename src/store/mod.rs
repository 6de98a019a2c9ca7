// LibraDesk - Library Management Core
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.


//! State stores
//!
//! Two independent context objects own the application state:
//!
//! - [`library::LibraryStore`] holds the library collections and settings
//! - [`auth::AuthStore`] holds the signed-in identity and session token
//!
//! Construct both once at startup with a [`crate::storage::BlobStore`] and
//! pass them to whatever layer needs them. Each persists to its own blob and
//! never touches the other's state.

pub mod auth;
pub mod library;

pub use auth::AuthStore;
pub use library::{LibraryStore, LibraryStats, MemberStats};
