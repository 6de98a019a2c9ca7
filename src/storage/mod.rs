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


//! Persistence layer: domain models and blob storage
//!
//! All durable state lives in two independently keyed JSON blobs (see
//! [`blob::BlobStore`]): the library snapshot and the auth session. The
//! records that make up those blobs are defined in [`models`].

pub mod blob;
pub mod models;

pub use blob::BlobStore;
