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


//! LibraDesk core: library-management domain state
//!
//! This crate is the engine behind a library-management dashboard: the book
//! catalog, borrow/return transactions, renewals, reservations, fines, demo
//! authentication, and JSON-blob persistence. It has no UI, no network
//! surface, and no database. The external interface is the in-process store
//! API plus two JSON blobs on disk.
//!
//! # Usage
//!
//! ```no_run
//! use libradesk_core::{AuthStore, BlobStore, LibraryStore};
//!
//! # fn main() -> libradesk_core::Result<()> {
//! let blobs = BlobStore::new("./data")?;
//! let mut library = LibraryStore::open(blobs.clone())?;
//! let mut auth = AuthStore::open(blobs)?;
//!
//! if library.snapshot().books.is_empty() {
//!     library.initialize()?;
//! }
//!
//! let user = auth.login("student@library.com", "password")?;
//! let record = library.issue_book(&user.id, "copy-book-1-0", "book-1")?;
//! library.return_book(&record.id)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod seed;
pub mod storage;
pub mod store;

pub use error::{LibraryError, Result};
pub use storage::blob::BlobStore;
pub use storage::models::{
    AuthSession, Book, BookCopy, BookUpdate, BorrowRecord, BorrowStatus, CopyCondition,
    CopyStatus, Fine, FineStatus, LibrarySettings, LibrarySnapshot, NewBook, Reservation,
    ReservationStatus, User, UserRole,
};
pub use store::auth::AuthStore;
pub use store::library::{LibraryStats, LibraryStore, MemberStats};
