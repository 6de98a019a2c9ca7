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


//! Error types for LibraDesk
//!
//! This module defines error types using thiserror for ergonomic error handling.
//! Errors are categorized by domain (catalog, borrowing, reservations, fines,
//! auth, persistence) so callers can distinguish "not found" from rule
//! violations and surface the right message.

use thiserror::Error;

/// Result type alias using our LibraryError type
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Main error type for LibraDesk
///
/// Every store operation returns one of these on rejection instead of silently
/// no-opping, so the contract is testable without a presentation layer in
/// front of it.
#[derive(Error, Debug)]
pub enum LibraryError {
    // ===== Lookup Errors =====

    /// Book id not present in the catalog
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// Copy id not present in the catalog
    #[error("Copy not found: {0}")]
    CopyNotFound(String),

    /// Borrow record id not present
    #[error("Borrow record not found: {0}")]
    BorrowRecordNotFound(String),

    /// Reservation id not present
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// Fine id not present
    #[error("Fine not found: {0}")]
    FineNotFound(String),

    // ===== Borrowing Rule Violations =====

    /// The named copy belongs to a different book than the one being issued
    #[error("Copy {copy_id} does not belong to book {book_id}")]
    CopyBookMismatch { copy_id: String, book_id: String },

    /// The named copy is not currently available for lending
    #[error("Copy {copy_id} is not available (status: {status})")]
    CopyNotAvailable { copy_id: String, status: String },

    /// The user already has the maximum number of open loans
    #[error("User {user_id} has reached the borrowing limit of {limit}")]
    BorrowLimitReached { user_id: String, limit: u32 },

    /// The borrow record was already closed by a return
    #[error("Borrow record {0} is already returned")]
    AlreadyReturned(String),

    /// The record has used up its renewal allowance
    #[error("Borrow record {record_id} has reached the renewal limit of {limit}")]
    RenewalLimitReached { record_id: String, limit: u32 },

    // ===== Catalog Rule Violations =====

    /// The book still has copies out on loan
    #[error("Book {book_id} still has {open_loans} open loans")]
    BookHasOpenLoans { book_id: String, open_loans: usize },

    // ===== Reservation Rule Violations =====

    /// The user already has an open reservation for this book
    #[error("User {user_id} already has an open reservation for book {book_id}")]
    DuplicateReservation { user_id: String, book_id: String },

    /// The reservation is not in a state that accepts the requested transition
    #[error("Reservation {reservation_id} is already {status}")]
    ReservationClosed {
        reservation_id: String,
        status: String,
    },

    // ===== Fine Rule Violations =====

    /// The fine has already been settled
    #[error("Fine {0} is already paid")]
    FineAlreadyPaid(String),

    // ===== Configuration Errors =====

    /// Settings update rejected
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ===== Auth Errors =====

    /// Email unknown or password mismatch; nothing is stored
    #[error("Invalid email or password")]
    InvalidCredentials,

    // ===== Persistence Errors =====

    /// Blob read/write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob (de)serialization failed
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LibraryError {
    /// Check if error is a missing-identifier lookup failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LibraryError::BookNotFound(_)
                | LibraryError::CopyNotFound(_)
                | LibraryError::BorrowRecordNotFound(_)
                | LibraryError::ReservationNotFound(_)
                | LibraryError::FineNotFound(_)
        )
    }

    /// Check if error is a business-rule rejection of an otherwise
    /// well-formed request
    ///
    /// These are the failures the presentation layer used to pre-filter away;
    /// they are recoverable by picking different arguments.
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            LibraryError::CopyBookMismatch { .. }
                | LibraryError::CopyNotAvailable { .. }
                | LibraryError::BorrowLimitReached { .. }
                | LibraryError::AlreadyReturned(_)
                | LibraryError::RenewalLimitReached { .. }
                | LibraryError::BookHasOpenLoans { .. }
                | LibraryError::DuplicateReservation { .. }
                | LibraryError::ReservationClosed { .. }
                | LibraryError::FineAlreadyPaid(_)
        )
    }

    /// Check if error came from the persistence layer rather than the domain
    pub fn is_storage_error(&self) -> bool {
        matches!(self, LibraryError::Io(_) | LibraryError::Serialization(_))
    }
}
