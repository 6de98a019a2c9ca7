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


//! Domain models for LibraDesk
//!
//! Plain serde records for the library domain: catalog entries, physical
//! copies, lending transactions, reservations, fines, user accounts, and
//! the global settings block. The two persisted aggregates, [`LibrarySnapshot`]
//! and [`AuthSession`], are defined here as well; each one serializes to a
//! single JSON blob.
//!
//! Cross-references between entities are by string identifier only; no record
//! holds another record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ENUMS
// ============================================================================

/// Lending state of one physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyStatus {
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "borrowed")]
    Borrowed,
    #[serde(rename = "reserved")]
    Reserved,
    #[serde(rename = "maintenance")]
    Maintenance,
}

impl CopyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "available",
            CopyStatus::Borrowed => "borrowed",
            CopyStatus::Reserved => "reserved",
            CopyStatus::Maintenance => "maintenance",
        }
    }
}

/// Physical condition of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CopyCondition {
    #[serde(rename = "excellent")]
    Excellent,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "fair")]
    Fair,
    #[serde(rename = "poor")]
    Poor,
}

impl CopyCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyCondition::Excellent => "excellent",
            CopyCondition::Good => "good",
            CopyCondition::Fair => "fair",
            CopyCondition::Poor => "poor",
        }
    }
}

/// Lifecycle state of a borrow record
///
/// `Overdue` is a persisted state: the fines recomputation pass promotes
/// past-due `Active` records to it. Display code that needs an up-to-the-
/// minute answer should use [`BorrowRecord::is_overdue`] instead of matching
/// on the stored status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorrowStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "returned")]
    Returned,
    #[serde(rename = "overdue")]
    Overdue,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Active => "active",
            BorrowStatus::Returned => "returned",
            BorrowStatus::Overdue => "overdue",
        }
    }
}

/// Lifecycle state of a reservation
///
/// `Available` means a librarian has flagged a returned copy for the holder
/// and stamped the notification time; `Fulfilled` and `Cancelled` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "available")]
    Available,
    #[serde(rename = "fulfilled")]
    Fulfilled,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Available => "available",
            ReservationStatus::Fulfilled => "fulfilled",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

/// Settlement state of a fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FineStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
}

impl FineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FineStatus::Pending => "pending",
            FineStatus::Paid => "paid",
        }
    }
}

/// Access role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "librarian")]
    Librarian,
    #[serde(rename = "student")]
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Librarian => "librarian",
            UserRole::Student => "student",
        }
    }

    /// Staff roles see library-wide data; students see only their own
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Librarian)
    }
}

// ============================================================================
// MAIN ENTITIES
// ============================================================================

/// Book entity - one catalog title
///
/// Invariant: `0 <= available_copies <= total_copies`. `available_copies`
/// moves down exactly once per issue of one of this book's copies and up
/// exactly once per return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub language: String,
    pub publication_year: Option<i32>,
    /// Shelf location code, e.g. "A-101"
    pub rack_location: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
    pub created_at: DateTime<Utc>,
}

/// One physical copy of a Book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookCopy {
    pub id: String,
    pub book_id: String,
    /// Human-readable label within the book, e.g. "COPY-001"
    pub copy_number: String,
    pub status: CopyStatus,
    pub condition: CopyCondition,
    pub created_at: DateTime<Utc>,
}

/// BorrowRecord - one lending transaction
///
/// Created by issue, mutated by renew and return, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowRecord {
    pub id: String,
    pub user_id: String,
    pub book_copy_id: String,
    pub book_id: String,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
    /// Accrued penalty in currency units; mirrors the record's fine once one
    /// is charged
    pub fine_amount: f64,
    pub renewals: u32,
}

impl BorrowRecord {
    /// Check if the loan is still out (active or overdue)
    pub fn is_open(&self) -> bool {
        matches!(self.status, BorrowStatus::Active | BorrowStatus::Overdue)
    }

    /// Check if the loan is out past its due date as of `now`
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date < now
    }

    /// Whole days elapsed past the due date as of `now`, never negative
    pub fn overdue_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.due_date).num_days().max(0)
    }
}

/// Reservation - a hold request on a book title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub requested_date: DateTime<Utc>,
    pub status: ReservationStatus,
    /// Stamped when the holder is notified that a copy is waiting
    pub notified_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Check if the reservation still blocks a duplicate request
    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            ReservationStatus::Pending | ReservationStatus::Available
        )
    }
}

/// Fine - a monetary penalty tied to one borrow record
///
/// At most one pending fine exists per borrow record at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fine {
    pub id: String,
    pub user_id: String,
    pub borrow_record_id: String,
    pub amount: f64,
    pub reason: String,
    pub status: FineStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

/// User account
///
/// Owned by the auth store; the library store references users by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Global library configuration, read by the store operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySettings {
    pub max_books_per_user: u32,
    pub borrowing_duration_days: u32,
    pub fine_per_day: f64,
    pub max_renewals: u32,
    /// Opening time as "HH:MM"
    pub opening_hours: String,
    pub closing_hours: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            max_books_per_user: 5,
            borrowing_duration_days: 14,
            fine_per_day: 0.50,
            max_renewals: 2,
            opening_hours: "09:00".to_string(),
            closing_hours: "18:00".to_string(),
        }
    }
}

// ============================================================================
// PERSISTED AGGREGATES
// ============================================================================

/// The complete in-memory state of all library collections at a point in time
///
/// This is the unit of persistence: the library store serializes the whole
/// snapshot to one JSON blob on every change, and readers only ever see a
/// fully formed snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub books: Vec<Book>,
    pub book_copies: Vec<BookCopy>,
    pub borrow_records: Vec<BorrowRecord>,
    pub reservations: Vec<Reservation>,
    pub fines: Vec<Fine>,
    pub settings: LibrarySettings,
}

impl LibrarySnapshot {
    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    pub fn copy(&self, id: &str) -> Option<&BookCopy> {
        self.book_copies.iter().find(|c| c.id == id)
    }

    pub fn borrow_record(&self, id: &str) -> Option<&BorrowRecord> {
        self.borrow_records.iter().find(|r| r.id == id)
    }

    pub fn reservation(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub fn fine(&self, id: &str) -> Option<&Fine> {
        self.fines.iter().find(|f| f.id == id)
    }

    /// All copies belonging to one book
    pub fn copies_of<'a>(&'a self, book_id: &'a str) -> impl Iterator<Item = &'a BookCopy> + 'a {
        self.book_copies.iter().filter(move |c| c.book_id == book_id)
    }

    /// Number of loans a user currently has out (active or overdue)
    pub fn open_loan_count(&self, user_id: &str) -> usize {
        self.borrow_records
            .iter()
            .filter(|r| r.user_id == user_id && r.is_open())
            .count()
    }

    /// Check whether a record already carries an unsettled fine
    pub fn has_pending_fine(&self, borrow_record_id: &str) -> bool {
        self.fines
            .iter()
            .any(|f| f.borrow_record_id == borrow_record_id && f.status == FineStatus::Pending)
    }
}

/// The persisted authentication session: at most one signed-in identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: Option<User>,
    pub token: Option<String>,
}

// ============================================================================
// NEW RECORD STRUCTS (operation inputs)
// ============================================================================

/// New book for catalog insertion
///
/// The store assigns the id and timestamps and synthesizes the copies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub language: String,
    pub publication_year: Option<i32>,
    pub rack_location: Option<String>,
    pub total_copies: u32,
}

impl NewBook {
    pub fn new(title: String, author: String, isbn: String, category: String) -> Self {
        Self {
            title,
            author,
            isbn,
            category,
            description: None,
            publisher: None,
            edition: None,
            language: "English".to_string(),
            publication_year: None,
            rack_location: None,
            total_copies: 1,
        }
    }
}

/// Field-level merge patch for catalog metadata
///
/// `None` leaves the field untouched. The copy counters are deliberately not
/// patchable; they are owned by the issue/return bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub edition: Option<String>,
    pub language: Option<String>,
    pub publication_year: Option<i32>,
    pub rack_location: Option<String>,
}

impl BookUpdate {
    /// Merge the provided fields into `book`
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(isbn) = &self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(category) = &self.category {
            book.category = category.clone();
        }
        if let Some(description) = &self.description {
            book.description = Some(description.clone());
        }
        if let Some(publisher) = &self.publisher {
            book.publisher = Some(publisher.clone());
        }
        if let Some(edition) = &self.edition {
            book.edition = Some(edition.clone());
        }
        if let Some(language) = &self.language {
            book.language = language.clone();
        }
        if let Some(year) = self.publication_year {
            book.publication_year = Some(year);
        }
        if let Some(rack) = &self.rack_location {
            book.rack_location = Some(rack.clone());
        }
    }
}
