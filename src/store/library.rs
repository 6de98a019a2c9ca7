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


//! Library state store
//!
//! [`LibraryStore`] owns the authoritative [`LibrarySnapshot`] and exposes the
//! full operation set for the borrowing/reservation/fine domain. Every public
//! mutation:
//!
//! 1. validates its preconditions against the current snapshot,
//! 2. applies its complete set of derived updates to a working copy,
//! 3. persists the working copy to the library blob, and
//! 4. publishes it as the new immutable snapshot.
//!
//! Readers hold `Arc<LibrarySnapshot>` handles; a snapshot handed out before a
//! mutation never changes underneath its reader. A persistence failure leaves
//! the published snapshot untouched.
//!
//! All operations are synchronous and complete before returning; ordering is
//! the caller's call order.

use crate::error::{LibraryError, Result};
use crate::seed;
use crate::storage::blob::BlobStore;
use crate::storage::models::{
    Book, BookCopy, BookUpdate, BorrowRecord, BorrowStatus, CopyCondition, CopyStatus, Fine,
    FineStatus, LibrarySettings, LibrarySnapshot, NewBook, Reservation, ReservationStatus,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Blob key for the persisted library snapshot
pub const LIBRARY_BLOB_KEY: &str = "library-storage";

/// Days-to-due threshold for the "due soon" member statistic
const DUE_SOON_DAYS: i64 = 3;

/// Authoritative store for the library collections and settings
pub struct LibraryStore {
    blobs: BlobStore,
    snapshot: Arc<LibrarySnapshot>,
}

impl LibraryStore {
    /// Open the store, restoring the persisted snapshot if one exists
    ///
    /// With no blob on disk the store starts empty with default settings;
    /// call [`initialize`](Self::initialize) to load the demo fixture.
    pub fn open(blobs: BlobStore) -> Result<Self> {
        let snapshot = match blobs.load::<LibrarySnapshot>(LIBRARY_BLOB_KEY)? {
            Some(snapshot) => {
                debug!(
                    books = snapshot.books.len(),
                    borrow_records = snapshot.borrow_records.len(),
                    "restored library snapshot"
                );
                snapshot
            }
            None => LibrarySnapshot::default(),
        };

        Ok(Self {
            blobs,
            snapshot: Arc::new(snapshot),
        })
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<LibrarySnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Current settings block
    pub fn settings(&self) -> &LibrarySettings {
        &self.snapshot.settings
    }

    /// Persist `next` and publish it as the current snapshot
    fn commit(&mut self, next: LibrarySnapshot) -> Result<()> {
        self.blobs.save(LIBRARY_BLOB_KEY, &next)?;
        self.snapshot = Arc::new(next);
        Ok(())
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Replace the five collections with the demo fixture
    ///
    /// Settings are preserved. Existing data is overwritten without a guard;
    /// callers that want initialize-once semantics must check for an empty
    /// catalog first.
    pub fn initialize(&mut self) -> Result<()> {
        let seeded = seed::demo_snapshot();

        let mut next = (*self.snapshot).clone();
        next.books = seeded.books;
        next.book_copies = seeded.book_copies;
        next.borrow_records = seeded.borrow_records;
        next.reservations = seeded.reservations;
        next.fines = seeded.fines;
        self.commit(next)?;

        info!("library collections reset to demo fixture");
        Ok(())
    }

    // ========================================================================
    // Catalog Operations
    // ========================================================================

    /// Add a book and synthesize its copies
    ///
    /// The new book starts with `available_copies == total_copies` and exactly
    /// `total_copies` copies in `Available` status.
    pub fn add_book(&mut self, new_book: NewBook) -> Result<Book> {
        let now = Utc::now();
        let book_id = format!("book-{}", Uuid::new_v4());

        let book = Book {
            id: book_id.clone(),
            title: new_book.title,
            author: new_book.author,
            isbn: new_book.isbn,
            category: new_book.category,
            description: new_book.description,
            publisher: new_book.publisher,
            edition: new_book.edition,
            language: new_book.language,
            publication_year: new_book.publication_year,
            rack_location: new_book.rack_location,
            total_copies: new_book.total_copies,
            available_copies: new_book.total_copies,
            created_at: now,
        };

        let copies = (0..book.total_copies).map(|i| BookCopy {
            id: format!("copy-{book_id}-{i}"),
            book_id: book_id.clone(),
            copy_number: format!("COPY-{:03}", i + 1),
            status: CopyStatus::Available,
            condition: CopyCondition::Good,
            created_at: now,
        });

        let mut next = (*self.snapshot).clone();
        next.book_copies.extend(copies);
        next.books.push(book.clone());
        self.commit(next)?;

        info!(book_id = %book.id, copies = book.total_copies, "added book");
        Ok(book)
    }

    /// Merge catalog metadata into an existing book
    pub fn update_book(&mut self, id: &str, update: BookUpdate) -> Result<Book> {
        let mut next = (*self.snapshot).clone();
        let idx = next
            .books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| LibraryError::BookNotFound(id.to_string()))?;

        update.apply_to(&mut next.books[idx]);
        let updated = next.books[idx].clone();
        self.commit(next)?;

        info!(book_id = id, "updated book");
        Ok(updated)
    }

    /// Remove a book and all of its copies
    ///
    /// Rejected while any open loan still references the book; closed borrow
    /// records, reservations, and fines are left as history.
    pub fn delete_book(&mut self, id: &str) -> Result<()> {
        if self.snapshot.book(id).is_none() {
            return Err(LibraryError::BookNotFound(id.to_string()));
        }

        let open_loans = self
            .snapshot
            .borrow_records
            .iter()
            .filter(|r| r.book_id == id && r.is_open())
            .count();
        if open_loans > 0 {
            warn!(book_id = id, open_loans, "refusing to delete book with open loans");
            return Err(LibraryError::BookHasOpenLoans {
                book_id: id.to_string(),
                open_loans,
            });
        }

        let mut next = (*self.snapshot).clone();
        next.books.retain(|b| b.id != id);
        next.book_copies.retain(|c| c.book_id != id);
        self.commit(next)?;

        info!(book_id = id, "deleted book");
        Ok(())
    }

    // ========================================================================
    // Borrowing Operations
    // ========================================================================

    /// Issue a copy of a book to a user
    ///
    /// Validates that the copy belongs to the book, that it is available, and
    /// that the user is under the configured borrowing limit. On success the
    /// copy flips to `Borrowed`, the book's availability drops by one, and a
    /// fresh `Active` record is created with the due date set
    /// `borrowing_duration_days` out.
    pub fn issue_book(
        &mut self,
        user_id: &str,
        copy_id: &str,
        book_id: &str,
    ) -> Result<BorrowRecord> {
        let mut next = (*self.snapshot).clone();

        let book_idx = next
            .books
            .iter()
            .position(|b| b.id == book_id)
            .ok_or_else(|| LibraryError::BookNotFound(book_id.to_string()))?;
        let copy_idx = next
            .book_copies
            .iter()
            .position(|c| c.id == copy_id)
            .ok_or_else(|| LibraryError::CopyNotFound(copy_id.to_string()))?;

        let copy = &next.book_copies[copy_idx];
        if copy.book_id != book_id {
            return Err(LibraryError::CopyBookMismatch {
                copy_id: copy_id.to_string(),
                book_id: book_id.to_string(),
            });
        }
        if copy.status != CopyStatus::Available {
            return Err(LibraryError::CopyNotAvailable {
                copy_id: copy_id.to_string(),
                status: copy.status.as_str().to_string(),
            });
        }

        let limit = next.settings.max_books_per_user;
        let open_loans = next.open_loan_count(user_id);
        if open_loans >= limit as usize {
            warn!(user_id, open_loans, limit, "borrow limit reached");
            return Err(LibraryError::BorrowLimitReached {
                user_id: user_id.to_string(),
                limit,
            });
        }

        let now = Utc::now();
        let record = BorrowRecord {
            id: format!("borrow-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            book_copy_id: copy_id.to_string(),
            book_id: book_id.to_string(),
            issue_date: now,
            due_date: now + Duration::days(i64::from(next.settings.borrowing_duration_days)),
            return_date: None,
            status: BorrowStatus::Active,
            fine_amount: 0.0,
            renewals: 0,
        };

        next.book_copies[copy_idx].status = CopyStatus::Borrowed;
        let book = &mut next.books[book_idx];
        book.available_copies = book.available_copies.saturating_sub(1);
        next.borrow_records.push(record.clone());
        self.commit(next)?;

        info!(
            record_id = %record.id,
            user_id,
            copy_id,
            book_id,
            due = %record.due_date,
            "issued book"
        );
        Ok(record)
    }

    /// Close a loan and charge any overdue fine
    ///
    /// The fine is `overdue_days * fine_per_day`, with `overdue_days` floored
    /// at whole days and never negative. The copy flips back to `Available`
    /// and the book's availability rises by one. If the recomputation pass
    /// already opened a pending fine for this record, its amount is updated
    /// instead of a second fine being appended.
    pub fn return_book(&mut self, record_id: &str) -> Result<BorrowRecord> {
        let mut next = (*self.snapshot).clone();

        let record_idx = next
            .borrow_records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| LibraryError::BorrowRecordNotFound(record_id.to_string()))?;
        if !next.borrow_records[record_idx].is_open() {
            return Err(LibraryError::AlreadyReturned(record_id.to_string()));
        }

        let now = Utc::now();
        let overdue_days = next.borrow_records[record_idx].overdue_days(now);
        let fine_amount = overdue_days as f64 * next.settings.fine_per_day;

        let copy_id = next.borrow_records[record_idx].book_copy_id.clone();
        let book_id = next.borrow_records[record_idx].book_id.clone();
        let user_id = next.borrow_records[record_idx].user_id.clone();

        let copy_idx = next
            .book_copies
            .iter()
            .position(|c| c.id == copy_id)
            .ok_or_else(|| LibraryError::CopyNotFound(copy_id.clone()))?;
        let book_idx = next
            .books
            .iter()
            .position(|b| b.id == book_id)
            .ok_or_else(|| LibraryError::BookNotFound(book_id.clone()))?;

        {
            let record = &mut next.borrow_records[record_idx];
            record.status = BorrowStatus::Returned;
            record.return_date = Some(now);
            record.fine_amount = fine_amount;
        }
        next.book_copies[copy_idx].status = CopyStatus::Available;
        let book = &mut next.books[book_idx];
        book.available_copies = (book.available_copies + 1).min(book.total_copies);

        if fine_amount > 0.0 {
            let reason = format!("Overdue by {overdue_days} days");
            let existing = next
                .fines
                .iter()
                .position(|f| f.borrow_record_id == record_id && f.status == FineStatus::Pending);
            match existing {
                Some(fine_idx) => {
                    let fine = &mut next.fines[fine_idx];
                    fine.amount = fine_amount;
                    fine.reason = reason;
                }
                None => next.fines.push(Fine {
                    id: format!("fine-{}", Uuid::new_v4()),
                    user_id,
                    borrow_record_id: record_id.to_string(),
                    amount: fine_amount,
                    reason,
                    status: FineStatus::Pending,
                    paid_at: None,
                    payment_method: None,
                }),
            }
        }

        let returned = next.borrow_records[record_idx].clone();
        self.commit(next)?;

        info!(record_id, overdue_days, fine_amount, "returned book");
        Ok(returned)
    }

    /// Extend a loan by one borrowing period
    ///
    /// The extension is measured from the current due date, not from today,
    /// and is bounded by `max_renewals`.
    pub fn renew_book(&mut self, record_id: &str) -> Result<BorrowRecord> {
        let mut next = (*self.snapshot).clone();

        let record_idx = next
            .borrow_records
            .iter()
            .position(|r| r.id == record_id)
            .ok_or_else(|| LibraryError::BorrowRecordNotFound(record_id.to_string()))?;
        if !next.borrow_records[record_idx].is_open() {
            return Err(LibraryError::AlreadyReturned(record_id.to_string()));
        }

        let limit = next.settings.max_renewals;
        if next.borrow_records[record_idx].renewals >= limit {
            warn!(record_id, limit, "renewal limit reached");
            return Err(LibraryError::RenewalLimitReached {
                record_id: record_id.to_string(),
                limit,
            });
        }

        let duration = i64::from(next.settings.borrowing_duration_days);
        {
            let record = &mut next.borrow_records[record_idx];
            record.due_date += Duration::days(duration);
            record.renewals += 1;
        }

        let renewed = next.borrow_records[record_idx].clone();
        self.commit(next)?;

        info!(record_id, renewals = renewed.renewals, due = %renewed.due_date, "renewed loan");
        Ok(renewed)
    }

    // ========================================================================
    // Reservation Operations
    // ========================================================================

    /// Place a hold request on a book title
    ///
    /// A user may hold at most one open reservation per book. Reserving a
    /// title that still has available copies is allowed; whether that makes
    /// sense is the caller's policy.
    pub fn create_reservation(&mut self, user_id: &str, book_id: &str) -> Result<Reservation> {
        if self.snapshot.book(book_id).is_none() {
            return Err(LibraryError::BookNotFound(book_id.to_string()));
        }

        let duplicate = self
            .snapshot
            .reservations
            .iter()
            .any(|r| r.user_id == user_id && r.book_id == book_id && r.is_open());
        if duplicate {
            warn!(user_id, book_id, "duplicate reservation rejected");
            return Err(LibraryError::DuplicateReservation {
                user_id: user_id.to_string(),
                book_id: book_id.to_string(),
            });
        }

        let reservation = Reservation {
            id: format!("reservation-{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            book_id: book_id.to_string(),
            requested_date: Utc::now(),
            status: ReservationStatus::Pending,
            notified_at: None,
        };

        let mut next = (*self.snapshot).clone();
        next.reservations.push(reservation.clone());
        self.commit(next)?;

        info!(reservation_id = %reservation.id, user_id, book_id, "created reservation");
        Ok(reservation)
    }

    /// Flag a pending reservation as ready for pickup and stamp the
    /// notification time
    pub fn mark_reservation_available(&mut self, id: &str) -> Result<Reservation> {
        self.transition_reservation(id, &[ReservationStatus::Pending], |r, now| {
            r.status = ReservationStatus::Available;
            r.notified_at = Some(now);
        })
    }

    /// Complete a reservation
    ///
    /// Does not issue the book or touch availability; hand-over still goes
    /// through [`issue_book`](Self::issue_book).
    pub fn fulfill_reservation(&mut self, id: &str) -> Result<Reservation> {
        self.transition_reservation(
            id,
            &[ReservationStatus::Pending, ReservationStatus::Available],
            |r, now| {
                r.status = ReservationStatus::Fulfilled;
                if r.notified_at.is_none() {
                    r.notified_at = Some(now);
                }
            },
        )
    }

    /// Withdraw an open reservation
    pub fn cancel_reservation(&mut self, id: &str) -> Result<Reservation> {
        self.transition_reservation(
            id,
            &[ReservationStatus::Pending, ReservationStatus::Available],
            |r, _| r.status = ReservationStatus::Cancelled,
        )
    }

    fn transition_reservation(
        &mut self,
        id: &str,
        accepted: &[ReservationStatus],
        apply: impl FnOnce(&mut Reservation, DateTime<Utc>),
    ) -> Result<Reservation> {
        let mut next = (*self.snapshot).clone();

        let idx = next
            .reservations
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| LibraryError::ReservationNotFound(id.to_string()))?;
        let status = next.reservations[idx].status;
        if !accepted.contains(&status) {
            return Err(LibraryError::ReservationClosed {
                reservation_id: id.to_string(),
                status: status.as_str().to_string(),
            });
        }

        apply(&mut next.reservations[idx], Utc::now());
        let reservation = next.reservations[idx].clone();
        self.commit(next)?;

        info!(reservation_id = id, status = reservation.status.as_str(), "reservation updated");
        Ok(reservation)
    }

    // ========================================================================
    // Fine Operations
    // ========================================================================

    /// Recompute fines for loans that are out past their due date
    ///
    /// Promotes every open past-due record to `Overdue`. Records that already
    /// carry a pending fine are never charged twice; for the rest a pending
    /// fine is appended with the amount measured from today, and the amount
    /// is mirrored into the record. Records less than one whole day late are
    /// promoted but not yet charged.
    ///
    /// Returns the fines created by this pass.
    pub fn calculate_fines(&mut self) -> Result<Vec<Fine>> {
        let now = Utc::now();
        let mut next = (*self.snapshot).clone();

        let already_pending: HashSet<String> = next
            .fines
            .iter()
            .filter(|f| f.status == FineStatus::Pending)
            .map(|f| f.borrow_record_id.clone())
            .collect();

        let past_due: Vec<usize> = next
            .borrow_records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_overdue(now))
            .map(|(i, _)| i)
            .collect();

        let mut created = Vec::new();
        let mut changed = false;

        for idx in past_due {
            let record = &mut next.borrow_records[idx];
            if record.status != BorrowStatus::Overdue {
                record.status = BorrowStatus::Overdue;
                changed = true;
            }

            let days = record.overdue_days(now);
            if days == 0 || already_pending.contains(&record.id) {
                continue;
            }

            let amount = days as f64 * next.settings.fine_per_day;
            record.fine_amount = amount;
            let fine = Fine {
                id: format!("fine-{}", Uuid::new_v4()),
                user_id: record.user_id.clone(),
                borrow_record_id: record.id.clone(),
                amount,
                reason: format!("Overdue by {days} days"),
                status: FineStatus::Pending,
                paid_at: None,
                payment_method: None,
            };
            created.push(fine.clone());
            next.fines.push(fine);
            changed = true;
        }

        if !changed {
            debug!("fine recomputation found nothing to do");
            return Ok(created);
        }

        self.commit(next)?;
        info!(new_fines = created.len(), "fine recomputation pass complete");
        Ok(created)
    }

    /// Settle a pending fine
    pub fn pay_fine(&mut self, id: &str, payment_method: &str) -> Result<Fine> {
        let mut next = (*self.snapshot).clone();

        let idx = next
            .fines
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| LibraryError::FineNotFound(id.to_string()))?;
        if next.fines[idx].status == FineStatus::Paid {
            return Err(LibraryError::FineAlreadyPaid(id.to_string()));
        }

        {
            let fine = &mut next.fines[idx];
            fine.status = FineStatus::Paid;
            fine.paid_at = Some(Utc::now());
            fine.payment_method = Some(payment_method.to_string());
        }

        let paid = next.fines[idx].clone();
        self.commit(next)?;

        info!(fine_id = id, amount = paid.amount, payment_method, "fine paid");
        Ok(paid)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Replace the settings block
    pub fn update_settings(&mut self, settings: LibrarySettings) -> Result<()> {
        if settings.max_books_per_user == 0 {
            return Err(LibraryError::InvalidSettings(
                "max_books_per_user must be at least 1".to_string(),
            ));
        }
        if settings.borrowing_duration_days == 0 {
            return Err(LibraryError::InvalidSettings(
                "borrowing_duration_days must be at least 1".to_string(),
            ));
        }
        if !settings.fine_per_day.is_finite() || settings.fine_per_day < 0.0 {
            return Err(LibraryError::InvalidSettings(
                "fine_per_day must be a non-negative amount".to_string(),
            ));
        }

        let mut next = (*self.snapshot).clone();
        next.settings = settings;
        self.commit(next)?;

        info!("settings updated");
        Ok(())
    }

    // ========================================================================
    // Derived Statistics
    // ========================================================================

    /// Library-wide aggregates for the staff dashboard
    pub fn stats(&self) -> LibraryStats {
        let snapshot = &self.snapshot;
        let now = Utc::now();
        let today = now.date_naive();

        LibraryStats {
            total_books: snapshot.books.len(),
            total_copies: snapshot.books.iter().map(|b| b.total_copies).sum(),
            available_copies: snapshot.books.iter().map(|b| b.available_copies).sum(),
            active_borrows: snapshot
                .borrow_records
                .iter()
                .filter(|r| r.status == BorrowStatus::Active)
                .count(),
            overdue_borrows: snapshot
                .borrow_records
                .iter()
                .filter(|r| r.status == BorrowStatus::Overdue || r.is_overdue(now))
                .count(),
            pending_reservations: snapshot
                .reservations
                .iter()
                .filter(|r| r.status == ReservationStatus::Pending)
                .count(),
            pending_fine_total: snapshot
                .fines
                .iter()
                .filter(|f| f.status == FineStatus::Pending)
                .map(|f| f.amount)
                .sum(),
            issued_today: snapshot
                .borrow_records
                .iter()
                .filter(|r| r.issue_date.date_naive() == today)
                .count(),
            returned_today: snapshot
                .borrow_records
                .iter()
                .filter(|r| r.return_date.is_some_and(|d| d.date_naive() == today))
                .count(),
        }
    }

    /// Per-member aggregates for the member dashboard
    pub fn member_stats(&self, user_id: &str) -> MemberStats {
        let snapshot = &self.snapshot;
        let now = Utc::now();

        let my_records: Vec<&BorrowRecord> = snapshot
            .borrow_records
            .iter()
            .filter(|r| r.user_id == user_id)
            .collect();

        MemberStats {
            active_borrows: my_records
                .iter()
                .filter(|r| r.status == BorrowStatus::Active)
                .count(),
            overdue_borrows: my_records
                .iter()
                .filter(|r| r.status == BorrowStatus::Overdue || r.is_overdue(now))
                .count(),
            pending_fine_total: snapshot
                .fines
                .iter()
                .filter(|f| f.user_id == user_id && f.status == FineStatus::Pending)
                .map(|f| f.amount)
                .sum(),
            open_reservations: snapshot
                .reservations
                .iter()
                .filter(|r| r.user_id == user_id && r.is_open())
                .count(),
            due_soon: my_records
                .iter()
                .filter(|r| {
                    if r.status != BorrowStatus::Active {
                        return false;
                    }
                    let days_until_due = (r.due_date - now).num_days();
                    (0..=DUE_SOON_DAYS).contains(&days_until_due)
                })
                .count(),
        }
    }
}

/// Library-wide dashboard aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryStats {
    pub total_books: usize,
    pub total_copies: u32,
    pub available_copies: u32,
    pub active_borrows: usize,
    /// Stored-overdue records plus active records already past due
    pub overdue_borrows: usize,
    pub pending_reservations: usize,
    pub pending_fine_total: f64,
    pub issued_today: usize,
    pub returned_today: usize,
}

/// Per-member dashboard aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberStats {
    pub active_borrows: usize,
    pub overdue_borrows: usize,
    pub pending_fine_total: f64,
    pub open_reservations: usize,
    /// Active loans due within the next three days
    pub due_soon: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> LibraryStore {
        let blobs = BlobStore::new(dir.path()).expect("blob store opens");
        LibraryStore::open(blobs).expect("library store opens")
    }

    /// Store preloaded with the demo fixture
    fn seeded_store() -> (TempDir, LibraryStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.initialize().unwrap();
        (dir, store)
    }

    /// Store whose blob was written from a hand-modified fixture snapshot
    fn store_with_snapshot(snapshot: &LibrarySnapshot) -> (TempDir, LibraryStore) {
        let dir = tempfile::tempdir().unwrap();
        let blobs = BlobStore::new(dir.path()).unwrap();
        blobs.save(LIBRARY_BLOB_KEY, snapshot).unwrap();
        (dir, LibraryStore::open(blobs).unwrap())
    }

    fn record_mut<'a>(snapshot: &'a mut LibrarySnapshot, id: &str) -> &'a mut BorrowRecord {
        snapshot
            .borrow_records
            .iter_mut()
            .find(|r| r.id == id)
            .expect("record exists in fixture")
    }

    // ===== Catalog =====

    #[test]
    fn test_add_book_creates_matching_copies() {
        let (_dir, mut store) = seeded_store();

        let mut new_book = NewBook::new(
            "The Hobbit".to_string(),
            "J.R.R. Tolkien".to_string(),
            "978-0-618-00221-4".to_string(),
            "Fantasy".to_string(),
        );
        new_book.total_copies = 3;

        let book = store.add_book(new_book).unwrap();
        assert_eq!(book.total_copies, 3);
        assert_eq!(book.available_copies, 3);

        let snapshot = store.snapshot();
        let copies: Vec<_> = snapshot.copies_of(&book.id).collect();
        assert_eq!(copies.len(), 3);
        assert!(copies.iter().all(|c| c.status == CopyStatus::Available));
        assert_eq!(copies[0].copy_number, "COPY-001");
        assert_eq!(copies[2].copy_number, "COPY-003");
    }

    #[test]
    fn test_update_book_merges_fields() {
        let (_dir, mut store) = seeded_store();

        let update = BookUpdate {
            title: Some("Nineteen Eighty-Four".to_string()),
            rack_location: Some("B-202".to_string()),
            ..Default::default()
        };
        let book = store.update_book("book-3", update).unwrap();

        assert_eq!(book.title, "Nineteen Eighty-Four");
        assert_eq!(book.rack_location.as_deref(), Some("B-202"));
        // Untouched fields survive the merge
        assert_eq!(book.author, "George Orwell");
        assert_eq!(book.total_copies, 6);

        let missing = store.update_book("book-99", BookUpdate::default());
        assert!(matches!(missing, Err(LibraryError::BookNotFound(_))));
    }

    #[test]
    fn test_delete_book_removes_copies() {
        let (_dir, mut store) = seeded_store();

        store.delete_book("book-3").unwrap();

        let snapshot = store.snapshot();
        assert!(snapshot.book("book-3").is_none());
        assert_eq!(snapshot.copies_of("book-3").count(), 0);
    }

    #[test]
    fn test_delete_book_with_open_loans_is_rejected() {
        let (_dir, mut store) = seeded_store();

        // borrow-1 is an open loan on book-1
        let result = store.delete_book("book-1");
        assert!(matches!(
            result,
            Err(LibraryError::BookHasOpenLoans { open_loans: 1, .. })
        ));
        assert!(store.snapshot().book("book-1").is_some());
    }

    // ===== Issue / Return =====

    #[test]
    fn test_issue_and_return_move_one_copy() {
        let (_dir, mut store) = seeded_store();

        let before = store.snapshot().book("book-1").unwrap().available_copies;
        let record = store.issue_book("1", "copy-book-1-0", "book-1").unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.book("book-1").unwrap().available_copies, before - 1);
        assert_eq!(
            snapshot.copy("copy-book-1-0").unwrap().status,
            CopyStatus::Borrowed
        );
        assert_eq!(record.status, BorrowStatus::Active);
        assert_eq!(record.renewals, 0);
        assert_eq!(record.fine_amount, 0.0);
        assert_eq!(
            record.due_date - record.issue_date,
            Duration::days(i64::from(snapshot.settings.borrowing_duration_days))
        );

        let returned = store.return_book(&record.id).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(returned.status, BorrowStatus::Returned);
        assert!(returned.return_date.is_some());
        assert_eq!(returned.fine_amount, 0.0);
        assert_eq!(snapshot.book("book-1").unwrap().available_copies, before);
        assert_eq!(
            snapshot.copy("copy-book-1-0").unwrap().status,
            CopyStatus::Available
        );
        // On-time return charges nothing
        assert_eq!(snapshot.fines.len(), 1);
    }

    #[test]
    fn test_issue_rejects_mismatched_copy() {
        let (_dir, mut store) = seeded_store();

        let result = store.issue_book("1", "copy-book-2-0", "book-1");
        assert!(matches!(result, Err(LibraryError::CopyBookMismatch { .. })));
    }

    #[test]
    fn test_issue_rejects_unavailable_copy() {
        let (_dir, mut store) = seeded_store();

        // copy-book-1-3 is part of the borrowed tail
        let result = store.issue_book("1", "copy-book-1-3", "book-1");
        assert!(matches!(result, Err(LibraryError::CopyNotAvailable { .. })));

        // Nothing changed
        assert_eq!(store.snapshot().book("book-1").unwrap().available_copies, 3);
    }

    #[test]
    fn test_issue_rejects_unknown_ids() {
        let (_dir, mut store) = seeded_store();

        assert!(matches!(
            store.issue_book("1", "copy-book-1-0", "book-99"),
            Err(LibraryError::BookNotFound(_))
        ));
        assert!(matches!(
            store.issue_book("1", "copy-missing", "book-1"),
            Err(LibraryError::CopyNotFound(_))
        ));
    }

    #[test]
    fn test_issue_enforces_borrow_limit() {
        let (_dir, mut store) = seeded_store();

        // User 3 already has two open loans in the fixture
        let mut settings = store.settings().clone();
        settings.max_books_per_user = 2;
        store.update_settings(settings).unwrap();

        let result = store.issue_book("3", "copy-book-1-0", "book-1");
        assert!(matches!(
            result,
            Err(LibraryError::BorrowLimitReached { limit: 2, .. })
        ));
    }

    #[test]
    fn test_return_rejects_missing_and_closed_records() {
        let (_dir, mut store) = seeded_store();

        assert!(matches!(
            store.return_book("borrow-99"),
            Err(LibraryError::BorrowRecordNotFound(_))
        ));

        let record = store.issue_book("1", "copy-book-1-0", "book-1").unwrap();
        store.return_book(&record.id).unwrap();
        assert!(matches!(
            store.return_book(&record.id),
            Err(LibraryError::AlreadyReturned(_))
        ));
    }

    #[test]
    fn test_return_charges_fine_per_overdue_day() {
        let mut snapshot = seed::demo_snapshot();
        record_mut(&mut snapshot, "borrow-1").due_date = Utc::now() - Duration::days(10);
        let (_dir, mut store) = store_with_snapshot(&snapshot);

        let returned = store.return_book("borrow-1").unwrap();
        assert_eq!(returned.fine_amount, 10.0 * 0.50);

        let snapshot = store.snapshot();
        let fine = snapshot
            .fines
            .iter()
            .find(|f| f.borrow_record_id == "borrow-1")
            .expect("fine charged");
        assert_eq!(fine.amount, 5.0);
        assert_eq!(fine.status, FineStatus::Pending);
        assert_eq!(fine.reason, "Overdue by 10 days");
        assert_eq!(fine.user_id, "3");
    }

    #[test]
    fn test_return_before_due_date_charges_nothing() {
        let mut snapshot = seed::demo_snapshot();
        record_mut(&mut snapshot, "borrow-1").due_date = Utc::now() + Duration::days(1);
        let (_dir, mut store) = store_with_snapshot(&snapshot);

        let returned = store.return_book("borrow-1").unwrap();
        assert_eq!(returned.fine_amount, 0.0);
        // Only the fixture's fine-1 exists
        assert_eq!(store.snapshot().fines.len(), 1);
    }

    #[test]
    fn test_return_updates_existing_pending_fine_instead_of_duplicating() {
        // borrow-2 already has pending fine-1 from the fixture
        let (_dir, mut store) = seeded_store();

        let returned = store.return_book("borrow-2").unwrap();
        assert!(returned.fine_amount > 0.0);

        let snapshot = store.snapshot();
        let fines: Vec<_> = snapshot
            .fines
            .iter()
            .filter(|f| f.borrow_record_id == "borrow-2")
            .collect();
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].id, "fine-1");
        assert_eq!(fines[0].amount, returned.fine_amount);
        assert_eq!(fines[0].status, FineStatus::Pending);
    }

    // ===== Renewal =====

    #[test]
    fn test_renew_extends_from_prior_due_date() {
        let (_dir, mut store) = seeded_store();

        let before = store.snapshot().borrow_record("borrow-1").unwrap().clone();
        let renewed = store.renew_book("borrow-1").unwrap();

        assert_eq!(renewed.due_date, before.due_date + Duration::days(14));
        assert_eq!(renewed.renewals, before.renewals + 1);
        // Issue date is untouched
        assert_eq!(renewed.issue_date, before.issue_date);
    }

    #[test]
    fn test_renew_stops_at_limit() {
        let (_dir, mut store) = seeded_store();

        // Fixture has borrow-2 at one renewal; the cap is two
        store.renew_book("borrow-2").unwrap();
        let at_cap = store.snapshot().borrow_record("borrow-2").unwrap().clone();

        let result = store.renew_book("borrow-2");
        assert!(matches!(
            result,
            Err(LibraryError::RenewalLimitReached { limit: 2, .. })
        ));

        let after = store.snapshot().borrow_record("borrow-2").unwrap().clone();
        assert_eq!(after, at_cap);
    }

    #[test]
    fn test_renew_rejects_returned_record() {
        let (_dir, mut store) = seeded_store();

        let record = store.issue_book("1", "copy-book-1-0", "book-1").unwrap();
        store.return_book(&record.id).unwrap();

        assert!(matches!(
            store.renew_book(&record.id),
            Err(LibraryError::AlreadyReturned(_))
        ));
    }

    // ===== Reservations =====

    #[test]
    fn test_reserving_last_copy_scenario() {
        let (_dir, mut store) = seeded_store();

        // book-4 has a single available copy in the fixture
        store.issue_book("1", "copy-book-4-0", "book-4").unwrap();
        assert_eq!(store.snapshot().book("book-4").unwrap().available_copies, 0);

        // The store still accepts a hold request for the now-unavailable title
        let reservation = store.create_reservation("2", "book-4").unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert!(store.snapshot().reservation(&reservation.id).is_some());
    }

    #[test]
    fn test_duplicate_reservation_is_rejected() {
        let (_dir, mut store) = seeded_store();

        // reservation-1 is user 3's open hold on book-4
        let result = store.create_reservation("3", "book-4");
        assert!(matches!(
            result,
            Err(LibraryError::DuplicateReservation { .. })
        ));

        let err = store.create_reservation("3", "book-4").unwrap_err();
        assert!(err.is_rule_violation());
        assert!(!err.is_not_found());

        let err = store.create_reservation("3", "book-99").unwrap_err();
        assert!(err.is_not_found());
        assert!(!err.is_storage_error());
    }

    #[test]
    fn test_reservation_notification_lifecycle() {
        let (_dir, mut store) = seeded_store();

        let created = store.create_reservation("2", "book-3").unwrap();
        assert!(created.notified_at.is_none());

        let available = store.mark_reservation_available(&created.id).unwrap();
        assert_eq!(available.status, ReservationStatus::Available);
        assert!(available.notified_at.is_some());

        let fulfilled = store.fulfill_reservation(&created.id).unwrap();
        assert_eq!(fulfilled.status, ReservationStatus::Fulfilled);
        assert_eq!(fulfilled.notified_at, available.notified_at);

        // Terminal: no further transitions
        assert!(matches!(
            store.cancel_reservation(&created.id),
            Err(LibraryError::ReservationClosed { .. })
        ));
        assert!(matches!(
            store.mark_reservation_available(&created.id),
            Err(LibraryError::ReservationClosed { .. })
        ));
    }

    #[test]
    fn test_fulfill_pending_reservation_stamps_notification() {
        let (_dir, mut store) = seeded_store();

        let fulfilled = store.fulfill_reservation("reservation-1").unwrap();
        assert_eq!(fulfilled.status, ReservationStatus::Fulfilled);
        assert!(fulfilled.notified_at.is_some());
    }

    #[test]
    fn test_cancel_reservation() {
        let (_dir, mut store) = seeded_store();

        let cancelled = store.cancel_reservation("reservation-1").unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);

        assert!(matches!(
            store.cancel_reservation("reservation-1"),
            Err(LibraryError::ReservationClosed { .. })
        ));
        assert!(matches!(
            store.cancel_reservation("reservation-99"),
            Err(LibraryError::ReservationNotFound(_))
        ));
    }

    // ===== Fines =====

    #[test]
    fn test_calculate_fines_skips_records_with_pending_fine() {
        let (_dir, mut store) = seeded_store();

        // borrow-2 is overdue but fine-1 already references it
        assert!(store.snapshot().has_pending_fine("borrow-2"));
        store.calculate_fines().unwrap();

        let snapshot = store.snapshot();
        let for_borrow_2: Vec<_> = snapshot
            .fines
            .iter()
            .filter(|f| f.borrow_record_id == "borrow-2")
            .collect();
        assert_eq!(for_borrow_2.len(), 1);
        assert_eq!(for_borrow_2[0].id, "fine-1");
    }

    #[test]
    fn test_calculate_fines_charges_and_promotes_past_due_records() {
        let mut snapshot = seed::demo_snapshot();
        record_mut(&mut snapshot, "borrow-1").due_date = Utc::now() - Duration::days(4);
        let (_dir, mut store) = store_with_snapshot(&snapshot);

        let created = store.calculate_fines().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].borrow_record_id, "borrow-1");
        assert_eq!(created[0].amount, 4.0 * 0.50);
        assert_eq!(created[0].status, FineStatus::Pending);

        let snapshot = store.snapshot();
        let record = snapshot.borrow_record("borrow-1").unwrap();
        assert_eq!(record.status, BorrowStatus::Overdue);
        assert_eq!(record.fine_amount, 2.0);
    }

    #[test]
    fn test_calculate_fines_is_stable_across_repeat_calls() {
        let (_dir, mut store) = seeded_store();

        store.calculate_fines().unwrap();
        let after_first = store.snapshot().fines.len();

        let created = store.calculate_fines().unwrap();
        assert!(created.is_empty());
        assert_eq!(store.snapshot().fines.len(), after_first);
    }

    #[test]
    fn test_pay_fine() {
        let (_dir, mut store) = seeded_store();

        let paid = store.pay_fine("fine-1", "cash").unwrap();
        assert_eq!(paid.status, FineStatus::Paid);
        assert!(paid.paid_at.is_some());
        assert_eq!(paid.payment_method.as_deref(), Some("cash"));

        assert!(matches!(
            store.pay_fine("fine-1", "card"),
            Err(LibraryError::FineAlreadyPaid(_))
        ));
        assert!(matches!(
            store.pay_fine("fine-99", "cash"),
            Err(LibraryError::FineNotFound(_))
        ));
    }

    // ===== Settings =====

    #[test]
    fn test_update_settings_validation() {
        let (_dir, mut store) = seeded_store();

        let mut settings = store.settings().clone();
        settings.borrowing_duration_days = 0;
        assert!(matches!(
            store.update_settings(settings),
            Err(LibraryError::InvalidSettings(_))
        ));

        let mut settings = store.settings().clone();
        settings.fine_per_day = -0.25;
        assert!(matches!(
            store.update_settings(settings),
            Err(LibraryError::InvalidSettings(_))
        ));

        let mut settings = store.settings().clone();
        settings.fine_per_day = 1.0;
        settings.max_renewals = 0;
        store.update_settings(settings).unwrap();
        assert_eq!(store.settings().fine_per_day, 1.0);
        assert_eq!(store.settings().max_renewals, 0);
    }

    #[test]
    fn test_initialize_preserves_settings() {
        let (_dir, mut store) = seeded_store();

        let mut settings = store.settings().clone();
        settings.fine_per_day = 2.0;
        store.update_settings(settings).unwrap();

        // Disturb the collections, then re-seed
        store.pay_fine("fine-1", "cash").unwrap();
        store.initialize().unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.settings.fine_per_day, 2.0);
        assert_eq!(snapshot.fine("fine-1").unwrap().status, FineStatus::Pending);
        assert_eq!(snapshot.books.len(), 6);
    }

    // ===== Snapshot & Persistence =====

    #[test]
    fn test_published_snapshots_are_immutable() {
        let (_dir, mut store) = seeded_store();

        let before = store.snapshot();
        store.issue_book("1", "copy-book-1-0", "book-1").unwrap();

        // The handle taken before the mutation still sees the old state
        assert_eq!(before.book("book-1").unwrap().available_copies, 3);
        assert_eq!(store.snapshot().book("book-1").unwrap().available_copies, 2);
    }

    #[test]
    fn test_snapshot_round_trips_through_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = open_store(&dir);
        store.initialize().unwrap();
        store.issue_book("1", "copy-book-1-0", "book-1").unwrap();
        store.calculate_fines().unwrap();
        let before = store.snapshot();
        drop(store);

        let reopened = open_store(&dir);
        assert_eq!(*reopened.snapshot(), *before);
    }

    #[test]
    fn test_open_without_blob_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let snapshot = store.snapshot();
        assert!(snapshot.books.is_empty());
        assert_eq!(snapshot.settings, LibrarySettings::default());
    }

    // ===== Statistics =====

    #[test]
    fn test_stats_on_fixture() {
        let (_dir, mut store) = seeded_store();

        let stats = store.stats();
        assert_eq!(stats.total_books, 6);
        assert_eq!(stats.total_copies, 30);
        assert_eq!(stats.available_copies, 17);
        assert_eq!(stats.active_borrows, 1);
        // borrow-2 is stored overdue; borrow-1 is active past its 2024 due date
        assert_eq!(stats.overdue_borrows, 2);
        assert_eq!(stats.pending_reservations, 1);
        assert_eq!(stats.pending_fine_total, 7.5);
        assert_eq!(stats.returned_today, 0);

        store.issue_book("1", "copy-book-1-0", "book-1").unwrap();
        assert_eq!(store.stats().issued_today, 1);
    }

    #[test]
    fn test_member_stats() {
        let (_dir, mut store) = seeded_store();

        // borrow-1 is active past due, borrow-2 is stored overdue
        let stats = store.member_stats("3");
        assert_eq!(stats.active_borrows, 1);
        assert_eq!(stats.overdue_borrows, 2);
        assert_eq!(stats.pending_fine_total, 7.5);
        assert_eq!(stats.open_reservations, 1);
        assert_eq!(stats.due_soon, 0);

        // A fresh loan due in 14 days is not "due soon"
        let record = store.issue_book("1", "copy-book-1-0", "book-1").unwrap();
        let stats = store.member_stats("1");
        assert_eq!(stats.active_borrows, 1);
        assert_eq!(stats.due_soon, 0);
        assert_eq!(stats.pending_fine_total, 0.0);

        store.return_book(&record.id).unwrap();
        assert_eq!(store.member_stats("1").active_borrows, 0);
    }

    #[test]
    fn test_member_stats_due_soon_window() {
        let mut snapshot = seed::demo_snapshot();
        record_mut(&mut snapshot, "borrow-1").due_date = Utc::now() + Duration::days(2);
        let (_dir, store) = store_with_snapshot(&snapshot);

        assert_eq!(store.member_stats("3").due_soon, 1);
    }
}
