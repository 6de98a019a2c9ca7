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


//! Deterministic demo fixture
//!
//! Hand-authored seed data for demos and tests: six catalog titles, one copy
//! per unit of `total_copies`, two borrow records, one reservation, one fine,
//! and the three demo user accounts. Pure functions of no inputs: the same
//! snapshot comes back on every call, with fixed identifiers (`book-1`…
//! `book-6`, `borrow-1`, `borrow-2`, `reservation-1`, `fine-1`) that demos
//! can reference directly.

use crate::storage::models::{
    Book, BookCopy, BorrowRecord, BorrowStatus, CopyCondition, CopyStatus, Fine, FineStatus,
    LibrarySnapshot, Reservation, ReservationStatus, User, UserRole,
};
use chrono::{DateTime, TimeZone, Utc};

/// Fixture timestamp at 10:00 UTC on the given day
fn ts(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 10, 0, 0)
        .single()
        .expect("fixture timestamp is valid")
}

struct BookSeed {
    id: &'static str,
    title: &'static str,
    author: &'static str,
    isbn: &'static str,
    category: &'static str,
    description: &'static str,
    publisher: &'static str,
    edition: &'static str,
    publication_year: i32,
    rack_location: &'static str,
    total_copies: u32,
    available_copies: u32,
    created_at: DateTime<Utc>,
}

fn book_seeds() -> Vec<BookSeed> {
    vec![
        BookSeed {
            id: "book-1",
            title: "The Great Gatsby",
            author: "F. Scott Fitzgerald",
            isbn: "978-0-7432-7356-5",
            category: "Fiction",
            description: "A classic American novel about the Jazz Age.",
            publisher: "Scribner",
            edition: "1st",
            publication_year: 1925,
            rack_location: "A-101",
            total_copies: 5,
            available_copies: 3,
            created_at: ts(2024, 1, 15),
        },
        BookSeed {
            id: "book-2",
            title: "To Kill a Mockingbird",
            author: "Harper Lee",
            isbn: "978-0-06-112008-4",
            category: "Fiction",
            description: "A gripping tale of racial injustice and childhood innocence.",
            publisher: "HarperCollins",
            edition: "50th Anniversary",
            publication_year: 1960,
            rack_location: "A-102",
            total_copies: 4,
            available_copies: 2,
            created_at: ts(2024, 1, 16),
        },
        BookSeed {
            id: "book-3",
            title: "1984",
            author: "George Orwell",
            isbn: "978-0-452-28423-4",
            category: "Dystopian Fiction",
            description: "A dystopian social science fiction novel.",
            publisher: "Signet Classic",
            edition: "Reprint",
            publication_year: 1949,
            rack_location: "B-201",
            total_copies: 6,
            available_copies: 4,
            created_at: ts(2024, 1, 17),
        },
        BookSeed {
            id: "book-4",
            title: "Pride and Prejudice",
            author: "Jane Austen",
            isbn: "978-0-14-143951-8",
            category: "Romance",
            description: "A romantic novel of manners.",
            publisher: "Penguin Classics",
            edition: "Revised",
            publication_year: 1813,
            rack_location: "A-103",
            total_copies: 3,
            available_copies: 1,
            created_at: ts(2024, 1, 18),
        },
        BookSeed {
            id: "book-5",
            title: "The Catcher in the Rye",
            author: "J.D. Salinger",
            isbn: "978-0-316-76948-0",
            category: "Fiction",
            description: "A controversial novel about teenage rebellion.",
            publisher: "Little, Brown and Company",
            edition: "1st",
            publication_year: 1951,
            rack_location: "A-104",
            total_copies: 4,
            available_copies: 2,
            created_at: ts(2024, 1, 19),
        },
        BookSeed {
            id: "book-6",
            title: "Introduction to Algorithms",
            author: "Thomas H. Cormen",
            isbn: "978-0-262-03384-8",
            category: "Computer Science",
            description: "Comprehensive guide to algorithms and data structures.",
            publisher: "MIT Press",
            edition: "4th",
            publication_year: 2022,
            rack_location: "C-301",
            total_copies: 8,
            available_copies: 5,
            created_at: ts(2024, 1, 20),
        },
    ]
}

/// Build the demo library snapshot with default settings
///
/// Copies beyond each book's `available_copies` are marked `Borrowed`; the
/// two borrow records reference copies from that borrowed tail, so the
/// snapshot is internally consistent. Conditions cycle excellent / good /
/// fair / poor across each book's copies.
pub fn demo_snapshot() -> LibrarySnapshot {
    let seeds = book_seeds();

    let books: Vec<Book> = seeds
        .iter()
        .map(|s| Book {
            id: s.id.to_string(),
            title: s.title.to_string(),
            author: s.author.to_string(),
            isbn: s.isbn.to_string(),
            category: s.category.to_string(),
            description: Some(s.description.to_string()),
            publisher: Some(s.publisher.to_string()),
            edition: Some(s.edition.to_string()),
            language: "English".to_string(),
            publication_year: Some(s.publication_year),
            rack_location: Some(s.rack_location.to_string()),
            total_copies: s.total_copies,
            available_copies: s.available_copies,
            created_at: s.created_at,
        })
        .collect();

    let mut book_copies = Vec::new();
    for s in &seeds {
        for i in 0..s.total_copies {
            let is_borrowed = i >= s.available_copies;
            book_copies.push(BookCopy {
                id: format!("copy-{}-{}", s.id, i),
                book_id: s.id.to_string(),
                copy_number: format!("COPY-{:03}", i + 1),
                status: if is_borrowed {
                    CopyStatus::Borrowed
                } else {
                    CopyStatus::Available
                },
                condition: match i % 4 {
                    0 => CopyCondition::Excellent,
                    1 => CopyCondition::Good,
                    2 => CopyCondition::Fair,
                    _ => CopyCondition::Poor,
                },
                created_at: s.created_at,
            });
        }
    }

    let borrow_records = vec![
        BorrowRecord {
            id: "borrow-1".to_string(),
            user_id: "3".to_string(),
            book_copy_id: "copy-book-1-3".to_string(),
            book_id: "book-1".to_string(),
            issue_date: ts(2024, 11, 20),
            due_date: ts(2024, 12, 4),
            return_date: None,
            status: BorrowStatus::Active,
            fine_amount: 0.0,
            renewals: 0,
        },
        BorrowRecord {
            id: "borrow-2".to_string(),
            user_id: "3".to_string(),
            book_copy_id: "copy-book-2-2".to_string(),
            book_id: "book-2".to_string(),
            issue_date: ts(2024, 11, 15),
            due_date: ts(2024, 11, 29),
            return_date: None,
            status: BorrowStatus::Overdue,
            fine_amount: 7.5,
            renewals: 1,
        },
    ];

    let reservations = vec![Reservation {
        id: "reservation-1".to_string(),
        user_id: "3".to_string(),
        book_id: "book-4".to_string(),
        requested_date: ts(2024, 11, 25),
        status: ReservationStatus::Pending,
        notified_at: None,
    }];

    let fines = vec![Fine {
        id: "fine-1".to_string(),
        user_id: "3".to_string(),
        borrow_record_id: "borrow-2".to_string(),
        amount: 7.5,
        reason: "Overdue by 15 days".to_string(),
        status: FineStatus::Pending,
        paid_at: None,
        payment_method: None,
    }];

    LibrarySnapshot {
        books,
        book_copies,
        borrow_records,
        reservations,
        fines,
        settings: Default::default(),
    }
}

/// The three fixed demo accounts (admin, librarian, student)
pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: "1".to_string(),
            email: "admin@library.com".to_string(),
            name: "Admin User".to_string(),
            role: UserRole::Admin,
            phone: Some("+1234567890".to_string()),
            address: None,
            created_at: ts(2024, 1, 1),
        },
        User {
            id: "2".to_string(),
            email: "librarian@library.com".to_string(),
            name: "Librarian User".to_string(),
            role: UserRole::Librarian,
            phone: Some("+1234567891".to_string()),
            address: None,
            created_at: ts(2024, 1, 1),
        },
        User {
            id: "3".to_string(),
            email: "student@library.com".to_string(),
            name: "Student User".to_string(),
            role: UserRole::Student,
            phone: Some("+1234567892".to_string()),
            address: None,
            created_at: ts(2024, 1, 1),
        },
    ]
}
