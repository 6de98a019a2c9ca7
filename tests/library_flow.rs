//! Integration test for the library and auth stores
//!
//! Drives a complete session the way the dashboard would: open both stores
//! against one blob directory, seed the demo data, sign in, walk a book
//! through issue / renew / return, take a reservation through its lifecycle,
//! settle a fine, and confirm everything survives a restart.

use libradesk_core::{
    AuthStore, BlobStore, BorrowStatus, CopyStatus, FineStatus, LibraryStore, ReservationStatus,
};

#[test]
fn test_full_session_flow() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let blobs = BlobStore::new(dir.path())?;

    let mut library = LibraryStore::open(blobs.clone())?;
    let mut auth = AuthStore::open(blobs.clone())?;

    // First launch: nothing on disk yet
    assert!(library.snapshot().books.is_empty());
    library.initialize()?;
    assert_eq!(library.snapshot().books.len(), 6);

    // Sign in as the librarian
    let librarian = auth.login("librarian@library.com", "password")?;
    assert!(auth.is_authenticated());

    // Walk a loan through its lifecycle
    let record = library.issue_book(&librarian.id, "copy-book-3-0", "book-3")?;
    assert_eq!(record.status, BorrowStatus::Active);
    assert_eq!(library.snapshot().book("book-3").unwrap().available_copies, 3);

    let renewed = library.renew_book(&record.id)?;
    assert_eq!(renewed.renewals, 1);

    let returned = library.return_book(&record.id)?;
    assert_eq!(returned.status, BorrowStatus::Returned);
    assert_eq!(returned.fine_amount, 0.0);
    assert_eq!(library.snapshot().book("book-3").unwrap().available_copies, 4);
    assert_eq!(
        library.snapshot().copy("copy-book-3-0").unwrap().status,
        CopyStatus::Available
    );

    // Reservation lifecycle on the fixture's held title
    let reservation = library.snapshot().reservation("reservation-1").unwrap().clone();
    assert_eq!(reservation.status, ReservationStatus::Pending);
    library.mark_reservation_available("reservation-1")?;
    let fulfilled = library.fulfill_reservation("reservation-1")?;
    assert_eq!(fulfilled.status, ReservationStatus::Fulfilled);
    assert!(fulfilled.notified_at.is_some());

    // Recompute fines, then settle the student's balance
    library.calculate_fines()?;
    let pending: Vec<_> = library
        .snapshot()
        .fines
        .iter()
        .filter(|f| f.status == FineStatus::Pending)
        .map(|f| f.id.clone())
        .collect();
    assert!(!pending.is_empty());
    for fine_id in pending {
        library.pay_fine(&fine_id, "cash")?;
    }
    assert_eq!(library.stats().pending_fine_total, 0.0);

    // Restart: both stores come back exactly as left
    let snapshot_before = library.snapshot();
    drop(library);
    drop(auth);

    let library = LibraryStore::open(blobs.clone())?;
    let auth = AuthStore::open(blobs)?;
    assert_eq!(*library.snapshot(), *snapshot_before);
    assert!(auth.is_authenticated());
    assert_eq!(auth.current_user().unwrap().id, librarian.id);

    Ok(())
}
