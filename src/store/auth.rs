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


//! Auth state store
//!
//! Demo-grade authentication: the account set is the fixed seeded trio and a
//! single shared password unlocks every account. [`AuthStore`] holds at most
//! one signed-in identity plus a session token, persisted to its own blob so
//! the session survives a restart. It knows nothing about the library
//! collections; the library store references users by id only.

use crate::error::{LibraryError, Result};
use crate::seed;
use crate::storage::blob::BlobStore;
use crate::storage::models::{AuthSession, User};
use tracing::{debug, info, warn};

/// Blob key for the persisted session
pub const AUTH_BLOB_KEY: &str = "auth-storage";

/// The single password accepted for every demo account
const DEMO_PASSWORD: &str = "password";

/// Session store for the demo accounts
pub struct AuthStore {
    blobs: BlobStore,
    users: Vec<User>,
    session: AuthSession,
}

impl AuthStore {
    /// Open the store, restoring a persisted session if one exists
    pub fn open(blobs: BlobStore) -> Result<Self> {
        let session = blobs
            .load::<AuthSession>(AUTH_BLOB_KEY)?
            .unwrap_or_default();
        if let Some(user) = &session.user {
            debug!(email = %user.email, "restored session");
        }

        Ok(Self {
            blobs,
            users: seed::demo_users(),
            session,
        })
    }

    /// Sign in with a seeded account
    ///
    /// The email must match a demo account exactly and the password must be
    /// the shared demo password. On success the identity and a fresh session
    /// token are stored and persisted; on failure nothing changes.
    pub fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let user = self
            .users
            .iter()
            .find(|u| u.email == email)
            .filter(|_| password == DEMO_PASSWORD)
            .cloned();

        let Some(user) = user else {
            warn!(email, "login rejected");
            return Err(LibraryError::InvalidCredentials);
        };

        let token_bytes: [u8; 16] = rand::random();
        let session = AuthSession {
            user: Some(user.clone()),
            token: Some(format!("mock-token-{}", hex::encode(token_bytes))),
        };
        self.blobs.save(AUTH_BLOB_KEY, &session)?;
        self.session = session;

        info!(email = %user.email, role = user.role.as_str(), "login succeeded");
        Ok(user)
    }

    /// Clear the signed-in identity and token
    pub fn logout(&mut self) -> Result<()> {
        let session = AuthSession::default();
        self.blobs.save(AUTH_BLOB_KEY, &session)?;
        self.session = session;

        info!("logged out");
        Ok(())
    }

    /// True iff both an identity and a session token are present
    pub fn is_authenticated(&self) -> bool {
        self.session.user.is_some() && self.session.token.is_some()
    }

    /// The signed-in user, if any
    pub fn current_user(&self) -> Option<&User> {
        self.session.user.as_ref()
    }

    /// The current session token, if any
    pub fn token(&self) -> Option<&str> {
        self.session.token.as_deref()
    }

    /// The fixed demo account set
    pub fn users(&self) -> &[User] {
        &self.users
    }
}
