//! Returns admin API authentication library
//!
//! Credential handling for the returns admin backend: the persisted
//! access/renewal pair, credential payload inspection, and the direct auth
//! endpoint calls. Standalone library with no dependency on the client
//! crate, so it can be tested and used independently.
//!
//! Credential flow:
//! 1. `wire::login()` trades username/password for a credential pair
//! 2. Pair stored via `store::TokenStore::set()`
//! 3. Requests attach the access credential while it stays valid
//! 4. On expiry the client calls `wire::renew()` with the renewal credential
//! 5. The fresh access credential is saved via `TokenStore::set()`
//! 6. A failed renewal clears the store via `TokenStore::clear()`

pub mod claims;
pub mod error;
pub mod store;
pub mod wire;

pub use claims::{expiry, is_well_formed};
pub use error::{Error, Result};
pub use store::{StoredCredentials, TokenStore};
pub use wire::{CurrentUser, LoginResponse, RenewalResponse};
