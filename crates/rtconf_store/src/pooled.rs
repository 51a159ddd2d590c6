//! Scoped client borrowing.

use crate::backend::{ClientPool, Collection, StoreClient};
use crate::error::{StoreError, StoreResult};
use std::fmt;
use std::ops::Deref;

/// A client borrowed from a [`ClientPool`] for the duration of one operation.
///
/// The client goes back to the pool when the guard is dropped, so every
/// exit path of the borrowing function (early `?` returns included)
/// releases it exactly once.
///
/// # Example
///
/// ```rust
/// use rtconf_store::{InMemoryPool, PooledClient};
///
/// let pool = InMemoryPool::new();
/// {
///     let client = PooledClient::borrow(&pool).unwrap();
///     let _users = client.collection("asterisk", "ps_endpoints").unwrap();
/// }
/// assert_eq!(pool.checkouts(), 1);
/// assert_eq!(pool.checkins(), 1);
/// ```
pub struct PooledClient<'a> {
    pool: &'a dyn ClientPool,
    client: Option<Box<dyn StoreClient>>,
}

impl<'a> PooledClient<'a> {
    /// Checks a client out of `pool`.
    ///
    /// # Errors
    ///
    /// Returns the pool's error when no client is available.
    pub fn borrow(pool: &'a dyn ClientPool) -> StoreResult<Self> {
        let client = pool.checkout()?;
        Ok(Self {
            pool,
            client: Some(client),
        })
    }
}

impl Deref for PooledClient<'_> {
    type Target = dyn StoreClient;

    fn deref(&self) -> &Self::Target {
        match self.client.as_deref() {
            Some(client) => client,
            None => &DETACHED,
        }
    }
}

impl Drop for PooledClient<'_> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.checkin(client);
        }
    }
}

impl fmt::Debug for PooledClient<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledClient")
            .field("attached", &self.client.is_some())
            .finish()
    }
}

/// Stand-in served once the real client has been returned.
struct Detached;

static DETACHED: Detached = Detached;

impl StoreClient for Detached {
    fn collection(&self, _database: &str, _name: &str) -> StoreResult<Box<dyn Collection + '_>> {
        Err(StoreError::ClientUnavailable(
            "client already returned to the pool".to_string(),
        ))
    }
}
