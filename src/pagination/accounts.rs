//! Resource account iteration
//!
//! When a datasource lists resource account roles, every collection is read
//! once per account, in list order. The per-account position is an
//! [`AccountCursor`] encoded as a string inside the composite cursor field
//! the wrapped paginator would otherwise use for its own marker:
//! `cursor` for flat entities, `collectionCursor` for member entities.

use crate::cursor::{self, AccountCursor, CompositeCursor};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Temporary credentials for one resource account
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("has_session_token", &self.session_token.is_some())
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Vends credentials for a role in another account
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    /// Assume `role_arn`. Credentials are only used for the current request.
    async fn assume_role(&self, role_arn: &str) -> Result<Credentials>;
}

/// Walks a fixed list of resource account roles
#[derive(Debug, Clone, Copy)]
pub struct AccountIterator<'a> {
    roles: &'a [String],
}

impl<'a> AccountIterator<'a> {
    /// Create an iterator over `roles`, which must not be empty
    pub fn new(roles: &'a [String]) -> Result<Self> {
        if roles.is_empty() {
            return Err(Error::datasource(
                "account iteration requires at least one resource account role",
            ));
        }
        Ok(Self { roles })
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Always false, the constructor rejects an empty role list
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Role ARN for the account the cursor points at
    pub fn role_arn(&self, account: &AccountCursor) -> Result<&'a str> {
        self.roles
            .get(account.offset)
            .map(String::as_str)
            .ok_or_else(|| {
                Error::cursor(format!(
                    "resource account offset {} is out of range for {} configured accounts",
                    account.offset,
                    self.roles.len()
                ))
            })
    }

    /// Decode the account position for a flat entity from the `cursor` field.
    pub fn enter_flat(&self, cursor: Option<&CompositeCursor>) -> Result<AccountCursor> {
        let Some(cursor) = cursor.filter(|c| !c.is_empty()) else {
            return Ok(AccountCursor::default());
        };

        if cursor.collection_id.is_some() || cursor.collection_cursor.is_some() {
            return Err(Error::cursor(
                "cursor carries a collection position for an entity without a parent collection",
            ));
        }

        self.decode(cursor.cursor.as_deref())
    }

    /// Re-encode after the account's page was fetched with `next_marker` as
    /// the vendor's marker for the following page.
    pub fn leave_flat(
        &self,
        account: &AccountCursor,
        next_marker: Option<String>,
    ) -> Result<Option<CompositeCursor>> {
        self.advance(account, next_marker)
            .map(|next| cursor::marshal_string(&next).map(CompositeCursor::with_cursor))
            .transpose()
    }

    /// Decode the account position for a member entity from the
    /// `collectionCursor` field, returning it together with the member
    /// cursor that is local to that account.
    pub fn enter_member(
        &self,
        cursor: Option<CompositeCursor>,
    ) -> Result<(AccountCursor, Option<CompositeCursor>)> {
        let Some(cursor) = cursor.filter(|c| !c.is_empty()) else {
            return Ok((AccountCursor::default(), None));
        };

        let Some(encoded) = cursor.collection_cursor.as_deref() else {
            return Err(Error::cursor(
                "member cursor is missing its resource account position",
            ));
        };
        let account = self.decode(Some(encoded))?;

        let local = CompositeCursor {
            cursor: cursor.cursor,
            collection_id: cursor.collection_id,
            collection_cursor: account.next_marker.clone(),
        };

        Ok((account, (!local.is_empty()).then_some(local)))
    }

    /// Re-encode after the member paginator produced `member_next` for this
    /// account.
    pub fn leave_member(
        &self,
        account: &AccountCursor,
        member_next: Option<CompositeCursor>,
    ) -> Result<Option<CompositeCursor>> {
        match member_next {
            Some(next) => {
                let position = AccountCursor::new(account.offset, next.collection_cursor);
                Ok(Some(CompositeCursor {
                    cursor: next.cursor,
                    collection_id: next.collection_id,
                    collection_cursor: Some(cursor::marshal_string(&position)?),
                }))
            }
            None => self
                .advance(account, None)
                .map(|next| {
                    cursor::marshal_string(&next).map(CompositeCursor::with_collection_cursor)
                })
                .transpose(),
        }
    }

    /// Next account position, or `None` once the last account is drained
    fn advance(&self, account: &AccountCursor, next_marker: Option<String>) -> Option<AccountCursor> {
        match next_marker {
            Some(marker) => Some(AccountCursor::new(account.offset, Some(marker))),
            None if account.offset + 1 < self.roles.len() => {
                debug!(
                    from = account.offset,
                    to = account.offset + 1,
                    "Resource account drained, moving to next account"
                );
                Some(AccountCursor::new(account.offset + 1, None))
            }
            None => None,
        }
    }

    fn decode(&self, encoded: Option<&str>) -> Result<AccountCursor> {
        let account: AccountCursor = match encoded {
            Some(encoded) => cursor::unmarshal(encoded)?.unwrap_or_default(),
            None => AccountCursor::default(),
        };

        if account.offset >= self.roles.len() {
            return Err(Error::cursor(format!(
                "resource account offset {} is out of range for {} configured accounts",
                account.offset,
                self.roles.len()
            )));
        }

        Ok(account)
    }
}
