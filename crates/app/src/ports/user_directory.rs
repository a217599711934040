//! User directory port: lookup of users and their device tokens.

use std::future::Future;

use alerthub_domain::error::HubError;
use alerthub_domain::id::UserId;
use alerthub_domain::user::UserRecord;

/// Read-only access to user records.
pub trait UserDirectory {
    /// Look up a user by uid.
    fn get_by_uid(
        &self,
        uid: &UserId,
    ) -> impl Future<Output = Result<Option<UserRecord>, HubError>> + Send;

    /// Look up the first user registered with `email`.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, HubError>> + Send;
}

impl<T: UserDirectory + Send + Sync> UserDirectory for std::sync::Arc<T> {
    fn get_by_uid(
        &self,
        uid: &UserId,
    ) -> impl Future<Output = Result<Option<UserRecord>, HubError>> + Send {
        (**self).get_by_uid(uid)
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, HubError>> + Send {
        (**self).find_by_email(email)
    }
}
