//! Target resolver: maps a rule's target to the device tokens to notify.

use alerthub_domain::rule::Target;
use alerthub_domain::user::DeviceToken;

use crate::ports::UserDirectory;

/// Resolves rule targets through the user directory.
pub struct TargetResolver<UD> {
    users: UD,
}

impl<UD: UserDirectory> TargetResolver<UD> {
    /// Create a new resolver backed by the given user directory.
    pub fn new(users: UD) -> Self {
        Self { users }
    }

    /// Device tokens registered for `target`.
    ///
    /// Never fails: a missing target, an unknown user, a user without
    /// tokens and a lookup error all resolve to an empty list. Lookup
    /// errors are logged.
    #[tracing::instrument(skip_all, fields(target = ?target.map(ToString::to_string)))]
    pub async fn resolve(&self, target: Option<&Target>) -> Vec<DeviceToken> {
        let Some(target) = target else {
            return Vec::new();
        };
        let lookup = match target {
            Target::Uid(uid) => self.users.get_by_uid(uid).await,
            Target::Email(email) => self.users.find_by_email(email).await,
        };
        match lookup {
            Ok(Some(user)) => user.usable_tokens(),
            Ok(None) => {
                tracing::debug!("no user matches target");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(%err, "user lookup failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryUsers;
    use alerthub_domain::id::UserId;
    use alerthub_domain::user::UserRecord;

    fn directory() -> InMemoryUsers {
        InMemoryUsers::with(vec![
            UserRecord::new("u1")
                .with_email("one@example.com")
                .with_token("t1")
                .with_token("t1")
                .with_token(""),
            UserRecord::new("u2")
                .with_email("two@example.com")
                .with_token("t2"),
            UserRecord::new("u3").with_email("two@example.com").with_token("t3"),
            UserRecord::new("u4"),
        ])
    }

    #[tokio::test]
    async fn should_resolve_tokens_by_uid() {
        let resolver = TargetResolver::new(directory());
        let tokens = resolver
            .resolve(Some(&Target::Uid(UserId::new("u1"))))
            .await;
        assert_eq!(tokens, vec![DeviceToken::new("t1")]);
    }

    #[tokio::test]
    async fn should_resolve_first_user_matching_email() {
        let resolver = TargetResolver::new(directory());
        let tokens = resolver
            .resolve(Some(&Target::Email("two@example.com".to_string())))
            .await;
        assert_eq!(tokens, vec![DeviceToken::new("t2")]);
    }

    #[tokio::test]
    async fn should_return_empty_when_target_absent() {
        let resolver = TargetResolver::new(directory());
        assert!(resolver.resolve(None).await.is_empty());
    }

    #[tokio::test]
    async fn should_return_empty_when_user_unknown_or_without_tokens() {
        let resolver = TargetResolver::new(directory());
        assert!(
            resolver
                .resolve(Some(&Target::Uid(UserId::new("nobody"))))
                .await
                .is_empty()
        );
        assert!(
            resolver
                .resolve(Some(&Target::Uid(UserId::new("u4"))))
                .await
                .is_empty()
        );
    }

    #[tokio::test]
    async fn should_return_empty_when_lookup_fails() {
        let users = directory();
        users.fail(true);
        let resolver = TargetResolver::new(users);
        assert!(
            resolver
                .resolve(Some(&Target::Uid(UserId::new("u1"))))
                .await
                .is_empty()
        );
    }
}
