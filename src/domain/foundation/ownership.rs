//! Ownership trait for user-owned records.
//!
//! Cards and subscriptions both belong to exactly one owner. Handlers use
//! `is_owner` before any mutation or gateway call so that authorization
//! failures never leave partial side effects.

use super::UserId;

/// Trait for aggregates that have a single owner.
pub trait OwnedByUser {
    /// Returns the ID of the user who owns this record.
    fn owner_id(&self) -> &UserId;

    /// Checks if the given user is the owner.
    fn is_owner(&self, user_id: &UserId) -> bool {
        self.owner_id() == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestResource {
        owner: UserId,
    }

    impl OwnedByUser for TestResource {
        fn owner_id(&self) -> &UserId {
            &self.owner
        }
    }

    fn test_user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn is_owner_returns_true_for_owner() {
        let owner = test_user("owner-123");
        let resource = TestResource { owner: owner.clone() };

        assert!(resource.is_owner(&owner));
    }

    #[test]
    fn is_owner_returns_false_for_non_owner() {
        let resource = TestResource {
            owner: test_user("owner-123"),
        };

        assert!(!resource.is_owner(&test_user("other-456")));
    }
}
