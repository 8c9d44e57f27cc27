//! People and the explicit caller context used by mutating services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable person identifier.
pub type PersonId = Uuid;

/// Organization member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub uuid: PersonId,
    pub display_name: String,
    pub email: Option<String>,
    /// Admins may drive any meeting, not only the ones they facilitate.
    pub is_admin: bool,
}

/// Caller identity passed into every mutating operation.
///
/// Services never look up a "current user" themselves; callers construct an
/// `Actor` from their own session and hand it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub person_uuid: PersonId,
    pub is_admin: bool,
}

impl Actor {
    /// Regular participant without elevated rights.
    pub fn member(person_uuid: PersonId) -> Self {
        Self {
            person_uuid,
            is_admin: false,
        }
    }

    pub fn admin(person_uuid: PersonId) -> Self {
        Self {
            person_uuid,
            is_admin: true,
        }
    }

    /// Returns whether this actor may drive a meeting facilitated by
    /// `facilitator`.
    pub fn can_facilitate(&self, facilitator: Option<PersonId>) -> bool {
        self.is_admin || facilitator == Some(self.person_uuid)
    }
}

impl From<&Person> for Actor {
    fn from(person: &Person) -> Self {
        Self {
            person_uuid: person.uuid,
            is_admin: person.is_admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Actor;
    use uuid::Uuid;

    #[test]
    fn only_facilitator_or_admin_can_facilitate() {
        let facilitator = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(Actor::member(facilitator).can_facilitate(Some(facilitator)));
        assert!(!Actor::member(other).can_facilitate(Some(facilitator)));
        assert!(!Actor::member(other).can_facilitate(None));
        assert!(Actor::admin(other).can_facilitate(Some(facilitator)));
        assert!(Actor::admin(other).can_facilitate(None));
    }
}
