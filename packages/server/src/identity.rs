use crate::entity::User;

/// Supplies the current requester to the façade.
///
/// JWT validation happens upstream; by the time the core runs, the requester
/// is either a resolved [`User`] or absent. Scope normalization in the
/// visibility resolver is the single place that interprets absence.
pub trait IdentityContext: Send + Sync {
    fn requester(&self) -> Option<&User>;

    fn is_admin(&self) -> bool {
        self.requester().is_some_and(User::is_admin)
    }
}

/// Fixed identity, used by tests and single-shot callers.
pub struct FixedIdentity(pub Option<User>);

impl IdentityContext for FixedIdentity {
    fn requester(&self) -> Option<&User> {
        self.0.as_ref()
    }
}
