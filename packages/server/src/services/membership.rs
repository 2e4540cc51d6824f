use crate::entity::{Trackable, User};
use crate::error::AppError;
use crate::following::{FollowingEngine, FollowingState};
use crate::models::MembershipAction;

/// Authorize a membership mutation and resolve its target user.
///
/// Follow actions apply to the requester only. Assign actions on a non-self
/// target require the requester to be the entity's creator.
fn resolve_target(
    action: MembershipAction,
    requester: &User,
    creator_id: i32,
    target: Option<i32>,
) -> Result<i32, AppError> {
    let target = target.unwrap_or(requester.id);
    if target == requester.id {
        return Ok(target);
    }
    match action {
        MembershipAction::Follow | MembershipAction::Unfollow => Err(AppError::PermissionDenied),
        MembershipAction::Assign | MembershipAction::Unassign => {
            if requester.id == creator_id {
                Ok(target)
            } else {
                Err(AppError::PermissionDenied)
            }
        }
    }
}

/// Shared membership mutation path for all trackable families.
///
/// Unfollow/unassign of a pair that never existed is treated as idempotent
/// success: the engine reports the absence and we return the (cleared) state
/// rather than a 404-style error.
pub(crate) async fn mutate<T: Trackable>(
    engine: &FollowingEngine,
    entity: &T,
    requester: Option<&User>,
    action: MembershipAction,
    target: Option<i32>,
) -> Result<FollowingState, AppError> {
    let requester = requester.ok_or(AppError::PermissionDenied)?;
    let target = resolve_target(action, requester, entity.creator_id(), target)?;

    match action {
        MembershipAction::Follow => engine.follow(entity, target).await,
        MembershipAction::Unfollow => engine.unfollow(entity, target).await,
        MembershipAction::Assign => engine.assign(entity, target).await,
        MembershipAction::Unassign => engine.unassign(entity, target).await,
    }
}
