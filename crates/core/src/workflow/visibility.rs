use crate::domain::claim::Claim;
use crate::domain::user::{Identity, Role};

/// Whether a lecturer owns a claim. Claims carry the submitter's display name
/// rather than a user id, so ownership is a case-sensitive substring match on
/// the display name or an exact match on the email. An empty display name
/// owns nothing by name, unlike a bare `contains("")`, which matches every
/// claim.
pub fn is_owned_by(claim: &Claim, identity: &Identity) -> bool {
    let name_matches =
        !identity.display_name.is_empty() && claim.lecturer_name.contains(&identity.display_name);
    name_matches || (!identity.email.is_empty() && claim.lecturer_name == identity.email)
}

/// Lecturers see their own claims; reviewers see every claim.
pub fn is_visible_to(claim: &Claim, identity: &Identity) -> bool {
    match identity.role {
        Role::Lecturer => is_owned_by(claim, identity),
        Role::ProgrammeCoordinator | Role::Administrator | Role::Hr => true,
    }
}

pub fn visible_claims<'a>(claims: &'a [Claim], identity: &Identity) -> Vec<&'a Claim> {
    claims.iter().filter(|claim| is_visible_to(claim, identity)).collect()
}
