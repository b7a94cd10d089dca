use chrono::{DateTime, Utc};

use claimflow_core::domain::user::{Role, User, UserId};

/// Reference accounts used by demos and scenario tests, one per role.
/// Credentials belong to the account service and are not part of the fixture.
const DEMO_USERS: &[(u64, &str, &str, &str, Role)] = &[
    (1, "John", "Doe", "JDlecturer@work.com", Role::Lecturer),
    (2, "Sarah", "Kyle", "SKcoordinator@work.com", Role::ProgrammeCoordinator),
    (3, "Adam", "Sandler", "ASadmin@work.com", Role::Administrator),
    (4, "Jenny", "Mace", "JMhr@work.com", Role::Hr),
];

pub fn demo_users(created_at: DateTime<Utc>) -> Vec<User> {
    DEMO_USERS
        .iter()
        .map(|(id, first_name, last_name, email, role)| User {
            id: UserId(*id),
            first_name: (*first_name).to_string(),
            last_name: (*last_name).to_string(),
            email: (*email).to_string(),
            role: *role,
            created_at,
        })
        .collect()
}

pub fn demo_user(role: Role, created_at: DateTime<Utc>) -> Option<User> {
    demo_users(created_at).into_iter().find(|user| user.role == role)
}
