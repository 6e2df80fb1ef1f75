//! Seed command handler

use tracing::{info, warn};

use crate::config::Config;
use crate::models::{NewUser, Role};
use crate::services::{AuthError, AuthService};
use crate::state::SharedState;

/// (email, username, password, superuser, role)
pub const DEMO_ACCOUNTS: [(&str, &str, &str, bool, Role); 3] = [
    ("admin@example.com", "admin", "admin123", true, Role::Admin),
    ("user1@example.com", "user1", "user123", false, Role::Client),
    ("user2@example.com", "user2", "user123", false, Role::Client),
];

pub async fn cmd_seed(config: Config) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let created = seed_accounts(state.auth_service.as_ref()).await?;

    println!(
        "Seeding complete: {created} created, {} already present",
        DEMO_ACCOUNTS.len() - created
    );
    Ok(())
}

/// Creates the demo accounts, skipping any whose email or username is
/// already taken. Returns how many were created.
pub async fn seed_accounts(auth: &dyn AuthService) -> anyhow::Result<usize> {
    let mut created = 0;

    for (email, username, password, is_superuser, role) in DEMO_ACCOUNTS {
        let user = NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            is_superuser,
            role,
        };

        match auth.create_user(user).await {
            Ok(user) => {
                info!(user_id = user.id, username, "Seeded account");
                created += 1;
            }
            Err(AuthError::Conflict(field)) => {
                warn!(username, field = %field, "Account already exists, skipping");
            }
            Err(e) => return Err(anyhow::anyhow!("Failed to seed {username}: {e}")),
        }
    }

    Ok(created)
}
