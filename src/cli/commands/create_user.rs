//! Create-user command handler

use crate::config::Config;
use crate::models::NewUser;
use crate::state::SharedState;

pub async fn cmd_create_user(
    config: Config,
    email: &str,
    password: &str,
    username: &str,
    superuser: bool,
) -> anyhow::Result<()> {
    let shared = SharedState::with_email_verifier(config, None).await?;
    let auth = &shared.auth_service;

    let user = if superuser {
        auth.create_first_superuser(email, password, username).await?
    } else {
        Some(
            auth.register(NewUser {
                email: email.to_string(),
                password: password.to_string(),
                username: username.to_string(),
                is_superuser: false,
            })
            .await?,
        )
    };

    match user {
        Some(user) => {
            println!("Created user {} <{}> (id {})", user.username, user.email, user.id);
            if user.is_superuser {
                println!("  superuser: yes");
            }
        }
        None => println!("A user with email {email} already exists."),
    }

    Ok(())
}
