use std::io::Write;

use super::{CommandError, State};
use crate::storage::StoreError;

pub(super) async fn register<W: Write>(
    state: &mut State,
    name: &str,
    out: &mut W,
) -> Result<(), CommandError> {
    let user = match state.db.create_user(name).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Err(CommandError::AlreadyRegistered(name.into())),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, name = %user.name, "User registered");
    writeln!(
        out,
        "User {} created at {} with ID: {}",
        user.name,
        user.created_at.format("%Y-%m-%d %H:%M:%S"),
        user.id
    )?;

    login(state, name, out).await
}

pub(super) async fn login<W: Write>(
    state: &mut State,
    name: &str,
    out: &mut W,
) -> Result<(), CommandError> {
    match state.db.get_user(name).await {
        Ok(_) => {}
        Err(StoreError::NotFound(_)) => return Err(CommandError::UnknownUser(name.into())),
        Err(e) => return Err(e.into()),
    }

    let path = state.config_path.clone();
    state.config.set_user(name, &path)?;

    writeln!(out, "The user {} has been set", name)?;
    Ok(())
}

pub(super) async fn reset<W: Write>(state: &mut State, out: &mut W) -> Result<(), CommandError> {
    let (users, feeds) = state.db.reset().await?;
    tracing::info!(users, feeds, "Database reset");

    writeln!(out, "Deleted {} users and {} feeds.", users, feeds)?;
    Ok(())
}

pub(super) async fn list<W: Write>(state: &State, out: &mut W) -> Result<(), CommandError> {
    let current = state.config.current_user_name.as_deref();

    for user in state.db.list_users().await? {
        if current == Some(user.name.as_str()) {
            writeln!(out, "* {} (current)", user.name)?;
        } else {
            writeln!(out, "* {}", user.name)?;
        }
    }
    Ok(())
}
