use std::io::Write;

use super::{CommandError, State};
use crate::storage::User;
use crate::util::validate_feed_url;

/// Create a feed owned by `user` and follow it.
pub(super) async fn add<W: Write>(
    state: &State,
    user: &User,
    name: &str,
    url: &str,
    out: &mut W,
) -> Result<(), CommandError> {
    let url = validate_feed_url(url)?;

    let feed = state.db.create_feed(name, url.as_str(), user.id).await?;
    tracing::info!(feed_id = feed.id, url = %feed.url, user = %user.name, "Feed added");

    let follow = state.db.create_feed_follow(user.id, feed.id).await?;

    writeln!(
        out,
        "{} created a feed with name: {}, url: {}",
        user.name, feed.name, feed.url
    )?;
    writeln!(out, "{} now follows {}", follow.user_name, follow.feed_name)?;
    Ok(())
}

pub(super) async fn list<W: Write>(state: &State, out: &mut W) -> Result<(), CommandError> {
    for (feed, owner) in state.db.list_feeds().await? {
        writeln!(out, "* {}\t{}\t{}", feed.name, feed.url, owner)?;
    }
    Ok(())
}

pub(super) async fn follow<W: Write>(
    state: &State,
    user: &User,
    url: &str,
    out: &mut W,
) -> Result<(), CommandError> {
    let url = validate_feed_url(url)?;
    let feed = state.db.get_feed_by_url(url.as_str()).await?;
    let follow = state.db.create_feed_follow(user.id, feed.id).await?;

    writeln!(out, "{} now follows {}", follow.user_name, follow.feed_name)?;
    Ok(())
}

pub(super) async fn following<W: Write>(
    state: &State,
    user: &User,
    out: &mut W,
) -> Result<(), CommandError> {
    let follows = state.db.get_feed_follows_for_user(user.id).await?;

    writeln!(out, "* {}:", user.name)?;
    for follow in follows {
        writeln!(out, " * {}", follow.feed_name)?;
    }
    Ok(())
}

pub(super) async fn unfollow<W: Write>(
    state: &State,
    user: &User,
    url: &str,
    out: &mut W,
) -> Result<(), CommandError> {
    let url = validate_feed_url(url)?;
    state.db.delete_feed_follow(user.id, url.as_str()).await?;

    writeln!(out, "{} unfollowed {}", user.name, url)?;
    Ok(())
}
