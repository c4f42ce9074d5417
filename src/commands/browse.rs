use std::io::Write;

use super::{CommandError, State};
use crate::storage::User;
use crate::util::truncate_to_width;

/// Longest description shown per post, in terminal columns
const DESCRIPTION_WIDTH: usize = 200;

pub(super) async fn browse<W: Write>(
    state: &State,
    user: &User,
    limit: u32,
    out: &mut W,
) -> Result<(), CommandError> {
    let posts = state
        .db
        .get_posts_for_user(user.id, i64::from(limit))
        .await?;

    if posts.is_empty() {
        writeln!(out, "No posts yet. Follow a feed and run `gator agg`.")?;
        return Ok(());
    }

    for post in posts {
        writeln!(out, "* {}", post.url)?;
        if let Some(title) = &post.title {
            writeln!(out, "\t- title: {}", title)?;
        }
        if let Some(description) = &post.description {
            // Descriptions are often whole article bodies
            let single_line = description.split_whitespace().collect::<Vec<_>>().join(" ");
            writeln!(
                out,
                "\t- description: {}",
                truncate_to_width(&single_line, DESCRIPTION_WIDTH)
            )?;
        }
        if let Some(published) = post.published_at {
            writeln!(out, "\t- published at: {}", published.to_rfc2822())?;
        }
    }
    Ok(())
}
