mod feeds;
mod follows;
mod posts;
mod schema;
mod store;
mod types;
mod users;

pub use schema::Database;
pub use store::PostStore;
pub use types::{CreatePostOutcome, Feed, FeedFollow, NewPost, Post, StoreError, User};
