pub mod comments;
pub mod posts;
pub mod response;
pub mod users;
