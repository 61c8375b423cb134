pub mod auth;
pub mod moderation;
pub mod publication;
