pub mod embeds;
pub mod permissions;
pub mod text;
pub mod time;
