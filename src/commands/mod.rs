pub mod background_commands;
pub mod content_commands;
pub mod popup_commands;
