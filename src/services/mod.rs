pub mod overlay_service;
pub mod render_service;
pub mod search_service;
pub mod tab_service;
