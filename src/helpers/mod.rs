pub mod handler_404;
pub mod required_json;
