pub mod analyze;
pub mod health;
pub mod proxy;
pub mod validate;

pub use analyze::{analyze_handler, compare_handler, content_handler};
pub use health::{health_handler, index_handler};
pub use proxy::proxy_handler;
pub use validate::validate_handler;
