pub mod metrics;
pub mod proxy;
pub mod request;
pub mod response;
pub mod validation;

pub use metrics::*;
pub use proxy::*;
pub use request::*;
pub use response::*;
pub use validation::*;
