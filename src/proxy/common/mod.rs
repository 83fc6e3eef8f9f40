// Common building blocks of the relay pipeline

pub mod limiter;
pub mod scheme;
pub mod validator;

pub use limiter::{collect_limited, declared_length, LimitedStream, SizeLimit};
pub use scheme::should_proxy;
pub use validator::{url_scheme, validate_url};
