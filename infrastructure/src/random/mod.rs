//! [`RandomSource`](votemute_application::RandomSource) adapters

mod http;
mod local;

pub use http::HttpRandomSource;
pub use local::LocalRandomSource;
