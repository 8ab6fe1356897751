pub mod cors_headers;

pub use cors_headers::CorsHeaders;
