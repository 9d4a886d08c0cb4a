pub mod config;
pub mod error;
pub mod fetch;
pub mod loader;

pub use error::ClientError;
pub use fetch::{HttpClient, HttpClientExt, HttpResult, UrlHttpClient};
pub use loader::{ImageLoader, PayloadLoader};
