pub mod app_config;
pub mod error;
pub mod http_api;
pub mod session_store;

pub use app_config::Config;
pub use error::{ClientError, ClientResult};
pub use http_api::HttpTravelApi;
pub use session_store::FileSessionStore;
