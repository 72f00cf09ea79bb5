/// Adapters - concrete transport implementations of the port traits
pub mod http;
pub mod ws;

pub use http::HttpSessionApi;
pub use ws::WsConnector;
