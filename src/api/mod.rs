pub mod gateway;
pub mod http;
pub mod multipart;
pub mod request;
pub mod router;

pub use gateway::{handle_event, handle_request, into_api_request, ProxyResponse};
pub use http::app;
pub use multipart::{read_payload, Payload};
pub use request::{parse_query, ApiRequest};
pub use router::{resolve, Dispatcher, Route};
