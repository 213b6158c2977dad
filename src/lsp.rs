pub mod backend;
pub mod body;
pub mod dispatcher;
pub mod error;
pub mod header;
pub mod message_creator;
pub mod message_parser;
pub mod session;
pub mod stream_transport;
pub mod transport;
pub mod types;

pub use backend::CapabilityProvider;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, ErrorKind};
pub use session::Session;
pub use stream_transport::StreamTransport;
