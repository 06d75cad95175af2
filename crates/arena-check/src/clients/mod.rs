pub mod lichess;
pub mod transport;

pub use lichess::{LichessClient, PlayerResult, RecordStream};
pub use transport::{
    Accept, BodyStream, HttpResponse, HttpTransport, StatusCode, Transport, TransportError,
};
