pub mod error;
pub mod gateway;
pub mod http_transport;
pub mod retry;
pub mod singleton;
pub mod token;
pub mod transport;
pub mod vendor_error;

pub use error::BrokerError;
pub use gateway::BrokerGateway;
pub use http_transport::{Credentials, HttpVendorTransport};
pub use retry::RetryPolicy;
pub use singleton::GatewayRegistry;
pub use token::OAuthToken;
pub use transport::{HttpMethod, VendorRequest, VendorTransport};
