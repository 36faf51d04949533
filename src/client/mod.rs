//! Outbound HTTP: the transport seam, the credential interceptor and single-flight renewal.

mod transport;
mod renewal;
mod interceptor;

pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport};
pub use renewal::RenewalGate;
pub use interceptor::AuthClient;
