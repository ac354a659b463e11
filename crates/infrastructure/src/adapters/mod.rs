//! Adapters implementing application ports.

mod clock;
#[cfg(any(test, feature = "test-util"))]
mod manual_clock;
mod reqwest_transport;

pub use clock::SystemClock;
#[cfg(any(test, feature = "test-util"))]
pub use manual_clock::ManualClock;
pub use reqwest_transport::ReqwestTransport;
