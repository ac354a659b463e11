//! Application use cases (business logic orchestration).

mod load_profile;
mod register_customer;

pub use load_profile::ProfileService;
pub use register_customer::RegistrationService;
