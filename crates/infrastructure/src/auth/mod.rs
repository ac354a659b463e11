//! Identity provider adapters.

mod keycloak_provider;

pub use keycloak_provider::KeycloakProvider;
