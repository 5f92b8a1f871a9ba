pub mod identity_service;
pub mod payment_service;

pub use identity_service::{FirebaseVerifier, IdentityVerifier, VerifiedIdentity};
pub use payment_service::{CreatedIntent, PaymentGateway, StripeGateway};

use std::time::Duration;

/// Shared outbound client for the identity provider and the payment processor.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("clinic-portal-service/", env!("CARGO_PKG_VERSION")))
        .build()
}
