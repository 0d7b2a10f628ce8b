pub mod credentials;
pub mod error;
pub mod metrics;
pub mod notice;
pub mod planetscale;
pub mod registration;
pub mod verifier;

pub use credentials::Credential;
pub use error::ServiceError;
pub use notice::NoticeOnce;
pub use planetscale::{JsonObject, PlanetScaleClient, DEFAULT_BASE_URL};
pub use registration::{
    FileRegistrationStore, InMemoryRegistrationStore, RegistrationStore, WebhookRegistrar,
    WebhookTarget,
};
pub use verifier::{Delivery, EventFilter, Rejection, WebhookVerifier, SIGNATURE_HEADER};
