//! Authentication module for the Sayara marketplace
//!
//! Provides account authentication and the admin login throttle:
//! - JWT token generation and validation for users and admins
//! - Phone+password registration/login and Google sign-in
//! - Login-attempt throttling state ([`ThrottleStore`])

pub mod google;
pub mod jwt;
pub mod service;
pub mod throttle;

pub use google::GoogleTokenVerifier;
pub use jwt::{generate_admin_token, generate_user_token, principal_id, verify_token, Claims, JwtError};
pub use service::AuthService;
pub use throttle::{
    throttle_identifier, InMemoryThrottleStore, ThrottleDecision, ThrottlePolicy, ThrottleStore,
};
