//! Client for Lolz Market balance deposits.
//!
//! The marketplace has no public payment API for this flow, so the client
//! replays what a logged-in browser does: it sends the session cookies,
//! scrapes the anti-CSRF token from the deposit page, posts the deposit
//! form and reads payment status back from the payment history table.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

pub mod config;
pub mod objects;
pub mod session;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub mod scrape;

pub use objects::{
    CreatedPayment, PaymentInfo, PaymentMethod, PaymentRequest, PaymentResponse, PaymentStatus,
};
pub use session::SessionCookies;
