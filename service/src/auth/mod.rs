//! Authentication of requests by their session cookie.
//!
//! A [`token::Codec`] issues signed session tokens on sign-in, which clients
//! send back as a cookie readable through a [`cookie::Jar`]. Every page request
//! passes a [`Gate`] first, which allows it or redirects it depending on the
//! request path and the validity of the presented token.

pub mod cookie;
pub mod gate;
pub mod token;

pub use self::{
    gate::{Decision, Gate},
    token::Codec,
};
