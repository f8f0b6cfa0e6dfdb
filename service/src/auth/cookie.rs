//! Session cookie definitions.

use std::{
    collections::HashMap,
    hash::BuildHasher,
    time::Duration,
};

use smart_default::SmartDefault;

use crate::domain::user::Session;

/// Read access to the cookies of a request.
pub trait Jar {
    /// Returns the value of the cookie with the provided `name`, if any.
    fn get(&self, name: &str) -> Option<&str>;
}

impl<J: Jar + ?Sized> Jar for &J {
    fn get(&self, name: &str) -> Option<&str> {
        (**self).get(name)
    }
}

impl<S: BuildHasher> Jar for HashMap<String, String, S> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }
}

/// Session cookie configuration.
#[derive(Clone, Debug, SmartDefault)]
pub struct Config {
    /// Name of the cookie carrying a session token.
    pub name: String,

    /// Indicator whether the cookie is sent over HTTPS only.
    #[default(true)]
    pub secure: bool,
}

impl Config {
    /// [`Duration`] a browser keeps the cookie for.
    pub const MAX_AGE: Duration = Session::LIFETIME;
}
