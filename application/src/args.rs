//! [`Args`] definitions.

use std::ffi::OsString;

use clap::Parser;

/// Server of the project tracker with session-gated pages.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    ///
    /// Missing file is not an error: defaults and environment variables are
    /// used instead.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses arguments of the current process.
    ///
    /// # Errors
    ///
    /// If the arguments don't match [`Args`].
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }

    /// Parses the provided arguments, the first one being the binary name.
    ///
    /// # Errors
    ///
    /// If the arguments don't match [`Args`].
    pub fn parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(args)
    }
}
