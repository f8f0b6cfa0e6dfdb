//! [`Handler`] abstractions.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// A single type handles many different `Args`, one implementation per
/// argument type, so the set of supported operations is visible in bounds:
///
/// ```
/// use std::convert::Infallible;
///
/// use common::Handler;
///
/// struct Counter;
///
/// struct Increment(u32);
///
/// impl Handler<Increment> for Counter {
///     type Ok = u32;
///     type Err = Infallible;
///
///     async fn execute(&self, Increment(n): Increment) -> Result<u32, Infallible> {
///         Ok(n + 1)
///     }
/// }
///
/// fn requires<H: Handler<Increment, Ok = u32>>(_: &H) {}
///
/// requires(&Counter);
/// ```
pub trait Handler<Args = ()> {
    /// Result of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Handles the provided `Args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
