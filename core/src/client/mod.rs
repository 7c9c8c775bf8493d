//! Caller-side session client
//!
//! Logic that lives with the consumer of the API rather than the
//! server: holding the current token pair and coalescing the refresh
//! storms that expired-credential responses trigger.

mod coalescer;

#[cfg(test)]
mod tests;

pub use coalescer::{CoalescingClient, RefreshTransport};
