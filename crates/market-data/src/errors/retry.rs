/// Classification for retry policy.
///
/// Used by the rate client to decide whether a failed provider call is worth
/// repeating after the configured rate-limit delay.
///
/// # Behavior Summary
///
/// | Class | Sleep and retry? | Surfaces to resolver? |
/// |-------|------------------|-----------------------|
/// | `Never` | No | Immediately |
/// | `WithBackoff` | Yes, until attempts run out | Only as `PersistentlyRateLimited` |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, invalid data, unsupported operation or a
    /// terminal transport failure. Repeating the call won't help.
    Never,

    /// The provider asked us to slow down.
    ///
    /// The client sleeps for the rate-limit delay and issues the same call
    /// again, up to the configured number of attempts.
    WithBackoff,
}
