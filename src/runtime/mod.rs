//! Single-writer cart runtime and event stream APIs.

/// Single-slot quantity debouncer.
pub mod debounce;
/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
