//! Editor session helpers

mod debounce;

pub use debounce::{Debouncer, DEFAULT_DELAY};
