pub mod buffer_toggle;

pub use buffer_toggle::{BufferToggle, BufferToggleSubscription};
