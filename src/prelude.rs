//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Observer trait and adapters
pub use crate::observer::{BoxedObserver, DynObserver, FnAllObserver, FnMutObserver, Observer};
// Operators
pub use crate::ops::buffer_toggle::{BufferToggle, BufferToggleSubscription};
// Shared state
pub use crate::rc::{CellRc, MutRc, RcDeref, RcDerefMut};
// Subject
pub use crate::subject::*;
// Subscription
pub use crate::subscription::*;
pub use crate::{
  factory::{Local, ObservableFactory},
  observable::{CoreObservable, Empty, FromIter, Never, Observable, ObservableType, Of, ThrowErr},
};
