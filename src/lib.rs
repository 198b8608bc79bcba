//! # rxtoggle: overlapping, signal-driven buffers for reactive streams
//!
//! A small, single-threaded Reactive Extensions core built around one
//! operator, [`buffer_toggle`](observable::Observable::buffer_toggle). Every
//! value of an *openings* stream starts a new buffer, a *closing selector*
//! maps that value to the stream that ends it, and the buffer is emitted as a
//! `Vec` of the source values that arrived in between.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! use rxtoggle::prelude::*;
//!
//! let mut clicks = Local::subject::<&str, Infallible>();
//! let mut presses = Local::subject::<(), Infallible>();
//! let mut releases = Local::subject::<(), Infallible>();
//!
//! let gestures = Rc::new(RefCell::new(vec![]));
//! let gestures_c = gestures.clone();
//! let releases_c = releases.clone();
//! clicks
//!   .clone()
//!   .buffer_toggle(presses.clone(), move |_| Ok(releases_c.clone()))
//!   .subscribe(move |g| gestures_c.borrow_mut().push(g));
//!
//! presses.next(());
//! clicks.next("left");
//! clicks.next("right");
//! releases.next(());
//! clicks.next("ignored");
//!
//! assert_eq!(*gestures.borrow(), vec![vec!["left", "right"]]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Local`] | Factory for single-threaded streams |
//! | [`Observable`] | Subscription entry points and operators |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Subject`] | Hot stream that is both observer and observable |
//!
//! ## Feature Flags
//!
//! - **`tracing`**: emit `tracing` events when buffers open and close and when
//!   `buffer_toggle` terminates
//!
//! [`Local`]: factory::Local
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`Subject`]: subject::Subject

pub mod factory;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod subject;
pub mod subscription;

#[cfg(test)]
mod test_scheduler;

// Re-export the prelude module
pub use prelude::*;
