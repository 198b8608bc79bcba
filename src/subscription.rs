//! Subscription trait and combinators
//!
//! A subscription is the control handle returned from `subscribe`. Calling
//! `unsubscribe` cancels the stream: the producer stops delivering
//! notifications and releases whatever it holds for that observer.

mod boxed;
mod dynamic;

pub use boxed::*;
pub use dynamic::*;

use crate::rc::{MutRc, RcDeref, RcDerefMut};

/// Handle to cancel an active subscription.
///
/// `unsubscribe` consumes the handle, so a single handle is released at most
/// once. Implementations must still tolerate cancelling a stream that already
/// terminated on its own.
pub trait Subscription {
  /// Cancel the subscription.
  fn unsubscribe(self);

  /// Whether the subscription is already finished or cancelled.
  fn is_closed(&self) -> bool;
}

/// Unit subscription for synchronous sources that are done by the time
/// `subscribe` returns.
impl Subscription for () {
  #[inline]
  fn unsubscribe(self) {}

  #[inline]
  fn is_closed(&self) -> bool { true }
}

impl<S: Subscription> Subscription for Option<S> {
  fn unsubscribe(self) {
    if let Some(inner) = self {
      inner.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().is_none_or(Subscription::is_closed) }
}

/// Shared subscription slot. The inner subscription is taken out before it is
/// unsubscribed so the cell is not borrowed during teardown.
impl<S: Subscription> Subscription for MutRc<Option<S>> {
  fn unsubscribe(self) {
    let inner = self.rc_deref_mut().take();
    inner.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.rc_deref().is_closed() }
}

/// Subscription that runs a closure once when unsubscribed.
pub struct ClosureSubscription<F>(pub F);

impl<F: FnOnce()> Subscription for ClosureSubscription<F> {
  fn unsubscribe(self) { (self.0)() }

  fn is_closed(&self) -> bool { false }
}
