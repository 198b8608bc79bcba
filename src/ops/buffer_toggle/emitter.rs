//! Serialising delivery to the downstream observer.
//!
//! Every notification the operator produces goes through an [`Emitter`]. The
//! emitter queues it and, unless some call further up the stack is already
//! draining the queue, delivers it right away. A downstream handler that
//! re-enters the operator (for example by pushing into the source subject)
//! therefore only enqueues: deliveries never interleave and the shared state
//! is never borrowed twice.

use std::collections::VecDeque;

use crate::{
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
};

/// One queued downstream notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct EmitterState<O, Item, Err> {
  observer: Option<O>,
  queue: VecDeque<Notification<Item, Err>>,
  draining: bool,
  /// A terminal notification was accepted.
  stopped: bool,
  /// The downstream cancelled; nothing is delivered any more.
  cancelled: bool,
}

/// Shared handle to the downstream observer and its pending notifications.
pub struct Emitter<O, Item, Err>(MutRc<EmitterState<O, Item, Err>>);

impl<O, Item, Err> Clone for Emitter<O, Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<O, Item, Err> Emitter<O, Item, Err>
where
  O: Observer<Item, Err>,
{
  pub fn new(observer: O) -> Self {
    Emitter(MutRc::own(EmitterState {
      observer: Some(observer),
      queue: VecDeque::new(),
      draining: false,
      stopped: false,
      cancelled: false,
    }))
  }

  pub fn next(&self, value: Item) { self.push(Notification::Next(value), false); }

  pub fn error(&self, err: Err) { self.push(Notification::Error(err), true); }

  pub fn complete(&self) { self.push(Notification::Complete, true); }

  /// Whether the emitter still accepts notifications.
  pub fn is_stopped(&self) -> bool {
    let state = self.0.rc_deref();
    state.stopped || state.cancelled
  }

  /// Drop everything still queued and release the downstream observer.
  ///
  /// A notification being delivered at this moment completes, nothing after
  /// it does.
  pub fn cancel(&self) {
    let observer = {
      let mut state = self.0.rc_deref_mut();
      state.cancelled = true;
      state.queue.clear();
      state.observer.take()
    };
    drop(observer);
  }

  fn push(&self, notification: Notification<Item, Err>, terminal: bool) {
    {
      let mut state = self.0.rc_deref_mut();
      if state.stopped || state.cancelled {
        return;
      }
      state.stopped = terminal;
      state.queue.push_back(notification);
      if state.draining {
        return;
      }
      state.draining = true;
    }
    self.drain();
  }

  fn drain(&self) {
    loop {
      let mut state = self.0.rc_deref_mut();
      let Some(notification) = state.queue.pop_front() else {
        state.draining = false;
        return;
      };
      match notification {
        Notification::Next(value) => {
          // The observer is lent out while it runs, re-entrant pushes only
          // touch the queue.
          let Some(mut observer) = state.observer.take() else { continue };
          drop(state);
          observer.next(value);
          let mut state = self.0.rc_deref_mut();
          if !state.cancelled {
            state.observer = Some(observer);
          }
        }
        Notification::Error(err) => {
          let observer = state.observer.take();
          state.queue.clear();
          drop(state);
          observer.error(err);
        }
        Notification::Complete => {
          let observer = state.observer.take();
          state.queue.clear();
          drop(state);
          observer.complete();
        }
      }
    }
  }
}
