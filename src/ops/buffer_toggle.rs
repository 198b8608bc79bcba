//! BufferToggle operator
//!
//! Collects source values into buffers whose lifetimes are driven by two
//! other streams. Every value of the `openings` stream starts a new buffer and
//! asks the closing selector for the stream that will end it. The buffer is
//! emitted as a `Vec` the first time that closing stream emits or completes.
//!
//! Behavior summary:
//! - Buffers may overlap. A source value is appended to every buffer open at
//!   that moment, so `Item: Clone` is required.
//! - Buffers that close at the same time are emitted oldest first.
//! - When the source completes, every open buffer is emitted (empty ones
//!   included), oldest first, followed by completion.
//! - An error from the source, the openings, an open buffer's closing stream,
//!   or an `Err` returned by the closing selector is forwarded unchanged.
//!   Unemitted buffers are discarded.
//! - Completion of `openings` only stops new buffers from being opened.
//! - Whenever the operator terminates, or is unsubscribed, the source, the
//!   openings and all pending closing streams are unsubscribed.
//!
//! Example:
//!
//! ```rust
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! use rxtoggle::prelude::*;
//!
//! let mut source = Local::subject::<char, Infallible>();
//! let mut openings = Local::subject::<u32, Infallible>();
//! let closings = [Local::subject::<(), Infallible>(), Local::subject()];
//!
//! let buffers = Rc::new(RefCell::new(vec![]));
//! let buffers_c = buffers.clone();
//! let selector_closings = closings.clone();
//! source
//!   .clone()
//!   .buffer_toggle(openings.clone(), move |n| Ok(selector_closings[n as usize].clone()))
//!   .subscribe(move |b| buffers_c.borrow_mut().push(b));
//!
//! openings.next(0);
//! source.next('a');
//! openings.next(1);
//! source.next('b');
//! closings[0].clone().next(());
//! source.next('c');
//! source.clone().complete();
//!
//! assert_eq!(*buffers.borrow(), vec![vec!['a', 'b'], vec!['b', 'c']]);
//! ```

mod emitter;
mod registry;

#[cfg(test)]
pub(crate) use emitter::Notification;
use emitter::Emitter;
use registry::BufferRegistry;
#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  rc::{MutRc, RcDeref, RcDerefMut},
  subscription::{BoxedSubscription, Subscription},
};

/// BufferToggle operator, created by `Observable::buffer_toggle`.
///
/// * `source` - the stream whose values are buffered
/// * `openings` - every value starts a new buffer
/// * `closing_selector` - maps an opening value to the stream that closes the
///   buffer it started
#[derive(Clone)]
pub struct BufferToggle<S, P, F> {
  pub source: S,
  pub openings: P,
  pub closing_selector: F,
}

impl<S, P, F> ObservableType for BufferToggle<S, P, F>
where
  S: ObservableType,
{
  type Item = Vec<S::Item>;
  type Err = S::Err;
}

struct ToggleState<Item> {
  buffers: BufferRegistry<Item>,
  source: Option<BoxedSubscription>,
  openings: Option<BoxedSubscription>,
  terminated: bool,
}

impl<Item> ToggleState<Item> {
  /// Move the source and openings subscriptions into `subs`.
  fn take_upstreams(&mut self, mut subs: Vec<BoxedSubscription>) -> Vec<BoxedSubscription> {
    subs.extend(self.source.take());
    subs.extend(self.openings.take());
    subs
  }
}

fn release(subs: Vec<BoxedSubscription>) {
  for sub in subs {
    sub.unsubscribe();
  }
}

/// State shared by the operator's observers and its subscription handle.
///
/// No `RefCell` borrow is held while calling into an upstream subscription or
/// the downstream observer.
#[doc(hidden)]
pub struct ToggleCore<O, Item, Err> {
  state: MutRc<ToggleState<Item>>,
  emitter: Emitter<O, Vec<Item>, Err>,
}

impl<O, Item, Err> Clone for ToggleCore<O, Item, Err> {
  fn clone(&self) -> Self { ToggleCore { state: self.state.clone(), emitter: self.emitter.clone() } }
}

impl<O, Item, Err> ToggleCore<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
{
  fn new(observer: O) -> Self {
    ToggleCore {
      state: MutRc::own(ToggleState {
        buffers: BufferRegistry::default(),
        source: None,
        openings: None,
        terminated: false,
      }),
      emitter: Emitter::new(observer),
    }
  }

  fn is_terminated(&self) -> bool { self.state.rc_deref().terminated }

  fn is_open(&self, id: usize) -> bool {
    let state = self.state.rc_deref();
    !state.terminated && state.buffers.contains(id)
  }

  fn adopt_source(&self, sub: BoxedSubscription) { self.adopt(sub, |state| &mut state.source); }

  fn adopt_openings(&self, sub: BoxedSubscription) { self.adopt(sub, |state| &mut state.openings); }

  /// Keep `sub` until teardown, or release it now if the operator already
  /// terminated while it was being subscribed.
  fn adopt(
    &self, sub: BoxedSubscription, slot: fn(&mut ToggleState<Item>) -> &mut Option<BoxedSubscription>,
  ) {
    let rejected = {
      let mut state = self.state.rc_deref_mut();
      if state.terminated {
        Some(sub)
      } else {
        *slot(&mut *state) = Some(sub);
        None
      }
    };
    rejected.unsubscribe();
  }

  fn open_buffer(&self) -> Option<usize> {
    let mut state = self.state.rc_deref_mut();
    if state.terminated {
      return None;
    }
    let id = state.buffers.open();
    #[cfg(feature = "tracing")]
    trace!(buffer = id, open = state.buffers.len(), "buffer_toggle: buffer opened");
    Some(id)
  }

  fn attach_closing(&self, id: usize, sub: BoxedSubscription) {
    let rejected = self
      .state
      .rc_deref_mut()
      .buffers
      .attach_closing(id, sub)
      .err();
    rejected.unsubscribe();
  }

  /// Release the closing subscription of buffer `id`, then emit the buffer.
  fn flush(&self, id: usize) {
    let closed = self.state.rc_deref_mut().buffers.close(id);
    let Some((values, closing)) = closed else { return };
    #[cfg(feature = "tracing")]
    trace!(buffer = id, len = values.len(), "buffer_toggle: buffer closed");
    // Downstream may push into the closing stream, which must not reach this
    // buffer's observer again.
    closing.unsubscribe();
    self.emitter.next(values);
  }

  fn complete_source(&self) {
    let (buffers, upstreams) = {
      let mut state = self.state.rc_deref_mut();
      if state.terminated {
        return;
      }
      state.terminated = true;
      let (buffers, closings) = state.buffers.close_all();
      (buffers, state.take_upstreams(closings))
    };
    #[cfg(feature = "tracing")]
    debug!(flushed = buffers.len(), "buffer_toggle: source completed");
    for values in buffers {
      self.emitter.next(values);
    }
    release(upstreams);
    self.emitter.complete();
  }

  fn fail(&self, err: Err) {
    let upstreams = {
      let mut state = self.state.rc_deref_mut();
      if state.terminated {
        return;
      }
      state.terminated = true;
      let closings = state.buffers.discard_all();
      state.take_upstreams(closings)
    };
    self.emitter.error(err);
    release(upstreams);
  }

  fn close_openings(&self) {
    let openings = self.state.rc_deref_mut().openings.take();
    openings.unsubscribe();
  }

  fn cancel(&self) {
    let upstreams = {
      let mut state = self.state.rc_deref_mut();
      if state.terminated {
        None
      } else {
        state.terminated = true;
        let closings = state.buffers.discard_all();
        Some(state.take_upstreams(closings))
      }
    };
    self.emitter.cancel();
    if let Some(upstreams) = upstreams {
      #[cfg(feature = "tracing")]
      debug!("buffer_toggle: unsubscribed");
      release(upstreams);
    }
  }
}

/// Observer for the source stream.
#[doc(hidden)]
pub struct BufferToggleSourceObserver<O, Item, Err>(ToggleCore<O, Item, Err>);

impl<O, Item, Err> Observer<Item, Err> for BufferToggleSourceObserver<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
  Item: Clone,
{
  fn next(&mut self, value: Item) {
    let mut state = self.0.state.rc_deref_mut();
    if !state.terminated {
      state.buffers.push(value);
    }
  }

  fn error(self, err: Err) {
    #[cfg(feature = "tracing")]
    debug!("buffer_toggle: source failed");
    self.0.fail(err);
  }

  fn complete(self) { self.0.complete_source(); }

  fn is_closed(&self) -> bool { self.0.is_terminated() }
}

/// Observer for the openings stream. Owns the closing selector.
#[doc(hidden)]
pub struct BufferToggleOpeningObserver<O, Item, Err, F> {
  core: ToggleCore<O, Item, Err>,
  selector: F,
}

impl<O, Item, Err, F, Open, N> Observer<Open, Err> for BufferToggleOpeningObserver<O, Item, Err, F>
where
  O: Observer<Vec<Item>, Err>,
  F: FnMut(Open) -> Result<N, Err>,
  N: CoreObservable<BufferToggleClosingObserver<O, Item, Err>, Err = Err>,
  N::Unsub: 'static,
{
  fn next(&mut self, value: Open) {
    if self.core.is_terminated() {
      return;
    }
    let closing = match (self.selector)(value) {
      Ok(closing) => closing,
      Err(err) => {
        #[cfg(feature = "tracing")]
        debug!("buffer_toggle: closing selector failed");
        self.core.fail(err);
        return;
      }
    };
    let Some(id) = self.core.open_buffer() else { return };
    let observer = BufferToggleClosingObserver { core: self.core.clone(), id };
    let sub = closing.actual_subscribe(observer);
    self.core.attach_closing(id, BoxedSubscription::new(sub));
  }

  fn error(self, err: Err) {
    #[cfg(feature = "tracing")]
    debug!("buffer_toggle: openings failed");
    self.core.fail(err);
  }

  fn complete(self) { self.core.close_openings(); }

  fn is_closed(&self) -> bool { self.core.is_terminated() }
}

/// Observer for the closing stream of buffer `id`. Only the first
/// notification counts.
#[doc(hidden)]
pub struct BufferToggleClosingObserver<O, Item, Err> {
  core: ToggleCore<O, Item, Err>,
  id: usize,
}

impl<O, Item, Err, Signal> Observer<Signal, Err> for BufferToggleClosingObserver<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
{
  fn next(&mut self, _: Signal) { self.core.flush(self.id); }

  fn error(self, err: Err) {
    if self.core.is_open(self.id) {
      #[cfg(feature = "tracing")]
      debug!(buffer = self.id, "buffer_toggle: closing stream failed");
      self.core.fail(err);
    }
  }

  fn complete(self) { self.core.flush(self.id); }

  fn is_closed(&self) -> bool { !self.core.is_open(self.id) }
}

/// Subscription returned by `buffer_toggle`.
///
/// Unsubscribing releases the source, the openings and every pending closing
/// stream, and drops the downstream observer. Unsubscribing after the operator
/// terminated only drops notifications that have not been delivered yet.
pub struct BufferToggleSubscription<O, Item, Err> {
  core: ToggleCore<O, Item, Err>,
}

impl<O, Item, Err> BufferToggleSubscription<O, Item, Err> {
  /// Number of buffers currently open.
  pub fn open_buffers(&self) -> usize { self.core.state.rc_deref().buffers.len() }
}

impl<O, Item, Err> Subscription for BufferToggleSubscription<O, Item, Err>
where
  O: Observer<Vec<Item>, Err>,
{
  fn unsubscribe(self) { self.core.cancel(); }

  fn is_closed(&self) -> bool { self.core.emitter.is_stopped() }
}

impl<S, P, F, N, O, Item, Err> CoreObservable<O> for BufferToggle<S, P, F>
where
  O: Observer<Vec<Item>, Err> + 'static,
  Item: Clone + 'static,
  Err: 'static,
  S: CoreObservable<BufferToggleSourceObserver<O, Item, Err>, Item = Item, Err = Err>,
  S::Unsub: 'static,
  P: CoreObservable<BufferToggleOpeningObserver<O, Item, Err, F>, Err = Err>,
  P::Unsub: 'static,
  F: FnMut(P::Item) -> Result<N, Err>,
  N: CoreObservable<BufferToggleClosingObserver<O, Item, Err>, Err = Err>,
  N::Unsub: 'static,
{
  type Unsub = BufferToggleSubscription<O, Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let BufferToggle { source, openings, closing_selector } = self;
    let core = ToggleCore::new(observer);

    let source_sub = source.actual_subscribe(BufferToggleSourceObserver(core.clone()));
    core.adopt_source(BoxedSubscription::new(source_sub));

    // A source that terminated while being subscribed leaves nothing to open.
    if !core.is_terminated() {
      let opening_observer =
        BufferToggleOpeningObserver { core: core.clone(), selector: closing_selector };
      let openings_sub = openings.actual_subscribe(opening_observer);
      core.adopt_openings(BoxedSubscription::new(openings_sub));
    }

    BufferToggleSubscription { core }
  }
}
