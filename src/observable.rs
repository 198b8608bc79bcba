//! Observable traits
//!
//! - [`ObservableType`] names what a stream emits.
//! - [`CoreObservable`] is the subscription contract: hand over an observer,
//!   get back a [`Subscription`] that cancels it.
//! - [`Observable`] is the user-facing extension trait with the `subscribe*`
//!   entry points and operators. It is implemented for every
//!   `ObservableType`.

mod from_iter;
mod of;
mod trivial;

pub use from_iter::*;
pub use of::*;
pub use trivial::*;

use crate::{
  observer::{FnAllObserver, FnMutObserver},
  ops::buffer_toggle::BufferToggle,
  subscription::Subscription,
};

/// The item and error types of a stream.
pub trait ObservableType {
  type Item;
  type Err;
}

/// A stream that can be subscribed by an observer of type `O`.
pub trait CoreObservable<O>: ObservableType {
  type Unsub: Subscription;

  /// Start delivering notifications to `observer`.
  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Operators and subscription helpers available on every stream.
pub trait Observable: ObservableType + Sized {
  /// Subscribe with a `next` closure. Only for streams that cannot fail.
  fn subscribe<F>(self, next: F) -> <Self as CoreObservable<FnMutObserver<F>>>::Unsub
  where
    F: FnMut(Self::Item),
    Self: CoreObservable<FnMutObserver<F>>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  /// Subscribe with one closure per notification kind.
  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> <Self as CoreObservable<FnAllObserver<N, E, C>>>::Unsub
  where
    N: FnMut(Self::Item),
    E: FnOnce(Self::Err),
    C: FnOnce(),
    Self: CoreObservable<FnAllObserver<N, E, C>>,
  {
    self.actual_subscribe(FnAllObserver { next, error, complete })
  }

  /// Subscribe a full observer.
  fn subscribe_with<O>(self, observer: O) -> <Self as CoreObservable<O>>::Unsub
  where
    Self: CoreObservable<O>,
  {
    self.actual_subscribe(observer)
  }

  /// Collect source values into buffers that each start on a value of
  /// `openings` and end on the first notification of the stream
  /// `closing_selector` returns for that opening value.
  ///
  /// - Every source value is appended to every buffer open at that moment.
  /// - A buffer is emitted when its closing stream emits a value or
  ///   completes, whichever happens first; the closing subscription is then
  ///   released.
  /// - When the source completes, still-open buffers are emitted oldest
  ///   first (empty ones included), then the output completes.
  /// - An error from the source, the openings, any closing stream, or an
  ///   `Err` returned by `closing_selector` is forwarded unchanged; buffers
  ///   not yet emitted are discarded and every subscription is released.
  /// - Completion of `openings` only stops new buffers from being opened.
  ///
  /// # Example
  ///
  /// ```rust
  /// use std::{cell::RefCell, convert::Infallible, rc::Rc};
  ///
  /// use rxtoggle::prelude::*;
  ///
  /// let mut source = Local::subject::<i32, Infallible>();
  /// let mut openings = Local::subject::<(), Infallible>();
  /// let mut closing = Local::subject::<(), Infallible>();
  ///
  /// let buffers = Rc::new(RefCell::new(vec![]));
  /// let buffers_c = buffers.clone();
  /// let closing_c = closing.clone();
  /// source
  ///   .clone()
  ///   .buffer_toggle(openings.clone(), move |_| Ok(closing_c.clone()))
  ///   .subscribe(move |b| buffers_c.borrow_mut().push(b));
  ///
  /// source.next(1);
  /// openings.next(());
  /// source.next(2);
  /// source.next(3);
  /// closing.next(());
  /// source.next(4);
  ///
  /// assert_eq!(*buffers.borrow(), vec![vec![2, 3]]);
  /// ```
  fn buffer_toggle<P, F, N>(self, openings: P, closing_selector: F) -> BufferToggle<Self, P, F>
  where
    P: ObservableType<Err = Self::Err>,
    F: FnMut(P::Item) -> Result<N, Self::Err>,
    N: ObservableType<Err = Self::Err>,
  {
    BufferToggle { source: self, openings, closing_selector }
  }
}

impl<T: ObservableType> Observable for T {}
