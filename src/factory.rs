//! Observable factory pattern
//!
//! `ObservableFactory` gathers the constructors for source streams. The
//! [`Local`] marker implements it, so streams are created as
//! `Local::of(1)`, `Local::subject()`, and so on.
//!
//! ## Trivial Observables
//!
//! | Method | Completion | Values Emitted | Error Emitted |
//! |--------|------------|----------------|---------------|
//! | `empty()` | ✅ Yes | None | None |
//! | `never()` | ❌ No | None | None |
//! | `throw_err()` | ❌ No | None | Yes |
//!
//! `never()` is the natural openings stream for "no buffer ever opens" and
//! the natural closing stream for "this buffer only closes when the source
//! completes".

use std::marker::PhantomData;

use crate::{
  observable::{Empty, FromIter, Never, Of, ThrowErr},
  subject::Subject,
};

/// Single-threaded execution context marker.
///
/// Every stream in this crate is `Rc`-based and delivers notifications
/// synchronously on the calling thread.
#[derive(Clone, Copy, Default)]
pub struct Local;

/// Constructors for source streams.
pub trait ObservableFactory {
  /// Emit `v`, then complete.
  fn of<T>(v: T) -> Of<T> { Of(v) }

  /// Emit every element of `iter`, then complete.
  fn from_iter<I: IntoIterator>(iter: I) -> FromIter<I> { FromIter(iter) }

  /// Complete immediately.
  fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

  /// Never emit and never terminate.
  fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

  /// Fail immediately with `err`.
  fn throw_err<Item, Err>(err: Err) -> ThrowErr<Item, Err> { ThrowErr { err, _marker: PhantomData } }

  /// A new hot multicast subject.
  fn subject<Item, Err>() -> Subject<Item, Err> { Subject::new() }
}

impl ObservableFactory for Local {}
