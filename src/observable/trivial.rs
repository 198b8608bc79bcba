//! Streams with no values: [`Empty`], [`Never`] and [`ThrowErr`].
//!
//! All three are generic over both item and error type so they can stand in
//! for any stream, e.g. as the openings of `buffer_toggle`.

use std::marker::PhantomData;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Completes immediately without emitting any values.
pub struct Empty<Item, Err>(pub(crate) PhantomData<fn() -> (Item, Err)>);

/// Never emits, never terminates.
pub struct Never<Item, Err>(pub(crate) PhantomData<fn() -> (Item, Err)>);

/// Errors immediately without emitting any values.
pub struct ThrowErr<Item, Err> {
  pub(crate) err: Err,
  pub(crate) _marker: PhantomData<fn() -> Item>,
}

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Empty(PhantomData) }
}

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { Never(PhantomData) }
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { ThrowErr { err: self.err.clone(), _marker: PhantomData } }
}

impl<Item, Err> ObservableType for Empty<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err> ObservableType for Never<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err> ObservableType for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item, Err, O> CoreObservable<O> for Empty<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.complete(); }
}

impl<Item, Err, O> CoreObservable<O> for Never<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, _observer: O) -> Self::Unsub {}
}

impl<Item, Err, O> CoreObservable<O> for ThrowErr<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.error(self.err); }
}
