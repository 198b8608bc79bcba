use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits every element of an iterator, then completes.
///
/// Stops early, without completing, once the observer reports
/// `is_closed()`. Created by `ObservableFactory::from_iter`.
#[derive(Clone)]
pub struct FromIter<I>(pub I);

impl<I: IntoIterator> ObservableType for FromIter<I> {
  type Item = I::Item;
  type Err = Infallible;
}

impl<I, O> CoreObservable<O> for FromIter<I>
where
  I: IntoIterator,
  O: Observer<I::Item, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    for v in self.0 {
      if observer.is_closed() {
        return;
      }
      observer.next(v);
    }
    if !observer.is_closed() {
      observer.complete();
    }
  }
}
