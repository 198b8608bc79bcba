use std::convert::Infallible;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
};

/// Emits a single value, then completes.
///
/// Created by `ObservableFactory::of`.
#[derive(Clone)]
pub struct Of<T>(pub T);

impl<T> ObservableType for Of<T> {
  type Item = T;
  type Err = Infallible;
}

impl<T, O> CoreObservable<O> for Of<T>
where
  O: Observer<T, Infallible>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    if !observer.is_closed() {
      observer.next(self.0);
      observer.complete();
    }
  }
}
