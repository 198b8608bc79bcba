//! Subject: a hot observable that multicasts to many observers.
//!
//! A `Subject` is both an [`Observer`] (values pushed into it) and an
//! observable (observers subscribe to it). It is the stream type the
//! `buffer_toggle` tests and examples drive by hand.
//!
//! Delivery works on a snapshot of the subscriber list, so an observer may
//! unsubscribe itself, or any sibling, from inside its own handler. A sibling
//! removed mid-delivery is skipped for the rest of that notification.
//!
//! An observer that pushes a value back into the subject it is being notified
//! by does not receive that value; its siblings do. If it terminates the
//! subject instead, it receives the terminal once its handler returns.

use smallvec::SmallVec;

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::{BoxedObserver, Observer},
  rc::{CellRc, MutRc, RcDeref, RcDerefMut},
  subscription::{DynamicSubscriptions, Subscription},
};

#[derive(Clone)]
enum Terminated<Err> {
  Completed,
  Errored(Err),
}

struct SubscriberSlot<Item, Err> {
  active: CellRc<bool>,
  observer: MutRc<Option<BoxedObserver<Item, Err>>>,
}

impl<Item, Err> Clone for SubscriberSlot<Item, Err> {
  fn clone(&self) -> Self {
    SubscriberSlot { active: self.active.clone(), observer: self.observer.clone() }
  }
}

struct SubjectState<Item, Err> {
  subscribers: DynamicSubscriptions<SubscriberSlot<Item, Err>>,
  terminal: Option<Terminated<Err>>,
}

/// Multicast stream. Clones share the same subscriber list.
pub struct Subject<Item, Err> {
  state: MutRc<SubjectState<Item, Err>>,
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { state: self.state.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject {
      state: MutRc::own(SubjectState { subscribers: DynamicSubscriptions::new(), terminal: None }),
    }
  }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Number of currently subscribed observers.
  pub fn observer_count(&self) -> usize { self.state.rc_deref().subscribers.len() }

  fn snapshot(&self) -> SmallVec<[SubscriberSlot<Item, Err>; 2]> {
    self.state.rc_deref().subscribers.iter().cloned().collect()
  }

  fn terminate(&self, terminal: Terminated<Err>) -> Option<SmallVec<[SubscriberSlot<Item, Err>; 2]>> {
    let mut state = self.state.rc_deref_mut();
    if state.terminal.is_some() {
      return None;
    }
    state.terminal = Some(terminal);
    let slots = state.subscribers.drain().collect();
    Some(slots)
  }
}

/// Deliver `terminal` to the observer of `slot`. A slot that is busy
/// delivering a value is left active and finished by that delivery.
fn finish<Item, Err: Clone>(slot: &SubscriberSlot<Item, Err>, terminal: &Terminated<Err>) {
  if !slot.active.get() {
    return;
  }
  let observer = match slot.observer.try_rc_deref_mut() {
    Some(mut observer) => observer.take(),
    None => return,
  };
  slot.active.set(false);
  match terminal {
    Terminated::Completed => observer.complete(),
    Terminated::Errored(err) => observer.error(err.clone()),
  }
}

impl<Item, Err> ObservableType for Subject<Item, Err> {
  type Item = Item;
  type Err = Err;
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  fn next(&mut self, value: Item) {
    if self.state.rc_deref().terminal.is_some() {
      return;
    }
    for slot in self.snapshot() {
      if !slot.active.get() {
        continue;
      }
      // Already borrowed: this observer is further up the stack.
      let Some(mut observer) = slot.observer.try_rc_deref_mut() else { continue };
      if let Some(observer) = observer.as_mut() {
        observer.next(value.clone());
      }
      drop(observer);

      let terminal = self.state.rc_deref().terminal.clone();
      if let Some(terminal) = terminal {
        finish(&slot, &terminal);
      }
    }
  }

  fn error(self, err: Err) {
    let terminal = Terminated::Errored(err);
    let Some(slots) = self.terminate(terminal.clone()) else { return };
    for slot in slots {
      finish(&slot, &terminal);
    }
  }

  fn complete(self) {
    let Some(slots) = self.terminate(Terminated::Completed) else { return };
    for slot in slots {
      finish(&slot, &Terminated::Completed);
    }
  }

  fn is_closed(&self) -> bool { self.state.rc_deref().terminal.is_some() }
}

impl<Item, Err, O> CoreObservable<O> for Subject<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: Clone + 'static,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let terminal = self.state.rc_deref().terminal.clone();
    match terminal {
      Some(Terminated::Completed) => {
        observer.complete();
        return SubjectSubscription::finished();
      }
      Some(Terminated::Errored(err)) => {
        observer.error(err);
        return SubjectSubscription::finished();
      }
      None => {}
    }

    let observer: BoxedObserver<Item, Err> = Box::new(observer);
    let slot = SubscriberSlot { active: CellRc::new(true), observer: MutRc::own(Some(observer)) };
    let active = slot.active.clone();
    let id = self.state.rc_deref_mut().subscribers.add(slot);
    SubjectSubscription { subject: Some((self.state, id)), active }
  }
}

/// Subscription handle for a [`Subject`].
pub struct SubjectSubscription<Item, Err> {
  subject: Option<(MutRc<SubjectState<Item, Err>>, usize)>,
  active: CellRc<bool>,
}

impl<Item, Err> SubjectSubscription<Item, Err> {
  fn finished() -> Self { SubjectSubscription { subject: None, active: CellRc::new(false) } }
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    self.active.set(false);
    if let Some((state, id)) = self.subject {
      let removed = state.rc_deref_mut().subscribers.remove(id);
      drop(removed);
    }
  }

  fn is_closed(&self) -> bool { !self.active.get() }
}
