//! Virtual-time scheduler and marble-diagram helpers for operator tests.
//!
//! Time is measured in frames. In a marble diagram every character is one
//! frame:
//!
//! - `-` or space: nothing happens
//! - a letter or digit: a value (the character itself)
//! - `|`: completion
//! - `#`: an error, always [`MARBLE_ERROR`]
//! - `(...)`: everything inside happens on the frame of the `(`
//! - `^`: the subscription point of a hot stream. Frames are counted from it
//!   and events before it are never seen.
//!
//! Subscription diagrams use `^` for the frame a stream was subscribed and `!`
//! for the frame it was released.
//!
//! The clock is thread-local. Tests reset it with
//! `#[rxtoggle_macro::test(marble)]`, schedule work, then call
//! [`TestScheduler::flush`]. Tasks due on the same frame run in the order
//! they were scheduled.

use std::{cell::RefCell, cmp::Ordering, collections::BinaryHeap, rc::Rc};

use crate::{
  observable::{CoreObservable, ObservableType},
  observer::Observer,
  ops::buffer_toggle::Notification,
  rc::{CellRc, MutRc, RcDeref, RcDerefMut},
  subject::{Subject, SubjectSubscription},
  subscription::Subscription,
};

pub type Frame = usize;

/// The error carried by `#` in a marble diagram.
pub const MARBLE_ERROR: &str = "error";

pub type MarbleNotification<T> = Notification<T, &'static str>;

// ==================== Internal State ====================

struct TestSchedulerState {
  now: Frame,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
  initialized: bool,
}

impl Default for TestSchedulerState {
  fn default() -> Self {
    Self { now: 0, task_queue: BinaryHeap::new(), next_task_id: 0, initialized: false }
  }
}

struct ScheduledTask {
  frame: Frame,
  task_id: usize,
  task: Box<dyn FnOnce()>,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool { self.frame == other.frame && self.task_id == other.task_id }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier frames first, then FIFO by task_id
    other
      .frame
      .cmp(&self.frame)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

thread_local! {
  static TEST_SCHEDULER_STATE: RefCell<TestSchedulerState>
    = RefCell::new(TestSchedulerState::default());
}

// ==================== TestScheduler ====================

/// Zero-sized handle to the thread-local virtual clock.
#[derive(Clone, Copy, Default)]
pub struct TestScheduler;

impl TestScheduler {
  /// Reset the clock to frame 0 and drop every pending task.
  pub fn init() {
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      state.now = 0;
      state.task_queue.clear();
      state.next_task_id = 0;
      state.initialized = true;
    });
  }

  fn ensure_initialized() {
    TEST_SCHEDULER_STATE.with(|state| {
      assert!(
        state.borrow().initialized,
        "TestScheduler::init() must be called before using the scheduler"
      );
    });
  }

  pub fn now() -> Frame {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| state.borrow().now)
  }

  /// Run `task` at the absolute `frame`.
  pub fn schedule(frame: Frame, task: impl FnOnce() + 'static) {
    Self::ensure_initialized();
    TEST_SCHEDULER_STATE.with(|state| {
      let mut state = state.borrow_mut();
      let task_id = state.next_task_id;
      state.next_task_id += 1;
      state
        .task_queue
        .push(ScheduledTask { frame, task_id, task: Box::new(task) });
    });
  }

  /// Release `subscription` on the `!` frame of `marbles`.
  pub fn unsubscribe_at(marbles: &str, subscription: impl Subscription + 'static) {
    let frame = sub_marbles(marbles)
      .end
      .expect("unsubscription marble needs a `!`");
    Self::schedule(frame, move || subscription.unsubscribe());
  }

  /// Run every pending task, advancing the clock to each task's frame.
  /// Tasks scheduled while flushing run too.
  pub fn flush() {
    Self::ensure_initialized();
    loop {
      let task = TEST_SCHEDULER_STATE.with(|state| {
        let mut state = state.borrow_mut();
        let next = state.task_queue.pop()?;
        state.now = next.frame;
        Some(next.task)
      });
      match task {
        Some(task) => task(),
        None => break,
      }
    }
  }
}

// ==================== Marble Parsing ====================

/// Parse a marble diagram into `(frame, notification)` pairs. Frames are
/// relative to `^` when present, so they can be negative.
pub fn parse_marbles(marbles: &str) -> Vec<(isize, MarbleNotification<char>)> {
  let offset = marbles.find('^').map_or(0, |i| i as isize);
  let mut group_start = None;
  let mut events = vec![];
  for (i, c) in marbles.chars().enumerate() {
    let frame = i as isize - offset;
    let notification = match c {
      '-' | ' ' | '^' => continue,
      '(' => {
        group_start = Some(frame);
        continue;
      }
      ')' => {
        group_start = None;
        continue;
      }
      '|' => Notification::Complete,
      '#' => Notification::Error(MARBLE_ERROR),
      v => Notification::Next(v),
    };
    events.push((group_start.unwrap_or(frame), notification));
  }
  events
}

/// Expected output of a marble diagram, with every value character replaced
/// by its entry in `values`.
pub fn expect_marbles<T: Clone>(
  marbles: &str, values: &[(char, T)],
) -> Vec<(Frame, MarbleNotification<T>)> {
  parse_marbles(marbles)
    .into_iter()
    .map(|(frame, notification)| {
      let notification = match notification {
        Notification::Next(key) => {
          let value = values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("no value for marble `{key}`"));
          Notification::Next(value)
        }
        Notification::Error(err) => Notification::Error(err),
        Notification::Complete => Notification::Complete,
      };
      (frame as Frame, notification)
    })
    .collect()
}

/// When a test stream was subscribed and, if it was, released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionLog {
  pub start: Frame,
  pub end: Option<Frame>,
}

/// Parse a subscription diagram such as `"  ^     !"` or `"(^!)"`.
pub fn sub_marbles(marbles: &str) -> SubscriptionLog {
  let mut group_start = None;
  let mut start = None;
  let mut end = None;
  for (frame, c) in marbles.chars().enumerate() {
    match c {
      '(' => group_start = Some(frame),
      ')' => group_start = None,
      '^' => start = Some(group_start.unwrap_or(frame)),
      '!' => end = Some(group_start.unwrap_or(frame)),
      _ => {}
    }
  }
  SubscriptionLog { start: start.unwrap_or(0), end }
}

pub fn no_subscriptions() -> Vec<SubscriptionLog> { vec![] }

type Logs = MutRc<Vec<SubscriptionLog>>;

fn open_log(logs: &Logs) -> usize {
  let mut logs = logs.rc_deref_mut();
  logs.push(SubscriptionLog { start: TestScheduler::now(), end: None });
  logs.len() - 1
}

fn close_log(logs: &Logs, index: usize) {
  let mut logs = logs.rc_deref_mut();
  let log = &mut logs[index];
  if log.end.is_none() {
    log.end = Some(TestScheduler::now());
  }
}

/// Subscription of a test stream. Records the release frame.
pub struct LoggedSubscription<U> {
  inner: U,
  logs: Logs,
  index: usize,
}

impl<U: Subscription> Subscription for LoggedSubscription<U> {
  fn unsubscribe(self) {
    close_log(&self.logs, self.index);
    self.inner.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.inner.is_closed() }
}

// ==================== Hot Streams ====================

/// A stream whose events happen on fixed frames whether or not anyone is
/// subscribed.
#[derive(Clone)]
pub struct Hot {
  subject: Subject<char, &'static str>,
  logs: Logs,
}

/// Create a hot stream. Its events are scheduled right away.
pub fn hot(marbles: &str) -> Hot {
  let subject = Subject::new();
  for (frame, notification) in parse_marbles(marbles) {
    if frame < 0 {
      continue;
    }
    let mut subject = subject.clone();
    TestScheduler::schedule(frame as Frame, move || match notification {
      Notification::Next(v) => subject.next(v),
      Notification::Error(err) => subject.error(err),
      Notification::Complete => subject.complete(),
    });
  }
  Hot { subject, logs: Logs::default() }
}

impl Hot {
  pub fn subscriptions(&self) -> Vec<SubscriptionLog> { self.logs.rc_deref().clone() }
}

impl ObservableType for Hot {
  type Item = char;
  type Err = &'static str;
}

impl<O> CoreObservable<O> for Hot
where
  O: Observer<char, &'static str> + 'static,
{
  type Unsub = LoggedSubscription<SubjectSubscription<char, &'static str>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let index = open_log(&self.logs);
    let inner = self.subject.actual_subscribe(observer);
    LoggedSubscription { inner, logs: self.logs, index }
  }
}

// ==================== Cold Streams ====================

/// A stream that replays its diagram, relative to the subscription frame, for
/// every subscriber.
#[derive(Clone)]
pub struct Cold {
  events: Rc<Vec<(Frame, MarbleNotification<char>)>>,
  logs: Logs,
}

pub fn cold(marbles: &str) -> Cold {
  let events = parse_marbles(marbles)
    .into_iter()
    .map(|(frame, notification)| (frame.max(0) as Frame, notification))
    .collect();
  Cold { events: Rc::new(events), logs: Logs::default() }
}

impl Cold {
  pub fn subscriptions(&self) -> Vec<SubscriptionLog> { self.logs.rc_deref().clone() }
}

/// Stops the pending events of one cold subscription.
pub struct ColdSubscription(CellRc<bool>);

impl Subscription for ColdSubscription {
  fn unsubscribe(self) { self.0.set(false); }

  fn is_closed(&self) -> bool { !self.0.get() }
}

impl ObservableType for Cold {
  type Item = char;
  type Err = &'static str;
}

impl<O> CoreObservable<O> for Cold
where
  O: Observer<char, &'static str> + 'static,
{
  type Unsub = LoggedSubscription<ColdSubscription>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let now = TestScheduler::now();
    let index = open_log(&self.logs);
    let observer = MutRc::own(Some(observer));
    let active = CellRc::new(true);

    for (frame, notification) in self.events.iter().cloned() {
      let mut observer = observer.clone();
      let active = active.clone();
      let logs = self.logs.clone();
      TestScheduler::schedule(now + frame, move || {
        if !active.get() {
          return;
        }
        match notification {
          Notification::Next(v) => Observer::<char, &'static str>::next(&mut observer, v),
          Notification::Error(err) => {
            active.set(false);
            close_log(&logs, index);
            Observer::<char, &'static str>::error(observer, err);
          }
          Notification::Complete => {
            active.set(false);
            close_log(&logs, index);
            Observer::<char, &'static str>::complete(observer);
          }
        }
      });
    }

    LoggedSubscription { inner: ColdSubscription(active), logs: self.logs, index }
  }
}

// ==================== Recording ====================

/// Observer that records every notification with the frame it arrived on.
pub struct Recorder<Item>(MutRc<Vec<(Frame, MarbleNotification<Item>)>>);

impl<Item> Clone for Recorder<Item> {
  fn clone(&self) -> Self { Recorder(self.0.clone()) }
}

impl<Item> Recorder<Item> {
  pub fn new() -> Self { Recorder(MutRc::own(vec![])) }

  fn record(&self, notification: MarbleNotification<Item>) {
    self
      .0
      .rc_deref_mut()
      .push((TestScheduler::now(), notification));
  }
}

impl<Item: Clone> Recorder<Item> {
  pub fn records(&self) -> Vec<(Frame, MarbleNotification<Item>)> { self.0.rc_deref().clone() }
}

impl<Item> Observer<Item, &'static str> for Recorder<Item> {
  fn next(&mut self, value: Item) { self.record(Notification::Next(value)); }

  fn error(self, err: &'static str) { self.record(Notification::Error(err)); }

  fn complete(self) { self.record(Notification::Complete); }

  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxtoggle_macro::test(marble)]
  fn parses_groups_and_hot_offsets() {
    assert_eq!(
      parse_marbles("-a-^-b-(c|)"),
      vec![
        (-2, Notification::Next('a')),
        (2, Notification::Next('b')),
        (4, Notification::Next('c')),
        (4, Notification::Complete),
      ]
    );
    assert_eq!(parse_marbles("--#"), vec![(2, Notification::Error(MARBLE_ERROR))]);
  }

  #[rxtoggle_macro::test(marble)]
  fn parses_subscription_marbles() {
    assert_eq!(sub_marbles("  ^   !"), SubscriptionLog { start: 2, end: Some(6) });
    assert_eq!(sub_marbles("   (^!)"), SubscriptionLog { start: 3, end: Some(3) });
    assert_eq!(sub_marbles("^"), SubscriptionLog { start: 0, end: None });
  }

  #[rxtoggle_macro::test(marble)]
  fn tasks_run_by_frame_then_fifo() {
    let order = MutRc::own(vec![]);
    for (frame, tag) in [(2, 'c'), (1, 'a'), (2, 'd'), (1, 'b')] {
      let order = order.clone();
      TestScheduler::schedule(frame, move || order.rc_deref_mut().push((TestScheduler::now(), tag)));
    }
    TestScheduler::flush();
    assert_eq!(*order.rc_deref(), vec![(1, 'a'), (1, 'b'), (2, 'c'), (2, 'd')]);
  }

  #[rxtoggle_macro::test(marble)]
  fn cold_stream_replays_per_subscriber() {
    let stream = cold("-a-|");
    let first = Recorder::new();
    stream.clone().actual_subscribe(first.clone());
    let second = Recorder::new();
    let late = stream.clone();
    let second_c = second.clone();
    TestScheduler::schedule(5, move || {
      late.actual_subscribe(second_c);
    });
    TestScheduler::flush();

    assert_eq!(first.records(), expect_marbles("-a-|", &[('a', 'a')]));
    assert_eq!(second.records(), expect_marbles("------a-|", &[('a', 'a')]));
    assert_eq!(
      stream.subscriptions(),
      vec![sub_marbles("^  !"), sub_marbles("     ^  !")]
    );
  }

  #[rxtoggle_macro::test(marble)]
  fn hot_stream_drops_events_before_subscription() {
    let stream = hot("-a-^-b-c-|");
    let recorder = Recorder::new();
    let sub = stream.clone().actual_subscribe(recorder.clone());
    TestScheduler::unsubscribe_at("   !", sub);
    TestScheduler::flush();

    assert_eq!(recorder.records(), expect_marbles("--b", &[('b', 'b')]));
    assert_eq!(stream.subscriptions(), vec![sub_marbles("^  !")]);
  }
}
