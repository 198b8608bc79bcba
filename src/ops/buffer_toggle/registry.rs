use crate::subscription::{BoxedSubscription, DynamicSubscriptions};

/// A buffer that has been opened and not emitted yet.
pub struct OpenBuffer<Item> {
  values: Vec<Item>,
  /// Subscription to the stream that closes this buffer. `None` until that
  /// stream's `subscribe` call returns.
  closing: Option<BoxedSubscription>,
}

/// The open buffers of one `buffer_toggle` subscription, oldest first.
///
/// Buffers are keyed by an id that is reserved before the closing stream is
/// subscribed, so the closing observer can find its buffer even when the
/// closing stream fires during its own `subscribe` call.
pub struct BufferRegistry<Item> {
  buffers: DynamicSubscriptions<OpenBuffer<Item>>,
}

impl<Item> Default for BufferRegistry<Item> {
  fn default() -> Self { BufferRegistry { buffers: DynamicSubscriptions::new() } }
}

impl<Item> BufferRegistry<Item> {
  /// Open a new, empty buffer and return its id.
  pub fn open(&mut self) -> usize {
    let id = self.buffers.reserve_id();
    self
      .buffers
      .insert(id, OpenBuffer { values: Vec::new(), closing: None });
    id
  }

  /// Attach the closing subscription of buffer `id`.
  ///
  /// Hands the subscription back if the buffer is already gone, the caller
  /// must release it.
  pub fn attach_closing(
    &mut self, id: usize, closing: BoxedSubscription,
  ) -> Result<(), BoxedSubscription> {
    match self.buffers.get_mut(id) {
      Some(buffer) => {
        buffer.closing = Some(closing);
        Ok(())
      }
      None => Err(closing),
    }
  }

  /// Remove buffer `id`, returning its values and closing subscription.
  pub fn close(&mut self, id: usize) -> Option<(Vec<Item>, Option<BoxedSubscription>)> {
    self
      .buffers
      .remove(id)
      .map(|buffer| (buffer.values, buffer.closing))
  }

  /// Remove every buffer, oldest first. Values and closing subscriptions
  /// are returned separately.
  pub fn close_all(&mut self) -> (Vec<Vec<Item>>, Vec<BoxedSubscription>) {
    let mut values = Vec::with_capacity(self.buffers.len());
    let mut closings = Vec::with_capacity(self.buffers.len());
    for buffer in self.buffers.drain() {
      values.push(buffer.values);
      closings.extend(buffer.closing);
    }
    (values, closings)
  }

  /// Throw every buffer away and return the closing subscriptions to release.
  pub fn discard_all(&mut self) -> Vec<BoxedSubscription> {
    self
      .buffers
      .drain()
      .filter_map(|buffer| buffer.closing)
      .collect()
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.buffers.contains(id) }

  #[inline]
  pub fn len(&self) -> usize { self.buffers.len() }
}

impl<Item: Clone> BufferRegistry<Item> {
  /// Append `value` to every open buffer.
  pub fn push(&mut self, value: Item) {
    let mut buffers = self.buffers.iter_mut();
    let Some(mut current) = buffers.next() else { return };
    for next in buffers {
      current.values.push(value.clone());
      current = next;
    }
    current.values.push(value);
  }
}
