use smallvec::SmallVec;

/// An id-keyed, insertion-ordered collection of entries.
///
/// Used wherever an owner manages an unbounded, dynamically changing set of
/// children that are created and destroyed in arbitrary order: the
/// subscribers of a `Subject` and the open buffers of `buffer_toggle`.
///
/// - Ids come from a monotonically increasing counter and are never reused.
/// - Entries are kept sorted by id, so iteration order is the order ids were
///   handed out and lookups by id are a binary search. Removing an entry
///   never moves the relative position of the others.
/// - `reserve_id` + `insert` supports the cyclic case where the id must be
///   known (e.g. captured by an observer) before the entry exists.
///
/// # Examples
///
/// ```rust
/// use rxtoggle::subscription::DynamicSubscriptions;
///
/// let mut subs: DynamicSubscriptions<()> = DynamicSubscriptions::default();
///
/// let id1 = subs.add(());
/// let id2 = subs.reserve_id();
/// subs.insert(id2, ());
/// assert_eq!(subs.len(), 2);
///
/// assert!(subs.remove(id1).is_some());
/// assert_eq!(subs.len(), 1);
/// ```
pub struct DynamicSubscriptions<U> {
  next_id: usize,
  items: SmallVec<[(usize, U); 2]>,
}

impl<U> Default for DynamicSubscriptions<U> {
  fn default() -> Self { Self { next_id: 0, items: SmallVec::new() } }
}

impl<U> DynamicSubscriptions<U> {
  #[inline]
  pub fn new() -> Self { Self::default() }

  /// Add an item and return its unique ID.
  #[inline]
  pub fn add(&mut self, item: U) -> usize {
    let id = self.reserve_id();
    self.items.push((id, item));
    id
  }

  /// Reserve the next ID without adding an item.
  #[inline]
  pub fn reserve_id(&mut self) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    id
  }

  /// Insert an item under an ID obtained from `reserve_id()`, replacing any
  /// item already stored under it.
  pub fn insert(&mut self, id: usize, item: U) {
    match self.position(id) {
      Ok(pos) => self.items[pos].1 = item,
      Err(pos) => self.items.insert(pos, (id, item)),
    }
  }

  /// Remove an item by ID, preserving the order of the remaining items.
  pub fn remove(&mut self, id: usize) -> Option<U> {
    self
      .position(id)
      .ok()
      .map(|pos| self.items.remove(pos).1)
  }

  #[inline]
  pub fn contains(&self, id: usize) -> bool { self.position(id).is_ok() }

  pub fn get_mut(&mut self, id: usize) -> Option<&mut U> {
    let pos = self.position(id).ok()?;
    Some(&mut self.items[pos].1)
  }

  #[inline]
  fn position(&self, id: usize) -> Result<usize, usize> {
    self.items.binary_search_by_key(&id, |(i, _)| *i)
  }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  /// Drain all items in insertion order.
  #[inline]
  pub fn drain(&mut self) -> impl Iterator<Item = U> + '_ {
    self.items.drain(..).map(|(_, item)| item)
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = &U> { self.items.iter().map(|(_, item)| item) }

  #[inline]
  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut U> {
    self.items.iter_mut().map(|(_, item)| item)
  }

  /// IDs in iteration order.
  pub fn ids(&self) -> impl Iterator<Item = usize> + '_ { self.items.iter().map(|(id, _)| *id) }
}
