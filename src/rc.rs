use std::{
  cell::{Cell, Ref, RefCell, RefMut},
  rc::Rc,
};

/// Shared read access to the value behind a reference-counted pointer.
pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

/// Mutable access to the value behind a reference-counted pointer.
pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

/// Single-threaded shared mutable state: `Rc<RefCell<T>>` with the
/// `RcDeref`/`RcDerefMut` access surface operators are written against.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  /// Whether both handles point at the same allocation.
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// Mutable access, or `None` while the value is already borrowed.
  pub fn try_rc_deref_mut(&self) -> Option<RefMut<'_, T>> { self.0.try_borrow_mut().ok() }
}

impl<T> From<T> for MutRc<T> {
  fn from(t: T) -> Self { Self::own(t) }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> RcDeref for MutRc<T> {
  type Target<'a>
    = Ref<'a, T>
  where
    Self: 'a;
  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  type Target<'a>
    = RefMut<'a, T>
  where
    Self: 'a;
  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> { self.0.borrow_mut() }
}

/// A shared `Copy` flag or counter, read and written without borrowing.
#[derive(Default)]
pub struct CellRc<T: Copy>(Rc<Cell<T>>);

impl<T: Copy> CellRc<T> {
  pub fn new(v: T) -> Self { Self(Rc::new(Cell::new(v))) }

  #[inline]
  pub fn get(&self) -> T { self.0.get() }

  #[inline]
  pub fn set(&self, v: T) { self.0.set(v) }
}

impl<T: Copy> Clone for CellRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}
