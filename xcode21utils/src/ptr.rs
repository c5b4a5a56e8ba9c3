//!
//! # Shared-Pointer Types
//!

// Std-lib
use std::hash::{Hash, Hasher};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock, Weak};

// Crates.io
use by_address::ByAddress;

///
/// # Ptr
///
/// Internal type-alias for shared project-graph and configuration pointers.
/// All are thread-safe and reference-counted "smart pointers".
///
/// Attribute access is largely forwarded through [Deref] calls,
/// allowing for fairly natural syntax after grabbing `read()` or `write()` access.
/// For example:
///
/// ```text
/// let data = ptr.read()?;
/// data.some_function();
/// let x = data.some_attribute;
/// ```
///
/// [Ptr] also uses the [ByAddress] struct to allow for comparisons
/// and hashes *by address* (i.e. pointer value).
/// Object-pointers in particular are commonly used as hash-keys and
/// set-members in operations such as reference-sweeps over the project
/// graph, in which many of the nodes are shared.
///
#[derive(Debug, Default)]
pub struct Ptr<T: ?Sized>(ByAddress<Arc<RwLock<T>>>);

impl<T> Ptr<T> {
    /// Pointer Constructor
    pub fn new(i: T) -> Self {
        Self(ByAddress(Arc::new(RwLock::new(i))))
    }
    /// Create a [WeakPtr] handle onto the same allocation.
    pub fn downgrade(&self) -> WeakPtr<T> {
        WeakPtr(Arc::downgrade(&(self.0).0))
    }
}
impl<T> From<T> for Ptr<T> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}
impl<T> Deref for Ptr<T> {
    type Target = ByAddress<Arc<RwLock<T>>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<T> DerefMut for Ptr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
// Having a [Deref] implementation seems to screw with the auto-`derive`d implementations
// of a few key traits. Conveniently, they're all quite short.
impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self(ByAddress::clone(&self.0))
    }
}
impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl<T> Eq for Ptr<T> {}
impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

///
/// # WeakPtr
///
/// The non-owning counterpart to [Ptr].
/// Wraps a [std::sync::Weak] onto the same allocation, and produces a [Ptr]
/// again via [WeakPtr::upgrade] - or `None`, if all strong [Ptr]s have been dropped.
///
/// A detached [WeakPtr] remains a valid value; only dereferencing it
/// reports "not present". Comparisons are by address, consistent with [Ptr].
///
#[derive(Debug)]
pub struct WeakPtr<T: ?Sized>(Weak<RwLock<T>>);

impl<T> WeakPtr<T> {
    /// Create a [WeakPtr] which points at nothing, and never upgrades.
    pub fn detached() -> Self {
        Self(Weak::new())
    }
    /// Attempt to upgrade to a strong [Ptr].
    /// Returns `None` if the target has been dropped.
    pub fn upgrade(&self) -> Option<Ptr<T>> {
        self.0.upgrade().map(|arc| Ptr(ByAddress(arc)))
    }
    /// Boolean indication of whether `self` and `other` point at the same allocation.
    pub fn ptr_eq(&self, other: &Ptr<T>) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&(other.0).0))
    }
}
impl<T> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}
impl<T> Default for WeakPtr<T> {
    fn default() -> Self {
        Self::detached()
    }
}
impl<T> PartialEq for WeakPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}
impl<T> Eq for WeakPtr<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ptr() {
        let p1 = Ptr::new(43);
        let p2 = Ptr::new(43);
        assert_ne!(p1, p2);

        let p3 = p1.clone();
        assert_ne!(p3, p2);
        assert_eq!(p3, p1);
    }
    #[test]
    fn test_weak_ptr() {
        let p = Ptr::new(String::from("hi"));
        let w = p.downgrade();
        assert!(w.ptr_eq(&p));
        assert_eq!(w.upgrade(), Some(p.clone()));

        drop(p);
        assert_eq!(w.upgrade(), None);

        let detached = WeakPtr::<String>::detached();
        assert_eq!(detached.upgrade(), None);
    }
}
