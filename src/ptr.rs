//! Shared ownership for IR and schedule objects.
//!
//! The count lives in the same allocation as the value, so a handle can be
//! recovered from the object itself and two handles to the same object can
//! never disagree about its count. Counting is non-atomic: handles must not be
//! shared between threads.
//!
//! Reference cycles are not supported. Nothing in the IR forms one, and a
//! cycle built by hand leaks rather than being freed.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Anything whose lifetime is governed by a shared count.
pub trait RefCounted {
    /// The number of live handles to the underlying object,
    /// or zero for an undefined handle.
    fn ref_count(&self) -> usize;
}

/// A nullable owning handle. Cloning increments the count, dropping
/// decrements it, and the value is destroyed when the last handle goes.
pub struct IntrusivePtr<T> {
    ptr: Option<Rc<T>>
}

impl<T> IntrusivePtr<T> {
    pub fn new(value: T) -> IntrusivePtr<T> {
        IntrusivePtr { ptr: Some(Rc::new(value)) }
    }

    pub fn null() -> IntrusivePtr<T> {
        IntrusivePtr { ptr: None }
    }

    pub fn defined(&self) -> bool {
        self.ptr.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.ptr.as_deref()
    }

    /// Equality of reference, not of value.
    pub fn same_as(&self, other: &IntrusivePtr<T>) -> bool {
        match (&self.ptr, &other.ptr) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false
        }
    }

    /// The raw address of the pointee, or null.
    pub fn as_ptr(&self) -> *const T {
        match &self.ptr {
            Some(p) => Rc::as_ptr(p),
            None => std::ptr::null()
        }
    }
}

impl<T> RefCounted for IntrusivePtr<T> {
    fn ref_count(&self) -> usize {
        self.ptr.as_ref().map_or(0, Rc::strong_count)
    }
}

impl<T> Clone for IntrusivePtr<T> {
    fn clone(&self) -> IntrusivePtr<T> {
        IntrusivePtr { ptr: self.ptr.clone() }
    }
}

impl<T> Default for IntrusivePtr<T> {
    fn default() -> IntrusivePtr<T> {
        IntrusivePtr::null()
    }
}

impl<T> From<Rc<T>> for IntrusivePtr<T> {
    fn from(rc: Rc<T>) -> IntrusivePtr<T> {
        IntrusivePtr { ptr: Some(rc) }
    }
}

// Comparisons are by address so handles can key ordered containers.
impl<T> PartialEq for IntrusivePtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<T> Eq for IntrusivePtr<T> {}

impl<T> PartialOrd for IntrusivePtr<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for IntrusivePtr<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_ptr().cmp(&other.as_ptr())
    }
}

impl<T> Hash for IntrusivePtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_ptr().hash(state);
    }
}

impl<T: fmt::Debug> fmt::Debug for IntrusivePtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.ptr {
            Some(p) => write!(f, "IntrusivePtr({:?})", p),
            None => write!(f, "IntrusivePtr(null)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::BTreeSet;

    /// Counts how many times it has been destroyed.
    struct DropCounter<'a> {
        drops: &'a Cell<usize>
    }

    impl<'a> Drop for DropCounter<'a> {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn test_lifetime_ends_with_last_handle() {
        let drops = Cell::new(0);
        let a = IntrusivePtr::new(DropCounter { drops: &drops });
        let b = a.clone();
        let c = b.clone();
        assert_eq!(a.ref_count(), 3);

        drop(a);
        drop(c);
        assert_eq!(drops.get(), 0);
        assert_eq!(b.ref_count(), 1);

        drop(b);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn test_reassignment_releases_old_target() {
        let drops = Cell::new(0);
        let mut a = IntrusivePtr::new(DropCounter { drops: &drops });
        let b = IntrusivePtr::new(DropCounter { drops: &drops });

        a = b.clone();
        assert_eq!(drops.get(), 1);
        assert!(a.same_as(&b));
        assert_eq!(b.ref_count(), 2);

        // Self-assignment keeps the target alive.
        a = a.clone();
        assert_eq!(drops.get(), 1);
        assert_eq!(a.ref_count(), 2);
    }

    #[test]
    fn test_assign_from_value_owned_by_old_target() {
        struct Node<'a> {
            _counter: DropCounter<'a>,
            child: IntrusivePtr<DropCounter<'a>>
        }

        let drops = Cell::new(0);
        let child = IntrusivePtr::new(DropCounter { drops: &drops });
        let parent = IntrusivePtr::new(Node { _counter: DropCounter { drops: &drops }, child });

        let mut handle = IntrusivePtr::null();
        assert!(!handle.defined());
        handle = match parent.get() {
            Some(node) => node.child.clone(),
            None => unreachable!()
        };
        drop(parent);

        // Only the parent has gone; the child survives through `handle`.
        assert_eq!(drops.get(), 1);
        assert_eq!(handle.ref_count(), 1);
    }

    #[test]
    fn test_address_ordering_and_identity() {
        let a = IntrusivePtr::new(1);
        let b = IntrusivePtr::new(1);
        assert!(!a.same_as(&b));
        assert!(a.same_as(&a.clone()));
        assert!(IntrusivePtr::<i32>::null().same_as(&IntrusivePtr::null()));

        let set: BTreeSet<_> = vec![a.clone(), b.clone(), a.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }
}
