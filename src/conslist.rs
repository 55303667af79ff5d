//! Persistent singly-linked list built from reference-counted cons cells.
//!
//! A [`ConsList`] is either empty or a pair of a head element and a tail list.
//! Lists are immutable: [`ConsList::prepend`] and [`ConsList::append`] return new
//! lists and leave the receiver untouched. `prepend` shares the receiver as the new
//! tail in O(1); `append` has to copy every cell since tails cannot be rewritten.

use std::fmt;
use std::rc::Rc;

struct Cons<T> {
    head: T,
    tail: Option<Rc<Cons<T>>>,
}

/// Immutable list handle. Cloning is O(1) and shares every cell.
pub struct ConsList<T> {
    cell: Option<Rc<Cons<T>>>,
    len: usize,
}

impl<T> ConsList<T> {
    /// The empty list
    pub fn nil() -> Self {
        ConsList { cell: None, len: 0 }
    }

    pub fn singleton(value: T) -> Self {
        Self::nil().prepend(value)
    }

    pub fn is_empty(&self) -> bool {
        self.cell.is_none()
    }

    /// Number of elements, O(1)
    pub fn len(&self) -> usize {
        self.len
    }

    /// First element, `None` for the empty list
    pub fn car(&self) -> Option<&T> {
        self.cell.as_deref().map(|cell| &cell.head)
    }

    /// Everything but the first element. The tail of the empty list is empty.
    pub fn cdr(&self) -> ConsList<T> {
        match &self.cell {
            Some(cell) => ConsList {
                cell: cell.tail.clone(),
                len: self.len - 1,
            },
            None => Self::nil(),
        }
    }

    /// New list with `value` in front of this one, sharing this list as its tail
    pub fn prepend(&self, value: T) -> ConsList<T> {
        ConsList {
            cell: Some(Rc::new(Cons {
                head: value,
                tail: self.cell.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Element at index `n`, O(n)
    pub fn nth(&self, n: usize) -> Option<&T> {
        self.iter().nth(n)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.cell.as_deref(),
            remaining: self.len,
        }
    }

    /// New list holding `f` applied to every element, in order
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> ConsList<U> {
        self.iter().map(f).collect()
    }

    /// Left fold starting from `identity`
    pub fn fold<A>(&self, identity: A, f: impl FnMut(A, &T) -> A) -> A {
        self.iter().fold(identity, f)
    }
}

impl<T: Clone> ConsList<T> {
    /// New list with `value` after the last element. Copies every cell.
    pub fn append(&self, value: T) -> ConsList<T> {
        let elements: Vec<&T> = self.iter().collect();
        elements
            .into_iter()
            .rev()
            .fold(ConsList::singleton(value), |list, element| {
                list.prepend(element.clone())
            })
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Clone for ConsList<T> {
    fn clone(&self) -> Self {
        ConsList {
            cell: self.cell.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for ConsList<T> {
    fn default() -> Self {
        Self::nil()
    }
}

// Unlink cells one at a time; the default recursive drop overflows the stack on long lists.
impl<T> Drop for ConsList<T> {
    fn drop(&mut self) {
        let mut next = self.cell.take();
        while let Some(cell) = next {
            match Rc::try_unwrap(cell) {
                Ok(mut cell) => next = cell.tail.take(),
                Err(_) => break, // still shared by another list
            }
        }
    }
}

/// Borrowing iterator over a [`ConsList`]
pub struct Iter<'a, T> {
    next: Option<&'a Cons<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        self.next = cell.tail.as_deref();
        self.remaining -= 1;
        Some(&cell.head)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a ConsList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> FromIterator<T> for ConsList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let elements: Vec<T> = iter.into_iter().collect();
        elements
            .into_iter()
            .rev()
            .fold(ConsList::nil(), |list, element| list.prepend(element))
    }
}

impl<T> From<Vec<T>> for ConsList<T> {
    fn from(elements: Vec<T>) -> Self {
        elements.into_iter().collect()
    }
}

impl<T: PartialEq> PartialEq for ConsList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ConsList<T> {}

impl<T: fmt::Debug> fmt::Debug for ConsList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for ConsList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, element) in self.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{element}")?;
        }
        write!(f, ")")
    }
}
