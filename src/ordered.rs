// Ordered Collection: an append-only sequence sorted in place
//
// The comparison strategy is a type parameter, so the same bubble sort serves
// plain values, pointer-like elements and C strings.

use std::cmp::Ordering;
use std::ffi::CStr;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::ops::Deref;

// ============================================================================
// Comparison strategies
// ============================================================================

/// Decides how two elements of a sequence compare.
pub trait Comparator<T: ?Sized> {
    fn compare(&self, left: &T, right: &T) -> Ordering;
}

/// Compares elements by value. Incomparable pairs (NaN) count as equal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByValue;

impl<T: PartialOrd + ?Sized> Comparator<T> for ByValue {
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.partial_cmp(right).unwrap_or(Ordering::Equal)
    }
}

/// Compares what pointer-like elements point at, never their addresses.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByDeref;

impl<T> Comparator<T> for ByDeref
where
    T: Deref,
    T::Target: PartialOrd,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.deref()
            .partial_cmp(right.deref())
            .unwrap_or(Ordering::Equal)
    }
}

/// `strcmp` order: unsigned byte-by-byte, a prefix sorts first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByCStr;

impl<T: AsRef<CStr>> Comparator<T> for ByCStr {
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.as_ref().to_bytes().cmp(right.as_ref().to_bytes())
    }
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self(left, right)
    }
}

// ============================================================================
// OrderedSequence
// ============================================================================

#[derive(Debug, Clone)]
pub struct OrderedSequence<T, C = ByValue> {
    items: Vec<T>,
    comparator: C,
}

impl<T: PartialOrd> OrderedSequence<T, ByValue> {
    pub fn new() -> Self {
        Self::by_value()
    }

    pub fn by_value() -> Self {
        Self::with_comparator(ByValue)
    }
}

impl<T: Deref> OrderedSequence<T, ByDeref>
where
    T::Target: PartialOrd,
{
    pub fn by_deref() -> Self {
        Self::with_comparator(ByDeref)
    }
}

impl<T: AsRef<CStr>> OrderedSequence<T, ByCStr> {
    pub fn by_cstr() -> Self {
        Self::with_comparator(ByCStr)
    }
}

impl<T, C: Comparator<T>> OrderedSequence<T, C> {
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            items: Vec::new(),
            comparator,
        }
    }

    /// Adds `value` at the end. Allocation failure aborts the process.
    pub fn append(&mut self, value: T) {
        self.items.push(value);
    }

    /// Bubble sort in place. Only strictly greater neighbours are swapped,
    /// so equal elements keep their relative order.
    pub fn sort(&mut self) {
        let mut swaps = 0usize;
        for end in (1..=self.items.len()).rev() {
            for j in 1..end {
                if self.comparator.compare(&self.items[j - 1], &self.items[j]) == Ordering::Greater {
                    self.items.swap(j - 1, j);
                    swaps += 1;
                }
            }
        }
        tracing::trace!(len = self.items.len(), swaps, "sorted sequence");
    }

    pub fn is_sorted(&self) -> bool {
        self.items
            .windows(2)
            .all(|pair| self.comparator.compare(&pair[0], &pair[1]) != Ordering::Greater)
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }
}

impl<T, C> OrderedSequence<T, C> {
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Display, C> OrderedSequence<T, C> {
    /// Writes every element back to back, with no separator.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for item in &self.items {
            write!(out, "{item}")?;
        }
        Ok(())
    }

    pub fn write_lines<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for item in &self.items {
            writeln!(out, "{item}")?;
        }
        Ok(())
    }
}

impl OrderedSequence<String, ByValue> {
    /// Loads one element per line, without the line terminators.
    pub fn read_lines<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut sequence = Self::new();
        for line in reader.lines() {
            sequence.append(line?);
        }
        Ok(sequence)
    }
}

impl<T: PartialOrd> Default for OrderedSequence<T, ByValue> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> Deref for OrderedSequence<T, C> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T, C: Comparator<T> + Default> FromIterator<T> for OrderedSequence<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut sequence = Self::with_comparator(C::default());
        sequence.extend(iter);
        sequence
    }
}

impl<T, C> Extend<T> for OrderedSequence<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<'a, T, C> IntoIterator for &'a OrderedSequence<T, C> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T, C> IntoIterator for OrderedSequence<T, C> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
