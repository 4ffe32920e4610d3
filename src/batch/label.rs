use std::fmt;

/// Bytes reserved for a label, including the terminating NUL.
pub const LABEL_CAPACITY: usize = 40;

pub const DEFAULT_NAME: &str = "array elem";

/// A name stored inline in a fixed buffer.
///
/// Holds at most `LABEL_CAPACITY - 1` bytes. Longer names are cut on a
/// character boundary, and anything after an interior NUL is dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    bytes: [u8; LABEL_CAPACITY],
    len: usize,
}

impl Label {
    pub fn new(name: &str) -> Self {
        let name = name.find('\0').map_or(name, |nul| &name[..nul]);

        let mut end = name.len().min(LABEL_CAPACITY - 1);
        while !name.is_char_boundary(end) {
            end -= 1;
        }

        let mut bytes = [0u8; LABEL_CAPACITY];
        bytes[..end].copy_from_slice(&name.as_bytes()[..end]);
        Self { bytes, len: end }
    }

    pub fn as_str(&self) -> &str {
        // Only whole characters are ever copied in.
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", self.as_str())
    }
}
