//! Call-site identifiers threaded through every arena operation so that
//! diagnostics can name the caller.

use std::fmt;

/// Source location of the caller of an arena operation.
///
/// Usually built with the [`site!`](crate::site!) macro, which captures the
/// file and line where it is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    pub file: &'static str,
    pub line: u32,
}

impl Site {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Expands to the [`Site`] of the macro invocation.
///
/// ```rust
/// use arenalloc::{Arena, site};
///
/// let mut arena = Arena::<1024>::new();
/// let ptr = arena.allocate(16, site!()).unwrap();
/// arena.deallocate(Some(ptr), site!()).unwrap();
/// ```
#[macro_export]
macro_rules! site {
    () => {
        $crate::Site::new(file!(), line!())
    };
}
