//! URL path normalization.
//!
//! # Responsibilities
//! - Collapse repeated slashes
//! - Remove `.` elements and resolve `..` elements
//! - Guarantee a leading slash, keep a trailing one
//!
//! # Design Decisions
//! - Pure function, never fails
//! - Already-clean input is returned borrowed (no allocation)
//! - `..` never climbs above the root

use std::borrow::Cow;

/// Returns the canonical form of `path`.
///
/// The rules are applied iteratively until no further processing can be done:
/// 1. Replace multiple slashes with a single slash.
/// 2. Eliminate each `.` path name element (the current directory).
/// 3. Eliminate each inner `..` path name element (the parent directory)
///    along with the non-`..` element that precedes it.
/// 4. Eliminate `..` elements that begin a rooted path, that is, replace
///    `/..` by `/` at the beginning of a path.
///
/// An empty input returns `/`. A trailing slash is preserved.
///
/// ```
/// use trie_router::routing::clean_path;
///
/// assert_eq!(clean_path("/a/../b//c"), "/b/c");
/// assert_eq!(clean_path(""), "/");
/// assert_eq!(clean_path("docs/./api/"), "/docs/api/");
/// ```
pub fn clean_path(path: &str) -> Cow<'_, str> {
    if path.is_empty() {
        return Cow::Borrowed("/");
    }

    let p = path.as_bytes();
    let n = p.len();

    // read position; writes go through the buffer
    let mut r = 1;
    let mut buf = LazyBuf::new(path);

    if p[0] != b'/' {
        r = 0;
        buf.prepend_slash();
    }

    let mut trailing = n > 1 && p[n - 1] == b'/';

    while r < n {
        if p[r] == b'/' {
            // empty element
            r += 1;
        } else if p[r] == b'.' && r + 1 == n {
            trailing = true;
            r += 1;
        } else if p[r] == b'.' && p[r + 1] == b'/' {
            // . element
            r += 2;
        } else if p[r] == b'.' && p[r + 1] == b'.' && (r + 2 == n || p[r + 2] == b'/') {
            // .. element: remove to last /
            r += 3;
            buf.pop_element();
        } else {
            // real path element, add slash if needed
            if buf.len() > 1 {
                buf.push(b'/');
            }
            while r < n && p[r] != b'/' {
                buf.push(p[r]);
                r += 1;
            }
        }
    }

    if trailing && buf.len() > 1 {
        buf.push(b'/');
    }

    buf.finish()
}

/// Write buffer that only allocates once the output diverges from the input.
struct LazyBuf<'a> {
    input: &'a str,
    buf: Option<Vec<u8>>,
    w: usize,
}

impl<'a> LazyBuf<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            buf: None,
            w: 1,
        }
    }

    fn len(&self) -> usize {
        self.w
    }

    fn prepend_slash(&mut self) {
        let mut buf = Vec::with_capacity(self.input.len() + 1);
        buf.push(b'/');
        self.buf = Some(buf);
        self.w = 1;
    }

    fn byte_at(&self, i: usize) -> u8 {
        match &self.buf {
            Some(buf) => buf[i],
            None => self.input.as_bytes()[i],
        }
    }

    fn push(&mut self, c: u8) {
        if self.buf.is_none() {
            if self.input.as_bytes().get(self.w) == Some(&c) {
                self.w += 1;
                return;
            }
            let mut buf = Vec::with_capacity(self.input.len() + 1);
            buf.extend_from_slice(&self.input.as_bytes()[..self.w]);
            self.buf = Some(buf);
        }
        if let Some(buf) = &mut self.buf {
            buf.truncate(self.w);
            buf.push(c);
        }
        self.w += 1;
    }

    fn pop_element(&mut self) {
        if self.w > 1 {
            self.w -= 1;
            while self.w > 1 && self.byte_at(self.w) != b'/' {
                self.w -= 1;
            }
        }
    }

    fn finish(self) -> Cow<'a, str> {
        match self.buf {
            None => Cow::Borrowed(&self.input[..self.w]),
            Some(mut buf) => {
                buf.truncate(self.w);
                match String::from_utf8(buf) {
                    Ok(s) => Cow::Owned(s),
                    Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CLEAN_TESTS: &[(&str, &str)] = &[
        // already clean
        ("/", "/"),
        ("/abc", "/abc"),
        ("/a/b/c", "/a/b/c"),
        ("/abc/", "/abc/"),
        ("/a/b/c/", "/a/b/c/"),
        // missing root
        ("", "/"),
        ("a/", "/a/"),
        ("abc", "/abc"),
        ("abc/def", "/abc/def"),
        ("a/b/c", "/a/b/c"),
        // remove doubled slash
        ("//", "/"),
        ("/abc//", "/abc/"),
        ("/abc/def//", "/abc/def/"),
        ("/a/b/c//", "/a/b/c/"),
        ("/abc//def//ghi", "/abc/def/ghi"),
        ("//abc", "/abc"),
        ("///abc", "/abc"),
        ("//abc//", "/abc/"),
        // remove . elements
        (".", "/"),
        ("./", "/"),
        ("/abc/./def", "/abc/def"),
        ("/./abc/def", "/abc/def"),
        ("/abc/.", "/abc/"),
        // remove .. elements
        ("..", "/"),
        ("../", "/"),
        ("../../", "/"),
        ("../..", "/"),
        ("../../abc", "/abc"),
        ("/abc/def/ghi/../jkl", "/abc/def/jkl"),
        ("/abc/def/../ghi/../jkl", "/abc/jkl"),
        ("/abc/def/..", "/abc"),
        ("/abc/def/../..", "/"),
        ("/abc/def/../../..", "/"),
        ("/abc/def/../../../ghi/jkl/../../../mno", "/mno"),
        // combinations
        ("abc/./../def", "/def"),
        ("abc//./../def", "/def"),
        ("abc/../../././../def", "/def"),
        ("/a/../b//c", "/b/c"),
    ];

    #[test]
    fn test_clean_path() {
        for (input, expected) in CLEAN_TESTS {
            assert_eq!(clean_path(input), *expected, "clean_path({:?})", input);
            assert_eq!(clean_path(expected), *expected, "clean_path({:?})", expected);
        }
    }

    #[test]
    fn test_clean_path_borrows_canonical_input() {
        for input in ["/", "/abc", "/a/b/c/", "/ünïcode/päth"] {
            assert!(matches!(clean_path(input), Cow::Borrowed(_)), "{input}");
        }
        assert!(matches!(clean_path("/abc//def"), Cow::Owned(_)));
    }

    #[test]
    fn test_clean_path_multibyte() {
        assert_eq!(clean_path("/über//straße/../weg"), "/über/weg");
        assert_eq!(clean_path("日本/./語/"), "/日本/語/");
    }

    #[test]
    fn test_clean_long_paths() {
        let input = "/abc/".repeat(100) + "..";
        let expected = "/abc".repeat(99);
        assert_eq!(clean_path(&input), expected);
    }

    proptest! {
        #[test]
        fn clean_path_is_idempotent(path in "[/.abé]{0,32}") {
            let once = clean_path(&path).into_owned();
            let twice = clean_path(&once).into_owned();
            prop_assert_eq!(&once, &twice);
            prop_assert!(once.starts_with('/'));
            prop_assert!(!once.contains("//"));
        }
    }
}
