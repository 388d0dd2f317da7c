//! Per-method radix tree.
//!
//! # Responsibilities
//! - Insert route patterns, splitting nodes on shared prefixes
//! - Exact lookup with parameter extraction and trailing-slash detection
//! - Case-insensitive lookup returning the registered casing
//! - Keep frequently used children first (priority ordering)
//!
//! # Design Decisions
//! - Segments are bytes; a split may fall inside a multi-byte character
//! - Static children are found through `indices`, the single wildcard child
//!   always sits in the last slot
//! - Lookup prefers the static child and falls back to the wildcard child;
//!   static siblings are never revisited
//! - A rejected insertion leaves the routing behaviour of the tree unchanged

use std::fmt;
use std::mem;

use crate::routing::error::RouteError;
use crate::routing::params::Params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// The tree root, which may have an empty segment.
    Root,
    /// Literal text.
    Static,
    /// `:name`, one path segment.
    Param,
    /// `/*name`, the rest of the path.
    CatchAll,
}

/// A node of the routing tree. The root node owns the whole tree.
pub struct Node<H> {
    segment: Vec<u8>,
    kind: NodeKind,
    wild_child: bool,
    indices: Vec<u8>,
    children: Vec<Node<H>>,
    handler: Option<H>,
    param_key: Box<str>,
    max_params: usize,
    priority: u32,
}

/// Result of [`Node::lookup`].
#[derive(Debug)]
pub struct Lookup<'n, 'p, H> {
    /// The matched handler, if any.
    pub handler: Option<&'n H>,
    /// Parameters of the matched route; empty on a miss.
    pub params: Params<'n, 'p>,
    /// No handler matched, but the path with its trailing slash toggled
    /// would.
    pub tsr: bool,
}

impl<H> Default for Node<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Node<H> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::with_kind(NodeKind::Root, &[])
    }

    fn with_kind(kind: NodeKind, segment: &[u8]) -> Self {
        let param_key: Box<str> = match kind {
            NodeKind::Param => String::from_utf8_lossy(&segment[1..]).into(),
            NodeKind::CatchAll => String::from_utf8_lossy(&segment[2..]).into(),
            NodeKind::Root | NodeKind::Static => Box::default(),
        };

        Self {
            segment: segment.to_vec(),
            kind,
            wild_child: false,
            indices: Vec::new(),
            children: Vec::new(),
            handler: None,
            param_key,
            max_params: 0,
            priority: 0,
        }
    }

    /// True if no route has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.segment.is_empty() && self.children.is_empty() && self.handler.is_none()
    }

    /// Number of routes registered in this tree.
    pub fn len(&self) -> usize {
        self.priority as usize
    }

    /// Registers `handler` for `pattern`.
    ///
    /// The pattern must start with `/` and may contain `:name` parameters and
    /// one final `*name` catch-all. Static and parameter siblings may coexist;
    /// wildcards at the same position must agree.
    pub fn insert(&mut self, pattern: &str, handler: H) -> Result<(), RouteError> {
        let params = check_pattern(pattern)?;
        let path = pattern.as_bytes();

        if self.is_empty() {
            self.kind = NodeKind::Root;
            self.fill(path, handler);
            self.record(path, params);
            return Ok(());
        }

        let mut node = &mut *self;
        let mut rest = path;

        loop {
            let common = common_prefix(rest, &node.segment);
            if common < node.segment.len() {
                node.split(common);
            }
            rest = &rest[common..];

            if rest.is_empty() {
                if node.handler.is_some() {
                    return Err(RouteError::Duplicate {
                        pattern: pattern.to_owned(),
                    });
                }
                node.handler = Some(handler);
                break;
            }

            let next = rest[0];

            // the '/' owned by a catch-all is already part of this segment
            if next == b'*' {
                return Err(RouteError::CatchAllConflict {
                    pattern: pattern.to_owned(),
                });
            }

            if next == b':' || rest.starts_with(b"/*") {
                if node.wild_child {
                    let i = node.children.len() - 1;
                    let wild = &node.children[i];
                    let seg = wild.segment.as_slice();

                    if wild.kind == NodeKind::CatchAll && rest == seg {
                        return Err(RouteError::Duplicate {
                            pattern: pattern.to_owned(),
                        });
                    }

                    let fits = wild.kind == NodeKind::Param
                        && rest.starts_with(seg)
                        && (rest.len() == seg.len() || rest[seg.len()] == b'/');
                    if !fits {
                        let end = if next == b':' {
                            segment_end(rest, 0)
                        } else {
                            rest.len()
                        };
                        return Err(RouteError::WildcardConflict {
                            pattern: pattern.to_owned(),
                            segment: String::from_utf8_lossy(&rest[..end]).into_owned(),
                            existing: String::from_utf8_lossy(seg).into_owned(),
                        });
                    }

                    node = &mut node.children[i];
                    continue;
                }

                if next == b'/' && node.indices.contains(&b'/') {
                    return Err(RouteError::CatchAllConflict {
                        pattern: pattern.to_owned(),
                    });
                }

                node.attach(rest, handler);
                break;
            }

            if next == b'/' && node.has_catch_all() {
                return Err(RouteError::CatchAllConflict {
                    pattern: pattern.to_owned(),
                });
            }

            if let Some(i) = node.indices.iter().position(|&b| b == next) {
                node = &mut node.children[i];
                continue;
            }

            node.attach(rest, handler);
            break;
        }

        self.record(path, params);
        Ok(())
    }

    /// Looks up the handler registered for `path`.
    ///
    /// `path` is matched verbatim; see [`clean_path`](crate::routing::clean_path)
    /// for normalization.
    pub fn lookup<'n, 'p>(&'n self, path: &'p str) -> Lookup<'n, 'p, H> {
        let mut params = Params::with_capacity(self.max_params);
        let mut tsr = false;

        let handler = self.match_node(path, 0, &mut params, &mut tsr);
        if handler.is_none() {
            params.clear();
        }

        Lookup {
            handler,
            params,
            tsr: handler.is_none() && tsr,
        }
    }

    /// Makes a case-insensitive lookup of `path` and returns the path as
    /// registered, with wildcard values copied from the input.
    ///
    /// With `fix_trailing_slash`, a missing or superfluous trailing slash is
    /// corrected as well.
    pub fn find_case_insensitive_path(&self, path: &str, fix_trailing_slash: bool) -> Option<String> {
        let mut out = Vec::with_capacity(path.len() + 1);

        if self.ci_match_node(path.as_bytes(), &mut out, fix_trailing_slash) {
            String::from_utf8(out).ok()
        } else {
            None
        }
    }

    fn wild(&self) -> Option<&Node<H>> {
        if self.wild_child {
            self.children.last()
        } else {
            None
        }
    }

    fn has_catch_all(&self) -> bool {
        matches!(self.wild(), Some(wild) if wild.kind == NodeKind::CatchAll)
    }

    /// True if the same path plus a trailing slash is routable from here.
    fn has_slash_route(&self) -> bool {
        if let Some(i) = self.indices.iter().position(|&b| b == b'/') {
            let child = &self.children[i];
            return child.segment == b"/" && child.handler.is_some();
        }
        self.has_catch_all()
    }

    // ---- insertion ----

    /// Turns an empty node into the chain for `path`.
    fn fill(&mut self, path: &[u8], handler: H) {
        let len = static_prefix_len(path);
        self.segment = path[..len].to_vec();

        if len < path.len() {
            self.attach(&path[len..], handler);
        } else {
            self.handler = Some(handler);
        }
    }

    /// Hangs a new chain for the non-empty `path` below this node.
    fn attach(&mut self, path: &[u8], handler: H) {
        if path[0] == b':' {
            let end = segment_end(path, 0);
            let mut wild = Node::with_kind(NodeKind::Param, &path[..end]);
            if end < path.len() {
                wild.attach(&path[end..], handler);
            } else {
                wild.handler = Some(handler);
            }
            self.children.push(wild);
            self.wild_child = true;
        } else if path.starts_with(b"/*") {
            let mut wild = Node::with_kind(NodeKind::CatchAll, path);
            wild.handler = Some(handler);
            self.children.push(wild);
            self.wild_child = true;
        } else {
            let mut child = Node::with_kind(NodeKind::Static, &[]);
            child.fill(path, handler);

            // static children go before the wildcard slot
            let i = self.indices.len();
            self.indices.push(path[0]);
            self.children.insert(i, child);
        }
    }

    /// Splits this node at `at`; the tail becomes the only child.
    fn split(&mut self, at: usize) {
        let child = Node {
            segment: self.segment[at..].to_vec(),
            kind: NodeKind::Static,
            wild_child: self.wild_child,
            indices: mem::take(&mut self.indices),
            children: mem::take(&mut self.children),
            handler: self.handler.take(),
            param_key: Box::default(),
            max_params: self.max_params,
            priority: self.priority,
        };

        self.indices = vec![child.segment[0]];
        self.children = vec![child];
        self.segment.truncate(at);
        self.wild_child = false;
    }

    /// Counts a freshly inserted route along its path and reorders siblings.
    fn record(&mut self, path: &[u8], params: usize) {
        self.priority += 1;
        self.max_params = self.max_params.max(params);

        let mut node = self;
        let mut rest = path.get(node.segment.len()..).unwrap_or_default();

        while let Some(&next) = rest.first() {
            let i = if node.wild_child && (next == b':' || rest.starts_with(b"/*")) {
                let i = node.children.len() - 1;
                node.children[i].priority += 1;
                i
            } else {
                match node.indices.iter().position(|&b| b == next) {
                    Some(i) => node.bump_child(i),
                    None => return,
                }
            };

            node = &mut node.children[i];
            node.max_params = node.max_params.max(params);
            rest = rest.get(node.segment.len()..).unwrap_or_default();
        }
    }

    /// Increments the priority of static child `i` and moves it forward past
    /// siblings with a lower priority. Returns its new position.
    fn bump_child(&mut self, i: usize) -> usize {
        self.children[i].priority += 1;
        let priority = self.children[i].priority;

        let mut pos = i;
        while pos > 0 && self.children[pos - 1].priority < priority {
            self.children.swap(pos - 1, pos);
            self.indices.swap(pos - 1, pos);
            pos -= 1;
        }
        pos
    }

    // ---- exact lookup ----

    fn match_node<'n, 'p>(
        &'n self,
        path: &'p str,
        pos: usize,
        params: &mut Params<'n, 'p>,
        tsr: &mut bool,
    ) -> Option<&'n H> {
        let rest = &path.as_bytes()[pos..];
        let seg = self.segment.as_slice();

        if rest.starts_with(seg) {
            return self.match_children(path, pos + seg.len(), params, tsr);
        }

        // the path stops one '/' short of this route
        if seg.len() == rest.len() + 1
            && seg[rest.len()] == b'/'
            && seg.starts_with(rest)
            && self.handler.is_some()
        {
            *tsr = true;
        }
        None
    }

    fn match_children<'n, 'p>(
        &'n self,
        path: &'p str,
        pos: usize,
        params: &mut Params<'n, 'p>,
        tsr: &mut bool,
    ) -> Option<&'n H> {
        let rest = &path.as_bytes()[pos..];

        let Some(&next) = rest.first() else {
            if self.handler.is_some() {
                return self.handler.as_ref();
            }
            if self.has_slash_route() {
                *tsr = true;
            }
            return None;
        };

        let mark = params.len();

        if let Some(i) = self.indices.iter().position(|&b| b == next) {
            if let Some(handler) = self.children[i].match_node(path, pos, params, tsr) {
                return Some(handler);
            }
            params.truncate(mark);
        }

        if let Some(wild) = self.wild() {
            match wild.kind {
                NodeKind::Param => {
                    let end = rest
                        .iter()
                        .position(|&b| b == b'/')
                        .map_or(path.len(), |k| pos + k);

                    // an empty segment binds "" when the route goes on
                    if let Some(value) = path.get(pos..end) {
                        params.push(&wild.param_key, value);
                        if let Some(handler) = wild.match_children(path, end, params, tsr) {
                            return Some(handler);
                        }
                        params.truncate(mark);
                    }
                }
                NodeKind::CatchAll => {
                    if let Some(value) = path.get(pos..).filter(|v| v.starts_with('/')) {
                        params.push(&wild.param_key, value);
                        return wild.handler.as_ref();
                    }
                }
                NodeKind::Root | NodeKind::Static => {}
            }
        }

        if rest == b"/" && self.handler.is_some() {
            *tsr = true;
        }
        None
    }

    // ---- case-insensitive lookup ----

    fn ci_match_node(&self, path: &[u8], out: &mut Vec<u8>, fix_trailing_slash: bool) -> bool {
        let seg = self.segment.as_slice();

        if path.len() >= seg.len() && path[..seg.len()].eq_ignore_ascii_case(seg) {
            let mark = out.len();
            out.extend_from_slice(seg);
            if self.ci_match_children(&path[seg.len()..], out, fix_trailing_slash) {
                return true;
            }
            out.truncate(mark);
            return false;
        }

        // add the missing trailing slash
        if fix_trailing_slash
            && path.len() + 1 == seg.len()
            && seg[path.len()] == b'/'
            && path.eq_ignore_ascii_case(&seg[..path.len()])
            && self.handler.is_some()
        {
            out.extend_from_slice(seg);
            return true;
        }
        false
    }

    fn ci_match_children(&self, rest: &[u8], out: &mut Vec<u8>, fix_trailing_slash: bool) -> bool {
        let Some(&next) = rest.first() else {
            if self.handler.is_some() {
                return true;
            }
            if fix_trailing_slash && self.has_slash_route() {
                out.push(b'/');
                return true;
            }
            return false;
        };

        let mark = out.len();

        // 'a' and 'A' may both be children, try every candidate
        for (i, index) in self.indices.iter().enumerate() {
            if index.eq_ignore_ascii_case(&next) {
                if self.children[i].ci_match_node(rest, out, fix_trailing_slash) {
                    return true;
                }
                out.truncate(mark);
            }
        }

        if let Some(wild) = self.wild() {
            match wild.kind {
                NodeKind::Param => {
                    let end = rest.iter().position(|&b| b == b'/').unwrap_or(rest.len());
                    out.extend_from_slice(&rest[..end]);
                    if wild.ci_match_children(&rest[end..], out, fix_trailing_slash) {
                        return true;
                    }
                    out.truncate(mark);
                }
                NodeKind::CatchAll => {
                    if next == b'/' {
                        out.extend_from_slice(rest);
                        return true;
                    }
                }
                NodeKind::Root | NodeKind::Static => {}
            }
        }

        // drop the superfluous trailing slash
        fix_trailing_slash && rest == b"/" && self.handler.is_some()
    }
}

impl<H> fmt::Debug for Node<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indices: String = self.indices.iter().map(|&b| b as char).collect();

        f.debug_struct("Node")
            .field("segment", &String::from_utf8_lossy(&self.segment))
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("indices", &indices)
            .field("has_handler", &self.handler.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Validates the syntax of `pattern` and returns its wildcard count.
fn check_pattern(pattern: &str) -> Result<usize, RouteError> {
    let p = pattern.as_bytes();
    let owned = || pattern.to_owned();

    if p.first() != Some(&b'/') {
        return Err(RouteError::MissingLeadingSlash { pattern: owned() });
    }

    let mut count = 0;
    let mut i = 0;
    while i < p.len() {
        let c = p[i];
        if c != b':' && c != b'*' {
            i += 1;
            continue;
        }

        let end = segment_end(p, i);
        let name = &p[i + 1..end];

        if name.is_empty() {
            return Err(RouteError::UnnamedWildcard { pattern: owned() });
        }
        if name.iter().any(|&b| b == b':' || b == b'*') {
            return Err(RouteError::MultipleWildcards { pattern: owned() });
        }
        if c == b'*' {
            if end != p.len() {
                return Err(RouteError::CatchAllNotLast { pattern: owned() });
            }
            if p[i - 1] != b'/' {
                return Err(RouteError::CatchAllWithoutSlash { pattern: owned() });
            }
        }

        count += 1;
        i = end;
    }

    Ok(count)
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Index of the first `/` at or after `from`, or the length of `path`.
fn segment_end(path: &[u8], from: usize) -> usize {
    path[from..]
        .iter()
        .position(|&b| b == b'/')
        .map_or(path.len(), |k| from + k)
}

/// Length of the literal text before the first wildcard.
fn static_prefix_len(path: &[u8]) -> usize {
    for (i, &b) in path.iter().enumerate() {
        if b == b':' || (b == b'/' && path.get(i + 1) == Some(&b'*')) {
            return i;
        }
    }
    path.len()
}
