//! Resolution of directives left in a parsed tree.
//!
//! When a document is parsed with autoload off, each include stays in the
//! tree as a tagged node. The functions here find those nodes and replace
//! them with the included content:
//!
//! - [`walk`] builds a resolved copy and leaves its input alone
//! - [`walk_in_place`] replaces directives inside the caller's tree
//! - [`LazyWalk`] does the same one directive at a time, as an iterator
//!
//! With `nested` set, the content an include brings in is walked as well,
//! so includes deferred inside included files are resolved too. Include
//! cycles are not detected.

use crate::core::{IncludeError, Result};
use crate::directive::Directive;
use crate::includer::Includer;
use crate::resolver;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};
use std::fmt;
use tracing::trace;

/// The deferred directive held by `value`, if it is one.
fn directive_of(includer: &Includer, value: &Value) -> Option<Result<Directive>> {
    match value {
        Value::Tagged(tagged) if includer.is_include_tag(&tagged.tag) => {
            Some(Directive::from_node(&tagged.value))
        }
        _ => None,
    }
}

/// Return a copy of `value` with every deferred directive resolved.
///
/// # Errors
///
/// Returns the first error raised while resolving a directive.
pub fn walk(includer: &Includer, value: &Value, nested: bool) -> Result<Value> {
    if let Some(directive) = directive_of(includer, value) {
        let resolved = resolver::resolve(includer, &directive?)?;
        return if nested { walk(includer, &resolved, true) } else { Ok(resolved) };
    }

    match value {
        Value::Mapping(map) => map
            .iter()
            .map(|(k, v)| Ok((k.clone(), walk(includer, v, nested)?)))
            .collect::<Result<Mapping>>()
            .map(Value::Mapping),
        Value::Sequence(seq) => {
            seq.iter().map(|v| walk(includer, v, nested)).collect::<Result<_>>().map(Value::Sequence)
        }
        Value::Tagged(tagged) => Ok(Value::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: walk(includer, &tagged.value, nested)?,
        }))),
        leaf => Ok(leaf.clone()),
    }
}

/// Resolve every deferred directive inside `value`, replacing it in place.
///
/// On error, directives resolved before the failure stay replaced.
///
/// # Errors
///
/// Returns the first error raised while resolving a directive.
pub fn walk_in_place(includer: &Includer, value: &mut Value, nested: bool) -> Result<()> {
    if let Some(directive) = directive_of(includer, value) {
        *value = resolver::resolve(includer, &directive?)?;
        return if nested { walk_in_place(includer, value, true) } else { Ok(()) };
    }

    match value {
        Value::Mapping(map) => {
            map.iter_mut().try_for_each(|(_, v)| walk_in_place(includer, v, nested))
        }
        Value::Sequence(seq) => seq.iter_mut().try_for_each(|v| walk_in_place(includer, v, nested)),
        Value::Tagged(tagged) => walk_in_place(includer, &mut tagged.value, nested),
        _ => Ok(()),
    }
}

/// One step on the way from the root of a tree to a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Mapping entry with this key
    Key(Value),
    /// Sequence element at this index
    Index(usize),
}

/// Where a node sits in a tree, as the path from the root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location(Vec<Segment>);

impl Location {
    /// The segments from the root, outermost first.
    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.0 {
            match segment {
                Segment::Key(Value::String(key)) => write!(f, ".{key}")?,
                Segment::Key(Value::Number(key)) => write!(f, ".{key}")?,
                Segment::Key(Value::Bool(key)) => write!(f, ".{key}")?,
                Segment::Key(other) => write!(f, "[{other:?}]")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A directive resolved by a [`LazyWalk`] step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedInclude {
    /// Where the directive was in the tree
    pub location: Location,
    /// The directive that was resolved
    pub directive: Directive,
}

/// In-place walk that resolves one directive per call to `next`.
///
/// Nodes are visited depth first in document order. Only mappings and
/// sequences are descended into; any other tagged value is left alone.
/// After an error the iterator is exhausted, with every directive resolved
/// so far already replaced in the tree.
///
/// # Examples
///
/// ```rust,no_run
/// use yaml_include::{Includer, LazyWalk};
///
/// # fn example() -> yaml_include::core::Result<()> {
/// let includer = Includer::new();
/// let mut doc = includer.with_autoload(false).load_str("a: !inc a.yaml\nb: [!inc b.yaml]")?;
/// for step in LazyWalk::new(&includer, &mut doc, true) {
///     let step = step?;
///     println!("resolved {} at {}", step.directive.target(), step.location);
/// }
/// # Ok(())
/// # }
/// ```
pub struct LazyWalk<'a> {
    includer: &'a Includer,
    root: &'a mut Value,
    nested: bool,
    pending: Vec<Location>,
    done: bool,
}

impl<'a> LazyWalk<'a> {
    /// Start walking `root`.
    pub fn new(includer: &'a Includer, root: &'a mut Value, nested: bool) -> Self {
        Self {
            includer,
            root,
            nested,
            pending: vec![Location::default()],
            done: false,
        }
    }

    fn step(&mut self) -> Option<Result<ResolvedInclude>> {
        while let Some(location) = self.pending.pop() {
            let Some(node) = navigate(self.root, location.segments()) else {
                return Some(Err(IncludeError::NotMutable {
                    location: location.to_string(),
                }));
            };

            if let Some(directive) = directive_of(self.includer, node) {
                let result = directive.and_then(|directive| {
                    trace!("Resolving '{}' at {}", directive.target(), location);
                    *node = resolver::resolve(self.includer, &directive)?;
                    Ok(directive)
                });
                return Some(result.map(|directive| {
                    if self.nested {
                        self.pending.push(location.clone());
                    }
                    ResolvedInclude {
                        location,
                        directive,
                    }
                }));
            }

            match node {
                Value::Mapping(map) => {
                    let children: Vec<Location> =
                        map.keys().map(|k| location.child(Segment::Key(k.clone()))).collect();
                    self.pending.extend(children.into_iter().rev());
                }
                Value::Sequence(seq) => {
                    self.pending.extend(
                        (0..seq.len()).rev().map(|i| location.child(Segment::Index(i))),
                    );
                }
                _ => {}
            }
        }
        None
    }
}

impl Iterator for LazyWalk<'_> {
    type Item = Result<ResolvedInclude>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.step();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl std::iter::FusedIterator for LazyWalk<'_> {}

fn navigate<'v>(root: &'v mut Value, segments: &[Segment]) -> Option<&'v mut Value> {
    segments.iter().try_fold(root, |node, segment| match (node, segment) {
        (Value::Mapping(map), Segment::Key(key)) => map.get_mut(key),
        (Value::Sequence(seq), Segment::Index(index)) => seq.get_mut(*index),
        _ => None,
    })
}
