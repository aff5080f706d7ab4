//! Which chunks a pass renders.

use rustc_hash::FxHashSet;

/// Chunk that is never rendered.
pub const RUNTIME_CHUNK: &str = "runtime";

/// Include/exclude policy over chunk names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    include: FxHashSet<String>,
    exclude: FxHashSet<String>,
}

impl Selection {
    /// Blank names are dropped from both lists; `runtime` is always excluded.
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut exclude = named(exclude);
        exclude.insert(RUNTIME_CHUNK.to_owned());
        Self {
            include: named(include),
            exclude,
        }
    }

    /// `name` is eligible when it is included (or nothing is) and not excluded.
    pub fn is_eligible(&self, name: &str) -> bool {
        (self.include.is_empty() || self.include.contains(name)) && !self.exclude.contains(name)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(None::<&str>, None::<&str>)
    }
}

fn named<I>(names: I) -> FxHashSet<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref().trim();
            (!name.is_empty()).then(|| name.to_owned())
        })
        .collect()
}
