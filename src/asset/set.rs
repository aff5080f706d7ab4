//! Build output assets.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One output file's contents.
///
/// Cloning is cheap: the bytes are shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    source: Arc<[u8]>,
}

impl Asset {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: bytes.into(),
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into().into_bytes())
    }

    /// Raw contents.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.source.len()
    }

    /// Contents as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.source)
    }
}

/// Asset identifier → asset, iterated in identifier order.
///
/// Identifiers always use `/` as the separator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetSet {
    assets: BTreeMap<String, Asset>,
}

/// Normalize an identifier to `/` separators.
pub fn normalize_name(name: &str) -> Cow<'_, str> {
    if name.contains('\\') {
        Cow::Owned(name.replace('\\', "/"))
    } else {
        Cow::Borrowed(name)
    }
}

impl AssetSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`, returning the previous asset.
    pub fn insert(&mut self, name: &str, asset: Asset) -> Option<Asset> {
        self.assets.insert(normalize_name(name).into_owned(), asset)
    }

    pub fn remove(&mut self, name: &str) -> Option<Asset> {
        self.assets.remove(normalize_name(name).as_ref())
    }

    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(normalize_name(name).as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Identifiers in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Asset)> {
        self.assets.iter().map(|(name, asset)| (name.as_str(), asset))
    }

    /// First asset, in identifier order, whose identifier matches.
    pub fn find(&self, mut predicate: impl FnMut(&str) -> bool) -> Option<(&str, &Asset)> {
        self.iter().find(|&(name, _)| predicate(name))
    }

    /// Changes that turn `before` into `self`.
    pub fn diff_from<'a>(&'a self, before: &AssetSet) -> AssetDiff<'a> {
        let written = self
            .iter()
            .filter(|(name, asset)| before.assets.get(*name) != Some(*asset))
            .collect();
        let removed = before
            .names()
            .filter(|name| !self.assets.contains_key(*name))
            .map(str::to_owned)
            .collect();
        AssetDiff { written, removed }
    }
}

impl FromIterator<(String, Asset)> for AssetSet {
    fn from_iter<I: IntoIterator<Item = (String, Asset)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, asset) in iter {
            set.insert(&name, asset);
        }
        set
    }
}

/// Added or changed assets plus removed identifiers.
#[derive(Debug, Default)]
pub struct AssetDiff<'a> {
    pub written: Vec<(&'a str, &'a Asset)>,
    pub removed: Vec<String>,
}

impl AssetDiff<'_> {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty() && self.removed.is_empty()
    }
}
