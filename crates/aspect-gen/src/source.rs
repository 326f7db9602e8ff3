//! Parsed source unit
//!
//! A unit is one Rust file. Only top-level items are indexed; traits inside
//! inline modules are out of reach, the same way the wrapper output can only
//! name traits through a single import path.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use syn::{Item, ItemTrait};

use crate::error::{GenError, Result};

/// What a top-level name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// `trait`
    Trait,
    /// `struct`
    Struct,
    /// `enum`
    Enum,
    /// `union`
    Union,
    /// `type` alias
    TypeAlias,
    /// Free `fn`
    Function,
    /// `const`
    Const,
    /// `static`
    Static,
    /// `macro_rules!` definition
    Macro,
    /// `trait A = B;`
    TraitAlias,
}

impl ItemKind {
    /// Human-readable kind for diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            ItemKind::Trait => "trait",
            ItemKind::Struct => "struct",
            ItemKind::Enum => "enum",
            ItemKind::Union => "union",
            ItemKind::TypeAlias => "type alias",
            ItemKind::Function => "function",
            ItemKind::Const => "const",
            ItemKind::Static => "static",
            ItemKind::Macro => "macro",
            ItemKind::TraitAlias => "trait alias",
        }
    }
}

/// Top-level items of one source file, in declaration order
#[derive(Debug, Clone)]
pub struct SourceUnit {
    path: PathBuf,
    kinds: IndexMap<String, ItemKind>,
    traits: IndexMap<String, ItemTrait>,
}

impl SourceUnit {
    /// Read and parse a file
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| GenError::io(path, source))?;
        Self::parse_with_path(&text, path.to_path_buf())
    }

    /// Parse in-memory source text
    pub fn parse_str(text: &str) -> Result<Self> {
        Self::parse_with_path(text, PathBuf::from("<memory>"))
    }

    fn parse_with_path(text: &str, path: PathBuf) -> Result<Self> {
        let file = match syn::parse_file(text) {
            Ok(file) => file,
            Err(source) => return Err(GenError::Parse { path, source }),
        };

        let mut kinds = IndexMap::new();
        let mut traits = IndexMap::new();
        for item in file.items {
            let (name, kind) = match &item {
                Item::Trait(t) => (t.ident.to_string(), ItemKind::Trait),
                Item::Struct(s) => (s.ident.to_string(), ItemKind::Struct),
                Item::Enum(e) => (e.ident.to_string(), ItemKind::Enum),
                Item::Union(u) => (u.ident.to_string(), ItemKind::Union),
                Item::Type(t) => (t.ident.to_string(), ItemKind::TypeAlias),
                Item::Fn(f) => (f.sig.ident.to_string(), ItemKind::Function),
                Item::Const(c) => (c.ident.to_string(), ItemKind::Const),
                Item::Static(s) => (s.ident.to_string(), ItemKind::Static),
                Item::TraitAlias(t) => (t.ident.to_string(), ItemKind::TraitAlias),
                Item::Macro(m) => match &m.ident {
                    Some(ident) => (ident.to_string(), ItemKind::Macro),
                    None => continue,
                },
                _ => continue,
            };
            if let Item::Trait(item_trait) = item {
                traits.insert(name.clone(), item_trait);
            }
            // Traits win over same-named values (`fn Store` next to `trait Store`).
            if kinds.get(&name) != Some(&ItemKind::Trait) {
                kinds.insert(name, kind);
            }
        }

        tracing::debug!(
            path = %path.display(),
            items = kinds.len(),
            traits = traits.len(),
            "indexed source unit"
        );
        Ok(Self { path, kinds, traits })
    }

    /// Path the unit was read from (`<memory>` for strings)
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of a top-level item
    pub fn kind(&self, name: &str) -> Option<ItemKind> {
        self.kinds.get(name).copied()
    }

    /// Trait declaration by name
    pub fn get_trait(&self, name: &str) -> Option<&ItemTrait> {
        self.traits.get(name)
    }

    /// Trait names in declaration order
    pub fn trait_names(&self) -> impl Iterator<Item = &str> {
        self.traits.keys().map(String::as_str)
    }
}
