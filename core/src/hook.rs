//! Symbol resolution for the interception layer
//!
//! The interception layer wraps library entry points the game calls. Before a
//! wrapper can forward to the real implementation it has to find it: first in
//! the global namespace (the next definition after our own), then in a
//! matching library the game loaded itself.
//!
//! The dynamic loader is abstracted behind [`SymbolNamespace`] and
//! [`LibraryLocator`] so resolution order and logging can be exercised without
//! one.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use tracing::{debug, error};

/// Address of a resolved entry point (never null)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolAddress(NonZeroUsize);

impl SymbolAddress {
    /// Wrap a raw address; `None` for null
    pub fn new(addr: usize) -> Option<Self> {
        NonZeroUsize::new(addr).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for SymbolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A set of named entry points, optionally versioned
pub trait SymbolNamespace {
    fn lookup(&self, name: &str, version: Option<&str>) -> Option<SymbolAddress>;
}

/// Finds and opens libraries the game loaded
pub trait LibraryLocator {
    /// Full path of a loaded library whose file name starts with `short_name`
    fn find_library(&self, short_name: &str) -> Option<PathBuf>;

    /// Open a library found by [`find_library`](Self::find_library)
    fn open(&self, path: &Path) -> Option<&dyn SymbolNamespace>;
}

/// Where a symbol was resolved from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPath {
    Global,
    Library(PathBuf),
}

/// Resolves entry points, global namespace first
pub struct SymbolResolver<'a> {
    global: &'a dyn SymbolNamespace,
    locator: Option<&'a dyn LibraryLocator>,
}

impl<'a> SymbolResolver<'a> {
    pub fn new(global: &'a dyn SymbolNamespace) -> Self {
        Self {
            global,
            locator: None,
        }
    }

    /// Also search libraries found through `locator`
    pub fn with_locator(mut self, locator: &'a dyn LibraryLocator) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Look `name` up without logging.
    ///
    /// The version only applies to the global namespace; a library opened by
    /// path is searched for the unversioned name.
    pub fn resolve(
        &self,
        name: &str,
        library: Option<&str>,
        version: Option<&str>,
    ) -> Option<(SymbolAddress, LinkPath)> {
        if let Some(addr) = self.global.lookup(name, version) {
            return Some((addr, LinkPath::Global));
        }

        let locator = self.locator?;
        let path = locator.find_library(library?)?;
        let addr = locator.open(&path)?.lookup(name, None)?;
        Some((addr, LinkPath::Library(path)))
    }

    /// Fill `slot` with the address of `name` unless it is already linked.
    ///
    /// Returns whether the slot holds an address afterwards. A failed lookup
    /// is logged and leaves the slot empty.
    pub fn link_function(
        &self,
        slot: &mut Option<SymbolAddress>,
        name: &str,
        library: Option<&str>,
        version: Option<&str>,
    ) -> bool {
        if slot.is_some() {
            return true;
        }

        match self.resolve(name, library, version) {
            Some((addr, LinkPath::Global)) => {
                debug!("Imported symbol {} function : {}", name, addr);
                *slot = Some(addr);
                true
            }
            Some((addr, LinkPath::Library(path))) => {
                debug!(
                    "Imported from lib {} symbol {} function : {}",
                    path.display(),
                    name,
                    addr
                );
                *slot = Some(addr);
                true
            }
            None => {
                error!("Could not import symbol {}", name);
                false
            }
        }
    }
}

/// In-memory namespace for hosts that register entry points explicitly
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolAddress>,
    versioned: HashMap<(String, String), SymbolAddress>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an unversioned entry point
    pub fn insert(&mut self, name: impl Into<String>, addr: SymbolAddress) {
        self.symbols.insert(name.into(), addr);
    }

    /// Register an entry point under a specific symbol version
    pub fn insert_versioned(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        addr: SymbolAddress,
    ) {
        self.versioned.insert((name.into(), version.into()), addr);
    }

    pub fn len(&self) -> usize {
        self.symbols.len() + self.versioned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SymbolNamespace for SymbolTable {
    fn lookup(&self, name: &str, version: Option<&str>) -> Option<SymbolAddress> {
        match version {
            Some(version) => self
                .versioned
                .get(&(name.to_owned(), version.to_owned()))
                .copied(),
            None => self.symbols.get(name).copied(),
        }
    }
}

/// Registry of libraries the game loaded, each with its own namespace
#[derive(Debug, Default)]
pub struct LoadedLibraries {
    libraries: Vec<(PathBuf, SymbolTable)>,
}

impl LoadedLibraries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<PathBuf>, symbols: SymbolTable) {
        self.libraries.push((path.into(), symbols));
    }
}

impl LibraryLocator for LoadedLibraries {
    fn find_library(&self, short_name: &str) -> Option<PathBuf> {
        self.libraries
            .iter()
            .map(|(path, _)| path)
            .find(|path| {
                path.file_name()
                    .and_then(|f| f.to_str())
                    .is_some_and(|f| f.starts_with(short_name))
            })
            .cloned()
    }

    fn open(&self, path: &Path) -> Option<&dyn SymbolNamespace> {
        self.libraries
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, table)| table as &dyn SymbolNamespace)
    }
}
