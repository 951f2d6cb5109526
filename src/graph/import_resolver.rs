//! Import specifier resolution against the known path set
//!
//! Resolution is a pure lookup: a specifier is turned into a base path, the
//! base is expanded into a fixed, ordered candidate list, and the first
//! candidate present in the extracted path set wins. Nothing touches the
//! filesystem, so the result depends only on the input snapshot.
//!
//! Configured extensions are split by language family: `.py`/`.pyi` serve
//! Python importers, every other suffix serves ECMAScript importers. An
//! importer never resolves into the other family by probing.
//!
//! Candidate order for a base path `p`, ECMAScript importers:
//!
//! 1. `p`
//! 2. `p` + each ECMAScript extension, in configuration order
//! 3. `p/index` + each ECMAScript extension
//!
//! Python importers:
//!
//! 1. `p`
//! 2. `p` + each Python extension, in configuration order
//! 3. `p/__init__.py`

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::ingest::{ImportFact, ImportKind};
use crate::validation::{join_relative, normalize_path, parent_dir};

/// Where an alias in the importing file points
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportBinding {
    pub target_file: String,
    /// Name to look up in the target file's local scope
    pub imported_name: String,
    /// Alias names the module itself; member calls on it resolve in the target
    pub namespace: bool,
}

/// Per-file table of imported aliases
///
/// Built once per file during the import phase and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportMap {
    bindings: BTreeMap<String, ImportBinding>,
    /// Targets of `*` imports, in import order
    wildcards: Vec<String>,
}

impl ImportMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `alias`; a later import of the same alias replaces the earlier one
    pub fn insert(&mut self, alias: impl Into<String>, binding: ImportBinding) {
        self.bindings.insert(alias.into(), binding);
    }

    pub fn get(&self, alias: &str) -> Option<&ImportBinding> {
        self.bindings.get(alias)
    }

    pub fn add_wildcard(&mut self, target_file: impl Into<String>) {
        let target_file = target_file.into();
        if !self.wildcards.contains(&target_file) {
            self.wildcards.push(target_file);
        }
    }

    pub fn wildcards(&self) -> &[String] {
        &self.wildcards
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImportBinding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.wildcards.is_empty()
    }
}

/// A specifier that resolved to a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImport {
    pub specifier: String,
    pub target_file: String,
    pub line: usize,
}

/// Everything the import phase learns about one file
#[derive(Debug, Clone, Default)]
pub struct FileImports {
    pub map: ImportMap,
    /// One entry per distinct target, in first-seen order
    pub resolved: Vec<ResolvedImport>,
    /// Import statements that matched at least one file
    pub resolved_facts: usize,
    /// Facts whose specifier matched no candidate
    pub unresolved: Vec<ImportFact>,
}

/// Resolves import specifiers against the run's path set
#[derive(Debug, Clone)]
pub struct ImportResolver {
    known: HashSet<String>,
    ecma_extensions: Vec<String>,
    python_extensions: Vec<String>,
}

fn is_python_extension(ext: &str) -> bool {
    matches!(ext, ".py" | ".pyi")
}

impl ImportResolver {
    /// `extensions` are suffixes including the dot, e.g. `.ts`
    pub fn new<I, S>(paths: I, extensions: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (python_extensions, ecma_extensions): (Vec<String>, Vec<String>) = extensions
            .iter()
            .cloned()
            .partition(|ext| is_python_extension(ext));
        Self {
            known: paths.into_iter().map(Into::into).collect(),
            ecma_extensions,
            python_extensions,
        }
    }

    /// The ordered candidate list for a base path, for the importer's family
    pub fn candidates(&self, base: &str, python: bool) -> Vec<String> {
        if python {
            let mut out = Vec::with_capacity(2 + self.python_extensions.len());
            out.push(base.to_string());
            for ext in &self.python_extensions {
                out.push(format!("{}{}", base, ext));
            }
            out.push(format!("{}/__init__.py", base));
            return out;
        }

        let mut out = Vec::with_capacity(1 + self.ecma_extensions.len() * 2);
        out.push(base.to_string());
        for ext in &self.ecma_extensions {
            out.push(format!("{}{}", base, ext));
        }
        for ext in &self.ecma_extensions {
            out.push(format!("{}/index{}", base, ext));
        }
        out
    }

    /// First candidate of `base` present in the path set
    pub fn first_existing(&self, base: &str, python: bool) -> Option<String> {
        if base.is_empty() {
            return None;
        }
        self.candidates(base, python)
            .into_iter()
            .find(|candidate| self.known.contains(candidate))
    }

    /// Resolve one specifier as written in `importer`
    ///
    /// ECMAScript specifiers must be relative (`./`, `../`) or root-absolute
    /// (`/`); bare package names are external and never resolve. Python
    /// specifiers with leading dots are package-relative; absolute module
    /// names are tried from the root first, then from the importer's directory.
    pub fn resolve_specifier(
        &self,
        importer: &str,
        specifier: &str,
        kind: ImportKind,
    ) -> Option<String> {
        self.module_bases(importer, specifier, kind)
            .iter()
            .find_map(|base| self.first_existing(base, kind.is_python()))
    }

    /// Resolve all of a file's import facts into its import map and edges
    pub fn resolve_file(&self, importer: &str, facts: &[ImportFact]) -> FileImports {
        let mut out = FileImports::default();
        let mut seen_targets: HashSet<String> = HashSet::new();

        for fact in facts {
            let targets = match fact.kind {
                ImportKind::PythonFrom => self.resolve_from_import(importer, fact, &mut out.map),
                _ => self.resolve_module_import(importer, fact, &mut out.map),
            };

            if targets.is_empty() {
                out.unresolved.push(fact.clone());
                continue;
            }
            out.resolved_facts += 1;

            for target_file in targets {
                if target_file == importer {
                    continue;
                }
                if seen_targets.insert(target_file.clone()) {
                    out.resolved.push(ResolvedImport {
                        specifier: fact.specifier.clone(),
                        target_file,
                        line: fact.line,
                    });
                }
            }
        }

        out
    }

    fn resolve_module_import(
        &self,
        importer: &str,
        fact: &ImportFact,
        map: &mut ImportMap,
    ) -> Vec<String> {
        let Some(target) = self.resolve_specifier(importer, &fact.specifier, fact.kind) else {
            return Vec::new();
        };

        // Re-exports make names visible to importers of this file, not to it
        if fact.kind != ImportKind::ReExport {
            for name in &fact.names {
                map.insert(
                    name.local.clone(),
                    ImportBinding {
                        target_file: target.clone(),
                        imported_name: name.imported.clone(),
                        namespace: name.namespace,
                    },
                );
            }
        }

        vec![target]
    }

    /// `from X import a`: `X/a` as a submodule wins over name `a` inside `X`
    fn resolve_from_import(
        &self,
        importer: &str,
        fact: &ImportFact,
        map: &mut ImportMap,
    ) -> Vec<String> {
        let bases = self.module_bases(importer, &fact.specifier, fact.kind);
        let module_target = bases.iter().find_map(|base| self.first_existing(base, true));
        let mut targets = Vec::new();

        for name in &fact.names {
            let submodule = bases
                .iter()
                .find_map(|base| self.first_existing(&join_module(base, &name.imported), true));

            match (submodule, &module_target) {
                (Some(sub), _) => {
                    map.insert(
                        name.local.clone(),
                        ImportBinding {
                            target_file: sub.clone(),
                            imported_name: name.local.clone(),
                            namespace: true,
                        },
                    );
                    targets.push(sub);
                }
                (None, Some(module)) => {
                    map.insert(
                        name.local.clone(),
                        ImportBinding {
                            target_file: module.clone(),
                            imported_name: name.imported.clone(),
                            namespace: false,
                        },
                    );
                    targets.push(module.clone());
                }
                (None, None) => {}
            }
        }

        if let Some(module) = &module_target {
            if fact.is_glob {
                map.add_wildcard(module.clone());
            }
            if fact.is_glob || fact.names.is_empty() {
                targets.push(module.clone());
            }
        }

        targets
    }

    /// Base paths a specifier may denote, most specific first
    fn module_bases(&self, importer: &str, specifier: &str, kind: ImportKind) -> Vec<String> {
        let importer_dir = parent_dir(importer);

        if kind.is_python() {
            return python_bases(importer_dir, specifier);
        }

        if specifier.starts_with("./")
            || specifier.starts_with("../")
            || specifier == "."
            || specifier == ".."
        {
            return join_relative(importer_dir, specifier).into_iter().collect();
        }
        if let Some(rooted) = specifier.strip_prefix('/') {
            return normalize_path(rooted).ok().into_iter().collect();
        }
        Vec::new()
    }
}

/// Base paths for a Python module name
///
/// `from . import x` yields the importer's package directory, which may be
/// the empty root; callers join a submodule name onto it.
fn python_bases(importer_dir: &str, specifier: &str) -> Vec<String> {
    let dots = specifier.chars().take_while(|&c| c == '.').count();
    let module_path = specifier[dots..].replace('.', "/");

    if dots == 0 {
        let mut bases = Vec::new();
        if let Ok(root_relative) = normalize_path(&module_path) {
            bases.push(root_relative);
        }
        if !importer_dir.is_empty() {
            if let Some(local) = join_relative(importer_dir, &module_path) {
                if !bases.contains(&local) {
                    bases.push(local);
                }
            }
        }
        return bases;
    }

    // One dot is the importer's package, each further dot one level up
    let mut package = importer_dir.to_string();
    for _ in 1..dots {
        if package.is_empty() {
            return Vec::new();
        }
        package = parent_dir(&package).to_string();
    }

    if module_path.is_empty() {
        vec![package]
    } else {
        vec![join_module(&package, &module_path)]
    }
}

fn join_module(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}
