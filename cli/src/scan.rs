//! Source scanning: finds annotated work functions and compiles each one.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use cmdbind_core::lower::{compile_signature, directive_from_attribute, directive_kind};
use cmdbind_core::{
    BindingError, CompiledBinding, CompilerOptions, Diagnostic, DirectiveKind,
};
use serde::Serialize;
use syn::visit::{self, Visit};
use syn::{Attribute, ImplItemFn, Item, ItemFn, Signature, Visibility};
use tracing::{debug, info};

/// Typed error for checker file operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rust source that does not parse.
    #[error("failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    /// Options file that does not deserialize.
    #[error("invalid options file: {0}")]
    Options(#[from] serde_yaml::Error),

    /// Invalid or missing input (e.g. non-existent path, wrong extension).
    #[error("{0}")]
    InvalidInput(String),
}

/// Result of compiling one annotated item.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Compiled { binding: CompiledBinding },
    Failed { diagnostics: Vec<Diagnostic> },
}

/// One annotated item found in a source file.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionReport {
    pub file: PathBuf,
    pub function: String,
    pub directive: DirectiveKind,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl FunctionReport {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.outcome {
            Outcome::Compiled { .. } => &[],
            Outcome::Failed { diagnostics } => diagnostics,
        }
    }
}

/// Loads compiler options from a YAML file, or the defaults.
pub fn load_options(path: Option<&Path>) -> Result<CompilerOptions, CheckError> {
    let Some(path) = path else {
        return Ok(CompilerOptions::default());
    };
    let text = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

/// Expands files and directories into the sorted set of `.rs` files.
///
/// Directories are walked recursively; hidden directories and `target`
/// are skipped.
pub fn collect_source_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, CheckError> {
    if inputs.is_empty() {
        return Err(CheckError::InvalidInput(
            "No source paths were provided".to_string(),
        ));
    }

    let mut paths = BTreeSet::new();

    for input in inputs {
        if input.is_dir() {
            walk_dir(input, &mut paths)?;
            continue;
        }

        if input.is_file() {
            if input.extension() != Some(OsStr::new("rs")) {
                return Err(CheckError::InvalidInput(format!(
                    "Source file '{}' must end in .rs",
                    input.display()
                )));
            }
            paths.insert(input.clone());
            continue;
        }

        return Err(CheckError::InvalidInput(format!(
            "Source path '{}' does not exist",
            input.display()
        )));
    }

    Ok(paths.into_iter().collect())
}

fn walk_dir(dir: &Path, paths: &mut BTreeSet<PathBuf>) -> Result<(), CheckError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();

        if path.is_dir() {
            if !name.starts_with('.') && name != "target" {
                walk_dir(&path, paths)?;
            }
        } else if path.extension() == Some(OsStr::new("rs")) {
            paths.insert(path);
        }
    }
    Ok(())
}

/// Parses one source file and compiles every annotated item in it.
pub fn scan_file(path: &Path, options: &CompilerOptions) -> Result<Vec<FunctionReport>, CheckError> {
    let source = fs::read_to_string(path)?;
    let file = syn::parse_file(&source).map_err(|source| CheckError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let mut collector = Collector {
        path,
        options,
        reports: Vec::new(),
    };
    collector.visit_file(&file);

    info!(
        path = %path.display(),
        functions = collector.reports.len(),
        "scanned source file"
    );
    Ok(collector.reports)
}

struct Collector<'a> {
    path: &'a Path,
    options: &'a CompilerOptions,
    reports: Vec<FunctionReport>,
}

impl Collector<'_> {
    fn check_function(&mut self, attrs: &[Attribute], sig: &Signature, vis: &Visibility) {
        for attr in attrs {
            let Some(kind) = directive_kind(attr) else {
                continue;
            };
            let compiled = directive_from_attribute(kind, attr)
                .map_err(|err| {
                    vec![Diagnostic::directive(BindingError::InvalidDirective(
                        err.to_string(),
                    ))]
                })
                .and_then(|directive| compile_signature(sig, vis, &directive, self.options));

            debug!(function = %sig.ident, ok = compiled.is_ok(), "checked work function");
            self.push(sig.ident.to_string(), kind, compiled);
        }
    }

    fn check_other(&mut self, attrs: &[Attribute], name: String) {
        for attr in attrs {
            if let Some(kind) = directive_kind(attr) {
                let diagnostics = vec![Diagnostic::function(BindingError::NotAFunction)];
                self.push(name.clone(), kind, Err(diagnostics));
            }
        }
    }

    fn push(
        &mut self,
        function: String,
        directive: DirectiveKind,
        compiled: Result<CompiledBinding, Vec<Diagnostic>>,
    ) {
        let outcome = match compiled {
            Ok(binding) => Outcome::Compiled { binding },
            Err(diagnostics) => Outcome::Failed { diagnostics },
        };
        self.reports.push(FunctionReport {
            file: self.path.to_path_buf(),
            function,
            directive,
            outcome,
        });
    }
}

impl<'ast> Visit<'ast> for Collector<'_> {
    fn visit_item(&mut self, item: &'ast Item) {
        let other = match item {
            Item::Struct(item) => Some((&item.attrs, item.ident.to_string())),
            Item::Enum(item) => Some((&item.attrs, item.ident.to_string())),
            Item::Union(item) => Some((&item.attrs, item.ident.to_string())),
            Item::Const(item) => Some((&item.attrs, item.ident.to_string())),
            Item::Static(item) => Some((&item.attrs, item.ident.to_string())),
            Item::Trait(item) => Some((&item.attrs, item.ident.to_string())),
            Item::Type(item) => Some((&item.attrs, item.ident.to_string())),
            _ => None,
        };
        if let Some((attrs, name)) = other {
            self.check_other(attrs, name);
        }
        visit::visit_item(self, item);
    }

    fn visit_item_fn(&mut self, item: &'ast ItemFn) {
        self.check_function(&item.attrs, &item.sig, &item.vis);
        visit::visit_item_fn(self, item);
    }

    fn visit_impl_item_fn(&mut self, item: &'ast ImplItemFn) {
        self.check_function(&item.attrs, &item.sig, &item.vis);
        visit::visit_impl_item_fn(self, item);
    }
}
