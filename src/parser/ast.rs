// Structural model extracted from parsed Python files
//
// These types are the only thing passed between the extractor, the
// relationship pass and the renderer. They are serializable so `inspect`
// can dump them as JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Leading underscore means private, dunder names included.
pub fn is_private_name(name: &str) -> bool {
    name.starts_with('_')
}

/// Declarations extracted from one source file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    /// Path relative to the scanned root, `/`-separated
    pub path: String,
    /// Root segment of every imported module
    pub imports: BTreeSet<String>,
    /// Top-level classes in source order
    pub classes: Vec<ClassRecord>,
    /// Top-level functions in source order
    pub functions: Vec<FunctionRecord>,
    /// `(child, bases)` for every class that declares simple-name bases
    pub inheritance: Vec<(String, Vec<String>)>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// File name without directory or extension, used as the import edge source
    pub fn base_name(&self) -> String {
        Path::new(&self.path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.clone())
    }

    /// True when the file declares nothing at all
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.classes.is_empty() && self.functions.is_empty()
    }

    /// Add a class, recording its inheritance pair when it has bases
    pub fn push_class(&mut self, class: ClassRecord) {
        if !class.bases.is_empty() {
            self.inheritance
                .push((class.name.clone(), class.bases.clone()));
        }
        self.classes.push(class);
    }
}

/// A top-level class definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassRecord {
    pub name: String,
    /// Simple-name bases as written; computed bases are dropped
    pub bases: Vec<String>,
    pub methods: Vec<MethodRecord>,
    /// Class-level assignments
    pub properties: Vec<PropertyRecord>,
    /// `self.x = ...` targets found in `__init__`
    pub attrs: BTreeSet<String>,
}

impl ClassRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bases: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            attrs: BTreeSet::new(),
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodRecord> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// A method defined directly in a class body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodRecord {
    pub name: String,
    /// Parameters with the receiver already removed
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_private: bool,
    /// Every `receiver.method(...)` call in the body, in source order
    pub calls: Vec<CallSite>,
}

impl MethodRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: None,
            is_private: is_private_name(name),
            calls: Vec::new(),
        }
    }
}

/// A class-level property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyRecord {
    pub name: String,
    pub is_private: bool,
}

impl PropertyRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_private: is_private_name(name),
        }
    }
}

/// A top-level function
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionRecord {
    pub name: String,
    /// Full parameter list, first parameter included
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
}

impl FunctionRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            return_type: None,
        }
    }
}

/// A function parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    /// Annotation text, verbatim
    pub type_hint: Option<String>,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_hint: None,
            kind: ParameterKind::Regular,
        }
    }

    pub fn with_type(name: &str, type_hint: &str) -> Self {
        Self {
            name: name.to_string(),
            type_hint: Some(type_hint.to_string()),
            kind: ParameterKind::Regular,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParameterKind::Args => f.write_str("*")?,
            ParameterKind::Kwargs => f.write_str("**")?,
            ParameterKind::Regular => {}
        }
        f.write_str(&self.name)?;
        if let Some(ref t) = self.type_hint {
            write!(f, ": {}", t)?;
        }
        Ok(())
    }
}

/// Kind of function parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParameterKind {
    Regular,
    /// *args
    Args,
    /// **kwargs
    Kwargs,
}

/// A `receiver.method(...)` call where the receiver is a bare identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub receiver: String,
    pub method: String,
}

impl CallSite {
    pub fn new(receiver: &str, method: &str) -> Self {
        Self {
            receiver: receiver.to_string(),
            method: method.to_string(),
        }
    }
}

/// All file records of one run, keyed by relative path
///
/// Keys are ordered, so the model iterates the same way no matter in
/// which order files were merged in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RepositoryModel {
    pub files: BTreeMap<String, FileRecord>,
}

impl RepositoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any earlier record for the same path
    pub fn insert(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    /// Merge another model into this one
    pub fn merge(&mut self, other: RepositoryModel) {
        self.files.extend(other.files);
    }

    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Files in path order
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// All classes, file by file, in source order
    pub fn classes(&self) -> impl Iterator<Item = &ClassRecord> {
        self.iter().flat_map(|f| f.classes.iter())
    }

    /// All top-level functions, file by file, in source order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.iter().flat_map(|f| f.functions.iter())
    }

    /// Every declared class name
    pub fn class_names(&self) -> BTreeSet<&str> {
        self.classes().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when no file declared anything
    pub fn is_empty(&self) -> bool {
        self.iter().all(FileRecord::is_empty)
    }
}

impl FromIterator<FileRecord> for RepositoryModel {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut model = RepositoryModel::new();
        for record in iter {
            model.insert(record);
        }
        model
    }
}
