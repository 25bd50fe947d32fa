// Python parser and declaration extractor using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use crate::parser::syntax::{self, for_each_descendant, identifier, simple_attribute, text, Syntax};
use std::collections::BTreeSet;
use tree_sitter::{Node, Parser, Tree};

/// A parsed source file, ready for extraction
pub struct SourceTree {
    /// Path relative to the scanned root
    pub path: String,
    pub source: String,
    pub tree: Tree,
}

impl SourceTree {
    /// True when tree-sitter had to recover from syntax errors
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }
}

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
    tolerate_syntax_errors: bool,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser
            .set_language(&language)
            .map_err(|e| Error::parser(format!("Failed to set Python language: {}", e)))?;
        Ok(Self {
            parser,
            tolerate_syntax_errors: false,
        })
    }

    /// Keep trees that contain syntax errors instead of rejecting them
    pub fn with_error_tolerance(mut self, tolerate: bool) -> Self {
        self.tolerate_syntax_errors = tolerate;
        self
    }

    /// Parse Python source code
    pub fn parse_source(&mut self, path: &str, source: String) -> Result<SourceTree> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| Error::parse(path, "parser produced no tree"))?;

        let unit = SourceTree {
            path: path.to_string(),
            source,
            tree,
        };

        if unit.has_errors() && !self.tolerate_syntax_errors {
            let line = syntax::first_error(unit.tree.root_node())
                .map(|n| n.start_position().row + 1)
                .unwrap_or(1);
            return Err(Error::parse(path, format!("syntax error at line {}", line)));
        }

        Ok(unit)
    }

    /// Parse and extract in one step
    pub fn parse_and_extract(&mut self, path: &str, source: String) -> Result<FileRecord> {
        let unit = self.parse_source(path, source)?;
        Ok(extract(&unit))
    }
}

/// Decode bytes as UTF-8, dropping invalid sequences
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Build the file record for a parsed tree
///
/// Never fails: a node that does not have the expected shape is skipped and
/// everything extracted so far is kept.
pub fn extract(unit: &SourceTree) -> FileRecord {
    let source = unit.source.as_bytes();
    let root = unit.tree.root_node();
    let mut file = FileRecord::new(unit.path.clone());

    file.imports = collect_imports(root, source);

    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match Syntax::of(child) {
            Syntax::ClassDef(node) => {
                if let Some(class) = parse_class(node, source) {
                    file.push_class(class);
                }
            }
            Syntax::FunctionDef(node) => {
                if let Some(func) = parse_function(node, source) {
                    file.functions.push(func);
                }
            }
            Syntax::Decorated(node) => {
                let Some(definition) = node.child_by_field_name("definition") else {
                    continue;
                };
                match Syntax::of(definition) {
                    Syntax::ClassDef(inner) => {
                        if let Some(class) = parse_class(inner, source) {
                            file.push_class(class);
                        }
                    }
                    Syntax::FunctionDef(inner) => {
                        if let Some(func) = parse_function(inner, source) {
                            file.functions.push(func);
                        }
                    }
                    _ => {}
                }
            }
            Syntax::Import(_)
            | Syntax::ImportFrom(_)
            | Syntax::FutureImport(_)
            | Syntax::ExpressionStatement(_)
            | Syntax::Assignment(_)
            | Syntax::Call(_)
            | Syntax::Attribute(_)
            | Syntax::Other => {}
        }
    }

    file
}

/// Root module segment of every import anywhere in the file
fn collect_imports(root: Node, source: &[u8]) -> BTreeSet<String> {
    let mut imports = BTreeSet::new();

    for_each_descendant(root, |node| match Syntax::of(node) {
        Syntax::Import(stmt) => {
            let mut cursor = stmt.walk();
            for name in stmt.children_by_field_name("name", &mut cursor) {
                // `import a.b as c` keeps the dotted name under its own field
                let dotted = if name.kind() == "aliased_import" {
                    name.child_by_field_name("name")
                } else {
                    Some(name)
                };
                if let Some(module) = dotted.and_then(|n| root_segment(n, source)) {
                    imports.insert(module);
                }
            }
        }
        Syntax::ImportFrom(stmt) => {
            let Some(module) = stmt.child_by_field_name("module_name") else {
                return;
            };
            let dotted = if module.kind() == "relative_import" {
                let mut cursor = module.walk();
                let found = module
                    .named_children(&mut cursor)
                    .find(|n| n.kind() == "dotted_name");
                found
            } else {
                Some(module)
            };
            if let Some(name) = dotted.and_then(|n| root_segment(n, source)) {
                imports.insert(name);
            }
        }
        Syntax::FutureImport(_) => {
            imports.insert("__future__".to_string());
        }
        _ => {}
    });

    imports
}

fn root_segment(node: Node, source: &[u8]) -> Option<String> {
    let name = text(node, source)?.split('.').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Parse a class definition
fn parse_class(node: Node, source: &[u8]) -> Option<ClassRecord> {
    let name = identifier(node.child_by_field_name("name")?, source)?;
    let mut class = ClassRecord::new(name);

    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        class.bases = extract_bases(superclasses, source);
    }

    if let Some(body) = node.child_by_field_name("body") {
        parse_class_body(body, source, &mut class);
    }

    Some(class)
}

/// Simple-name bases only; `abc.ABC`, `Generic[T]`, calls and keywords are dropped
fn extract_bases(node: Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter_map(|child| identifier(child, source))
        .map(str::to_string)
        .collect()
}

fn parse_class_body(body: Node, source: &[u8], class: &mut ClassRecord) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match Syntax::of(child) {
            Syntax::FunctionDef(node) => {
                add_method(node, source, &[], class);
            }
            Syntax::Decorated(node) => {
                let decorators = extract_decorators(node, source);
                if let Some(definition) = node.child_by_field_name("definition") {
                    if let Syntax::FunctionDef(inner) = Syntax::of(definition) {
                        add_method(inner, source, &decorators, class);
                    }
                }
            }
            Syntax::ExpressionStatement(stmt) => {
                let mut inner_cursor = stmt.walk();
                for expr in stmt.named_children(&mut inner_cursor) {
                    if let Syntax::Assignment(assign) = Syntax::of(expr) {
                        for target in assignment_targets(assign, source) {
                            class.properties.push(PropertyRecord::new(target));
                        }
                    }
                }
            }
            Syntax::Import(_)
            | Syntax::ImportFrom(_)
            | Syntax::FutureImport(_)
            | Syntax::ClassDef(_)
            | Syntax::Assignment(_)
            | Syntax::Call(_)
            | Syntax::Attribute(_)
            | Syntax::Other => {}
        }
    }
}

fn add_method(node: Node, source: &[u8], decorators: &[String], class: &mut ClassRecord) {
    let Some(method) = parse_method(node, source, decorators) else {
        return;
    };
    if method.name == "__init__" {
        if let Some(body) = node.child_by_field_name("body") {
            class.attrs.extend(constructor_attrs(body, source));
        }
    }
    class.methods.push(method);
}

fn parse_method(node: Node, source: &[u8], decorators: &[String]) -> Option<MethodRecord> {
    let name = identifier(node.child_by_field_name("name")?, source)?;
    let mut method = MethodRecord::new(name);
    let mut has_receiver = false;

    if let Some(params) = node.child_by_field_name("parameters") {
        method.parameters = parse_parameters(params, source);
        has_receiver = leads_with_receiver(params)
            && method
                .parameters
                .first()
                .map(|p| p.kind == ParameterKind::Regular)
                .unwrap_or(false);
    }

    let is_static = decorators.iter().any(|d| d == "staticmethod");
    if has_receiver && !is_static {
        method.parameters.remove(0);
    }

    method.return_type = return_type(node, source);

    if let Some(body) = node.child_by_field_name("body") {
        method.calls = call_sites(body, source);
    }

    Some(method)
}

/// True when the first entry of a parameter list is a positional name.
/// `def m(*, key)` has no receiver; `key` is keyword-only.
fn leads_with_receiver(params: Node) -> bool {
    let mut cursor = params.walk();
    let first = params.named_children(&mut cursor).find(|n| n.kind() != "comment");
    matches!(
        first.map(|n| n.kind()),
        Some("identifier" | "typed_parameter" | "default_parameter" | "typed_default_parameter")
    )
}

/// Parse a top-level function definition
fn parse_function(node: Node, source: &[u8]) -> Option<FunctionRecord> {
    let name = identifier(node.child_by_field_name("name")?, source)?;
    let mut func = FunctionRecord::new(name);

    if let Some(params) = node.child_by_field_name("parameters") {
        func.parameters = parse_parameters(params, source);
    }
    func.return_type = return_type(node, source);

    Some(func)
}

fn return_type(node: Node, source: &[u8]) -> Option<String> {
    node.child_by_field_name("return_type")
        .and_then(|t| text(t, source))
        .map(str::to_string)
}

/// Extract decorators from a decorated definition
fn extract_decorators(node: Node, source: &[u8]) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Some(raw) = text(child, source) {
                // Drop the `@` and any call arguments
                let dec = raw.trim_start_matches('@');
                let dec = dec.split('(').next().unwrap_or(dec);
                decorators.push(dec.trim().to_string());
            }
        }
    }

    decorators
}

/// Parse function parameters
fn parse_parameters(node: Node, source: &[u8]) -> Vec<Parameter> {
    let mut params = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => identifier(child, source).map(Parameter::new),
            "list_splat_pattern" | "dictionary_splat_pattern" => splat_parameter(child, source),
            "typed_parameter" => {
                // Name is the first named child; it may itself be a splat
                let mut inner_cursor = child.walk();
                let first = child.named_children(&mut inner_cursor).next();
                first
                    .and_then(|n| match n.kind() {
                        "identifier" => identifier(n, source).map(Parameter::new),
                        _ => splat_parameter(n, source),
                    })
                    .map(|mut p| {
                        p.type_hint = type_field(child, source);
                        p
                    })
            }
            "default_parameter" | "typed_default_parameter" => child
                .child_by_field_name("name")
                .and_then(|n| identifier(n, source))
                .map(|name| {
                    let mut p = Parameter::new(name);
                    p.type_hint = type_field(child, source);
                    p
                }),
            // `*` and `/` separators, comments
            _ => None,
        };

        if let Some(p) = param {
            params.push(p);
        }
    }

    params
}

fn splat_parameter(node: Node, source: &[u8]) -> Option<Parameter> {
    let kind = match node.kind() {
        "list_splat_pattern" => ParameterKind::Args,
        "dictionary_splat_pattern" => ParameterKind::Kwargs,
        _ => return None,
    };
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find_map(|n| identifier(n, source));
    let name = found?;
    let mut param = Parameter::new(name);
    param.kind = kind;
    Some(param)
}

fn type_field(node: Node, source: &[u8]) -> Option<String> {
    node.child_by_field_name("type")
        .and_then(|t| text(t, source))
        .map(str::to_string)
}

/// Simple-name targets of a (possibly chained) assignment
fn assignment_targets<'s>(node: Node, source: &'s [u8]) -> Vec<&'s str> {
    let mut targets = Vec::new();
    let mut current = Some(node);

    while let Some(assign) = current {
        if let Some(name) = assign
            .child_by_field_name("left")
            .and_then(|left| identifier(left, source))
        {
            targets.push(name);
        }
        current = assign
            .child_by_field_name("right")
            .filter(|right| matches!(Syntax::of(*right), Syntax::Assignment(_)));
    }

    targets
}

/// `self.x = ...` targets anywhere in a constructor body
fn constructor_attrs(body: Node, source: &[u8]) -> BTreeSet<String> {
    let mut attrs = BTreeSet::new();
    for_each_descendant(body, |node| {
        if let Syntax::Assignment(assign) = Syntax::of(node) {
            if let Some((object, attr)) = assign
                .child_by_field_name("left")
                .and_then(|left| simple_attribute(left, source))
            {
                if object == "self" {
                    attrs.insert(attr.to_string());
                }
            }
        }
    });
    attrs
}

/// Every `name.method(...)` call in a body, in source order
fn call_sites(body: Node, source: &[u8]) -> Vec<CallSite> {
    let mut calls = Vec::new();
    for_each_descendant(body, |node| {
        if let Syntax::Call(call) = Syntax::of(node) {
            if let Some((receiver, method)) = call
                .child_by_field_name("function")
                .and_then(|f| simple_attribute(f, source))
            {
                calls.push(CallSite::new(receiver, method));
            }
        }
    });
    calls
}
