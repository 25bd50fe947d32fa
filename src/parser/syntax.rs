// Closed set of tree-sitter node kinds the extractor consumes
//
// Every walk goes through `Syntax::of`, so the set of node kinds that can
// influence the model lives in one place. Anything else is `Other`.

use tree_sitter::Node;

/// A syntax node tagged by the category the extractor cares about
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Syntax<'t> {
    /// `import a.b, c as d`
    Import(Node<'t>),
    /// `from a.b import c`
    ImportFrom(Node<'t>),
    /// `from __future__ import annotations`
    FutureImport(Node<'t>),
    ClassDef(Node<'t>),
    FunctionDef(Node<'t>),
    /// A class or function with decorators in front of it
    Decorated(Node<'t>),
    /// Statement wrapper around assignments and bare expressions
    ExpressionStatement(Node<'t>),
    Assignment(Node<'t>),
    Call(Node<'t>),
    /// `object.attribute`
    Attribute(Node<'t>),
    Other,
}

impl<'t> Syntax<'t> {
    pub fn of(node: Node<'t>) -> Self {
        match node.kind() {
            "import_statement" => Syntax::Import(node),
            "import_from_statement" => Syntax::ImportFrom(node),
            "future_import_statement" => Syntax::FutureImport(node),
            "class_definition" => Syntax::ClassDef(node),
            "function_definition" => Syntax::FunctionDef(node),
            "decorated_definition" => Syntax::Decorated(node),
            "expression_statement" => Syntax::ExpressionStatement(node),
            "assignment" => Syntax::Assignment(node),
            "call" => Syntax::Call(node),
            "attribute" => Syntax::Attribute(node),
            _ => Syntax::Other,
        }
    }
}

/// Source text of a node, `None` if it is not valid UTF-8
pub fn text<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    node.utf8_text(source).ok()
}

/// Text of `node` when it is a bare identifier
pub fn identifier<'s>(node: Node<'_>, source: &'s [u8]) -> Option<&'s str> {
    if node.kind() == "identifier" {
        text(node, source)
    } else {
        None
    }
}

/// `(object, attribute)` for an `object.attribute` node whose object is a bare identifier
pub fn simple_attribute<'s>(node: Node<'_>, source: &'s [u8]) -> Option<(&'s str, &'s str)> {
    let Syntax::Attribute(attr) = Syntax::of(node) else {
        return None;
    };
    let object = identifier(attr.child_by_field_name("object")?, source)?;
    let name = identifier(attr.child_by_field_name("attribute")?, source)?;
    Some((object, name))
}

/// Visit every node below `node` in document order, `node` itself excluded
pub fn for_each_descendant<'t>(node: Node<'t>, mut visit: impl FnMut(Node<'t>)) {
    let mut cursor = node.walk();
    'outer: loop {
        if cursor.goto_first_child() {
            visit(cursor.node());
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                visit(cursor.node());
                continue 'outer;
            }
            if !cursor.goto_parent() || cursor.node() == node {
                break 'outer;
            }
        }
    }
}

/// First node below `node` that is an error or a missing token
pub fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    let mut found = None;
    for_each_descendant(node, |n| {
        if found.is_none() && (n.is_error() || n.is_missing()) {
            found = Some(n);
        }
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(source: &str) -> tree_sitter::Tree {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_python::language())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn test_classifies_top_level_statements() {
        let source = "import os\nfrom a import b\nclass A: pass\ndef f(): pass\nx = 1\n";
        let tree = parse(source);
        let root = tree.root_node();
        let mut cursor = root.walk();
        let kinds: Vec<&str> = root
            .named_children(&mut cursor)
            .map(|n| match Syntax::of(n) {
                Syntax::Import(_) => "import",
                Syntax::ImportFrom(_) => "from",
                Syntax::ClassDef(_) => "class",
                Syntax::FunctionDef(_) => "def",
                Syntax::ExpressionStatement(_) => "stmt",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, vec!["import", "from", "class", "def", "stmt"]);
    }

    #[test]
    fn test_for_each_descendant_stays_inside_node() {
        let source = "def f():\n    a()\ndef g():\n    b()\n";
        let tree = parse(source);
        let root = tree.root_node();
        let first = root.named_child(0).unwrap();

        let mut calls = Vec::new();
        for_each_descendant(first, |n| {
            if let Syntax::Call(call) = Syntax::of(n) {
                calls.push(call.utf8_text(source.as_bytes()).unwrap().to_string());
            }
        });
        assert_eq!(calls, vec!["a()"]);
    }

    #[test]
    fn test_simple_attribute() {
        let source = "Animal.speak\nself.a.b\n";
        let tree = parse(source);
        let root = tree.root_node();
        let mut found = Vec::new();
        for_each_descendant(root, |n| {
            if let Some(pair) = simple_attribute(n, source.as_bytes()) {
                found.push(pair);
            }
        });
        assert!(found.contains(&("Animal", "speak")));
        assert!(found.contains(&("self", "a")));
        assert!(!found.iter().any(|(_, attr)| *attr == "b"));
    }

    #[test]
    fn test_first_error() {
        let ok = parse("x = 1\n");
        assert!(first_error(ok.root_node()).is_none());

        let broken = parse("def f(:\n    pass\n");
        assert!(first_error(broken.root_node()).is_some());
    }
}
