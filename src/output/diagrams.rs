// Diagram generation for classmap
//
// Renders the repository model as a Mermaid class diagram. Output is a pure
// function of the model: files iterate in path order, sets are sorted and
// edge lists keep first-discovery order.

use crate::analysis::Relations;
use crate::config::{DiagramMode, Direction};
use crate::error::{Error, Result};
use crate::parser::{ClassRecord, FunctionRecord, MethodRecord, Parameter, RepositoryModel};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;

/// Rendered when there is nothing to draw
pub const EMPTY_DIAGRAM: &str = "classDiagram\n    class Empty";

/// Name of the project-root node when none is configured
pub const DEFAULT_PROJECT_NAME: &str = "Project";

const INDENT: &str = "    ";

/// Diagram generator for creating Mermaid class diagrams
pub struct DiagramGenerator {
    mode: DiagramMode,
    /// Layout direction (TB, TD, BT, LR, RL)
    direction: Option<Direction>,
    /// Anchor for orphan classes in call-graph mode
    project_name: String,
}

impl DiagramGenerator {
    /// Create a new diagram generator
    pub fn new(mode: DiagramMode) -> Self {
        Self {
            mode,
            direction: None,
            project_name: DEFAULT_PROJECT_NAME.to_string(),
        }
    }

    /// Set layout direction
    pub fn with_direction(mut self, direction: Option<Direction>) -> Self {
        self.direction = direction;
        self
    }

    /// Set the project-root node name
    pub fn with_project_name(mut self, name: &str) -> Self {
        let id = sanitize_id(name);
        if !id.is_empty() {
            self.project_name = id;
        }
        self
    }

    /// Render the model, falling back to the placeholder diagram when empty
    pub fn render(&self, model: &RepositoryModel) -> String {
        match self.build(model) {
            Ok(lines) => lines.join("\n"),
            Err(e) => {
                tracing::debug!(error = %e, "rendering placeholder diagram");
                EMPTY_DIAGRAM.to_string()
            }
        }
    }

    /// Diagram lines, or `EmptyInput` if the model has nothing for this mode
    pub fn build(&self, model: &RepositoryModel) -> Result<Vec<String>> {
        let mut lines = vec!["classDiagram".to_string()];
        if let Some(direction) = self.direction {
            lines.push(format!("direction {}", direction));
        }

        match self.mode {
            DiagramMode::Structure => self.structure_lines(model, &mut lines)?,
            DiagramMode::CallGraph => self.call_graph_lines(model, &mut lines)?,
        }

        Ok(lines)
    }

    /// Properties, signatures, standalone functions and import edges
    fn structure_lines(&self, model: &RepositoryModel, lines: &mut Vec<String>) -> Result<()> {
        let has_content = model.classes().next().is_some()
            || model.functions().next().is_some()
            || model.iter().any(|f| !f.imports.is_empty());
        if !has_content {
            return Err(Error::EmptyInput);
        }

        for class in model.classes() {
            lines.push(format!("class {} {{", class.name));
            for prop in &class.properties {
                lines.push(format!("{}{}{}", INDENT, visibility(prop.is_private), prop.name));
            }
            for method in &class.methods {
                lines.push(method_line(method));
            }
            lines.push("}".to_string());
        }

        for func in model.functions() {
            lines.push(format!("class {} {{", func.name));
            lines.push(function_line(func));
            lines.push("}".to_string());
        }

        let mut inheritance = IndexSet::new();
        for file in model.iter() {
            for (child, bases) in &file.inheritance {
                for base in bases {
                    inheritance.insert(format!("{} <|-- {}", base, child));
                }
            }
        }
        lines.extend(inheritance);

        for file in model.iter() {
            let base = file.base_name();
            for module in &file.imports {
                lines.push(format!("{} ..> {} : imports", base, module));
            }
        }

        Ok(())
    }

    /// Constructor attributes, known inheritance, call edges and orphan anchoring
    fn call_graph_lines(&self, model: &RepositoryModel, lines: &mut Vec<String>) -> Result<()> {
        let classes = merge_by_name(model);
        if classes.is_empty() {
            return Err(Error::EmptyInput);
        }
        let relations = Relations::extract(model);

        for (name, class) in &classes {
            lines.push(format!("class {} {{", name));
            for attr in &class.attrs {
                lines.push(format!(
                    "{}{}{}",
                    INDENT,
                    visibility(crate::parser::is_private_name(attr)),
                    attr
                ));
            }
            for method in class.methods.values() {
                lines.push(method_line(method));
            }
            lines.push("}".to_string());
        }

        for (base, child) in &relations.inheritance {
            lines.push(format!("{} <|-- {}", base, child));
        }

        for edge in &relations.calls {
            lines.push(edge.to_string());
        }

        let related = relations.related_classes();
        for name in classes.keys() {
            if !related.contains(name) {
                lines.push(format!("{} <.. {}", self.project_name, name));
            }
        }
        lines.push(format!("class {}", self.project_name));

        Ok(())
    }
}

/// A class node after same-name classes have been folded together
struct MergedClass<'m> {
    attrs: BTreeSet<&'m str>,
    /// First definition of each method name wins
    methods: IndexMap<&'m str, &'m MethodRecord>,
}

/// Class name is the node identity; same-name classes from different files merge
fn merge_by_name(model: &RepositoryModel) -> IndexMap<&str, MergedClass<'_>> {
    let mut merged: IndexMap<&str, MergedClass> = IndexMap::new();
    for class in model.classes() {
        let entry = merged.entry(class.name.as_str()).or_insert_with(|| MergedClass {
            attrs: BTreeSet::new(),
            methods: IndexMap::new(),
        });
        merge_class(entry, class);
    }
    merged
}

fn merge_class<'m>(into: &mut MergedClass<'m>, class: &'m ClassRecord) {
    into.attrs.extend(class.attrs.iter().map(String::as_str));
    for method in &class.methods {
        into.methods.entry(method.name.as_str()).or_insert(method);
    }
}

fn visibility(is_private: bool) -> &'static str {
    if is_private {
        "-"
    } else {
        "+"
    }
}

fn method_line(method: &MethodRecord) -> String {
    format!(
        "{}{}{}({}){}",
        INDENT,
        visibility(method.is_private),
        method.name,
        param_list(&method.parameters),
        return_suffix(method.return_type.as_deref())
    )
}

fn function_line(func: &FunctionRecord) -> String {
    format!(
        "{}+function({}){}",
        INDENT,
        param_list(&func.parameters),
        return_suffix(func.return_type.as_deref())
    )
}

fn param_list(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|p| squash_whitespace(&p.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn return_suffix(ret: Option<&str>) -> String {
    match ret {
        Some(r) => format!(" {}", squash_whitespace(r)),
        None => String::new(),
    }
}

/// Collapse runs of whitespace so annotations stay on one line
fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Render with the default project name
pub fn render_diagram(
    model: &RepositoryModel,
    mode: DiagramMode,
    direction: Option<Direction>,
) -> String {
    DiagramGenerator::new(mode)
        .with_direction(direction)
        .render(model)
}
