// Inheritance and cross-class call edges between known classes
//
// Purely name based: `X.method()` counts as a call into class `X` whenever a
// class called `X` exists anywhere in the repository. No type inference, so
// a local variable that shadows a class name produces an edge too.

use crate::parser::RepositoryModel;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// `source_class.source_method` calls `target_class.target_method`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CallEdge {
    pub source_class: String,
    pub source_method: String,
    pub target_class: String,
    pub target_method: String,
}

impl CallEdge {
    pub fn new(source_class: &str, source_method: &str, target_class: &str, target_method: &str) -> Self {
        Self {
            source_class: source_class.to_string(),
            source_method: source_method.to_string(),
            target_class: target_class.to_string(),
            target_method: target_method.to_string(),
        }
    }
}

impl fmt::Display for CallEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} : {}() --> {} : {}()",
            self.source_class, self.source_method, self.target_class, self.target_method
        )
    }
}

/// Edges between classes declared in the repository, in discovery order
#[derive(Debug, Clone, Default, Serialize)]
pub struct Relations {
    /// `(base, child)` pairs where both names are declared classes
    pub inheritance: IndexSet<(String, String)>,
    pub calls: IndexSet<CallEdge>,
    /// Every name listed as a base by some class, known or not
    pub bases: BTreeSet<String>,
}

impl Relations {
    /// Find inheritance and call edges across the whole model
    pub fn extract(model: &RepositoryModel) -> Self {
        let known = model.class_names();
        let mut relations = Relations::default();

        for class in model.classes() {
            for base in &class.bases {
                relations.bases.insert(base.clone());
                if known.contains(base.as_str()) {
                    relations
                        .inheritance
                        .insert((base.clone(), class.name.clone()));
                }
            }

            for method in &class.methods {
                for call in &method.calls {
                    if call.receiver != class.name && known.contains(call.receiver.as_str()) {
                        relations.calls.insert(CallEdge::new(
                            &class.name,
                            &method.name,
                            &call.receiver,
                            &call.method,
                        ));
                    }
                }
            }
        }

        tracing::debug!(
            inheritance = relations.inheritance.len(),
            calls = relations.calls.len(),
            "relationship extraction complete"
        );

        relations
    }

    /// Names used as a base or at either end of a call edge
    ///
    /// Having a base does not make a class related; a subclass nobody
    /// derives from or calls still hangs off the project node.
    pub fn related_classes(&self) -> BTreeSet<&str> {
        let mut related: BTreeSet<&str> = self.bases.iter().map(String::as_str).collect();
        for edge in &self.calls {
            related.insert(edge.source_class.as_str());
            related.insert(edge.target_class.as_str());
        }
        related
    }

    pub fn is_empty(&self) -> bool {
        self.inheritance.is_empty() && self.calls.is_empty()
    }
}
