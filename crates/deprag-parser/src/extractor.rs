// ABOUTME: Walks a Python syntax tree and extracts candidate references to
// ABOUTME: the target library's functions, resolving imports and aliases.
use deprag_core::{FunctionReference, LibraryProfile};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use tree_sitter::{Node, Parser, TreeCursor};

/// How a call expression was attributed to the target library. Strategies
/// are tried in declaration order; the first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// Bare name found in the import alias table (or covered by a star
    /// import of the library).
    DirectAlias,
    /// Attribute chain whose root resolves through the alias table; the
    /// qualified name's library prefix is rewritten to the short alias.
    QualifiedRewrite,
    /// Chain root is already a recognized alias of the library.
    AliasPassthrough,
    /// A wildcard import is active and the chain has depth > 1; accepted
    /// unresolved.
    StarFallback,
}

/// Extracts candidate function references from Python source. One instance
/// per analysis request; all traversal state lives in the walk itself.
pub struct ReferenceExtractor {
    profile: LibraryProfile,
}

impl ReferenceExtractor {
    pub fn new(profile: LibraryProfile) -> Self {
        Self { profile }
    }

    /// Returns one entry per occurrence, duplicates and line numbers
    /// included; deduplication is the caller's decision. Unparseable
    /// source yields an empty list, never an error.
    pub fn extract(&self, source: &str) -> Vec<FunctionReference> {
        let mut parser = Parser::new();
        if parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .is_err()
        {
            warn!("Python grammar unavailable, skipping extraction");
            return Vec::new();
        }

        let tree = match parser.parse(source, None) {
            Some(tree) => tree,
            None => {
                warn!("Failed to parse source, skipping extraction");
                return Vec::new();
            }
        };

        if tree.root_node().has_error() {
            warn!("Source contains syntax errors, skipping extraction");
            return Vec::new();
        }

        let mut walk = Traversal {
            profile: &self.profile,
            source,
            imports: HashMap::new(),
            star_imports: HashSet::new(),
            references: Vec::new(),
        };
        let mut cursor = tree.root_node().walk();
        walk.visit(&mut cursor);
        walk.references
    }
}

struct Traversal<'a> {
    profile: &'a LibraryProfile,
    source: &'a str,
    imports: HashMap<String, String>,
    star_imports: HashSet<String>,
    references: Vec<FunctionReference>,
}

impl<'a> Traversal<'a> {
    fn visit(&mut self, cursor: &mut TreeCursor<'_>) {
        let node = cursor.node();
        match node.kind() {
            "import_statement" => self.collect_import(node),
            "import_from_statement" => self.collect_import_from(node),
            "call" => self.collect_call(node),
            "attribute" => self.collect_method_chain(node),
            _ => {}
        }

        if cursor.goto_first_child() {
            loop {
                self.visit(cursor);
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn line(&self, node: Node) -> u32 {
        node.start_position().row as u32 + 1
    }

    /// `import numpy`, `import numpy as np`, `import numpy_financial as npf`.
    fn collect_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            let (name, local) = match child.kind() {
                "dotted_name" => {
                    let name = self.text(child);
                    (name, name)
                }
                "aliased_import" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or("");
                    let local = child
                        .child_by_field_name("alias")
                        .map(|n| self.text(n))
                        .unwrap_or(name);
                    (name, local)
                }
                _ => continue,
            };
            if !name.is_empty() && self.profile.matches_module(name) {
                self.imports.insert(local.to_string(), name.to_string());
            }
        }
    }

    /// `from numpy import array as arr`, `from numpy import *`.
    fn collect_import_from(&mut self, node: Node) {
        let module_node = match node.child_by_field_name("module_name") {
            Some(n) => n,
            None => return,
        };
        let module = self.text(module_node);
        if !self.profile.matches_module(module) {
            return;
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        if children.iter().any(|c| c.kind() == "wildcard_import") {
            self.star_imports.insert(module.to_string());
            return;
        }

        for child in children {
            if child.id() == module_node.id() {
                continue;
            }
            let (name, local) = match child.kind() {
                "dotted_name" | "identifier" => {
                    let name = self.text(child);
                    (name, name)
                }
                "aliased_import" => {
                    let name = child
                        .child_by_field_name("name")
                        .map(|n| self.text(n))
                        .unwrap_or("");
                    let local = child
                        .child_by_field_name("alias")
                        .map(|n| self.text(n))
                        .unwrap_or(name);
                    (name, local)
                }
                _ => continue,
            };
            if !name.is_empty() {
                self.imports
                    .insert(local.to_string(), format!("{}.{}", module, name));
            }
        }
    }

    fn collect_call(&mut self, node: Node) {
        let callee = match node.child_by_field_name("function") {
            Some(n) => n,
            None => return,
        };
        if let Some((name, strategy)) = self.resolve_callee(callee) {
            debug!(%name, ?strategy, line = self.line(node), "resolved call");
            self.references.push(FunctionReference {
                name,
                line: self.line(node),
                call: self.text(node).to_string(),
            });
        }
    }

    fn resolve_callee(&self, callee: Node) -> Option<(String, Resolution)> {
        match callee.kind() {
            "identifier" => {
                let name = self.text(callee);
                if let Some(qualified) = self.imports.get(name) {
                    return Some((qualified.clone(), Resolution::DirectAlias));
                }
                if !self.star_imports.is_empty() {
                    return Some((name.to_string(), Resolution::DirectAlias));
                }
                None
            }
            "attribute" => {
                let chain = self.attribute_chain(callee);
                let root = chain.first()?;
                if let Some(base) = self.imports.get(root) {
                    let qualified = format!("{}.{}", base, chain[1..].join("."));
                    return Some((
                        self.profile.normalize_prefix(&qualified),
                        Resolution::QualifiedRewrite,
                    ));
                }
                if self.profile.is_alias(root) {
                    return Some((
                        self.profile.normalize_prefix(&chain.join(".")),
                        Resolution::AliasPassthrough,
                    ));
                }
                if !self.star_imports.is_empty() && chain.len() > 1 {
                    return Some((chain.join("."), Resolution::StarFallback));
                }
                None
            }
            _ => None,
        }
    }

    /// Attribute accesses outside the alias-resolved call path: record the
    /// chain keyed by its final attribute when some segment matches the
    /// library's array-method set, e.g. `arr.tostring`.
    fn collect_method_chain(&mut self, node: Node) {
        if let Some(object) = node.child_by_field_name("object") {
            if object.kind() == "identifier" && self.profile.is_alias(self.text(object)) {
                return;
            }
        }

        let chain = self.attribute_chain(node);
        if chain.is_empty() {
            return;
        }
        if !chain
            .iter()
            .any(|part| self.profile.method_names.iter().any(|m| m == part))
        {
            return;
        }

        let name = chain.last().cloned().unwrap_or_default();
        if name.is_empty() {
            return;
        }
        self.references.push(FunctionReference {
            name,
            line: self.line(node),
            call: chain.join("."),
        });
    }

    /// Flattens `a.b.c` into `["a", "b", "c"]`. A chain rooted in anything
    /// but a plain identifier (a call result, a subscript) keeps only the
    /// attribute segments.
    fn attribute_chain(&self, node: Node) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = node;
        while current.kind() == "attribute" {
            if let Some(attr) = current.child_by_field_name("attribute") {
                parts.push(self.text(attr).to_string());
            }
            match current.child_by_field_name("object") {
                Some(object) => current = object,
                None => break,
            }
        }
        if current.kind() == "identifier" {
            parts.push(self.text(current).to_string());
        }
        parts.reverse();
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(source: &str) -> Vec<FunctionReference> {
        ReferenceExtractor::new(LibraryProfile::numpy()).extract(source)
    }

    #[test]
    fn invalid_source_yields_empty_list() {
        let refs = extract("def broken(:\n    np.asscalar(");
        assert!(refs.is_empty());
    }

    #[test]
    fn alias_import_resolves_to_qualified_name() {
        let refs = extract("import numpy as np\nnp.asscalar(x)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "np.asscalar");
        assert_eq!(refs[0].call, "np.asscalar(x)");
        assert_eq!(refs[0].line, 2);
    }

    #[test]
    fn unaliased_import_rewrites_to_short_alias() {
        let refs = extract("import numpy\nnumpy.asscalar(x)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "np.asscalar");
    }

    #[test]
    fn custom_alias_resolves_through_import_table() {
        let refs = extract("import numpy as nump\nnump.zeros_like(a)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "np.zeros_like");
    }

    #[test]
    fn from_import_binds_single_symbol() {
        let refs = extract("from numpy import asscalar\nasscalar(x)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "numpy.asscalar");
    }

    #[test]
    fn from_import_alias_binds_local_name() {
        let refs = extract("from numpy import asscalar as scalar\nscalar(x)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "numpy.asscalar");
    }

    #[test]
    fn star_import_accepts_bare_calls() {
        let refs = extract("from numpy import *\nfull_like(a, 0)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "full_like");
    }

    #[test]
    fn star_import_accepts_deep_chains_unresolved() {
        let refs = extract("from numpy import *\nrandom.rand(3)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "random.rand");
    }

    #[test]
    fn bare_calls_without_traceable_import_are_dropped() {
        let refs = extract("full_like(a, 0)\n");
        assert!(refs.is_empty());
    }

    #[test]
    fn unrelated_qualified_calls_are_dropped() {
        let refs = extract("import pandas as pd\npd.read_csv('x.csv')\n");
        assert!(refs.is_empty());
    }

    #[test]
    fn array_method_chain_is_recorded_by_final_attribute() {
        let refs = extract("import numpy as np\narr.tostring()\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "tostring");
        assert_eq!(refs[0].call, "arr.tostring");
    }

    #[test]
    fn alias_based_chains_are_not_double_counted_as_methods() {
        // np.sum(x) resolves through the call path; the np.sum attribute
        // itself must not add a second "sum" method record.
        let refs = extract("import numpy as np\nnp.sum(x)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "np.sum");
    }

    #[test]
    fn duplicates_and_line_numbers_are_preserved() {
        let refs = extract("import numpy as np\nnp.asscalar(x)\nnp.asscalar(y)\n");
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].line, 2);
        assert_eq!(refs[1].line, 3);
        assert_eq!(refs[0].name, refs[1].name);
    }

    #[test]
    fn numpy_financial_alias_is_recognized() {
        let refs = extract("import numpy_financial as npf\nnpf.pmt(0.05, 10, 100)\n");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "numpy_financial.pmt");
    }

    #[test]
    fn emitted_names_are_never_empty() {
        let source = "import numpy as np\nfrom numpy import *\nnp.mean(a)\narr.ravel()\nrandom.rand(2)\n";
        for reference in extract(source) {
            assert!(!reference.name.is_empty());
        }
    }
}
