//! Java shallow parser using tree-sitter.
//!
//! Produces packages, imports, type declarations, methods and fields as
//! shallow entities. Statements inside bodies are not modelled, but type
//! declarations nested in method bodies, field initializers and enum
//! constant bodies are.

use tree_sitter::{Language as Grammar, Node, Parser};

use crate::extraction::{subtypes, EntityKind, ShallowEntity, Token};
use crate::language::Language;

use super::ShallowParser;

pub struct JavaParser {
    grammar: Grammar,
}

impl JavaParser {
    pub fn new() -> Self {
        Self {
            grammar: tree_sitter_java::LANGUAGE.into(),
        }
    }

    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.grammar)?;
        Ok(parser)
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ShallowParser for JavaParser {
    fn language(&self) -> Language {
        Language::Java
    }

    fn parse(&self, source: &[u8]) -> anyhow::Result<Vec<ShallowEntity>> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("tree-sitter produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            anyhow::bail!("syntax error at line {}", line);
        }

        let builder = EntityBuilder { source };
        Ok(builder.members(root))
    }
}

/// Subtype for a type declaration node kind.
fn type_subtype(kind: &str) -> Option<&'static str> {
    match kind {
        "class_declaration" => Some(subtypes::CLASS),
        "interface_declaration" => Some(subtypes::INTERFACE),
        "enum_declaration" => Some(subtypes::ENUM),
        "record_declaration" => Some(subtypes::RECORD),
        "annotation_type_declaration" => Some(subtypes::ANNOTATION),
        _ => None,
    }
}

fn is_comment(node: Node) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error_line)
}

struct EntityBuilder<'s> {
    source: &'s [u8],
}

impl<'s> EntityBuilder<'s> {
    /// Entities declared directly inside `container` (program or body).
    fn members(&self, container: Node) -> Vec<ShallowEntity> {
        let mut entities = Vec::new();
        let mut cursor = container.walk();
        for child in container.children(&mut cursor) {
            match child.kind() {
                "package_declaration" => entities.push(self.package(child)),
                "import_declaration" => entities.push(self.simple(
                    child,
                    EntityKind::Statement,
                    "import",
                    self.import_name(child),
                )),
                "method_declaration" | "constructor_declaration"
                | "compact_constructor_declaration" => entities.push(self.method(child)),
                "field_declaration" | "constant_declaration" => {
                    let name = self.field_name(child);
                    let mut field = self.simple(child, EntityKind::Attribute, subtypes::ATTRIBUTE, name);
                    // Initializers may hold anonymous classes with local classes inside.
                    field.children = self.local_types(child);
                    entities.push(field);
                }
                "enum_constant" => {
                    if let Some(body) = child.child_by_field_name("body") {
                        entities.extend(self.local_types(body));
                    }
                }
                "enum_body_declarations" => entities.extend(self.members(child)),
                "static_initializer" | "block" => entities.extend(self.local_types(child)),
                kind if type_subtype(kind).is_some() => entities.push(self.type_declaration(child)),
                _ => {}
            }
        }
        entities
    }

    fn package(&self, node: Node) -> ShallowEntity {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            .map(|c| self.text(c).to_string())
            .unwrap_or_default();
        self.simple(node, EntityKind::Module, subtypes::PACKAGE, name)
    }

    fn import_name(&self, node: Node) -> String {
        let mut cursor = node.walk();
        let name = node
            .named_children(&mut cursor)
            .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
            .map(|c| self.text(c).to_string())
            .unwrap_or_default();
        name
    }

    fn field_name(&self, node: Node) -> String {
        let mut cursor = node.walk();
        let name = node
            .children_by_field_name("declarator", &mut cursor)
            .find_map(|d| d.child_by_field_name("name"))
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        name
    }

    /// Entity whose tokens are all own start tokens.
    fn simple(&self, node: Node, kind: EntityKind, subtype: &str, name: String) -> ShallowEntity {
        ShallowEntity {
            kind,
            subtype: subtype.to_string(),
            name,
            own_start_tokens: self.leaves(node),
            own_end_tokens: Vec::new(),
            children: Vec::new(),
        }
    }

    fn type_declaration(&self, node: Node) -> ShallowEntity {
        let subtype = type_subtype(node.kind()).unwrap_or(subtypes::CLASS);
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let body = node.child_by_field_name("body");
        let (own_start_tokens, own_end_tokens) = self.split_at_body(node, body);
        let children = body.map(|b| self.members(b)).unwrap_or_default();

        ShallowEntity {
            kind: EntityKind::Type,
            subtype: subtype.to_string(),
            name,
            own_start_tokens,
            own_end_tokens,
            children,
        }
    }

    fn method(&self, node: Node) -> ShallowEntity {
        let subtype = if node.kind() == "method_declaration" {
            subtypes::METHOD
        } else {
            subtypes::CONSTRUCTOR
        };
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();

        let body = node.child_by_field_name("body");
        let (own_start_tokens, own_end_tokens) = self.split_at_body(node, body);
        let children = body.map(|b| self.local_types(b)).unwrap_or_default();

        ShallowEntity {
            kind: EntityKind::Method,
            subtype: subtype.to_string(),
            name,
            own_start_tokens,
            own_end_tokens,
            children,
        }
    }

    /// Header tokens through the body's opening brace, and the closing brace.
    fn split_at_body(&self, node: Node, body: Option<Node>) -> (Vec<Token>, Vec<Token>) {
        let Some(body) = body else {
            return (self.leaves(node), Vec::new());
        };

        let mut start = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.id() == body.id() {
                break;
            }
            self.collect_leaves(child, &mut start);
        }

        let mut end = Vec::new();
        let count = body.child_count();
        if let Some(open) = body.child(0).filter(|c| c.kind() == "{") {
            start.push(self.token(open));
        }
        if let Some(close) = count
            .checked_sub(1)
            .and_then(|i| body.child(i))
            .filter(|c| c.kind() == "}")
        {
            end.push(self.token(close));
        }
        (start, end)
    }

    /// Type declarations nested anywhere inside a statement block.
    fn local_types(&self, block: Node) -> Vec<ShallowEntity> {
        let mut found = Vec::new();
        self.collect_local_types(block, &mut found);
        found
    }

    fn collect_local_types(&self, node: Node, out: &mut Vec<ShallowEntity>) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if type_subtype(child.kind()).is_some() {
                out.push(self.type_declaration(child));
            } else {
                self.collect_local_types(child, out);
            }
        }
    }

    fn leaves(&self, node: Node) -> Vec<Token> {
        let mut tokens = Vec::new();
        self.collect_leaves(node, &mut tokens);
        tokens
    }

    fn collect_leaves(&self, node: Node, out: &mut Vec<Token>) {
        if is_comment(node) || node.is_missing() {
            return;
        }
        if node.child_count() == 0 {
            out.push(self.token(node));
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_leaves(child, out);
        }
    }

    fn token(&self, node: Node) -> Token {
        Token {
            text: self.text(node).to_string(),
            offset: node.start_byte(),
            line: node.start_position().row + 1,
        }
    }

    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.source).unwrap_or("")
    }
}
