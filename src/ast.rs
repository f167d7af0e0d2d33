//! Abstract syntax tree consumed by the rule engine.
//!
//! The engine treats a parsed file as a read-only tree of [`AstNode`]s
//! tagged with a closed [`NodeKind`]. Nodes carry an optional source span,
//! an optional text payload (identifier names, literal and type spellings
//! sliced from the source), a small attribute bag (visibility, mutability,
//! operators) and ordered children. Rules consume nodes through the
//! accessors here and through [`crate::walker`] rather than by reflecting
//! over parser internals, so the external grammar can evolve without
//! touching the rule library.

use compact_str::CompactString;
use serde::Serialize;
use smallvec::SmallVec;

use crate::source::SourceRange;

/// Attribute bag type: most nodes carry zero or one entry.
pub type AttrVec = SmallVec<[(CompactString, CompactString); 2]>;

/// Closed set of node kinds produced by the parser lowering.
///
/// Constructs the lowering does not model map to [`NodeKind::Other`]; such
/// nodes still carry their span so rules can fall back to source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    SourceUnit,
    PragmaDirective,
    ImportDirective,
    ContractDefinition,
    StructDefinition,
    EnumDefinition,
    EventDefinition,
    EventParameter,
    ErrorDefinition,
    FunctionDefinition,
    ModifierDefinition,
    ModifierInvocation,
    Parameter,
    StateVariableDeclaration,
    UsingDirective,
    Block,
    IfStatement,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ReturnStatement,
    EmitStatement,
    RevertStatement,
    TryStatement,
    ExpressionStatement,
    VariableDeclarationStatement,
    VariableDeclaration,
    ContinueStatement,
    BreakStatement,
    InlineAssembly,
    BinaryOperation,
    UnaryOperation,
    Assignment,
    ConditionalExpression,
    FunctionCall,
    NewExpression,
    MemberAccess,
    IndexAccess,
    Identifier,
    NumberLiteral,
    StringLiteral,
    BoolLiteral,
    HexLiteral,
    AddressLiteral,
    ElementaryTypeName,
    TupleExpression,
    ArrayLiteral,
    Other
}

impl NodeKind {
    /// Stable display name, used in fallback-location messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::SourceUnit => "SourceUnit",
            Self::PragmaDirective => "PragmaDirective",
            Self::ImportDirective => "ImportDirective",
            Self::ContractDefinition => "ContractDefinition",
            Self::StructDefinition => "StructDefinition",
            Self::EnumDefinition => "EnumDefinition",
            Self::EventDefinition => "EventDefinition",
            Self::EventParameter => "EventParameter",
            Self::ErrorDefinition => "ErrorDefinition",
            Self::FunctionDefinition => "FunctionDefinition",
            Self::ModifierDefinition => "ModifierDefinition",
            Self::ModifierInvocation => "ModifierInvocation",
            Self::Parameter => "Parameter",
            Self::StateVariableDeclaration => "StateVariableDeclaration",
            Self::UsingDirective => "UsingDirective",
            Self::Block => "Block",
            Self::IfStatement => "IfStatement",
            Self::WhileStatement => "WhileStatement",
            Self::DoWhileStatement => "DoWhileStatement",
            Self::ForStatement => "ForStatement",
            Self::ReturnStatement => "ReturnStatement",
            Self::EmitStatement => "EmitStatement",
            Self::RevertStatement => "RevertStatement",
            Self::TryStatement => "TryStatement",
            Self::ExpressionStatement => "ExpressionStatement",
            Self::VariableDeclarationStatement => "VariableDeclarationStatement",
            Self::VariableDeclaration => "VariableDeclaration",
            Self::ContinueStatement => "ContinueStatement",
            Self::BreakStatement => "BreakStatement",
            Self::InlineAssembly => "InlineAssembly",
            Self::BinaryOperation => "BinaryOperation",
            Self::UnaryOperation => "UnaryOperation",
            Self::Assignment => "Assignment",
            Self::ConditionalExpression => "ConditionalExpression",
            Self::FunctionCall => "FunctionCall",
            Self::NewExpression => "NewExpression",
            Self::MemberAccess => "MemberAccess",
            Self::IndexAccess => "IndexAccess",
            Self::Identifier => "Identifier",
            Self::NumberLiteral => "NumberLiteral",
            Self::StringLiteral => "StringLiteral",
            Self::BoolLiteral => "BoolLiteral",
            Self::HexLiteral => "HexLiteral",
            Self::AddressLiteral => "AddressLiteral",
            Self::ElementaryTypeName => "ElementaryTypeName",
            Self::TupleExpression => "TupleExpression",
            Self::ArrayLiteral => "ArrayLiteral",
            Self::Other => "Other"
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single node of the parsed tree.
///
/// Children are ordered in source order. Span fields are positions, not
/// children; traversal never descends into them.
#[derive(Debug, Clone, Serialize)]
pub struct AstNode {
    pub kind:     NodeKind,
    pub span:     Option<SourceRange>,
    /// Identifier name, operator, or source spelling of a literal/type.
    pub text:     Option<CompactString>,
    pub attrs:    AttrVec,
    pub children: Vec<AstNode>
}

impl AstNode {
    pub fn new(kind: NodeKind, span: Option<SourceRange>) -> Self {
        Self {
            kind,
            span,
            text: None,
            attrs: AttrVec::new(),
            children: Vec::new()
        }
    }

    pub fn with_text(mut self, text: impl Into<CompactString>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<CompactString>) -> Self {
        self.attrs.push((CompactString::new(key), value.into()));
        self
    }

    pub fn with_children(mut self, children: Vec<AstNode>) -> Self {
        self.children = children;
        self
    }

    pub fn push_child(&mut self, child: AstNode) {
        self.children.push(child);
    }

    pub fn text_str(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    /// First direct child of the given kind.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&AstNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    /// All direct children of the given kind.
    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &AstNode> {
        self.children.iter().filter(move |c| c.kind == kind)
    }

    /// True for `MemberAccess` nodes reading `object.member`, e.g.
    /// `is_member_of("tx", "origin")` for `tx.origin`.
    pub fn is_member_of(&self, object: &str, member: &str) -> bool {
        self.kind == NodeKind::MemberAccess
            && self.text_str() == Some(member)
            && self
                .children
                .first()
                .is_some_and(|base| base.kind == NodeKind::Identifier && base.text_str() == Some(object))
    }

    /// True for `FunctionCall` nodes whose callee is a bare identifier with
    /// the given name, e.g. `require(...)` or `sha3(...)`.
    pub fn is_call_to(&self, callee: &str) -> bool {
        self.kind == NodeKind::FunctionCall
            && self
                .children
                .first()
                .is_some_and(|f| f.kind == NodeKind::Identifier && f.text_str() == Some(callee))
    }

    /// Callee node of a `FunctionCall`, if any.
    pub fn callee(&self) -> Option<&AstNode> {
        (self.kind == NodeKind::FunctionCall)
            .then(|| self.children.first())
            .flatten()
    }

    /// Argument nodes of a `FunctionCall` (children after the callee).
    pub fn call_args(&self) -> &[AstNode] {
        if self.kind == NodeKind::FunctionCall && !self.children.is_empty() {
            &self.children[1..]
        } else {
            &[]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Position, SourceRange};

    fn span() -> Option<SourceRange> {
        Some(SourceRange::new(Position::new(1, 0), Position::new(1, 9)))
    }

    #[test]
    fn test_attr_lookup() {
        let node = AstNode::new(NodeKind::FunctionDefinition, span())
            .with_attr("visibility", "public")
            .with_attr("mutability", "view");
        assert_eq!(node.attr("visibility"), Some("public"));
        assert_eq!(node.attr("mutability"), Some("view"));
        assert_eq!(node.attr("virtual"), None);
    }

    #[test]
    fn test_is_member_of() {
        let access = AstNode::new(NodeKind::MemberAccess, span())
            .with_text("origin")
            .with_children(vec![
                AstNode::new(NodeKind::Identifier, span()).with_text("tx"),
            ]);
        assert!(access.is_member_of("tx", "origin"));
        assert!(!access.is_member_of("msg", "origin"));
        assert!(!access.is_member_of("tx", "gasprice"));
    }

    #[test]
    fn test_call_accessors() {
        let call = AstNode::new(NodeKind::FunctionCall, span()).with_children(vec![
            AstNode::new(NodeKind::Identifier, span()).with_text("require"),
            AstNode::new(NodeKind::BoolLiteral, span()).with_text("true"),
        ]);
        assert!(call.is_call_to("require"));
        assert_eq!(call.call_args().len(), 1);
        assert_eq!(call.callee().and_then(AstNode::text_str), Some("require"));
    }

    #[test]
    fn test_children_of_kind() {
        let unit = AstNode::new(NodeKind::SourceUnit, None).with_children(vec![
            AstNode::new(NodeKind::PragmaDirective, span()),
            AstNode::new(NodeKind::ContractDefinition, span()),
            AstNode::new(NodeKind::ContractDefinition, span()),
        ]);
        assert_eq!(unit.children_of_kind(NodeKind::ContractDefinition).count(), 2);
        assert!(unit.child_of_kind(NodeKind::PragmaDirective).is_some());
    }
}
