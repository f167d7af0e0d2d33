//! Solidity parsing and lowering into the engine's AST.
//!
//! The engine consumes parsers through the [`SourceParser`] trait; the
//! shipped [`SolidityParser`] wraps [`solang_parser`] and lowers its parse
//! tree into [`AstNode`]s. Byte offsets are converted to 1-based line /
//! 0-based column positions exactly once here, through the file's
//! [`SourceView`]. A parse that produces diagnostics and no usable tree
//! marks the file as parse-failed; no rules run for such files.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use solang_parser::pt::{self, CodeLocation};

use crate::{
    ast::{AstNode, NodeKind},
    source::{SourceRange, SourceView}
};

/// Parser invocation options.
///
/// The engine always requests tolerant parsing with locations; the struct
/// exists so alternative [`SourceParser`] implementations see the same
/// contract.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    pub tolerant:       bool,
    pub with_locations: bool
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            tolerant:       true,
            with_locations: true
        }
    }
}

/// A single parser diagnostic with an optional source location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    pub message:  String,
    pub location: Option<SourceRange>
}

/// Result of a parse: a best-effort tree plus any diagnostics.
#[derive(Debug)]
pub struct ParseOutcome {
    pub ast:    Option<AstNode>,
    pub errors: Vec<ParseDiagnostic>
}

impl ParseOutcome {
    /// True when diagnostics were produced and no usable tree exists.
    pub fn failed(&self) -> bool {
        self.ast.is_none()
    }
}

/// External parser interface consumed by the engine.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str, options: &ParseOptions) -> ParseOutcome;
}

/// [`solang_parser`]-backed Solidity parser.
#[derive(Debug, Default)]
pub struct SolidityParser;

impl SourceParser for SolidityParser {
    fn parse(&self, source: &str, _options: &ParseOptions) -> ParseOutcome {
        let view = SourceView::new(source);
        let lowering = Lowering {
            view
        };
        match solang_parser::parse(source, 0) {
            Ok((unit, _comments)) => ParseOutcome {
                ast:    Some(lowering.source_unit(&unit)),
                errors: Vec::new()
            },
            Err(diagnostics) => ParseOutcome {
                ast:    None,
                errors: diagnostics
                    .iter()
                    .map(|d| ParseDiagnostic {
                        message:  d.message.clone(),
                        location: lowering.span(&d.loc)
                    })
                    .collect()
            }
        }
    }
}

/// Children of loop statements vary between expression and statement slots;
/// lowering goes through this trait so each slot lowers by its own type.
trait LowerChild {
    fn lower_into(&self, lowering: &Lowering<'_>, out: &mut Vec<AstNode>);
}

impl LowerChild for pt::Statement {
    fn lower_into(&self, lowering: &Lowering<'_>, out: &mut Vec<AstNode>) {
        out.push(lowering.statement(self));
    }
}

impl LowerChild for pt::Expression {
    fn lower_into(&self, lowering: &Lowering<'_>, out: &mut Vec<AstNode>) {
        out.push(lowering.expression(self));
    }
}

impl<T: LowerChild> LowerChild for Box<T> {
    fn lower_into(&self, lowering: &Lowering<'_>, out: &mut Vec<AstNode>) {
        (**self).lower_into(lowering, out);
    }
}

impl<T: LowerChild> LowerChild for Option<T> {
    fn lower_into(&self, lowering: &Lowering<'_>, out: &mut Vec<AstNode>) {
        if let Some(inner) = self {
            inner.lower_into(lowering, out);
        }
    }
}

struct Lowering<'a> {
    view: SourceView<'a>
}

impl Lowering<'_> {
    fn span(&self, loc: &pt::Loc) -> Option<SourceRange> {
        match loc {
            pt::Loc::File(_, start, end) => Some(self.view.range_at(*start, *end)),
            _ => None
        }
    }

    /// Source spelling of a located construct, for literal/type payloads.
    fn slice(&self, loc: &pt::Loc) -> Option<CompactString> {
        match loc {
            pt::Loc::File(_, start, end) => {
                self.view.text().get(*start..*end).map(CompactString::new)
            }
            _ => None
        }
    }

    fn source_unit(&self, unit: &pt::SourceUnit) -> AstNode {
        let children = unit.0.iter().map(|part| self.source_unit_part(part)).collect();
        AstNode::new(NodeKind::SourceUnit, None).with_children(children)
    }

    fn source_unit_part(&self, part: &pt::SourceUnitPart) -> AstNode {
        match part {
            pt::SourceUnitPart::ContractDefinition(def) => self.contract(def),
            pt::SourceUnitPart::FunctionDefinition(def) => self.function(def),
            pt::SourceUnitPart::VariableDefinition(def) => self.state_variable(def),
            pt::SourceUnitPart::StructDefinition(def) => {
                self.named_leaf(NodeKind::StructDefinition, &def.loc, def.name.as_ref())
            }
            pt::SourceUnitPart::EnumDefinition(def) => {
                self.named_leaf(NodeKind::EnumDefinition, &def.loc, def.name.as_ref())
            }
            pt::SourceUnitPart::EventDefinition(def) => self.event(def),
            pt::SourceUnitPart::ErrorDefinition(def) => {
                self.named_leaf(NodeKind::ErrorDefinition, &def.loc, def.name.as_ref())
            }
            pt::SourceUnitPart::PragmaDirective(..) => {
                AstNode::new(NodeKind::PragmaDirective, None)
            }
            pt::SourceUnitPart::ImportDirective(..) => {
                AstNode::new(NodeKind::ImportDirective, None)
            }
            pt::SourceUnitPart::Using(using) => {
                AstNode::new(NodeKind::UsingDirective, self.span(&using.loc))
            }
            pt::SourceUnitPart::TypeDefinition(def) => {
                AstNode::new(NodeKind::Other, self.span(&def.loc))
            }
            pt::SourceUnitPart::StraySemicolon(loc) => {
                AstNode::new(NodeKind::Other, self.span(loc))
            }
            _ => AstNode::new(NodeKind::Other, None)
        }
    }

    fn contract(&self, def: &pt::ContractDefinition) -> AstNode {
        let kind_attr = match def.ty {
            pt::ContractTy::Contract(_) => "contract",
            pt::ContractTy::Abstract(_) => "abstract",
            pt::ContractTy::Interface(_) => "interface",
            pt::ContractTy::Library(_) => "library"
        };
        let mut node = AstNode::new(NodeKind::ContractDefinition, self.span(&def.loc))
            .with_attr("kind", kind_attr);
        if let Some(name) = &def.name {
            node = node.with_text(name.name.as_str());
        }
        for part in &def.parts {
            let child = self.contract_part(part);
            node.push_child(child);
        }
        node
    }

    fn contract_part(&self, part: &pt::ContractPart) -> AstNode {
        match part {
            pt::ContractPart::FunctionDefinition(def) => self.function(def),
            pt::ContractPart::VariableDefinition(def) => self.state_variable(def),
            pt::ContractPart::StructDefinition(def) => {
                self.named_leaf(NodeKind::StructDefinition, &def.loc, def.name.as_ref())
            }
            pt::ContractPart::EnumDefinition(def) => {
                self.named_leaf(NodeKind::EnumDefinition, &def.loc, def.name.as_ref())
            }
            pt::ContractPart::EventDefinition(def) => self.event(def),
            pt::ContractPart::ErrorDefinition(def) => {
                self.named_leaf(NodeKind::ErrorDefinition, &def.loc, def.name.as_ref())
            }
            pt::ContractPart::Using(using) => {
                AstNode::new(NodeKind::UsingDirective, self.span(&using.loc))
            }
            pt::ContractPart::TypeDefinition(def) => {
                AstNode::new(NodeKind::Other, self.span(&def.loc))
            }
            pt::ContractPart::StraySemicolon(loc) => {
                AstNode::new(NodeKind::Other, self.span(loc))
            }
            _ => AstNode::new(NodeKind::Other, None)
        }
    }

    fn named_leaf(
        &self,
        kind: NodeKind,
        loc: &pt::Loc,
        name: Option<&pt::Identifier>
    ) -> AstNode {
        let mut node = AstNode::new(kind, self.span(loc));
        if let Some(ident) = name {
            node = node.with_text(ident.name.as_str());
        }
        node
    }

    fn event(&self, def: &pt::EventDefinition) -> AstNode {
        let mut node = self.named_leaf(NodeKind::EventDefinition, &def.loc, def.name.as_ref());
        for field in &def.fields {
            let mut param = AstNode::new(NodeKind::EventParameter, self.span(&field.loc));
            if let Some(name) = &field.name {
                param = param.with_text(name.name.as_str());
            }
            if field.indexed {
                param = param.with_attr("indexed", "true");
            }
            node.push_child(param);
        }
        node
    }

    fn function(&self, def: &pt::FunctionDefinition) -> AstNode {
        let (kind, fn_kind) = match def.ty {
            pt::FunctionTy::Constructor => (NodeKind::FunctionDefinition, "constructor"),
            pt::FunctionTy::Function => (NodeKind::FunctionDefinition, "function"),
            pt::FunctionTy::Fallback => (NodeKind::FunctionDefinition, "fallback"),
            pt::FunctionTy::Receive => (NodeKind::FunctionDefinition, "receive"),
            pt::FunctionTy::Modifier => (NodeKind::ModifierDefinition, "modifier")
        };
        let mut node = AstNode::new(kind, self.span(&def.loc)).with_attr("kind", fn_kind);
        if let Some(name) = &def.name {
            node = node.with_text(name.name.as_str());
        }
        for attribute in &def.attributes {
            match attribute {
                pt::FunctionAttribute::Visibility(v) => {
                    node = node.with_attr("visibility", visibility_name(v));
                }
                pt::FunctionAttribute::Mutability(m) => {
                    node = node.with_attr("mutability", mutability_name(m));
                }
                pt::FunctionAttribute::Virtual(_) => {
                    node = node.with_attr("virtual", "true");
                }
                pt::FunctionAttribute::BaseOrModifier(loc, base) => {
                    let name = identifier_path(&base.name);
                    node.push_child(
                        AstNode::new(NodeKind::ModifierInvocation, self.span(loc))
                            .with_text(name)
                    );
                }
                _ => {}
            }
        }
        for (loc, parameter) in &def.params {
            node.push_child(self.parameter(loc, parameter.as_ref()));
        }
        for (loc, parameter) in &def.returns {
            let mut ret = self.parameter(loc, parameter.as_ref());
            ret.attrs.push(("return".into(), "true".into()));
            node.push_child(ret);
        }
        if let Some(body) = &def.body {
            node.push_child(self.statement(body));
        }
        node
    }

    fn parameter(&self, loc: &pt::Loc, parameter: Option<&pt::Parameter>) -> AstNode {
        let mut node = AstNode::new(NodeKind::Parameter, self.span(loc));
        if let Some(parameter) = parameter {
            if let Some(name) = &parameter.name {
                node = node.with_text(name.name.as_str());
            }
            if let Some(storage) = &parameter.storage {
                node = node.with_attr("storage", storage_name(storage));
            }
            node.push_child(self.expression(&parameter.ty));
        }
        node
    }

    fn state_variable(&self, def: &pt::VariableDefinition) -> AstNode {
        let mut node = AstNode::new(NodeKind::StateVariableDeclaration, self.span(&def.loc));
        if let Some(name) = &def.name {
            node = node.with_text(name.name.as_str());
        }
        for attribute in &def.attrs {
            match attribute {
                pt::VariableAttribute::Visibility(v) => {
                    node = node.with_attr("visibility", visibility_name(v));
                }
                pt::VariableAttribute::Constant(_) => {
                    node = node.with_attr("constant", "true");
                }
                pt::VariableAttribute::Immutable(_) => {
                    node = node.with_attr("immutable", "true");
                }
                _ => {}
            }
        }
        node.push_child(self.expression(&def.ty));
        if let Some(initializer) = &def.initializer {
            node.push_child(self.expression(initializer));
        }
        node
    }

    fn statement(&self, stmt: &pt::Statement) -> AstNode {
        match stmt {
            pt::Statement::Block {
                loc,
                unchecked,
                statements,
                ..
            } => {
                let mut node = AstNode::new(NodeKind::Block, self.span(loc));
                if *unchecked {
                    node = node.with_attr("unchecked", "true");
                }
                for statement in statements {
                    node.push_child(self.statement(statement));
                }
                node
            }
            pt::Statement::Assembly {
                loc, ..
            } => AstNode::new(NodeKind::InlineAssembly, self.span(loc)),
            pt::Statement::If(loc, condition, then_branch, else_branch) => {
                let mut children = vec![self.expression(condition), self.statement(then_branch)];
                if let Some(else_branch) = else_branch {
                    children.push(self.statement(else_branch));
                }
                AstNode::new(NodeKind::IfStatement, self.span(loc)).with_children(children)
            }
            pt::Statement::While(loc, condition, body) => {
                AstNode::new(NodeKind::WhileStatement, self.span(loc)).with_children(vec![
                    self.expression(condition),
                    self.statement(body),
                ])
            }
            pt::Statement::DoWhile(loc, body, condition) => {
                AstNode::new(NodeKind::DoWhileStatement, self.span(loc)).with_children(vec![
                    self.statement(body),
                    self.expression(condition),
                ])
            }
            pt::Statement::For(loc, init, condition, update, body) => {
                let mut children = Vec::new();
                init.lower_into(self, &mut children);
                condition.lower_into(self, &mut children);
                update.lower_into(self, &mut children);
                body.lower_into(self, &mut children);
                AstNode::new(NodeKind::ForStatement, self.span(loc)).with_children(children)
            }
            pt::Statement::Expression(loc, expression) => {
                AstNode::new(NodeKind::ExpressionStatement, self.span(loc))
                    .with_children(vec![self.expression(expression)])
            }
            pt::Statement::VariableDefinition(loc, declaration, initializer) => {
                let mut children = vec![self.variable_declaration(declaration)];
                if let Some(initializer) = initializer {
                    children.push(self.expression(initializer));
                }
                AstNode::new(NodeKind::VariableDeclarationStatement, self.span(loc))
                    .with_children(children)
            }
            pt::Statement::Return(loc, value) => {
                let mut node = AstNode::new(NodeKind::ReturnStatement, self.span(loc));
                if let Some(value) = value {
                    node.push_child(self.expression(value));
                }
                node
            }
            pt::Statement::Emit(loc, event) => {
                AstNode::new(NodeKind::EmitStatement, self.span(loc))
                    .with_children(vec![self.expression(event)])
            }
            pt::Statement::Revert(loc, _, args) => {
                let children = args.iter().map(|a| self.expression(a)).collect();
                AstNode::new(NodeKind::RevertStatement, self.span(loc)).with_children(children)
            }
            pt::Statement::RevertNamedArgs(loc, ..) => {
                AstNode::new(NodeKind::RevertStatement, self.span(loc))
            }
            pt::Statement::Try(loc, expression, ..) => {
                AstNode::new(NodeKind::TryStatement, self.span(loc))
                    .with_children(vec![self.expression(expression)])
            }
            pt::Statement::Continue(loc) => {
                AstNode::new(NodeKind::ContinueStatement, self.span(loc))
            }
            pt::Statement::Break(loc) => AstNode::new(NodeKind::BreakStatement, self.span(loc)),
            other => AstNode::new(NodeKind::Other, self.span(&other.loc()))
        }
    }

    fn variable_declaration(&self, declaration: &pt::VariableDeclaration) -> AstNode {
        let mut node = AstNode::new(NodeKind::VariableDeclaration, self.span(&declaration.loc));
        if let Some(name) = &declaration.name {
            node = node.with_text(name.name.as_str());
        }
        if let Some(storage) = &declaration.storage {
            node = node.with_attr("storage", storage_name(storage));
        }
        node.push_child(self.expression(&declaration.ty));
        node
    }

    fn expression(&self, expression: &pt::Expression) -> AstNode {
        use pt::Expression as E;

        match expression {
            E::Variable(ident) => AstNode::new(NodeKind::Identifier, self.span(&ident.loc))
                .with_text(ident.name.as_str()),
            E::MemberAccess(loc, object, member) => {
                AstNode::new(NodeKind::MemberAccess, self.span(loc))
                    .with_text(member.name.as_str())
                    .with_children(vec![self.expression(object)])
            }
            E::FunctionCall(loc, callee, args) => {
                let mut children = vec![self.expression(callee)];
                children.extend(args.iter().map(|a| self.expression(a)));
                AstNode::new(NodeKind::FunctionCall, self.span(loc)).with_children(children)
            }
            E::NamedFunctionCall(loc, callee, args) => {
                let mut children = vec![self.expression(callee)];
                children.extend(args.iter().map(|a| self.expression(&a.expr)));
                AstNode::new(NodeKind::FunctionCall, self.span(loc)).with_children(children)
            }
            E::FunctionCallBlock(loc, callee, block) => {
                AstNode::new(NodeKind::FunctionCall, self.span(loc))
                    .with_attr("call-options", "true")
                    .with_children(vec![self.expression(callee), self.statement(block)])
            }
            E::New(loc, inner) => AstNode::new(NodeKind::NewExpression, self.span(loc))
                .with_children(vec![self.expression(inner)]),
            E::ArraySubscript(loc, array, index) => {
                let mut children = vec![self.expression(array)];
                if let Some(index) = index {
                    children.push(self.expression(index));
                }
                AstNode::new(NodeKind::IndexAccess, self.span(loc)).with_children(children)
            }
            E::Parenthesis(_, inner) => self.expression(inner),
            E::ConditionalOperator(loc, condition, if_true, if_false) => {
                AstNode::new(NodeKind::ConditionalExpression, self.span(loc)).with_children(vec![
                    self.expression(condition),
                    self.expression(if_true),
                    self.expression(if_false),
                ])
            }
            E::Not(loc, inner) => self.unary(loc, "!", true, inner),
            E::BitwiseNot(loc, inner) => self.unary(loc, "~", true, inner),
            E::Negate(loc, inner) => self.unary(loc, "-", true, inner),
            E::UnaryPlus(loc, inner) => self.unary(loc, "+", true, inner),
            E::Delete(loc, inner) => self.unary(loc, "delete", true, inner),
            E::PreIncrement(loc, inner) => self.unary(loc, "++", true, inner),
            E::PostIncrement(loc, inner) => self.unary(loc, "++", false, inner),
            E::PreDecrement(loc, inner) => self.unary(loc, "--", true, inner),
            E::PostDecrement(loc, inner) => self.unary(loc, "--", false, inner),
            E::Power(loc, left, right) => self.binary(loc, "**", left, right),
            E::Multiply(loc, left, right) => self.binary(loc, "*", left, right),
            E::Divide(loc, left, right) => self.binary(loc, "/", left, right),
            E::Modulo(loc, left, right) => self.binary(loc, "%", left, right),
            E::Add(loc, left, right) => self.binary(loc, "+", left, right),
            E::Subtract(loc, left, right) => self.binary(loc, "-", left, right),
            E::ShiftLeft(loc, left, right) => self.binary(loc, "<<", left, right),
            E::ShiftRight(loc, left, right) => self.binary(loc, ">>", left, right),
            E::BitwiseAnd(loc, left, right) => self.binary(loc, "&", left, right),
            E::BitwiseXor(loc, left, right) => self.binary(loc, "^", left, right),
            E::BitwiseOr(loc, left, right) => self.binary(loc, "|", left, right),
            E::Less(loc, left, right) => self.binary(loc, "<", left, right),
            E::More(loc, left, right) => self.binary(loc, ">", left, right),
            E::LessEqual(loc, left, right) => self.binary(loc, "<=", left, right),
            E::MoreEqual(loc, left, right) => self.binary(loc, ">=", left, right),
            E::Equal(loc, left, right) => self.binary(loc, "==", left, right),
            E::NotEqual(loc, left, right) => self.binary(loc, "!=", left, right),
            E::And(loc, left, right) => self.binary(loc, "&&", left, right),
            E::Or(loc, left, right) => self.binary(loc, "||", left, right),
            E::Assign(loc, left, right) => self.assignment(loc, "=", left, right),
            E::AssignAdd(loc, left, right) => self.assignment(loc, "+=", left, right),
            E::AssignSubtract(loc, left, right) => self.assignment(loc, "-=", left, right),
            E::AssignMultiply(loc, left, right) => self.assignment(loc, "*=", left, right),
            E::AssignDivide(loc, left, right) => self.assignment(loc, "/=", left, right),
            E::AssignModulo(loc, left, right) => self.assignment(loc, "%=", left, right),
            E::AssignOr(loc, left, right) => self.assignment(loc, "|=", left, right),
            E::AssignAnd(loc, left, right) => self.assignment(loc, "&=", left, right),
            E::AssignXor(loc, left, right) => self.assignment(loc, "^=", left, right),
            E::AssignShiftLeft(loc, left, right) => self.assignment(loc, "<<=", left, right),
            E::AssignShiftRight(loc, left, right) => self.assignment(loc, ">>=", left, right),
            E::BoolLiteral(loc, value) => AstNode::new(NodeKind::BoolLiteral, self.span(loc))
                .with_text(if *value { "true" } else { "false" }),
            other => self.leaf_expression(other)
        }
    }

    /// Literal, type and list expressions lower to leaves carrying their
    /// source spelling; constructs outside the modeled set become `Other`.
    fn leaf_expression(&self, expression: &pt::Expression) -> AstNode {
        use pt::Expression as E;

        let kind = match expression {
            E::NumberLiteral(..) | E::RationalNumberLiteral(..) | E::HexNumberLiteral(..) => {
                NodeKind::NumberLiteral
            }
            E::StringLiteral(..) => NodeKind::StringLiteral,
            E::HexLiteral(..) => NodeKind::HexLiteral,
            E::AddressLiteral(..) => NodeKind::AddressLiteral,
            E::Type(..) => NodeKind::ElementaryTypeName,
            E::List(..) => NodeKind::TupleExpression,
            E::ArrayLiteral(..) => NodeKind::ArrayLiteral,
            _ => NodeKind::Other
        };
        let loc = expression.loc();
        let mut node = AstNode::new(kind, self.span(&loc));
        if let Some(text) = self.slice(&loc) {
            node = node.with_text(text);
        }
        node
    }

    fn unary(&self, loc: &pt::Loc, operator: &str, prefix: bool, inner: &pt::Expression) -> AstNode {
        let mut node = AstNode::new(NodeKind::UnaryOperation, self.span(loc))
            .with_text(operator)
            .with_children(vec![self.expression(inner)]);
        if prefix {
            node = node.with_attr("prefix", "true");
        }
        node
    }

    fn binary(
        &self,
        loc: &pt::Loc,
        operator: &str,
        left: &pt::Expression,
        right: &pt::Expression
    ) -> AstNode {
        AstNode::new(NodeKind::BinaryOperation, self.span(loc))
            .with_text(operator)
            .with_children(vec![self.expression(left), self.expression(right)])
    }

    fn assignment(
        &self,
        loc: &pt::Loc,
        operator: &str,
        left: &pt::Expression,
        right: &pt::Expression
    ) -> AstNode {
        AstNode::new(NodeKind::Assignment, self.span(loc))
            .with_text(operator)
            .with_children(vec![self.expression(left), self.expression(right)])
    }
}

fn visibility_name(visibility: &pt::Visibility) -> &'static str {
    match visibility {
        pt::Visibility::External(_) => "external",
        pt::Visibility::Public(_) => "public",
        pt::Visibility::Internal(_) => "internal",
        pt::Visibility::Private(_) => "private"
    }
}

fn mutability_name(mutability: &pt::Mutability) -> &'static str {
    match mutability {
        pt::Mutability::Pure(_) => "pure",
        pt::Mutability::View(_) => "view",
        pt::Mutability::Constant(_) => "view",
        pt::Mutability::Payable(_) => "payable"
    }
}

fn storage_name(storage: &pt::StorageLocation) -> &'static str {
    match storage {
        pt::StorageLocation::Memory(_) => "memory",
        pt::StorageLocation::Storage(_) => "storage",
        pt::StorageLocation::Calldata(_) => "calldata"
    }
}

fn identifier_path(path: &pt::IdentifierPath) -> String {
    path.identifiers
        .iter()
        .map(|i| i.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walker::{VisitControl, for_each_node};

    fn parse(source: &str) -> AstNode {
        let outcome = SolidityParser.parse(source, &ParseOptions::default());
        assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
        outcome.ast.expect("ast")
    }

    fn collect_kinds(root: &AstNode) -> Vec<NodeKind> {
        let mut kinds = Vec::new();
        for_each_node(root, |node, _| {
            kinds.push(node.kind);
            VisitControl::Continue
        });
        kinds
    }

    #[test]
    fn test_parse_contract_with_function() {
        let ast = parse(
            "pragma solidity ^0.8.0;\ncontract X { function f() public { require(tx.origin == msg.sender); } }\n"
        );
        let kinds = collect_kinds(&ast);
        assert!(kinds.contains(&NodeKind::ContractDefinition));
        assert!(kinds.contains(&NodeKind::FunctionDefinition));
        assert!(kinds.contains(&NodeKind::MemberAccess));
        assert!(kinds.contains(&NodeKind::FunctionCall));
    }

    #[test]
    fn test_tx_origin_member_access_location() {
        let ast = parse(
            "pragma solidity ^0.8.0;\ncontract X { function f() public { require(tx.origin == msg.sender); } }\n"
        );
        let mut found = None;
        for_each_node(&ast, |node, _| {
            if node.is_member_of("tx", "origin") {
                found = node.span;
            }
            VisitControl::Continue
        });
        let span = found.expect("tx.origin span");
        assert_eq!(span.start.line, 2);
        // `tx` begins at the require argument, column of "tx.origin".
        assert_eq!(span.start.column, 43);
    }

    #[test]
    fn test_parse_failure_reports_diagnostics() {
        let outcome = SolidityParser.parse("this is not solidity at all {", &ParseOptions::default());
        assert!(outcome.failed());
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn test_function_attributes() {
        let ast = parse(
            "contract C { uint256 internal total; function f(uint256 x) external view returns (uint256) { return x; } }\n"
        );
        let contract = ast.child_of_kind(NodeKind::ContractDefinition).unwrap();
        let state = contract.child_of_kind(NodeKind::StateVariableDeclaration).unwrap();
        assert_eq!(state.attr("visibility"), Some("internal"));
        let function = contract.child_of_kind(NodeKind::FunctionDefinition).unwrap();
        assert_eq!(function.attr("visibility"), Some("external"));
        assert_eq!(function.attr("mutability"), Some("view"));
        assert_eq!(function.text_str(), Some("f"));
    }

    #[test]
    fn test_binary_operator_lowering() {
        let ast = parse("contract C { function f(uint256 a) public pure returns (bool) { return a >= 10; } }\n");
        let mut operators = Vec::new();
        for_each_node(&ast, |node, _| {
            if node.kind == NodeKind::BinaryOperation {
                operators.push(node.text_str().unwrap_or_default().to_string());
            }
            VisitControl::Continue
        });
        assert_eq!(operators, vec![">="]);
    }

    #[test]
    fn test_loop_lowering_keeps_bodies() {
        let ast = parse(
            "contract C { function f(uint256[] memory xs) public pure { for (uint256 i = 0; i < xs.length; i++) { } while (false) { } } }\n"
        );
        let kinds = collect_kinds(&ast);
        assert!(kinds.contains(&NodeKind::ForStatement));
        assert!(kinds.contains(&NodeKind::WhileStatement));
        // The for condition (`i < xs.length`) must be reachable in the tree.
        let mut member_in_for = false;
        for_each_node(&ast, |node, _| {
            if node.kind == NodeKind::ForStatement {
                for_each_node(node, |inner, _| {
                    if inner.kind == NodeKind::MemberAccess && inner.text_str() == Some("length") {
                        member_in_for = true;
                    }
                    VisitControl::Continue
                });
            }
            VisitControl::Continue
        });
        assert!(member_in_for);
    }

    #[test]
    fn test_inline_assembly_lowering() {
        let ast = parse("contract C { function f() public pure { assembly { let x := 1 } } }\n");
        assert!(collect_kinds(&ast).contains(&NodeKind::InlineAssembly));
    }
}
