//! Structural extraction over the oxc AST.
//!
//! One depth-first traversal collects functions, classes, imports and exports
//! and feeds the [`ComplexityTracker`] at the same time.

use super::metrics::ComplexityTracker;
use super::parser::{LineIndex, SyntaxTree};
use docsmith_shared::{
    Accessor, ClassDescriptor, ExportBinding, FunctionSignature, ImportBinding, MethodKind,
    MethodSignature,
};
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_span::{GetSpan, Span};
use oxc_syntax::operator::LogicalOperator;
use oxc_syntax::scope::ScopeFlags;
use std::collections::BTreeSet;

/// Everything the traversal produced
#[derive(Debug, Default)]
pub struct ExtractedStructure {
    pub functions: Vec<FunctionSignature>,
    pub classes: Vec<ClassDescriptor>,
    pub imports: Vec<ImportBinding>,
    pub exports: Vec<ExportBinding>,
    pub cyclomatic_complexity: usize,
    pub nesting_depth_max: usize,
}

/// Name a function-like node receives from where it is bound
#[derive(Debug, Clone)]
enum Binding {
    Named(String),
    Method {
        name: String,
        accessor: Option<Accessor>,
        is_static: bool,
    },
}

/// A binding waiting for the function, arrow or class whose span is `target`
#[derive(Debug)]
struct PendingBinding {
    target: Span,
    binding: Binding,
}

pub struct StructureExtractor<'s> {
    source: &'s str,
    index: LineIndex,
    /// Offset of the chunk being visited within `source`
    base: usize,
    pending: Option<PendingBinding>,
    /// Indices into `classes` of the classes currently being visited
    class_stack: Vec<usize>,
    /// `require` call already recorded as a destructured import
    claimed_require: Option<Span>,
    tracker: ComplexityTracker,
    functions: Vec<FunctionSignature>,
    classes: Vec<ClassDescriptor>,
    imports: Vec<ImportBinding>,
    exports: Vec<ExportBinding>,
}

impl<'s> StructureExtractor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            index: LineIndex::new(source),
            base: 0,
            pending: None,
            class_stack: Vec::new(),
            claimed_require: None,
            tracker: ComplexityTracker::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Walk every chunk of `tree` and return the collected structure
    pub fn extract(mut self, tree: &SyntaxTree<'_>) -> ExtractedStructure {
        for chunk in &tree.chunks {
            self.base = chunk.offset;
            self.pending = None;
            self.visit_program(&chunk.program);
        }

        ExtractedStructure {
            cyclomatic_complexity: self.tracker.file_complexity(),
            nesting_depth_max: self.tracker.max_depth(),
            functions: self.functions,
            classes: self.classes,
            imports: self.imports,
            exports: self.exports,
        }
    }

    fn line(&self, offset: u32) -> usize {
        self.index.line(self.base + offset as usize)
    }

    fn lines(&self, span: Span) -> (usize, usize) {
        (self.line(span.start), self.line(span.end.saturating_sub(1).max(span.start)))
    }

    /// Source text of a span with whitespace runs collapsed
    fn snippet(&self, span: Span) -> String {
        let start = (self.base + span.start as usize).min(self.source.len());
        let end = (self.base + span.end as usize).clamp(start, self.source.len());
        self.source
            .get(start..end)
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn set_pending(&mut self, target: &Expression<'_>, binding: Binding) {
        self.pending = Some(PendingBinding {
            target: target.span(),
            binding,
        });
    }

    /// Take the pending binding if it belongs to the node at `span`
    fn take_binding(&mut self, span: Span) -> Option<Binding> {
        match self.pending.take() {
            Some(pending) if pending.target == span => Some(pending.binding),
            other => {
                self.pending = other;
                None
            }
        }
    }

    fn parameters(&self, params: &FormalParameters<'_>) -> Vec<String> {
        let mut names: Vec<String> = params
            .items
            .iter()
            .map(|param| self.pattern_label(&param.pattern))
            .collect();

        if let Some(rest) = &params.rest {
            let text = self.snippet(rest.span());
            let argument = text.trim_start_matches("...");
            let label = if argument.starts_with(is_identifier_char) {
                argument
                    .split(|c: char| !is_identifier_char(c))
                    .next()
                    .unwrap_or(argument)
            } else {
                argument
            };
            names.push(format!("...{label}"));
        }

        names
    }

    fn pattern_label(&self, pattern: &BindingPattern<'_>) -> String {
        match pattern {
            BindingPattern::BindingIdentifier(id) => id.name.to_string(),
            BindingPattern::AssignmentPattern(assignment) => self.pattern_label(&assignment.left),
            BindingPattern::ObjectPattern(_) | BindingPattern::ArrayPattern(_) => {
                self.snippet(pattern.span())
            }
        }
    }

    fn push_export(&mut self, name: impl Into<String>, is_default: bool, span: Span) {
        let line = self.line(span.start);
        self.exports.push(ExportBinding {
            name: name.into(),
            is_default,
            line,
        });
    }

    fn push_import(&mut self, imported_names: BTreeSet<String>, source: &str, span: Span) {
        let line = self.line(span.start);
        self.imports.push(ImportBinding {
            imported_names,
            source: source.to_string(),
            line,
        });
    }

    /// Record a function or arrow, visiting its body through `walk_body`
    fn record_function(
        &mut self,
        span: Span,
        own_name: Option<String>,
        params: &FormalParameters<'_>,
        is_async: bool,
        is_generator: bool,
        walk_body: impl FnOnce(&mut Self),
    ) {
        let binding = self.take_binding(span);
        let parameters = self.parameters(params);
        let (start_line, end_line) = self.lines(span);

        let enclosing_class = self.class_stack.last().copied();
        if let (Some(Binding::Method { name, accessor, is_static }), Some(class)) =
            (&binding, enclosing_class)
        {
            let slot = self.classes[class].methods.len();
            self.classes[class].methods.push(MethodSignature {
                kind: MethodKind::classify(name, *accessor, *is_static),
                name: name.clone(),
                parameters,
                is_async,
                start_line,
                end_line,
                complexity: 1,
            });

            self.tracker.enter_function();
            walk_body(self);
            let complexity = self.tracker.exit_function();
            self.classes[class].methods[slot].complexity = complexity;
            return;
        }

        let name = own_name.or(match binding {
            Some(Binding::Named(name)) | Some(Binding::Method { name, .. }) => Some(name),
            None => None,
        });
        let slot = self.functions.len();
        self.functions.push(FunctionSignature {
            name,
            parameters,
            is_async,
            is_generator,
            start_line,
            end_line,
            complexity: 1,
        });

        self.tracker.enter_function();
        walk_body(self);
        let complexity = self.tracker.exit_function();
        self.functions[slot].complexity = complexity;
    }

    /// `module.exports = …`, `module.exports.x = …` and `exports.x = …`
    fn record_commonjs_export(&mut self, target: &AssignmentTarget<'_>, value: &Expression<'_>, span: Span) {
        let AssignmentTarget::StaticMemberExpression(member) = target else {
            return;
        };

        if is_module_exports(member) {
            match value {
                Expression::ObjectExpression(object) => {
                    for property in &object.properties {
                        if let ObjectPropertyKind::ObjectProperty(property) = property
                            && let Some(name) = property_key_name(&property.key)
                        {
                            self.push_export(name, true, property.span);
                        }
                    }
                }
                Expression::Identifier(id) => self.push_export(id.name.as_str(), true, span),
                Expression::FunctionExpression(function) => {
                    let name = function.id.as_ref().map_or("default", |id| id.name.as_str());
                    self.push_export(name, true, span);
                }
                Expression::ClassExpression(class) => {
                    let name = class.id.as_ref().map_or("default", |id| id.name.as_str());
                    self.push_export(name, true, span);
                }
                _ => self.push_export("default", true, span),
            }
            return;
        }

        let exports_object = match &member.object {
            Expression::Identifier(id) => id.name.as_str() == "exports",
            Expression::StaticMemberExpression(inner) => is_module_exports(inner),
            _ => false,
        };
        if exports_object {
            self.push_export(member.property.name.as_str(), false, span);
        }
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Strip wrappers that do not change which node a binding names
fn unwrap_expression<'b, 'a>(expression: &'b Expression<'a>) -> &'b Expression<'a> {
    match expression {
        Expression::ParenthesizedExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSAsExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSSatisfiesExpression(inner) => unwrap_expression(&inner.expression),
        Expression::TSNonNullExpression(inner) => unwrap_expression(&inner.expression),
        other => other,
    }
}

fn is_function_like(expression: &Expression<'_>) -> bool {
    matches!(
        expression,
        Expression::FunctionExpression(_)
            | Expression::ArrowFunctionExpression(_)
            | Expression::ClassExpression(_)
    )
}

fn is_module_exports(member: &StaticMemberExpression<'_>) -> bool {
    member.property.name.as_str() == "exports"
        && matches!(&member.object, Expression::Identifier(id) if id.name.as_str() == "module")
}

fn property_key_name(key: &PropertyKey<'_>) -> Option<String> {
    match key {
        PropertyKey::PrivateIdentifier(id) => Some(format!("#{}", id.name)),
        other => other.static_name().map(|name| name.to_string()),
    }
}

fn module_export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(literal) => literal.value.to_string(),
    }
}

/// Module specifier of a `require('m')` call
fn require_source(call: &CallExpression<'_>) -> Option<String> {
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    if callee.name.as_str() != "require" || call.arguments.len() != 1 {
        return None;
    }
    match &call.arguments[0] {
        Argument::StringLiteral(literal) => Some(literal.value.to_string()),
        _ => None,
    }
}

fn collect_binding_names(pattern: &BindingPattern<'_>, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(object) => {
            for property in &object.properties {
                collect_binding_names(&property.value, names);
            }
            if let Some(rest) = &object.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                collect_binding_names(element, names);
            }
            if let Some(rest) = &array.rest {
                collect_binding_names(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assignment) => {
            collect_binding_names(&assignment.left, names)
        }
    }
}

impl<'a, 's> Visit<'a> for StructureExtractor<'s> {
    // Functions and classes

    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        // Overload signatures and `declare function` have no body
        if func.body.is_none() {
            self.take_binding(func.span);
            walk::walk_function(self, func, flags);
            return;
        }

        self.record_function(
            func.span,
            func.id.as_ref().map(|id| id.name.to_string()),
            &func.params,
            func.r#async,
            func.generator,
            |this| walk::walk_function(this, func, flags),
        );
    }

    fn visit_arrow_function_expression(&mut self, arrow: &ArrowFunctionExpression<'a>) {
        self.record_function(
            arrow.span,
            None,
            &arrow.params,
            arrow.r#async,
            false,
            |this| walk::walk_arrow_function_expression(this, arrow),
        );
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        let bound = match self.take_binding(class.span) {
            Some(Binding::Named(name)) | Some(Binding::Method { name, .. }) => Some(name),
            None => None,
        };
        let (start_line, end_line) = self.lines(class.span);

        self.classes.push(ClassDescriptor {
            name: class.id.as_ref().map(|id| id.name.to_string()).or(bound),
            methods: Vec::new(),
            start_line,
            end_line,
        });
        self.class_stack.push(self.classes.len() - 1);
        walk::walk_class(self, class);
        self.class_stack.pop();
    }

    fn visit_method_definition(&mut self, method: &MethodDefinition<'a>) {
        let name = property_key_name(&method.key)
            .unwrap_or_else(|| format!("[{}]", self.snippet(method.key.span())));
        let accessor = match method.kind {
            MethodDefinitionKind::Get => Some(Accessor::Get),
            MethodDefinitionKind::Set => Some(Accessor::Set),
            MethodDefinitionKind::Constructor | MethodDefinitionKind::Method => None,
        };

        // The key is visited first so a computed key cannot claim the binding
        self.visit_property_key(&method.key);
        self.pending = Some(PendingBinding {
            target: method.value.span,
            binding: Binding::Method {
                name,
                accessor,
                is_static: method.r#static,
            },
        });
        self.visit_function(&method.value, ScopeFlags::Function);
    }

    fn visit_property_definition(&mut self, property: &PropertyDefinition<'a>) {
        self.visit_property_key(&property.key);

        if let Some(value) = &property.value {
            let target = unwrap_expression(value);
            if is_function_like(target) {
                let name = property_key_name(&property.key)
                    .unwrap_or_else(|| format!("[{}]", self.snippet(property.key.span())));
                self.set_pending(
                    target,
                    Binding::Method {
                        name,
                        accessor: None,
                        is_static: property.r#static,
                    },
                );
            }
            self.visit_expression(value);
        }
    }

    // Binding sites

    fn visit_variable_declarator(&mut self, declarator: &VariableDeclarator<'a>) {
        self.visit_binding_pattern(&declarator.id);

        let Some(init) = &declarator.init else {
            return;
        };
        let target = unwrap_expression(init);

        if let BindingPattern::BindingIdentifier(id) = &declarator.id
            && is_function_like(target)
        {
            self.set_pending(target, Binding::Named(id.name.to_string()));
        }

        // const { a, b: c } = require('m')
        if let BindingPattern::ObjectPattern(pattern) = &declarator.id
            && let Expression::CallExpression(call) = target
            && let Some(source) = require_source(call)
        {
            let names = pattern
                .properties
                .iter()
                .filter_map(|property| property_key_name(&property.key))
                .collect();
            self.push_import(names, &source, call.span);
            self.claimed_require = Some(call.span);
        }

        self.visit_expression(init);
    }

    fn visit_assignment_expression(&mut self, assignment: &AssignmentExpression<'a>) {
        let value = unwrap_expression(&assignment.right);
        self.record_commonjs_export(&assignment.left, value, assignment.span);
        self.visit_assignment_target(&assignment.left);

        if is_function_like(value) {
            let name = match &assignment.left {
                AssignmentTarget::AssignmentTargetIdentifier(id) => Some(id.name.to_string()),
                AssignmentTarget::StaticMemberExpression(member) if !is_module_exports(member) => {
                    Some(member.property.name.to_string())
                }
                _ => None,
            };
            if let Some(name) = name {
                self.set_pending(value, Binding::Named(name));
            }
        }

        self.visit_expression(&assignment.right);
    }

    fn visit_object_property(&mut self, property: &ObjectProperty<'a>) {
        self.visit_property_key(&property.key);

        let target = unwrap_expression(&property.value);
        if is_function_like(target)
            && let Some(name) = property_key_name(&property.key)
        {
            self.set_pending(target, Binding::Named(name));
        }

        self.visit_expression(&property.value);
    }

    // Imports

    fn visit_import_declaration(&mut self, declaration: &ImportDeclaration<'a>) {
        let names = declaration
            .specifiers
            .iter()
            .flatten()
            .filter_map(|specifier| match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(specifier) => {
                    let name = module_export_name(&specifier.imported);
                    (name != "default").then_some(name)
                }
                ImportDeclarationSpecifier::ImportDefaultSpecifier(_)
                | ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => None,
            })
            .collect();

        self.push_import(names, declaration.source.value.as_str(), declaration.span);
        walk::walk_import_declaration(self, declaration);
    }

    fn visit_import_expression(&mut self, expression: &ImportExpression<'a>) {
        if let Expression::StringLiteral(literal) = &expression.source {
            self.push_import(BTreeSet::new(), literal.value.as_str(), expression.span);
        }
        walk::walk_import_expression(self, expression);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.claimed_require != Some(call.span)
            && let Some(source) = require_source(call)
        {
            self.push_import(BTreeSet::new(), &source, call.span);
        }
        walk::walk_call_expression(self, call);
    }

    // Exports

    fn visit_export_named_declaration(&mut self, declaration: &ExportNamedDeclaration<'a>) {
        let span = declaration.span;

        if let Some(inner) = &declaration.declaration {
            let mut names = Vec::new();
            match inner {
                Declaration::VariableDeclaration(variables) => {
                    for declarator in &variables.declarations {
                        collect_binding_names(&declarator.id, &mut names);
                    }
                }
                Declaration::FunctionDeclaration(function) => {
                    names.extend(function.id.as_ref().map(|id| id.name.to_string()));
                }
                Declaration::ClassDeclaration(class) => {
                    names.extend(class.id.as_ref().map(|id| id.name.to_string()));
                }
                Declaration::TSTypeAliasDeclaration(alias) => names.push(alias.id.name.to_string()),
                Declaration::TSInterfaceDeclaration(interface) => {
                    names.push(interface.id.name.to_string())
                }
                Declaration::TSEnumDeclaration(enumeration) => {
                    names.push(enumeration.id.name.to_string())
                }
                _ => {}
            }
            for name in names {
                self.push_export(name, false, span);
            }
        }

        for specifier in &declaration.specifiers {
            let name = module_export_name(&specifier.exported);
            let is_default = name == "default";
            self.push_export(name, is_default, span);
        }

        walk::walk_export_named_declaration(self, declaration);
    }

    fn visit_export_default_declaration(&mut self, declaration: &ExportDefaultDeclaration<'a>) {
        let span = declaration.span;

        match &declaration.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(function) => {
                let name = function.id.as_ref().map_or("default", |id| id.name.as_str());
                self.push_export(name, true, span);
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                let name = class.id.as_ref().map_or("default", |id| id.name.as_str());
                self.push_export(name, true, span);
            }
            ExportDefaultDeclarationKind::TSInterfaceDeclaration(interface) => {
                self.push_export(interface.id.name.as_str(), true, span);
            }
            other => match other.as_expression().map(unwrap_expression) {
                Some(Expression::Identifier(id)) => self.push_export(id.name.as_str(), true, span),
                Some(Expression::ObjectExpression(object)) => {
                    for property in &object.properties {
                        if let ObjectPropertyKind::ObjectProperty(property) = property
                            && let Some(name) = property_key_name(&property.key)
                        {
                            self.push_export(name, true, property.span);
                        }
                    }
                }
                Some(Expression::FunctionExpression(function)) => {
                    let name = function.id.as_ref().map_or("default", |id| id.name.as_str());
                    self.push_export(name, true, span);
                }
                Some(Expression::ClassExpression(class)) => {
                    let name = class.id.as_ref().map_or("default", |id| id.name.as_str());
                    self.push_export(name, true, span);
                }
                _ => self.push_export("default", true, span),
            },
        }

        walk::walk_export_default_declaration(self, declaration);
    }

    fn visit_export_all_declaration(&mut self, declaration: &ExportAllDeclaration<'a>) {
        let name = declaration
            .exported
            .as_ref()
            .map_or_else(|| "*".to_string(), module_export_name);
        self.push_export(name, false, declaration.span);
        walk::walk_export_all_declaration(self, declaration);
    }

    // Control flow

    fn visit_if_statement(&mut self, statement: &IfStatement<'a>) {
        let mut current = statement;
        loop {
            self.tracker.decision();
            self.visit_expression(&current.test);

            self.tracker.enter_block();
            self.visit_statement(&current.consequent);
            self.tracker.exit_block();

            match &current.alternate {
                Some(Statement::IfStatement(next)) => current = &**next,
                Some(alternate) => {
                    self.tracker.enter_block();
                    self.visit_statement(alternate);
                    self.tracker.exit_block();
                    break;
                }
                None => break,
            }
        }
    }

    fn visit_for_statement(&mut self, statement: &ForStatement<'a>) {
        self.tracker.decision();
        self.tracker.enter_block();
        walk::walk_for_statement(self, statement);
        self.tracker.exit_block();
    }

    fn visit_for_in_statement(&mut self, statement: &ForInStatement<'a>) {
        self.tracker.decision();
        self.tracker.enter_block();
        walk::walk_for_in_statement(self, statement);
        self.tracker.exit_block();
    }

    fn visit_for_of_statement(&mut self, statement: &ForOfStatement<'a>) {
        self.tracker.decision();
        self.tracker.enter_block();
        walk::walk_for_of_statement(self, statement);
        self.tracker.exit_block();
    }

    fn visit_while_statement(&mut self, statement: &WhileStatement<'a>) {
        self.tracker.decision();
        self.tracker.enter_block();
        walk::walk_while_statement(self, statement);
        self.tracker.exit_block();
    }

    fn visit_do_while_statement(&mut self, statement: &DoWhileStatement<'a>) {
        self.tracker.decision();
        self.tracker.enter_block();
        walk::walk_do_while_statement(self, statement);
        self.tracker.exit_block();
    }

    fn visit_switch_statement(&mut self, statement: &SwitchStatement<'a>) {
        self.tracker.enter_block();
        walk::walk_switch_statement(self, statement);
        self.tracker.exit_block();
    }

    fn visit_switch_case(&mut self, case: &SwitchCase<'a>) {
        if case.test.is_some() {
            self.tracker.decision();
        }
        walk::walk_switch_case(self, case);
    }

    fn visit_try_statement(&mut self, statement: &TryStatement<'a>) {
        // catch and finally are siblings of the try block
        self.tracker.enter_block();
        self.visit_block_statement(&statement.block);
        self.tracker.exit_block();

        if let Some(handler) = &statement.handler {
            self.visit_catch_clause(handler);
        }
        if let Some(finalizer) = &statement.finalizer {
            self.tracker.enter_block();
            self.visit_block_statement(finalizer);
            self.tracker.exit_block();
        }
    }

    fn visit_catch_clause(&mut self, clause: &CatchClause<'a>) {
        self.tracker.decision();
        self.tracker.enter_block();
        walk::walk_catch_clause(self, clause);
        self.tracker.exit_block();
    }

    fn visit_logical_expression(&mut self, expression: &LogicalExpression<'a>) {
        if matches!(expression.operator, LogicalOperator::And | LogicalOperator::Or) {
            self.tracker.decision();
        }
        walk::walk_logical_expression(self, expression);
    }

    fn visit_conditional_expression(&mut self, expression: &ConditionalExpression<'a>) {
        self.tracker.decision();
        walk::walk_conditional_expression(self, expression);
    }
}
