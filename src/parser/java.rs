use super::common::{children_of_kind, descendants, first_error, line_of, node_text, Parser};
use crate::config::AnnotationConfig;
use crate::diagnostics::Diagnostic;
use crate::model::{
    AnnotationBinding, AnnotationKind, CallSite, ClassModel, Instantiation, MethodModel, Receiver,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Node, Parser as TsParser};

/// Declared types of names visible in a method body: fields, parameters, locals
type Scope = HashMap<String, String>;

/// Java source extractor using tree-sitter.
///
/// Produces at most one [`ClassModel`] per unit: the first public top-level
/// class, or the first top-level class when none is public.
pub struct JavaParser {
    annotations: AnnotationConfig,
}

impl JavaParser {
    pub fn new(annotations: AnnotationConfig) -> Self {
        Self { annotations }
    }

    fn extract_package(&self, root: Node, source: &str) -> Option<String> {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            if child.kind() == "package_declaration" {
                let mut pkg_cursor = child.walk();
                for pkg_child in child.children(&mut pkg_cursor) {
                    if pkg_child.kind() == "scoped_identifier" || pkg_child.kind() == "identifier" {
                        return Some(node_text(pkg_child, source).to_string());
                    }
                }
            }
        }
        None
    }

    fn extract_imports(&self, root: Node, source: &str) -> Vec<String> {
        let mut imports = Vec::new();

        for child in children_of_kind(root, "import_declaration") {
            let mut import_cursor = child.walk();
            let wildcard = child
                .children(&mut import_cursor)
                .any(|c| c.kind() == "asterisk");

            let mut import_cursor = child.walk();
            for import_child in child.children(&mut import_cursor) {
                if import_child.kind() == "scoped_identifier" || import_child.kind() == "identifier" {
                    let import_text = node_text(import_child, source);
                    if wildcard {
                        imports.push(format!("{}.*", import_text));
                    } else {
                        imports.push(import_text.to_string());
                    }
                    break;
                }
            }
        }

        imports
    }

    /// The first public top-level class, otherwise the first top-level class
    fn select_class<'t>(&self, root: Node<'t>, source: &str) -> Option<Node<'t>> {
        let classes = children_of_kind(root, "class_declaration");
        classes
            .iter()
            .copied()
            .find(|c| modifier_words(*c, source).contains(&"public"))
            .or_else(|| classes.first().copied())
    }

    fn extract_class(
        &self,
        path: &Path,
        node: Node,
        source: &str,
        package: Option<String>,
        imports: Vec<String>,
    ) -> ClassModel {
        let name_node = node.child_by_field_name("name");
        let name = name_node
            .map(|n| node_text(n, source).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());
        let line = line_of(name_node.unwrap_or(node));

        let mut class = ClassModel::new(name, package, path.to_path_buf(), line);
        class.imports = imports;

        if let Some(superclass) = node.child_by_field_name("superclass") {
            // `superclass` spans the `extends` keyword; the type is its named child
            let type_node = superclass.named_child(0).unwrap_or(superclass);
            class.superclass_name = Some(simple_type(node_text(type_node, source)));
        }

        let Some(body) = node.child_by_field_name("body") else {
            return class;
        };

        let fields = self.collect_fields(body, source);

        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_declaration" => {
                    class.methods.push(self.extract_method(member, source, &fields));
                }
                "constructor_declaration" => {
                    let mut scope = fields.clone();
                    if let Some(params) = member.child_by_field_name("parameters") {
                        self.collect_parameters(params, source, &mut scope);
                    }
                    if let Some(ctor_body) = member.child_by_field_name("body") {
                        scan_body(
                            ctor_body,
                            source,
                            &mut scope,
                            &mut class.initializer_calls,
                            &mut class.initializer_instantiations,
                        );
                    }
                }
                "field_declaration" => {
                    let mut cursor = member.walk();
                    for declarator in member.children_by_field_name("declarator", &mut cursor) {
                        if let Some(value) = declarator.child_by_field_name("value") {
                            scan_body(
                                value,
                                source,
                                &mut fields.clone(),
                                &mut class.initializer_calls,
                                &mut class.initializer_instantiations,
                            );
                        }
                    }
                }
                "block" | "static_initializer" => {
                    scan_body(
                        member,
                        source,
                        &mut fields.clone(),
                        &mut class.initializer_calls,
                        &mut class.initializer_instantiations,
                    );
                }
                kind if is_type_declaration(kind) => {
                    self.scan_member_type(member, source, &fields, &mut class);
                }
                _ => {}
            }
        }

        class.collect_properties();
        class
    }

    /// Member types are not modeled on their own; their calls count as calls
    /// made by the enclosing class
    fn scan_member_type(&self, node: Node, source: &str, outer: &Scope, class: &mut ClassModel) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };

        let mut members = Vec::new();
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "enum_body_declarations" {
                let mut inner = child.walk();
                members.extend(child.children(&mut inner));
            } else {
                members.push(child);
            }
        }

        let mut fields = outer.clone();
        for member in &members {
            if matches!(member.kind(), "field_declaration" | "constant_declaration") {
                declare_variables(*member, source, &mut fields);
            }
        }

        for member in members {
            match member.kind() {
                "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                    let mut scope = fields.clone();
                    if let Some(params) = member.child_by_field_name("parameters") {
                        self.collect_parameters(params, source, &mut scope);
                    }
                    if let Some(member_body) = member.child_by_field_name("body") {
                        scan_body(
                            member_body,
                            source,
                            &mut scope,
                            &mut class.initializer_calls,
                            &mut class.initializer_instantiations,
                        );
                    }
                }
                "field_declaration" | "constant_declaration" | "block" | "static_initializer"
                | "enum_constant" => {
                    scan_body(
                        member,
                        source,
                        &mut fields.clone(),
                        &mut class.initializer_calls,
                        &mut class.initializer_instantiations,
                    );
                }
                kind if is_type_declaration(kind) => {
                    self.scan_member_type(member, source, &fields, class);
                }
                _ => {}
            }
        }
    }

    fn collect_fields(&self, body: Node, source: &str) -> Scope {
        let mut fields = Scope::new();
        for field in children_of_kind(body, "field_declaration") {
            declare_variables(field, source, &mut fields);
        }
        fields
    }

    fn collect_parameters(&self, params: Node, source: &str, scope: &mut Scope) -> usize {
        let mut arity = 0;
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            match param.kind() {
                "formal_parameter" => {
                    arity += 1;
                    if let (Some(ty), Some(name)) =
                        (param.child_by_field_name("type"), param.child_by_field_name("name"))
                    {
                        scope.insert(node_text(name, source).to_string(), simple_type(node_text(ty, source)));
                    }
                }
                "spread_parameter" => arity += 1,
                _ => {}
            }
        }
        arity
    }

    fn extract_method(&self, node: Node, source: &str, fields: &Scope) -> MethodModel {
        let name_node = node.child_by_field_name("name");
        let name = name_node
            .map(|n| node_text(n, source).to_string())
            .unwrap_or_else(|| "<anonymous>".to_string());

        let mut scope = fields.clone();
        let arity = node
            .child_by_field_name("parameters")
            .map(|params| self.collect_parameters(params, source, &mut scope))
            .unwrap_or(0);

        let mut method = MethodModel::new(name, line_of(name_node.unwrap_or(node)), arity);

        let words = modifier_words(node, source);
        method.is_public = words.contains(&"public");
        method.is_static = words.contains(&"static");
        method.annotations = self.extract_annotations(node, source);

        let has_binding_kind = method
            .annotations
            .iter()
            .any(|a| a.kind != AnnotationKind::Override);
        if method.is_public && !has_binding_kind {
            method
                .annotations
                .push(AnnotationBinding::new(AnnotationKind::PlainPublic, ""));
        }

        if let Some(body) = node.child_by_field_name("body") {
            scan_body(
                body,
                source,
                &mut scope,
                &mut method.calls,
                &mut method.instantiations,
            );
        }

        method
    }

    /// Recognized annotations only; anything not in the table is ignored
    fn extract_annotations(&self, node: Node, source: &str) -> Vec<AnnotationBinding> {
        let mut annotations = Vec::new();

        for modifiers in children_of_kind(node, "modifiers") {
            let mut cursor = modifiers.walk();
            for annotation in modifiers.children(&mut cursor) {
                if annotation.kind() != "marker_annotation" && annotation.kind() != "annotation" {
                    continue;
                }
                let Some(name_node) = annotation.child_by_field_name("name") else {
                    continue;
                };
                let written = node_text(name_node, source);
                let Some(kind) = self.annotations.kind_of(written) else {
                    continue;
                };

                let simple = written.rsplit('.').next().unwrap_or(written);
                let mut names = Vec::new();
                if let Some(arguments) = annotation.child_by_field_name("arguments") {
                    explicit_names(arguments, source, &mut names);
                }
                annotations.push(AnnotationBinding::new(kind, simple).with_names(names));
            }
        }

        annotations
    }
}

impl Default for JavaParser {
    fn default() -> Self {
        Self::new(AnnotationConfig::default())
    }
}

impl Parser for JavaParser {
    type Output = Option<ClassModel>;

    fn parse(&self, path: &Path, contents: &str) -> Result<Option<ClassModel>, Diagnostic> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .map_err(|e| Diagnostic::parse_error(path, format!("failed to load Java grammar: {}", e)))?;

        let tree = parser
            .parse(contents, None)
            .ok_or_else(|| Diagnostic::parse_error(path, "Java parser produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error(root).map(line_of).unwrap_or(1);
            return Err(Diagnostic::parse_error(
                path,
                format!("syntax error near line {}", line),
            ));
        }

        let Some(class_node) = self.select_class(root, contents) else {
            debug!("No class declared in {}", path.display());
            return Ok(None);
        };

        let package = self.extract_package(root, contents);
        let imports = self.extract_imports(root, contents);
        let class = self.extract_class(path, class_node, contents, package, imports);

        debug!(
            "Parsed {}: class {} with {} methods",
            path.display(),
            class.qualified_name,
            class.methods.len()
        );

        Ok(Some(class))
    }
}

/// Keywords in a declaration's `modifiers` node
fn modifier_words<'a>(node: Node, source: &'a str) -> Vec<&'a str> {
    let mut words = Vec::new();
    for modifiers in children_of_kind(node, "modifiers") {
        let mut cursor = modifiers.walk();
        for modifier in modifiers.children(&mut cursor) {
            if modifier.kind() != "marker_annotation" && modifier.kind() != "annotation" {
                words.push(node_text(modifier, source));
            }
        }
    }
    words
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration" | "enum_declaration" | "interface_declaration" | "record_declaration"
    )
}

/// Strip generics, array brackets and whitespace: `List<Foo>[]` -> `List`
fn simple_type(text: &str) -> String {
    let base = text.split('<').next().unwrap_or(text);
    base.trim_end_matches("[]")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Record `Type name = ...` declarators of a field or local variable declaration
fn declare_variables(declaration: Node, source: &str, scope: &mut Scope) {
    let Some(ty) = declaration.child_by_field_name("type") else {
        return;
    };
    let type_name = simple_type(node_text(ty, source));
    if type_name == "var" {
        return;
    }
    let mut cursor = declaration.walk();
    for declarator in declaration.children_by_field_name("declarator", &mut cursor) {
        if let Some(name) = declarator.child_by_field_name("name") {
            scope.insert(node_text(name, source).to_string(), type_name.clone());
        }
    }
}

/// `"x"`, `{"a", "b"}` and `value = "x"` forms of annotation arguments
fn explicit_names(node: Node, source: &str, names: &mut Vec<String>) {
    match node.kind() {
        "string_literal" => {
            let text = node_text(node, source);
            names.push(text.trim_matches('"').to_string());
        }
        "element_value_pair" => {
            let is_value = node
                .child_by_field_name("key")
                .map(|k| node_text(k, source) == "value")
                .unwrap_or(false);
            if is_value {
                if let Some(value) = node.child_by_field_name("value") {
                    explicit_names(value, source, names);
                }
            }
        }
        "annotation_argument_list" | "element_value_array_initializer" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                explicit_names(child, source, names);
            }
        }
        _ => {}
    }
}

fn classify_receiver(object: Option<Node>, source: &str, scope: &Scope) -> Receiver {
    let Some(object) = object else {
        return Receiver::This;
    };
    match object.kind() {
        "this" => Receiver::This,
        "super" => Receiver::Super,
        "identifier" => receiver_from_name(node_text(object, source), scope),
        "field_access" => {
            let target = object.child_by_field_name("object").map(|o| o.kind());
            let field = object
                .child_by_field_name("field")
                .map(|f| node_text(f, source));
            match (target, field) {
                (Some("this"), Some(field)) => scope
                    .get(field)
                    .map(|ty| Receiver::Typed(ty.clone()))
                    .unwrap_or(Receiver::Unknown),
                _ => Receiver::Unknown,
            }
        }
        _ => Receiver::Unknown,
    }
}

fn receiver_from_name(name: &str, scope: &Scope) -> Receiver {
    match name {
        "this" => Receiver::This,
        "super" => Receiver::Super,
        _ => {
            if let Some(ty) = scope.get(name) {
                Receiver::Typed(ty.clone())
            } else if name.chars().next().is_some_and(char::is_uppercase) {
                Receiver::Typed(simple_type(name))
            } else {
                Receiver::Unknown
            }
        }
    }
}

/// Collect call sites and instantiations below `node`.
///
/// Local declarations are added to `scope` as they are met, so a receiver is
/// typed by the nearest preceding declaration of its name.
fn scan_body(
    node: Node,
    source: &str,
    scope: &mut Scope,
    calls: &mut Vec<CallSite>,
    instantiations: &mut Vec<Instantiation>,
) {
    for current in descendants(node) {
        match current.kind() {
            "local_variable_declaration" => declare_variables(current, source, scope),
            "method_invocation" => {
                let Some(name) = current.child_by_field_name("name") else {
                    continue;
                };
                let arity = current.child_by_field_name("arguments").map(|args| {
                    let mut cursor = args.walk();
                    let count = args
                        .named_children(&mut cursor)
                        .filter(|a| !a.kind().ends_with("comment"))
                        .count();
                    count
                });
                calls.push(CallSite {
                    receiver: classify_receiver(current.child_by_field_name("object"), source, scope),
                    name: node_text(name, source).to_string(),
                    arity,
                    line: line_of(name),
                });
            }
            "method_reference" => {
                let text = node_text(current, source);
                let Some((target, name)) = text.rsplit_once("::") else {
                    continue;
                };
                let (target, name) = (target.trim(), name.trim());
                if name == "new" {
                    instantiations.push(Instantiation {
                        type_name: simple_type(target),
                        line: line_of(current),
                    });
                    continue;
                }
                calls.push(CallSite {
                    receiver: receiver_from_name(target, scope),
                    name: name.to_string(),
                    arity: None,
                    line: line_of(current),
                });
            }
            "object_creation_expression" => {
                if let Some(ty) = current.child_by_field_name("type") {
                    instantiations.push(Instantiation {
                        type_name: simple_type(node_text(ty, source)),
                        line: line_of(current),
                    });
                }
            }
            _ => {}
        }
    }
}
