use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index of a class inside the [`ProjectIndex`](super::ProjectIndex)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

/// A method identified by its declaring class and its position in that class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId {
    pub class: ClassId,
    pub index: usize,
}

impl MethodId {
    pub fn new(class: ClassId, index: usize) -> Self {
        Self { class, index }
    }
}

/// Binding-relevant kind of an annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    /// Lifecycle method always invoked by the binder (`@Init`, `@AfterCompose`, ...)
    Init,
    /// Command invokable from the owning ViewModel's template
    Command,
    /// Command broadcast to every ViewModel in the composed page
    GlobalCommand,
    /// Property change notification
    NotifyChange,
    /// Java `@Override`
    Override,
    /// Public method without any recognized annotation
    PlainPublic,
}

impl AnnotationKind {
    pub fn is_command(&self) -> bool {
        matches!(self, AnnotationKind::Command | AnnotationKind::GlobalCommand)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AnnotationKind::Init => "init",
            AnnotationKind::Command => "command",
            AnnotationKind::GlobalCommand => "global command",
            AnnotationKind::NotifyChange => "notify change",
            AnnotationKind::Override => "override",
            AnnotationKind::PlainPublic => "public",
        }
    }
}

/// A recognized annotation on a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBinding {
    pub kind: AnnotationKind,

    /// Annotation name as written, without `@` and package
    pub name: String,

    /// Explicit names given as annotation arguments, e.g. `@Command("submitOrder")`
    pub explicit_names: Vec<String>,
}

impl AnnotationBinding {
    pub fn new(kind: AnnotationKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            explicit_names: Vec::new(),
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.explicit_names = names;
        self
    }
}

/// Who a call is made on, as far as it can be told without type checking
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Receiver {
    /// Unqualified call or `this.foo()`
    This,
    /// `super.foo()`
    Super,
    /// Receiver with a known declared type (simple name, generics stripped)
    Typed(String),
    /// Anything else; ignored during graph construction
    Unknown,
}

/// A direct invocation found in a method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub receiver: Receiver,
    pub name: String,
    /// `None` for method references (`this::foo`), where arity is unknown
    pub arity: Option<usize>,
    pub line: usize,
}

/// A `new T(...)` expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instantiation {
    pub type_name: String,
    pub line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodModel {
    pub name: String,

    /// Declaring class
    pub class: ClassId,

    /// Line of the method name (1-indexed)
    pub line: usize,

    pub arity: usize,
    pub is_public: bool,
    pub is_static: bool,
    pub annotations: Vec<AnnotationBinding>,

    /// Set when a resolved ancestor declares the same slot
    pub is_override: bool,

    pub calls: Vec<CallSite>,
    pub instantiations: Vec<Instantiation>,
}

impl MethodModel {
    pub fn new(name: impl Into<String>, line: usize, arity: usize) -> Self {
        Self {
            name: name.into(),
            class: ClassId(0),
            line,
            arity,
            is_public: false,
            is_static: false,
            annotations: Vec::new(),
            is_override: false,
            calls: Vec::new(),
            instantiations: Vec::new(),
        }
    }

    pub fn has_kind(&self, kind: AnnotationKind) -> bool {
        self.annotations.iter().any(|a| a.kind == kind)
    }

    pub fn is_init(&self) -> bool {
        self.has_kind(AnnotationKind::Init)
    }

    pub fn is_command(&self) -> bool {
        self.has_kind(AnnotationKind::Command)
    }

    pub fn is_global_command(&self) -> bool {
        self.has_kind(AnnotationKind::GlobalCommand)
    }

    pub fn is_any_command(&self) -> bool {
        self.annotations.iter().any(|a| a.kind.is_command())
    }

    /// Carries a Java `@Override` annotation
    pub fn declares_override(&self) -> bool {
        self.has_kind(AnnotationKind::Override)
    }

    /// Names under which a template can invoke this method as a command of the given kind.
    ///
    /// Explicit names replace the method name; an empty explicit name falls back to it.
    pub fn binding_names(&self, kind: AnnotationKind) -> Vec<&str> {
        let mut names = Vec::new();
        for annotation in self.annotations.iter().filter(|a| a.kind == kind) {
            let explicit: Vec<&str> = annotation
                .explicit_names
                .iter()
                .map(String::as_str)
                .filter(|n| !n.is_empty())
                .collect();
            if explicit.is_empty() {
                names.push(self.name.as_str());
            } else {
                names.extend(explicit);
            }
        }
        names.dedup();
        names
    }

    /// Same name and arity
    pub fn same_slot(&self, other: &MethodModel) -> bool {
        self.name == other.name && self.arity == other.arity
    }

    /// Property name if this method looks like a JavaBean accessor
    pub fn accessor_property(&self) -> Option<(String, AccessorKind)> {
        let (rest, kind) = if let Some(rest) = self.name.strip_prefix("get") {
            (rest, AccessorKind::Getter)
        } else if let Some(rest) = self.name.strip_prefix("is") {
            (rest, AccessorKind::Getter)
        } else if let Some(rest) = self.name.strip_prefix("set") {
            (rest, AccessorKind::Setter)
        } else {
            return None;
        };

        let first = rest.chars().next()?;
        if !first.is_uppercase() {
            return None;
        }
        match kind {
            AccessorKind::Getter if self.arity != 0 => return None,
            AccessorKind::Setter if self.arity != 1 => return None,
            _ => {}
        }
        Some((decapitalize(rest), kind))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Getter,
    Setter,
}

/// A getter/setter pair exposed as a bindable property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyModel {
    pub name: String,
    /// Method index of the getter (`getX` or `isX`)
    pub getter: Option<usize>,
    /// Method index of the setter
    pub setter: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassModel {
    pub id: ClassId,

    /// Simple name (e.g. "OrderViewModel")
    pub name: String,

    /// Fully qualified name (e.g. "com.example.OrderViewModel")
    pub qualified_name: String,

    pub package: Option<String>,
    pub path: PathBuf,
    pub line: usize,

    /// Superclass as written, generics stripped
    pub superclass_name: Option<String>,

    /// Superclass resolved inside the project index
    pub superclass: Option<ClassId>,

    pub imports: Vec<String>,
    pub methods: Vec<MethodModel>,
    pub properties: Vec<PropertyModel>,

    /// Calls made from constructors, field initializers and initializer blocks
    pub initializer_calls: Vec<CallSite>,
    pub initializer_instantiations: Vec<Instantiation>,
}

impl ClassModel {
    pub fn new(name: impl Into<String>, package: Option<String>, path: PathBuf, line: usize) -> Self {
        let name = name.into();
        let qualified_name = match &package {
            Some(pkg) => format!("{}.{}", pkg, name),
            None => name.clone(),
        };
        Self {
            id: ClassId(0),
            name,
            qualified_name,
            package,
            path,
            line,
            superclass_name: None,
            superclass: None,
            imports: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            initializer_calls: Vec::new(),
            initializer_instantiations: Vec::new(),
        }
    }

    /// Pair up accessors into properties, in declaration order
    pub fn collect_properties(&mut self) {
        let mut properties: Vec<PropertyModel> = Vec::new();
        for (index, method) in self.methods.iter().enumerate() {
            let Some((name, kind)) = method.accessor_property() else {
                continue;
            };
            let position = match properties.iter().position(|p| p.name == name) {
                Some(pos) => pos,
                None => {
                    properties.push(PropertyModel {
                        name,
                        getter: None,
                        setter: None,
                    });
                    properties.len() - 1
                }
            };
            let property = &mut properties[position];
            match kind {
                AccessorKind::Getter if property.getter.is_none() => property.getter = Some(index),
                AccessorKind::Setter if property.setter.is_none() => property.setter = Some(index),
                _ => {}
            }
        }
        self.properties = properties;
    }

    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> + '_ {
        (0..self.methods.len()).map(move |i| MethodId::new(self.id, i))
    }

    /// Indexes of methods that are accessors of some property
    pub fn accessor_indexes(&self) -> Vec<usize> {
        self.properties
            .iter()
            .flat_map(|p| p.getter.into_iter().chain(p.setter))
            .collect()
    }
}

pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
