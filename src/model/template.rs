use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a template reference names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    Command,
    GlobalCommand,
    Property,
}

impl ReferenceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceKind::Command => "command",
            ReferenceKind::GlobalCommand => "global command",
            ReferenceKind::Property => "property",
        }
    }
}

/// How precisely the referenced name is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// A single literal name
    Literal,
    /// One alternative of a finite set of literals
    EnumeratedSet,
    /// Computed at runtime; the name is the raw expression
    Opaque,
}

impl Resolution {
    pub fn is_static(&self) -> bool {
        !matches!(self, Resolution::Opaque)
    }
}

/// Which ViewModel a reference is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeRef {
    /// Index into [`TemplateUnit::bindings`]
    Local(usize),
    /// Resolved through the templates that include this one
    Inherited,
}

/// `viewModel="@id('vm') @init('com.example.FooViewModel')"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModelBinding {
    pub alias: String,
    pub class_name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBindingReference {
    pub path: PathBuf,
    pub line: usize,
    pub name: String,
    pub kind: ReferenceKind,
    pub resolution: Resolution,
    pub scope: ScopeRef,
    /// Alias used for property access; `None` for commands
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncludeTarget {
    /// Literal `src`, as written
    Static(String),
    /// Computed `src`; holds the raw expression
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeDirective {
    pub line: usize,
    pub target: IncludeTarget,
    /// Bindings in scope at the include site, outermost first
    pub visible: Vec<usize>,
}

/// Everything the scanner learned from one template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateUnit {
    pub path: PathBuf,
    pub bindings: Vec<ViewModelBinding>,
    pub references: Vec<TemplateBindingReference>,
    pub includes: Vec<IncludeDirective>,
}

impl TemplateUnit {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    pub fn has_local_viewmodel(&self) -> bool {
        !self.bindings.is_empty()
    }
}
