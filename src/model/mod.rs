mod declaration;
mod index;
mod template;

pub use declaration::{
    capitalize, decapitalize, AccessorKind, AnnotationBinding, AnnotationKind, CallSite, ClassId,
    ClassModel, Instantiation, MethodId, MethodModel, PropertyModel, Receiver,
};
pub use index::{ProjectIndex, TypeResolution};
pub use template::{
    IncludeDirective, IncludeTarget, ReferenceKind, Resolution, ScopeRef, TemplateBindingReference,
    TemplateUnit, ViewModelBinding,
};
