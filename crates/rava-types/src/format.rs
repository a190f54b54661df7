//! Java-like, stable type and signature rendering.
//!
//! Intended for diagnostics: output uses qualified binary names and does not
//! depend on imports or formatting preferences, so messages stay stable
//! across runs.

use crate::{ClassType, MethodDef, Type, TypeEnv, WildcardBound};

pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    match ty {
        Type::Primitive(p) => p.name().to_string(),
        Type::Void => "void".to_string(),
        Type::Class(ClassType { def, args }) => {
            let name = env
                .class_name(*def)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<class#{}>", def.index()));
            if args.is_empty() {
                name
            } else {
                let args = args
                    .iter()
                    .map(|a| format_type(env, a))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{name}<{args}>")
            }
        }
        Type::Array(elem) => format!("{}[]", format_type(env, elem)),
        Type::TypeVar(id) => env
            .type_param(*id)
            .map(|tp| tp.name.clone())
            .unwrap_or_else(|| format!("T#{}", id.0)),
        Type::Wildcard(WildcardBound::Unbounded) => "?".to_string(),
        Type::Wildcard(WildcardBound::Extends(upper)) => {
            format!("? extends {}", format_type(env, upper))
        }
        Type::Wildcard(WildcardBound::Super(lower)) => {
            format!("? super {}", format_type(env, lower))
        }
        Type::Intersection(parts) => parts
            .iter()
            .map(|p| format_type(env, p))
            .collect::<Vec<_>>()
            .join(" & "),
        Type::Named(name) => name.clone(),
        Type::Unknown => "<unknown>".to_string(),
        Type::Error => "<error>".to_string(),
    }
}

pub fn format_type_list(env: &dyn TypeEnv, types: &[Type]) -> String {
    types
        .iter()
        .map(|t| format_type(env, t))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `name(param, param)`, the shape used in "cannot resolve" and ambiguity
/// messages.
pub fn format_call(env: &dyn TypeEnv, name: &str, args: &[Type]) -> String {
    format!("{}({})", name, format_type_list(env, args))
}

/// `returnType name(params)` with the declaring class appended, e.g.
/// `java.lang.Number m(java.lang.String) in com.example.A`.
pub fn format_method(env: &dyn TypeEnv, declaring: Option<&str>, method: &MethodDef) -> String {
    let mut out = format!(
        "{} {}({})",
        format_type(env, &method.return_type),
        method.name,
        format_type_list(env, &method.params)
    );
    if let Some(declaring) = declaring {
        out.push_str(" in ");
        out.push_str(declaring);
    }
    out
}
