//! Call-site classification after overload resolution (JLS 15.12.2): the
//! resolver hands us its candidate set with applicability verdicts already
//! made, and this module decides which diagnostic, if any, the call site
//! deserves. Ambiguity, inapplicable arguments and unresolved names are
//! mutually exclusive outcomes.

use tracing::trace;

use rava_types::{is_assignable, MethodId, Span, Substitutor, Type, TypeEnv};

use crate::bounds::{self, InstantiationContext, TypeArguments, TypeParamOwner};
use crate::diagnostics::{ArgumentMismatch, DiagnosticKind, DiagnosticSink};
use crate::LanguageLevel;

/// One resolver candidate with its verdicts. `substitutor` carries the
/// receiver-type and explicit-type-argument bindings for the declaration.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub method: MethodId,
    pub substitutor: Substitutor,
    pub accessible: bool,
    pub applicable: bool,
    /// Whether the explicit or inferred type arguments satisfied the
    /// method's own bounds.
    pub type_args_applicable: bool,
    pub type_arguments: TypeArguments,
}

/// A call expression being classified.
#[derive(Clone, Debug)]
pub struct CallSite {
    pub name: String,
    pub args: Vec<Type>,
    pub span: Option<Span>,
    /// Constructor invocations never report ambiguity; javac resolves those
    /// through diamond inference instead.
    pub constructor: bool,
}

/// Emit at most one diagnostic describing why the call does not resolve
/// cleanly. A single applicable, accessible candidate is a clean call.
pub fn classify_call(
    env: &dyn TypeEnv,
    level: LanguageLevel,
    call: &CallSite,
    candidates: &[Candidate],
    sink: &mut DiagnosticSink,
) {
    trace!(name = %call.name, candidates = candidates.len(), "classifying call");

    let viable: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.accessible && c.applicable)
        .collect();
    match viable.as_slice() {
        [_] => return,
        [first, second, ..] => {
            if !call.constructor {
                sink.error(
                    DiagnosticKind::AmbiguousMethodCall {
                        first: first.method,
                        second: second.method,
                    },
                    call.span,
                );
            }
            return;
        }
        [] => {}
    }

    // Nothing applicable. Explain the best inapplicable candidate, falling
    // back to an unresolved-name report when even accessibility fails.
    let Some(candidate) = candidates.iter().find(|c| c.accessible) else {
        sink.error(
            DiagnosticKind::UnresolvedMethod {
                name: call.name.clone(),
                argument_types: call.args.clone(),
            },
            call.span,
        );
        return;
    };

    let Some(method) = env.method(candidate.method) else {
        return;
    };

    if !candidate.type_args_applicable {
        // The argument list is fine; the type arguments are the story.
        bounds::check_type_arguments(
            env,
            level,
            &TypeParamOwner::method(method),
            &candidate.type_arguments,
            &InstantiationContext::default(),
            call.span,
            sink,
        );
        return;
    }

    let expected = expected_params(env, method, &candidate.substitutor, call.args.len());
    let mismatch = argument_mismatch(env, &expected, &call.args);
    sink.error(
        DiagnosticKind::InapplicableArguments {
            method: candidate.method,
            mismatch,
        },
        call.span,
    );
}

/// The parameter types a call of `arg_count` arguments is checked against,
/// with the candidate's substitutor applied and varargs expanded to arity.
fn expected_params(
    env: &dyn TypeEnv,
    method: &rava_types::MethodDef,
    substitutor: &Substitutor,
    arg_count: usize,
) -> Vec<Type> {
    let mut expected: Vec<Type> = method
        .params
        .iter()
        .map(|p| substitutor.apply(env, p))
        .collect();
    if method.is_varargs {
        if let Some(Type::Array(component)) = expected.last().cloned() {
            expected.pop();
            let fixed = expected.len();
            for _ in fixed..arg_count.max(fixed) {
                expected.push((*component).clone());
            }
        }
    }
    expected
}

fn argument_mismatch(env: &dyn TypeEnv, expected: &[Type], actual: &[Type]) -> ArgumentMismatch {
    if expected.len() == actual.len() {
        let incompatible: Vec<usize> = expected
            .iter()
            .zip(actual.iter())
            .enumerate()
            .filter(|(_, (want, got))| !got.is_errorish() && !is_assignable(env, got, want))
            .map(|(index, _)| index)
            .collect();
        if let [index] = incompatible.as_slice() {
            return ArgumentMismatch::Single {
                index: *index,
                expected: expected[*index].clone(),
                actual: actual[*index].clone(),
            };
        }
    }
    ArgumentMismatch::General {
        expected: expected.to_vec(),
        actual: actual.to_vec(),
    }
}
