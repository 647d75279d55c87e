//! State threading for stateful command actions.
//!
//! A command action in a chain receives the path of chain nodes above it
//! and the state accumulated by its ancestors, and may return a replacement
//! state for its descendants. The work function either declares the two
//! trailing parameters itself:
//!
//! ```text
//! fn refine(depth: u8, node_path: Vec<ChainNode<Widget>>, state: Vec<Widget>) -> Vec<Widget>
//! ```
//!
//! or declares neither, and they are synthesized from the return type
//! (`Vec<T>` gives `T`, no return value gives `()`). The synthesized
//! signature is then checked by the same explicit-shape rules, exactly once.
//!
//! # Examples
//!
//! ```
//! use cmdbind_core::{CompilerOptions, FunctionDecl, ParameterDecl, thread_state};
//!
//! let decl = FunctionDecl::new("build")
//!     .with_parameter(ParameterDecl::new("size", "u32"))
//!     .returning("Vec<Widget>");
//! let threaded = thread_state(&decl, &CompilerOptions::default()).unwrap();
//!
//! assert_eq!(threaded.thread.element_type, "Widget");
//! assert!(threaded.thread.synthesized);
//! assert_eq!(threaded.parameters[1].type_text, "Vec<ChainNode<Widget>>");
//! assert_eq!(threaded.parameters[2].type_text, "Vec<Widget>");
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostic::{BindingError, Diagnostic};
use crate::options::CompilerOptions;
use crate::type_text::{sequence_element, sequence_of};
use crate::types::{
    FunctionDecl, NODE_PATH_PARAMETER, ParameterDecl, STATE_PARAMETER, StateThread, UNIT_TYPE,
};

/// A parameter list guaranteed to end in `node_path`, `state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadedSignature {
    pub parameters: Vec<ParameterDecl>,
    pub thread: StateThread,
}

/// Resolves the chain element type, synthesizing the wiring parameters when
/// the work function declares neither of them.
pub fn thread_state(
    decl: &FunctionDecl,
    options: &CompilerOptions,
) -> Result<ThreadedSignature, Vec<Diagnostic>> {
    let parameters = &decl.parameters;

    if let Some((state, preceding)) = trailing_state(parameters) {
        let element_type = check_explicit(state, preceding, &decl.return_type, options)?;
        return Ok(ThreadedSignature {
            parameters: parameters.clone(),
            thread: StateThread {
                element_type,
                synthesized: false,
            },
        });
    }

    if decl.parameter(STATE_PARAMETER).is_some() {
        return Err(vec![Diagnostic::parameter(
            STATE_PARAMETER,
            BindingError::StateNotLast,
        )]);
    }
    if decl.parameter(NODE_PATH_PARAMETER).is_some() {
        return Err(vec![Diagnostic::function(
            BindingError::NodePathWithoutState,
        )]);
    }

    let element_type = implicit_element_type(&decl.return_type)?;
    let thread = StateThread {
        element_type,
        synthesized: true,
    };
    let node_path = ParameterDecl::new(
        NODE_PATH_PARAMETER,
        &thread.node_path_type(&options.chain_node_type),
    );
    let state = ParameterDecl::new(STATE_PARAMETER, &thread.state_type());
    debug!(
        function = %decl.name,
        element_type = %thread.element_type,
        "synthesized chain wiring parameters"
    );

    // The synthesized pair always has the explicit shape; re-checking it
    // covers the return-type rule.
    let element_type = check_explicit(&state, Some(&node_path), &decl.return_type, options)?;

    let mut augmented = parameters.clone();
    augmented.push(node_path);
    augmented.push(state);
    Ok(ThreadedSignature {
        parameters: augmented,
        thread: StateThread {
            element_type,
            synthesized: true,
        },
    })
}

fn trailing_state(parameters: &[ParameterDecl]) -> Option<(&ParameterDecl, Option<&ParameterDecl>)> {
    let (last, rest) = parameters.split_last()?;
    (last.name == STATE_PARAMETER).then(|| (last, rest.last()))
}

/// Checks the explicit `node_path`, `state` shape and returns `T`.
fn check_explicit(
    state: &ParameterDecl,
    preceding: Option<&ParameterDecl>,
    return_type: &str,
    options: &CompilerOptions,
) -> Result<String, Vec<Diagnostic>> {
    let Some(element_type) = sequence_element(&state.type_text) else {
        return Err(vec![Diagnostic::parameter(
            STATE_PARAMETER,
            BindingError::StateNotSequence {
                found: state.type_text.clone(),
            },
        )]);
    };

    let thread = StateThread {
        element_type: element_type.to_string(),
        synthesized: false,
    };
    let mut diagnostics = Vec::new();

    let expected_node_path = thread.node_path_type(&options.chain_node_type);
    let node_path_ok = preceding.is_some_and(|p| {
        p.name == NODE_PATH_PARAMETER && p.type_text == expected_node_path
    });
    if !node_path_ok {
        diagnostics.push(Diagnostic::function(BindingError::MissingNodePath {
            expected: expected_node_path,
        }));
    }

    let expected_return = sequence_of(element_type);
    if !return_type.is_empty() && return_type != expected_return {
        diagnostics.push(Diagnostic::function(BindingError::StateReturnMismatch {
            expected: expected_return,
        }));
    }

    if diagnostics.is_empty() {
        Ok(thread.element_type)
    } else {
        Err(diagnostics)
    }
}

fn implicit_element_type(return_type: &str) -> Result<String, Vec<Diagnostic>> {
    if return_type.is_empty() {
        return Ok(UNIT_TYPE.to_string());
    }
    sequence_element(return_type)
        .map(String::from)
        .ok_or_else(|| {
            vec![Diagnostic::function(BindingError::ReturnTypeNotSequence {
                found: return_type.to_string(),
            })]
        })
}
