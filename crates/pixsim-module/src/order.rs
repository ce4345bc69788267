//! Execution order from declared message dependencies.
//!
//! Every publication of a kind within a scope creates an edge to every
//! module subscribed to that kind in an overlapping scope. Modules are
//! ordered topologically (Kahn's algorithm); ties go to the module that
//! was registered first, so independent modules keep their configured
//! order.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

use indexmap::IndexSet;
use pixsim_core::ModuleId;
use pixsim_messenger::{DetectorScope, Messenger, Requirement};

/// Failure to order the pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrderError {
    /// Required dependencies form a cycle.
    CyclicDependency {
        /// Modules that could not be ordered.
        modules: Vec<ModuleId>,
    },
    /// A declaration names a module outside `0..module_count`.
    UnknownModule {
        /// The unknown module.
        module: ModuleId,
    },
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CyclicDependency { modules } => {
                write!(f, "cyclic dependency between modules")?;
                for (i, m) in modules.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{m}")?;
                }
                Ok(())
            }
            Self::UnknownModule { module } => write!(f, "unknown module {module}"),
        }
    }
}

impl Error for OrderError {}

fn scopes_overlap(a: &DetectorScope, b: &DetectorScope) -> bool {
    match (a, b) {
        (DetectorScope::Any, _) | (_, DetectorScope::Any) => true,
        (DetectorScope::Detector(x), DetectorScope::Detector(y)) => x == y,
    }
}

/// Compute the order in which `module_count` modules run, from the
/// declarations registered on `messenger`.
///
/// Modules are identified by `ModuleId(0..module_count)`. If optional
/// subscriptions close a cycle, they are dropped from the ordering with a
/// warning; a cycle among required subscriptions is an error.
pub fn execution_order(
    module_count: usize,
    messenger: &Messenger,
) -> Result<Vec<ModuleId>, OrderError> {
    let check = |module: ModuleId| {
        if (module.0 as usize) < module_count {
            Ok(module.0 as usize)
        } else {
            Err(OrderError::UnknownModule { module })
        }
    };

    let mut required = IndexSet::new();
    let mut optional = IndexSet::new();
    for sub in messenger.subscriptions() {
        let consumer = check(sub.module)?;
        let producers = messenger
            .publications()
            .iter()
            .filter(|p| p.kind == sub.kind && scopes_overlap(&p.scope, &sub.scope));

        let mut any = false;
        for publication in producers {
            let producer = check(publication.module)?;
            any = true;
            if producer == consumer {
                continue;
            }
            match sub.requirement {
                Requirement::Required => required.insert((producer, consumer)),
                Requirement::Optional => optional.insert((producer, consumer)),
            };
        }
        if !any && sub.requirement == Requirement::Required {
            log::warn!(
                "Module {} requires {} for {} but no module publishes it",
                sub.module,
                sub.kind,
                sub.scope
            );
        }
    }

    let all: Vec<(usize, usize)> = required.iter().chain(optional.iter()).copied().collect();
    match kahn(module_count, &all) {
        Ok(order) => Ok(order),
        Err(_) => {
            let required: Vec<(usize, usize)> = required.into_iter().collect();
            let order = kahn(module_count, &required)
                .map_err(|modules| OrderError::CyclicDependency { modules })?;
            log::warn!("Optional dependencies form a cycle; ordering by required dependencies only");
            Ok(order)
        }
    }
}

/// Topological sort with lowest-index tie breaking. On a cycle, returns
/// the modules left unordered.
fn kahn(module_count: usize, edges: &[(usize, usize)]) -> Result<Vec<ModuleId>, Vec<ModuleId>> {
    let mut in_degree = vec![0usize; module_count];
    let mut successors = vec![Vec::new(); module_count];
    for &(from, to) in edges {
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BTreeSet<usize> = (0..module_count).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(module_count);
    while let Some(next) = ready.pop_first() {
        order.push(ModuleId(next as u32));
        for &succ in &successors[next] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    if order.len() == module_count {
        Ok(order)
    } else {
        Err((0..module_count)
            .filter(|&i| in_degree[i] > 0)
            .map(|i| ModuleId(i as u32))
            .collect())
    }
}
