//! Trait capability and the ordered catalog of traits.

use std::collections::{BTreeSet, HashMap};

use crate::environment::Environment;
use crate::error::TraitError;
use crate::traits;

/// A composable transformation contributing to the desired workload.
pub trait Trait: Send + Sync {
    /// Unique identifier within a catalog.
    fn id(&self) -> &'static str;

    /// Position among traits with no dependency relation. Lower runs first.
    fn order(&self) -> u32;

    /// Traits that must run before this one.
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    fn applies_to(&self, env: &Environment<'_>) -> bool;

    /// Amends `env`. Output must depend on the environment inputs only.
    fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError>;
}

/// Immutable, ordered set of traits.
///
/// Built once and shared by every pass.
pub struct TraitCatalog {
    traits: Vec<Box<dyn Trait>>,
}

impl TraitCatalog {
    /// Catalog with the built-in traits.
    pub fn new() -> Self {
        Self {
            traits: traits::builtin(),
        }
    }

    /// Orders `traits` by their dependencies, then by order number and id.
    pub fn with_traits(traits: Vec<Box<dyn Trait>>) -> Result<Self, TraitError> {
        Ok(Self {
            traits: sort_traits(traits)?,
        })
    }

    /// Trait identifiers in execution order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.traits.iter().map(|t| t.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&dyn Trait> {
        self.traits.iter().find(|t| t.id() == id).map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Runs every applicable trait on `env` in catalog order.
    ///
    /// The first failure aborts the pass.
    pub fn apply(&self, env: &mut Environment<'_>) -> Result<(), TraitError> {
        for t in &self.traits {
            if !t.applies_to(env) {
                continue;
            }

            tracing::debug!(
                integration = %env.integration.name(),
                trait_id = t.id(),
                "Applying trait"
            );

            t.apply(env).map_err(|source| TraitError::Apply {
                id: t.id().to_string(),
                source: Box::new(source),
            })?;
            env.executed_traits.push(t.id().to_string());
        }
        Ok(())
    }
}

impl Default for TraitCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_traits(traits: Vec<Box<dyn Trait>>) -> Result<Vec<Box<dyn Trait>>, TraitError> {
    let mut index: HashMap<&'static str, usize> = HashMap::new();
    for (i, t) in traits.iter().enumerate() {
        if index.insert(t.id(), i).is_some() {
            return Err(TraitError::DuplicateTrait(t.id().to_string()));
        }
    }

    let mut pending: Vec<usize> = vec![0; traits.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); traits.len()];
    for (i, t) in traits.iter().enumerate() {
        for dependency in t.depends_on() {
            let &d = index
                .get(dependency)
                .ok_or_else(|| TraitError::UnknownDependency {
                    id: t.id().to_string(),
                    dependency: dependency.to_string(),
                })?;
            pending[i] += 1;
            dependents[d].push(i);
        }
    }

    let mut ready: BTreeSet<(u32, &'static str, usize)> = traits
        .iter()
        .enumerate()
        .filter(|(i, _)| pending[*i] == 0)
        .map(|(i, t)| (t.order(), t.id(), i))
        .collect();

    let mut sorted = Vec::with_capacity(traits.len());
    while let Some(next) = ready.pop_first() {
        let (_, _, i) = next;
        sorted.push(i);
        for &dependent in &dependents[i] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                let t = &traits[dependent];
                ready.insert((t.order(), t.id(), dependent));
            }
        }
    }

    if sorted.len() != traits.len() {
        let mut ids: Vec<String> = traits
            .iter()
            .enumerate()
            .filter(|(i, _)| pending[*i] > 0)
            .map(|(_, t)| t.id().to_string())
            .collect();
        ids.sort();
        return Err(TraitError::Cycle { ids });
    }

    let mut slots: Vec<Option<Box<dyn Trait>>> = traits.into_iter().map(Some).collect();
    Ok(sorted
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect())
}
