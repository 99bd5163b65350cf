/// In-memory storyline catalog indexed by gameplay action.
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use uuid::Uuid;

use crate::schema::storyline::{ActionType, Storyline};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    by_action: FxHashMap<ActionType, Vec<Storyline>>,
    ids: FxHashSet<Uuid>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog; storylines whose id is already present are dropped.
    pub fn from_storylines<I>(storylines: I) -> Self
    where
        I: IntoIterator<Item = Storyline>,
    {
        let mut catalog = Self::new();
        for storyline in storylines {
            catalog.insert(storyline);
        }
        catalog
    }

    /// Returns false, leaving the catalog unchanged, if the id is taken.
    pub fn insert(&mut self, storyline: Storyline) -> bool {
        if !self.ids.insert(storyline.id()) {
            tracing::warn!(
                id = %storyline.id(),
                title = storyline.title(),
                "duplicate storyline id ignored"
            );
            return false;
        }
        self.by_action
            .entry(storyline.action_type())
            .or_default()
            .push(storyline);
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn for_action(&self, action: ActionType) -> &[Storyline] {
        self.by_action.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, id: Uuid) -> Option<&Storyline> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.iter().find(|storyline| storyline.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Storyline> {
        self.by_action.values().flatten()
    }

    /// Pick a storyline for an action uniformly at random.
    pub fn pick<R: Rng + ?Sized>(&self, action: ActionType, rng: &mut R) -> Option<&Storyline> {
        self.for_action(action).choose(rng)
    }
}
