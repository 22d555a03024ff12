use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::model::condition::ReferenceSet;
use crate::model::entity::MovieId;
use crate::model::group::ActorTable;

/// Supplies the actor table and the movie universe the optimizer draws from.
pub trait DataAccess {
    fn actor_table(&self) -> &ActorTable;

    fn movie_universe(&self) -> BTreeSet<MovieId> {
        self.actor_table().universe()
    }
}

impl DataAccess for ActorTable {
    fn actor_table(&self) -> &ActorTable {
        self
    }
}

/// Supplies the reference statistics the sub-scores aim at.
pub trait ReferenceProvider {
    fn reference_set(&self) -> Result<ReferenceSet, ConfigError>;
}

impl ReferenceProvider for ReferenceSet {
    fn reference_set(&self) -> Result<ReferenceSet, ConfigError> {
        Ok(self.clone())
    }
}

/// References read from a YAML file on every request.
#[derive(Debug, Clone)]
pub struct YamlReferences {
    pub path: PathBuf,
}

impl ReferenceProvider for YamlReferences {
    fn reference_set(&self) -> Result<ReferenceSet, ConfigError> {
        ReferenceSet::load_from_path(&self.path)
    }
}
