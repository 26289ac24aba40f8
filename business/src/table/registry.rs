//! Owns every live table of a host, keyed by table id.

use std::collections::HashMap;

use log::{debug, info};
use serde_json::{Value, json};
use ustr::Ustr;

use crate::{
    filtering::BulkEditChange,
    table::{
        EntityCatalog, QueryOutcome, RelationScope, RowIdentity, TableController, TableEnv,
        TableError, TableOptions, table_id,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum Opened {
    /// A new controller was created and queried once.
    Created(Option<QueryOutcome>),
    /// The id was already live; nothing was queried.
    Existing,
}

pub struct TableRegistry {
    catalog: EntityCatalog,
    env: TableEnv,
    tables: HashMap<Ustr, TableController>,
    generations: HashMap<Ustr, u64>,
}

impl TableRegistry {
    pub fn new(catalog: EntityCatalog, env: TableEnv) -> Self {
        Self {
            catalog,
            env,
            tables: HashMap::new(),
            generations: HashMap::new(),
        }
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn env(&self) -> &TableEnv {
        &self.env
    }

    /// Opens `entity_type`, or returns the live table with the same id.
    pub async fn open(
        &mut self,
        entity_type: &str,
        options: TableOptions,
    ) -> Result<(Ustr, Opened), TableError> {
        let config = self
            .catalog
            .get(entity_type)
            .ok_or_else(|| TableError::UnknownEntity(entity_type.to_owned()))?;
        let id = table_id(entity_type, options.instance_id.as_deref());
        if self.tables.contains_key(&id) {
            debug!("Table {id} is already open");
            return Ok((id, Opened::Existing));
        }

        let generation = *self
            .generations
            .entry(id)
            .and_modify(|generation| *generation += 1)
            .or_insert(0);
        let controller =
            TableController::new(config, options, self.env.clone())?.with_generation(generation);
        let table = self.tables.entry(id).or_insert(controller);
        let outcome = table.initialize().await?;

        info!("Opened table {id}");
        Ok((id, Opened::Created(outcome)))
    }

    /// Rows of `entity_type` linked to `parent` through `from`.
    pub async fn open_relation_table(
        &mut self,
        entity_type: &str,
        parent: RowIdentity,
        parent_table: Ustr,
        from: &str,
        to: &str,
    ) -> Result<(Ustr, Opened), TableError> {
        let options = TableOptions::new()
            .instance(parent.id.to_string())
            .constraint(from, json!([parent.name]))
            .relation(RelationScope {
                parent_table,
                parent,
                from: from.to_owned(),
                to: to.to_owned(),
            });
        self.open(entity_type, options).await
    }

    /// Changelog entries that reference `table_type` objects.
    pub async fn open_changelog(&mut self, table_type: &str) -> Result<(Ustr, Opened), TableError> {
        let options = TableOptions::new()
            .instance(table_type)
            .constraint(format!("{table_type}_filter"), json!("empty"))
            .constraint(format!("{table_type}_invert"), Value::Bool(true));
        self.open("changelog", options).await
    }

    pub fn get(&self, id: &str) -> Option<&TableController> {
        self.tables.get(&Ustr::from(id))
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TableController> {
        self.tables.get_mut(&Ustr::from(id))
    }

    fn live(&mut self, id: &str) -> Result<&mut TableController, TableError> {
        let key = Ustr::from(id);
        self.tables.get_mut(&key).ok_or(TableError::NotOpen(key))
    }

    fn parent_of(&self, id: &str) -> Option<Ustr> {
        self.get(id)
            .and_then(TableController::relation)
            .map(|relation| relation.parent_table)
    }

    async fn refresh_parent(&mut self, id: &str) -> Result<(), TableError> {
        let Some(parent) = self.parent_of(id) else {
            return Ok(());
        };
        match self.tables.get_mut(&parent) {
            Some(table) => {
                table.refresh(false).await?;
            }
            None => debug!("Parent table {parent} of {id} is not open"),
        }
        Ok(())
    }

    /// Refreshes a table and, when asked, the table it was opened from.
    pub async fn refresh(
        &mut self,
        id: &str,
        update_parent: bool,
    ) -> Result<QueryOutcome, TableError> {
        let outcome = self.live(id)?.refresh(false).await?;
        if update_parent {
            self.refresh_parent(id).await?;
        }
        Ok(outcome)
    }

    pub async fn bulk_deletion(&mut self, id: &str) -> Result<u64, TableError> {
        let count = self.live(id)?.bulk_deletion().await?;
        self.refresh_parent(id).await?;
        Ok(count)
    }

    pub async fn bulk_removal(&mut self, id: &str) -> Result<u64, TableError> {
        let count = self.live(id)?.bulk_removal().await?;
        self.refresh_parent(id).await?;
        Ok(count)
    }

    pub async fn bulk_edit(
        &mut self,
        id: &str,
        changes: &[BulkEditChange],
    ) -> Result<u64, TableError> {
        self.live(id)?.bulk_edit(changes).await
    }

    /// Disposes and forgets a table. `false` when it was not open.
    pub fn dispose(&mut self, id: &str) -> bool {
        match self.tables.remove(&Ustr::from(id)) {
            Some(mut table) => {
                table.dispose();
                true
            }
            None => false,
        }
    }

    pub fn dispose_all(&mut self) {
        for (_, mut table) in self.tables.drain() {
            table.dispose();
        }
    }

    pub fn ids(&self) -> Vec<Ustr> {
        let mut ids: Vec<_> = self.tables.keys().copied().collect();
        ids.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
