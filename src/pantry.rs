use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum PantryError {
    #[error("pantry items need both a name and a quantity")]
    Empty,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PantryItem {
    pub id: String,
    pub name: String,
    pub quantity: String,
}

/// Ingredients already on hand, persisted as a plain JSON array.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Pantry {
    items: Vec<PantryItem>,
}

fn clean(name: &str, quantity: &str) -> Result<(String, String), PantryError> {
    let (name, quantity) = (name.trim(), quantity.trim());
    if name.is_empty() || quantity.is_empty() {
        return Err(PantryError::Empty);
    }
    Ok((name.to_string(), quantity.to_string()))
}

impl Pantry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PantryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PantryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Adds an item under a fresh id and returns the id.
    pub fn add(&mut self, name: &str, quantity: &str) -> Result<String, PantryError> {
        let (name, quantity) = clean(name, quantity)?;
        let id = Uuid::new_v4().to_string();
        debug!(%id, %name, %quantity, "pantry item added");
        self.items.push(PantryItem { id: id.clone(), name, quantity });
        Ok(id)
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Replaces name and quantity of an existing item. Returns false for an unknown id.
    pub fn edit(&mut self, id: &str, name: &str, quantity: &str) -> Result<bool, PantryError> {
        let (name, quantity) = clean(name, quantity)?;
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.name = name;
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
