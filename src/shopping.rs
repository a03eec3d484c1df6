//! Shopping list aggregation, pantry reconciliation and export.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use tracing::debug;

use crate::pantry::PantryItem;
use crate::quantity::{self, BaseQuantity};
use crate::recipe::Ingredient;

/// Ingredient name (lower-cased) to the quantity strings collected for it.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct ShoppingList {
    entries: BTreeMap<String, Vec<String>>,
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ShoppingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups ingredients by name, keeping every quantity string as written.
    pub fn from_ingredients<'a, I>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = &'a Ingredient>,
    {
        let mut list = Self::new();
        for ingredient in ingredients {
            list.add_item(&ingredient.name, &ingredient.quantity);
        }
        list
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entries
    }

    pub fn quantities(&self, name: &str) -> Option<&[String]> {
        self.entries.get(&normalize_name(name)).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a quantity to `name`, creating the entry. Blank names are ignored.
    pub fn add_item(&mut self, name: &str, quantity: &str) {
        let name = normalize_name(name);
        if name.is_empty() {
            return;
        }
        let entry = self.entries.entry(name).or_default();
        let quantity = quantity.trim();
        if !quantity.is_empty() {
            entry.push(quantity.to_string());
        }
    }

    pub fn remove_item(&mut self, name: &str) -> bool {
        self.entries.remove(&normalize_name(name)).is_some()
    }

    /// Replaces the entry `old_name` with `new_name` and the comma-separated
    /// quantities in `quantities`. Returns false when `old_name` is absent.
    pub fn edit_item(&mut self, old_name: &str, new_name: &str, quantities: &str) -> bool {
        let old_name = normalize_name(old_name);
        let new_name = normalize_name(new_name);
        if new_name.is_empty() || self.entries.remove(&old_name).is_none() {
            return false;
        }
        self.entries.insert(new_name, split_quantities(quantities));
        true
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// One `name (quantity, quantity)` line per entry.
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|(name, quantities)| {
                if quantities.is_empty() {
                    name.clone()
                } else {
                    format!("{} ({})", name, quantities.join(", "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Writes `name,quantity` rows with a header.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["name", "quantity"])?;
        for (name, quantities) in &self.entries {
            writer.write_record([name.as_str(), quantities.join(", ").as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Splits hand-entered text such as `"1,5 dl, 2 can"` into quantities.
/// A comma between two digits is a decimal separator, not a break.
fn split_quantities(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut parts = Vec::new();
    let mut current = String::new();
    for (idx, &c) in chars.iter().enumerate() {
        let decimal = c == ','
            && idx > 0
            && chars[idx - 1].is_ascii_digit()
            && chars.get(idx + 1).is_some_and(char::is_ascii_digit);
        if c == ',' && !decimal {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Sums quantity strings in the unit family of the first parsable one.
/// Other families and unparsable strings are ignored.
fn total<'a, I: IntoIterator<Item = &'a str>>(quantities: I) -> Option<BaseQuantity> {
    let mut total: Option<BaseQuantity> = None;
    for base in quantities.into_iter().filter_map(quantity::parse_base) {
        match total.as_mut() {
            None => total = Some(base),
            Some(sum) if sum.unit == base.unit => sum.value += base.value,
            Some(_) => {}
        }
    }
    total
}

/// Totals the required list and subtracts what the pantry already holds.
///
/// Pantry stock is subtracted only when it is in the same unit family. An
/// ingredient whose remainder rounds to zero or less is dropped, as is one with
/// no parsable quantity. Names are grouped case-insensitively.
pub fn reconcile(required: &ShoppingList, pantry: &[PantryItem], exclude_pantry: bool) -> ShoppingList {
    let mut stock: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    if exclude_pantry {
        for item in pantry {
            stock
                .entry(normalize_name(&item.name))
                .or_default()
                .push(item.quantity.as_str());
        }
    }

    // stored lists may carry keys in any case
    let mut grouped: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (name, quantities) in &required.entries {
        let name = normalize_name(name);
        if name.is_empty() {
            continue;
        }
        grouped
            .entry(name)
            .or_default()
            .extend(quantities.iter().map(String::as_str));
    }

    let mut residual = ShoppingList::new();
    for (name, quantities) in grouped {
        let Some(mut needed) = total(quantities.iter().copied()) else {
            debug!(%name, "no parsable quantity, dropping");
            continue;
        };
        if let Some(on_hand) = stock.get(&name).and_then(|q| total(q.iter().copied())) {
            if on_hand.unit == needed.unit {
                needed.value -= on_hand.value;
            }
        }
        // anything that would print as zero is covered
        if quantity::round2(needed.value) <= 0.0 {
            debug!(%name, "covered by pantry");
            continue;
        }
        let formatted = quantity::format(needed.value, needed.unit);
        residual.entries.insert(name, vec![formatted]);
    }
    residual
}
