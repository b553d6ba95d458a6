//! BOM Document
//!
//! A project's BOM snapshot with the edit operations the persistence layer
//! performs: seed when empty, full replace, single-item upsert, remove.
//! Every operation works on the snapshot it is given; serializing concurrent
//! edits to the same project is the caller's job.

use uuid::Uuid;

use crate::bom::BomLineItem;
use crate::provenance::{source_after_edit, PriceSource};
use crate::resolver::TemplateResolver;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BomDocument {
    items: Vec<BomLineItem>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl BomDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<BomLineItem>) -> Self {
        let mut doc = Self::new();
        doc.replace(items);
        doc
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Rows in display order. Equal sort orders keep insertion order.
    pub fn items(&self) -> Vec<BomLineItem> {
        let mut items = self.items.clone();
        items.sort_by_key(|item| item.sort_order);
        items
    }

    pub fn get(&self, id: &str) -> Option<&BomLineItem> {
        self.items.iter().find(|item| item.id.as_deref() == Some(id))
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id.as_deref() == Some(id))
    }

    /// Positive and not used by any row other than `skip`
    fn order_free(&self, sort_order: i64, skip: Option<usize>) -> bool {
        sort_order > 0
            && !self
                .items
                .iter()
                .enumerate()
                .any(|(i, row)| Some(i) != skip && row.sort_order == sort_order)
    }

    fn max_sort_order(&self) -> i64 {
        self.items.iter().map(|item| item.sort_order).max().unwrap_or(0)
    }

    /// Seed from the template on first use. Returns true when rows were added.
    pub fn ensure_seeded(&mut self, resolver: &TemplateResolver<'_>, category: &str, subtype: Option<&str>) -> bool {
        if !self.is_empty() {
            return false;
        }
        self.replace(resolver.resolve(category, subtype));
        tracing::debug!(category, rows = self.len(), "seeded BOM from template");
        true
    }

    /// Full replace. Rows without an id get one.
    pub fn replace(&mut self, items: Vec<BomLineItem>) {
        self.items = items
            .into_iter()
            .map(|mut item| {
                if item.id.is_none() {
                    item.id = Some(new_id());
                }
                item
            })
            .collect();
    }

    /// Insert or update a single row, returning its id.
    ///
    /// A known id updates that row in place and re-derives its provenance;
    /// it keeps its old sort order unless the new one is positive and free.
    /// Anything else is a new user row: it keeps a supplied id (or gets a
    /// fresh one) and goes after the current last row unless it carries a
    /// positive sort order nobody else uses.
    pub fn upsert(&mut self, mut item: BomLineItem) -> String {
        if let Some(id) = item.id.clone() {
            if let Some(index) = self.position(&id) {
                if !self.order_free(item.sort_order, Some(index)) {
                    item.sort_order = self.items[index].sort_order;
                }
                let existing = &mut self.items[index];
                item.price_source = source_after_edit(existing, &item);
                *existing = item;
                return id;
            }
        }

        let id = item.id.clone().unwrap_or_else(new_id);
        if !self.order_free(item.sort_order, None) {
            item.sort_order = self.max_sort_order().saturating_add(1);
        }
        item.id = Some(id.clone());
        item.price_source = PriceSource::UserAdded;
        self.items.push(item);
        id
    }

    pub fn remove(&mut self, id: &str) -> Option<BomLineItem> {
        let index = self.position(id)?;
        Some(self.items.remove(index))
    }

    pub fn into_items(self) -> Vec<BomLineItem> {
        self.items()
    }
}
