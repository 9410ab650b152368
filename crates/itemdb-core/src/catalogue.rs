//! # Catalogue
//!
//! `ItemDatabase` is the aggregate root: it owns five disjoint entity stores
//! and is the only place entities are created or destroyed.
//!
//! Relations are non-owning. A forward set holds identifiers, and the
//! referenced node's ledger holds `(relation, owner)` back. Both sides are
//! updated in the same call.
//!
//! Deletion is non-recursive: deleting a node removes it from every forward
//! set that referenced it, and deletes nothing else. The deleted node's own
//! forward edges are dropped with it; neighbours it pointed at keep their
//! (now stale) reverse entry until they are deleted themselves.

use crate::graph::{Effect, EffectConversion, Item, Tag};
use crate::ledger::{GraphNode, Ledger};
use crate::{Blob, ConversionId, EffectId, ItemId, NodeRef, RelationId, TagId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// ITEM DATABASE
// =============================================================================

/// The catalogue of effects, conversions, items and tags.
///
/// Uses `BTreeMap` stores keyed by monotonically allocated identifiers, so
/// iteration order is creation order.
#[derive(Debug, Clone, Default)]
pub struct ItemDatabase {
    /// Catalogue name.
    pub name: String,

    /// Next identifier to hand out, shared by all stores.
    next_id: u64,

    effects: BTreeMap<EffectId, Effect>,
    conversions: BTreeMap<ConversionId, EffectConversion>,
    items: BTreeMap<ItemId, Item>,
    item_tags: BTreeMap<TagId, Tag>,
    conversion_tags: BTreeMap<TagId, Tag>,
}

impl ItemDatabase {
    /// Create an empty catalogue.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }

    // -------------------------------------------------------------------------
    // Effects
    // -------------------------------------------------------------------------

    /// Effects in creation order.
    pub fn effects(&self) -> impl Iterator<Item = (EffectId, &Effect)> {
        self.effects.iter().map(|(id, e)| (*id, e))
    }

    #[must_use]
    pub fn effect(&self, id: EffectId) -> Option<&Effect> {
        self.effects.get(&id)
    }

    pub fn effect_mut(&mut self, id: EffectId) -> Option<&mut Effect> {
        self.effects.get_mut(&id)
    }

    pub fn effects_create(&mut self, name: impl Into<String>) -> EffectId {
        let id = EffectId(self.allocate());
        self.effects.insert(id, Effect::new(name));
        id
    }

    /// Remove an effect and detach it from every conversion using it.
    ///
    /// Returns false if the effect was not in this catalogue.
    pub fn effects_delete(&mut self, id: EffectId) -> bool {
        match self.effects.remove(&id) {
            Some(mut effect) => {
                self.clear_incoming(id.into(), effect.ledger_mut());
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Conversions
    // -------------------------------------------------------------------------

    /// Conversions in creation order.
    pub fn conversions(&self) -> impl Iterator<Item = (ConversionId, &EffectConversion)> {
        self.conversions.iter().map(|(id, c)| (*id, c))
    }

    #[must_use]
    pub fn conversion(&self, id: ConversionId) -> Option<&EffectConversion> {
        self.conversions.get(&id)
    }

    pub fn conversions_create(&mut self) -> ConversionId {
        let id = ConversionId(self.allocate());
        self.conversions.insert(id, EffectConversion::new());
        id
    }

    /// Remove a conversion and detach it from every item performing it.
    pub fn conversions_delete(&mut self, id: ConversionId) -> bool {
        match self.conversions.remove(&id) {
            Some(mut conversion) => {
                self.clear_incoming(id.into(), conversion.ledger_mut());
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Items in creation order.
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items.iter().map(|(id, i)| (*id, i))
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    pub fn items_create(&mut self, name: impl Into<String>, image: Option<Blob>) -> ItemId {
        let id = ItemId(self.allocate());
        self.items.insert(id, Item::new(name, image));
        id
    }

    /// Remove an item. Items are never pointed at by the shipped relations,
    /// so this only drops the item and its outgoing edges.
    pub fn items_delete(&mut self, id: ItemId) -> bool {
        match self.items.remove(&id) {
            Some(mut item) => {
                self.clear_incoming(id.into(), item.ledger_mut());
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Tags
    // -------------------------------------------------------------------------

    /// Item tags in creation order.
    pub fn item_tags(&self) -> impl Iterator<Item = (TagId, &Tag)> {
        self.item_tags.iter().map(|(id, t)| (*id, t))
    }

    /// Conversion tags in creation order.
    pub fn conversion_tags(&self) -> impl Iterator<Item = (TagId, &Tag)> {
        self.conversion_tags.iter().map(|(id, t)| (*id, t))
    }

    /// Look up a tag in either tag store.
    #[must_use]
    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.item_tags
            .get(&id)
            .or_else(|| self.conversion_tags.get(&id))
    }

    pub fn tag_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        match self.item_tags.get_mut(&id) {
            Some(tag) => Some(tag),
            None => self.conversion_tags.get_mut(&id),
        }
    }

    pub fn item_tags_create(&mut self, name: impl Into<String>) -> TagId {
        let id = TagId(self.allocate());
        self.item_tags.insert(id, Tag::new(name));
        id
    }

    pub fn item_tags_delete(&mut self, id: TagId) -> bool {
        match self.item_tags.remove(&id) {
            Some(mut tag) => {
                self.clear_incoming(id.into(), tag.ledger_mut());
                true
            }
            None => false,
        }
    }

    pub fn conversion_tags_create(&mut self, name: impl Into<String>) -> TagId {
        let id = TagId(self.allocate());
        self.conversion_tags.insert(id, Tag::new(name));
        id
    }

    pub fn conversion_tags_delete(&mut self, id: TagId) -> bool {
        match self.conversion_tags.remove(&id) {
            Some(mut tag) => {
                self.clear_incoming(id.into(), tag.ledger_mut());
                true
            }
            None => false,
        }
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    /// Only tags from the conversion tag store are accepted.
    pub fn conversion_tags_add(&mut self, conversion: ConversionId, tag: TagId) -> bool {
        self.link(conversion.into(), RelationId::ConversionTags, tag.into())
    }

    pub fn conversion_tags_remove(&mut self, conversion: ConversionId, tag: TagId) -> bool {
        self.unlink(conversion.into(), RelationId::ConversionTags, tag.into())
    }

    pub fn conversion_inputs_add(&mut self, conversion: ConversionId, effect: EffectId) -> bool {
        self.link(conversion.into(), RelationId::ConversionInputs, effect.into())
    }

    pub fn conversion_inputs_remove(&mut self, conversion: ConversionId, effect: EffectId) -> bool {
        self.unlink(conversion.into(), RelationId::ConversionInputs, effect.into())
    }

    pub fn conversion_outputs_add(&mut self, conversion: ConversionId, effect: EffectId) -> bool {
        self.link(conversion.into(), RelationId::ConversionOutputs, effect.into())
    }

    pub fn conversion_outputs_remove(
        &mut self,
        conversion: ConversionId,
        effect: EffectId,
    ) -> bool {
        self.unlink(conversion.into(), RelationId::ConversionOutputs, effect.into())
    }

    /// Only tags from the item tag store are accepted.
    pub fn item_tags_add(&mut self, item: ItemId, tag: TagId) -> bool {
        self.link(item.into(), RelationId::ItemTags, tag.into())
    }

    pub fn item_tags_remove(&mut self, item: ItemId, tag: TagId) -> bool {
        self.unlink(item.into(), RelationId::ItemTags, tag.into())
    }

    pub fn item_conversions_add(&mut self, item: ItemId, conversion: ConversionId) -> bool {
        self.link(item.into(), RelationId::ItemConversions, conversion.into())
    }

    pub fn item_conversions_remove(&mut self, item: ItemId, conversion: ConversionId) -> bool {
        self.unlink(item.into(), RelationId::ItemConversions, conversion.into())
    }

    /// Reverse index of any node still in the catalogue.
    pub fn ledger_of(&self, node: impl Into<NodeRef>) -> Option<&Ledger> {
        self.node(node.into()).map(|n| n.ledger())
    }

    // -------------------------------------------------------------------------
    // Lookup helpers
    // -------------------------------------------------------------------------

    /// First effect with this name.
    #[must_use]
    pub fn find_effect(&self, name: &str) -> Option<EffectId> {
        self.effects().find(|(_, e)| e.name == name).map(|(id, _)| id)
    }

    /// First item with this name.
    #[must_use]
    pub fn find_item(&self, name: &str) -> Option<ItemId> {
        self.items().find(|(_, i)| i.name == name).map(|(id, _)| id)
    }

    /// First item tag with this name.
    #[must_use]
    pub fn find_item_tag(&self, name: &str) -> Option<TagId> {
        self.item_tags().find(|(_, t)| t.name == name).map(|(id, _)| id)
    }

    /// First conversion tag with this name.
    #[must_use]
    pub fn find_conversion_tag(&self, name: &str) -> Option<TagId> {
        self.conversion_tags()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    /// Store and edge counts.
    #[must_use]
    pub fn summary(&self) -> CatalogueSummary {
        let conversion_edges: usize = self
            .conversions
            .values()
            .map(|c| c.tags.len() + c.inputs.len() + c.outputs.len())
            .sum();
        let item_edges: usize = self
            .items
            .values()
            .map(|i| i.tags.len() + i.conversions.len())
            .sum();

        CatalogueSummary {
            name: self.name.clone(),
            effects: self.effects.len(),
            conversions: self.conversions.len(),
            items: self.items.len(),
            item_tags: self.item_tags.len(),
            conversion_tags: self.conversion_tags.len(),
            images: self.items.values().filter(|i| i.image.is_some()).count(),
            edges: conversion_edges + item_edges,
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn node(&self, node: NodeRef) -> Option<&dyn GraphNode> {
        match node {
            NodeRef::Tag(id) => self.tag(id).map(|t| t as &dyn GraphNode),
            NodeRef::Effect(id) => self.effects.get(&id).map(|e| e as &dyn GraphNode),
            NodeRef::Conversion(id) => self.conversions.get(&id).map(|c| c as &dyn GraphNode),
            NodeRef::Item(id) => self.items.get(&id).map(|i| i as &dyn GraphNode),
        }
    }

    fn node_mut(&mut self, node: NodeRef) -> Option<&mut dyn GraphNode> {
        match node {
            NodeRef::Tag(id) => self.tag_mut(id).map(|t| t as &mut dyn GraphNode),
            NodeRef::Effect(id) => self.effects.get_mut(&id).map(|e| e as &mut dyn GraphNode),
            NodeRef::Conversion(id) => self
                .conversions
                .get_mut(&id)
                .map(|c| c as &mut dyn GraphNode),
            NodeRef::Item(id) => self.items.get_mut(&id).map(|i| i as &mut dyn GraphNode),
        }
    }

    /// Insert `target` into `owner`'s forward set for `relation`, and record
    /// the reverse entry only if membership changed.
    fn link(&mut self, owner: NodeRef, relation: RelationId, target: NodeRef) -> bool {
        if self.node(target).is_none() {
            return false;
        }

        let inserted = match (owner, relation, target) {
            (NodeRef::Conversion(c), RelationId::ConversionTags, NodeRef::Tag(t)) => {
                self.conversion_tags.contains_key(&t)
                    && self
                        .conversions
                        .get_mut(&c)
                        .is_some_and(|c| c.tags.insert(t))
            }
            (NodeRef::Conversion(c), RelationId::ConversionInputs, NodeRef::Effect(e)) => self
                .conversions
                .get_mut(&c)
                .is_some_and(|c| c.inputs.insert(e)),
            (NodeRef::Conversion(c), RelationId::ConversionOutputs, NodeRef::Effect(e)) => self
                .conversions
                .get_mut(&c)
                .is_some_and(|c| c.outputs.insert(e)),
            (NodeRef::Item(i), RelationId::ItemTags, NodeRef::Tag(t)) => {
                self.item_tags.contains_key(&t)
                    && self.items.get_mut(&i).is_some_and(|i| i.tags.insert(t))
            }
            (NodeRef::Item(i), RelationId::ItemConversions, NodeRef::Conversion(c)) => self
                .items
                .get_mut(&i)
                .is_some_and(|i| i.conversions.insert(c)),
            _ => false,
        };

        if inserted {
            if let Some(node) = self.node_mut(target) {
                node.ledger_mut().record(relation, owner);
            }
        }
        inserted
    }

    /// Remove `target` from `owner`'s forward set for `relation`, and forget
    /// the reverse entry only if membership changed.
    fn unlink(&mut self, owner: NodeRef, relation: RelationId, target: NodeRef) -> bool {
        let removed = match (owner, relation, target) {
            (NodeRef::Conversion(c), RelationId::ConversionTags, NodeRef::Tag(t)) => self
                .conversions
                .get_mut(&c)
                .is_some_and(|c| c.tags.remove(&t)),
            (NodeRef::Conversion(c), RelationId::ConversionInputs, NodeRef::Effect(e)) => self
                .conversions
                .get_mut(&c)
                .is_some_and(|c| c.inputs.remove(&e)),
            (NodeRef::Conversion(c), RelationId::ConversionOutputs, NodeRef::Effect(e)) => self
                .conversions
                .get_mut(&c)
                .is_some_and(|c| c.outputs.remove(&e)),
            (NodeRef::Item(i), RelationId::ItemTags, NodeRef::Tag(t)) => {
                self.items.get_mut(&i).is_some_and(|i| i.tags.remove(&t))
            }
            (NodeRef::Item(i), RelationId::ItemConversions, NodeRef::Conversion(c)) => self
                .items
                .get_mut(&i)
                .is_some_and(|i| i.conversions.remove(&c)),
            _ => false,
        };

        if removed {
            if let Some(node) = self.node_mut(target) {
                node.ledger_mut().forget(relation, owner);
            }
        }
        removed
    }

    /// Cascading detach for a node that has just left its store.
    ///
    /// Sources that have themselves been deleted are skipped.
    fn clear_incoming(&mut self, this: NodeRef, ledger: &mut Ledger) {
        for (relation, source) in ledger.take() {
            if let Some(node) = self.node_mut(source) {
                node.detach(relation, this);
            }
        }
    }
}

// =============================================================================
// SUMMARY
// =============================================================================

/// Store and edge counts of a catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueSummary {
    pub name: String,
    pub effects: usize,
    pub conversions: usize,
    pub items: usize,
    pub item_tags: usize,
    pub conversion_tags: usize,
    pub images: usize,
    pub edges: usize,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn alchemy() -> (ItemDatabase, EffectId, EffectId, ConversionId, ItemId) {
        let mut db = ItemDatabase::new("Alchemy");
        let heat = db.effects_create("Heat");
        let cold = db.effects_create("Cold");
        let conversion = db.conversions_create();
        db.conversion_inputs_add(conversion, heat);
        db.conversion_outputs_add(conversion, cold);
        let wand = db.items_create("Ice Wand", None);
        db.item_conversions_add(wand, conversion);
        (db, heat, cold, conversion, wand)
    }

    #[test]
    fn add_records_reverse_entry() {
        let (db, heat, _, conversion, _) = alchemy();

        let ledger = db.ledger_of(heat).expect("heat exists");
        assert_eq!(
            ledger.incoming(RelationId::ConversionInputs),
            &[NodeRef::Conversion(conversion)]
        );
        assert!(db.conversion(conversion).expect("exists").inputs().contains(&heat));
    }

    #[test]
    fn add_is_idempotent() {
        let (mut db, heat, _, conversion, _) = alchemy();

        assert!(!db.conversion_inputs_add(conversion, heat));
        let ledger = db.ledger_of(heat).expect("heat exists");
        assert_eq!(ledger.len(), 1);
        assert_eq!(db.conversion(conversion).expect("exists").inputs().len(), 1);
    }

    #[test]
    fn remove_forgets_reverse_entry() {
        let (mut db, heat, _, conversion, _) = alchemy();

        assert!(db.conversion_inputs_remove(conversion, heat));
        assert!(db.ledger_of(heat).expect("heat exists").is_empty());
        assert!(db.conversion(conversion).expect("exists").inputs().is_empty());

        assert!(!db.conversion_inputs_remove(conversion, heat));
    }

    #[test]
    fn effect_used_as_input_and_output() {
        let mut db = ItemDatabase::new("Loop");
        let heat = db.effects_create("Heat");
        let conversion = db.conversions_create();
        db.conversion_inputs_add(conversion, heat);
        db.conversion_outputs_add(conversion, heat);

        assert_eq!(db.ledger_of(heat).expect("exists").len(), 2);

        db.effects_delete(heat);
        let conversion = db.conversion(conversion).expect("conversion survives");
        assert!(conversion.inputs().is_empty());
        assert!(conversion.outputs().is_empty());
    }

    #[test]
    fn delete_effect_detaches_without_deleting_conversion() {
        let (mut db, heat, cold, conversion, wand) = alchemy();

        assert!(db.effects_delete(heat));

        let c = db.conversion(conversion).expect("conversion survives");
        assert!(c.inputs().is_empty());
        assert!(c.outputs().contains(&cold));
        assert!(db.item(wand).expect("item survives").conversions().contains(&conversion));
        assert_eq!(db.effects().count(), 1);
    }

    #[test]
    fn delete_conversion_detaches_from_items() {
        let (mut db, _, _, conversion, wand) = alchemy();

        assert!(db.conversions_delete(conversion));
        assert!(db.item(wand).expect("item survives").conversions().is_empty());
        assert_eq!(db.conversions().count(), 0);
    }

    #[test]
    fn delete_twice_is_noop() {
        let (mut db, heat, _, _, _) = alchemy();

        assert!(db.effects_delete(heat));
        assert!(!db.effects_delete(heat));
        assert!(db.effect(heat).is_none());
    }

    #[test]
    fn delete_leaves_stale_entry_on_neighbour() {
        let (mut db, heat, _, conversion, _) = alchemy();

        db.conversions_delete(conversion);

        // The conversion pointed at heat; heat is not told about the delete.
        let ledger = db.ledger_of(heat).expect("heat exists");
        assert!(ledger.contains(RelationId::ConversionInputs, NodeRef::Conversion(conversion)));

        // Deleting heat later skips the vanished source.
        assert!(db.effects_delete(heat));
    }

    #[test]
    fn link_to_missing_node_is_noop() {
        let (mut db, heat, _, conversion, wand) = alchemy();
        db.effects_delete(heat);

        assert!(!db.conversion_inputs_add(conversion, heat));
        assert!(!db.item_conversions_add(ItemId(999), conversion));
        assert!(db.item(wand).is_some());
    }

    #[test]
    fn tag_relations_only_accept_their_own_store() {
        let mut db = ItemDatabase::new("Tags");
        let item_tag = db.item_tags_create("Rare");
        let conversion_tag = db.conversion_tags_create("Rare");
        assert_ne!(item_tag, conversion_tag);

        let item = db.items_create("Ring", None);
        let conversion = db.conversions_create();
        assert!(db.item_tags_add(item, item_tag));
        assert!(!db.item_tags_add(item, conversion_tag));
        assert!(db.conversion_tags_add(conversion, conversion_tag));
        assert!(!db.conversion_tags_add(conversion, item_tag));

        assert_eq!(db.ledger_of(conversion_tag).expect("exists").len(), 1);
        assert_eq!(db.ledger_of(item_tag).expect("exists").len(), 1);

        db.conversion_tags_delete(conversion_tag);
        assert_eq!(
            db.item(item).expect("exists").tags().iter().copied().collect::<Vec<_>>(),
            vec![item_tag]
        );
        assert!(db.conversion(conversion).expect("exists").tags().is_empty());
        assert_eq!(db.find_item_tag("Rare"), Some(item_tag));
        assert_eq!(db.find_conversion_tag("Rare"), None);
    }

    #[test]
    fn item_tags_delete_ignores_conversion_store() {
        let mut db = ItemDatabase::new("Tags");
        let conversion_tag = db.conversion_tags_create("Fire");
        assert!(!db.item_tags_delete(conversion_tag));
        assert!(db.tag(conversion_tag).is_some());
    }

    #[test]
    fn identifiers_are_not_reused() {
        let mut db = ItemDatabase::new("Ids");
        let first = db.effects_create("A");
        db.effects_delete(first);
        let second = db.effects_create("A");
        assert_ne!(first, second);
    }

    #[test]
    fn summary_counts() {
        let (mut db, _, _, _, wand) = alchemy();
        let tag = db.item_tags_create("Magic");
        db.item_tags_add(wand, tag);
        db.item_mut(wand).expect("exists").image = Some(Blob::new("w.png", "image/png", vec![1u8]));

        let summary = db.summary();
        assert_eq!(summary.effects, 2);
        assert_eq!(summary.conversions, 1);
        assert_eq!(summary.items, 1);
        assert_eq!(summary.item_tags, 1);
        assert_eq!(summary.images, 1);
        assert_eq!(summary.edges, 4);
    }
}
