//! # Entity Types
//!
//! The concrete graph nodes of an item catalogue.
//!
//! Every entity composes a `Ledger` for its incoming edges. Entities with
//! outgoing relations hold one forward set per relation and implement
//! `GraphNode::detach` as a dispatch from `RelationId` to "remove from this
//! set". Forward sets are only mutated through `ItemDatabase`, which keeps
//! the reverse side in step.

use crate::ledger::{GraphNode, Ledger};
use crate::{Blob, ConversionId, EffectId, NodeRef, RelationId, TagId};
use std::collections::BTreeSet;

// =============================================================================
// TAG
// =============================================================================

/// A label attached to items or conversions.
#[derive(Debug, Clone, Default)]
pub struct Tag {
    pub name: String,
    ledger: Ledger,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ledger: Ledger::new(),
        }
    }
}

impl GraphNode for Tag {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
}

// =============================================================================
// EFFECT
// =============================================================================

/// A named effect, consumed or produced by conversions.
#[derive(Debug, Clone, Default)]
pub struct Effect {
    pub name: String,
    ledger: Ledger,
}

impl Effect {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ledger: Ledger::new(),
        }
    }
}

impl GraphNode for Effect {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }
}

// =============================================================================
// EFFECT CONVERSION
// =============================================================================

/// A recipe turning input effects into output effects.
///
/// A conversion has no attributes of its own; it is identified by its edges.
#[derive(Debug, Clone, Default)]
pub struct EffectConversion {
    pub(crate) tags: BTreeSet<TagId>,
    pub(crate) inputs: BTreeSet<EffectId>,
    pub(crate) outputs: BTreeSet<EffectId>,
    ledger: Ledger,
}

impl EffectConversion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags on this conversion.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<TagId> {
        &self.tags
    }

    /// Effects consumed.
    #[must_use]
    pub fn inputs(&self) -> &BTreeSet<EffectId> {
        &self.inputs
    }

    /// Effects produced.
    #[must_use]
    pub fn outputs(&self) -> &BTreeSet<EffectId> {
        &self.outputs
    }
}

impl GraphNode for EffectConversion {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    fn detach(&mut self, relation: RelationId, target: NodeRef) {
        match (relation, target) {
            (RelationId::ConversionTags, NodeRef::Tag(id)) => {
                self.tags.remove(&id);
            }
            (RelationId::ConversionInputs, NodeRef::Effect(id)) => {
                self.inputs.remove(&id);
            }
            (RelationId::ConversionOutputs, NodeRef::Effect(id)) => {
                self.outputs.remove(&id);
            }
            _ => {}
        }
    }
}

// =============================================================================
// ITEM
// =============================================================================

/// A catalogue item with an optional image and the conversions it performs.
#[derive(Debug, Clone, Default)]
pub struct Item {
    pub name: String,
    pub image: Option<Blob>,
    pub(crate) tags: BTreeSet<TagId>,
    pub(crate) conversions: BTreeSet<ConversionId>,
    ledger: Ledger,
}

impl Item {
    #[must_use]
    pub fn new(name: impl Into<String>, image: Option<Blob>) -> Self {
        Self {
            name: name.into(),
            image,
            ..Self::default()
        }
    }

    /// Tags on this item.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<TagId> {
        &self.tags
    }

    /// Conversions this item performs.
    #[must_use]
    pub fn conversions(&self) -> &BTreeSet<ConversionId> {
        &self.conversions
    }
}

impl GraphNode for Item {
    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    fn detach(&mut self, relation: RelationId, target: NodeRef) {
        match (relation, target) {
            (RelationId::ItemTags, NodeRef::Tag(id)) => {
                self.tags.remove(&id);
            }
            (RelationId::ItemConversions, NodeRef::Conversion(id)) => {
                self.conversions.remove(&id);
            }
            _ => {}
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_nodes_ignore_detach() {
        let mut effect = Effect::new("Heat");
        effect.detach(RelationId::ConversionInputs, NodeRef::Effect(EffectId(1)));
        assert_eq!(effect.name, "Heat");
        assert!(effect.ledger().is_empty());
    }

    #[test]
    fn conversion_detach_dispatches_by_relation() {
        let mut conversion = EffectConversion::new();
        conversion.inputs.insert(EffectId(1));
        conversion.outputs.insert(EffectId(1));
        conversion.tags.insert(TagId(2));

        conversion.detach(RelationId::ConversionInputs, NodeRef::Effect(EffectId(1)));
        assert!(conversion.inputs().is_empty());
        assert!(conversion.outputs().contains(&EffectId(1)));

        conversion.detach(RelationId::ConversionTags, NodeRef::Tag(TagId(2)));
        assert!(conversion.tags().is_empty());
    }

    #[test]
    fn conversion_detach_ignores_foreign_relation() {
        let mut conversion = EffectConversion::new();
        conversion.tags.insert(TagId(2));

        conversion.detach(RelationId::ItemTags, NodeRef::Tag(TagId(2)));
        assert!(conversion.tags().contains(&TagId(2)));
    }

    #[test]
    fn item_detach_dispatches_by_relation() {
        let mut item = Item::new("Ice Wand", None);
        item.tags.insert(TagId(4));
        item.conversions.insert(ConversionId(5));

        item.detach(RelationId::ItemConversions, NodeRef::Conversion(ConversionId(5)));
        assert!(item.conversions().is_empty());
        assert_eq!(item.tags().len(), 1);

        item.detach(RelationId::ItemTags, NodeRef::Tag(TagId(4)));
        assert!(item.tags().is_empty());
    }
}
