use log::debug;

use crate::config::MaxOccursMerge;
use crate::ir::{AttributeKind, ClassForest, MaxOccurs, SchemaAttribute, SchemaClass};

/// Combines the `max_occurs` of two attributes merged into one.
///
/// Duplicate attributes show up when the same element appears in several
/// branches of a `<choice>` or in repeated sequences.
pub trait MergePolicy {
    fn merge_max_occurs(&self, existing: MaxOccurs, other: MaxOccurs) -> MaxOccurs;
}

/// Upstream behaviour: bounds add up, so choice alternatives become lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOccurrences;

impl MergePolicy for SumOccurrences {
    fn merge_max_occurs(&self, existing: MaxOccurs, other: MaxOccurs) -> MaxOccurs {
        match (existing, other) {
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => {
                MaxOccurs::Bounded(a.saturating_add(b))
            }
            _ => MaxOccurs::Unbounded,
        }
    }
}

/// Keep the smallest bound, so a scalar in two choice branches stays scalar.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumOccurrences;

impl MergePolicy for MinimumOccurrences {
    fn merge_max_occurs(&self, existing: MaxOccurs, other: MaxOccurs) -> MaxOccurs {
        match (existing, other) {
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => MaxOccurs::Bounded(a.min(b)),
            (MaxOccurs::Bounded(a), MaxOccurs::Unbounded)
            | (MaxOccurs::Unbounded, MaxOccurs::Bounded(a)) => MaxOccurs::Bounded(a),
            (MaxOccurs::Unbounded, MaxOccurs::Unbounded) => MaxOccurs::Unbounded,
        }
    }
}

/// Policy selected by configuration.
pub fn policy_for(merge: MaxOccursMerge) -> Box<dyn MergePolicy> {
    match merge {
        MaxOccursMerge::Minimum => Box::new(MinimumOccurrences),
        MaxOccursMerge::Sum => Box::new(SumOccurrences),
    }
}

/// Merge same-named element attributes of a class in place.
pub fn merge_duplicate_attributes(class: &mut SchemaClass, policy: &dyn MergePolicy) {
    let mut result: Vec<SchemaAttribute> = Vec::with_capacity(class.attributes.len());

    for attr in class.attributes.drain(..) {
        let position = result
            .iter()
            .position(|e| e.name == attr.name && e.kind == attr.kind);

        match position {
            Some(pos)
                if !matches!(
                    attr.kind,
                    AttributeKind::Attribute | AttributeKind::Enumeration
                ) =>
            {
                let existing = &mut result[pos];
                debug!("merging duplicate attribute {}.{}", class.name, attr.name);
                if existing.documentation.is_none() {
                    existing.documentation = attr.documentation;
                }
                existing.min_occurs = existing.min_occurs.min(attr.min_occurs);
                existing.max_occurs = policy.merge_max_occurs(existing.max_occurs, attr.max_occurs);
                for ty in attr.types {
                    if !existing.types.contains(&ty) {
                        existing.types.push(ty);
                    }
                }
            }
            _ => result.push(attr),
        }
    }

    class.attributes = result;
}

/// Apply [`merge_duplicate_attributes`] to every class of the forest.
pub fn merge_forest(forest: &mut ClassForest, policy: &dyn MergePolicy) {
    let ids: Vec<_> = forest.ids().collect();
    for id in ids {
        merge_duplicate_attributes(forest.get_mut(id), policy);
    }
}
