//! Per-object shader choice cache

use super::variant::ShaderVariant;
use crate::renderer::light::LightSlot;

/// Key of one cached choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantSlot {
    Ambient,
    Final,
    /// Single-pass or unshadowed lighting pass for a light slot.
    Lit(LightSlot),
    /// Shadow-mapped lighting pass for a light slot.
    Shadowed(LightSlot),
}

impl VariantSlot {
    pub const COUNT: usize = 2 + 2 * LightSlot::COUNT;

    pub fn index(self) -> usize {
        match self {
            VariantSlot::Ambient => 0,
            VariantSlot::Final => 1,
            VariantSlot::Lit(slot) => 2 + slot.index(),
            VariantSlot::Shadowed(slot) => 2 + LightSlot::COUNT + slot.index(),
        }
    }
}

/// A resolved choice and the reselect generation it was made under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedVariant {
    pub variant: ShaderVariant,
    pub generation: u64,
}

/// Cached variant choices of one object.
///
/// An entry is valid only for the generation it was resolved at; any
/// settings change bumps the context generation and every entry is
/// re-derived on next use.
#[derive(Debug, Clone, Default)]
pub struct ShaderCache {
    slots: [Option<CachedVariant>; VariantSlot::COUNT],
}

impl ShaderCache {
    /// The cached entry of a slot, valid or not.
    pub fn entry(&self, slot: VariantSlot) -> Option<CachedVariant> {
        self.slots[slot.index()]
    }

    /// The cached variant if it is valid for `generation`.
    pub fn get(&self, slot: VariantSlot, generation: u64) -> Option<ShaderVariant> {
        self.entry(slot)
            .filter(|entry| entry.generation == generation)
            .map(|entry| entry.variant)
    }

    /// Return the valid cached variant or compute, store and return it.
    pub fn resolve(
        &mut self,
        slot: VariantSlot,
        generation: u64,
        compute: impl FnOnce() -> ShaderVariant,
    ) -> ShaderVariant {
        if let Some(variant) = self.get(slot, generation) {
            return variant;
        }
        let variant = compute();
        self.slots[slot.index()] = Some(CachedVariant { variant, generation });
        variant
    }

    /// Drop every entry, e.g. after the object's flags changed.
    pub fn invalidate(&mut self) {
        self.slots = [None; VariantSlot::COUNT];
    }
}
