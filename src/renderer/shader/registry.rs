//! Shader program registry
//!
//! Loads each variant's program the first time it is needed and keeps it
//! for the rest of the session.

use super::variant::{ShaderVariant, UniformKind};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Opaque handle of a loaded program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub u32);

/// Location of a uniform within a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// A loaded program and its uniform locations.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub handle: ProgramHandle,
    pub uniform_locations: HashMap<UniformKind, UniformLocation>,
}

impl Program {
    pub fn location(&self, kind: UniformKind) -> Option<UniformLocation> {
        self.uniform_locations.get(&kind).copied()
    }
}

/// Source of compiled programs.
pub trait ShaderLoader {
    fn load(&mut self, variant: ShaderVariant) -> anyhow::Result<Program>;
}

/// Demand-loading cache of programs, one per variant.
#[derive(Debug)]
pub struct ShaderRegistry<L> {
    loader: L,
    programs: Vec<Option<Program>>,
}

impl<L: ShaderLoader> ShaderRegistry<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            programs: vec![None; ShaderVariant::COUNT],
        }
    }

    /// The program of `variant`, loading it on first use.
    ///
    /// A program that cannot be loaded, or lacks a location for one of
    /// its variant's uniforms, is an error.
    pub fn get_or_load(&mut self, variant: ShaderVariant) -> Result<&Program> {
        let slot = &mut self.programs[variant.id()];
        if slot.is_none() {
            let program = self
                .loader
                .load(variant)
                .map_err(|source| Error::ShaderLoad { variant, source })?;
            if let Some(uniform) = variant
                .required_uniforms()
                .kinds()
                .find(|kind| program.location(*kind).is_none())
            {
                return Err(Error::MissingUniform { variant, uniform });
            }
            tracing::info!(variant = variant.name(), handle = program.handle.0, "loaded shader program");
            *slot = Some(program);
        }
        slot.as_ref().ok_or(Error::Invariant("program slot empty after load"))
    }

    /// The program of `variant` if it was already loaded.
    pub fn get(&self, variant: ShaderVariant) -> Option<&Program> {
        self.programs[variant.id()].as_ref()
    }

    pub fn loaded_count(&self) -> usize {
        self.programs.iter().filter(|p| p.is_some()).count()
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

/// Loader that assigns handles and locations from the variant table.
///
/// Stands in for a real program cache in headless runs. Variants can be
/// marked broken or stripped of a uniform to exercise load failures.
#[derive(Debug, Default)]
pub struct ProgramTable {
    next_handle: u32,
    broken: HashSet<ShaderVariant>,
    stripped: HashMap<ShaderVariant, UniformKind>,
    loads: usize,
}

impl ProgramTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loading `variant` will fail.
    pub fn with_broken(mut self, variant: ShaderVariant) -> Self {
        self.broken.insert(variant);
        self
    }

    /// `variant`'s program will lack a location for `uniform`.
    pub fn with_stripped(mut self, variant: ShaderVariant, uniform: UniformKind) -> Self {
        self.stripped.insert(variant, uniform);
        self
    }

    /// Number of load calls served.
    pub fn loads(&self) -> usize {
        self.loads
    }
}

impl ShaderLoader for ProgramTable {
    fn load(&mut self, variant: ShaderVariant) -> anyhow::Result<Program> {
        self.loads += 1;
        if self.broken.contains(&variant) {
            anyhow::bail!("program resource '{}' is missing", variant.name());
        }
        let stripped = self.stripped.get(&variant).copied();
        let uniform_locations = variant
            .required_uniforms()
            .kinds()
            .filter(|kind| Some(*kind) != stripped)
            .enumerate()
            .map(|(i, kind)| (kind, UniformLocation(i as u32)))
            .collect();
        let handle = ProgramHandle(self.next_handle);
        self.next_handle += 1;
        Ok(Program {
            handle,
            uniform_locations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_programs_load_once() {
        let mut registry = ShaderRegistry::new(ProgramTable::new());
        let a = registry.get_or_load(ShaderVariant::MpAmbient).unwrap().handle;
        let b = registry.get_or_load(ShaderVariant::MpAmbient).unwrap().handle;
        assert_eq!(a, b);
        assert_eq!(registry.loader().loads(), 1);
        assert_eq!(registry.loaded_count(), 1);
        assert!(registry.get(ShaderVariant::MpFinalEmission).is_none());
    }

    #[test]
    fn test_load_failure_is_reported() {
        let loader = ProgramTable::new().with_broken(ShaderVariant::MpSpotStandard);
        let mut registry = ShaderRegistry::new(loader);
        let err = registry.get_or_load(ShaderVariant::MpSpotStandard).unwrap_err();
        assert!(matches!(err, Error::ShaderLoad { variant: ShaderVariant::MpSpotStandard, .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_uniform_is_reported() {
        let loader = ProgramTable::new().with_stripped(ShaderVariant::MpPlainLocal, UniformKind::LightAttenuation);
        let mut registry = ShaderRegistry::new(loader);
        let err = registry.get_or_load(ShaderVariant::MpPlainLocal).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingUniform {
                uniform: UniformKind::LightAttenuation,
                ..
            }
        ));
        assert_eq!(registry.loaded_count(), 0);
    }
}
