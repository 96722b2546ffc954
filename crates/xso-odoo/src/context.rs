//! Everything the render phase reads, computed over the whole bundle first.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use log::info;
use xso_core::config::XsoConfig;
use xso_core::error::ConfigError;
use xso_core::ir::{ClassForest, ClassId, SchemaModel};
use xso_core::transform::inverse::{is_skipped_lineage, lineage_names};
use xso_core::transform::{
    ClassOccurrence, CollectedTypes, FieldNaming, ImplicitInverseTable, InverseCollector,
    LabelOptions, NumericClassifier, RegistryNames, SkipPatterns, XsdInfoMiner, XsdInfoTable,
    class_occurrences, merge_forest, policy_for, resolve_registry_names,
};

/// Modules with more skipped classes than this are dropped.
pub const MAX_SKIPPED_CLASSES: usize = 3;

/// Per-run model settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSettings {
    pub python_inherit: String,
    pub inherit_model: String,
    pub currency_field: String,
}

/// Result of the collection phase.
#[derive(Debug)]
pub struct GenerationContext {
    /// The bundle forest with duplicate attributes merged.
    pub forest: ClassForest,
    pub modules: IndexMap<String, Vec<ClassId>>,
    pub types: CollectedTypes,
    pub names: RegistryNames,
    pub inverses: ImplicitInverseTable,
    pub xsd_info: XsdInfoTable,
    /// Module each class is rendered in.
    pub module_of: HashMap<ClassId, String>,
    pub skip: SkipPatterns,
    pub naming: FieldNaming,
    pub numeric: NumericClassifier,
    pub labels: LabelOptions,
    pub settings: ModelSettings,
}

impl GenerationContext {
    /// Run the collection phase. Relative schema locations are resolved
    /// against `schema_dir`.
    pub fn collect(
        model: &SchemaModel,
        config: &XsoConfig,
        schema_dir: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut forest = model.forest.clone();
        merge_forest(&mut forest, policy_for(config.merge.effective()).as_ref());

        let skip = SkipPatterns::new(&config.skip)?;
        let naming = FieldNaming::from_config(config);
        let numeric = NumericClassifier::from_config(&config.numeric)?;

        // Packages first: they define the name resolution scopes. Module
        // roots missing from every package are resolved afterwards.
        let groups: Vec<&[ClassId]> = model
            .packages
            .values()
            .chain(model.modules.values())
            .map(Vec::as_slice)
            .collect();

        let mut types = CollectedTypes::new();
        let mut names = RegistryNames::new(&config.schema, &config.version);
        let mut occurrences: Vec<ClassOccurrence> = Vec::new();
        let mut seen: HashSet<(ClassId, String)> = HashSet::new();
        for roots in &groups {
            types.add_reachable(&forest, roots);
            resolve_registry_names(&forest, roots, &mut names);
            for occurrence in class_occurrences(&forest, roots) {
                if seen.insert((occurrence.id, occurrence.key())) {
                    occurrences.push(occurrence);
                }
            }
        }

        let mut inverses = ImplicitInverseTable::new();
        InverseCollector {
            forest: &forest,
            names: &names,
            types: &types,
            skip: &skip,
            naming: &naming,
        }
        .collect(&occurrences, &mut inverses);

        let mut miner = match schema_dir {
            Some(dir) => XsdInfoMiner::with_base_dir(dir),
            None => XsdInfoMiner::new(),
        };
        let mut xsd_info = XsdInfoTable::new();
        for occurrence in &occurrences {
            miner.mine(&forest, &occurrence.lineage, &mut xsd_info);
        }

        let mut module_of = HashMap::new();
        for (module, roots) in &model.modules {
            for id in forest.walk(roots) {
                module_of.entry(id).or_insert_with(|| module.clone());
            }
        }

        info!(
            "collected {} complex types, {} enumerations, {} registry names, {} implicit inverses",
            types.complex_types().len(),
            types.simple_types().len(),
            names.len(),
            inverses.len()
        );

        Ok(Self {
            forest,
            modules: model.modules.clone(),
            types,
            names,
            inverses,
            xsd_info,
            module_of,
            skip,
            naming,
            numeric,
            labels: LabelOptions::from_config(&config.labels),
            settings: ModelSettings {
                python_inherit: config.model.python_inherit.clone(),
                inherit_model: config.inherit_model(),
                currency_field: config.numeric.currency_field.clone(),
            },
        })
    }

    /// Local names of an occurrence lineage, outermost first.
    pub fn parents(&self, occurrence: &ClassOccurrence) -> Vec<&str> {
        lineage_names(&self.forest, &occurrence.lineage)
    }

    /// Whether the occurrence, or a class enclosing it, is skipped.
    pub fn is_skipped(&self, occurrence: &ClassOccurrence) -> bool {
        is_skipped_lineage(&self.skip, &self.parents(occurrence))
    }
}
