use std::collections::HashSet;

use xso_core::config::{FieldNamingStrategy, MaxOccursMerge};
use xso_core::ir::SchemaModel;
use xso_core::parse;
use xso_core::transform::{
    CollectedTypes, FieldNaming, ImplicitInverseTable, InverseCollector, RegistryNames,
    SkipPatterns, class_occurrences, merge_forest, policy_for, resolve_registry_names,
};

const EVENTOS: &str = include_str!("fixtures/eventos.yaml");

struct Collected {
    model: SchemaModel,
    names: RegistryNames,
    inverses: ImplicitInverseTable,
}

fn collect(merge: MaxOccursMerge, skip: &[&str]) -> Collected {
    let mut model = parse::from_yaml(EVENTOS).unwrap();
    merge_forest(&mut model.forest, policy_for(merge).as_ref());

    let skip: Vec<String> = skip.iter().map(|s| s.to_string()).collect();
    let skip = SkipPatterns::new(&skip).unwrap();
    let naming = FieldNaming::new(FieldNamingStrategy::PrefixRawName, "nfe40_");

    let roots = model.packages["nfe.v4_00"].clone();
    let mut types = CollectedTypes::new();
    types.add_reachable(&model.forest, &roots);
    let mut names = RegistryNames::new("nfe", "40");
    resolve_registry_names(&model.forest, &roots, &mut names);

    let occurrences = class_occurrences(&model.forest, &roots);
    let mut inverses = ImplicitInverseTable::new();
    InverseCollector {
        forest: &model.forest,
        names: &names,
        types: &types,
        skip: &skip,
        naming: &naming,
    }
    .collect(&occurrences, &mut inverses);

    Collected {
        model,
        names,
        inverses,
    }
}

#[test]
fn registry_names_of_a_package() {
    let collected = collect(MaxOccursMerge::Minimum, &[]);
    let mut lines: Vec<String> = collected
        .names
        .iter()
        .map(|entry| format!("{} -> {}", entry.path, entry.registry_name))
        .collect();
    lines.sort();

    insta::assert_snapshot!(lines.join("\n"), @r"
    TenvEvento -> nfe.40.tenvevento
    Tevento -> nfe.40.tevento
    Tevento.InfEvento -> nfe.40.tevento_infevento
    Tevento.InfEvento.DetEvento -> nfe.40.detevento
    Tevento.InfEvento.DetEvento.ItensAverbados -> nfe.40.itensaverbados
    TretEvento -> nfe.40.tretevento
    TretEvento.InfEvento -> nfe.40.tretevento_infevento
    ");

    let distinct: HashSet<&str> = collected
        .names
        .iter()
        .map(|e| e.registry_name.as_str())
        .collect();
    assert_eq!(distinct.len(), collected.model.forest.len());
}

#[test]
fn every_list_of_models_gets_an_inverse() {
    let collected = collect(MaxOccursMerge::Minimum, &[]);
    let inverses = &collected.inverses;

    assert_eq!(inverses.len(), 2);
    assert!(inverses.contains("nfe.40.tevento", "nfe.40.tenvevento", "nfe40_evento_TEnvEvento_id"));
    assert!(inverses.contains(
        "nfe.40.itensaverbados",
        "nfe.40.detevento",
        "nfe40_itensAverbados_detEvento_id"
    ));
}

#[test]
fn skipped_lineages_get_no_inverse() {
    let collected = collect(MaxOccursMerge::Minimum, &["^detEvento$"]);
    assert_eq!(collected.inverses.len(), 1);
    assert!(collected.inverses.get("nfe.40.itensaverbados").is_empty());
}

#[test]
fn merge_policy_decides_list_cardinality() {
    let cnpj_is_list = |merge| {
        let collected = collect(merge, &[]);
        let info = collected.model.forest.resolve("{ns}TEvento.infEvento").unwrap();
        let cnpj: Vec<_> = info.attributes.iter().filter(|a| a.name == "CNPJ").collect();
        assert_eq!(cnpj.len(), 1);
        cnpj[0].is_list()
    };

    assert!(!cnpj_is_list(MaxOccursMerge::Minimum));
    assert!(cnpj_is_list(MaxOccursMerge::Sum));
}

#[test]
fn collection_is_deterministic() {
    let first = collect(MaxOccursMerge::Minimum, &[]);
    let second = collect(MaxOccursMerge::Minimum, &[]);

    let names = |c: &Collected| -> Vec<(String, String)> {
        c.names
            .iter()
            .map(|e| (e.path.clone(), e.registry_name.clone()))
            .collect()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(
        serde_json::to_string(&first.inverses).unwrap(),
        serde_json::to_string(&second.inverses).unwrap()
    );
}
