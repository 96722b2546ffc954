pub mod collect;
pub mod inverse;
pub mod labels;
pub mod merge;
pub mod name_resolver;
pub mod naming;
pub mod numeric;
pub mod skip;
pub mod stopwords;
pub mod xsd_info;

pub use collect::CollectedTypes;
pub use inverse::{ImplicitInverse, ImplicitInverseTable, InverseCollector};
pub use labels::{ClassRenderContext, Label, LabelOptions, extract_label};
pub use merge::{MergePolicy, merge_forest, policy_for};
pub use name_resolver::{
    ClassOccurrence, RegistryEntry, RegistryNames, class_occurrences, resolve_registry_names,
};
pub use naming::FieldNaming;
pub use numeric::{NumericClassifier, NumericKind};
pub use skip::SkipPatterns;
pub use xsd_info::{XsdExtraInfo, XsdInfoMiner, XsdInfoTable};
