pub mod forest;
pub mod schema;

pub use forest::{ClassForest, SchemaModel};
pub use schema::{
    AttributeKind, ClassId, ClassKind, EnumValue, MaxOccurs, SchemaAttribute, SchemaClass,
    TypeReference, local_name,
};
