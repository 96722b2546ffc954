pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

pub use error::GeneratorError;

/// A generated file with path, logical module title and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub title: String,
    pub content: String,
}

/// Trait for backends that render source files from a schema model.
pub trait CodeGenerator {
    fn generate(
        &self,
        model: &ir::SchemaModel,
        config: &config::XsoConfig,
    ) -> Result<Vec<GeneratedFile>, GeneratorError>;
}
