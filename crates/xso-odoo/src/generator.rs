use std::path::PathBuf;

use log::info;
use xso_core::config::XsoConfig;
use xso_core::ir::SchemaModel;
use xso_core::{CodeGenerator, GeneratedFile, GeneratorError};

use crate::context::GenerationContext;
use crate::emitters;
use crate::emitters::module_path;

/// Odoo model generator.
///
/// Collects names, inverses and schema facts over the whole bundle, then
/// renders one Python module per output module.
#[derive(Debug, Clone, Default)]
pub struct OdooGenerator {
    schema_dir: Option<PathBuf>,
}

impl OdooGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative schema locations against `dir`.
    pub fn with_schema_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: Some(dir.into()),
        }
    }
}

impl CodeGenerator for OdooGenerator {
    fn generate(
        &self,
        model: &SchemaModel,
        config: &XsoConfig,
    ) -> Result<Vec<GeneratedFile>, GeneratorError> {
        let ctx = GenerationContext::collect(model, config, self.schema_dir.as_deref())?;
        let env = emitters::module::environment()?;

        let mut files = Vec::new();
        for (module, roots) in &ctx.modules {
            let Some(content) = emitters::module::emit_module(&env, &ctx, module, roots)? else {
                continue;
            };
            files.push(GeneratedFile {
                path: module_path(module),
                title: module.clone(),
                content,
            });
        }

        info!("rendered {} of {} modules", files.len(), ctx.modules.len());
        Ok(files)
    }
}
