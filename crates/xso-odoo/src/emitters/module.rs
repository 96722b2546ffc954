use std::collections::{BTreeSet, HashSet};

use indexmap::IndexMap;
use log::{debug, info, warn};
use minijinja::{Environment, context};
use xso_core::GeneratorError;
use xso_core::ir::ClassId;
use xso_core::transform::{ClassOccurrence, ClassRenderContext, class_occurrences};

use crate::context::{GenerationContext, MAX_SKIPPED_CLASSES};
use crate::docstring::{class_description, clean_docstring, wrap_text};
use crate::emitters::enums::{enum_doc, enum_skip};
use crate::field_mapper::{FieldDefinition, FieldMapper, FieldMapping, constant_name};
use crate::kwargs::{Kwargs, PyValue, escape_str};
use crate::type_mapper::FieldKind;

const TEMPLATE: &str = "module.py.j2";

fn render_error(err: minijinja::Error) -> GeneratorError {
    GeneratorError::Render(err.to_string())
}

/// Template environment for Python modules.
pub fn environment() -> Result<Environment<'static>, GeneratorError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.add_filter("pystr", |value: String| escape_str(&value));
    env.add_template(TEMPLATE, include_str!("../../templates/module.py.j2"))
        .map_err(render_error)?;
    Ok(env)
}

/// Render the Python module holding the classes under `roots`.
///
/// Returns `None` when the module is dropped: too many of its classes are
/// skipped, or nothing is left to render.
pub fn emit_module(
    env: &Environment<'_>,
    ctx: &GenerationContext,
    module: &str,
    roots: &[ClassId],
) -> Result<Option<String>, GeneratorError> {
    let occurrences = class_occurrences(&ctx.forest, roots);
    let (skipped, kept): (Vec<&ClassOccurrence>, Vec<&ClassOccurrence>) =
        occurrences.iter().partition(|occ| ctx.is_skipped(occ));

    if skipped.len() > MAX_SKIPPED_CLASSES {
        info!("dropping module {module}: {} skipped classes", skipped.len());
        return Ok(None);
    }
    if kept.is_empty() {
        info!("dropping module {module}: nothing to render");
        return Ok(None);
    }

    let enums = enums_ctx(ctx, &kept);
    let mut imports = ImportSet::default();
    let models: Vec<minijinja::Value> = kept
        .iter()
        .filter(|occ| ctx.types.is_complex(occ.id))
        .filter_map(|occ| model_ctx(ctx, module, occ, &mut imports))
        .collect();

    let tmpl = env.get_template(TEMPLATE).map_err(render_error)?;
    let mut content = tmpl
        .render(context! {
            imports => imports.into_ctx(),
            enums => enums,
            models => models,
            python_inherit => ctx.settings.python_inherit.clone(),
            inherit_model => ctx.settings.inherit_model.clone(),
        })
        .map_err(render_error)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }
    Ok(Some(content))
}

fn enums_ctx(ctx: &GenerationContext, kept: &[&ClassOccurrence]) -> Vec<minijinja::Value> {
    let mut constants = HashSet::new();
    let mut enums = Vec::new();

    for occ in kept.iter().filter(|occ| ctx.types.is_simple(occ.id)) {
        let Some(entry) = ctx.names.get(occ) else {
            warn!("no registry name for enumeration {}", occ.key());
            continue;
        };
        let constant = constant_name(ctx, entry);
        if !constants.insert(constant.clone()) {
            continue;
        }

        let class = ctx.forest.get(occ.id);
        let doc = enum_doc(ctx, class);
        let kept_values: HashSet<&str> = enum_skip(doc.items.iter().map(|i| i.value.as_str()))
            .into_iter()
            .collect();
        let mut emitted = HashSet::new();
        let items: Vec<minijinja::Value> = doc
            .items
            .iter()
            .filter(|item| kept_values.contains(item.value.as_str()))
            .filter(|item| emitted.insert(item.value.as_str()))
            .map(|item| {
                context! {
                    value => item.value.clone(),
                    label => item.label.clone(),
                }
            })
            .collect();
        if items.len() < doc.items.len() {
            debug!("{constant}: dropped {} duplicate values", doc.items.len() - items.len());
        }

        enums.push(context! {
            constant => constant,
            items => items,
            docstring => doc.help.as_deref().map(|h| wrap_text(h, 0, 79)).unwrap_or_default(),
        });
    }

    enums
}

fn model_ctx(
    ctx: &GenerationContext,
    module: &str,
    occ: &ClassOccurrence,
    imports: &mut ImportSet,
) -> Option<minijinja::Value> {
    let key = occ.key();
    let Some(entry) = ctx.names.get(occ) else {
        warn!("no registry name for class {key}, not rendered");
        return None;
    };
    let class = ctx.forest.get(occ.id);

    let docstring = clean_docstring(ctx.xsd_info.documentation(class));
    let description = class_description(&class.name, !docstring.is_empty());

    let mut fields: Vec<String> = ctx
        .inverses
        .get(&entry.registry_name)
        .iter()
        .map(|inverse| implicit_many2one(&inverse.field_name, &inverse.parent).to_string())
        .collect();

    let mapper = FieldMapper::new(ctx, occ);
    let mut render = ClassRenderContext::new();
    for attr in &class.attributes {
        let mapping = mapper.map_field(attr, &mut render);
        if let FieldMapping::Field(def) = &mapping
            && let Some(target) = def.selection
        {
            imports.add_selection(ctx, module, target, &occ.lineage);
        }
        fields.extend(mapping.render());
    }

    Some(context! {
        class_name => entry.python_class_name(),
        docstring => docstring,
        description => description,
        registry_name => entry.registry_name.clone(),
        binding_type => key,
        fields => fields,
    })
}

/// The parent link injected into the target of a one-to-many.
pub fn implicit_many2one(field_name: &str, parent: &str) -> FieldDefinition {
    let mut kwargs = Kwargs::new();
    kwargs.insert("comodel_name", PyValue::str(parent));
    kwargs.insert("xsd_implicit", PyValue::Bool(true));
    kwargs.insert("ondelete", PyValue::str("cascade"));
    FieldDefinition {
        name: field_name.to_string(),
        kind: FieldKind::Many2one,
        positional: Vec::new(),
        kwargs,
        selection: None,
    }
}

/// Selection constants imported from sibling modules.
#[derive(Debug, Default)]
struct ImportSet {
    modules: IndexMap<String, BTreeSet<String>>,
}

impl ImportSet {
    fn add_selection(
        &mut self,
        ctx: &GenerationContext,
        module: &str,
        target: ClassId,
        from: &[ClassId],
    ) {
        let Some(entry) = ctx.names.for_reference(target, from) else {
            return;
        };
        let Some(defined_in) = ctx.module_of.get(&entry.class) else {
            debug!("enumeration {} is not rendered in any module", entry.unique_path);
            return;
        };
        if defined_in == module {
            return;
        }
        self.modules
            .entry(relative_import(module, defined_in))
            .or_default()
            .insert(constant_name(ctx, entry));
    }

    fn into_ctx(self) -> Vec<minijinja::Value> {
        self.modules
            .into_iter()
            .map(|(module, names)| {
                context! {
                    module => module,
                    names => names.into_iter().collect::<Vec<_>>(),
                }
            })
            .collect()
    }
}

/// Relative import path of module `to` from module `from`, both dotted.
pub fn relative_import(from: &str, to: &str) -> String {
    let from_parts: Vec<&str> = from.split('.').collect();
    let package = &from_parts[..from_parts.len().saturating_sub(1)];
    let to_parts: Vec<&str> = to.split('.').collect();

    let common = package
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count()
        .min(to_parts.len().saturating_sub(1));
    let dots = ".".repeat(1 + package.len() - common);
    format!("{dots}{}", to_parts[common..].join("."))
}
