//! Schema attributes to Odoo field definitions.

use std::fmt;

use log::warn;
use xso_core::ir::{ClassId, SchemaAttribute, SchemaClass, TypeReference};
use xso_core::transform::inverse::one2many_target;
use xso_core::transform::labels::extract_label;
use xso_core::transform::name_resolver::{RegistryEntry, class_name};
use xso_core::transform::{ClassOccurrence, ClassRenderContext, NumericKind};

use crate::context::GenerationContext;
use crate::kwargs::{Kwargs, PyValue};
use crate::type_mapper::{DATE_TYPES, DATETIME_TYPES, DatatypeFamily, FieldKind, datatype_family};

/// A rendered field: `name = fields.Kind(positional..., key=value...)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub kind: FieldKind,
    pub positional: Vec<PyValue>,
    pub kwargs: Kwargs,
    /// Enumeration behind a selection field.
    pub selection: Option<ClassId>,
}

impl fmt::Display for FieldDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = fields.{}(", self.name, self.kind)?;
        for (i, arg) in self.positional.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        if !self.positional.is_empty() && !self.kwargs.is_empty() {
            f.write_str(", ")?;
        }
        write!(f, "{})", self.kwargs)
    }
}

/// Outcome of mapping one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMapping {
    Field(FieldDefinition),
    /// Nothing to emit.
    Skipped,
    /// Problem left in the generated source for manual follow-up.
    Diagnostic { field: String, message: String },
}

impl FieldMapping {
    /// The generated source line, `None` when skipped.
    pub fn render(&self) -> Option<String> {
        match self {
            FieldMapping::Field(def) => Some(def.to_string()),
            FieldMapping::Skipped => None,
            FieldMapping::Diagnostic { field, message } => {
                Some(format!("# FIXME {field}: {message}"))
            }
        }
    }
}

/// Maps the attributes of one class occurrence.
pub struct FieldMapper<'a> {
    ctx: &'a GenerationContext,
    occurrence: &'a ClassOccurrence,
    class: &'a SchemaClass,
    parents: Vec<&'a str>,
}

impl<'a> FieldMapper<'a> {
    pub fn new(ctx: &'a GenerationContext, occurrence: &'a ClassOccurrence) -> Self {
        Self {
            ctx,
            occurrence,
            class: ctx.forest.get(occurrence.id),
            parents: ctx.parents(occurrence),
        }
    }

    /// Map one attribute of the class. Labels are deduplicated through
    /// `render`, which lives as long as the class being rendered.
    pub fn map_field(
        &self,
        attr: &SchemaAttribute,
        render: &mut ClassRenderContext,
    ) -> FieldMapping {
        let ctx = self.ctx;
        let class = self.class;

        if ctx.skip.matches(&attr.name, &self.parents) {
            return FieldMapping::Skipped;
        }

        if attr.types.len() > 1 {
            warn!(
                "union types are not supported, using the first one: class {} attr {}",
                class.name, attr.name
            );
        }
        if attr.tokens {
            warn!("token lists are not supported: class {} attr {}", class.name, attr.name);
        }
        if attr.map_like {
            warn!(
                "map-like attributes are not supported: class {} attr {}",
                class.name, attr.name
            );
        }

        let name = ctx.naming.field_name(&attr.name);
        let Some(ty) = attr.primary_type() else {
            warn!("attribute without type: class {} attr {}", class.name, attr.name);
            let message = format!("No type! class: {} attr: {}", class.name, attr.name);
            return self.diagnostic(name, message);
        };

        let kwargs = self.field_attributes(attr, render);

        match ty {
            TypeReference::Datatype(code) => self.simple_field(name, attr, code, kwargs),
            TypeReference::Class(qname) => self.relational_field(name, attr, qname, kwargs),
        }
    }

    /// `string`, `xsd_required`, mined xsd facts, then `help`.
    fn field_attributes(&self, attr: &SchemaAttribute, render: &mut ClassRenderContext) -> Kwargs {
        let ctx = self.ctx;
        let label = extract_label(
            &attr.name,
            attr.documentation.as_deref(),
            &mut render.used_labels,
            &ctx.labels,
        );

        let mut kwargs = Kwargs::new();
        kwargs.insert("string", PyValue::Str(label.string));
        // Marked only: a database constraint would break existing records.
        if attr.is_required() {
            kwargs.insert("xsd_required", PyValue::Bool(true));
        }
        if let Some(info) = ctx.xsd_info.get(self.class, &attr.name) {
            if let Some(xsd_type) = &info.xsd_type {
                kwargs.insert("xsd_type", PyValue::str(xsd_type));
            }
            if let Some(choice) = &info.choice {
                kwargs.insert("choice", PyValue::str(choice));
            }
            if info.xsd_choice_required {
                kwargs.insert("xsd_choice_required", PyValue::Bool(true));
            }
        }
        if let Some(help) = label.help {
            kwargs.insert("help", PyValue::Str(help));
        }
        kwargs
    }

    fn xsd_type(&self, attr: &SchemaAttribute) -> Option<&'a str> {
        self.ctx
            .xsd_info
            .get(self.class, &attr.name)
            .and_then(|info| info.xsd_type.as_deref())
    }

    fn simple_field(
        &self,
        name: String,
        attr: &SchemaAttribute,
        code: &str,
        mut kwargs: Kwargs,
    ) -> FieldMapping {
        let xsd_type = self.xsd_type(attr);
        let family = datatype_family(code);
        let is_any = |types: &[&str]| {
            types.contains(&code) || xsd_type.is_some_and(|t| types.contains(&t))
        };

        let kind = if family == Some(DatatypeFamily::Date) || is_any(DATE_TYPES) {
            FieldKind::Date
        } else if family == Some(DatatypeFamily::Datetime) || is_any(DATETIME_TYPES) {
            FieldKind::Datetime
        } else if family == Some(DatatypeFamily::Integer) {
            FieldKind::Integer
        } else {
            let numeric = match family {
                Some(DatatypeFamily::Float | DatatypeFamily::Char) => {
                    xsd_type.and_then(|t| self.ctx.numeric.classify(&attr.name, t))
                }
                _ => None,
            };
            match (numeric, family) {
                (Some(NumericKind::Monetary), _) => {
                    let currency = PyValue::str(&self.ctx.settings.currency_field);
                    kwargs.insert("currency_field", currency);
                    FieldKind::Monetary
                }
                (Some(NumericKind::Float(digits)), _) => {
                    kwargs.insert(
                        "digits",
                        PyValue::Tuple(vec![
                            PyValue::Int(digits.integer.into()),
                            PyValue::Int(digits.decimal.into()),
                        ]),
                    );
                    FieldKind::Float
                }
                (None, Some(DatatypeFamily::Float)) => FieldKind::Float,
                (None, Some(DatatypeFamily::Char)) => FieldKind::Char,
                (None, Some(DatatypeFamily::Boolean)) => FieldKind::Boolean,
                _ => {
                    warn!(
                        "datatype {code} not implemented: class {} attr {}",
                        self.class.name, attr.name
                    );
                    let message = format!(
                        "{code} not implemented yet! class: {} attr: {}",
                        self.class.name, attr.name
                    );
                    return self.diagnostic(name, message);
                }
            }
        };

        kwargs.move_to_end("help");
        FieldMapping::Field(FieldDefinition {
            name,
            kind,
            positional: Vec::new(),
            kwargs,
            selection: None,
        })
    }

    fn relational_field(
        &self,
        name: String,
        attr: &SchemaAttribute,
        qname: &str,
        mut kwargs: Kwargs,
    ) -> FieldMapping {
        let ctx = self.ctx;
        let class = self.class;
        let target = ctx.forest.lookup(qname);

        if attr.is_list() {
            let o2m = one2many_target(&ctx.forest, &ctx.types, &ctx.skip, &self.parents, attr);
            let Some(target) = o2m else {
                let skipped = target
                    .is_some_and(|t| ctx.skip.matches(&ctx.forest.get(t).name, &self.parents));
                if !skipped {
                    warn!(
                        "no complex type {qname} for list field: class {} attr {}",
                        class.name, attr.name
                    );
                }
                return FieldMapping::Skipped;
            };
            let Some(comodel) = ctx.names.for_reference(target, &self.occurrence.lineage) else {
                return self.missing(name, attr, qname);
            };
            return FieldMapping::Field(FieldDefinition {
                name,
                kind: FieldKind::One2many,
                positional: vec![
                    PyValue::str(&comodel.registry_name),
                    PyValue::Str(ctx.naming.inverse_field_name(&attr.name, &class.name)),
                ],
                kwargs,
                selection: None,
            });
        }

        let Some(target) = target else {
            return self.missing(name, attr, qname);
        };
        if ctx.skip.matches(&ctx.forest.get(target).name, &self.parents) {
            return FieldMapping::Skipped;
        }

        if ctx.types.is_simple(target) {
            let Some(constant) = selection_constant(ctx, target, &self.occurrence.lineage) else {
                return self.missing(name, attr, qname);
            };
            return FieldMapping::Field(FieldDefinition {
                name,
                kind: FieldKind::Selection,
                positional: vec![PyValue::Name(constant)],
                kwargs,
                selection: Some(target),
            });
        }

        if ctx.types.is_complex(target) {
            let Some(comodel) = ctx.names.for_reference(target, &self.occurrence.lineage) else {
                return self.missing(name, attr, qname);
            };
            kwargs.insert("comodel_name", PyValue::str(&comodel.registry_name));
            kwargs.move_to_front("comodel_name");
            return FieldMapping::Field(FieldDefinition {
                name,
                kind: FieldKind::Many2one,
                positional: Vec::new(),
                kwargs,
                selection: None,
            });
        }

        self.missing(name, attr, qname)
    }

    fn missing(&self, name: String, attr: &SchemaAttribute, qname: &str) -> FieldMapping {
        let message = format!(
            "Missing class {qname}! class: {} attr: {}",
            self.class.name, attr.name
        );
        warn!("{message}");
        self.diagnostic(name, message)
    }

    fn diagnostic(&self, field: String, message: String) -> FieldMapping {
        FieldMapping::Diagnostic { field, message }
    }
}

/// Name of the Python constant holding the values of an enumeration
/// occurrence.
pub fn constant_name(ctx: &GenerationContext, entry: &RegistryEntry) -> String {
    let name = &ctx.forest.get(entry.class).name;
    let constant = if entry.unique_path.contains('.') {
        entry.unique_path.replace('.', "_")
    } else if entry.unique_path == class_name(name) {
        name.clone()
    } else {
        // suffixed to stay apart from a same-named class
        entry.unique_path.clone()
    };
    constant.to_uppercase()
}

/// The selection constant of `target` as seen from a class with the given
/// lineage.
pub fn selection_constant(
    ctx: &GenerationContext,
    target: ClassId,
    from: &[ClassId],
) -> Option<String> {
    ctx.names
        .for_reference(target, from)
        .map(|entry| constant_name(ctx, entry))
}
