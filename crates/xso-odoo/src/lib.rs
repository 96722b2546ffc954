pub mod context;
pub mod docstring;
pub mod emitters;
pub mod field_mapper;
pub mod generator;
pub mod kwargs;
pub mod type_mapper;

pub use context::GenerationContext;
pub use generator::OdooGenerator;
