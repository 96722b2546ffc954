pub mod enums;
pub mod module;

/// Output file of a dotted module path: `nfe.v4_00.leiaute` →
/// `nfe/v4_00/leiaute.py`.
pub fn module_path(module: &str) -> String {
    format!("{}.py", module.replace('.', "/"))
}
