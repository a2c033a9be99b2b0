//! Built-in integration modules.
//!
//! Each module declares its parameter table once and exposes a typed view
//! over one instance (default or named).

pub mod jdbc;
pub mod ollama;

use crate::error::Result;
use crate::registry::ConfigRegistry;
use crate::source::LocateOptions;
use crate::table::ModuleParameterTable;

/// Register every instance any source configures for `table`, locate the
/// module's fallback file, and load the default instance's values.
///
/// Returns the discovered instance prefixes.
pub fn bootstrap(
    registry: &ConfigRegistry,
    table: &mut ModuleParameterTable,
    options: &LocateOptions,
) -> Result<Vec<String>> {
    registry.locate_file(table.module(), options)?;
    let prefixes: Vec<String> = registry.named_prefixes(table).into_iter().collect();
    for prefix in &prefixes {
        table.register(Some(prefix));
    }
    let loaded = table.load_overrides(registry, None);
    tracing::debug!(
        "Bootstrapped module {}: {loaded} default values, instances {prefixes:?}",
        table.module().name()
    );
    Ok(prefixes)
}
