pub mod books;
pub mod users;

use bookmate_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every application module, in mount order.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(books::create_module(state.clone()))?;
    registry.register(users::create_module(state.clone()))?;
    Ok(())
}
