//! Process-wide default container
//!
//! Set once at the composition root with [`init`]; everything else should
//! receive its [`Container`] explicitly. Nothing here creates a container
//! lazily.

use once_cell::sync::OnceCell;
use tracing::info;

use crate::{Container, DIError, DIResult};

static DEFAULT: OnceCell<Container> = OnceCell::new();

/// Install the default container. Fails if one is already installed.
pub fn init(container: Container) -> DIResult<()> {
    DEFAULT
        .set(container)
        .map_err(|_| DIError::GlobalAlreadyInitialized)?;
    info!("Default container initialized");
    Ok(())
}

/// The default container, if [`init`] has been called
pub fn container() -> Option<&'static Container> {
    DEFAULT.get()
}

pub fn is_initialized() -> bool {
    DEFAULT.get().is_some()
}
