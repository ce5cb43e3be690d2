mod handle;
mod manager;

pub use handle::AccountHandle;
pub use manager::AccountManager;
