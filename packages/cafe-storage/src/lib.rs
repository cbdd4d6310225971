pub mod descriptor;
pub mod flat;
pub mod ledger;
pub mod menu_index;
pub mod writer;

mod error;

pub use error::Error;
pub use menu_index::MenuIndex;

pub type Result<T, E = Error> = std::result::Result<T, E>;
