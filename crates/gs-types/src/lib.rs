pub mod errors;
pub mod params;
pub mod state;

pub use errors::*;
pub use params::*;
pub use state::*;
