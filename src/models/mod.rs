pub mod analysis;
pub mod export;
pub mod repository;

pub use analysis::*;
pub use export::*;
pub use repository::*;
