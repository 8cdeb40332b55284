pub mod dashboard;
pub mod error;
pub mod traits;
pub mod types;

pub use dashboard::*;
pub use error::*;
pub use traits::*;
pub use types::*;
