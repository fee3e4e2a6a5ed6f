//! Type definitions

pub mod ids;
pub mod primitives;
pub mod report;
pub mod request;
pub mod scenario;
pub mod stop;

pub use ids::*;
pub use primitives::*;
pub use report::*;
pub use request::*;
pub use scenario::*;
pub use stop::*;
