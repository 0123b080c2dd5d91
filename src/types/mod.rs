pub mod checkpoint;
pub mod conflict;
pub mod context;
pub mod decision;
pub mod errors;
pub mod ids;
pub mod manifest;
pub mod plan;
pub mod report;
pub mod safepath;

pub use checkpoint::*;
pub use conflict::*;
pub use context::*;
pub use decision::*;
pub use errors::*;
pub use ids::*;
pub use manifest::*;
pub use plan::*;
pub use report::*;
pub use safepath::*;
