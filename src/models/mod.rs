pub mod enums;
pub mod refinement;
pub mod response;
pub mod task;

pub use enums::*;
pub use refinement::*;
pub use response::*;
pub use task::*;
