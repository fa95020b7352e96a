pub mod model;
pub mod session;

pub use model::{ModelSpec, YoloConfig};
pub use session::YoloSession;
