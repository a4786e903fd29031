mod detect;
mod match_user_agent;
mod project_properties;
mod resolve_profiles;

pub use detect::{detect, DetectDeviceUseCase};
pub use match_user_agent::match_user_agent;
pub use project_properties::project_properties;
pub use resolve_profiles::resolve_profiles;
