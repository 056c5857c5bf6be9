pub mod collaborator;
pub mod project;
pub mod settings;
pub mod toast;
pub mod upload;
pub mod user;

pub use collaborator::*;
pub use project::*;
pub use settings::*;
pub use toast::*;
pub use upload::*;
pub use user::*;
