mod activity;
mod membership;
mod organization;
mod project;

pub use activity::ActivityService;
pub use organization::OrganizationService;
pub use project::ProjectService;
