pub mod activity;
pub mod address;
pub mod following;
pub mod organization;
pub mod project;
pub mod trackable;
pub mod user;

pub use activity::{Activity, Attachment};
pub use address::{Address, AddressOwner};
pub use following::{Following, FollowingKey};
pub use organization::Organization;
pub use project::Project;
pub use trackable::{Trackable, TrackableKind};
pub use user::{Role, User};
