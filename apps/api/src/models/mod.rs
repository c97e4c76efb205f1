pub mod limits;
pub mod tenant;
pub mod user;
