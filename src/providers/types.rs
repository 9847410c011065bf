pub mod conversation;
pub mod objectid;
