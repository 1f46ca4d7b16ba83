//! Database connection helpers and the demo entities the service layer is
//! exercised against.

pub mod db;
pub mod schema;
pub mod team;
pub mod player;
