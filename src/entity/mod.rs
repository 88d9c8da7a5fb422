//! Entity module - SeaORM entity definitions

pub mod group;
pub mod group_member;
pub mod santa_match;
pub mod user;
