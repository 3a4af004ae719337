//! Skill service integration.

pub mod client;

pub use client::{HttpSkillDataClient, SkillDataClient};
