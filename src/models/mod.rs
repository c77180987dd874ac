pub mod member;
pub mod membership;
pub mod project;
