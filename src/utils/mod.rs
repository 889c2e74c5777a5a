pub mod location;
pub mod validation;
