pub mod checker;
pub mod result;
pub mod typing;
