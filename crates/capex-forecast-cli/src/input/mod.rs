pub mod file;
pub mod register;
pub mod stdin;
