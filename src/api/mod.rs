pub mod caller;
pub mod rest;
