//! Contract Interface Binding
//!
//! Encodes and decodes calls against a contract whose interface is supplied
//! at runtime as a JSON ABI.

pub mod binding;

pub use binding::{BindingError, ContractBinding};
