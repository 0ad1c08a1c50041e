use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{Address, Bytes};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Standard ERC20 interface, used when no interface file is configured
const ERC20_ABI: &str = include_str!("../../abi/erc20.json");

#[derive(Debug, Error)]
pub enum BindingError {
    #[error("Invalid interface description: {0}")]
    InvalidAbi(String),

    #[error("Failed to read interface file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Method {0} not found in contract interface")]
    UnknownMethod(String),

    #[error("Failed to encode {method} call: {reason}")]
    Encode { method: String, reason: String },

    #[error("Failed to decode {method} result: {reason}")]
    Decode { method: String, reason: String },
}

/// A deployed contract: its address plus its ABI
#[derive(Debug, Clone)]
pub struct ContractBinding {
    address: Address,
    abi: JsonAbi,
}

impl ContractBinding {
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }

    /// Parse a JSON ABI (the `[{"type": "function", ...}]` descriptor list)
    pub fn from_json(address: Address, json: &str) -> Result<Self, BindingError> {
        let abi: JsonAbi =
            serde_json::from_str(json).map_err(|e| BindingError::InvalidAbi(e.to_string()))?;
        Ok(Self::new(address, abi))
    }

    pub fn from_file(address: Address, path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| BindingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded contract interface");
        Self::from_json(address, &json)
    }

    /// Binding against the bundled ERC20 interface
    pub fn erc20(address: Address) -> Result<Self, BindingError> {
        Self::from_json(address, ERC20_ABI)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.abi.function(method).is_some_and(|f| !f.is_empty())
    }

    /// Fail unless every named method exists in the interface.
    pub fn require_methods(&self, methods: &[&str]) -> Result<(), BindingError> {
        match methods.iter().find(|m| !self.has_method(m)) {
            Some(missing) => Err(BindingError::UnknownMethod(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Resolve an overload by argument count
    fn function(&self, method: &str, arity: Option<usize>) -> Result<&Function, BindingError> {
        let overloads = self
            .abi
            .function(method)
            .ok_or_else(|| BindingError::UnknownMethod(method.to_string()))?;

        overloads
            .iter()
            .find(|f| arity.is_none_or(|n| f.inputs.len() == n))
            .ok_or_else(|| BindingError::Encode {
                method: method.to_string(),
                reason: format!("no overload takes {} arguments", arity.unwrap_or_default()),
            })
    }

    /// Selector-prefixed call data for `method(args...)`
    pub fn encode_call(&self, method: &str, args: &[DynSolValue]) -> Result<Bytes, BindingError> {
        let function = self.function(method, Some(args.len()))?;
        function
            .abi_encode_input(args)
            .map(Bytes::from)
            .map_err(|e| BindingError::Encode {
                method: method.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn decode_result(
        &self,
        method: &str,
        data: &[u8],
    ) -> Result<Vec<DynSolValue>, BindingError> {
        let function = self.function(method, None)?;
        function
            .abi_decode_output(data)
            .map_err(|e| BindingError::Decode {
                method: method.to_string(),
                reason: e.to_string(),
            })
    }
}
