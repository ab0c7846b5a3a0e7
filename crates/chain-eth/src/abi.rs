//! JSON ABI descriptions and dynamically typed ABI values.
//!
//! Only the *description* side of the ABI lives here: which functions a
//! contract exposes, their parameter types and mutability. Turning a call
//! into calldata is left to the wallet backend.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::error::EthError;

/// A named, typed function or event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

impl AbiParam {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ty.to_string(),
            components: Vec::new(),
            indexed: None,
        }
    }

    /// Canonical type string, with tuples expanded into `(a,b)` form.
    pub fn canonical_type(&self) -> String {
        match self.ty.strip_prefix("tuple") {
            Some(suffix) => {
                let inner: Vec<String> =
                    self.components.iter().map(AbiParam::canonical_type).collect();
                format!("({}){}", inner.join(","), suffix)
            }
            None => self.ty.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    Nonpayable,
    Payable,
}

/// A callable contract function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiFunction {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(default)]
    pub state_mutability: StateMutability,
}

impl AbiFunction {
    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(AbiParam::canonical_type).collect();
        format!("{}({})", self.name, inputs.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub anonymous: bool,
}

/// One entry of a JSON ABI array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiItem {
    Function(AbiFunction),
    Event(AbiEvent),
    Error {
        name: String,
        #[serde(default)]
        inputs: Vec<AbiParam>,
    },
    Constructor {
        #[serde(default)]
        inputs: Vec<AbiParam>,
        #[serde(default, rename = "stateMutability")]
        state_mutability: StateMutability,
    },
    Fallback {
        #[serde(default, rename = "stateMutability")]
        state_mutability: StateMutability,
    },
    Receive {
        #[serde(default, rename = "stateMutability")]
        state_mutability: StateMutability,
    },
}

/// A contract interface description, as found in compiler JSON output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Abi(Vec<AbiItem>);

impl Abi {
    pub fn new(items: Vec<AbiItem>) -> Self {
        Self(items)
    }

    /// Parses a standard JSON ABI array.
    pub fn from_json(json: &str) -> Result<Self, EthError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn items(&self) -> &[AbiItem] {
        &self.0
    }

    pub fn functions(&self) -> impl Iterator<Item = &AbiFunction> {
        self.0.iter().filter_map(|item| match item {
            AbiItem::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Looks up a function by name. Overloads resolve to the first entry
    /// whose arity matches `arg_count`, falling back to the first by name.
    pub fn function(&self, name: &str, arg_count: usize) -> Option<&AbiFunction> {
        let mut named = self.functions().filter(|f| f.name == name).peekable();
        let first = named.peek().copied();
        named.find(|f| f.inputs.len() == arg_count).or(first)
    }

    pub fn events(&self) -> impl Iterator<Item = &AbiEvent> {
        self.0.iter().filter_map(|item| match item {
            AbiItem::Event(e) => Some(e),
            _ => None,
        })
    }
}

/// A dynamically typed ABI argument or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
    Bytes(Bytes),
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Narrowing accessor for small integers such as `decimals()`.
    pub fn as_u8(&self) -> Option<u8> {
        self.as_uint().and_then(|v| u8::try_from(v).ok())
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            AbiValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AbiValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Shallow type check of a value against a declared parameter.
    pub fn matches(&self, param: &AbiParam) -> bool {
        let ty = param.ty.as_str();
        if ty.ends_with(']') {
            return matches!(self, AbiValue::Array(_));
        }
        match self {
            AbiValue::Address(_) => ty == "address",
            AbiValue::Uint(_) => ty.starts_with("uint") || ty.starts_with("int"),
            AbiValue::Bool(_) => ty == "bool",
            AbiValue::String(_) => ty == "string",
            AbiValue::Bytes(_) => ty.starts_with("bytes"),
            AbiValue::Tuple(values) => {
                ty == "tuple"
                    && values.len() == param.components.len()
                    && values.iter().zip(&param.components).all(|(v, p)| v.matches(p))
            }
            AbiValue::Array(_) => false,
        }
    }
}

impl From<Address> for AbiValue {
    fn from(a: Address) -> Self {
        AbiValue::Address(a)
    }
}

impl From<U256> for AbiValue {
    fn from(v: U256) -> Self {
        AbiValue::Uint(v)
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        AbiValue::Uint(U256::from(v))
    }
}

impl From<bool> for AbiValue {
    fn from(b: bool) -> Self {
        AbiValue::Bool(b)
    }
}

impl From<&str> for AbiValue {
    fn from(s: &str) -> Self {
        AbiValue::String(s.to_string())
    }
}
