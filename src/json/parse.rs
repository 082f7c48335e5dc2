//! Purpose: Provide the encode/decode entrypoints of the codec collaborator.
//! Exports: `from_slice`, `to_vec`, `encode`, `decode`.
//! Role: Typed values go through a `serde_json::Value` tree so the container can
//! splice the discriminator and merge patches before a variant sees its fields.
//! Notes: Error mapping is done by callsites so variant context stays explicit.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn from_slice(input: &[u8]) -> Result<Value, serde_json::Error> {
    serde_json::from_slice(input)
}

pub(crate) fn to_vec(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    serde_json::to_value(value)
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}
