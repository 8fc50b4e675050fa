//! Schema codecs: validate an untyped value into the typed state shape.
//!
//! The store never interprets the schema itself. Anything implementing
//! [`Codec`] can gate loads and saves; [`SerdeCodec`] derives the schema from a
//! type's `Deserialize` impl and reports the failing field path.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::DecodeError;

/// Validator for a declared state shape.
pub trait Codec<S> {
    /// Decode an untyped value, or report which field failed.
    fn decode(&self, value: &Value) -> Result<S, DecodeError>;

    /// Render a typed value back into the untyped form.
    fn encode(&self, state: &S) -> Result<Value, DecodeError>;
}

/// Codec backed by the state type's serde impls.
///
/// Optional fields are `Option<T>` with `#[serde(default)]`; unknown fields are
/// accepted unless the type opts into `deny_unknown_fields`.
pub struct SerdeCodec<S> {
    _shape: PhantomData<fn() -> S>,
}

impl<S> SerdeCodec<S> {
    pub fn new() -> Self {
        Self {
            _shape: PhantomData,
        }
    }
}

impl<S> Default for SerdeCodec<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for SerdeCodec<S> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for SerdeCodec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerdeCodec<{}>", std::any::type_name::<S>())
    }
}

impl<S: Serialize + DeserializeOwned> Codec<S> for SerdeCodec<S> {
    fn decode(&self, value: &Value) -> Result<S, DecodeError> {
        serde_path_to_error::deserialize(value)
            .map_err(|e| DecodeError::new(e.path().to_string(), e.inner().to_string()))
    }

    fn encode(&self, state: &S) -> Result<Value, DecodeError> {
        serde_json::to_value(state).map_err(|e| DecodeError::at_root(e.to_string()))
    }
}

/// A codec with an extra check run after a successful decode.
///
/// Built with [`CodecExt::refine`].
pub struct Refined<C, F> {
    inner: C,
    check: F,
}

impl<S, C, F> Codec<S> for Refined<C, F>
where
    C: Codec<S>,
    F: Fn(&S) -> Result<(), DecodeError>,
{
    fn decode(&self, value: &Value) -> Result<S, DecodeError> {
        let state = self.inner.decode(value)?;
        (self.check)(&state)?;
        Ok(state)
    }

    fn encode(&self, state: &S) -> Result<Value, DecodeError> {
        self.inner.encode(state)
    }
}

/// Combinators available on every codec.
pub trait CodecExt<S>: Codec<S> + Sized {
    /// Narrow the codec with a predicate over the decoded value.
    fn refine<F>(self, check: F) -> Refined<Self, F>
    where
        F: Fn(&S) -> Result<(), DecodeError>,
    {
        Refined { inner: self, check }
    }
}

impl<S, C: Codec<S>> CodecExt<S> for C {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Fish {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dog: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Kind {
        fish: Fish,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        time: f64,
        #[serde(rename = "type")]
        kind: Kind,
    }

    fn codec() -> SerdeCodec<Sample> {
        SerdeCodec::new()
    }

    #[test]
    fn decode_valid_value() {
        let sample = codec()
            .decode(&json!({ "time": 2, "type": { "fish": { "dog": "dog" } } }))
            .unwrap();
        assert_eq!(sample.time, 2.0);
        assert_eq!(sample.kind.fish.dog.as_deref(), Some("dog"));
    }

    #[test]
    fn decode_optional_field_absent() {
        let sample = codec()
            .decode(&json!({ "time": 2, "type": { "fish": {} } }))
            .unwrap();
        assert_eq!(sample.kind.fish.dog, None);
    }

    #[test]
    fn decode_reports_nested_field() {
        let err = codec()
            .decode(&json!({ "time": 2, "type": { "fish": { "dog": 3 } } }))
            .unwrap_err();
        assert_eq!(err.path, "type.fish.dog");
        assert!(err.message.contains("expected a string"), "{}", err.message);
    }

    #[test]
    fn decode_reports_wrong_primitive() {
        let err = codec()
            .decode(&json!({ "time": "soon", "type": { "fish": {} } }))
            .unwrap_err();
        assert_eq!(err.path, "time");
    }

    #[test]
    fn decode_reports_missing_field() {
        let err = codec().decode(&json!({ "time": 2 })).unwrap_err();
        assert!(err.message.contains("missing field `type`"), "{}", err.message);
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let sample = Sample {
            time: 3.5,
            kind: Kind {
                fish: Fish { dog: None },
            },
        };
        let value = codec().encode(&sample).unwrap();
        assert_eq!(value, json!({ "time": 3.5, "type": { "fish": {} } }));
        assert_eq!(codec().decode(&value).unwrap(), sample);
    }

    #[test]
    fn refined_codec_runs_check_after_decode() {
        let refined = codec().refine(|s: &Sample| {
            if s.time >= 0.0 {
                Ok(())
            } else {
                Err(DecodeError::new("time", "must not be negative"))
            }
        });

        assert!(refined.decode(&json!({ "time": 1, "type": { "fish": {} } })).is_ok());
        let err = refined
            .decode(&json!({ "time": -1, "type": { "fish": {} } }))
            .unwrap_err();
        assert_eq!(err, DecodeError::new("time", "must not be negative"));
    }
}
