use crate::component::PartitionKeyComponent;
#[cfg(feature = "serde")]
use crate::epk::EpkError;

/// Logical partition key value: one component per partition key path, in
/// path order. An empty key addresses no particular partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionKey {
    components: Vec<PartitionKeyComponent>,
}

impl PartitionKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key whose single value is JSON `null`.
    pub fn null() -> Self {
        Self::new().append_null()
    }

    /// Key for documents that lack the partition key property.
    pub fn undefined() -> Self {
        Self::new().append_undefined()
    }

    pub fn append_string(self, value: impl Into<String>) -> Self {
        self.append(PartitionKeyComponent::String(value.into()))
    }

    pub fn append_number(self, value: f64) -> Self {
        self.append(PartitionKeyComponent::Number(value))
    }

    pub fn append_bool(self, value: bool) -> Self {
        self.append(PartitionKeyComponent::Bool(value))
    }

    pub fn append_null(self) -> Self {
        self.append(PartitionKeyComponent::Null)
    }

    pub fn append_undefined(self) -> Self {
        self.append(PartitionKeyComponent::Undefined)
    }

    pub fn append(mut self, component: impl Into<PartitionKeyComponent>) -> Self {
        self.components.push(component.into());
        self
    }

    #[inline]
    pub fn components(&self) -> &[PartitionKeyComponent] {
        &self.components
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// JSON array form, `undefined` written as `{}`.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, EpkError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Accepts an array of scalars or a bare scalar.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, EpkError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::try_from(&value)
    }
}

impl From<PartitionKeyComponent> for PartitionKey {
    fn from(component: PartitionKeyComponent) -> Self {
        Self {
            components: vec![component],
        }
    }
}

impl From<Vec<PartitionKeyComponent>> for PartitionKey {
    fn from(components: Vec<PartitionKeyComponent>) -> Self {
        Self { components }
    }
}

impl FromIterator<PartitionKeyComponent> for PartitionKey {
    fn from_iter<I: IntoIterator<Item = PartitionKeyComponent>>(iter: I) -> Self {
        Self {
            components: iter.into_iter().collect(),
        }
    }
}

macro_rules! single_component_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for PartitionKey {
                fn from(value: $t) -> Self {
                    Self::from(PartitionKeyComponent::from(value))
                }
            }
        )*
    };
}

single_component_from!(&str, String, f64, i64, i32, bool);

#[cfg(feature = "serde")]
mod json {
    use super::PartitionKey;
    use crate::component::PartitionKeyComponent;
    use crate::epk::EpkError;
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    impl Serialize for PartitionKey {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(self.components.len()))?;
            for component in &self.components {
                seq.serialize_element(component)?;
            }
            seq.end()
        }
    }

    impl<'de> Deserialize<'de> for PartitionKey {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let value = Value::deserialize(deserializer)?;
            PartitionKey::try_from(&value).map_err(D::Error::custom)
        }
    }

    impl TryFrom<&Value> for PartitionKey {
        type Error = EpkError;

        fn try_from(value: &Value) -> Result<Self, Self::Error> {
            match value {
                Value::Array(items) => items.iter().map(PartitionKeyComponent::try_from).collect(),
                scalar => PartitionKeyComponent::try_from(scalar).map(PartitionKey::from),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_order() {
        let key = PartitionKey::new()
            .append_string("tenant")
            .append_number(2.0)
            .append_bool(false)
            .append_null()
            .append_undefined();
        assert_eq!(
            key.components(),
            [
                PartitionKeyComponent::from("tenant"),
                PartitionKeyComponent::Number(2.0),
                PartitionKeyComponent::Bool(false),
                PartitionKeyComponent::Null,
                PartitionKeyComponent::Undefined,
            ]
        );
        assert_eq!(key.len(), 5);
    }

    #[test]
    fn scalar_conversions() {
        assert_eq!(PartitionKey::from(7i64), PartitionKey::from(7.0));
        assert_eq!(PartitionKey::from("x"), PartitionKey::from(String::from("x")));
        assert_eq!(PartitionKey::null().components(), [PartitionKeyComponent::Null]);
        assert_eq!(
            PartitionKey::undefined().components(),
            [PartitionKeyComponent::Undefined]
        );
        assert!(PartitionKey::new().is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip() {
        let key = PartitionKey::from("a")
            .append_number(1.0)
            .append_null()
            .append_undefined()
            .append_bool(true);
        let json = key.to_json().unwrap();
        assert_eq!(json, r#"["a",1,null,{},true]"#);
        assert_eq!(PartitionKey::from_json(&json).unwrap(), key);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_bare_scalar_is_single_component() {
        assert_eq!(
            PartitionKey::from_json(r#""abc""#).unwrap(),
            PartitionKey::from("abc")
        );
        assert_eq!(PartitionKey::from_json("[]").unwrap(), PartitionKey::new());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_rejects_nested_values() {
        assert!(matches!(
            PartitionKey::from_json(r#"["a", ["b"]]"#),
            Err(EpkError::UnsupportedValue(_))
        ));
        assert!(matches!(
            PartitionKey::from_json(r#"{"a": 1}"#),
            Err(EpkError::UnsupportedValue(_))
        ));
        assert!(matches!(
            PartitionKey::from_json("[1,"),
            Err(EpkError::Json(_))
        ));

        let err = serde_json::from_str::<PartitionKey>(r#"[[1]]"#).unwrap_err();
        assert!(err.to_string().contains("unsupported partition key value"));
    }
}
