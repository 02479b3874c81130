//! Conversions between model attribute values and the AWS SDK's.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as SdkAttributeValue;
use bytes::Bytes;
use dynaquery_model::{AttributeValue, DynamoDBError, Item};

/// Convert a model value into the SDK representation.
#[must_use]
pub fn to_sdk(value: &AttributeValue) -> SdkAttributeValue {
    match value {
        AttributeValue::S(s) => SdkAttributeValue::S(s.clone()),
        AttributeValue::N(n) => SdkAttributeValue::N(n.clone()),
        AttributeValue::B(b) => SdkAttributeValue::B(Blob::new(b.to_vec())),
        AttributeValue::Ss(ss) => SdkAttributeValue::Ss(ss.clone()),
        AttributeValue::Ns(ns) => SdkAttributeValue::Ns(ns.clone()),
        AttributeValue::Bs(bs) => {
            SdkAttributeValue::Bs(bs.iter().map(|b| Blob::new(b.to_vec())).collect())
        }
        AttributeValue::Bool(b) => SdkAttributeValue::Bool(*b),
        AttributeValue::Null(n) => SdkAttributeValue::Null(*n),
        AttributeValue::L(list) => SdkAttributeValue::L(list.iter().map(to_sdk).collect()),
        AttributeValue::M(map) => SdkAttributeValue::M(map_to_sdk(map)),
    }
}

/// Convert an attribute map into the SDK representation.
#[must_use]
pub fn map_to_sdk(map: &HashMap<String, AttributeValue>) -> HashMap<String, SdkAttributeValue> {
    map.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect()
}

/// Convert an SDK value into the model representation.
///
/// Fails on variants this SDK version does not know how to describe.
pub fn from_sdk(value: &SdkAttributeValue) -> Result<AttributeValue, DynamoDBError> {
    let converted = match value {
        SdkAttributeValue::S(s) => AttributeValue::S(s.clone()),
        SdkAttributeValue::N(n) => AttributeValue::N(n.clone()),
        SdkAttributeValue::B(b) => AttributeValue::B(Bytes::copy_from_slice(b.as_ref())),
        SdkAttributeValue::Ss(ss) => AttributeValue::Ss(ss.clone()),
        SdkAttributeValue::Ns(ns) => AttributeValue::Ns(ns.clone()),
        SdkAttributeValue::Bs(bs) => AttributeValue::Bs(
            bs.iter()
                .map(|b| Bytes::copy_from_slice(b.as_ref()))
                .collect(),
        ),
        SdkAttributeValue::Bool(b) => AttributeValue::Bool(*b),
        SdkAttributeValue::Null(n) => AttributeValue::Null(*n),
        SdkAttributeValue::L(list) => {
            AttributeValue::L(list.iter().map(from_sdk).collect::<Result<_, _>>()?)
        }
        SdkAttributeValue::M(map) => AttributeValue::M(map_from_sdk(map)?),
        _ => {
            return Err(DynamoDBError::serialization_exception(
                "unsupported attribute value type in response",
            ));
        }
    };
    Ok(converted)
}

/// Convert an SDK attribute map into an [`Item`].
pub fn map_from_sdk(map: &HashMap<String, SdkAttributeValue>) -> Result<Item, DynamoDBError> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), from_sdk(v)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_nested_values_both_ways() {
        let item: Item = HashMap::from([
            ("id".to_owned(), AttributeValue::from(7)),
            ("name".to_owned(), AttributeValue::from("pikachu")),
            ("raw".to_owned(), AttributeValue::B(Bytes::from_static(b"\x00\x01"))),
            (
                "tags".to_owned(),
                AttributeValue::L(vec![
                    AttributeValue::Ss(vec!["a".to_owned(), "b".to_owned()]),
                    AttributeValue::Null(true),
                ]),
            ),
            (
                "info".to_owned(),
                AttributeValue::M(HashMap::from([(
                    "rating".to_owned(),
                    AttributeValue::Bool(true),
                )])),
            ),
        ]);

        let sdk = map_to_sdk(&item);
        assert_eq!(sdk["id"], SdkAttributeValue::N("7".to_owned()));
        assert_eq!(sdk["raw"], SdkAttributeValue::B(Blob::new(vec![0, 1])));
        assert_eq!(map_from_sdk(&sdk).unwrap(), item);
    }

    #[test]
    fn test_should_convert_binary_sets() {
        let sdk = SdkAttributeValue::Bs(vec![Blob::new(b"x".to_vec()), Blob::new(b"yz".to_vec())]);
        assert_eq!(
            from_sdk(&sdk).unwrap(),
            AttributeValue::Bs(vec![Bytes::from_static(b"x"), Bytes::from_static(b"yz")])
        );
    }
}
