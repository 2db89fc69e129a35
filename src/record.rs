//! Decoded PLY records.
//!
//! A [`Record`] is one row of an element: property names mapped to either a
//! single number or a list of numbers. Records can be read field by field, or
//! deserialized into any `serde` type whose fields are named after the
//! properties.

use serde::de::{
    value::{MapDeserializer, SeqDeserializer},
    DeserializeOwned, Deserializer, IntoDeserializer, Visitor,
};
use serde::Serialize;

use crate::MeshError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    List(Vec<f64>),
}

impl Value {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[f64]> {
        match self {
            Value::Scalar(_) => None,
            Value::List(items) => Some(items),
        }
    }
}

/// One decoded element instance, properties in header order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// Look up a property. If a header declared the same name twice, the
    /// later declaration wins.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_scalar)
    }

    pub fn list(&self, name: &str) -> Option<&[f64]> {
        self.get(name).and_then(Value::as_list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Deserialize this record into a struct or map keyed by property name.
    ///
    /// Properties without a matching field are skipped, `Option` fields are
    /// `None` when the property is absent, and list properties map onto
    /// sequences such as `Vec<u32>` or `[u32; 3]`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, MeshError> {
        T::deserialize(RecordDeserializer { record: self })
    }
}

struct RecordDeserializer<'a> {
    record: &'a Record,
}

impl<'de, 'a> Deserializer<'de> for RecordDeserializer<'a> {
    type Error = MeshError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // Duplicate names resolve to the later property, as in `Record::get`.
        let fields = &self.record.fields;
        let mut map = MapDeserializer::<_, MeshError>::new(
            fields
                .iter()
                .enumerate()
                .filter(|(i, (name, _))| !fields[i + 1..].iter().any(|(later, _)| later == name))
                .map(|(_, (name, value))| (name.as_str(), ValueDeserializer::from(value))),
        );
        let value = visitor.visit_map(&mut map)?;
        map.end()?;
        Ok(value)
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_map(visitor)
    }

    serde::forward_to_deserialize_any! {
        bool i8 u8 i16 u16 i32 u32 i64 u64 i128 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

#[derive(Clone, Copy)]
enum ValueDeserializer<'a> {
    Scalar(f64),
    List(&'a [f64]),
}

impl<'a> From<&'a Value> for ValueDeserializer<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Scalar(v) => ValueDeserializer::Scalar(*v),
            Value::List(items) => ValueDeserializer::List(items),
        }
    }
}

impl<'a> ValueDeserializer<'a> {
    fn scalar(self, expected: &str) -> Result<f64, MeshError> {
        match self {
            ValueDeserializer::Scalar(v) => Ok(v),
            ValueDeserializer::List(_) => Err(MeshError::TypeMismatch {
                expected: expected.to_string(),
                found: "list".to_string(),
            }),
        }
    }
}

impl<'de, 'a> IntoDeserializer<'de, MeshError> for ValueDeserializer<'a> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

macro_rules! deserialize_integer {
    ($method:ident, $visit:ident, $ty:ty) => {
        fn $method<V>(self, visitor: V) -> Result<V::Value, Self::Error>
        where
            V: Visitor<'de>,
        {
            let v = self.scalar(stringify!($ty))?;
            if v.fract() != 0.0 || v < <$ty>::MIN as f64 || v > <$ty>::MAX as f64 {
                return Err(MeshError::TypeMismatch {
                    expected: stringify!($ty).to_string(),
                    found: v.to_string(),
                });
            }
            visitor.$visit(v as $ty)
        }
    };
}

impl<'de, 'a> Deserializer<'de> for ValueDeserializer<'a> {
    type Error = MeshError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        match self {
            ValueDeserializer::Scalar(v) => visitor.visit_f64(v),
            ValueDeserializer::List(_) => self.deserialize_seq(visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        // Present in the record means present in the header.
        visitor.visit_some(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        let ValueDeserializer::List(items) = self else {
            return Err(MeshError::TypeMismatch {
                expected: "list".to_string(),
                found: "scalar".to_string(),
            });
        };
        let mut seq = SeqDeserializer::<_, MeshError>::new(
            items.iter().map(|v| ValueDeserializer::Scalar(*v)),
        );
        let value = visitor.visit_seq(&mut seq)?;
        seq.end()?;
        Ok(value)
    }

    fn deserialize_tuple<V>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        self.deserialize_seq(visitor)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f32(self.scalar("f32")? as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_f64(self.scalar("f64")?)
    }

    fn deserialize_newtype_struct<V>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    deserialize_integer!(deserialize_i8, visit_i8, i8);
    deserialize_integer!(deserialize_u8, visit_u8, u8);
    deserialize_integer!(deserialize_i16, visit_i16, i16);
    deserialize_integer!(deserialize_u16, visit_u16, u16);
    deserialize_integer!(deserialize_i32, visit_i32, i32);
    deserialize_integer!(deserialize_u32, visit_u32, u32);
    deserialize_integer!(deserialize_i64, visit_i64, i64);
    deserialize_integer!(deserialize_u64, visit_u64, u64);

    serde::forward_to_deserialize_any! {
        bool i128 u128 char str string bytes byte_buf unit unit_struct
        tuple_struct map struct enum identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn vertex_record() -> Record {
        let mut record = Record::new();
        record.push("x", Value::Scalar(1.5));
        record.push("y", Value::Scalar(-2.0));
        record.push("z", Value::Scalar(0.25));
        record.push("red", Value::Scalar(255.0));
        record.push("vertex_indices", Value::List(vec![0.0, 1.0, 2.0]));
        record
    }

    #[test]
    fn test_lookup() {
        let record = vertex_record();
        assert_eq!(record.len(), 5);
        assert_eq!(record.scalar("x"), Some(1.5));
        assert_eq!(record.list("vertex_indices"), Some(&[0.0, 1.0, 2.0][..]));
        assert_eq!(record.list("x"), None);
        assert!(!record.contains("green"));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let mut record = Record::new();
        record.push("x", Value::Scalar(1.0));
        record.push("x", Value::Scalar(2.0));
        assert_eq!(record.scalar("x"), Some(2.0));

        #[derive(Deserialize, Debug)]
        struct X {
            x: f32,
        }
        assert_eq!(record.deserialize::<X>().unwrap().x, 2.0);
    }

    #[test]
    fn test_deserialize_struct() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Vertex {
            x: f32,
            y: f32,
            z: f64,
            red: Option<u8>,
            green: Option<u8>,
            vertex_indices: [u32; 3],
        }

        let vertex: Vertex = vertex_record().deserialize().unwrap();
        assert_eq!(
            vertex,
            Vertex {
                x: 1.5,
                y: -2.0,
                z: 0.25,
                red: Some(255),
                green: None,
                vertex_indices: [0, 1, 2],
            }
        );
    }

    #[test]
    fn test_deserialize_type_mismatch() {
        #[derive(Deserialize, Debug)]
        #[allow(dead_code)]
        struct Wrong {
            x: u32,
        }
        #[derive(Deserialize, Debug)]
        #[allow(dead_code)]
        struct ListAsScalar {
            vertex_indices: f32,
        }

        assert!(matches!(
            vertex_record().deserialize::<Wrong>(),
            Err(MeshError::TypeMismatch { .. })
        ));
        assert!(matches!(
            vertex_record().deserialize::<ListAsScalar>(),
            Err(MeshError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_deserialize_missing_field() {
        #[derive(Deserialize, Debug)]
        #[allow(dead_code)]
        struct Normal {
            nx: f32,
        }
        assert!(matches!(
            vertex_record().deserialize::<Normal>(),
            Err(MeshError::Serde(_))
        ));
    }
}
