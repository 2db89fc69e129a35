use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Settings shared by PLY decode calls.
///
/// Options are only read while decoding, so one value can be reused for any
/// number of calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Renames PLY properties as the header is parsed, e.g.
    /// `diffuse_red -> red`. Names without an entry are kept as-is.
    pub property_name_mapping: HashMap<String, String>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property_name(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.property_name_mapping.insert(from.into(), to.into());
        self
    }

    pub fn map_property_name(&self, name: &str) -> String {
        self.property_name_mapping
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::value::{Error as ValueError, MapDeserializer};

    #[test]
    fn test_mapping_defaults_to_identity() {
        let options = DecodeOptions::new().with_property_name("diffuse_red", "red");
        assert_eq!(options.map_property_name("diffuse_red"), "red");
        assert_eq!(options.map_property_name("x"), "x");
    }

    #[test]
    fn test_deserialize_options() {
        let mapping: HashMap<String, String> =
            [("vertex_index".to_string(), "vertex_indices".to_string())].into();
        let de = MapDeserializer::<_, ValueError>::new(
            [("property_name_mapping", mapping)].into_iter(),
        );
        let options = DecodeOptions::deserialize(de).unwrap();
        assert_eq!(options.map_property_name("vertex_index"), "vertex_indices");

        let empty = MapDeserializer::<_, ValueError>::new(
            std::iter::empty::<(&str, HashMap<String, String>)>(),
        );
        assert_eq!(DecodeOptions::deserialize(empty).unwrap(), DecodeOptions::default());
    }
}
