use crate::de::val_reader::ScalarReader;
use crate::record::{Record, Value};
use crate::{ElementDef, MeshError, PropertyType};

/// Read one row of `elem_def`, property by property in header order.
pub(crate) fn read_row<R: ScalarReader>(
    reader: &mut R,
    elem_def: &ElementDef,
) -> Result<Record, MeshError> {
    let mut record = Record::with_capacity(elem_def.properties.len());

    for prop in &elem_def.properties {
        let value = match prop.property_type {
            PropertyType::Scalar { data_type } => Value::Scalar(reader.read_scalar(data_type)?),
            PropertyType::List {
                count_type,
                data_type,
            } => {
                let count = reader.read_count(count_type)?;
                // No pre-allocation: a corrupt count must not reserve memory
                // before the reads fail.
                let items = (0..count)
                    .map(|_| reader.read_scalar(data_type))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::List(items)
            }
        };
        record.push(prop.name.clone(), value);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::de::val_reader::AsciiValReader;
    use crate::{PropertyDef, ScalarType};

    fn face_def() -> ElementDef {
        ElementDef {
            name: "face".to_string(),
            count: 1,
            properties: vec![
                PropertyDef {
                    name: "vertex_indices".to_string(),
                    property_type: PropertyType::List {
                        count_type: ScalarType::U8,
                        data_type: ScalarType::I32,
                    },
                },
                PropertyDef {
                    name: "flags".to_string(),
                    property_type: PropertyType::Scalar {
                        data_type: ScalarType::U16,
                    },
                },
            ],
        }
    }

    #[test]
    fn test_list_count_consumed() {
        let mut reader = AsciiValReader::new("3 0 1 2 9", 1);
        let record = read_row(&mut reader, &face_def()).unwrap();
        assert_eq!(record.list("vertex_indices"), Some(&[0.0, 1.0, 2.0][..]));
        assert_eq!(record.scalar("flags"), Some(9.0));
    }

    #[test]
    fn test_short_row() {
        let mut reader = AsciiValReader::new("4 0 1 2", 1);
        assert!(matches!(
            read_row(&mut reader, &face_def()),
            Err(MeshError::TruncatedInput(_))
        ));
    }
}
