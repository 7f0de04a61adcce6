//! Create table operation.

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};

use crate::client::DynamoClient;
use crate::errors::{Result, map_sdk_error};

/// A key attribute and its scalar type.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: ScalarAttributeType,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        KeyAttribute {
            name: name.into(),
            attribute_type: ScalarAttributeType::S,
        }
    }

    pub fn number(name: impl Into<String>) -> Self {
        KeyAttribute {
            name: name.into(),
            attribute_type: ScalarAttributeType::N,
        }
    }

    pub(crate) fn definition(&self) -> Result<AttributeDefinition> {
        Ok(AttributeDefinition::builder()
            .attribute_name(&self.name)
            .attribute_type(self.attribute_type.clone())
            .build()?)
    }

    pub(crate) fn schema_element(&self, key_type: KeyType) -> Result<KeySchemaElement> {
        Ok(KeySchemaElement::builder()
            .attribute_name(&self.name)
            .key_type(key_type)
            .build()?)
    }
}

/// Provisioned read/write capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throughput {
    pub read: i64,
    pub write: i64,
}

impl Throughput {
    pub(crate) fn to_sdk(self) -> Result<ProvisionedThroughput> {
        Ok(ProvisionedThroughput::builder()
            .read_capacity_units(self.read)
            .write_capacity_units(self.write)
            .build()?)
    }
}

/// Key schema and capacity of a new table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub table: String,
    pub hash_key: KeyAttribute,
    pub range_key: Option<KeyAttribute>,
    /// `None` creates an on-demand table.
    pub throughput: Option<Throughput>,
}

impl TableDefinition {
    /// Attribute definitions and key schema for this table.
    pub(crate) fn key_schema(&self) -> Result<(Vec<AttributeDefinition>, Vec<KeySchemaElement>)> {
        let mut definitions = vec![self.hash_key.definition()?];
        let mut schema = vec![self.hash_key.schema_element(KeyType::Hash)?];
        if let Some(range) = &self.range_key {
            definitions.push(range.definition()?);
            schema.push(range.schema_element(KeyType::Range)?);
        }
        Ok((definitions, schema))
    }
}

/// Create a table. Does not wait for it to become active.
pub fn create_table(client: &DynamoClient, definition: &TableDefinition) -> Result<()> {
    let (definitions, schema) = definition.key_schema()?;

    let mut request = client
        .sdk()
        .create_table()
        .table_name(&definition.table)
        .set_attribute_definitions(Some(definitions))
        .set_key_schema(Some(schema));

    request = match definition.throughput {
        Some(throughput) => request
            .billing_mode(BillingMode::Provisioned)
            .provisioned_throughput(throughput.to_sdk()?),
        None => request.billing_mode(BillingMode::PayPerRequest),
    };

    client
        .block_on(request.send())
        .map_err(|e| map_sdk_error(e, Some(&definition.table)))?;

    tracing::info!(table = %definition.table, "table creation started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_key_schema() {
        let definition = TableDefinition {
            table: "music-test".into(),
            hash_key: KeyAttribute::string("Artist"),
            range_key: Some(KeyAttribute::string("SongTitle")),
            throughput: Some(Throughput { read: 10, write: 5 }),
        };
        let (definitions, schema) = definition.key_schema().unwrap();

        assert_eq!(definitions.len(), 2);
        assert_eq!(schema[0].attribute_name(), "Artist");
        assert_eq!(schema[0].key_type(), &KeyType::Hash);
        assert_eq!(schema[1].attribute_name(), "SongTitle");
        assert_eq!(schema[1].key_type(), &KeyType::Range);
    }

    #[test]
    fn throughput_converts() {
        let throughput = Throughput { read: 1, write: 2 }.to_sdk().unwrap();
        assert_eq!(throughput.read_capacity_units(), 1);
        assert_eq!(throughput.write_capacity_units(), 2);
    }
}
