use crate::{
    connector::{Connector, ConnectorConfig, ConnectorType},
    error::ModelError,
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

#[derive(Deserialize)]
struct ConnectorHeader {
    id: String,
    #[serde(default)]
    name: String,
}

/// Decodes a connector definition. The `config.connectorType` discriminator
/// is resolved first so an unknown technology is reported as such rather than
/// as a generic shape mismatch.
pub fn parse_connector(json: &str) -> Result<Connector, ModelError> {
    let Value::Object(mut root) = serde_json::from_str::<Value>(json)? else {
        return Err(ModelError::NotAnObject);
    };

    let config = root
        .remove("config")
        .ok_or(ModelError::MissingField("config"))?;
    let kind = config
        .get("connectorType")
        .and_then(Value::as_str)
        .ok_or(ModelError::MissingField("config.connectorType"))?;
    let connector_type: ConnectorType = kind
        .parse()
        .map_err(ModelError::UnknownConnectorType)?;

    // Normalise the tag so case-insensitive matches still decode.
    let mut config = match config {
        Value::Object(map) => map,
        _ => return Err(ModelError::NotAnObject),
    };
    config.insert(
        "connectorType".to_string(),
        Value::String(connector_type.as_str().to_string()),
    );
    let config: ConnectorConfig =
        serde_json::from_value(Value::Object(config)).map_err(|source| {
            ModelError::InvalidConfig {
                connector_type: connector_type.to_string(),
                source,
            }
        })?;

    let header: ConnectorHeader = serde_json::from_value(Value::Object(root))?;
    Ok(Connector {
        id: header.id,
        name: header.name,
        config,
    })
}

/// Decodes any other configuration object by field-name matching.
pub fn parse_object<T: DeserializeOwned>(json: &str) -> Result<T, ModelError> {
    let value: Map<String, Value> = match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => map,
        _ => return Err(ModelError::NotAnObject),
    };
    Ok(serde_json::from_value(Value::Object(value))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connector::MemoryConfig, transform::mapping::Job};

    #[test]
    fn decodes_config_by_discriminator() {
        let connector = parse_connector(
            r#"{"id":"c1","name":"orders db","config":{"connectorType":"mysql","url":"mysql://localhost/db","username":"root"}}"#,
        )
        .unwrap();

        assert_eq!(connector.id, "c1");
        assert_eq!(connector.config.connector_type(), ConnectorType::Mysql);
        match connector.config {
            ConnectorConfig::Mysql(db) => assert_eq!(db.username.as_deref(), Some("root")),
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminator_is_reported() {
        let err = parse_connector(r#"{"id":"c","config":{"connectorType":"Oracle"}}"#).unwrap_err();
        assert!(matches!(err, ModelError::UnknownConnectorType(t) if t == "Oracle"));
    }

    #[test]
    fn missing_config_fields_are_reported() {
        let err = parse_connector(r#"{"id":"c"}"#).unwrap_err();
        assert!(matches!(err, ModelError::MissingField("config")));

        let err = parse_connector(r#"{"id":"c","config":{"connectorType":"JsonFile"}}"#).unwrap_err();
        assert!(matches!(err, ModelError::InvalidConfig { .. }));
    }

    #[test]
    fn connector_round_trips_through_serde() {
        let connector = Connector::new(
            "m",
            ConnectorConfig::Memory(MemoryConfig {
                dataset: "ds".into(),
            }),
        );
        let json = serde_json::to_string(&connector).unwrap();
        assert!(json.contains(r#""connectorType":"Memory""#));
        assert_eq!(parse_connector(&json).unwrap(), connector);
    }

    #[test]
    fn parse_object_matches_field_names() {
        let job: Job = parse_object(
            r#"{"id":"j","sourceConnectorId":"a","targetConnectorId":"b","metaId":"m"}"#,
        )
        .unwrap();
        assert_eq!(job.meta_id, "m");
        assert!(matches!(parse_object::<Job>("[]"), Err(ModelError::NotAnObject)));
    }
}
