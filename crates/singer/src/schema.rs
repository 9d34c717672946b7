//! JSON schema builder
//!
//! Declarative helpers for describing stream schemas. Every property is
//! emitted as nullable unless marked required, since APIs routinely omit or
//! null out fields.

use serde_json::{json, Map, Value};

/// Type of a single schema property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    /// String with `format: date-time`
    DateTime,
    Object(PropertiesList),
    Array(Box<PropertyType>),
}

impl PropertyType {
    pub fn object(properties: PropertiesList) -> Self {
        PropertyType::Object(properties)
    }

    pub fn array(items: PropertyType) -> Self {
        PropertyType::Array(Box::new(items))
    }

    fn json_type(&self) -> &'static str {
        match self {
            PropertyType::String | PropertyType::DateTime => "string",
            PropertyType::Integer => "integer",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Object(_) => "object",
            PropertyType::Array(_) => "array",
        }
    }

    /// Render as a JSON schema fragment
    pub fn to_schema(&self, nullable: bool) -> Value {
        let type_value = if nullable {
            json!([self.json_type(), "null"])
        } else {
            json!(self.json_type())
        };

        let mut schema = Map::new();
        schema.insert("type".to_string(), type_value);

        match self {
            PropertyType::DateTime => {
                schema.insert("format".to_string(), json!("date-time"));
            }
            PropertyType::Object(properties) => {
                schema.insert("properties".to_string(), properties.properties_value());
            }
            PropertyType::Array(items) => {
                schema.insert("items".to_string(), items.to_schema(true));
            }
            _ => {}
        }

        Value::Object(schema)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyType,
    pub required: bool,
    pub description: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, kind: PropertyType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn to_schema(&self) -> Value {
        let mut schema = self.kind.to_schema(!self.required);
        if let (Some(description), Value::Object(map)) = (&self.description, &mut schema) {
            map.insert("description".to_string(), json!(description));
        }
        schema
    }
}

/// Ordered list of properties making up an object schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertiesList {
    properties: Vec<Property>,
}

impl PropertiesList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a nullable property
    pub fn property(self, name: impl Into<String>, kind: PropertyType) -> Self {
        self.with(Property::new(name, kind))
    }

    pub fn with(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn properties_value(&self) -> Value {
        let map: Map<String, Value> = self
            .properties
            .iter()
            .map(|p| (p.name.clone(), p.to_schema()))
            .collect();
        Value::Object(map)
    }

    /// Render as a top-level object schema
    pub fn to_schema(&self) -> Value {
        let required: Vec<&str> = self
            .properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": self.properties_value(),
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_properties_are_nullable() {
        let schema = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("active", PropertyType::Boolean)
            .to_schema();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["id"]["type"], json!(["integer", "null"]));
        assert_eq!(schema["properties"]["active"]["type"], json!(["boolean", "null"]));
        assert!(schema.get("required").is_none());
    }

    #[test]
    fn test_datetime_format() {
        let schema = PropertiesList::new()
            .property("updated_datetime", PropertyType::DateTime)
            .to_schema();
        let prop = &schema["properties"]["updated_datetime"];
        assert_eq!(prop["type"], json!(["string", "null"]));
        assert_eq!(prop["format"], "date-time");
    }

    #[test]
    fn test_nested_object_and_array() {
        let tag = PropertiesList::new()
            .property("id", PropertyType::Integer)
            .property("name", PropertyType::String);
        let schema = PropertiesList::new()
            .property("tags", PropertyType::array(PropertyType::object(tag)))
            .to_schema();

        let tags = &schema["properties"]["tags"];
        assert_eq!(tags["type"], json!(["array", "null"]));
        assert_eq!(tags["items"]["type"], json!(["object", "null"]));
        assert_eq!(tags["items"]["properties"]["name"]["type"], json!(["string", "null"]));
    }

    #[test]
    fn test_required_and_description() {
        let schema = PropertiesList::new()
            .with(
                Property::new("subdomain", PropertyType::String)
                    .required()
                    .with_description("Account subdomain"),
            )
            .property("page_size", PropertyType::Integer)
            .to_schema();

        assert_eq!(schema["required"], json!(["subdomain"]));
        assert_eq!(schema["properties"]["subdomain"]["type"], "string");
        assert_eq!(
            schema["properties"]["subdomain"]["description"],
            "Account subdomain"
        );
    }

    #[test]
    fn test_property_order_is_kept() {
        let list = PropertiesList::new()
            .property("b", PropertyType::String)
            .property("a", PropertyType::String);
        assert_eq!(list.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(list.len(), 2);
    }
}
