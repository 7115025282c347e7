//! Declared response shapes, in the subset of OpenAPI the model accepts.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum OutputSchema {
    String,
    Array(Box<OutputSchema>),
    /// Properties in declaration order; every property is required.
    Object(Vec<(&'static str, OutputSchema)>),
}

impl OutputSchema {
    pub fn array_of(items: OutputSchema) -> Self {
        OutputSchema::Array(Box::new(items))
    }

    pub fn object(properties: Vec<(&'static str, OutputSchema)>) -> Self {
        OutputSchema::Object(properties)
    }

    pub fn to_json(&self) -> Value {
        match self {
            OutputSchema::String => json!({ "type": "STRING" }),
            OutputSchema::Array(items) => json!({ "type": "ARRAY", "items": items.to_json() }),
            OutputSchema::Object(props) => {
                let mut properties = Map::new();
                for (name, schema) in props {
                    properties.insert((*name).to_string(), schema.to_json());
                }
                let required: Vec<&str> = props.iter().map(|(name, _)| *name).collect();
                json!({ "type": "OBJECT", "properties": properties, "required": required })
            }
        }
    }
}

// ─── Shapes used by the features ─────────────────────────────────────────

pub fn file_entry() -> OutputSchema {
    OutputSchema::object(vec![
        ("fileName", OutputSchema::String),
        ("content", OutputSchema::String),
    ])
}

pub fn task_list() -> OutputSchema {
    OutputSchema::array_of(OutputSchema::object(vec![
        ("title", OutputSchema::String),
        ("description", OutputSchema::String),
        ("files", OutputSchema::array_of(OutputSchema::String)),
    ]))
}

pub fn file_set() -> OutputSchema {
    OutputSchema::array_of(file_entry())
}

pub fn simulation() -> OutputSchema {
    OutputSchema::object(vec![
        (
            "simulationTurns",
            OutputSchema::array_of(OutputSchema::object(vec![
                ("agent", OutputSchema::String),
                ("message", OutputSchema::String),
            ])),
        ),
        ("finalFileSet", OutputSchema::array_of(file_entry())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_list_schema_shape() {
        let v = task_list().to_json();
        assert_eq!(v["type"], "ARRAY");
        assert_eq!(v["items"]["type"], "OBJECT");
        assert_eq!(v["items"]["properties"]["files"]["items"]["type"], "STRING");
        assert_eq!(v["items"]["required"], json!(["title", "description", "files"]));
    }

    #[test]
    fn simulation_schema_requires_both_keys() {
        let v = simulation().to_json();
        assert_eq!(v["required"], json!(["simulationTurns", "finalFileSet"]));
        assert_eq!(
            v["properties"]["finalFileSet"]["items"]["required"],
            json!(["fileName", "content"])
        );
    }
}
