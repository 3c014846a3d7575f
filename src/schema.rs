//! Fact schema registry: declared field names and types per fact type.
//!
//! This is the validation boundary in front of working memory. Every fact is
//! checked against its registered schema exactly once, on `declare`; the
//! network core then trusts the positional field layout and never
//! re-validates.

use crate::errors::{EngineError, Result};
use crate::types::{Fact, FieldType, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a registered fact type within the registry
pub type TypeId = usize;

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: FieldType,
}

/// Declared shape of one fact type: an ordered list of named, typed fields.
///
/// Field order fixes the positional layout of validated facts, so pattern
/// compilation can resolve field names to indices once and the network can
/// access fields without name lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSchema {
    name: String,
    fields: Vec<FieldDef>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl FactSchema {
    /// Start a schema for the given fact type name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Builder: append a field declaration
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        let name = name.into();
        self.index.insert(name.clone(), self.fields.len());
        self.fields.push(FieldDef { name, ty });
        self
    }

    /// Fact type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in positional order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Resolve a field name to its position
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.index.get(field).copied()
    }

    /// Declared type of the field at a position
    pub fn field_type(&self, index: usize) -> FieldType {
        self.fields[index].ty
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
    }
}

/// Registry of all fact types known to one engine instance
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    schemas: Vec<FactSchema>,
    by_name: HashMap<String, TypeId>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fact type. Names must be unique and so must the fields
    /// within one schema.
    pub fn register(&mut self, mut schema: FactSchema) -> Result<TypeId> {
        if self.by_name.contains_key(schema.name()) {
            return Err(EngineError::DuplicateFactType {
                name: schema.name().to_string(),
            });
        }
        schema.rebuild_index();
        if schema.index.len() != schema.fields.len() {
            return Err(EngineError::Validation {
                message: format!("duplicate field name in schema '{}'", schema.name()),
            });
        }
        let id = self.schemas.len();
        self.by_name.insert(schema.name().to_string(), id);
        self.schemas.push(schema);
        Ok(id)
    }

    /// Look up a fact type by name
    pub fn get(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Schema of a registered type
    pub fn schema(&self, id: TypeId) -> &FactSchema {
        &self.schemas[id]
    }

    /// Number of registered fact types
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True if no fact types are registered
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Validate a fact against its schema and produce the positional field
    /// values. Integer values destined for float fields are widened here so
    /// stored values always carry the declared type.
    pub fn validate(&self, fact: &Fact) -> Result<(TypeId, Vec<Value>)> {
        let type_id = self.get(&fact.fact_type).ok_or_else(|| EngineError::Validation {
            message: format!("fact type '{}' is not registered", fact.fact_type),
        })?;
        let schema = self.schema(type_id);

        if fact.fields.len() != schema.fields.len() {
            for name in fact.fields.keys() {
                if schema.field_index(name).is_none() {
                    return Err(EngineError::Validation {
                        message: format!(
                            "fact type '{}' has no field '{}'",
                            fact.fact_type, name
                        ),
                    });
                }
            }
        }

        let mut values = Vec::with_capacity(schema.fields.len());
        for def in schema.fields() {
            let value = fact.get(&def.name).ok_or_else(|| EngineError::Validation {
                message: format!(
                    "fact of type '{}' is missing field '{}'",
                    fact.fact_type, def.name
                ),
            })?;
            if !def.ty.accepts(value) {
                return Err(EngineError::Validation {
                    message: format!(
                        "field '{}.{}' expects {}, got {}",
                        fact.fact_type,
                        def.name,
                        def.ty,
                        value.type_name()
                    ),
                });
            }
            values.push(coerce(def.ty, value.clone()));
        }
        Ok((type_id, values))
    }
}

/// Widen an admitted value to the declared field type
pub(crate) fn coerce(ty: FieldType, value: Value) -> Value {
    match (ty, value) {
        (FieldType::Float, Value::Integer(i)) => Value::Float(i as f64),
        (_, value) => value,
    }
}
