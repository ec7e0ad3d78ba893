//! Static registry of compiled schema descriptions, built once at startup.

use crate::schema::flatten::flatten_schema;
use crate::schema::types::{FlattenedSchema, SchemaDescription, SchemaError};
use crate::update::{extend_path_context, PathContext};
use log::{info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A schema description together with everything derived from it.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    pub description: SchemaDescription,
    pub flattened: FlattenedSchema,
    /// Update paths derived from the schema alone, with no caller overrides.
    pub path_context: PathContext,
}

impl CompiledSchema {
    pub fn compile(description: SchemaDescription) -> Result<Self, SchemaError> {
        let flattened = flatten_schema(&description)?;
        let path_context = extend_path_context(&PathContext::new(), &flattened, "")?;
        Ok(Self {
            description,
            flattened,
            path_context,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Path context with `base` layered over the schema-derived paths.
    pub fn path_context_with(&self, base: &PathContext) -> Result<PathContext, SchemaError> {
        if base.is_empty() {
            return Ok(self.path_context.clone());
        }
        extend_path_context(base, &self.flattened, "")
    }
}

/// Name -> compiled schema mapping. Lookups never mutate; schemas are
/// shared as `Arc`s so models can hold on to them.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<CompiledSchema>>,
    by_collection: HashMap<String, String>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_descriptions(
        descriptions: impl IntoIterator<Item = SchemaDescription>,
    ) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for description in descriptions {
            registry.register(description)?;
        }
        Ok(registry)
    }

    /// Compiles and adds a description. Names must be unique.
    pub fn register(&mut self, description: SchemaDescription) -> Result<Arc<CompiledSchema>, SchemaError> {
        if self.schemas.contains_key(&description.name) {
            return Err(SchemaError::Duplicate(description.name));
        }
        let compiled = Arc::new(CompiledSchema::compile(description)?);
        info!(
            "Registered schema '{}' ({} fields, {} update paths)",
            compiled.name(),
            compiled.flattened.len(),
            compiled.path_context.len()
        );
        self.by_collection
            .insert(compiled.description.collection.clone(), compiled.name().to_string());
        self.schemas
            .insert(compiled.name().to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn get(&self, name: &str) -> Result<Arc<CompiledSchema>, SchemaError> {
        self.schemas
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::NotFound(format!("Schema {name} not found")))
    }

    pub fn get_by_collection(&self, collection: &str) -> Result<Arc<CompiledSchema>, SchemaError> {
        self.by_collection
            .get(collection)
            .and_then(|name| self.schemas.get(name))
            .cloned()
            .ok_or_else(|| {
                SchemaError::NotFound(format!("No schema for collection {collection}"))
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered schema names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Parses and registers one description from a JSON string.
    pub fn load_schema_from_json(&mut self, json_str: &str) -> Result<Arc<CompiledSchema>, SchemaError> {
        let description: SchemaDescription = serde_json::from_str(json_str)
            .map_err(|e| SchemaError::InvalidData(format!("Invalid schema description: {e}")))?;
        self.register(description)
    }

    pub fn load_schema_from_file(&mut self, path: &Path) -> Result<Arc<CompiledSchema>, SchemaError> {
        let json_str = std::fs::read_to_string(path).map_err(|e| {
            SchemaError::InvalidData(format!("Failed to read schema file {}: {e}", path.display()))
        })?;
        info!("Loading schema from file: {}", path.display());
        self.load_schema_from_json(&json_str)
    }

    /// Registers every `*.json` file in `dir`, in file-name order.
    /// Returns the number of schemas loaded.
    pub fn load_from_dir(&mut self, dir: &Path) -> Result<usize, SchemaError> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            SchemaError::InvalidData(format!("Failed to read schema directory {}: {e}", dir.display()))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {e}");
                    None
                }
            })
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in &paths {
            self.load_schema_from_file(path)?;
        }
        info!("Loaded {} schemas from {}", paths.len(), dir.display());
        Ok(paths.len())
    }
}
