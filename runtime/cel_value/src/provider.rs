//! Type provider and adapter.
//!
//! The provider answers the planner's and evaluator's questions about named
//! types: descriptor lookup, identifier resolution (type names used as
//! values, enum constants), and object construction. The adapter converts
//! host-native values into CEL values.
//!
//! [`Registry`] is the default implementation of both. It ships with the
//! built-in types registered and accepts object/enum registrations from the
//! host; the tables sit behind an `RwLock` so a registry can be shared.

use std::any::Any;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error;
use crate::heap::Heap;
use crate::types::{self, object_traits, CelType};
use crate::value::{StructValue, Value};

/// Resolves type names, identifiers, and object construction.
pub trait TypeProvider {
    /// Descriptor for a fully qualified type name.
    fn find_type(&self, name: &str) -> Option<CelType>;

    /// Value for an identifier the provider knows (type names used as
    /// values, enum constants).
    fn find_ident(&self, name: &str) -> Option<Value>;

    /// Construct an instance of a registered object type. Field validation
    /// failures come back as in-band error values.
    fn new_value(&self, type_name: &str, fields: FxHashMap<String, Value>) -> Value;

    /// Numeric value of a fully qualified enum constant.
    fn enum_value(&self, name: &str) -> Option<Value>;
}

/// Converts host-native values into CEL values.
pub trait TypeAdapter {
    /// Adapt a native value; `None` when the native type is not supported.
    fn native_to_value(&self, native: &dyn Any) -> Option<Value>;
}

/// A registered object type: descriptor plus declared field set.
#[derive(Clone, Debug)]
struct ObjectType {
    descriptor: CelType,
    fields: Heap<FxHashSet<String>>,
}

/// Default provider/adapter with the built-in types preregistered.
pub struct Registry {
    objects: RwLock<FxHashMap<String, ObjectType>>,
    enums: RwLock<FxHashMap<String, i64>>,
}

impl Registry {
    /// Registry with the built-in types only.
    pub fn new() -> Self {
        Registry {
            objects: RwLock::new(FxHashMap::default()),
            enums: RwLock::new(FxHashMap::default()),
        }
    }

    /// Register an object type with its declared field names.
    ///
    /// Re-registering a name replaces the previous descriptor.
    pub fn register_object(
        &self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let name = name.into();
        let object = ObjectType {
            descriptor: CelType::new(&name, object_traits()),
            fields: Heap::new(fields.into_iter().map(Into::into).collect()),
        };
        self.objects.write().insert(name, object);
    }

    /// Register an enum constant by fully qualified name.
    pub fn register_enum(&self, name: impl Into<String>, value: i64) {
        self.enums.write().insert(name.into(), value);
    }

    /// Descriptor for a built-in type name, if `name` is one.
    fn builtin(name: &str) -> Option<&'static CelType> {
        let t = match name {
            "bool" => types::bool_type(),
            "bytes" => types::bytes_type(),
            "double" => types::double_type(),
            "duration" => types::duration_type(),
            "int" => types::int_type(),
            "list" => types::list_type(),
            "map" => types::map_type(),
            "null_type" => types::null_type(),
            "optional_type" => types::optional_type(),
            "string" => types::string_type(),
            "timestamp" => types::timestamp_type(),
            "type" => types::type_type(),
            "uint" => types::uint_type(),
            _ => return None,
        };
        Some(t)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl TypeProvider for Registry {
    fn find_type(&self, name: &str) -> Option<CelType> {
        if let Some(t) = Registry::builtin(name) {
            return Some(t.clone());
        }
        // `dyn` is addressable as a conversion target though it is not a
        // runtime type of any value.
        if name == "dyn" {
            return Some(CelType::new("dyn", crate::traits::Traits::empty()));
        }
        self.objects
            .read()
            .get(name)
            .map(|o| o.descriptor.clone())
    }

    fn find_ident(&self, name: &str) -> Option<Value> {
        if let Some(t) = self.find_type(name) {
            return Some(Value::Type(t));
        }
        self.enum_value(name)
    }

    fn new_value(&self, type_name: &str, fields: FxHashMap<String, Value>) -> Value {
        let objects = self.objects.read();
        let Some(object) = objects.get(type_name) else {
            return Value::error(error::ErrorValue::new(
                error::ErrorKind::TypeConversion,
                format!("unknown type '{type_name}'"),
            ));
        };
        for field in fields.keys() {
            if !object.fields.contains(field) {
                return Value::error(error::no_such_field(field));
            }
        }
        Value::Struct(StructValue::new(
            object.descriptor.clone(),
            object.fields.clone(),
            fields,
        ))
    }

    fn enum_value(&self, name: &str) -> Option<Value> {
        self.enums.read().get(name).map(|v| Value::Int(*v))
    }
}

impl TypeAdapter for Registry {
    fn native_to_value(&self, native: &dyn Any) -> Option<Value> {
        if let Some(v) = native.downcast_ref::<Value>() {
            return Some(v.clone());
        }
        if let Some(v) = native.downcast_ref::<bool>() {
            return Some(Value::Bool(*v));
        }
        if let Some(v) = native.downcast_ref::<i64>() {
            return Some(Value::Int(*v));
        }
        if let Some(v) = native.downcast_ref::<i32>() {
            return Some(Value::Int(i64::from(*v)));
        }
        if let Some(v) = native.downcast_ref::<u64>() {
            return Some(Value::Uint(*v));
        }
        if let Some(v) = native.downcast_ref::<u32>() {
            return Some(Value::Uint(u64::from(*v)));
        }
        if let Some(v) = native.downcast_ref::<f64>() {
            return Some(Value::Double(*v));
        }
        if let Some(v) = native.downcast_ref::<String>() {
            return Some(Value::string(v.clone()));
        }
        if let Some(v) = native.downcast_ref::<&str>() {
            return Some(Value::string(*v));
        }
        if let Some(v) = native.downcast_ref::<Vec<u8>>() {
            return Some(Value::bytes(v.clone()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_idents_resolve_to_type_values() {
        let registry = Registry::new();
        assert_eq!(
            registry.find_ident("uint"),
            Some(Value::Type(types::uint_type().clone()))
        );
        assert_eq!(registry.find_ident("no.such.Name"), None);
    }

    #[test]
    fn object_registration_and_construction() {
        let registry = Registry::new();
        registry.register_object("test.Point", ["x", "y"]);

        let t = registry.find_type("test.Point");
        assert_eq!(t.as_ref().map(CelType::name), Some("test.Point"));

        let mut fields = FxHashMap::default();
        fields.insert("x".to_string(), Value::Int(3));
        let obj = registry.new_value("test.Point", fields);
        match &obj {
            Value::Struct(s) => {
                assert_eq!(s.get("x"), Value::Int(3));
                assert_eq!(s.get("y"), Value::Null);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn construction_rejects_undeclared_fields() {
        let registry = Registry::new();
        registry.register_object("test.Point", ["x"]);
        let mut fields = FxHashMap::default();
        fields.insert("z".to_string(), Value::Int(1));
        assert!(registry.new_value("test.Point", fields).is_error());
        assert!(registry
            .new_value("test.Missing", FxHashMap::default())
            .is_error());
    }

    #[test]
    fn enum_constants() {
        let registry = Registry::new();
        registry.register_enum("test.Color.RED", 2);
        assert_eq!(registry.enum_value("test.Color.RED"), Some(Value::Int(2)));
        assert_eq!(registry.find_ident("test.Color.RED"), Some(Value::Int(2)));
    }

    #[test]
    fn adapter_converts_common_natives() {
        let registry = Registry::new();
        assert_eq!(registry.native_to_value(&42i64), Some(Value::Int(42)));
        assert_eq!(registry.native_to_value(&true), Some(Value::Bool(true)));
        assert_eq!(
            registry.native_to_value(&"hi".to_string()),
            Some(Value::string("hi"))
        );
        struct Opaque;
        assert_eq!(registry.native_to_value(&Opaque), None);
    }
}
