use std::{collections::HashMap, fmt};

use derive_builder::Builder;
use squalid::{OptionExt, _d};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{IndexMap, OperationType, Value};

mod directive;

pub use directive::{builtin_directives, DirectiveDefinition, DirectiveDefinitionBuilder, DirectiveLocation};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeFull {
    Type(String),
    List(Box<TypeFull>),
    NonNull(Box<TypeFull>),
}

impl TypeFull {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Type(name.into())
    }

    pub fn list(inner: TypeFull) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeFull) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// The innermost named type, with every list and non-null wrapper
    /// stripped.
    pub fn name(&self) -> &str {
        match self {
            Self::Type(name) => name,
            Self::List(inner) => inner.name(),
            Self::NonNull(inner) => inner.name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// Strips one outer non-null wrapper, if present.
    pub fn nullable(&self) -> &TypeFull {
        match self {
            Self::NonNull(inner) => inner,
            _ => self,
        }
    }
}

impl fmt::Display for TypeFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[derive(Debug)]
pub enum Type {
    Object(ObjectType),
    Scalar(ScalarType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl Type {
    pub fn top_level_type(&self) -> Option<OperationType> {
        match self {
            Self::Object(type_) => type_.is_top_level_type,
            _ => None,
        }
    }

    pub fn maybe_as_object(&self) -> Option<&ObjectType> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn maybe_as_enum(&self) -> Option<&EnumType> {
        match self {
            Self::Enum(enum_) => Some(enum_),
            _ => None,
        }
    }

    pub fn maybe_as_input_object(&self) -> Option<&InputObjectType> {
        match self {
            Self::InputObject(input_object) => Some(input_object),
            _ => None,
        }
    }

    /// Scalars and enums, the types a selection ends at.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Scalar(_) => "scalar",
            Self::Enum(_) => "enum",
            Self::InputObject(_) => "input object",
        }
    }
}

pub trait TypeInterface {
    fn name(&self) -> &str;
}

impl TypeInterface for Type {
    fn name(&self) -> &str {
        match self {
            Self::Object(type_) => type_.name(),
            Self::Scalar(type_) => type_.name(),
            Self::Enum(type_) => &type_.name,
            Self::InputObject(type_) => &type_.name,
        }
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct ObjectType {
    #[builder(setter(skip), default = "Field::new_typename()")]
    pub typename_field: Field,
    #[builder(setter(skip), default = "self.default_introspection_fields()")]
    pub introspection_fields: IndexMap<String, Field>,
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(strip_option), default)]
    pub is_top_level_type: Option<OperationType>,
    #[builder(setter(custom))]
    pub fields: IndexMap<String, Field>,
    #[builder(default)]
    pub implements: Vec<String>,
}

impl ObjectTypeBuilder {
    pub fn fields(self, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut new = self;
        new.fields = Some(fields_by_name(fields));
        new
    }

    fn default_introspection_fields(&self) -> IndexMap<String, Field> {
        introspection_fields(self.is_top_level_type.flatten())
    }
}

impl ObjectType {
    pub fn new(
        name: impl Into<String>,
        is_top_level_type: Option<OperationType>,
        fields: impl IntoIterator<Item = Field>,
        implements: Vec<String>,
    ) -> Self {
        Self {
            typename_field: Field::new_typename(),
            introspection_fields: introspection_fields(is_top_level_type),
            name: name.into(),
            is_top_level_type,
            fields: fields_by_name(fields),
            implements,
        }
    }

    pub fn maybe_field(&self, name: &str) -> Option<&Field> {
        match name {
            "__typename" => Some(&self.typename_field),
            name => self
                .fields
                .get(name)
                .or_else(|| self.introspection_fields.get(name)),
        }
    }
}

impl TypeInterface for ObjectType {
    fn name(&self) -> &str {
        &self.name
    }
}

fn introspection_fields(is_top_level_type: Option<OperationType>) -> IndexMap<String, Field> {
    is_top_level_type
        .if_is(OperationType::Query)
        .map(|_| fields_by_name([Field::new_introspection_type()]))
        .unwrap_or_default()
}

fn fields_by_name(fields: impl IntoIterator<Item = Field>) -> IndexMap<String, Field> {
    fields
        .into_iter()
        .map(|field| (field.name.clone(), field))
        .collect()
}

fn params_by_name(params: impl IntoIterator<Item = Param>) -> IndexMap<String, Param> {
    params
        .into_iter()
        .map(|param| (param.name.clone(), param))
        .collect()
}

#[derive(Debug)]
pub enum ScalarType {
    BuiltIn(BuiltInScalarType),
    Custom(String),
}

impl TypeInterface for ScalarType {
    fn name(&self) -> &str {
        match self {
            Self::BuiltIn(type_) => {
                let name: &'static str = type_.into();
                name
            }
            Self::Custom(name) => name,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum BuiltInScalarType {
    Int,
    Float,
    String,
    Boolean,
    #[strum(serialize = "ID")]
    Id,
}

#[derive(Debug)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|existing| existing == value)
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct InputObjectType {
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(custom))]
    pub fields: IndexMap<String, Param>,
}

impl InputObjectTypeBuilder {
    pub fn fields(self, fields: impl IntoIterator<Item = Param>) -> Self {
        let mut new = self;
        new.fields = Some(params_by_name(fields));
        new
    }
}

impl InputObjectType {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = Param>) -> Self {
        Self {
            name: name.into(),
            fields: params_by_name(fields),
        }
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct Field {
    #[builder(setter(into))]
    pub name: String,
    pub type_: TypeFull,
    #[builder(setter(custom), default)]
    pub params: IndexMap<String, Param>,
}

impl FieldBuilder {
    pub fn params(self, params: impl IntoIterator<Item = Param>) -> Self {
        let mut new = self;
        new.params = Some(params_by_name(params));
        new
    }
}

impl Field {
    pub fn new(
        name: impl Into<String>,
        type_: TypeFull,
        params: impl IntoIterator<Item = Param>,
    ) -> Self {
        Self {
            name: name.into(),
            type_,
            params: params_by_name(params),
        }
    }

    pub fn new_typename() -> Self {
        Self::new(
            "__typename",
            TypeFull::non_null(TypeFull::named("String")),
            [],
        )
    }

    pub fn new_introspection_type() -> Self {
        Self::new(
            "__type",
            TypeFull::named("__Type"),
            [Param::new(
                "name",
                TypeFull::non_null(TypeFull::named("String")),
            )],
        )
    }
}

#[derive(Debug)]
pub struct Union {
    pub name: String,
    pub types: Vec<String>,
}

impl Union {
    pub fn new(name: String, types: Vec<String>) -> Self {
        Self { name, types }
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct Interface {
    #[builder(setter(skip), default = "Field::new_typename()")]
    pub typename_field: Field,
    #[builder(setter(into))]
    pub name: String,
    #[builder(setter(custom))]
    pub fields: IndexMap<String, Field>,
    #[builder(default)]
    pub implements: Vec<String>,
}

impl InterfaceBuilder {
    pub fn fields(self, fields: impl IntoIterator<Item = Field>) -> Self {
        let mut new = self;
        new.fields = Some(fields_by_name(fields));
        new
    }
}

impl Interface {
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = Field>,
        implements: Vec<String>,
    ) -> Self {
        Self {
            typename_field: Field::new_typename(),
            name: name.into(),
            fields: fields_by_name(fields),
            implements,
        }
    }

    pub fn maybe_field(&self, name: &str) -> Option<&Field> {
        match name {
            "__typename" => Some(&self.typename_field),
            name => self.fields.get(name),
        }
    }
}

#[derive(Debug)]
pub struct Param {
    pub name: String,
    pub type_: TypeFull,
    pub default_value: Option<Value>,
}

impl Param {
    pub fn new(name: impl Into<String>, type_: TypeFull) -> Self {
        Self {
            name: name.into(),
            type_,
            default_value: _d(),
        }
    }

    pub fn new_with_default(name: impl Into<String>, type_: TypeFull, default_value: Value) -> Self {
        Self {
            name: name.into(),
            type_,
            default_value: Some(default_value),
        }
    }

    /// Non-null without a default, so it must be supplied.
    pub fn is_required(&self) -> bool {
        self.type_.is_non_null() && self.default_value.is_none()
    }
}

pub fn builtin_types() -> HashMap<String, Type> {
    BuiltInScalarType::iter()
        .map(|scalar| Type::Scalar(ScalarType::BuiltIn(scalar)))
        .chain([introspection_type_type()])
        .map(|type_| (type_.name().to_owned(), type_))
        .collect()
}

pub fn introspection_type_type() -> Type {
    Type::Object(ObjectType::new(
        "__Type",
        None,
        [
            Field::new("name", TypeFull::named("String"), []),
            Field::new(
                "kind",
                TypeFull::non_null(TypeFull::named("String")),
                [],
            ),
        ],
        _d(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_full_display() {
        assert_eq!(
            TypeFull::non_null(TypeFull::list(TypeFull::non_null(TypeFull::named("Int"))))
                .to_string(),
            "[Int!]!"
        );
        assert_eq!(TypeFull::named("Actor").to_string(), "Actor");
    }

    #[test]
    fn test_type_full_name_strips_wrappers() {
        assert_eq!(
            TypeFull::list(TypeFull::list(TypeFull::non_null(TypeFull::named("ID")))).name(),
            "ID"
        );
    }

    #[test]
    fn test_builtin_scalar_names() {
        let types = builtin_types();
        for name in ["Int", "Float", "String", "Boolean", "ID", "__Type"] {
            assert!(types.contains_key(name), "missing `{name}`");
        }
    }

    #[test]
    fn test_query_type_gets_introspection_field() {
        let query = ObjectType::new("Query", Some(OperationType::Query), [], _d());
        assert!(query.maybe_field("__type").is_some());
        assert!(query.maybe_field("__typename").is_some());

        let other = ObjectType::new("Actor", None, [], _d());
        assert!(other.maybe_field("__type").is_none());
    }

    #[test]
    fn test_required_param() {
        assert!(Param::new("id", TypeFull::non_null(TypeFull::named("ID"))).is_required());
        assert!(!Param::new("id", TypeFull::named("ID")).is_required());
        assert!(!Param::new_with_default(
            "first",
            TypeFull::non_null(TypeFull::named("Int")),
            Value::Int(10)
        )
        .is_required());
    }
}
