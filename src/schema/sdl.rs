use std::collections::HashMap;

use graphql_parser::schema::{
    self as sdl, Definition, DirectiveLocation as SdlDirectiveLocation, TypeDefinition,
};
use squalid::_d;
use tracing::instrument;

use crate::{
    parser::{convert_type, convert_value},
    types::Field,
    BuiltInScalarType, DirectiveDefinition, DirectiveLocation, EnumType, Error, InputObjectType,
    Interface, ObjectType, OperationType, Param, Result, ScalarType, Schema, Type, Union,
};

impl Schema {
    /// Builds a schema from SDL text. Root operation types come from a
    /// `schema { ... }` definition when there is one, otherwise from the
    /// conventional `Query`/`Mutation`/`Subscription` type names.
    #[instrument(level = "trace", skip(source))]
    pub fn from_sdl(source: &str) -> Result<Self> {
        let document = sdl::parse_schema::<String>(source)
            .map_err(|error| Error::SchemaParse(error.to_string()))?;

        let mut root_type_names: HashMap<String, OperationType> = _d();
        let schema_definition = document.definitions.iter().find_map(|definition| match definition {
            Definition::SchemaDefinition(schema_definition) => Some(schema_definition),
            _ => None,
        });
        match schema_definition {
            Some(schema_definition) => {
                for (name, operation_type) in [
                    (&schema_definition.query, OperationType::Query),
                    (&schema_definition.mutation, OperationType::Mutation),
                    (&schema_definition.subscription, OperationType::Subscription),
                ] {
                    if let Some(name) = name {
                        root_type_names.insert(name.clone(), operation_type);
                    }
                }
            }
            None => {
                for (name, operation_type) in [
                    ("Query", OperationType::Query),
                    ("Mutation", OperationType::Mutation),
                    ("Subscription", OperationType::Subscription),
                ] {
                    root_type_names.insert(name.to_owned(), operation_type);
                }
            }
        }

        let mut types: Vec<Type> = _d();
        let mut unions: Vec<Union> = _d();
        let mut interfaces: Vec<Interface> = _d();
        let mut directives: Vec<DirectiveDefinition> = _d();

        for definition in &document.definitions {
            match definition {
                Definition::SchemaDefinition(_) => {}
                Definition::TypeDefinition(type_definition) => match type_definition {
                    TypeDefinition::Scalar(scalar) => {
                        if scalar.name.parse::<BuiltInScalarType>().is_err() {
                            types.push(Type::Scalar(ScalarType::Custom(scalar.name.clone())));
                        }
                    }
                    TypeDefinition::Object(object) => {
                        types.push(Type::Object(ObjectType::new(
                            object.name.as_str(),
                            root_type_names.get(&object.name).copied(),
                            object
                                .fields
                                .iter()
                                .map(convert_field)
                                .collect::<Result<Vec<_>>>()?,
                            object.implements_interfaces.clone(),
                        )));
                    }
                    TypeDefinition::Interface(interface) => {
                        interfaces.push(Interface::new(
                            interface.name.as_str(),
                            interface
                                .fields
                                .iter()
                                .map(convert_field)
                                .collect::<Result<Vec<_>>>()?,
                            interface.implements_interfaces.clone(),
                        ));
                    }
                    TypeDefinition::Union(union) => {
                        unions.push(Union::new(union.name.clone(), union.types.clone()));
                    }
                    TypeDefinition::Enum(enum_) => {
                        types.push(Type::Enum(EnumType::new(
                            enum_.name.as_str(),
                            enum_.values.iter().map(|value| value.name.as_str()),
                        )));
                    }
                    TypeDefinition::InputObject(input_object) => {
                        types.push(Type::InputObject(InputObjectType::new(
                            input_object.name.as_str(),
                            input_object
                                .fields
                                .iter()
                                .map(convert_input_value)
                                .collect::<Result<Vec<_>>>()?,
                        )));
                    }
                },
                Definition::TypeExtension(_) => {
                    return Err(Error::UnsupportedSchemaDefinition(
                        "type extensions".to_owned(),
                    ));
                }
                Definition::DirectiveDefinition(directive) => {
                    directives.push(DirectiveDefinition::new(
                        directive.name.as_str(),
                        directive.locations.iter().map(convert_directive_location).collect(),
                        directive
                            .arguments
                            .iter()
                            .map(convert_input_value)
                            .collect::<Result<Vec<_>>>()?,
                        directive.repeatable,
                    ));
                }
            }
        }

        Self::try_new(types, unions, interfaces, directives)
    }
}

fn convert_field(field: &sdl::Field<'_, String>) -> Result<Field> {
    Ok(Field::new(
        field.name.as_str(),
        convert_type(&field.field_type),
        field
            .arguments
            .iter()
            .map(convert_input_value)
            .collect::<Result<Vec<_>>>()?,
    ))
}

fn convert_input_value(input_value: &sdl::InputValue<'_, String>) -> Result<Param> {
    let type_ = convert_type(&input_value.value_type);
    Ok(match input_value.default_value.as_ref() {
        Some(default_value) => Param::new_with_default(
            input_value.name.as_str(),
            type_,
            convert_value(default_value)?,
        ),
        None => Param::new(input_value.name.as_str(), type_),
    })
}

fn convert_directive_location(location: &SdlDirectiveLocation) -> DirectiveLocation {
    match location {
        SdlDirectiveLocation::Query => DirectiveLocation::Query,
        SdlDirectiveLocation::Mutation => DirectiveLocation::Mutation,
        SdlDirectiveLocation::Subscription => DirectiveLocation::Subscription,
        SdlDirectiveLocation::Field => DirectiveLocation::Field,
        SdlDirectiveLocation::FragmentDefinition => DirectiveLocation::FragmentDefinition,
        SdlDirectiveLocation::FragmentSpread => DirectiveLocation::FragmentSpread,
        SdlDirectiveLocation::InlineFragment => DirectiveLocation::InlineFragment,
        SdlDirectiveLocation::VariableDefinition => DirectiveLocation::VariableDefinition,
        SdlDirectiveLocation::Schema => DirectiveLocation::Schema,
        SdlDirectiveLocation::Scalar => DirectiveLocation::Scalar,
        SdlDirectiveLocation::Object => DirectiveLocation::Object,
        SdlDirectiveLocation::FieldDefinition => DirectiveLocation::FieldDefinition,
        SdlDirectiveLocation::ArgumentDefinition => DirectiveLocation::ArgumentDefinition,
        SdlDirectiveLocation::Interface => DirectiveLocation::Interface,
        SdlDirectiveLocation::Union => DirectiveLocation::Union,
        SdlDirectiveLocation::Enum => DirectiveLocation::Enum,
        SdlDirectiveLocation::EnumValue => DirectiveLocation::EnumValue,
        SdlDirectiveLocation::InputObject => DirectiveLocation::InputObject,
        SdlDirectiveLocation::InputFieldDefinition => DirectiveLocation::InputFieldDefinition,
    }
}
