mod error;
mod inscribe;
mod operation;
mod parser;
mod positions;
mod request;
mod schema;
mod types;

pub use indexmap::IndexMap;

pub use crate::error::{Error, Result};
pub use crate::inscribe::json_from_errors;
pub use crate::operation::OperationType;
pub use crate::parser::parse;
pub use crate::positions::Location;
pub use crate::request::{
    Argument, Directive, Document, ExecutableDefinition, Field as SelectionField,
    FieldBuilder as SelectionFieldBuilder, FragmentDefinition, FragmentSpread, InlineFragment,
    OperationDefinition, OperationDefinitionBuilder, Request, Selection, SelectionSet,
    SelectionSetId, Value, VariableDefinition,
};
pub use crate::schema::{
    Rule, Schema, TypeOrUnionOrInterface, ValidatedRequest, ValidationError,
    ValidationRequestOrErrors,
};
pub use crate::types::{
    builtin_directives, builtin_types, BuiltInScalarType, DirectiveDefinition,
    DirectiveDefinitionBuilder, DirectiveLocation, EnumType, Field as TypeField,
    FieldBuilder as TypeFieldBuilder, InputObjectType, InputObjectTypeBuilder, Interface,
    InterfaceBuilder, ObjectType, ObjectTypeBuilder, Param, ScalarType, Type, TypeFull,
    TypeInterface, Union,
};
