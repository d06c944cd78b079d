use std::collections::{HashMap, HashSet};

use squalid::_d;
use tracing::instrument;

use crate::{
    builtin_directives, builtin_types, types::Field, DirectiveDefinition, Error, IndexMap,
    Interface, OperationType, Param, Result, Type, TypeInterface, Union,
};

mod sdl;
mod validation;

pub use validation::{Rule, ValidatedRequest, ValidationError, ValidationRequestOrErrors};

#[derive(Debug)]
pub struct Schema {
    pub types: HashMap<String, Type>,
    pub query_type_name: String,
    pub mutation_type_name: Option<String>,
    pub subscription_type_name: Option<String>,
    builtin_types: HashMap<String, Type>,
    pub unions: HashMap<String, Union>,
    pub interfaces: HashMap<String, Interface>,
    pub interface_all_concrete_types: HashMap<String, HashSet<String>>,
    pub directives: HashMap<String, DirectiveDefinition>,
    pub dummy_union_typename_field: Field,
}

impl Schema {
    /// Root operation types are the object types flagged with
    /// `is_top_level_type`; exactly one of them must be the query type.
    #[instrument(level = "trace", skip(types, unions, interfaces, directives))]
    pub fn try_new(
        types: Vec<Type>,
        unions: Vec<Union>,
        interfaces: Vec<Interface>,
        directives: Vec<DirectiveDefinition>,
    ) -> Result<Self> {
        let root_type_name = |operation_type: OperationType| {
            types
                .iter()
                .find(|type_| type_.top_level_type() == Some(operation_type))
                .map(|type_| type_.name().to_owned())
        };
        let query_type_name =
            root_type_name(OperationType::Query).ok_or(Error::NoQueryTypeSpecified)?;
        let mutation_type_name = root_type_name(OperationType::Mutation);
        let subscription_type_name = root_type_name(OperationType::Subscription);

        let mut seen_names: HashSet<&str> = _d();
        for name in types
            .iter()
            .map(|type_| type_.name())
            .chain(unions.iter().map(|union| &*union.name))
            .chain(interfaces.iter().map(|interface| &*interface.name))
        {
            if !seen_names.insert(name) {
                return Err(Error::DuplicateTypeName(name.into()));
            }
        }

        let interface_all_concrete_types = interfaces
            .iter()
            .map(|interface| {
                (
                    interface.name.clone(),
                    types
                        .iter()
                        .filter_map(|type_| match type_ {
                            Type::Object(object_type)
                                if object_type
                                    .implements
                                    .iter()
                                    .any(|implement| implement == &interface.name) =>
                            {
                                Some(object_type.name.clone())
                            }
                            _ => None,
                        })
                        .collect(),
                )
            })
            .collect();

        let mut directives_by_name: HashMap<String, DirectiveDefinition> = builtin_directives()
            .into_iter()
            .map(|directive| (directive.name.clone(), directive))
            .collect();
        let mut seen_directive_names: HashSet<String> = _d();
        for directive in directives {
            if !seen_directive_names.insert(directive.name.clone()) {
                return Err(Error::DuplicateDirectiveName(directive.name.as_str().into()));
            }
            directives_by_name.insert(directive.name.clone(), directive);
        }

        let schema = Self {
            types: types
                .into_iter()
                .map(|type_| (type_.name().to_owned(), type_))
                .collect(),
            query_type_name,
            mutation_type_name,
            subscription_type_name,
            builtin_types: builtin_types(),
            unions: unions
                .into_iter()
                .map(|union| (union.name.clone(), union))
                .collect(),
            interfaces: interfaces
                .into_iter()
                .map(|interface| (interface.name.clone(), interface))
                .collect(),
            interface_all_concrete_types,
            directives: directives_by_name,
            dummy_union_typename_field: Field::new_typename(),
        };
        schema.check_type_references()?;
        Ok(schema)
    }

    #[instrument(level = "trace", skip(self))]
    fn check_type_references(&self) -> Result<()> {
        for type_ in self.types.values() {
            match type_ {
                Type::Object(object_type) => {
                    self.check_field_references(&object_type.fields, &object_type.name)?;
                    for implement in &object_type.implements {
                        if !self.interfaces.contains_key(implement) {
                            return Err(unknown_type_reference(implement, &object_type.name));
                        }
                    }
                }
                Type::InputObject(input_object_type) => {
                    self.check_param_references(
                        &input_object_type.fields,
                        &input_object_type.name,
                    )?;
                }
                Type::Scalar(_) | Type::Enum(_) => {}
            }
        }
        for interface in self.interfaces.values() {
            self.check_field_references(&interface.fields, &interface.name)?;
        }
        for union in self.unions.values() {
            for member in &union.types {
                if !self
                    .maybe_type(member)
                    .is_some_and(|type_| matches!(type_, Type::Object(_)))
                {
                    return Err(unknown_type_reference(member, &union.name));
                }
            }
        }
        for directive in self.directives.values() {
            self.check_param_references(&directive.params, &format!("@{}", directive.name))?;
        }
        Ok(())
    }

    fn check_field_references(&self, fields: &IndexMap<String, Field>, owner: &str) -> Result<()> {
        for field in fields.values() {
            let referenced_from = format!("{owner}.{}", field.name);
            if self.maybe_type_or_union_or_interface(field.type_.name()).is_none() {
                return Err(unknown_type_reference(field.type_.name(), &referenced_from));
            }
            self.check_param_references(&field.params, &referenced_from)?;
        }
        Ok(())
    }

    fn check_param_references(&self, params: &IndexMap<String, Param>, owner: &str) -> Result<()> {
        for param in params.values() {
            if self.maybe_type(param.type_.name()).is_none() {
                return Err(unknown_type_reference(
                    param.type_.name(),
                    &format!("{owner}({})", param.name),
                ));
            }
        }
        Ok(())
    }

    pub fn type_name_for_operation_type(&self, operation_type: OperationType) -> Option<&str> {
        match operation_type {
            OperationType::Query => Some(&self.query_type_name),
            OperationType::Mutation => self.mutation_type_name.as_deref(),
            OperationType::Subscription => self.subscription_type_name.as_deref(),
        }
    }

    pub fn maybe_root_type(
        &self,
        operation_type: OperationType,
    ) -> Option<TypeOrUnionOrInterface<'_>> {
        self.type_name_for_operation_type(operation_type)
            .and_then(|name| self.maybe_type_or_union_or_interface(name))
    }

    pub fn maybe_type(&self, name: &str) -> Option<&Type> {
        self.types
            .get(name)
            .or_else(|| self.builtin_types.get(name))
    }

    pub fn maybe_type_or_union_or_interface<'a>(
        &'a self,
        name: &str,
    ) -> Option<TypeOrUnionOrInterface<'a>> {
        if let Some(type_) = self.maybe_type(name) {
            return Some(TypeOrUnionOrInterface::Type(type_));
        }
        if let Some(union) = self.unions.get(name) {
            return Some(TypeOrUnionOrInterface::Union(union));
        }
        if let Some(interface) = self.interfaces.get(name) {
            return Some(TypeOrUnionOrInterface::Interface(interface));
        }
        None
    }

    /// Object, interface or union: the types that can carry a selection set.
    pub fn maybe_composite_type<'a>(&'a self, name: &str) -> Option<TypeOrUnionOrInterface<'a>> {
        self.maybe_type_or_union_or_interface(name)
            .filter(|type_| type_.is_composite())
    }

    pub fn is_input_type(&self, name: &str) -> bool {
        self.maybe_type(name).is_some_and(Type::is_input)
    }

    pub fn is_leaf_type(&self, name: &str) -> bool {
        self.maybe_type(name).is_some_and(Type::is_leaf)
    }

    pub fn maybe_field_on<'a>(
        &'a self,
        enclosing_type: TypeOrUnionOrInterface<'a>,
        name: &str,
    ) -> Option<&'a Field> {
        match enclosing_type {
            TypeOrUnionOrInterface::Type(type_) => {
                type_.maybe_as_object().and_then(|object| object.maybe_field(name))
            }
            TypeOrUnionOrInterface::Interface(interface) => interface.maybe_field(name),
            TypeOrUnionOrInterface::Union(_) => {
                (name == "__typename").then_some(&self.dummy_union_typename_field)
            }
        }
    }

    pub fn maybe_directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    /// The concrete object types a value of `type_or_union_or_interface`
    /// can be at runtime.
    pub fn all_concrete_type_names<'a>(
        &'a self,
        type_or_union_or_interface: TypeOrUnionOrInterface<'a>,
    ) -> HashSet<&'a str> {
        match type_or_union_or_interface {
            TypeOrUnionOrInterface::Type(type_) => [type_.name()].into_iter().collect(),
            TypeOrUnionOrInterface::Union(union) => {
                union.types.iter().map(|name| name.as_str()).collect()
            }
            TypeOrUnionOrInterface::Interface(interface) => self
                .interface_all_concrete_types
                .get(&interface.name)
                .map(|names| names.iter().map(|name| name.as_str()).collect())
                .unwrap_or_default(),
        }
    }
}

fn unknown_type_reference(type_name: &str, referenced_from: &str) -> Error {
    Error::UnknownTypeReference {
        type_name: type_name.into(),
        referenced_from: referenced_from.into(),
    }
}

#[derive(Copy, Clone, Debug)]
pub enum TypeOrUnionOrInterface<'a> {
    Type(&'a Type),
    Union(&'a Union),
    Interface(&'a Interface),
}

impl<'a> TypeOrUnionOrInterface<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Type(type_) => type_.name(),
            Self::Union(union) => &union.name,
            Self::Interface(interface) => &interface.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Type(type_) => type_.kind(),
            Self::Union(_) => "union",
            Self::Interface(_) => "interface",
        }
    }

    pub fn is_composite(&self) -> bool {
        match self {
            Self::Type(Type::Object(_)) => true,
            Self::Union(_) => true,
            Self::Interface(_) => true,
            _ => false,
        }
    }
}
