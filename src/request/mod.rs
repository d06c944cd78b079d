use std::{collections::HashMap, fmt};

use derive_builder::Builder;
use indexmap::IndexSet;
use itertools::Itertools;
use smol_str::SmolStr;
use squalid::_d;

use crate::{IndexMap, Location, OperationType, TypeFull};

#[derive(Debug)]
pub struct Request {
    pub document: Document,
}

impl Request {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    pub fn maybe_fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.document.maybe_fragment(name)
    }
}

#[derive(Debug)]
pub struct Document {
    pub definitions: Vec<ExecutableDefinition>,
    fragments_by_name: HashMap<SmolStr, usize>,
}

impl Document {
    pub fn new(mut definitions: Vec<ExecutableDefinition>) -> Self {
        let mut next_id = 0;
        for definition in &mut definitions {
            match definition {
                ExecutableDefinition::Operation(operation_definition) => {
                    number_selection_sets(&mut operation_definition.selection_set, &mut next_id);
                }
                ExecutableDefinition::Fragment(fragment_definition) => {
                    number_selection_sets(&mut fragment_definition.selection_set, &mut next_id);
                }
            }
        }

        let mut fragments_by_name: HashMap<SmolStr, usize> = _d();
        definitions
            .iter()
            .enumerate()
            .filter_map(|(index, definition)| {
                definition
                    .maybe_as_fragment_definition()
                    .map(|fragment| (fragment.name.clone(), index))
            })
            .for_each(|(name, index)| {
                fragments_by_name.entry(name).or_insert(index);
            });

        Self {
            definitions,
            fragments_by_name,
        }
    }

    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions
            .iter()
            .filter_map(|definition| definition.maybe_as_operation_definition())
    }

    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.definitions
            .iter()
            .filter_map(|definition| definition.maybe_as_fragment_definition())
    }

    /// When several fragments share a name, the first one wins.
    pub fn maybe_fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments_by_name
            .get(name)
            .and_then(|index| self.definitions[*index].maybe_as_fragment_definition())
    }

    /// Every fragment name spread from `selection_set`, directly or through
    /// other (known) fragments, in discovery order. Each fragment body is
    /// entered at most once, so cyclic spreads terminate.
    pub fn fragment_spread_names<'a>(&'a self, selection_set: &'a SelectionSet) -> IndexSet<&'a str> {
        let mut seen: IndexSet<&'a str> = _d();
        let mut pending = vec![selection_set];
        while let Some(selection_set) = pending.pop() {
            for fragment_spread in selection_set.fragment_spreads() {
                if !seen.insert(fragment_spread.name.as_str()) {
                    continue;
                }
                if let Some(fragment) = self.maybe_fragment(&fragment_spread.name) {
                    pending.push(&fragment.selection_set);
                }
            }
        }
        seen
    }
}

fn number_selection_sets(selection_set: &mut SelectionSet, next_id: &mut usize) {
    selection_set.id = SelectionSetId(*next_id);
    *next_id += 1;
    for selection in &mut selection_set.items {
        match selection {
            Selection::Field(field) => {
                if let Some(selection_set) = field.selection_set.as_mut() {
                    number_selection_sets(selection_set, next_id);
                }
            }
            Selection::InlineFragment(inline_fragment) => {
                number_selection_sets(&mut inline_fragment.selection_set, next_id);
            }
            Selection::FragmentSpread(_) => {}
        }
    }
}

#[derive(Debug)]
pub enum ExecutableDefinition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
}

impl ExecutableDefinition {
    pub fn maybe_as_operation_definition(&self) -> Option<&OperationDefinition> {
        match self {
            Self::Operation(operation_definition) => Some(operation_definition),
            _ => None,
        }
    }

    pub fn maybe_as_fragment_definition(&self) -> Option<&FragmentDefinition> {
        match self {
            Self::Fragment(fragment_definition) => Some(fragment_definition),
            _ => None,
        }
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct OperationDefinition {
    pub operation_type: OperationType,
    #[builder(setter(into), default)]
    pub name: Option<SmolStr>,
    #[builder(default)]
    pub variable_definitions: Vec<VariableDefinition>,
    pub selection_set: SelectionSet,
    #[builder(default)]
    pub directives: Vec<Directive>,
    #[builder(setter(strip_option), default)]
    pub location: Option<Location>,
}

impl OperationDefinition {
    pub fn maybe_variable_definition(&self, name: &str) -> Option<&VariableDefinition> {
        self.variable_definitions
            .iter()
            .find(|variable_definition| variable_definition.name == name)
    }
}

#[derive(Debug)]
pub struct VariableDefinition {
    pub name: SmolStr,
    pub type_: TypeFull,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
    pub location: Option<Location>,
}

impl VariableDefinition {
    pub fn new(
        name: SmolStr,
        type_: TypeFull,
        default_value: Option<Value>,
        directives: Vec<Directive>,
        location: Option<Location>,
    ) -> Self {
        Self {
            name,
            type_,
            default_value,
            directives,
            location,
        }
    }
}

#[derive(Debug)]
pub struct FragmentDefinition {
    pub name: SmolStr,
    pub on: SmolStr,
    pub selection_set: SelectionSet,
    pub directives: Vec<Directive>,
    pub location: Option<Location>,
}

impl FragmentDefinition {
    pub fn new(
        name: SmolStr,
        on: SmolStr,
        directives: Vec<Directive>,
        selection_set: SelectionSet,
        location: Option<Location>,
    ) -> Self {
        Self {
            name,
            on,
            selection_set,
            directives,
            location,
        }
    }
}

/// Index of a selection set within its document, assigned in document
/// order by [`Document::new`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionSetId(pub usize);

#[derive(Debug)]
pub struct SelectionSet {
    pub id: SelectionSetId,
    pub items: Vec<Selection>,
    pub location: Option<Location>,
}

impl SelectionSet {
    pub fn new(items: Vec<Selection>, location: Option<Location>) -> Self {
        Self {
            id: _d(),
            items,
            location,
        }
    }

    /// Direct fragment spreads, including those nested in inline fragments
    /// and field sub-selections.
    pub fn fragment_spreads(&self) -> Vec<&FragmentSpread> {
        self.items
            .iter()
            .flat_map(|selection| match selection {
                Selection::Field(field) => field
                    .selection_set
                    .as_ref()
                    .map(|selection_set| selection_set.fragment_spreads())
                    .unwrap_or_default(),
                Selection::FragmentSpread(fragment_spread) => vec![fragment_spread],
                Selection::InlineFragment(inline_fragment) => {
                    inline_fragment.selection_set.fragment_spreads()
                }
            })
            .collect()
    }
}

impl From<Vec<Selection>> for SelectionSet {
    fn from(value: Vec<Selection>) -> Self {
        Self::new(value, None)
    }
}

#[derive(Debug)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

impl Selection {
    pub fn maybe_as_field(&self) -> Option<&Field> {
        match self {
            Self::Field(field) => Some(field),
            _ => None,
        }
    }
}

#[derive(Builder, Debug)]
#[builder(pattern = "owned")]
pub struct Field {
    #[builder(setter(into), default)]
    pub alias: Option<SmolStr>,
    #[builder(setter(into))]
    pub name: SmolStr,
    #[builder(setter(strip_option, into), default)]
    pub selection_set: Option<SelectionSet>,
    #[builder(setter(custom), default)]
    pub arguments: Vec<Argument>,
    #[builder(default)]
    pub directives: Vec<Directive>,
    #[builder(setter(strip_option), default)]
    pub location: Option<Location>,
}

impl FieldBuilder {
    pub fn arguments(self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        let mut new = self;
        new.arguments = Some(arguments.into_iter().collect());
        new
    }
}

impl Field {
    /// The key this field is written under in the response.
    pub fn response_name(&self) -> &SmolStr {
        self.alias.as_ref().unwrap_or(&self.name)
    }

}

#[derive(Debug)]
pub struct FragmentSpread {
    pub name: SmolStr,
    pub directives: Vec<Directive>,
    pub location: Option<Location>,
}

impl FragmentSpread {
    pub fn new(name: SmolStr, directives: Vec<Directive>, location: Option<Location>) -> Self {
        Self {
            name,
            directives,
            location,
        }
    }
}

#[derive(Debug)]
pub struct InlineFragment {
    pub on: Option<SmolStr>,
    pub selection_set: SelectionSet,
    pub directives: Vec<Directive>,
    pub location: Option<Location>,
}

impl InlineFragment {
    pub fn new(
        on: Option<SmolStr>,
        directives: Vec<Directive>,
        selection_set: SelectionSet,
        location: Option<Location>,
    ) -> Self {
        Self {
            on,
            selection_set,
            directives,
            location,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: SmolStr,
    pub value: Value,
}

impl Argument {
    pub fn new(name: impl Into<SmolStr>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    String(SmolStr),
    Bool(bool),
    Null,
    EnumVariant(SmolStr),
    List(Vec<Value>),
    Object(IndexMap<SmolStr, Value>),
    Variable(SmolStr),
}

impl Value {
    /// Names of every variable referenced anywhere inside this value.
    pub fn variable_names(&self) -> Vec<&SmolStr> {
        match self {
            Self::Variable(name) => vec![name],
            Self::List(items) => items.iter().flat_map(Value::variable_names).collect(),
            Self::Object(fields) => fields.values().flat_map(Value::variable_names).collect(),
            _ => _d(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{:?}", value.as_str()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Null => write!(f, "null"),
            Self::EnumVariant(value) => write!(f, "{value}"),
            Self::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            Self::Object(fields) => write!(
                f,
                "{{{}}}",
                fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .join(", ")
            ),
            Self::Variable(name) => write!(f, "${name}"),
        }
    }
}

#[derive(Debug)]
pub struct Directive {
    pub name: SmolStr,
    pub arguments: Vec<Argument>,
    pub location: Option<Location>,
}

impl Directive {
    pub fn new(name: SmolStr, arguments: Vec<Argument>, location: Option<Location>) -> Self {
        Self {
            name,
            arguments,
            location,
        }
    }
}
