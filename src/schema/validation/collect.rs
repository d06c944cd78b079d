use smallvec::SmallVec;
use squalid::_d;
use tracing::instrument;

use crate::{
    types::Field as TypeField, Directive, DirectiveLocation, ExecutableDefinition,
    FragmentDefinition, FragmentSpread, InlineFragment, OperationDefinition, Request, Schema,
    Selection, SelectionField, SelectionSet, TypeOrUnionOrInterface, VariableDefinition,
};

/// A node on the path from a top-level definition down to the node being
/// visited.
#[derive(Copy, Clone, Debug)]
pub(super) enum Ancestor<'a> {
    Operation(&'a OperationDefinition),
    FragmentDefinition(&'a FragmentDefinition),
    VariableDefinition(&'a VariableDefinition),
    Field(&'a SelectionField),
    FragmentSpread(&'a FragmentSpread),
    InlineFragment(&'a InlineFragment),
}

impl<'a> Ancestor<'a> {
    /// Where a directive attached directly to this node sits.
    pub fn directive_location(&self) -> DirectiveLocation {
        match self {
            Self::Operation(operation_definition) => operation_definition.operation_type.into(),
            Self::FragmentDefinition(_) => DirectiveLocation::FragmentDefinition,
            Self::VariableDefinition(_) => DirectiveLocation::VariableDefinition,
            Self::Field(_) => DirectiveLocation::Field,
            Self::FragmentSpread(_) => DirectiveLocation::FragmentSpread,
            Self::InlineFragment(_) => DirectiveLocation::InlineFragment,
        }
    }
}

pub(super) type Ancestors<'a> = SmallVec<[Ancestor<'a>; 8]>;

/// The selection set of the nearest enclosing field, operation or fragment
/// definition. Inline fragments don't open a scope of their own: their
/// fields are merged into the surrounding selection set.
pub(super) fn enclosing_scope<'a>(ancestors: &[Ancestor<'a>]) -> Option<&'a SelectionSet> {
    ancestors.iter().rev().find_map(|ancestor| match ancestor {
        Ancestor::Field(field) => field.selection_set.as_ref(),
        Ancestor::Operation(operation_definition) => Some(&operation_definition.selection_set),
        Ancestor::FragmentDefinition(fragment_definition) => {
            Some(&fragment_definition.selection_set)
        }
        _ => None,
    })
}

/// Walks every definition of the document without consulting the schema,
/// descending everywhere unless a hook asks not to.
///
/// Hooks receive the strict ancestors of the visited node; for
/// [`Collector::visit_directive`] the last ancestor is the node the
/// directive is attached to.
pub(super) trait Collector<
    'a,
    TItem,
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
>
{
    fn visit_operation(
        &self,
        _operation: &'a OperationDefinition,
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_fragment_definition(
        &self,
        _fragment_definition: &'a FragmentDefinition,
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_variable_definition(
        &self,
        _variable_definition: &'a VariableDefinition,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> TCollection {
        _d()
    }

    fn visit_field(
        &self,
        _field: &'a SelectionField,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_fragment_spread(
        &self,
        _fragment_spread: &'a FragmentSpread,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> TCollection {
        _d()
    }

    fn visit_inline_fragment(
        &self,
        _inline_fragment: &'a InlineFragment,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_directive(
        &self,
        _directive: &'a Directive,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> TCollection {
        _d()
    }
}

#[instrument(level = "trace", skip(collector, request, schema))]
pub(super) fn collect<'a, TItem, TCollection, TCollector>(
    collector: &TCollector,
    request: &'a Request,
    schema: &'a Schema,
) -> TCollection
where
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
    TCollector: Collector<'a, TItem, TCollection>,
{
    let mut ret: Vec<TItem> = _d();
    let mut ancestors: Ancestors<'a> = _d();

    for definition in &request.document.definitions {
        match definition {
            ExecutableDefinition::Operation(operation_definition) => {
                let (items, should_recurse) =
                    collector.visit_operation(operation_definition, schema, request);
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::Operation(operation_definition));
                for variable_definition in &operation_definition.variable_definitions {
                    ret.extend(collector.visit_variable_definition(
                        variable_definition,
                        &ancestors,
                        schema,
                        request,
                    ));
                    ancestors.push(Ancestor::VariableDefinition(variable_definition));
                    collect_directives(
                        collector,
                        &variable_definition.directives,
                        &ancestors,
                        request,
                        schema,
                        &mut ret,
                    );
                    ancestors.pop();
                }
                collect_selection_set(
                    collector,
                    &operation_definition.selection_set,
                    &mut ancestors,
                    request,
                    schema,
                    &mut ret,
                );
                collect_directives(
                    collector,
                    &operation_definition.directives,
                    &ancestors,
                    request,
                    schema,
                    &mut ret,
                );
                ancestors.pop();
            }
            ExecutableDefinition::Fragment(fragment_definition) => {
                let (items, should_recurse) =
                    collector.visit_fragment_definition(fragment_definition, schema, request);
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::FragmentDefinition(fragment_definition));
                collect_selection_set(
                    collector,
                    &fragment_definition.selection_set,
                    &mut ancestors,
                    request,
                    schema,
                    &mut ret,
                );
                collect_directives(
                    collector,
                    &fragment_definition.directives,
                    &ancestors,
                    request,
                    schema,
                    &mut ret,
                );
                ancestors.pop();
            }
        }
    }

    ret.into_iter().collect()
}

#[instrument(
    level = "trace",
    skip(collector, selection_set, ancestors, request, schema, ret)
)]
fn collect_selection_set<'a, TItem, TCollection, TCollector>(
    collector: &TCollector,
    selection_set: &'a SelectionSet,
    ancestors: &mut Ancestors<'a>,
    request: &'a Request,
    schema: &'a Schema,
    ret: &mut Vec<TItem>,
) where
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
    TCollector: Collector<'a, TItem, TCollection>,
{
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                let (items, should_recurse) =
                    collector.visit_field(field, ancestors, schema, request);
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::Field(field));
                if let Some(selection_set) = field.selection_set.as_ref() {
                    collect_selection_set(collector, selection_set, ancestors, request, schema, ret);
                }
                collect_directives(collector, &field.directives, ancestors, request, schema, ret);
                ancestors.pop();
            }
            Selection::InlineFragment(inline_fragment) => {
                let (items, should_recurse) =
                    collector.visit_inline_fragment(inline_fragment, ancestors, schema, request);
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::InlineFragment(inline_fragment));
                collect_selection_set(
                    collector,
                    &inline_fragment.selection_set,
                    ancestors,
                    request,
                    schema,
                    ret,
                );
                collect_directives(
                    collector,
                    &inline_fragment.directives,
                    ancestors,
                    request,
                    schema,
                    ret,
                );
                ancestors.pop();
            }
            Selection::FragmentSpread(fragment_spread) => {
                ret.extend(collector.visit_fragment_spread(
                    fragment_spread,
                    ancestors,
                    schema,
                    request,
                ));
                ancestors.push(Ancestor::FragmentSpread(fragment_spread));
                collect_directives(
                    collector,
                    &fragment_spread.directives,
                    ancestors,
                    request,
                    schema,
                    ret,
                );
                ancestors.pop();
            }
        }
    }
}

fn collect_directives<'a, TItem, TCollection, TCollector>(
    collector: &TCollector,
    directives: &'a [Directive],
    ancestors: &[Ancestor<'a>],
    request: &'a Request,
    schema: &'a Schema,
    ret: &mut Vec<TItem>,
) where
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
    TCollector: Collector<'a, TItem, TCollection>,
{
    for directive in directives {
        ret.extend(collector.visit_directive(directive, ancestors, schema, request));
    }
}

/// Like [`Collector`], but threads the schema type each selection set is
/// evaluated against.
///
/// Subtrees whose type context can't be resolved to a composite type (an
/// unknown root operation type, an unknown or scalar type condition, an
/// unknown field or a leaf-typed field) are not descended into; the rules
/// responsible for those problems report them on their own.
pub(super) trait CollectorTyped<
    'a,
    TItem,
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
>
{
    fn visit_operation(
        &self,
        _operation: &'a OperationDefinition,
        _root_type: Option<TypeOrUnionOrInterface<'a>>,
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_fragment_definition(
        &self,
        _fragment_definition: &'a FragmentDefinition,
        _type_condition: Option<TypeOrUnionOrInterface<'a>>,
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_field(
        &self,
        _field: &'a SelectionField,
        _type_field: Option<&'a TypeField>,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_fragment_spread(
        &self,
        _fragment_spread: &'a FragmentSpread,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> TCollection {
        _d()
    }

    fn visit_inline_fragment(
        &self,
        _inline_fragment: &'a InlineFragment,
        _enclosing_type: TypeOrUnionOrInterface<'a>,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> (TCollection, bool) {
        (_d(), true)
    }

    fn visit_directive(
        &self,
        _directive: &'a Directive,
        _ancestors: &[Ancestor<'a>],
        _schema: &'a Schema,
        _request: &'a Request,
    ) -> TCollection {
        _d()
    }
}

#[instrument(level = "trace", skip(collector, request, schema))]
pub(super) fn collect_typed<'a, TItem, TCollection, TCollector>(
    collector: &TCollector,
    request: &'a Request,
    schema: &'a Schema,
) -> TCollection
where
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
    TCollector: CollectorTyped<'a, TItem, TCollection>,
{
    let mut ret: Vec<TItem> = _d();
    let mut ancestors: Ancestors<'a> = _d();

    for definition in &request.document.definitions {
        match definition {
            ExecutableDefinition::Operation(operation_definition) => {
                let root_type = schema.maybe_root_type(operation_definition.operation_type);
                let (items, should_recurse) =
                    collector.visit_operation(operation_definition, root_type, schema, request);
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::Operation(operation_definition));
                if let Some(root_type) = root_type.filter(|root_type| root_type.is_composite()) {
                    collect_typed_selection_set(
                        collector,
                        &operation_definition.selection_set,
                        root_type,
                        &mut ancestors,
                        request,
                        schema,
                        &mut ret,
                    );
                }
                collect_typed_directives(
                    collector,
                    &operation_definition.directives,
                    &ancestors,
                    request,
                    schema,
                    &mut ret,
                );
                ancestors.pop();
            }
            ExecutableDefinition::Fragment(fragment_definition) => {
                let type_condition =
                    schema.maybe_type_or_union_or_interface(&fragment_definition.on);
                let (items, should_recurse) = collector.visit_fragment_definition(
                    fragment_definition,
                    type_condition,
                    schema,
                    request,
                );
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::FragmentDefinition(fragment_definition));
                if let Some(type_condition) =
                    type_condition.filter(|type_condition| type_condition.is_composite())
                {
                    collect_typed_selection_set(
                        collector,
                        &fragment_definition.selection_set,
                        type_condition,
                        &mut ancestors,
                        request,
                        schema,
                        &mut ret,
                    );
                }
                collect_typed_directives(
                    collector,
                    &fragment_definition.directives,
                    &ancestors,
                    request,
                    schema,
                    &mut ret,
                );
                ancestors.pop();
            }
        }
    }

    ret.into_iter().collect()
}

#[instrument(
    level = "trace",
    skip(collector, selection_set, enclosing_type, ancestors, request, schema, ret)
)]
fn collect_typed_selection_set<'a, TItem, TCollection, TCollector>(
    collector: &TCollector,
    selection_set: &'a SelectionSet,
    enclosing_type: TypeOrUnionOrInterface<'a>,
    ancestors: &mut Ancestors<'a>,
    request: &'a Request,
    schema: &'a Schema,
    ret: &mut Vec<TItem>,
) where
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
    TCollector: CollectorTyped<'a, TItem, TCollection>,
{
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                let type_field = schema.maybe_field_on(enclosing_type, &field.name);
                let (items, should_recurse) = collector.visit_field(
                    field,
                    type_field,
                    enclosing_type,
                    ancestors,
                    schema,
                    request,
                );
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::Field(field));
                if let (Some(selection_set), Some(field_type)) = (
                    field.selection_set.as_ref(),
                    type_field.and_then(|type_field| {
                        schema.maybe_composite_type(type_field.type_.name())
                    }),
                ) {
                    collect_typed_selection_set(
                        collector,
                        selection_set,
                        field_type,
                        ancestors,
                        request,
                        schema,
                        ret,
                    );
                }
                collect_typed_directives(
                    collector,
                    &field.directives,
                    ancestors,
                    request,
                    schema,
                    ret,
                );
                ancestors.pop();
            }
            Selection::InlineFragment(inline_fragment) => {
                let (items, should_recurse) = collector.visit_inline_fragment(
                    inline_fragment,
                    enclosing_type,
                    ancestors,
                    schema,
                    request,
                );
                ret.extend(items);
                if !should_recurse {
                    continue;
                }
                ancestors.push(Ancestor::InlineFragment(inline_fragment));
                let narrowed_type = match inline_fragment.on.as_ref() {
                    Some(on) => schema.maybe_composite_type(on),
                    None => Some(enclosing_type),
                };
                if let Some(narrowed_type) = narrowed_type {
                    collect_typed_selection_set(
                        collector,
                        &inline_fragment.selection_set,
                        narrowed_type,
                        ancestors,
                        request,
                        schema,
                        ret,
                    );
                }
                collect_typed_directives(
                    collector,
                    &inline_fragment.directives,
                    ancestors,
                    request,
                    schema,
                    ret,
                );
                ancestors.pop();
            }
            Selection::FragmentSpread(fragment_spread) => {
                ret.extend(collector.visit_fragment_spread(
                    fragment_spread,
                    enclosing_type,
                    ancestors,
                    schema,
                    request,
                ));
                ancestors.push(Ancestor::FragmentSpread(fragment_spread));
                collect_typed_directives(
                    collector,
                    &fragment_spread.directives,
                    ancestors,
                    request,
                    schema,
                    ret,
                );
                ancestors.pop();
            }
        }
    }
}

fn collect_typed_directives<'a, TItem, TCollection, TCollector>(
    collector: &TCollector,
    directives: &'a [Directive],
    ancestors: &[Ancestor<'a>],
    request: &'a Request,
    schema: &'a Schema,
    ret: &mut Vec<TItem>,
) where
    TCollection: FromIterator<TItem> + IntoIterator<Item = TItem> + Default,
    TCollector: CollectorTyped<'a, TItem, TCollection>,
{
    for directive in directives {
        ret.extend(collector.visit_directive(directive, ancestors, schema, request));
    }
}
