//! Builds the IR of every operation and fragment of a document.
//!
//! Each operation and fragment is a root, built independently of the others: its selection sets,
//! its variables, and its model groups with one of the two model strategies. Facts about fragments
//! that other roots need (inferred variables, fields of fragment interfaces) are computed once and
//! shared. A root that fails is left out of the output and its error is collected.
use apollo_compiler::ExecutableDocument;
use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::executable::Fragment;
use apollo_compiler::executable::Operation;
use apollo_compiler::executable::Selection;
use apollo_compiler::executable::SelectionSet;
use apollo_compiler::name;
use apollo_compiler::parser::SourceSpan;
use apollo_compiler::validation::Valid;
use tracing::debug;

use crate::conditions::BTerm;
use crate::conditions::BooleanExpression;
use crate::config::CodegenModels;
use crate::config::IrConfig;
use crate::error::IrError;
use crate::error::MultipleIrErrors;
use crate::error::SingleIrError;
use crate::internal_error;
use crate::ir::IrFieldInfo;
use crate::ir::IrFragmentDefinition;
use crate::ir::IrModelGroup;
use crate::ir::IrOperation;
use crate::ir::IrOperations;
use crate::ir::IrProperty;
use crate::ir::IrType;
use crate::ir::IrValue;
use crate::ir::IrVariable;
use crate::schema::SchemaIndex;
use crate::schema::type_ref::TypeRefResolver;
use crate::utils::logging::snapshot;

mod accessors;
mod collect;
mod consistency;
mod field_merger;
mod fragments;
mod operation_based;
mod response_based;
mod selection_sets;
mod usage;
mod variables;

use consistency::check_model_group;
use consistency::check_selection_sets;
use field_merger::MergedField;
use fragments::FragmentFacts;
use operation_based::OperationBasedBuilder;
use response_based::ResponseBasedBuilder;
use selection_sets::SelectionSetsBuilder;
use usage::Usage;

/// The name of the root model of every data model group.
const DATA_MODEL_NAME: &str = "Data";

pub(crate) fn fragment_data_model_id(fragment_name: &Name) -> String {
    format!("fragment.{fragment_name}.data")
}

pub(crate) fn fragment_interface_model_id(fragment_name: &Name) -> String {
    format!("fragment.{fragment_name}.interface")
}

/// What every step of building one root needs to see.
pub(crate) struct BuildContext<'doc> {
    pub(crate) schema: &'doc SchemaIndex,
    pub(crate) document: &'doc Valid<ExecutableDocument>,
    pub(crate) config: &'doc IrConfig,
}

impl<'doc> BuildContext<'doc> {
    pub(crate) fn fragment(&self, name: &Name) -> Result<&'doc Node<Fragment>, IrError> {
        self.document.fragments.get(name).ok_or_else(|| {
            SingleIrError::InvalidFragmentReference {
                fragment_name: name.clone(),
            }
            .into()
        })
    }

    pub(crate) fn resolver(&self) -> TypeRefResolver<'doc> {
        TypeRefResolver::new(self.schema)
    }

    /// The ids of the models generated for the fragments of the document, which the trees of
    /// other roots may reference.
    pub(crate) fn fragment_model_ids(&self) -> IndexSet<String> {
        let mut ids = IndexSet::default();
        for name in self.document.fragments.keys() {
            ids.insert(fragment_data_model_id(name));
            if self.config.codegen_models.generates_fragment_interfaces() {
                ids.insert(fragment_interface_model_id(name));
            }
        }
        ids
    }
}

/// Allocates the ids of the nested model groups of one tree, and hoists the groups to the root
/// model when models are flattened.
pub(crate) struct ModelIds {
    root: String,
    flatten: bool,
    allocated: IndexSet<String>,
    hoisted: Vec<IrModelGroup>,
}

impl ModelIds {
    pub(crate) fn new(root_id: &str, flatten: bool) -> Self {
        let mut allocated = IndexSet::default();
        allocated.insert(root_id.to_owned());
        Self {
            root: root_id.to_owned(),
            flatten,
            allocated,
            hoisted: vec![],
        }
    }

    pub(crate) fn root(&self) -> &str {
        &self.root
    }

    /// The id of the group nested under the property `name` of the model `parent_id`.
    pub(crate) fn child_id(&mut self, parent_id: &str, name: &str) -> String {
        let base = if self.flatten {
            format!("{}.{name}", self.root)
        } else {
            format!("{parent_id}.{name}")
        };
        let mut id = base.clone();
        let mut suffix = 1;
        while !self.allocated.insert(id.clone()) {
            id = format!("{base}{suffix}");
            suffix += 1;
        }
        id
    }

    /// Reserves the position of a group about to be built, so that hoisted groups stay in
    /// pre-order even though children are finished before their parents.
    pub(crate) fn reserve(&self) -> usize {
        self.hoisted.len()
    }

    pub(crate) fn place(
        &mut self,
        slot: usize,
        group: IrModelGroup,
        model_groups: &mut Vec<IrModelGroup>,
    ) {
        if self.flatten {
            self.hoisted.insert(slot, group);
        } else {
            model_groups.push(group);
        }
    }

    pub(crate) fn finish(self, mut root: IrModelGroup) -> IrModelGroup {
        if let Some(base_model) = root.models.first_mut() {
            base_model.model_groups.extend(self.hoisted);
        }
        root
    }
}

/// The property of a model for a merged field. `model_id` is the id of the group generated for
/// the field's selections when the field is composite.
pub(crate) fn field_property(
    ctx: &BuildContext<'_>,
    merged: &MergedField<'_>,
    model_id: Option<&str>,
    is_override: bool,
) -> Result<IrProperty, IrError> {
    let resolver = ctx.resolver();
    let gql_type = resolver.resolve(merged.representative.ty())?;
    let condition = merged.condition.clone().into_term_expression();
    let mut ty = resolver.to_ir_type(&gql_type, model_id)?;
    if !condition.is_true() {
        // absent whenever the condition does not hold
        ty = ty.nullable();
    }
    Ok(IrProperty {
        info: merged.field_info(ty, gql_type),
        is_override,
        condition,
        requires_buffering: false,
    })
}

/// A property that does not come from a field: it holds a fragment's model and can only be
/// read once the whole object has been seen.
pub(crate) fn synthetic_property(
    name: &str,
    ty: IrType,
    condition: BooleanExpression<BTerm>,
) -> Result<IrProperty, IrError> {
    let response_name =
        Name::new(name).map_err(|_| internal_error!("invalid property name \"{name}\""))?;
    let ty = if condition.is_true() {
        IrType::NonNull(Box::new(ty))
    } else {
        ty
    };
    Ok(IrProperty {
        info: IrFieldInfo {
            response_name,
            ty,
            gql_type: None,
            description: None,
            deprecation_reason: None,
            opt_in_feature: None,
        },
        is_override: false,
        condition,
        requires_buffering: true,
    })
}

fn data_property(data_model_id: &str) -> IrProperty {
    IrProperty {
        info: IrFieldInfo {
            response_name: name!("data"),
            ty: IrType::NonNull(Box::new(IrType::Model(data_model_id.to_owned()))),
            gql_type: None,
            description: None,
            deprecation_reason: None,
            opt_in_feature: None,
        },
        is_override: false,
        condition: BooleanExpression::True,
        requires_buffering: false,
    }
}

/// Builds [`IrOperations`] from a validated document.
///
/// ```
/// use apollo_ir::IrConfig;
/// use apollo_ir::IrOperationsBuilder;
/// use apollo_ir::SchemaIndex;
///
/// let (schema, document) = apollo_compiler::parser::Parser::new().parse_mixed_validate(
///     "type Query { hello: String } query Hello { hello }",
///     "hello.graphql",
/// )
/// .unwrap();
/// let schema = SchemaIndex::new(schema);
/// let ir = IrOperationsBuilder::new(&schema, &document)
///     .with_config(IrConfig::default())
///     .build()
///     .unwrap();
/// assert_eq!(ir.operations[0].name.as_str(), "Hello");
/// ```
pub struct IrOperationsBuilder<'a> {
    schema: &'a SchemaIndex,
    document: &'a Valid<ExecutableDocument>,
    config: IrConfig,
}

impl<'a> IrOperationsBuilder<'a> {
    pub fn new(schema: &'a SchemaIndex, document: &'a Valid<ExecutableDocument>) -> Self {
        Self {
            schema,
            document,
            config: IrConfig::default(),
        }
    }

    pub fn with_config(mut self, config: IrConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds every operation and fragment, failing with every error found if any root failed.
    pub fn build(&self) -> Result<IrOperations, IrError> {
        let (operations, errors) = self.build_lenient();
        let mut all_errors = MultipleIrErrors::new();
        for error in errors {
            all_errors.push(error);
        }
        all_errors.into_result()?;
        Ok(operations)
    }

    /// Builds every operation and fragment that can be built. The roots that failed are left out
    /// and their errors are returned in document order.
    #[cfg_attr(
        feature = "snapshot_tracing",
        tracing::instrument(level = "trace", skip_all, name = "IrOperationsBuilder::build")
    )]
    pub fn build_lenient(&self) -> (IrOperations, Vec<IrError>) {
        let ctx = BuildContext {
            schema: self.schema,
            document: self.document,
            config: &self.config,
        };
        let mut fragment_facts = FragmentFacts::default();
        let mut usage = Usage::default();
        let mut errors = vec![];

        let mut operations = vec![];
        for operation in self.document.operations.iter() {
            let mut root_usage = Usage::default();
            match build_operation(&ctx, &mut fragment_facts, &mut root_usage, operation) {
                Ok(operation) => {
                    debug!(
                        operation = %operation.name,
                        models = operation.all_models().len(),
                        "built operation"
                    );
                    usage.merge(root_usage);
                    operations.push(operation);
                }
                Err(error) => {
                    debug!(
                        operation = operation.name.as_ref().map(|name| name.as_str()),
                        %error,
                        "failed to build operation"
                    );
                    errors.push(error);
                }
            }
        }

        let mut fragments = vec![];
        for fragment in self.document.fragments.values() {
            let mut root_usage = Usage::default();
            match build_fragment(&ctx, &mut fragment_facts, &mut root_usage, fragment) {
                Ok(fragment) => {
                    debug!(
                        fragment = %fragment.name,
                        models = fragment.all_models().len(),
                        "built fragment"
                    );
                    usage.merge(root_usage);
                    fragments.push(fragment);
                }
                Err(error) => {
                    debug!(fragment = %fragment.name, %error, "failed to build fragment");
                    errors.push(error);
                }
            }
        }

        let operations = IrOperations {
            operations,
            fragments,
            used_types: usage.types,
            used_fields: usage.fields,
            flatten_models: self.config.flatten_models,
            decapitalize_fields: self.config.decapitalize_fields,
            generate_data_builders: self.config.generate_data_builders,
            codegen_models: self.config.codegen_models,
        };
        (operations, errors)
    }
}

fn build_operation<'doc>(
    ctx: &BuildContext<'doc>,
    fragment_facts: &mut FragmentFacts,
    usage: &mut Usage,
    operation: &'doc Node<Operation>,
) -> Result<IrOperation, IrError> {
    let name = operation
        .name
        .clone()
        .ok_or(SingleIrError::AnonymousOperation)?;
    let type_condition = ctx.schema.root_type(operation.operation_type)?.clone();
    usage.record_type(&type_condition);

    let resolver = ctx.resolver();
    let mut variables = Vec::with_capacity(operation.variables.len());
    for variable in &operation.variables {
        usage.record_input_type(ctx.schema, variable.ty.inner_named_type())?;
        variables.push(IrVariable {
            name: variable.name.clone(),
            default_value: variable.default_value.as_deref().map(IrValue::from),
            ty: resolver.to_input_ir_type(&resolver.resolve(&variable.ty)?)?,
        });
    }

    let selection_sets = SelectionSetsBuilder::new(ctx, usage).build(&operation.selection_set)?;
    check_selection_sets(&selection_sets)?;

    let data_model_id = format!("operation.{name}.data");
    let data_model_group = match ctx.config.codegen_models {
        CodegenModels::OperationBased => OperationBasedBuilder::new(ctx, usage, &data_model_id)
            .build(DATA_MODEL_NAME, &operation.selection_set)?,
        CodegenModels::ResponseBased => {
            ResponseBasedBuilder::new(ctx, usage, fragment_facts, &data_model_id)
                .build(DATA_MODEL_NAME, &operation.selection_set)?
        }
    };
    check_model_group(&data_model_group, &ctx.fragment_model_ids())?;
    snapshot!(data_model_group, "built operation data model group");

    let response_based_data_model_group = match ctx.config.codegen_models {
        CodegenModels::ResponseBased => Some(data_model_group.clone()),
        CodegenModels::OperationBased if ctx.config.generate_data_builders => {
            let group = ResponseBasedBuilder::new(
                ctx,
                usage,
                fragment_facts,
                &format!("operation.{name}.responseBasedData"),
            )
            .build(DATA_MODEL_NAME, &operation.selection_set)?;
            check_model_group(&group, &ctx.fragment_model_ids())?;
            Some(group)
        }
        CodegenModels::OperationBased => None,
    };

    let (source, file_path) = source_of(ctx.document, operation.location())
        .unwrap_or_else(|| (operation.serialize().to_string(), None));
    let mut used_fragments = IndexSet::default();
    collect_used_fragments(ctx, &operation.selection_set, &mut used_fragments)?;
    let mut source_with_fragments = source;
    for fragment_name in used_fragments {
        let fragment = ctx.fragment(fragment_name)?;
        let (fragment_source, _) = source_of(ctx.document, fragment.location())
            .unwrap_or_else(|| (fragment.serialize().to_string(), None));
        source_with_fragments.push('\n');
        source_with_fragments.push_str(&fragment_source);
    }

    Ok(IrOperation {
        operation_kind: operation.operation_type.into(),
        type_condition,
        variables,
        selection_sets,
        source_with_fragments,
        file_path,
        response_based_data_model_group,
        data_property: data_property(&data_model_id),
        data_model_group,
        name,
    })
}

fn build_fragment<'doc>(
    ctx: &BuildContext<'doc>,
    fragment_facts: &mut FragmentFacts,
    usage: &mut Usage,
    fragment: &'doc Node<Fragment>,
) -> Result<IrFragmentDefinition, IrError> {
    let name = fragment.name.clone();
    let type_condition = fragment.type_condition().clone();
    usage.record_type(&type_condition);
    let is_type_condition_abstract = ctx.schema.type_kind(&type_condition)?.is_abstract();

    let variables = fragment_facts.variables(ctx, &name)?;
    for variable in &variables {
        if let Some(named_type) = variable.ty.named_type() {
            usage.record_input_type(ctx.schema, named_type)?;
        }
    }

    let selection_sets = SelectionSetsBuilder::new(ctx, usage).build(&fragment.selection_set)?;
    check_selection_sets(&selection_sets)?;

    let data_model_id = fragment_data_model_id(&name);
    let (interface_model_group, data_model_group) = match ctx.config.codegen_models {
        CodegenModels::OperationBased => {
            let data = OperationBasedBuilder::new(ctx, usage, &data_model_id)
                .build(DATA_MODEL_NAME, &fragment.selection_set)?;
            (None, data)
        }
        CodegenModels::ResponseBased => {
            let interface = ResponseBasedBuilder::new(
                ctx,
                usage,
                fragment_facts,
                &fragment_interface_model_id(&name),
            )
            .interfaces_only()
            .build(&name, &fragment.selection_set)?;
            check_model_group(&interface, &ctx.fragment_model_ids())?;
            let data = ResponseBasedBuilder::new(ctx, usage, fragment_facts, &data_model_id)
                .implementing(&interface)
                .build(DATA_MODEL_NAME, &fragment.selection_set)?;
            (Some(interface), data)
        }
    };
    check_model_group(&data_model_group, &ctx.fragment_model_ids())?;
    snapshot!(data_model_group, "built fragment data model group");

    let (source, file_path) = source_of(ctx.document, fragment.location())
        .unwrap_or_else(|| (fragment.serialize().to_string(), None));

    Ok(IrFragmentDefinition {
        type_condition,
        is_type_condition_abstract,
        variables,
        selection_sets,
        source,
        file_path,
        interface_model_group,
        data_property: data_property(&data_model_id),
        data_model_group,
        name,
    })
}

/// The text a definition was parsed from, and the path of its file.
fn source_of(
    document: &ExecutableDocument,
    location: Option<SourceSpan>,
) -> Option<(String, Option<String>)> {
    let location = location?;
    let source = document.sources.get(&location.file_id())?;
    let text = source
        .source_text()
        .get(location.offset()..location.end_offset())?;
    Some((
        text.to_owned(),
        source.path().to_str().map(str::to_owned),
    ))
}

/// The fragments a selection set uses, directly or not, in order of first use.
fn collect_used_fragments<'doc>(
    ctx: &BuildContext<'doc>,
    selection_set: &'doc SelectionSet,
    used: &mut IndexSet<&'doc Name>,
) -> Result<(), IrError> {
    for selection in &selection_set.selections {
        match selection {
            Selection::Field(field) => {
                collect_used_fragments(ctx, &field.selection_set, used)?;
            }
            Selection::InlineFragment(inline) => {
                collect_used_fragments(ctx, &inline.selection_set, used)?;
            }
            Selection::FragmentSpread(spread) => {
                if used.insert(&spread.fragment_name) {
                    let fragment = ctx.fragment(&spread.fragment_name)?;
                    collect_used_fragments(ctx, &fragment.selection_set, used)?;
                }
            }
        }
    }
    Ok(())
}
