use apollo_compiler::Name;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;

use super::BuildContext;
use super::collect::collect_selections;
use super::usage::Usage;
use super::variables::VariableCollector;
use crate::bail;
use crate::error::IrError;
use crate::internal_error;
use crate::ir::IrVariable;
use crate::ir::TypeSet;

/// What operations and other fragments need to know about a fragment, computed once per
/// fragment and shared by every root of one build.
#[derive(Debug, Default)]
pub(crate) struct FragmentFacts {
    variables: IndexMap<Name, Vec<IrVariable>>,
    /// Fragments whose variables are being inferred, to detect spread cycles.
    in_progress: IndexSet<Name>,
    interface_fields: IndexMap<Name, IndexSet<Name>>,
}

impl FragmentFacts {
    /// The variables the fragment uses, directly or through the fragments it spreads.
    pub(crate) fn variables(
        &mut self,
        ctx: &BuildContext<'_>,
        name: &Name,
    ) -> Result<Vec<IrVariable>, IrError> {
        if let Some(variables) = self.variables.get(name) {
            return Ok(variables.clone());
        }
        if !self.in_progress.insert(name.clone()) {
            bail!("fragment \"{name}\" spreads itself");
        }
        let fragment = ctx.fragment(name)?;
        let mut collector = VariableCollector::new(ctx, self);
        let collected = collector.collect_selection_set(&fragment.selection_set);
        let variables = collector.finish();
        self.in_progress.shift_remove(name);
        collected?;
        self.variables.insert(name.clone(), variables.clone());
        Ok(variables)
    }

    /// The response names of the fields every object of the fragment's type condition has, that
    /// is the properties of the fragment's base interface model.
    pub(crate) fn interface_fields(
        &mut self,
        ctx: &BuildContext<'_>,
        name: &Name,
    ) -> Result<&IndexSet<Name>, IrError> {
        if !self.interface_fields.contains_key(name) {
            let fragment = ctx.fragment(name)?;
            let type_condition = fragment.type_condition();
            let possible_types = ctx.schema.possible_types(type_condition)?.clone();
            // usage is recorded when the fragment itself is built
            let collected = collect_selections(
                ctx,
                &mut Usage::default(),
                type_condition,
                &possible_types,
                &[&fragment.selection_set],
            )?;
            let base = TypeSet::new(type_condition.clone());
            let fields = collected
                .fields_within(&base)
                .map(|field| field.instance.response_name().clone())
                .collect();
            self.interface_fields.insert(name.clone(), fields);
        }
        self.interface_fields
            .get(name)
            .ok_or_else(|| internal_error!("fragment \"{name}\" was not analyzed"))
    }
}
