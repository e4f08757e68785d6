//! Parameter descriptors and their translation into executor parameters.
//!
//! Input descriptors borrow from the bound object until the command is sent.
//! Output descriptors own their initial values, so the output object can be
//! borrowed mutably again once the call returns.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, trace};

use crate::binding::coerce;
use crate::binding::inspect::{self, MemberDescriptor};
use crate::binding::table::{self, TabularValue};
use crate::config::BindingConfig;
use crate::core::identifier::validate_identifier;
use crate::core::{Bindable, DeclaredType, SqlValue};
use crate::error::{BindError, Result};

/// Parameter direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

/// Value held by a descriptor once coerced.
pub enum BoundValue<'a> {
    Scalar(SqlValue<'a>),
    /// Records of a structured member; `None` when the collection is absent.
    Records(Option<Vec<&'a dyn Bindable>>),
}

impl fmt::Debug for BoundValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundValue::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            BoundValue::Records(None) => f.write_str("Records(None)"),
            BoundValue::Records(Some(r)) => write!(f, "Records({} rows)", r.len()),
        }
    }
}

/// One bindable member, ready to become an executor parameter.
#[derive(Debug)]
pub struct ParameterDescriptor<'a> {
    /// Bound parameter name.
    pub name: &'static str,
    /// Declared name of the member the value came from.
    pub member: &'static str,
    pub value: BoundValue<'a>,
    pub is_structured: bool,
    /// User-defined table type of a structured value; empty when unknown.
    pub element_type_name: String,
    pub direction: Direction,
    pub declared: DeclaredType,
}

impl ParameterDescriptor<'_> {
    /// Detach from the bound object, as an output descriptor.
    fn into_output(self) -> Result<ParameterDescriptor<'static>> {
        let value = match self.value {
            BoundValue::Scalar(v) => BoundValue::Scalar(v.into_owned()),
            BoundValue::Records(_) => {
                return Err(BindError::Config(format!(
                    "structured member '{}' cannot be bound as an output parameter",
                    self.member
                )))
            }
        };
        Ok(ParameterDescriptor {
            name: self.name,
            member: self.member,
            value,
            is_structured: false,
            element_type_name: String::new(),
            direction: Direction::Output,
            declared: self.declared,
        })
    }
}

/// Payload of an executor parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Scalar(SqlValue<'static>),
    /// Table value; `table` is `None` for an absent or empty collection.
    Structured {
        type_name: String,
        table: Option<TabularValue>,
    },
}

/// Parameter as handed to a [`CommandExecutor`](crate::provider::CommandExecutor).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorParameter {
    pub name: String,
    pub value: ParameterValue,
    pub direction: Direction,
    /// Declared size; `Some(-1)` for maximum-length text.
    pub size: Option<i32>,
}

impl ExecutorParameter {
    pub fn input(name: impl Into<String>, value: SqlValue<'static>) -> Self {
        Self::scalar(name, value, Direction::Input)
    }

    pub fn output(name: impl Into<String>, value: SqlValue<'static>) -> Self {
        Self::scalar(name, value, Direction::Output)
    }

    fn scalar(name: impl Into<String>, value: SqlValue<'static>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            size: coerce::size_hint(&value),
            value: ParameterValue::Scalar(value),
            direction,
        }
    }

    pub fn is_output(&self) -> bool {
        self.direction == Direction::Output
    }

    /// The scalar value, if this is not a table value.
    pub fn scalar_value(&self) -> Option<&SqlValue<'static>> {
        match &self.value {
            ParameterValue::Scalar(v) => Some(v),
            ParameterValue::Structured { .. } => None,
        }
    }

    pub fn table(&self) -> Option<&TabularValue> {
        match &self.value {
            ParameterValue::Structured { table, .. } => table.as_ref(),
            ParameterValue::Scalar(_) => None,
        }
    }
}

fn describe<'a>(
    value: &'a dyn Bindable,
    direction: Direction,
) -> Result<Vec<ParameterDescriptor<'a>>> {
    let shape = value.shape();
    inspect::bindable(shape)
        .into_iter()
        .map(|m| describe_member(value, &m, direction))
        .collect()
}

fn describe_member<'a>(
    value: &'a dyn Bindable,
    m: &MemberDescriptor,
    direction: Direction,
) -> Result<ParameterDescriptor<'a>> {
    validate_identifier(m.bound_name)?;

    let raw = value.read(m.member_name).ok_or_else(|| {
        BindError::mismatch(
            m.member_name,
            format!(
                "{} lists the member as readable but does not read it",
                value.shape().type_name()
            ),
        )
    })?;
    let bound = coerce::coerce_member(raw).map_err(|e| BindError::conversion(m.bound_name, e))?;

    let is_structured = matches!(bound, BoundValue::Records(_));
    let element_type_name = match &bound {
        BoundValue::Records(records) => m
            .table_type
            .or_else(|| {
                records
                    .as_ref()
                    .and_then(|r| r.first())
                    .and_then(|r| r.shape().table_type())
            })
            .unwrap_or_default()
            .to_string(),
        BoundValue::Scalar(_) => String::new(),
    };

    Ok(ParameterDescriptor {
        name: m.bound_name,
        member: m.member_name,
        value: bound,
        is_structured,
        element_type_name,
        direction,
        declared: m.declared,
    })
}

/// Describe every bindable member of the input object.
///
/// An absent object yields no descriptors.
pub fn build_input_parameters(
    in_shape: Option<&dyn Bindable>,
) -> Result<Vec<ParameterDescriptor<'_>>> {
    match in_shape {
        Some(value) => describe(value, Direction::Input),
        None => Ok(Vec::new()),
    }
}

/// Describe every bindable member of the output object, with its current
/// value as the initial value.
pub fn build_output_parameters(
    out_shape: Option<&dyn Bindable>,
) -> Result<Vec<ParameterDescriptor<'static>>> {
    let Some(value) = out_shape else {
        return Ok(Vec::new());
    };
    describe(value, Direction::Output)?
        .into_iter()
        .map(ParameterDescriptor::into_output)
        .collect()
}

fn check_unique<'d, 'a: 'd>(
    descriptors: impl IntoIterator<Item = &'d ParameterDescriptor<'a>>,
) -> Result<()> {
    let mut seen = HashSet::new();
    for d in descriptors {
        if !seen.insert(d.name.to_lowercase()) {
            return Err(BindError::Config(format!(
                "parameter '{}' is bound more than once",
                d.name
            )));
        }
    }
    Ok(())
}

fn to_executor(d: &ParameterDescriptor<'_>, config: &BindingConfig) -> Result<ExecutorParameter> {
    match &d.value {
        BoundValue::Scalar(v) => Ok(ExecutorParameter {
            name: d.name.to_string(),
            size: coerce::size_hint(v),
            value: ParameterValue::Scalar(v.clone().into_owned()),
            direction: d.direction,
        }),
        BoundValue::Records(records) => {
            let type_name = if d.element_type_name.is_empty() {
                config.table_type_for(d.name).unwrap_or_default().to_string()
            } else {
                d.element_type_name.clone()
            };
            if type_name.is_empty() {
                debug!(parameter = d.name, "table value has no user-defined type name");
            }
            let table = table::expand(d.name, records.as_deref())?;
            Ok(ExecutorParameter {
                name: d.name.to_string(),
                value: ParameterValue::Structured { type_name, table },
                direction: d.direction,
                size: None,
            })
        }
    }
}

/// Translate descriptors into executor parameters, inputs first.
pub fn materialize_parameters(
    inputs: &[ParameterDescriptor<'_>],
    outputs: &[ParameterDescriptor<'_>],
    config: &BindingConfig,
) -> Result<Vec<ExecutorParameter>> {
    check_unique(inputs.iter().chain(outputs))?;
    let parameters = inputs
        .iter()
        .chain(outputs)
        .map(|d| to_executor(d, config))
        .collect::<Result<Vec<_>>>()?;
    debug!(
        inputs = inputs.len(),
        outputs = outputs.len(),
        "materialized parameters"
    );
    Ok(parameters)
}

/// Copy output values from an executed call back into the output object.
///
/// Each output descriptor is matched by name. Booleans are converted back
/// from their integer form. A read-only member is written through its
/// backing field.
pub fn write_back_outputs(
    out_shape: Option<&mut dyn Bindable>,
    outputs: &[ParameterDescriptor<'_>],
    executed: &[ExecutorParameter],
) -> Result<()> {
    let Some(out) = out_shape else {
        return Ok(());
    };
    let shape = out.shape();

    for d in outputs {
        let param = executed
            .iter()
            .find(|p| p.name == d.name)
            .or_else(|| executed.iter().find(|p| p.name.eq_ignore_ascii_case(d.name)))
            .ok_or_else(|| {
                BindError::mismatch(d.name, "the executed call returned no such parameter")
            })?;

        let value = param
            .scalar_value()
            .cloned()
            .ok_or_else(|| {
                BindError::mismatch(d.name, "the executed call returned a table value")
            })?;
        let value = if d.declared.underlying().is_bool() && !value.is_null() {
            let flag =
                coerce::bool_from_sql(&value).map_err(|e| BindError::conversion(d.name, e))?;
            SqlValue::Bool(flag)
        } else {
            value
        };

        let writable = shape.member(d.member).map(|m| m.writable).unwrap_or(false);
        let target = if writable {
            d.member
        } else if let Some(field) = shape.backing_field_for(d.member) {
            field.name
        } else {
            return Err(BindError::Config(format!(
                "output member {}.{} is read-only and has no backing field",
                shape.type_name(),
                d.member
            )));
        };

        trace!(parameter = d.name, target, "writing output value");
        out.write(target, value)?;
    }
    Ok(())
}

/// Input and output descriptors for one call.
#[derive(Debug)]
pub struct ParameterBuilder<'a> {
    inputs: Vec<ParameterDescriptor<'a>>,
    outputs: Vec<ParameterDescriptor<'static>>,
}

impl<'a> ParameterBuilder<'a> {
    pub fn new(
        in_shape: Option<&'a dyn Bindable>,
        out_shape: Option<&dyn Bindable>,
    ) -> Result<Self> {
        let inputs = build_input_parameters(in_shape)?;
        let outputs = build_output_parameters(out_shape)?;
        check_unique(inputs.iter().chain(&outputs))?;
        Ok(Self { inputs, outputs })
    }

    pub fn inputs(&self) -> &[ParameterDescriptor<'a>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ParameterDescriptor<'static>] {
        &self.outputs
    }

    /// Executor parameters for the call.
    pub fn parameters(&self, config: &BindingConfig) -> Result<Vec<ExecutorParameter>> {
        materialize_parameters(&self.inputs, &self.outputs, config)
    }

    /// Copy output values of an executed call into the output object.
    pub fn fill_outputs(
        &self,
        out_shape: Option<&mut dyn Bindable>,
        executed: &[ExecutorParameter],
    ) -> Result<()> {
        write_back_outputs(out_shape, &self.outputs, executed)
    }

    /// Release the input borrow, keeping what write-back needs.
    pub fn into_outputs(self) -> Vec<ParameterDescriptor<'static>> {
        self.outputs
    }
}
