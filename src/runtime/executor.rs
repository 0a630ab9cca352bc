use std::collections::BTreeMap;
use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use crate::ast::Expression;
use crate::instances::create_instance;
use crate::model::{CHILDREN, DATA_SOURCE, EVENT_LISTENERS, IS_OPEN, InstanceRecord, PARENT_ID, STATE_CLASS};
use crate::parser::literal::is_name;
use crate::parser::parse_body;
use crate::result::{
    BecomesAssignment, BecomesTarget, ConditionalExecution, Connection, EventListenerBinding,
    EventType, ExecutionResult, FieldAssignment, InstanceConfiguration, ListOperation,
    MessageExecution, MorphOperation, PrintStatement, StateOperation,
};
use crate::value::{Argument, KeywordArgument, Value};

use super::error::{ExecError, ExecResult};
use super::eval::{evaluate, read_field};
use super::scope::{Frame, Scope};
use super::template::render_template;
use super::{ActionReport, Session};

enum CallArguments {
    Positional(Vec<Value>),
    Keyword(Vec<(String, Value)>),
}

impl Session {
    /// Applies every operation of `parsed` and returns it with classes,
    /// instances, output and errors brought up to date.
    pub fn execute(&mut self, parsed: ExecutionResult) -> ExecutionResult {
        let mut report = ActionReport::default();
        self.apply(&parsed, &Frame::root(), &mut report);
        let mut result = parsed;
        result.classes = self.classes.classes().to_vec();
        result.instances = self.instances.records().to_vec();
        result.output.extend(report.output);
        result.errors.extend(report.errors);
        result
    }

    /// Calls a registered block. A missing block or argument is a hard error;
    /// failures inside the body are collected in the report.
    pub fn call_block(
        &mut self,
        name: &str,
        arguments: impl IntoIterator<Item = (String, Value)>,
    ) -> ExecResult<ActionReport> {
        let mut report = ActionReport::default();
        self.invoke_block(name, arguments.into_iter().collect(), &Frame::root(), &mut report)?;
        Ok(report)
    }

    /// Runs the actions bound to `event` on an instance, in attachment order.
    pub fn dispatch_event(&mut self, instance_name: &str, event: EventType) -> ExecResult<ActionReport> {
        let actions = listener_actions(self.instance_ref(instance_name)?, event);
        debug!(instance = instance_name, %event, listeners = actions.len(), "dispatching event");
        let mut report = ActionReport::default();
        for action in actions {
            self.run_action(&action, &Frame::root(), &mut report)?;
        }
        Ok(report)
    }

    /// Moves the timer clock forward and fires every tick that falls due.
    pub fn advance_timers(&mut self, elapsed: Duration) -> ActionReport {
        let until_ms = self.timers.now_ms() + elapsed.as_secs_f64() * 1000.0;
        let limit = self.config.max_timer_ticks_per_advance;
        let mut report = ActionReport::default();
        let mut fired = 0;
        while fired < limit {
            let Some(tick) = self.timers.next_tick(until_ms) else {
                break;
            };
            trace!(timer = %tick.name, at_ms = tick.at_ms, "timer tick");
            let outcome = self.run_action(&tick.action, &Frame::root(), &mut report);
            report.record("timer", outcome);
            fired += 1;
        }
        if fired == limit {
            warn!(limit, "timer tick limit reached; remaining ticks deferred");
        }
        self.timers.settle(until_ms);
        report
    }

    fn apply(&mut self, parsed: &ExecutionResult, frame: &Frame, report: &mut ActionReport) {
        debug!(depth = frame.depth(), "applying parsed program");
        for class in &parsed.classes {
            self.classes.upsert(class.clone());
        }
        for instance in &parsed.instances {
            self.instances.upsert(instance.clone());
        }

        for configuration in &parsed.instance_configurations {
            let outcome = self.configure_instance(configuration);
            report.record("instance configuration", outcome);
        }
        for assignment in &parsed.field_assignments {
            let outcome = self.assign_field(assignment);
            report.record("field assignment", outcome);
        }
        for assignment in &parsed.variable_assignments {
            let outcome = self
                .resolve(&assignment.value)
                .map(|value| {
                    self.variables.insert(assignment.name.clone(), value);
                });
            report.record("variable assignment", outcome);
        }
        for call in &parsed.method_calls {
            let outcome = call
                .arguments
                .iter()
                .map(|argument| self.resolve(argument))
                .collect::<ExecResult<Vec<_>>>()
                .and_then(|values| {
                    self.call_method(
                        &call.instance_name,
                        &call.method_name,
                        CallArguments::Positional(values),
                        frame,
                        report,
                    )
                });
            report.record("method call", outcome);
        }
        for operation in &parsed.list_operations {
            let outcome = self.add_to_list(operation);
            report.record("list operation", outcome);
        }
        for connection in &parsed.connections {
            let outcome = self.connect(connection);
            report.record("connection", outcome);
        }
        for operation in &parsed.morph_operations {
            let outcome = self.add_child(operation);
            report.record("morph operation", outcome);
        }
        for message in &parsed.message_executions {
            let outcome = self.send_message(message, frame, report);
            report.record("message", outcome);
        }
        for operation in &parsed.state_operations {
            let outcome = self.set_state(operation);
            report.record("state operation", outcome);
        }
        for listener in &parsed.event_listeners {
            let outcome = self.attach_listener(listener);
            report.record("event listener", outcome);
        }

        for block in &parsed.block_assignments {
            self.registry
                .define_block(&block.name, &block.body, &block.parameters);
        }
        for conditional in &parsed.conditional_blocks {
            self.registry
                .define_condition(&conditional.name, conditional.condition.clone());
        }

        for call in &parsed.block_calls {
            let outcome = self
                .resolve_keywords(&call.arguments)
                .and_then(|arguments| self.invoke_block(&call.name, arguments, frame, report));
            report.record("block call", outcome);
        }
        for assignment in &parsed.becomes_assignments {
            let outcome = self.assign_becomes(assignment, frame);
            report.record("becomes assignment", outcome);
        }
        for execution in parsed
            .conditional_executions
            .iter()
            .chain(&parsed.conditional_otherwise_executions)
        {
            let outcome = self.run_conditional(execution, frame, report);
            report.record("conditional execution", outcome);
        }
        for statement in &parsed.print_statements {
            let outcome = self.print(statement, frame, report);
            report.record("print statement", outcome);
        }
        for timer in &parsed.timer_operations {
            debug!(timer = %timer.name, interval_ms = timer.interval_ms, "scheduling timer");
            self.timers
                .schedule(&timer.name, timer.interval_ms, &timer.action);
        }
    }

    fn resolve(&self, argument: &Argument) -> ExecResult<Value> {
        match argument {
            Argument::Literal { value } => Ok(value.clone()),
            Argument::FieldReference {
                instance_name,
                field_name,
            } => read_field(&self.instances, instance_name, field_name).cloned(),
        }
    }

    fn resolve_keywords(&self, arguments: &[KeywordArgument]) -> ExecResult<Vec<(String, Value)>> {
        arguments
            .iter()
            .map(|argument| Ok((argument.name.clone(), self.resolve(&argument.value)?)))
            .collect()
    }

    fn instance_ref(&self, name: &str) -> ExecResult<&InstanceRecord> {
        self.instances
            .get(name)
            .ok_or_else(|| ExecError::instance_not_found(name))
    }

    fn instance_mut(&mut self, name: &str) -> ExecResult<&mut InstanceRecord> {
        self.instances
            .get_mut(name)
            .ok_or_else(|| ExecError::instance_not_found(name))
    }

    fn configure_instance(&mut self, configuration: &InstanceConfiguration) -> ExecResult<()> {
        self.instance_ref(&configuration.instance_name)?;
        let values = self.resolve_keywords(&configuration.properties)?;
        let instance = self.instance_mut(&configuration.instance_name)?;
        for (name, value) in values {
            instance.set_property(name, value);
        }
        Ok(())
    }

    fn assign_field(&mut self, assignment: &FieldAssignment) -> ExecResult<()> {
        let value = self.resolve(&assignment.value)?;
        self.instance_mut(&assignment.instance_name)?
            .set_property(assignment.field_name.clone(), value);
        Ok(())
    }

    fn add_to_list(&mut self, operation: &ListOperation) -> ExecResult<()> {
        let item = self.resolve(&operation.item)?;
        let instance = self.instance_mut(&operation.instance_name)?;
        push_to_list(instance, &operation.field_name, item, false)
    }

    fn connect(&mut self, connection: &Connection) -> ExecResult<()> {
        self.check_same_page("connect", &connection.source, &connection.target)?;
        self.instance_mut(&connection.target)?
            .set_property(DATA_SOURCE, Value::string(&connection.source));
        Ok(())
    }

    fn add_child(&mut self, operation: &MorphOperation) -> ExecResult<()> {
        self.check_same_page("add", &operation.parent, &operation.child)?;
        let parent = self.instance_mut(&operation.parent)?;
        push_to_list(parent, CHILDREN, Value::string(&operation.child), true)?;
        self.instance_mut(&operation.child)?
            .set_property(PARENT_ID, Value::string(&operation.parent));
        Ok(())
    }

    /// Both instances must exist; they may only differ in page when either
    /// has none.
    fn check_same_page(&self, operation: &'static str, source: &str, target: &str) -> ExecResult<()> {
        let source_page = self.instance_ref(source)?.page();
        let target_page = self.instance_ref(target)?.page();
        if let (Some(source_page), Some(target_page)) = (source_page, target_page)
            && source_page != target_page
        {
            return Err(ExecError::CrossPageOperationRejected {
                operation,
                source_name: source.to_string(),
                target_name: target.to_string(),
                source_page: source_page.to_string(),
                target_page: target_page.to_string(),
            });
        }
        Ok(())
    }

    fn send_message(
        &mut self,
        message: &MessageExecution,
        frame: &Frame,
        report: &mut ActionReport,
    ) -> ExecResult<()> {
        let arguments = self.resolve_keywords(&message.arguments)?;
        if self.instances.contains(&message.target) {
            return self.call_method(
                &message.target,
                &message.method_name,
                CallArguments::Keyword(arguments),
                frame,
                report,
            );
        }
        let Some(class) = self.classes.get(&message.target) else {
            return Err(if message.method_name == "create" {
                ExecError::ClassNotFound {
                    name: message.target.clone(),
                }
            } else {
                ExecError::instance_not_found(&message.target)
            });
        };
        if message.method_name != "create" {
            return Err(ExecError::MethodNotFound {
                method: message.method_name.clone(),
                class_name: message.target.clone(),
                available: "create".to_string(),
            });
        }
        let name = self.instances.next_auto_name(&message.target);
        let record = create_instance(&name, &message.target, Some(class), arguments);
        debug!(instance = %name, class = %message.target, "created instance");
        self.instances.upsert(record);
        Ok(())
    }

    fn set_state(&mut self, operation: &StateOperation) -> ExecResult<()> {
        let value = self.resolve(&operation.value)?;
        self.instance_mut(&operation.instance_name)?
            .set_property(operation.key.clone(), value);
        Ok(())
    }

    fn attach_listener(&mut self, listener: &EventListenerBinding) -> ExecResult<()> {
        let mut entry = BTreeMap::new();
        entry.insert(
            "eventType".to_string(),
            Value::string(listener.event_type.as_str()),
        );
        entry.insert("action".to_string(), Value::string(&listener.action));
        let instance = self.instance_mut(&listener.instance_name)?;
        push_to_list(instance, EVENT_LISTENERS, Value::Map(entry), false)
    }

    fn call_method(
        &mut self,
        instance_name: &str,
        method_name: &str,
        arguments: CallArguments,
        frame: &Frame,
        report: &mut ActionReport,
    ) -> ExecResult<()> {
        let class_name = self.instance_ref(instance_name)?.class_name.clone();
        if matches!(method_name, "open" | "remove") {
            self.instance_mut(instance_name)?
                .set_property(IS_OPEN, Value::Bool(method_name == "open"));
            return Ok(());
        }
        if class_name == STATE_CLASS && matches!(method_name, "set" | "get") {
            return self.state_method(instance_name, method_name, arguments, report);
        }

        let class = self
            .classes
            .get(&class_name)
            .ok_or_else(|| ExecError::ClassNotFound {
                name: class_name.clone(),
            })?;
        let method = class
            .method(method_name)
            .ok_or_else(|| ExecError::MethodNotFound {
                method: method_name.to_string(),
                class_name: class_name.clone(),
                available: match class.method_names() {
                    names if names.is_empty() => "none".to_string(),
                    names => names.join(", "),
                },
            })?
            .clone();

        let bound = match arguments {
            CallArguments::Positional(values) => {
                if values.len() != method.parameters.len() {
                    return Err(ExecError::ArityMismatch {
                        method: method_name.to_string(),
                        expected: method.parameters.len(),
                        found: values.len(),
                    });
                }
                method.parameters.iter().cloned().zip(values).collect::<Vec<_>>()
            }
            CallArguments::Keyword(pairs) => {
                require_parameters(
                    &format!("{class_name}.{method_name}"),
                    &method.parameters,
                    &pairs,
                )?;
                pairs
            }
        };

        let mut bindings = source_bindings(&bound);
        bindings.insert("myself".to_string(), instance_name.to_string());
        let child = frame.enter(bound.into_iter().collect(), self.config.max_call_depth)?;
        debug!(
            instance = instance_name,
            method = method_name,
            depth = child.depth(),
            "calling method"
        );
        self.run_body(&render_template(&method.body, &bindings), &child, report);
        Ok(())
    }

    /// `set key value` and `get key` on `State` instances.
    fn state_method(
        &mut self,
        instance_name: &str,
        method_name: &str,
        arguments: CallArguments,
        report: &mut ActionReport,
    ) -> ExecResult<()> {
        let parameters: &[&str] = if method_name == "set" {
            &["key", "value"]
        } else {
            &["key"]
        };
        let mut values = match arguments {
            CallArguments::Positional(values) => {
                if values.len() != parameters.len() {
                    return Err(ExecError::ArityMismatch {
                        method: method_name.to_string(),
                        expected: parameters.len(),
                        found: values.len(),
                    });
                }
                values
            }
            CallArguments::Keyword(mut pairs) => {
                let mut values = Vec::with_capacity(parameters.len());
                for parameter in parameters {
                    let index = pairs
                        .iter()
                        .position(|(name, _)| name == parameter)
                        .ok_or_else(|| ExecError::MissingArgument {
                            callable: format!("{STATE_CLASS}.{method_name}"),
                            argument: parameter.to_string(),
                        })?;
                    values.push(pairs.swap_remove(index).1);
                }
                values
            }
        };
        let key = values.remove(0).to_string();
        if let Some(value) = values.pop() {
            self.instance_mut(instance_name)?.set_property(key, value);
        } else {
            let value = read_field(&self.instances, instance_name, &key)?;
            report.output.push(value.to_string());
        }
        Ok(())
    }

    fn invoke_block(
        &mut self,
        name: &str,
        arguments: Vec<(String, Value)>,
        frame: &Frame,
        report: &mut ActionReport,
    ) -> ExecResult<()> {
        let (body, parameters) = self
            .registry
            .block(name)
            .map(|(body, parameters)| (body.to_string(), parameters.to_vec()))
            .ok_or_else(|| ExecError::BlockNotFound {
                name: name.to_string(),
            })?;
        require_parameters(name, &parameters, &arguments)?;
        let bindings = source_bindings(&arguments);
        let child = frame.enter(arguments.into_iter().collect(), self.config.max_call_depth)?;
        debug!(block = name, depth = child.depth(), "calling block");
        self.run_body(&render_template(&body, &bindings), &child, report);
        Ok(())
    }

    /// A bare name runs the block of that name; anything else runs as a body.
    fn run_action(&mut self, action: &str, frame: &Frame, report: &mut ActionReport) -> ExecResult<()> {
        let action = action.trim();
        if is_name(action) {
            return self.invoke_block(action, Vec::new(), frame, report);
        }
        let child = frame.enter(FxHashMap::default(), self.config.max_call_depth)?;
        self.run_body(action, &child, report);
        Ok(())
    }

    /// Parses and applies a body statement by statement. Earlier statements
    /// stay applied when later ones fail.
    fn run_body(&mut self, body: &str, frame: &Frame, report: &mut ActionReport) {
        let parsed = parse_body(body, &self.classes);
        report.errors.extend(parsed.errors.iter().cloned());
        self.apply(&parsed, frame, report);
    }

    fn assign_becomes(&mut self, assignment: &BecomesAssignment, frame: &Frame) -> ExecResult<()> {
        let value = self.evaluate(&assignment.expression, frame)?;
        match &assignment.target {
            BecomesTarget::Field {
                instance_name,
                field_name,
            } => self
                .instance_mut(instance_name)?
                .set_property(field_name.clone(), value),
            BecomesTarget::Variable { variable_name } => {
                self.variables.insert(variable_name.clone(), value);
            }
        }
        Ok(())
    }

    fn run_conditional(
        &mut self,
        execution: &ConditionalExecution,
        frame: &Frame,
        report: &mut ActionReport,
    ) -> ExecResult<()> {
        let condition = self
            .registry
            .condition(&execution.condition_name)
            .cloned()
            .ok_or_else(|| ExecError::ConditionNotFound {
                name: execution.condition_name.clone(),
            })?;
        let holds = self.evaluate(&condition, frame)?.is_truthy();
        let action = if holds {
            execution.then_action.as_deref()
        } else {
            execution.otherwise_action.as_deref()
        };
        debug!(condition = %execution.condition_name, holds, "conditional execution");
        match action {
            Some(action) => self.run_action(action, frame, report),
            None => Ok(()),
        }
    }

    fn print(&mut self, statement: &PrintStatement, frame: &Frame, report: &mut ActionReport) -> ExecResult<()> {
        let Some(expression) = &statement.expression else {
            report.output.push(statement.message.clone());
            return Ok(());
        };
        match self.evaluate(expression, frame) {
            Ok(value) => report.output.push(value.to_string()),
            Err(ExecError::UndefinedVariable { .. })
                if matches!(expression, Expression::Variable { .. }) =>
            {
                report.output.push(statement.message.clone());
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn evaluate(&self, expression: &Expression, frame: &Frame) -> ExecResult<Value> {
        evaluate(
            expression,
            &self.instances,
            &Scope::new(&self.variables, &frame.locals),
        )
    }
}

fn require_parameters(
    callable: &str,
    parameters: &[String],
    arguments: &[(String, Value)],
) -> ExecResult<()> {
    match parameters
        .iter()
        .find(|parameter| !arguments.iter().any(|(name, _)| name == *parameter))
    {
        Some(missing) => Err(ExecError::MissingArgument {
            callable: callable.to_string(),
            argument: missing.clone(),
        }),
        None => Ok(()),
    }
}

fn source_bindings(arguments: &[(String, Value)]) -> FxHashMap<String, String> {
    arguments
        .iter()
        .map(|(name, value)| (name.clone(), value.to_source()))
        .collect()
}

/// Appends to a list property, creating it when absent.
fn push_to_list(
    instance: &mut InstanceRecord,
    field: &str,
    item: Value,
    unique: bool,
) -> ExecResult<()> {
    match instance.properties.get_mut(field) {
        None => {
            instance.set_property(field, Value::List(vec![item]));
            Ok(())
        }
        Some(Value::List(items)) => {
            if !(unique && items.contains(&item)) {
                items.push(item);
            }
            Ok(())
        }
        Some(other) => Err(ExecError::NotAList {
            instance: instance.name.clone(),
            field: field.to_string(),
            found: other.type_name(),
        }),
    }
}

fn listener_actions(instance: &InstanceRecord, event: EventType) -> Vec<String> {
    let Some(Value::List(listeners)) = instance.property(EVENT_LISTENERS) else {
        return Vec::new();
    };
    listeners
        .iter()
        .filter_map(|listener| match listener {
            Value::Map(entry) if entry.get("eventType").and_then(Value::as_str) == Some(event.as_str()) => {
                entry.get("action").and_then(Value::as_str).map(str::to_string)
            }
            _ => None,
        })
        .collect()
}
