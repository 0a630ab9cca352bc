//! The aggregate produced by parsing and updated by execution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ast::Expression;
use crate::model::{ClassDefinition, InstanceRecord};
use crate::value::{Argument, KeywordArgument};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionResult {
    pub classes: Vec<ClassDefinition>,
    pub instances: Vec<InstanceRecord>,
    pub method_calls: Vec<MethodCall>,
    pub list_operations: Vec<ListOperation>,
    pub field_assignments: Vec<FieldAssignment>,
    pub connections: Vec<Connection>,
    pub morph_operations: Vec<MorphOperation>,
    pub print_statements: Vec<PrintStatement>,
    pub message_executions: Vec<MessageExecution>,
    pub instance_configurations: Vec<InstanceConfiguration>,
    pub event_listeners: Vec<EventListenerBinding>,
    pub block_assignments: Vec<BlockAssignment>,
    pub block_calls: Vec<BlockCall>,
    pub becomes_assignments: Vec<BecomesAssignment>,
    pub timer_operations: Vec<TimerOperation>,
    pub conditional_blocks: Vec<ConditionalBlock>,
    pub conditional_executions: Vec<ConditionalExecution>,
    pub conditional_otherwise_executions: Vec<ConditionalExecution>,
    pub variable_assignments: Vec<VariableAssignment>,
    pub state_operations: Vec<StateOperation>,
    pub page_navigations: Vec<PageNavigation>,
    pub output: Vec<String>,
    pub errors: Vec<String>,
}

impl ExecutionResult {
    pub fn instance(&self, name: &str) -> Option<&InstanceRecord> {
        self.instances.iter().find(|instance| instance.name == name)
    }

    pub fn class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.iter().find(|class| class.name == name)
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub instance_name: String,
    pub method_name: String,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageExecution {
    pub target: String,
    pub method_name: String,
    pub arguments: Vec<KeywordArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOperation {
    pub instance_name: String,
    pub field_name: String,
    pub item: Argument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAssignment {
    pub instance_name: String,
    pub field_name: String,
    pub value: Argument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphAction {
    Add,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MorphOperation {
    pub action: MorphAction,
    pub parent: String,
    pub child: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintStatement {
    /// Source text after `print`, unquoted.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfiguration {
    pub instance_name: String,
    pub properties: Vec<KeywordArgument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Click,
    Change,
    Input,
    Submit,
}

impl EventType {
    pub const ALL: [EventType; 4] = [Self::Click, Self::Change, Self::Input, Self::Submit];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Change => "change",
            Self::Input => "input",
            Self::Submit => "submit",
        }
    }
}

impl FromStr for EventType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == value)
            .ok_or(())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListenerBinding {
    pub instance_name: String,
    pub event_type: EventType,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockAssignment {
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockCall {
    pub name: String,
    pub arguments: Vec<KeywordArgument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BecomesTarget {
    Field {
        instance_name: String,
        field_name: String,
    },
    Variable {
        variable_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BecomesAssignment {
    pub target: BecomesTarget,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerOperation {
    pub name: String,
    pub interval_ms: f64,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    pub name: String,
    pub condition: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalExecution {
    pub condition_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otherwise_action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableAssignment {
    pub name: String,
    pub value: Argument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateOperation {
    pub instance_name: String,
    pub key: String,
    pub value: Argument,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNavigation {
    pub page: String,
}
