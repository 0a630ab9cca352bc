use tracing::{debug, warn};

pub mod error;
pub mod expression;
pub mod literal;
pub mod shapes;

use crate::definitions::{ClassCatalog, DefinitionBuilder};
use crate::instances::{InstanceStore, create_instance};
use crate::lexer::{delimited, split_statements, strip_comment, tokenize};
use crate::model::{ClassDefinition, FieldDefinition, MethodDefinition};
use crate::result::{
    BecomesAssignment, BecomesTarget, BlockAssignment, BlockCall, ConditionalBlock,
    ConditionalExecution, Connection, EventListenerBinding, EventType, ExecutionResult,
    FieldAssignment, InstanceConfiguration, ListOperation, MessageExecution, MethodCall,
    MorphAction, MorphOperation, PageNavigation, PrintStatement, StateOperation, TimerOperation,
    VariableAssignment,
};
use crate::token::{Token, TokenKind};
use crate::value::{Argument, KeywordArgument};
use error::{ParseError, ParseResult};
use expression::{parse_condition, parse_expression};
use literal::{
    body_text, field_reference, keyword_arguments, keyword_pairs, parse_argument, parse_number,
    parse_value, top_level_words, unquote,
};
use shapes::{Line, StatementShape, classify, condition_body, instance_class_index};

/// Line-by-line statement parser.
///
/// Class members go straight into the [`DefinitionBuilder`]; every other
/// statement appends one entry to the matching list of the result.
pub struct Parser<'a> {
    builder: DefinitionBuilder<'a>,
    instances: InstanceStore,
    result: ExecutionResult,
}

impl<'a> Parser<'a> {
    /// Parser whose class statements build on `classes`.
    pub fn new(classes: &'a ClassCatalog) -> Self {
        Self {
            builder: DefinitionBuilder::new(classes),
            instances: InstanceStore::new(),
            result: ExecutionResult::default(),
        }
    }

    /// Parses one source line. Failures are recorded, never returned.
    pub fn parse_line(&mut self, source: &str) {
        if let Err(err) = self.statement(source) {
            self.record(err);
        }
    }

    pub fn finish(self) -> ExecutionResult {
        let mut result = self.result;
        result.classes = self.builder.finish().into_definitions();
        result.instances = self.instances.into_records();
        result
    }

    fn record(&mut self, err: ParseError) {
        warn!(error = %err, "statement rejected");
        self.result.errors.push(err.to_string());
    }

    fn statement(&mut self, source: &str) -> ParseResult<()> {
        let text = strip_comment(source)?.trim();
        if text.is_empty() {
            return Ok(());
        }
        let line = Line::new(text, tokenize(text)?);
        let Some(shape) = classify(&line) else {
            self.builder.close_class();
            return Err(ParseError::UnknownStatement {
                line: text.to_string(),
            });
        };
        debug!(?shape, line = text, "classified statement");
        if shape != StatementShape::ClassMember {
            self.builder.close_class();
        }
        self.dispatch(shape, &line)
    }

    fn dispatch(&mut self, shape: StatementShape, line: &Line<'_>) -> ParseResult<()> {
        match shape {
            StatementShape::ClassDeclaration => {
                self.builder.open_class(token(line, 0)?);
                Ok(())
            }
            StatementShape::ClassMember => self.class_member(line),
            StatementShape::InstanceCreation => self.instance_creation(line),
            StatementShape::FieldAssignment => self.field_assignment(line),
            StatementShape::BecomesAssignment => self.becomes_assignment(line),
            StatementShape::ConditionalBlockDefinition => self.conditional_block(line),
            StatementShape::BlockDefinition => self.block_definition(line),
            StatementShape::BlockCall => self.block_call(line),
            StatementShape::IfStatement | StatementShape::ConditionalExecution => {
                self.conditional_execution(line)
            }
            StatementShape::EventListener => self.event_listener(line),
            StatementShape::Timer => self.timer(line),
            StatementShape::MorphContainment => self.morph_containment(line),
            StatementShape::StateOperation => self.state_operation(line),
            StatementShape::InstanceConfiguration => self.instance_configuration(line),
            StatementShape::Message => self.message(line),
            StatementShape::ListOperation => self.list_operation(line),
            StatementShape::Connection => {
                self.result.connections.push(Connection {
                    source: token(line, 1)?.to_string(),
                    target: token(line, 3)?.to_string(),
                });
                Ok(())
            }
            StatementShape::Print => self.print(line),
            StatementShape::PageNavigation => {
                self.result.page_navigations.push(PageNavigation {
                    page: unquote(token(line, 3)?).to_string(),
                });
                Ok(())
            }
            StatementShape::VariableAssignment => {
                self.result.variable_assignments.push(VariableAssignment {
                    name: token(line, 0)?.to_string(),
                    value: parse_argument(line.rest_after(1)),
                });
                Ok(())
            }
        }
    }

    fn class_member(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let class_name = token(line, 0)?;
        let member = match token(line, 1)? {
            "has" if line.is(2, "field") => Member::Field(field_declaration(line)?),
            "has" => Member::Method(method_declaration(line, 3)?),
            "defineField" => Member::Field(define_field(line)?),
            "defineMethod" if line.is(2, "with") => Member::Method(define_method(line)?),
            _ => Member::Method(method_declaration(line, 2)?),
        };
        let class_ref = self.builder.open_class(class_name);
        match member {
            Member::Field(field) => self.builder.add_field(class_ref, field),
            Member::Method(method) => self.builder.add_method(class_ref, method),
        }
        Ok(())
    }

    fn instance_creation(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let class_index = instance_class_index(line)
            .ok_or_else(|| ParseError::syntax("expected `name is a ClassName`"))?;
        let name = token(line, 0)?;
        let class_name = token(line, class_index)?;

        let mut literals = Vec::new();
        let mut deferred = Vec::new();
        if line.len() > class_index + 1 {
            for argument in keyword_arguments(line.rest_after(class_index + 1))? {
                match argument.value {
                    Argument::Literal { value } => literals.push((argument.name, value)),
                    reference => deferred.push(KeywordArgument {
                        name: argument.name,
                        value: reference,
                    }),
                }
            }
        }

        let record = create_instance(
            name,
            class_name,
            self.builder.get(class_name),
            literals,
        );
        self.instances.upsert(record);
        if !deferred.is_empty() {
            self.result
                .instance_configurations
                .push(InstanceConfiguration {
                    instance_name: name.to_string(),
                    properties: deferred,
                });
        }
        Ok(())
    }

    fn field_assignment(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let target = token(line, 0)?;
        let (instance_name, field_name) = field_reference(target)
            .ok_or_else(|| ParseError::syntax(format!("invalid field target \"{target}\"")))?;
        self.result.field_assignments.push(FieldAssignment {
            instance_name: instance_name.to_string(),
            field_name: field_name.to_string(),
            value: parse_argument(line.rest_after(1)),
        });
        Ok(())
    }

    fn becomes_assignment(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let target = token(line, 0)?;
        let target = match field_reference(target) {
            Some((instance_name, field_name)) => BecomesTarget::Field {
                instance_name: instance_name.to_string(),
                field_name: field_name.to_string(),
            },
            None if literal::is_name(target) => BecomesTarget::Variable {
                variable_name: target.to_string(),
            },
            None => {
                return Err(ParseError::syntax(format!(
                    "invalid becomes target \"{target}\""
                )));
            }
        };
        let expression = parse_expression(&line.tokens[2..])?;
        self.result
            .becomes_assignments
            .push(BecomesAssignment { target, expression });
        Ok(())
    }

    fn conditional_block(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let inner = condition_body(line.rest_after(1))
            .ok_or_else(|| ParseError::syntax("expected `name is <left OP right>`"))?;
        let condition = parse_condition(&tokenize(inner)?)?;
        self.result.conditional_blocks.push(ConditionalBlock {
            name: token(line, 0)?.to_string(),
            condition,
        });
        Ok(())
    }

    fn block_definition(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let rest = line.rest_after(1);
        let (body, tail) = match delimited(rest, '<', '>')? {
            Some(parts) => parts,
            None => delimited(rest, '(', ')')?
                .ok_or_else(|| ParseError::syntax("expected a block body in <...> or (...)"))?,
        };
        let parameters = if tail.is_empty() {
            Vec::new()
        } else {
            let names = tail
                .strip_prefix("with")
                .filter(|names| names.starts_with(char::is_whitespace))
                .ok_or_else(|| {
                    ParseError::syntax(format!("unexpected text after block body: \"{tail}\""))
                })?;
            let parameters = top_level_words(names)?
                .into_iter()
                .filter(|word| *word != "and")
                .map(|word| unquote(word).to_string())
                .collect::<Vec<_>>();
            if parameters.is_empty() {
                return Err(ParseError::syntax("expected parameter names after `with`"));
            }
            parameters
        };
        self.result.block_assignments.push(BlockAssignment {
            name: token(line, 0)?.to_string(),
            body: body.to_string(),
            parameters,
        });
        Ok(())
    }

    fn block_call(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let name = token(line, 0)?;
        let arguments = match line.text(2) {
            None => Vec::new(),
            Some("with") => keyword_arguments(line.rest_after(2))?,
            Some(other) => {
                return Err(ParseError::syntax(format!(
                    "expected `with` after `{name} call`, found \"{other}\""
                )));
            }
        };
        self.result.block_calls.push(BlockCall {
            name: name.to_string(),
            arguments,
        });
        Ok(())
    }

    /// `thenDo`, `otherwiseDo` and the combined if form.
    fn conditional_execution(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let condition_name = token(line, 0)?.to_string();
        let (action, tail) = action_clause(line.rest_after(1))?;
        let mut execution = ConditionalExecution {
            condition_name,
            then_action: None,
            otherwise_action: None,
        };
        if line.is(1, "otherwiseDo") {
            expect_end(tail)?;
            execution.otherwise_action = Some(action.to_string());
            self.result.conditional_otherwise_executions.push(execution);
            return Ok(());
        }

        execution.then_action = Some(action.to_string());
        if let Some(otherwise) = tail.strip_prefix("otherwiseDo") {
            let (action, tail) = action_clause(otherwise)?;
            expect_end(tail)?;
            execution.otherwise_action = Some(action.to_string());
        } else {
            expect_end(tail)?;
        }
        self.result.conditional_executions.push(execution);
        Ok(())
    }

    fn event_listener(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let (event, action) = if line.is(2, "with") && line.is(3, "when") && line.is(5, "action")
        {
            (token(line, 4)?, line.rest_after(5))
        } else if line.is(2, "with")
            && line.is(3, "event")
            && line.is(5, "and")
            && line.is(6, "action")
        {
            (token(line, 4)?, line.rest_after(6))
        } else {
            return Err(ParseError::syntax(
                "expected `addAction with event \"type\" and action <...>`",
            ));
        };
        let event = unquote(event);
        let event_type = event
            .parse::<EventType>()
            .map_err(|()| ParseError::InvalidEventType {
                event: event.to_string(),
            })?;
        let action = body_text(action)?;
        if action.is_empty() {
            return Err(ParseError::syntax("event listener needs an action"));
        }
        self.result.event_listeners.push(EventListenerBinding {
            instance_name: token(line, 0)?.to_string(),
            event_type,
            action: action.to_string(),
        });
        Ok(())
    }

    fn timer(&mut self, line: &Line<'_>) -> ParseResult<()> {
        if !(line.is(2, "with") && line.is(3, "time") && line.is(5, "and") && line.is(6, "action"))
        {
            return Err(ParseError::syntax(
                "expected `name repeat with time <ms> and action <...>`",
            ));
        }
        let value = unquote(token(line, 4)?);
        let interval_ms = parse_number(value)
            .filter(|interval| *interval > 0.0)
            .ok_or_else(|| ParseError::InvalidTimeValue {
                value: value.to_string(),
            })?;
        let action = body_text(line.rest_after(6))?;
        if action.is_empty() {
            return Err(ParseError::syntax("timer needs an action"));
        }
        self.result.timer_operations.push(TimerOperation {
            name: token(line, 0)?.to_string(),
            interval_ms,
            action: action.to_string(),
        });
        Ok(())
    }

    fn morph_containment(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let child = if line.is(1, "add") {
            token(line, 2)?
        } else {
            token(line, 4)?
        };
        self.result.morph_operations.push(MorphOperation {
            action: MorphAction::Add,
            parent: token(line, 0)?.to_string(),
            child: child.to_string(),
        });
        Ok(())
    }

    fn state_operation(&mut self, line: &Line<'_>) -> ParseResult<()> {
        self.result.state_operations.push(StateOperation {
            instance_name: token(line, 0)?.to_string(),
            key: unquote(token(line, 3)?).to_string(),
            value: parse_argument(line.rest_after(4)),
        });
        Ok(())
    }

    fn instance_configuration(&mut self, line: &Line<'_>) -> ParseResult<()> {
        self.result
            .instance_configurations
            .push(InstanceConfiguration {
                instance_name: token(line, 0)?.to_string(),
                properties: keyword_arguments(line.rest_after(1))?,
            });
        Ok(())
    }

    fn message(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let target = token(line, 0)?.to_string();
        let method_name = token(line, 1)?.to_string();
        if line.is(2, "with") {
            self.result.message_executions.push(MessageExecution {
                target,
                method_name,
                arguments: keyword_arguments(line.rest_after(2))?,
            });
        } else {
            let arguments = top_level_words(line.rest_after(1))?
                .into_iter()
                .map(parse_argument)
                .collect();
            self.result.method_calls.push(MethodCall {
                instance_name: target,
                method_name,
                arguments,
            });
        }
        Ok(())
    }

    fn list_operation(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let count = line.len();
        if count < 6 || !line.is(count - 4, "to") || !line.is(count - 2, "of") {
            return Err(ParseError::syntax(
                "expected `add <item> to \"field\" of <instance>`",
            ));
        }
        self.result.list_operations.push(ListOperation {
            instance_name: token(line, count - 1)?.to_string(),
            field_name: unquote(token(line, count - 3)?).to_string(),
            item: parse_argument(line.slice(1, count - 5)),
        });
        Ok(())
    }

    fn print(&mut self, line: &Line<'_>) -> ParseResult<()> {
        let rest = line.rest_after(0);
        let statement = match line.tokens.get(1) {
            None => PrintStatement {
                message: String::new(),
                expression: None,
            },
            Some(first) if line.len() == 2 && first.kind == TokenKind::String => PrintStatement {
                message: unquote(rest).to_string(),
                expression: None,
            },
            Some(_) => {
                let tokens = &line.tokens[1..];
                let expression = match parse_expression(tokens) {
                    Ok(expression) => Some(expression),
                    Err(err) if looks_like_expression(tokens) => return Err(err),
                    // Bare words print verbatim.
                    Err(_) => None,
                };
                PrintStatement {
                    message: rest.to_string(),
                    expression,
                }
            }
        };
        self.result.print_statements.push(statement);
        Ok(())
    }
}

enum Member {
    Field(FieldDefinition),
    Method(MethodDefinition),
}

/// `C has field "f" [has default V | default V]`
fn field_declaration(line: &Line<'_>) -> ParseResult<FieldDefinition> {
    let name = unquote(token(line, 3)?).to_string();
    let default_value = match (line.text(4), line.text(5)) {
        (None, _) => None,
        (Some("has"), Some("default")) => Some(parse_value(required(line.rest_after(5), "default")?)),
        (Some("default"), _) => Some(parse_value(required(line.rest_after(4), "default")?)),
        _ => {
            return Err(ParseError::syntax(format!(
                "unexpected text after field \"{name}\": \"{}\"",
                line.rest_after(3)
            )));
        }
    };
    Ok(FieldDefinition {
        name,
        default_value,
    })
}

/// `C defineField with name "n" [and default V]`
fn define_field(line: &Line<'_>) -> ParseResult<FieldDefinition> {
    if !line.is(2, "with") {
        return Err(ParseError::syntax(
            "expected `defineField with name \"field\"`",
        ));
    }
    let mut name = None;
    let mut default_value = None;
    for (key, value) in keyword_pairs(line.rest_after(2))? {
        match key {
            "name" => name = Some(unquote(value).to_string()),
            "default" => default_value = Some(parse_value(value)),
            other => {
                return Err(ParseError::syntax(format!(
                    "unknown defineField option \"{other}\""
                )));
            }
        }
    }
    Ok(FieldDefinition {
        name: name.ok_or_else(|| ParseError::syntax("defineField needs a name"))?,
        default_value,
    })
}

/// `... "name" [with "p1" ["p2" | and "p2"]] do <body>` with the name at
/// `name_index`. Covers both `has method` and positional `defineMethod`.
fn method_declaration(line: &Line<'_>, name_index: usize) -> ParseResult<MethodDefinition> {
    let name = unquote(token(line, name_index)?).to_string();
    let do_index = line
        .position("do")
        .filter(|index| *index > name_index)
        .ok_or_else(|| ParseError::syntax(format!("method \"{name}\" is missing `do`")))?;
    let mut parameters = Vec::new();
    if do_index > name_index + 1 {
        if !line.is(name_index + 1, "with") {
            return Err(ParseError::syntax(format!(
                "expected `with` or `do` after method \"{name}\""
            )));
        }
        parameters = line.tokens[name_index + 2..do_index]
            .iter()
            .filter(|token| token.text != "and")
            .map(|token| unquote(token.text.trim_end_matches(',')).to_string())
            .collect();
    }
    let body = method_body(&name, body_text(line.rest_after(do_index))?)?;
    Ok(MethodDefinition {
        name,
        parameters,
        body,
    })
}

fn method_body(name: &str, body: &str) -> ParseResult<String> {
    let body = body.trim();
    if body.is_empty() {
        return Err(ParseError::syntax(format!("method \"{name}\" needs a body")));
    }
    Ok(body.to_string())
}

/// `C defineMethod with name "n" [and parameters "a, b"] and do "body"`
fn define_method(line: &Line<'_>) -> ParseResult<MethodDefinition> {
    let mut name = None;
    let mut body = None;
    let mut parameters = Vec::new();
    for (key, value) in keyword_pairs(line.rest_after(2))? {
        match key {
            "name" => name = Some(unquote(value).to_string()),
            "do" => body = Some(body_text(value)?),
            "parameters" => {
                parameters = unquote(value)
                    .split(',')
                    .map(str::trim)
                    .filter(|parameter| !parameter.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            other => {
                return Err(ParseError::syntax(format!(
                    "unknown defineMethod option \"{other}\""
                )));
            }
        }
    }
    let name = name.ok_or_else(|| ParseError::syntax("defineMethod needs a name"))?;
    let body = body.ok_or_else(|| ParseError::syntax("defineMethod needs a `do` body"))?;
    Ok(MethodDefinition {
        body: method_body(&name, body)?,
        name,
        parameters,
    })
}

/// Reads `with action <...>` at the start of `text`, returning the action and
/// the remaining text.
pub(crate) fn action_clause(text: &str) -> ParseResult<(&str, &str)> {
    let rest = text
        .trim_start()
        .strip_prefix("with")
        .map(str::trim_start)
        .and_then(|rest| rest.strip_prefix("action"))
        .ok_or_else(|| {
            ParseError::syntax(format!(
                "expected `with action <...>`, found \"{}\"",
                text.trim()
            ))
        })?;
    delimited(rest, '<', '>')?
        .ok_or_else(|| ParseError::syntax("expected an action in angle brackets"))
}

/// A leading string or an operator marks text meant as an expression.
fn looks_like_expression(tokens: &[Token<'_>]) -> bool {
    tokens.first().is_some_and(|token| token.kind == TokenKind::String)
        || tokens.iter().any(|token| {
            token.kind != TokenKind::String && token.text.contains(['+', '-', '*', '/', '(', ')'])
        })
}

fn token<'a>(line: &Line<'a>, index: usize) -> ParseResult<&'a str> {
    line.text(index).ok_or_else(|| {
        ParseError::syntax(format!("statement \"{}\" ends too early", line.raw))
    })
}

fn required<'a>(text: &'a str, what: &str) -> ParseResult<&'a str> {
    if text.is_empty() {
        Err(ParseError::syntax(format!("missing {what} value")))
    } else {
        Ok(text)
    }
}

fn expect_end(tail: &str) -> ParseResult<()> {
    if tail.is_empty() {
        Ok(())
    } else {
        Err(ParseError::syntax(format!("unexpected trailing text \"{tail}\"")))
    }
}

/// Parses a whole program, one statement per line. The result lists the
/// given classes merged with those the program declares.
pub fn parse(source: &str, classes: &[ClassDefinition]) -> ExecutionResult {
    let mut catalog = ClassCatalog::from_definitions(classes.iter().cloned());
    let mut result = parse_against(source, &catalog);
    for class in result.classes.drain(..) {
        catalog.upsert(class);
    }
    result.classes = catalog.into_definitions();
    result
}

/// Like [`parse`], but `classes` of the result holds only the classes the
/// program declared or extended.
pub(crate) fn parse_against(source: &str, catalog: &ClassCatalog) -> ExecutionResult {
    let mut parser = Parser::new(catalog);
    for line in source.lines() {
        parser.parse_line(line);
    }
    parser.finish()
}

/// Parses a block or method body whose statements are separated by `;` or
/// newlines. Only classes the body declares or extends appear in the result.
pub fn parse_body(body: &str, catalog: &ClassCatalog) -> ExecutionResult {
    let mut parser = Parser::new(catalog);
    match split_statements(body) {
        Ok(statements) => {
            for statement in statements {
                parser.parse_line(statement);
            }
        }
        Err(err) => parser.record(err.into()),
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOperator, ComparisonOperator, Expression};
    use crate::value::Value;
    use indoc::indoc;

    fn parse_program(source: &str) -> ExecutionResult {
        parse(source, &[])
    }

    #[test]
    fn collects_class_members_across_syntaxes() {
        let result = parse_program(indoc! {r#"
            Task is a Class
            Task has field "title" has default "untitled"
            Task has field "done" default false
            Task defineField with name "priority" and default 2
            Task has method "finish" do myself.done becomes true
            Task defineMethod "rename" with "name" do {myself.title becomes name}
            Task defineMethod with name 'reset' and do "myself.done becomes false"
        "#});
        assert!(result.is_ok(), "{:?}", result.errors);
        let task = result.class("Task").expect("Task declared");
        let defaults = task
            .fields
            .iter()
            .map(|field| (field.name.as_str(), field.default_value.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            defaults,
            vec![
                ("title", Some(Value::string("untitled"))),
                ("done", Some(Value::Bool(false))),
                ("priority", Some(Value::Number(2.0))),
            ]
        );
        assert_eq!(
            task.methods,
            vec![
                MethodDefinition {
                    name: "finish".to_string(),
                    parameters: vec![],
                    body: "myself.done becomes true".to_string(),
                },
                MethodDefinition {
                    name: "rename".to_string(),
                    parameters: vec!["name".to_string()],
                    body: "myself.title becomes name".to_string(),
                },
                MethodDefinition {
                    name: "reset".to_string(),
                    parameters: vec![],
                    body: "myself.done becomes false".to_string(),
                },
            ]
        );
    }

    #[test]
    fn redeclaring_a_class_keeps_its_fields() {
        let result = parse_program(indoc! {r#"
            Task is a Class
            Task has field "title"
            Task is a Class
        "#});
        assert_eq!(result.classes.len(), 1);
        assert_eq!(result.classes[0].fields.len(), 1);
    }

    #[test]
    fn creates_instances_with_defaults_and_deferred_references() {
        let result = parse_program(indoc! {r#"
            Task is a Class
            Task has field "title" has default "untitled"
            Task has field "isDone"
            first is a Task
            second is a new Task with title "Ship it" and owner first.title
        "#});
        assert!(result.is_ok(), "{:?}", result.errors);
        let first = result.instance("first").expect("first created");
        assert_eq!(first.property("title"), Some(&Value::string("untitled")));
        assert_eq!(first.property("isDone"), Some(&Value::Bool(false)));

        let second = result.instance("second").expect("second created");
        assert_eq!(second.property("title"), Some(&Value::string("Ship it")));
        assert_eq!(second.property("owner"), None);
        assert_eq!(
            result.instance_configurations,
            vec![InstanceConfiguration {
                instance_name: "second".to_string(),
                properties: vec![KeywordArgument {
                    name: "owner".to_string(),
                    value: Argument::FieldReference {
                        instance_name: "first".to_string(),
                        field_name: "title".to_string(),
                    },
                }],
            }]
        );
    }

    #[test]
    fn records_operations() {
        let result = parse_program(indoc! {r#"
            cart.items is [milk, "eggs", 3]
            box.width becomes box.height + 10 * 3
            grow is <box.width becomes box.width + amount> with amount
            grow call with amount 15
            big is <box.width greater 100>
            big thenDo with action <print "big">
            big otherwiseDo with action <print "small">
            button addAction with event "click" and action <grow call with amount 1>
            tick repeat with time 500 and action <grow call with amount 1>
            panel add button
            add "bread" to "items" of cart
            connect cart to summary
            go to page "checkout"
            total is 12
        "#});
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(
            result.field_assignments[0].value,
            Argument::literal(Value::List(vec![
                Value::string("milk"),
                Value::string("eggs"),
                Value::Number(3.0),
            ]))
        );
        assert_eq!(
            result.becomes_assignments[0].expression,
            Expression::binary(
                Expression::field("box", "height"),
                BinaryOperator::Add,
                Expression::binary(
                    Expression::literal(10.0),
                    BinaryOperator::Multiply,
                    Expression::literal(3.0),
                ),
            )
        );
        assert_eq!(result.block_assignments[0].parameters, vec!["amount"]);
        assert_eq!(result.block_calls[0].arguments[0].value, Argument::literal(15.0));
        assert_eq!(
            result.conditional_blocks[0].condition,
            Expression::comparison(
                Expression::field("box", "width"),
                ComparisonOperator::Greater,
                Expression::literal(100.0),
            )
        );
        assert_eq!(result.conditional_executions.len(), 1);
        assert_eq!(result.conditional_otherwise_executions.len(), 1);
        assert_eq!(result.event_listeners[0].event_type, EventType::Click);
        assert_eq!(result.event_listeners[0].action, "grow call with amount 1");
        assert_eq!(result.timer_operations[0].interval_ms, 500.0);
        assert_eq!(result.morph_operations[0].child, "button");
        assert_eq!(result.list_operations[0].field_name, "items");
        assert_eq!(result.list_operations[0].item, Argument::literal("bread"));
        assert_eq!(result.connections[0].target, "summary");
        assert_eq!(result.page_navigations[0].page, "checkout");
        assert_eq!(result.variable_assignments[0].value, Argument::literal(12.0));
    }

    #[test]
    fn if_statement_keeps_both_branches_together() {
        let result =
            parse_program("ready thenDo with action <a open> otherwiseDo with action <a remove>");
        assert_eq!(
            result.conditional_executions,
            vec![ConditionalExecution {
                condition_name: "ready".to_string(),
                then_action: Some("a open".to_string()),
                otherwise_action: Some("a remove".to_string()),
            }]
        );
        assert!(result.conditional_otherwise_executions.is_empty());
    }

    #[test]
    fn messages_split_positional_and_keyword_forms() {
        let result = parse_program(indoc! {r#"
            calc add 1 other.value
            Person create with name "Ann" and age 30
            box open
        "#});
        assert_eq!(
            result.method_calls[0].arguments,
            vec![
                Argument::literal(1.0),
                Argument::FieldReference {
                    instance_name: "other".to_string(),
                    field_name: "value".to_string(),
                },
            ]
        );
        assert!(result.method_calls[1].arguments.is_empty());
        assert_eq!(result.message_executions[0].target, "Person");
        assert_eq!(result.message_executions[0].arguments.len(), 2);
    }

    #[test]
    fn print_keeps_literals_and_expressions_apart() {
        let result = parse_program(indoc! {r#"
            print "a // not a comment"
            print "Total: " + cart.total
            print Hello world
        "#});
        assert_eq!(result.print_statements[0].message, "a // not a comment");
        assert!(result.print_statements[0].expression.is_none());
        assert!(result.print_statements[1].expression.is_some());
        assert_eq!(result.print_statements[2].message, "Hello world");
        assert!(result.print_statements[2].expression.is_none());
    }

    #[test]
    fn comments_are_ignored() {
        let result = parse_program(indoc! {r#"
            // full line
            Task is a Class // trailing
            link is a Link with href "https://x.com"
        "#});
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.classes.len(), 1);
        assert_eq!(
            result.instance("link").and_then(|link| link.property("href")),
            Some(&Value::string("https://x.com"))
        );
    }

    #[test]
    fn each_bad_line_yields_one_error() {
        let result = parse_program(indoc! {r#"
            Task is a Class
            42 is the answer
            print "unterminated
            tick repeat with time soon and action <a open>
            button addAction with event "hover" and action <a open>
            t is a Task
        "#});
        assert_eq!(
            result.errors,
            vec![
                "Unknown statement pattern: 42 is the answer".to_string(),
                "Unterminated string literal at position 6".to_string(),
                "Invalid time value \"soon\": timer interval must be a positive number"
                    .to_string(),
                "Invalid event type \"hover\". Supported events: click, change, input, submit"
                    .to_string(),
            ]
        );
        assert!(result.instance("t").is_some());
    }

    #[test]
    fn methods_need_a_body() {
        let result = parse_program(indoc! {r#"
            Task has method "noop" do
            Task defineMethod "empty" do {}
            Task defineMethod with name "blank" and do ""
            Task has method "ok" do myself open
        "#});
        assert_eq!(
            result.errors,
            vec![
                "Invalid syntax: method \"noop\" needs a body".to_string(),
                "Invalid syntax: method \"empty\" needs a body".to_string(),
                "Invalid syntax: method \"blank\" needs a body".to_string(),
            ]
        );
        assert_eq!(result.class("Task").map(|task| task.methods.len()), Some(1));
    }

    #[test]
    fn malformed_print_expressions_are_reported() {
        let result = parse_program(indoc! {r#"
            print "a" +
            print cart.total *
            print just some words
        "#});
        assert_eq!(result.errors.len(), 2, "{:?}", result.errors);
        assert!(result.errors[0].starts_with("Invalid expression \"\"a\" +\""));
        assert!(result.errors[1].starts_with("Invalid expression \"cart.total *\""));
        assert_eq!(result.print_statements.len(), 1);
        assert_eq!(result.print_statements[0].message, "just some words");
    }

    #[test]
    fn bodies_report_only_the_classes_they_touch() {
        let catalog = ClassCatalog::from_definitions([
            ClassDefinition::new("Task"),
            ClassDefinition::new("Note"),
        ]);
        let result = parse_body("Task has field \"done\"; t is a Task", &catalog);
        assert!(result.is_ok(), "{:?}", result.errors);
        let names = result
            .classes
            .iter()
            .map(|class| class.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Task"]);
        assert_eq!(
            result.instance("t").and_then(|t| t.property("done")),
            Some(&crate::value::Value::Bool(false))
        );
    }

    #[test]
    fn parse_keeps_given_classes() {
        let result = parse("Task has field \"title\"", &[ClassDefinition::new("Note")]);
        let names = result
            .classes
            .iter()
            .map(|class| class.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Note", "Task"]);
    }

    #[test]
    fn bodies_split_on_semicolons() {
        let result = parse_body(
            "box.width becomes 10; print \"a; b\"\nbox open",
            &ClassCatalog::new(),
        );
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.becomes_assignments.len(), 1);
        assert_eq!(result.print_statements[0].message, "a; b");
        assert_eq!(result.method_calls.len(), 1);
    }
}
