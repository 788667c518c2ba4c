use std::fmt::{self, Debug, Display, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use log::warn;

use crate::environment::Environment;
use crate::error::Error;
use crate::parser::{BinaryOp, BlockStatement, Expression, Parser, Program, Statement, UnaryOp};
use crate::stdlib;
use crate::tokenizer::Lexer;

// Runaway user-level recursion becomes an in-band error instead of
// exhausting the host stack.
const MAX_CALL_DEPTH: usize = 1000;

#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
    Null,
    Return(Box<Value>),
    Error(String),
    Callable(Callable),
    Array(Vec<Value>),
    Hash(IndexMap<HashKey, Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::Return(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
            Value::Callable(Callable::Function { .. }) => "FUNCTION",
            Value::Callable(Callable::BuiltIn { .. }) => "BUILTIN",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Callable(_), Value::Callable(_)) => false,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
            Value::Null => f.write_str("null"),
            Value::Return(value) => write!(f, "{}", value),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::Callable(callable) => write!(f, "{}", callable),
            Value::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(Value::to_string).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Value::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Value::String(s) = self {
            write!(f, "\"{}\"", s)
        } else {
            write!(f, "{}", self)
        }
    }
}

#[derive(Clone)]
pub enum Callable {
    Function {
        parameters: Vec<String>,
        body: BlockStatement,
        env: Environment,
    },
    BuiltIn {
        name: &'static str,
        func: Rc<dyn Fn(Vec<Value>) -> Value>,
    },
}

impl Display for Callable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Callable::Function {
                parameters, body, ..
            } => {
                write!(f, "fn({}) {{ {} }}", parameters.join(", "), body)
            }
            Callable::BuiltIn { name, .. } => write!(f, "<built-in {}>", name),
        }
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl PartialEq for Callable {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

impl Eq for Callable {}

/// Structural hash key, derived only from the hashable value variants.
/// Two values map to the same key exactly when they are the same variant
/// with an equal payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

impl HashKey {
    pub fn from_value(value: &Value) -> Option<HashKey> {
        match value {
            Value::Integer(value) => Some(HashKey::Integer(*value)),
            Value::Boolean(value) => Some(HashKey::Boolean(*value)),
            Value::String(value) => Some(HashKey::String(value.clone())),
            _ => None,
        }
    }
}

impl Display for HashKey {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            HashKey::Integer(value) => write!(f, "{}", value),
            HashKey::Boolean(value) => write!(f, "{}", value),
            HashKey::String(value) => f.write_str(value),
        }
    }
}

/// Lex, parse, evaluate. Parser failures surface as `Error::Parse`;
/// runtime failures stay in-band as `Value::Error`.
pub fn interpret(source: &str, env: &Environment) -> Result<Value, Error> {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        return Err(Error::Parse(parser.errors().to_vec()));
    }

    Ok(Evaluator::new().evaluate_program(&program, env))
}

#[derive(Default)]
pub struct Evaluator {
    call_depth: usize,
}

impl Evaluator {
    pub fn new() -> Self {
        Evaluator::default()
    }

    pub fn evaluate_program(&mut self, program: &Program, env: &Environment) -> Value {
        let mut result = Value::Null;

        for statement in &program.statements {
            result = self.evaluate_statement(statement, env);
            match result {
                // A top-level return ends the program with its inner value.
                Value::Return(value) => return *value,
                Value::Error(_) => return result,
                _ => {}
            }
        }

        result
    }

    fn evaluate_statement(&mut self, statement: &Statement, env: &Environment) -> Value {
        match statement {
            Statement::Let { name, value } => {
                let value = self.evaluate_expression(value, env);
                if value.is_error() {
                    return value;
                }
                env.insert(name.clone(), value);
                Value::Null
            }
            Statement::Return { value } => {
                let value = self.evaluate_expression(value, env);
                if value.is_error() {
                    return value;
                }
                Value::Return(Box::new(value))
            }
            Statement::Expression { expression } => self.evaluate_expression(expression, env),
        }
    }

    // Return values pass through blocks unopened, so a `return` deep inside
    // nested blocks still unwinds to the enclosing function or program top.
    fn evaluate_block(&mut self, block: &BlockStatement, env: &Environment) -> Value {
        let mut result = Value::Null;

        for statement in &block.statements {
            result = self.evaluate_statement(statement, env);
            if matches!(result, Value::Return(_) | Value::Error(_)) {
                return result;
            }
        }

        result
    }

    fn evaluate_expression(&mut self, expression: &Expression, env: &Environment) -> Value {
        match expression {
            Expression::Identifier(name) => evaluate_identifier(name, env),
            Expression::IntegerLiteral(value) => Value::Integer(*value),
            Expression::Boolean(value) => Value::Boolean(*value),
            Expression::StringLiteral(value) => Value::String(value.clone()),
            Expression::Prefix { operator, right } => {
                let right = self.evaluate_expression(right, env);
                if right.is_error() {
                    return right;
                }
                evaluate_prefix(*operator, right)
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate_expression(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.evaluate_expression(right, env);
                if right.is_error() {
                    return right;
                }
                evaluate_infix(*operator, left, right)
            }
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition = self.evaluate_expression(condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.evaluate_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.evaluate_block(alternative, env)
                } else {
                    Value::Null
                }
            }
            Expression::FunctionLiteral { parameters, body } => {
                Value::Callable(Callable::Function {
                    parameters: parameters.clone(),
                    body: body.clone(),
                    // Capture the defining environment by reference.
                    env: env.clone(),
                })
            }
            Expression::Call {
                function,
                arguments,
            } => {
                let function = self.evaluate_expression(function, env);
                if function.is_error() {
                    return function;
                }
                let arguments = match self.evaluate_expressions(arguments, env) {
                    Ok(arguments) => arguments,
                    Err(error) => return error,
                };
                self.apply_function(function, arguments)
            }
            Expression::ArrayLiteral(elements) => {
                match self.evaluate_expressions(elements, env) {
                    Ok(elements) => Value::Array(elements),
                    Err(error) => error,
                }
            }
            Expression::Index { left, index } => {
                let left = self.evaluate_expression(left, env);
                if left.is_error() {
                    return left;
                }
                let index = self.evaluate_expression(index, env);
                if index.is_error() {
                    return index;
                }
                evaluate_index(left, index)
            }
            Expression::HashLiteral(pairs) => self.evaluate_hash_literal(pairs, env),
        }
    }

    fn evaluate_expressions(
        &mut self,
        expressions: &[Expression],
        env: &Environment,
    ) -> Result<Vec<Value>, Value> {
        let mut values = Vec::with_capacity(expressions.len());

        for expression in expressions {
            let value = self.evaluate_expression(expression, env);
            if value.is_error() {
                return Err(value);
            }
            values.push(value);
        }

        Ok(values)
    }

    fn apply_function(&mut self, function: Value, arguments: Vec<Value>) -> Value {
        match function {
            Value::Callable(Callable::Function {
                parameters,
                body,
                env,
            }) => {
                if self.call_depth >= MAX_CALL_DEPTH {
                    return Value::Error("maximum call depth exceeded".to_string());
                }
                if parameters.len() != arguments.len() {
                    warn!(
                        "function expected {} arguments, got {}",
                        parameters.len(),
                        arguments.len()
                    );
                }

                // The call scope encloses the *captured* environment, not the
                // caller's. Parameters bind positionally; a missing argument
                // leaves its parameter unbound.
                let call_env = env.extend();
                for (parameter, argument) in parameters.iter().zip(arguments) {
                    call_env.insert(parameter.clone(), argument);
                }

                self.call_depth += 1;
                let result = self.evaluate_block(&body, &call_env);
                self.call_depth -= 1;

                match result {
                    Value::Return(value) => *value,
                    other => other,
                }
            }
            Value::Callable(Callable::BuiltIn { func, .. }) => func(arguments),
            other => Value::Error(format!("not a function: {}", other.type_name())),
        }
    }

    fn evaluate_hash_literal(
        &mut self,
        pairs: &[(Expression, Expression)],
        env: &Environment,
    ) -> Value {
        let mut hash = IndexMap::with_capacity(pairs.len());

        for (key_expression, value_expression) in pairs {
            let key = self.evaluate_expression(key_expression, env);
            if key.is_error() {
                return key;
            }
            let Some(key) = HashKey::from_value(&key) else {
                return Value::Error(format!("unusable as hash key: {}", key.type_name()));
            };

            let value = self.evaluate_expression(value_expression, env);
            if value.is_error() {
                return value;
            }

            hash.insert(key, value);
        }

        Value::Hash(hash)
    }
}

fn evaluate_identifier(name: &str, env: &Environment) -> Value {
    env.get(name)
        .or_else(|| stdlib::lookup(name))
        .unwrap_or_else(|| Value::Error(format!("identifier not found: {}", name)))
}

fn evaluate_prefix(operator: UnaryOp, right: Value) -> Value {
    match operator {
        UnaryOp::Not => Value::Boolean(!right.is_truthy()),
        UnaryOp::Negate => match right {
            Value::Integer(value) => Value::Integer(value.wrapping_neg()),
            other => Value::Error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

// Dispatch by operand variants: integer and string pairs get their own
// tables, every other same-type pair supports only (in)equality, and
// differing types are a mismatch.
fn evaluate_infix(operator: BinaryOp, left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Integer(left), Value::Integer(right)) => {
            evaluate_integer_infix(operator, left, right)
        }
        (Value::String(left), Value::String(right)) => {
            evaluate_string_infix(operator, left, right)
        }
        (left, right) if left.type_name() != right.type_name() => Value::Error(format!(
            "type mismatch: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        )),
        (left, right) => match operator {
            BinaryOp::Equal => Value::Boolean(left == right),
            BinaryOp::NotEqual => Value::Boolean(left != right),
            _ => Value::Error(format!(
                "unknown operator: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
        },
    }
}

// Arithmetic wraps on overflow; only division by zero is reported.
fn evaluate_integer_infix(operator: BinaryOp, left: i64, right: i64) -> Value {
    match operator {
        BinaryOp::Add => Value::Integer(left.wrapping_add(right)),
        BinaryOp::Subtract => Value::Integer(left.wrapping_sub(right)),
        BinaryOp::Multiply => Value::Integer(left.wrapping_mul(right)),
        BinaryOp::Divide => {
            if right == 0 {
                Value::Error("division by zero".to_string())
            } else {
                // Truncates toward zero.
                Value::Integer(left.wrapping_div(right))
            }
        }
        BinaryOp::Less => Value::Boolean(left < right),
        BinaryOp::Greater => Value::Boolean(left > right),
        BinaryOp::Equal => Value::Boolean(left == right),
        BinaryOp::NotEqual => Value::Boolean(left != right),
    }
}

fn evaluate_string_infix(operator: BinaryOp, left: String, right: String) -> Value {
    match operator {
        BinaryOp::Add => Value::String(left + &right),
        _ => Value::Error(format!("unknown operator: STRING {} STRING", operator)),
    }
}

fn evaluate_index(left: Value, index: Value) -> Value {
    match (left, index) {
        (Value::Array(elements), Value::Integer(index)) => {
            if index < 0 || index as usize >= elements.len() {
                Value::Null
            } else {
                elements[index as usize].clone()
            }
        }
        (Value::Hash(pairs), key) => match HashKey::from_value(&key) {
            Some(key) => pairs.get(&key).cloned().unwrap_or(Value::Null),
            None => Value::Error(format!("unusable as hash key: {}", key.type_name())),
        },
        (left, _) => Value::Error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}
