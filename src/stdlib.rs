use std::rc::Rc;

use crate::runtime::{Callable, Value};

macro_rules! builtin {
    ($name:expr, $func:expr) => {
        Some(Value::Callable(Callable::BuiltIn {
            name: $name,
            func: Rc::new($func),
        }))
    };
}

fn wrong_argument_count(got: usize, want: usize) -> Value {
    Value::Error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

/// The builtin function table. Identifier lookup falls through to this
/// table after the environment chain, so user bindings can shadow any
/// builtin. Builtins report failures in-band as `Value::Error`.
pub fn lookup(name: &str) -> Option<Value> {
    match name {
        "len" => builtin!("len", |args: Vec<Value>| {
            if args.len() != 1 {
                return wrong_argument_count(args.len(), 1);
            }

            match &args[0] {
                // Byte length, not character count.
                Value::String(s) => Value::Integer(s.len() as i64),
                Value::Array(elements) => Value::Integer(elements.len() as i64),
                other => Value::Error(format!(
                    "argument to `len` not supported, got {}",
                    other.type_name()
                )),
            }
        }),

        "first" => builtin!("first", |args: Vec<Value>| {
            if args.len() != 1 {
                return wrong_argument_count(args.len(), 1);
            }

            match &args[0] {
                Value::Array(elements) => elements.first().cloned().unwrap_or(Value::Null),
                other => Value::Error(format!(
                    "argument to `first` must be ARRAY, got {}",
                    other.type_name()
                )),
            }
        }),

        "last" => builtin!("last", |args: Vec<Value>| {
            if args.len() != 1 {
                return wrong_argument_count(args.len(), 1);
            }

            match &args[0] {
                Value::Array(elements) => elements.last().cloned().unwrap_or(Value::Null),
                other => Value::Error(format!(
                    "argument to `last` must be ARRAY, got {}",
                    other.type_name()
                )),
            }
        }),

        "rest" => builtin!("rest", |args: Vec<Value>| {
            if args.len() != 1 {
                return wrong_argument_count(args.len(), 1);
            }

            match &args[0] {
                Value::Array(elements) => {
                    if elements.is_empty() {
                        Value::Null
                    } else {
                        Value::Array(elements[1..].to_vec())
                    }
                }
                other => Value::Error(format!(
                    "argument to `rest` must be ARRAY, got {}",
                    other.type_name()
                )),
            }
        }),

        "push" => builtin!("push", |args: Vec<Value>| {
            if args.len() != 2 {
                return wrong_argument_count(args.len(), 2);
            }

            match &args[0] {
                Value::Array(elements) => {
                    let mut pushed = elements.clone();
                    pushed.push(args[1].clone());
                    Value::Array(pushed)
                }
                other => Value::Error(format!(
                    "argument to `push` must be ARRAY, got {}",
                    other.type_name()
                )),
            }
        }),

        "puts" => builtin!("puts", |args: Vec<Value>| {
            for arg in &args {
                println!("{}", arg);
            }
            Value::Null
        }),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> Value {
        match lookup(name) {
            Some(Value::Callable(Callable::BuiltIn { func, .. })) => func(args),
            other => panic!("expected builtin {}, got {:?}", name, other),
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(lookup("frobnicate").is_none());
    }

    #[test]
    fn test_len() {
        assert_eq!(
            call("len", vec![Value::String("four".to_string())]),
            Value::Integer(4)
        );
        assert_eq!(
            call("len", vec![Value::Array(vec![Value::Integer(1)])]),
            Value::Integer(1)
        );
        assert_eq!(
            call("len", vec![Value::Integer(1)]),
            Value::Error("argument to `len` not supported, got INTEGER".to_string())
        );
        assert_eq!(
            call("len", vec![]),
            Value::Error("wrong number of arguments. got=0, want=1".to_string())
        );
    }

    #[test]
    fn test_first_and_last() {
        let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);

        assert_eq!(call("first", vec![array.clone()]), Value::Integer(1));
        assert_eq!(call("last", vec![array]), Value::Integer(2));
        assert_eq!(call("first", vec![Value::Array(vec![])]), Value::Null);
        assert_eq!(call("last", vec![Value::Array(vec![])]), Value::Null);
        assert_eq!(
            call("first", vec![Value::Boolean(true)]),
            Value::Error("argument to `first` must be ARRAY, got BOOLEAN".to_string())
        );
    }

    #[test]
    fn test_rest_returns_a_fresh_array() {
        let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);

        assert_eq!(
            call("rest", vec![array.clone()]),
            Value::Array(vec![Value::Integer(2)])
        );
        // The input is untouched.
        assert_eq!(
            array,
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(call("rest", vec![Value::Array(vec![])]), Value::Null);
    }

    #[test]
    fn test_push_returns_a_fresh_array() {
        let array = Value::Array(vec![Value::Integer(1)]);

        assert_eq!(
            call("push", vec![array.clone(), Value::Integer(2)]),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(array, Value::Array(vec![Value::Integer(1)]));
        assert_eq!(
            call("push", vec![array]),
            Value::Error("wrong number of arguments. got=1, want=2".to_string())
        );
    }

    #[test]
    fn test_puts_returns_null() {
        assert_eq!(call("puts", vec![]), Value::Null);
        assert_eq!(
            call("puts", vec![Value::Integer(1), Value::Integer(2)]),
            Value::Null
        );
    }

    #[test]
    fn test_builtin_display() {
        let builtin = lookup("len").expect("len should exist");
        assert_eq!(builtin.to_string(), "<built-in len>");
        assert_eq!(builtin.type_name(), "BUILTIN");
    }
}
