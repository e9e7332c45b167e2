//! Builtin exception classes and exception instances.

use std::cell::RefCell;
use std::rc::Rc;

use super::{ClassValue, FxIndexMap, Value};
use dys_ir::Name;

/// Builtin exception class.
///
/// The hierarchy mirrors Python for every class scripts can
/// name, so `except LookupError` catches a `KeyError`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExcType {
    Exception,
    ArithmeticError,
    AssertionError,
    AttributeError,
    DeprecationError,
    FloatingPointError,
    ImportError,
    IndexError,
    JsonDecodeError,
    KeyError,
    LookupError,
    MemoryError,
    ModuleNotFoundError,
    NameError,
    NotImplementedError,
    OverflowError,
    PermissionError,
    RecursionError,
    SyntaxError,
    TypeError,
    UnboundLocalError,
    UnicodeDecodeError,
    UnicodeEncodeError,
    UnicodeError,
    ValueError,
    ZeroDivisionError,
}

impl ExcType {
    /// Classes installed in the builtins layer.
    pub const BUILTINS: [ExcType; 25] = [
        ExcType::ArithmeticError,
        ExcType::AssertionError,
        ExcType::AttributeError,
        ExcType::Exception,
        ExcType::FloatingPointError,
        ExcType::ImportError,
        ExcType::IndexError,
        ExcType::KeyError,
        ExcType::LookupError,
        ExcType::ModuleNotFoundError,
        ExcType::NameError,
        ExcType::NotImplementedError,
        ExcType::OverflowError,
        ExcType::PermissionError,
        ExcType::RecursionError,
        ExcType::SyntaxError,
        ExcType::TypeError,
        ExcType::UnboundLocalError,
        ExcType::UnicodeError,
        ExcType::UnicodeDecodeError,
        ExcType::UnicodeEncodeError,
        ExcType::ValueError,
        ExcType::ZeroDivisionError,
        ExcType::MemoryError,
        ExcType::DeprecationError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExcType::Exception => "Exception",
            ExcType::ArithmeticError => "ArithmeticError",
            ExcType::AssertionError => "AssertionError",
            ExcType::AttributeError => "AttributeError",
            ExcType::DeprecationError => "DeprecationError",
            ExcType::FloatingPointError => "FloatingPointError",
            ExcType::ImportError => "ImportError",
            ExcType::IndexError => "IndexError",
            ExcType::JsonDecodeError => "JSONDecodeError",
            ExcType::KeyError => "KeyError",
            ExcType::LookupError => "LookupError",
            ExcType::MemoryError => "MemoryError",
            ExcType::ModuleNotFoundError => "ModuleNotFoundError",
            ExcType::NameError => "NameError",
            ExcType::NotImplementedError => "NotImplementedError",
            ExcType::OverflowError => "OverflowError",
            ExcType::PermissionError => "PermissionError",
            ExcType::RecursionError => "RecursionError",
            ExcType::SyntaxError => "SyntaxError",
            ExcType::TypeError => "TypeError",
            ExcType::UnboundLocalError => "UnboundLocalError",
            ExcType::UnicodeDecodeError => "UnicodeDecodeError",
            ExcType::UnicodeEncodeError => "UnicodeEncodeError",
            ExcType::UnicodeError => "UnicodeError",
            ExcType::ValueError => "ValueError",
            ExcType::ZeroDivisionError => "ZeroDivisionError",
        }
    }

    /// Direct superclass; `None` for `Exception`.
    pub fn parent(self) -> Option<ExcType> {
        let parent = match self {
            ExcType::Exception => return None,
            ExcType::FloatingPointError | ExcType::OverflowError | ExcType::ZeroDivisionError => {
                ExcType::ArithmeticError
            }
            ExcType::IndexError | ExcType::KeyError => ExcType::LookupError,
            ExcType::ModuleNotFoundError => ExcType::ImportError,
            ExcType::UnboundLocalError => ExcType::NameError,
            ExcType::UnicodeDecodeError | ExcType::UnicodeEncodeError => ExcType::UnicodeError,
            ExcType::UnicodeError | ExcType::JsonDecodeError => ExcType::ValueError,
            _ => ExcType::Exception,
        };
        Some(parent)
    }

    /// `issubclass(self, other)`.
    pub fn is_subclass_of(self, other: ExcType) -> bool {
        let mut current = Some(self);
        while let Some(ty) = current {
            if ty == other {
                return true;
            }
            current = ty.parent();
        }
        false
    }
}

/// A raised or raisable exception object.
///
/// Instances of script classes deriving from an exception class are also
/// represented here, with `class` pointing at the script class.
#[derive(Debug)]
pub struct ExceptionValue {
    pub ty: ExcType,
    pub class: Option<Rc<ClassValue>>,
    pub args: Vec<Value>,
    pub attrs: RefCell<FxIndexMap<Name, Value>>,
    pub cause: RefCell<Option<Value>>,
}

impl ExceptionValue {
    pub fn new(ty: ExcType, args: Vec<Value>) -> Self {
        ExceptionValue {
            ty,
            class: None,
            args,
            attrs: RefCell::new(FxIndexMap::default()),
            cause: RefCell::new(None),
        }
    }

    pub fn with_class(class: Rc<ClassValue>, ty: ExcType, args: Vec<Value>) -> Self {
        ExceptionValue {
            class: Some(class),
            ..ExceptionValue::new(ty, args)
        }
    }

    /// Name of the most derived class.
    pub fn class_name(&self) -> Rc<str> {
        match &self.class {
            Some(class) => Rc::clone(&class.name),
            None => Rc::from(self.ty.name()),
        }
    }

    /// `str(exc)`.
    pub fn message(&self) -> String {
        match self.args.as_slice() {
            [] => String::new(),
            // KeyError shows its key quoted.
            [key] if self.ty == ExcType::KeyError => key.repr(),
            [arg] => arg.to_str(),
            args => Value::tuple(args.to_vec()).repr(),
        }
    }

    /// `repr(exc)`: `ValueError('bad')`.
    pub fn repr(&self) -> String {
        let args: Vec<String> = self.args.iter().map(Value::repr).collect();
        format!("{}({})", self.class_name(), args.join(", "))
    }

    /// Whether this exception is an instance of the builtin class `ty`.
    pub fn is_instance_of(&self, ty: ExcType) -> bool {
        self.ty.is_subclass_of(ty)
    }
}
