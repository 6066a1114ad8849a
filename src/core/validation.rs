//! Declarative request validation.
//!
//! A [`RequestSchema`] lists the fields accepted in the path parameters and in
//! the body of one endpoint. [`RequestSchema::validate`] checks both sections
//! and reports every offending field at once, so a client can fix a request in
//! a single round trip.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Params,
    Body,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Params => "params",
            Location::Body => "body",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer in `1..=i32::MAX`, the range of a SERIAL primary key.
    PositiveInteger,
    Boolean,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ValidationOptions {
    /// Accept numeric strings for integers and `"true"`/`"false"` for booleans.
    pub convert: bool,
    /// Keep keys that have no rule instead of rejecting them.
    pub allow_unknown: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            convert: true,
            allow_unknown: false,
        }
    }
}

impl ValidationOptions {
    pub fn strict() -> Self {
        Self {
            convert: false,
            allow_unknown: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    NumberBase,
    NumberInteger,
    NumberPositive,
    NumberRange,
    BooleanBase,
    ObjectBase,
    ObjectUnknown,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Required => "required",
            ViolationKind::NumberBase => "number.base",
            ViolationKind::NumberInteger => "number.integer",
            ViolationKind::NumberPositive => "number.positive",
            ViolationKind::NumberRange => "number.range",
            ViolationKind::BooleanBase => "boolean.base",
            ViolationKind::ObjectBase => "object.base",
            ViolationKind::ObjectUnknown => "object.unknown",
        }
    }

    fn message(&self, field: &str) -> String {
        match self {
            ViolationKind::Required => format!("\"{}\" is required", field),
            ViolationKind::NumberBase => format!("\"{}\" must be a number", field),
            ViolationKind::NumberInteger => format!("\"{}\" must be an integer", field),
            ViolationKind::NumberPositive => format!("\"{}\" must be a positive number", field),
            ViolationKind::NumberRange => {
                format!("\"{}\" must be less than or equal to {}", field, i32::MAX)
            }
            ViolationKind::BooleanBase => format!("\"{}\" must be a boolean", field),
            ViolationKind::ObjectBase => format!("\"{}\" must be of type object", field),
            ViolationKind::ObjectUnknown => format!("\"{}\" is not allowed", field),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub location: Location,
    pub kind: ViolationKind,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, location: Location, kind: ViolationKind) -> Self {
        Self {
            field: field.to_string(),
            location,
            kind,
            message: kind.message(field),
        }
    }
}

fn join_messages(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|x| x.message.as_str())
        .collect::<Vec<&str>>()
        .join(". ")
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{}", join_messages(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|x| x.field.as_str()).collect()
    }

    pub fn kind_of(&self, field: &str) -> Option<ViolationKind> {
        self.violations
            .iter()
            .find(|x| x.field == field)
            .map(|x| x.kind)
    }
}

/// Normalized values of a request that passed validation.
#[derive(Clone, Debug, Default)]
pub struct ValidatedRequest {
    pub params: Map<String, Value>,
    pub body: Map<String, Value>,
}

impl ValidatedRequest {
    /// Deserialize params and body merged into one object; params win on
    /// duplicate keys.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<T, ValidationError> {
        let mut merged = self.body;
        merged.extend(self.params);
        serde_json::from_value(Value::Object(merged)).map_err(|err| ValidationError {
            violations: vec![FieldViolation {
                field: "".to_string(),
                location: Location::Body,
                kind: ViolationKind::ObjectBase,
                message: err.to_string(),
            }],
        })
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RequestSchema {
    pub params: &'static [FieldRule],
    pub body: &'static [FieldRule],
}

impl RequestSchema {
    pub fn validate(
        &self,
        params: &Value,
        body: &Value,
        options: ValidationOptions,
    ) -> Result<ValidatedRequest, ValidationError> {
        let mut violations: Vec<FieldViolation> = vec![];
        let params = validate_section(
            self.params,
            params,
            Location::Params,
            options,
            &mut violations,
        );
        let body = validate_section(self.body, body, Location::Body, options, &mut violations);
        if !violations.is_empty() {
            return Err(ValidationError { violations });
        }
        Ok(ValidatedRequest { params, body })
    }

    pub fn validate_into<T: DeserializeOwned>(
        &self,
        params: &Value,
        body: &Value,
        options: ValidationOptions,
    ) -> Result<T, ValidationError> {
        self.validate(params, body, options)?.into_typed()
    }
}

fn validate_section(
    rules: &[FieldRule],
    section: &Value,
    location: Location,
    options: ValidationOptions,
    violations: &mut Vec<FieldViolation>,
) -> Map<String, Value> {
    let empty = Map::new();
    let input = match section {
        Value::Object(val) => val,
        Value::Null => &empty,
        _ => {
            violations.push(FieldViolation::new(
                location.as_str(),
                location,
                ViolationKind::ObjectBase,
            ));
            return Map::new();
        }
    };

    let mut output = Map::new();
    for rule in rules {
        let value = match input.get(rule.name) {
            None | Some(Value::Null) => {
                if rule.required {
                    violations.push(FieldViolation::new(
                        rule.name,
                        location,
                        ViolationKind::Required,
                    ));
                }
                continue;
            }
            Some(val) => val,
        };
        let checked = match rule.kind {
            FieldKind::PositiveInteger => check_positive_integer(value, options.convert),
            FieldKind::Boolean => check_boolean(value, options.convert),
        };
        match checked {
            Ok(val) => {
                output.insert(rule.name.to_string(), val);
            }
            Err(kind) => violations.push(FieldViolation::new(rule.name, location, kind)),
        }
    }

    for (key, value) in input.iter() {
        if rules.iter().any(|x| x.name == key) {
            continue;
        }
        if options.allow_unknown {
            output.insert(key.clone(), value.clone());
        } else {
            violations.push(FieldViolation::new(
                key,
                location,
                ViolationKind::ObjectUnknown,
            ));
        }
    }
    output
}

fn check_positive_integer(value: &Value, convert: bool) -> Result<Value, ViolationKind> {
    let number = match value {
        Value::Number(val) => match val.as_i64() {
            Some(int) => return int_in_range(int),
            None => val.as_f64().ok_or(ViolationKind::NumberBase)?,
        },
        Value::String(val) if convert => {
            let trimmed = val.trim();
            match trimmed.parse::<f64>() {
                Ok(parsed) if !trimmed.is_empty() && parsed.is_finite() => parsed,
                _ => return Err(ViolationKind::NumberBase),
            }
        }
        _ => return Err(ViolationKind::NumberBase),
    };
    if number.fract() != 0.0 {
        return Err(ViolationKind::NumberInteger);
    }
    if number <= 0.0 {
        return Err(ViolationKind::NumberPositive);
    }
    if number > i32::MAX as f64 {
        return Err(ViolationKind::NumberRange);
    }
    int_in_range(number as i64)
}

fn int_in_range(value: i64) -> Result<Value, ViolationKind> {
    if value <= 0 {
        return Err(ViolationKind::NumberPositive);
    }
    match i32::try_from(value) {
        Ok(val) => Ok(Value::from(val)),
        Err(_) => Err(ViolationKind::NumberRange),
    }
}

fn check_boolean(value: &Value, convert: bool) -> Result<Value, ViolationKind> {
    match value {
        Value::Bool(val) => Ok(Value::Bool(*val)),
        Value::String(val) if convert => match val.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(ViolationKind::BooleanBase),
        },
        _ => Err(ViolationKind::BooleanBase),
    }
}
