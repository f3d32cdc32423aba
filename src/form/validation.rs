use crate::foundation::error::{TapestryError, TapestryResult};
use crate::foundation::value::Value;

/// A constraint on the submitted value of a form field, parsed from a
/// `required,minlength=3,max=10` specification.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValidator {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Min(f64),
    Max(f64),
}

impl FieldValidator {
    pub fn parse_list(spec: &str) -> TapestryResult<Vec<Self>> {
        spec.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn parse(term: &str) -> TapestryResult<Self> {
        let (name, constraint) = match term.split_once('=') {
            Some((n, c)) => (n.trim(), Some(c.trim())),
            None => (term.trim(), None),
        };
        let name = name.to_ascii_lowercase();
        let needs = |what: &str| {
            constraint.ok_or_else(|| {
                TapestryError::config(format!("validator '{name}' requires a {what} constraint"))
            })
        };
        let bad = |c: &str| {
            TapestryError::config(format!("invalid constraint '{c}' for validator '{name}'"))
        };
        match name.as_str() {
            "required" => Ok(Self::Required),
            "minlength" => {
                let c = needs("length")?;
                c.parse().map(Self::MinLength).map_err(|_| bad(c))
            }
            "maxlength" => {
                let c = needs("length")?;
                c.parse().map(Self::MaxLength).map_err(|_| bad(c))
            }
            "min" => {
                let c = needs("numeric")?;
                c.parse().map(Self::Min).map_err(|_| bad(c))
            }
            "max" => {
                let c = needs("numeric")?;
                c.parse().map(Self::Max).map_err(|_| bad(c))
            }
            other => Err(TapestryError::config(format!("unknown validator '{other}'"))),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Self::Required)
    }

    /// Checks a translated field value. Only `required` looks at blank values.
    pub fn validate(&self, label: &str, value: &Value) -> TapestryResult<()> {
        let blank = match value {
            Value::Null => true,
            Value::Str(s) => s.trim().is_empty(),
            _ => false,
        };
        if blank {
            return match self {
                Self::Required => Err(TapestryError::validation(format!(
                    "You must provide a value for {label}."
                ))),
                _ => Ok(()),
            };
        }
        match self {
            Self::Required => Ok(()),
            Self::MinLength(n) if text_len(value) < *n => Err(TapestryError::validation(
                format!("You must provide at least {n} characters for {label}."),
            )),
            Self::MaxLength(n) if text_len(value) > *n => Err(TapestryError::validation(
                format!("{label} may be at most {n} characters."),
            )),
            Self::Min(n) if number(value).is_some_and(|v| v < *n) => Err(
                TapestryError::validation(format!(
                    "{label} requires a value of at least {}.",
                    trim_number(*n)
                )),
            ),
            Self::Max(n) if number(value).is_some_and(|v| v > *n) => Err(
                TapestryError::validation(format!(
                    "{label} may not be larger than {}.",
                    trim_number(*n)
                )),
            ),
            _ => Ok(()),
        }
    }
}

fn text_len(value: &Value) -> usize {
    value.to_client_string().chars().count()
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Long(v) => Some(*v as f64),
        Value::Double(v) => Some(*v),
        Value::Str(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn trim_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Runs every validator, stopping at the first failure.
pub fn validate_all(validators: &[FieldValidator], label: &str, value: &Value) -> TapestryResult<()> {
    validators.iter().try_for_each(|v| v.validate(label, value))
}

#[cfg(test)]
#[path = "../../tests/unit/form/validation.rs"]
mod tests;
