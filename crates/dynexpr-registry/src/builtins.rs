//! Built-in classes and extension methods.
//!
//! Installed into the global registry and extension index on first
//! access: string members, the `Map` indexer, `DateTime` instance and
//! static members, the `Math` and `Guid` static classes, and the
//! sequence extension set shared by arrays and strings.

use chrono::{Datelike, Duration, Months, NaiveDateTime, Timelike};
use lazy_static::lazy_static;
use uuid::Uuid;

use dynexpr_core::{arith, parse_datetime, CallContext, EvalError, NamedTy, Ty, Value};

use crate::entries::{ClassEntry, MethodEntry, ParamDef};
use crate::extensions::{ExtParam, ExtensionEntry, ExtensionIndex, TyScheme};
use crate::registry::TypeRegistry;

lazy_static! {
    static ref TO_STRING: MethodEntry = MethodEntry::instance(
        "ToString",
        Vec::new(),
        Ty::Str,
        |cx: CallContext<'_>| Ok(Value::from(cx.arg(0)?.to_string())),
    );
}

/// `ToString()` resolves on every value; nulls render empty.
pub fn universal_to_string() -> MethodEntry {
    TO_STRING.clone()
}

pub(crate) fn install_types(registry: &TypeRegistry) {
    registry.register(string_class());
    registry.register(map_class());
    registry.register(datetime_class());
    registry.register(math_class());
    registry.register(guid_class());
}

pub(crate) fn install_extensions(index: &ExtensionIndex) {
    for entry in sequence_extensions() {
        index.register(entry);
    }
}

fn expected(kind: &str, found: &Value) -> EvalError {
    EvalError::TypeMismatch {
        expected: kind.to_string(),
        found: found.ty().to_string(),
    }
}

fn string_class() -> ClassEntry {
    ClassEntry::new(NamedTy::plain("string"))
        .with_property("Length", Ty::Int32, |v| {
            Ok(Value::Int32(v.as_str()?.chars().count() as i32))
        })
        .with_indexer(Ty::Int32, Ty::Char, |v, key| {
            let s = v.as_str()?;
            let index = key.as_i32()?;
            usize::try_from(index)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char)
                .ok_or_else(|| EvalError::IndexOutOfRange {
                    index: index as i64,
                    len: s.chars().count(),
                })
        })
        .with_method(MethodEntry::instance(
            "ToLower",
            Vec::new(),
            Ty::Str,
            |cx: CallContext<'_>| Ok(Value::from(cx.str_arg(0)?.to_lowercase())),
        ))
        .with_method(MethodEntry::instance(
            "ToUpper",
            Vec::new(),
            Ty::Str,
            |cx: CallContext<'_>| Ok(Value::from(cx.str_arg(0)?.to_uppercase())),
        ))
        .with_method(MethodEntry::instance(
            "Contains",
            vec![ParamDef::required("value", Ty::Str)],
            Ty::Bool,
            |cx: CallContext<'_>| Ok(Value::Bool(cx.str_arg(0)?.contains(cx.str_arg(1)?))),
        ))
        .with_method(MethodEntry::instance(
            "StartsWith",
            vec![ParamDef::required("value", Ty::Str)],
            Ty::Bool,
            |cx: CallContext<'_>| Ok(Value::Bool(cx.str_arg(0)?.starts_with(cx.str_arg(1)?))),
        ))
        .with_method(MethodEntry::instance(
            "EndsWith",
            vec![ParamDef::required("value", Ty::Str)],
            Ty::Bool,
            |cx: CallContext<'_>| Ok(Value::Bool(cx.str_arg(0)?.ends_with(cx.str_arg(1)?))),
        ))
        .with_method(MethodEntry::instance(
            "IndexOf",
            vec![ParamDef::required("value", Ty::Str)],
            Ty::Int32,
            |cx: CallContext<'_>| {
                let s = cx.str_arg(0)?;
                // char index, not byte index
                let found = s
                    .find(cx.str_arg(1)?)
                    .map(|byte| s[..byte].chars().count() as i32)
                    .unwrap_or(-1);
                Ok(Value::Int32(found))
            },
        ))
        .with_method(MethodEntry::instance(
            "Substring",
            vec![
                ParamDef::required("start", Ty::Int32),
                ParamDef::optional("length", Ty::Int32.nullable(), Value::Null),
            ],
            Ty::Str,
            |cx: CallContext<'_>| {
                let chars: Vec<char> = cx.str_arg(0)?.chars().collect();
                let start = cx.i32_arg(1)?;
                let out_of_range = |index: i32| EvalError::IndexOutOfRange {
                    index: index as i64,
                    len: chars.len(),
                };
                let start = usize::try_from(start).map_err(|_| out_of_range(start))?;
                if start > chars.len() {
                    return Err(out_of_range(start as i32));
                }
                let rest = &chars[start..];
                let taken = match cx.opt_i32_arg(2)? {
                    None => rest,
                    Some(len) => {
                        let len = usize::try_from(len).map_err(|_| out_of_range(len))?;
                        rest.get(..len).ok_or_else(|| out_of_range(len as i32))?
                    }
                };
                Ok(Value::from(taken.iter().collect::<String>()))
            },
        ))
        .with_method(MethodEntry::instance(
            "Trim",
            Vec::new(),
            Ty::Str,
            |cx: CallContext<'_>| Ok(Value::from(cx.str_arg(0)?.trim())),
        ))
        .with_method(MethodEntry::instance(
            "Replace",
            vec![
                ParamDef::required("from", Ty::Str),
                ParamDef::required("to", Ty::Str),
            ],
            Ty::Str,
            |cx: CallContext<'_>| {
                Ok(Value::from(
                    cx.str_arg(0)?.replace(cx.str_arg(1)?, cx.str_arg(2)?),
                ))
            },
        ))
}

fn map_class() -> ClassEntry {
    ClassEntry::new(NamedTy::plain("Map"))
        .with_property("Count", Ty::Int32, |v| match v {
            Value::Map(map) => Ok(Value::Int32(map.len() as i32)),
            other => Err(expected("Map", other)),
        })
        .with_indexer(Ty::Str, Ty::Object, |v, key| {
            let Value::Map(map) = v else {
                return Err(expected("Map", v));
            };
            let key = key.as_str()?;
            map.get(key).cloned().ok_or_else(|| EvalError::KeyNotFound {
                key: key.to_string(),
            })
        })
}

fn shift_datetime(d: NaiveDateTime, delta: Duration) -> Result<Value, EvalError> {
    d.checked_add_signed(delta)
        .map(Value::DateTime)
        .ok_or_else(|| EvalError::other("DateTime out of range"))
}

fn shift_months(d: NaiveDateTime, months: i32) -> Result<Value, EvalError> {
    let shifted = if months >= 0 {
        d.checked_add_months(Months::new(months as u32))
    } else {
        d.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted
        .map(Value::DateTime)
        .ok_or_else(|| EvalError::other("DateTime out of range"))
}

fn fractional(unit_ms: f64, amount: f64) -> Duration {
    Duration::milliseconds((amount * unit_ms) as i64)
}

fn datetime_class() -> ClassEntry {
    ClassEntry::new(NamedTy::plain("DateTime"))
        .with_property("Year", Ty::Int32, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            Ok(Value::Int32(d.year()))
        })
        .with_property("Month", Ty::Int32, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            Ok(Value::Int32(d.month() as i32))
        })
        .with_property("Day", Ty::Int32, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            Ok(Value::Int32(d.day() as i32))
        })
        .with_property("Hour", Ty::Int32, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            Ok(Value::Int32(d.hour() as i32))
        })
        .with_property("Minute", Ty::Int32, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            Ok(Value::Int32(d.minute() as i32))
        })
        .with_property("Second", Ty::Int32, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            Ok(Value::Int32(d.second() as i32))
        })
        .with_property("Date", Ty::DateTime, |v| {
            let d: NaiveDateTime = v.clone().try_into()?;
            d.date()
                .and_hms_opt(0, 0, 0)
                .map(Value::DateTime)
                .ok_or_else(|| EvalError::other("DateTime out of range"))
        })
        .with_method(MethodEntry::instance(
            "AddYears",
            vec![ParamDef::required("years", Ty::Int32)],
            Ty::DateTime,
            |cx: CallContext<'_>| {
                shift_months(cx.datetime_arg(0)?, cx.i32_arg(1)?.saturating_mul(12))
            },
        ))
        .with_method(MethodEntry::instance(
            "AddMonths",
            vec![ParamDef::required("months", Ty::Int32)],
            Ty::DateTime,
            |cx: CallContext<'_>| shift_months(cx.datetime_arg(0)?, cx.i32_arg(1)?),
        ))
        .with_method(MethodEntry::instance(
            "AddDays",
            vec![ParamDef::required("days", Ty::Float64)],
            Ty::DateTime,
            |cx: CallContext<'_>| {
                shift_datetime(cx.datetime_arg(0)?, fractional(86_400_000.0, cx.f64_arg(1)?))
            },
        ))
        .with_method(MethodEntry::instance(
            "AddHours",
            vec![ParamDef::required("hours", Ty::Float64)],
            Ty::DateTime,
            |cx: CallContext<'_>| {
                shift_datetime(cx.datetime_arg(0)?, fractional(3_600_000.0, cx.f64_arg(1)?))
            },
        ))
        .with_method(MethodEntry::instance(
            "AddMinutes",
            vec![ParamDef::required("minutes", Ty::Float64)],
            Ty::DateTime,
            |cx: CallContext<'_>| {
                shift_datetime(cx.datetime_arg(0)?, fractional(60_000.0, cx.f64_arg(1)?))
            },
        ))
        .with_method(MethodEntry::instance(
            "AddSeconds",
            vec![ParamDef::required("seconds", Ty::Float64)],
            Ty::DateTime,
            |cx: CallContext<'_>| {
                shift_datetime(cx.datetime_arg(0)?, fractional(1_000.0, cx.f64_arg(1)?))
            },
        ))
        .with_method(MethodEntry::static_method(
            "Parse",
            vec![ParamDef::required("text", Ty::Str)],
            Ty::DateTime,
            |cx: CallContext<'_>| {
                let text = cx.str_arg(0)?;
                parse_datetime(text)
                    .map(Value::DateTime)
                    .ok_or_else(|| EvalError::other(format!("'{text}' is not a valid DateTime")))
            },
        ))
        .with_static_property("Now", Ty::DateTime, |_| {
            Ok(Value::DateTime(chrono::Local::now().naive_local()))
        })
        .with_static_property("Today", Ty::DateTime, |_| {
            chrono::Local::now()
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(Value::DateTime)
                .ok_or_else(|| EvalError::other("DateTime out of range"))
        })
}

fn math_class() -> ClassEntry {
    ClassEntry::static_class("Math")
        .with_static_property("PI", Ty::Float64, |_| {
            Ok(Value::Float64(std::f64::consts::PI))
        })
        .with_static_property("E", Ty::Float64, |_| Ok(Value::Float64(std::f64::consts::E)))
        .with_method(MethodEntry::static_method(
            "Abs",
            vec![ParamDef::required("value", Ty::Int32)],
            Ty::Int32,
            |cx: CallContext<'_>| Ok(Value::Int32(cx.i32_arg(0)?.wrapping_abs())),
        ))
        .with_method(MethodEntry::static_method(
            "Abs",
            vec![ParamDef::required("value", Ty::Float64)],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.abs())),
        ))
        .with_method(MethodEntry::static_method(
            "Min",
            vec![
                ParamDef::required("a", Ty::Int32),
                ParamDef::required("b", Ty::Int32),
            ],
            Ty::Int32,
            |cx: CallContext<'_>| Ok(Value::Int32(cx.i32_arg(0)?.min(cx.i32_arg(1)?))),
        ))
        .with_method(MethodEntry::static_method(
            "Min",
            vec![
                ParamDef::required("a", Ty::Float64),
                ParamDef::required("b", Ty::Float64),
            ],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.min(cx.f64_arg(1)?))),
        ))
        .with_method(MethodEntry::static_method(
            "Max",
            vec![
                ParamDef::required("a", Ty::Int32),
                ParamDef::required("b", Ty::Int32),
            ],
            Ty::Int32,
            |cx: CallContext<'_>| Ok(Value::Int32(cx.i32_arg(0)?.max(cx.i32_arg(1)?))),
        ))
        .with_method(MethodEntry::static_method(
            "Max",
            vec![
                ParamDef::required("a", Ty::Float64),
                ParamDef::required("b", Ty::Float64),
            ],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.max(cx.f64_arg(1)?))),
        ))
        .with_method(MethodEntry::static_method(
            "Round",
            vec![
                ParamDef::required("value", Ty::Float64),
                ParamDef::optional("digits", Ty::Int32, Value::Int32(0)),
            ],
            Ty::Float64,
            |cx: CallContext<'_>| {
                let value = cx.f64_arg(0)?;
                let digits = cx.i32_arg(1)?;
                // banker's rounding, matching the source semantics
                let factor = 10f64.powi(digits);
                Ok(Value::Float64((value * factor).round_ties_even() / factor))
            },
        ))
        .with_method(MethodEntry::static_method(
            "Floor",
            vec![ParamDef::required("value", Ty::Float64)],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.floor())),
        ))
        .with_method(MethodEntry::static_method(
            "Ceiling",
            vec![ParamDef::required("value", Ty::Float64)],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.ceil())),
        ))
        .with_method(MethodEntry::static_method(
            "Sqrt",
            vec![ParamDef::required("value", Ty::Float64)],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.sqrt())),
        ))
        .with_method(MethodEntry::static_method(
            "Pow",
            vec![
                ParamDef::required("base", Ty::Float64),
                ParamDef::required("exponent", Ty::Float64),
            ],
            Ty::Float64,
            |cx: CallContext<'_>| Ok(Value::Float64(cx.f64_arg(0)?.powf(cx.f64_arg(1)?))),
        ))
}

fn guid_class() -> ClassEntry {
    ClassEntry::static_class("Guid")
        .with_method(MethodEntry::static_method(
            "NewGuid",
            Vec::new(),
            Ty::Guid,
            |_cx: CallContext<'_>| Ok(Value::Guid(Uuid::new_v4())),
        ))
        .with_method(MethodEntry::static_method(
            "Parse",
            vec![ParamDef::required("text", Ty::Str)],
            Ty::Guid,
            |cx: CallContext<'_>| {
                let text = cx.str_arg(0)?;
                Uuid::parse_str(text)
                    .map(Value::Guid)
                    .map_err(|_| EvalError::other(format!("'{text}' is not a valid Guid")))
            },
        ))
}

/// Items of a sequence receiver: array elements or string chars.
fn sequence_values(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Array(array) => Ok(array.items.iter().cloned().collect()),
        Value::Str(s) => Ok(s.chars().map(Value::Char).collect()),
        other => Err(expected("a sequence", other)),
    }
}

/// Element type of a sequence receiver, for rebuilding arrays.
fn sequence_elem(value: &Value) -> Ty {
    match value {
        Value::Array(array) => array.elem.clone(),
        Value::Str(_) => Ty::Char,
        _ => Ty::Object,
    }
}

fn zero_for(ty: &Ty) -> Value {
    match ty {
        Ty::Int8 => Value::Int8(0),
        Ty::Int16 => Value::Int16(0),
        Ty::Int64 => Value::Int64(0),
        Ty::UInt8 => Value::UInt8(0),
        Ty::UInt16 => Value::UInt16(0),
        Ty::UInt32 => Value::UInt32(0),
        Ty::UInt64 => Value::UInt64(0),
        Ty::Float32 => Value::Float32(0.0),
        Ty::Float64 => Value::Float64(0.0),
        _ => Value::Int32(0),
    }
}

fn empty_sequence() -> EvalError {
    EvalError::other("sequence contains no elements")
}

fn no_match() -> EvalError {
    EvalError::other("sequence contains no matching element")
}

fn predicate_param() -> ExtParam {
    ExtParam::required(
        "predicate",
        TyScheme::func(vec![TyScheme::param(0)], TyScheme::concrete(Ty::Bool)),
    )
}

fn selector_param() -> ExtParam {
    ExtParam::required(
        "selector",
        TyScheme::func(vec![TyScheme::param(0)], TyScheme::param(1)),
    )
}

fn seq_receiver() -> TyScheme {
    TyScheme::sequence_of(TyScheme::param(0))
}

fn sequence_extensions() -> Vec<ExtensionEntry> {
    vec![
        ExtensionEntry::new(
            "Count",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::concrete(Ty::Int32),
            |cx: CallContext<'_>| {
                Ok(Value::Int32(sequence_values(cx.arg(0)?)?.len() as i32))
            },
        ),
        ExtensionEntry::new(
            "Any",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::concrete(Ty::Bool),
            |cx: CallContext<'_>| {
                Ok(Value::Bool(!sequence_values(cx.arg(0)?)?.is_empty()))
            },
        ),
        ExtensionEntry::new(
            "Any",
            1,
            seq_receiver(),
            vec![predicate_param()],
            TyScheme::concrete(Ty::Bool),
            |cx: CallContext<'_>| {
                let predicate = cx.func_arg(1)?;
                for item in sequence_values(cx.arg(0)?)? {
                    if predicate.invoke(&[item])?.as_bool()? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            },
        ),
        ExtensionEntry::new(
            "All",
            1,
            seq_receiver(),
            vec![predicate_param()],
            TyScheme::concrete(Ty::Bool),
            |cx: CallContext<'_>| {
                let predicate = cx.func_arg(1)?;
                for item in sequence_values(cx.arg(0)?)? {
                    if !predicate.invoke(&[item])?.as_bool()? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            },
        ),
        ExtensionEntry::new(
            "Contains",
            1,
            seq_receiver(),
            vec![ExtParam::required("value", TyScheme::param(0))],
            TyScheme::concrete(Ty::Bool),
            |cx: CallContext<'_>| {
                let needle = cx.arg(1)?;
                let found = sequence_values(cx.arg(0)?)?
                    .iter()
                    .any(|item| arith::equal(item, needle));
                Ok(Value::Bool(found))
            },
        ),
        ExtensionEntry::new(
            "First",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::param(0),
            |cx: CallContext<'_>| {
                sequence_values(cx.arg(0)?)?
                    .into_iter()
                    .next()
                    .ok_or_else(empty_sequence)
            },
        ),
        ExtensionEntry::new(
            "First",
            1,
            seq_receiver(),
            vec![predicate_param()],
            TyScheme::param(0),
            |cx: CallContext<'_>| {
                let predicate = cx.func_arg(1)?;
                for item in sequence_values(cx.arg(0)?)? {
                    if predicate.invoke(&[item.clone()])?.as_bool()? {
                        return Ok(item);
                    }
                }
                Err(no_match())
            },
        ),
        ExtensionEntry::new(
            "Where",
            1,
            seq_receiver(),
            vec![predicate_param()],
            TyScheme::array(TyScheme::param(0)),
            |cx: CallContext<'_>| {
                let predicate = cx.func_arg(1)?;
                let mut kept = Vec::new();
                for item in sequence_values(cx.arg(0)?)? {
                    if predicate.invoke(&[item.clone()])?.as_bool()? {
                        kept.push(item);
                    }
                }
                Ok(Value::array(sequence_elem(cx.arg(0)?), kept))
            },
        ),
        ExtensionEntry::new(
            "Select",
            2,
            seq_receiver(),
            vec![selector_param()],
            TyScheme::array(TyScheme::param(1)),
            |cx: CallContext<'_>| {
                let selector = cx.func_arg(1)?;
                let mut mapped = Vec::new();
                for item in sequence_values(cx.arg(0)?)? {
                    mapped.push(selector.invoke(&[item])?);
                }
                Ok(Value::array(selector.ty().ret.clone(), mapped))
            },
        ),
        ExtensionEntry::new(
            "Sum",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::param(0),
            |cx: CallContext<'_>| {
                let receiver = cx.arg(0)?;
                let mut acc = zero_for(&sequence_elem(receiver));
                for item in sequence_values(receiver)? {
                    acc = arith::add(&acc, &item)?;
                }
                Ok(acc)
            },
        ),
        ExtensionEntry::new(
            "Sum",
            2,
            seq_receiver(),
            vec![selector_param()],
            TyScheme::param(1),
            |cx: CallContext<'_>| {
                let selector = cx.func_arg(1)?;
                let mut acc = zero_for(&selector.ty().ret);
                for item in sequence_values(cx.arg(0)?)? {
                    acc = arith::add(&acc, &selector.invoke(&[item])?)?;
                }
                Ok(acc)
            },
        ),
        ExtensionEntry::new(
            "Min",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::param(0),
            |cx: CallContext<'_>| fold_extremum(sequence_values(cx.arg(0)?)?, true),
        ),
        ExtensionEntry::new(
            "Min",
            2,
            seq_receiver(),
            vec![selector_param()],
            TyScheme::param(1),
            |cx: CallContext<'_>| {
                let selector = cx.func_arg(1)?;
                let mut mapped = Vec::new();
                for item in sequence_values(cx.arg(0)?)? {
                    mapped.push(selector.invoke(&[item])?);
                }
                fold_extremum(mapped, true)
            },
        ),
        ExtensionEntry::new(
            "Max",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::param(0),
            |cx: CallContext<'_>| fold_extremum(sequence_values(cx.arg(0)?)?, false),
        ),
        ExtensionEntry::new(
            "Max",
            2,
            seq_receiver(),
            vec![selector_param()],
            TyScheme::param(1),
            |cx: CallContext<'_>| {
                let selector = cx.func_arg(1)?;
                let mut mapped = Vec::new();
                for item in sequence_values(cx.arg(0)?)? {
                    mapped.push(selector.invoke(&[item])?);
                }
                fold_extremum(mapped, false)
            },
        ),
        ExtensionEntry::new(
            "Average",
            1,
            seq_receiver(),
            Vec::new(),
            TyScheme::concrete(Ty::Float64),
            |cx: CallContext<'_>| average(sequence_values(cx.arg(0)?)?),
        ),
        ExtensionEntry::new(
            "Average",
            2,
            seq_receiver(),
            vec![selector_param()],
            TyScheme::concrete(Ty::Float64),
            |cx: CallContext<'_>| {
                let selector = cx.func_arg(1)?;
                let mut mapped = Vec::new();
                for item in sequence_values(cx.arg(0)?)? {
                    mapped.push(selector.invoke(&[item])?);
                }
                average(mapped)
            },
        ),
    ]
}

fn fold_extremum(items: Vec<Value>, want_min: bool) -> Result<Value, EvalError> {
    let mut best: Option<Value> = None;
    for item in items {
        best = Some(match best {
            None => item,
            Some(current) => {
                let keep_item = match arith::compare(&item, &current)? {
                    std::cmp::Ordering::Less => want_min,
                    std::cmp::Ordering::Greater => !want_min,
                    std::cmp::Ordering::Equal => false,
                };
                if keep_item { item } else { current }
            }
        });
    }
    best.ok_or_else(empty_sequence)
}

fn average(items: Vec<Value>) -> Result<Value, EvalError> {
    if items.is_empty() {
        return Err(empty_sequence());
    }
    let count = Value::Float64(items.len() as f64);
    let mut acc = Value::Float64(0.0);
    for item in items {
        acc = arith::add(&acc, &item)?;
    }
    arith::divide(&acc, &count)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use dynexpr_core::{FuncTy, FuncValue};

    fn ints(values: &[i32]) -> Value {
        Value::array(Ty::Int32, values.iter().copied().map(Value::Int32).collect())
    }

    fn invoke(name: &str, arity: usize, args: &[Value]) -> Value {
        let entry = sequence_extensions()
            .into_iter()
            .find(|e| e.name.as_ref() == name && e.max_arity() == arity)
            .unwrap_or_else(|| panic!("no extension {name}/{arity}"));
        entry.native.invoke(args).unwrap()
    }

    #[test]
    fn string_members() {
        let class = string_class();
        let hello = Value::from("don't");

        let length = class.property("Length", false, false).unwrap();
        assert_eq!((length.getter)(&hello), Ok(Value::Int32(5)));

        let contains = &class.methods_named("Contains", false, false)[0];
        let out = contains.native.invoke(&[hello.clone(), Value::from("on'")]);
        assert_eq!(out, Ok(Value::Bool(true)));

        let substring = &class.methods_named("Substring", false, false)[0];
        let out = substring
            .native
            .invoke(&[hello.clone(), Value::Int32(1), Value::Int32(2)]);
        assert_eq!(out, Ok(Value::from("on")));
        let out = substring.native.invoke(&[hello.clone(), Value::Int32(2), Value::Null]);
        assert_eq!(out, Ok(Value::from("n't")));

        let indexer = class.indexer.as_ref().unwrap();
        assert_eq!((indexer.get)(&hello, &Value::Int32(3)), Ok(Value::Char('\'')));
        assert!((indexer.get)(&hello, &Value::Int32(9)).is_err());
    }

    #[test]
    fn math_overloads_by_rank() {
        let class = math_class();
        let mins = class.methods_named("Min", false, true);
        assert_eq!(mins.len(), 2);
        let round = &class.methods_named("Round", false, true)[0];
        // banker's rounding
        let out = round.native.invoke(&[Value::Float64(2.5), Value::Int32(0)]);
        assert_eq!(out, Ok(Value::Float64(2.0)));
        let out = round.native.invoke(&[Value::Float64(2.345), Value::Int32(2)]);
        assert_eq!(out, Ok(Value::Float64(2.35)));
    }

    #[test]
    fn datetime_members() {
        let class = datetime_class();
        let parse = &class.methods_named("Parse", false, true)[0];
        let parsed = parse.native.invoke(&[Value::from("2023-07-19T14:30:00")]).unwrap();

        let year = class.property("Year", false, false).unwrap();
        assert_eq!((year.getter)(&parsed), Ok(Value::Int32(2023)));

        let add_days = &class.methods_named("AddDays", false, false)[0];
        let shifted = add_days.native.invoke(&[parsed, Value::Float64(1.5)]).unwrap();
        let hour = class.property("Hour", false, false).unwrap();
        assert_eq!((hour.getter)(&shifted), Ok(Value::Int32(2)));
    }

    #[test]
    fn sequence_folds() {
        let seq = ints(&[1, 2, 3, 4]);
        assert_eq!(invoke("Count", 0, &[seq.clone()]), Value::Int32(4));
        assert_eq!(invoke("Sum", 0, &[seq.clone()]), Value::Int32(10));
        assert_eq!(invoke("Min", 0, &[seq.clone()]), Value::Int32(1));
        assert_eq!(invoke("Max", 0, &[seq.clone()]), Value::Int32(4));
        assert_eq!(invoke("Average", 0, &[seq.clone()]), Value::Float64(2.5));
        assert_eq!(
            invoke("Contains", 1, &[seq.clone(), Value::Int32(3)]),
            Value::Bool(true)
        );
        assert_eq!(invoke("Any", 0, &[ints(&[])]), Value::Bool(false));
    }

    #[test]
    fn sequence_lambda_forms() {
        let seq = ints(&[1, 2, 3, 4]);
        let is_even = Value::Func(FuncValue::new(
            FuncTy {
                params: vec![Ty::Int32],
                ret: Ty::Bool,
            },
            Arc::new(|args: &[Value]| Ok(Value::Bool(args[0].as_i32()? % 2 == 0))),
        ));

        assert_eq!(
            invoke("Where", 1, &[seq.clone(), is_even.clone()]),
            ints(&[2, 4])
        );
        assert_eq!(
            invoke("Any", 1, &[seq.clone(), is_even.clone()]),
            Value::Bool(true)
        );
        assert_eq!(
            invoke("All", 1, &[seq.clone(), is_even.clone()]),
            Value::Bool(false)
        );
        assert_eq!(
            invoke("First", 1, &[seq.clone(), is_even]),
            Value::Int32(2)
        );

        let double = Value::Func(FuncValue::new(
            FuncTy {
                params: vec![Ty::Int32],
                ret: Ty::Int32,
            },
            Arc::new(|args: &[Value]| Ok(Value::Int32(args[0].as_i32()? * 2))),
        ));
        assert_eq!(invoke("Select", 1, &[seq.clone(), double.clone()]), ints(&[2, 4, 6, 8]));
        assert_eq!(invoke("Sum", 1, &[seq, double]), Value::Int32(20));
    }

    #[test]
    fn strings_are_sequences_of_chars() {
        let hello = Value::from("ba");
        assert_eq!(invoke("Count", 0, &[hello.clone()]), Value::Int32(2));
        assert_eq!(invoke("Min", 0, &[hello]), Value::Char('a'));
    }

    #[test]
    fn universal_to_string_renders_any_value() {
        let out = universal_to_string().native.invoke(&[Value::Int32(42)]);
        assert_eq!(out, Ok(Value::from("42")));
        let out = universal_to_string().native.invoke(&[Value::Null]);
        assert_eq!(out, Ok(Value::from("")));
    }
}
