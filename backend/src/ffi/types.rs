//! Type conversion utilities for FFI boundary
//!
//! Parameters, interventions and results cross the boundary as plain Python
//! dicts and lists. Conversion goes through `serde_json::Value`, so every
//! Rust type that derives `Serialize`/`Deserialize` can be exposed without a
//! hand-written converter.

use pyo3::exceptions::{PyIOError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyString, PyTuple};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::orchestrator::SimulationError;

// ========================================================================
// Python -> JSON
// ========================================================================

/// Convert an arbitrary Python object into a JSON value
///
/// Supports None, bool, int, float, str, list, tuple and dict (with string
/// keys). Anything else raises TypeError.
pub fn py_to_value(obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    if obj.is_none() {
        return Ok(Value::Null);
    }
    // bool first: Python bools are ints
    if let Ok(b) = obj.downcast::<PyBool>() {
        return Ok(Value::Bool(b.is_true()));
    }
    if let Ok(s) = obj.downcast::<PyString>() {
        return Ok(Value::String(s.to_cow()?.into_owned()));
    }
    if obj.downcast::<PyFloat>().is_ok() {
        let f: f64 = obj.extract()?;
        return Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| PyValueError::new_err(format!("Non-finite float: {}", f)));
    }
    if let Ok(i) = obj.extract::<i64>() {
        return Ok(Value::from(i));
    }
    if let Ok(u) = obj.extract::<u64>() {
        return Ok(Value::from(u));
    }
    if let Ok(dict) = obj.downcast::<PyDict>() {
        return dict_to_map(dict).map(Value::Object);
    }
    if let Ok(list) = obj.downcast::<PyList>() {
        return list.iter().map(|item| py_to_value(&item)).collect::<PyResult<Vec<_>>>().map(Value::Array);
    }
    if let Ok(tuple) = obj.downcast::<PyTuple>() {
        return tuple.iter().map(|item| py_to_value(&item)).collect::<PyResult<Vec<_>>>().map(Value::Array);
    }
    Err(PyTypeError::new_err(format!(
        "Unsupported value of type {}",
        obj.get_type().name()?
    )))
}

/// Convert a Python dict with string keys into a JSON object
pub fn dict_to_map(dict: &Bound<'_, PyDict>) -> PyResult<Map<String, Value>> {
    let mut map = Map::new();
    for (key, value) in dict.iter() {
        let key: String = key
            .extract()
            .map_err(|_| PyTypeError::new_err("Dictionary keys must be strings"))?;
        map.insert(key, py_to_value(&value)?);
    }
    Ok(map)
}

/// Deserialize a Rust value from a Python object
pub fn from_py<T: DeserializeOwned>(obj: &Bound<'_, PyAny>, what: &str) -> PyResult<T> {
    let value = py_to_value(obj)?;
    serde_json::from_value(value).map_err(|e| PyValueError::new_err(format!("Invalid {}: {}", what, e)))
}

// ========================================================================
// JSON -> Python
// ========================================================================

/// Convert a JSON value into the equivalent Python object
pub fn value_to_py(py: Python<'_>, value: &Value) -> PyResult<PyObject> {
    Ok(match value {
        Value::Null => py.None(),
        Value::Bool(b) => b.into_py(py),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_py(py)
            } else if let Some(u) = n.as_u64() {
                u.into_py(py)
            } else {
                n.as_f64().unwrap_or(f64::NAN).into_py(py)
            }
        }
        Value::String(s) => s.into_py(py),
        Value::Array(items) => {
            let list = PyList::empty_bound(py);
            for item in items {
                list.append(value_to_py(py, item)?)?;
            }
            list.into_py(py)
        }
        Value::Object(map) => {
            let dict = PyDict::new_bound(py);
            for (key, item) in map {
                dict.set_item(key, value_to_py(py, item)?)?;
            }
            dict.into_py(py)
        }
    })
}

/// Serialize a Rust value into a Python object
pub fn to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let json = serde_json::to_value(value)
        .map_err(|e| PyRuntimeError::new_err(format!("Serialization failed: {}", e)))?;
    value_to_py(py, &json)
}

// ========================================================================
// Errors
// ========================================================================

/// Map engine errors onto Python exception types
pub fn simulation_error_to_py(err: SimulationError) -> PyErr {
    match err {
        SimulationError::InvalidIntervention(_) => PyValueError::new_err(err.to_string()),
        SimulationError::DatasetNotFound { .. } | SimulationError::CheckpointIo { .. } => {
            PyIOError::new_err(err.to_string())
        }
        other => PyRuntimeError::new_err(other.to_string()),
    }
}
