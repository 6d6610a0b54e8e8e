//! Per-device parameter declarations: which keys exist, their bounds and
//! defaults, and bounds that depend on other parameters.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use num_traits::clamp;

use crate::error::{CodecError, ModelError};
use crate::model::{ParameterModel, Value};
use crate::packing;

/// Declared shape of one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Integer in `min..=max`
    Int {
        /// Lowest legal value
        min: i32,
        /// Highest legal value
        max: i32,
        /// Initial value
        default: i32,
    },
    /// Text of at most `width` printable ASCII characters
    Text {
        /// Field width on the wire
        width: usize,
        /// Initial value
        default: String,
    },
}

type MaxFn = Box<dyn Fn(&ParameterModel) -> i32 + Send + Sync>;

/// Upper bound of `target` recomputed from other parameters.
struct BoundsRule {
    target: String,
    depends_on: Vec<String>,
    max: MaxFn,
}

impl fmt::Debug for BoundsRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundsRule")
            .field("target", &self.target)
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// The parameter set a device defines.
#[derive(Debug)]
pub struct Schema {
    device: &'static str,
    params: BTreeMap<String, ParamKind>,
    rules: Vec<BoundsRule>,
}

impl Schema {
    /// Start an empty schema for `device`.
    pub fn new(device: &'static str) -> Self {
        Self {
            device,
            params: BTreeMap::new(),
            rules: Vec::new(),
        }
    }

    /// Declare an integer parameter.
    pub fn int(&mut self, key: impl Into<String>, min: i32, max: i32, default: i32) -> &mut Self {
        debug_assert!(min <= default && default <= max);
        self.params
            .insert(key.into(), ParamKind::Int { min, max, default });
        self
    }

    /// Declare a fixed-width text parameter. The default is cut to `width`.
    pub fn text(&mut self, key: impl Into<String>, width: usize, default: &str) -> &mut Self {
        self.params.insert(
            key.into(),
            ParamKind::Text {
                width,
                default: revise_text(default, width),
            },
        );
        self
    }

    /// Make the upper bound of `target` a function of the keys in
    /// `depends_on`. The static maximum still caps the result.
    pub fn derive_max<F>(&mut self, target: impl Into<String>, depends_on: &[&str], max: F) -> &mut Self
    where
        F: Fn(&ParameterModel) -> i32 + Send + Sync + 'static,
    {
        self.rules.push(BoundsRule {
            target: target.into(),
            depends_on: depends_on.iter().map(|k| k.to_string()).collect(),
            max: Box::new(max),
        });
        self
    }

    /// Device display name.
    pub fn device(&self) -> &'static str {
        self.device
    }

    /// Declared kind of `key`.
    pub fn kind(&self, key: &str) -> Option<&ParamKind> {
        self.params.get(key)
    }

    /// All declared keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Number of declared keys.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the schema declares nothing.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// A model holding every declared key at its default.
    pub fn defaults(&self) -> ParameterModel {
        let mut model = ParameterModel::new();
        for (key, kind) in &self.params {
            let value = match kind {
                ParamKind::Int { default, .. } => Value::Int(*default),
                ParamKind::Text { default, .. } => Value::Text(default.clone()),
            };
            model.define(key.clone(), value);
        }
        model
    }

    /// Effective `(min, max)` of an integer key given the current model.
    pub fn bounds(&self, key: &str, model: &ParameterModel) -> Option<(i32, i32)> {
        let (min, mut max) = match self.params.get(key)? {
            ParamKind::Int { min, max, .. } => (*min, *max),
            ParamKind::Text { .. } => return None,
        };
        for rule in self.rules.iter().filter(|r| r.target == key) {
            max = max.min((rule.max)(model)).max(min);
        }
        Some((min, max))
    }

    fn model_error(&self, source: ModelError) -> CodecError {
        CodecError::Model {
            device: self.device,
            source,
        }
    }

    /// Set an integer key, clamped to its bounds, then re-clamp every key
    /// whose bounds depend on it.
    pub fn write(&self, model: &mut ParameterModel, key: &str, value: i32) -> Result<(), CodecError> {
        let (min, max) = match self.params.get(key) {
            Some(ParamKind::Int { .. }) => self.bounds(key, model).unwrap_or((value, value)),
            Some(ParamKind::Text { .. }) => {
                return Err(self.model_error(ModelError::WrongKind {
                    key: key.to_string(),
                    expected: "an integer",
                }))
            }
            None => return Err(self.model_error(ModelError::Undefined(key.to_string()))),
        };
        model
            .set_int(key, clamp(value, min, max))
            .map_err(|e| self.model_error(e))?;

        for rule in self
            .rules
            .iter()
            .filter(|r| r.depends_on.iter().any(|d| d == key))
        {
            self.clamp_key(model, &rule.target)?;
        }
        Ok(())
    }

    /// Set a text key, sanitised and cut to its declared width.
    pub fn write_text(&self, model: &mut ParameterModel, key: &str, value: &str) -> Result<(), CodecError> {
        let width = match self.params.get(key) {
            Some(ParamKind::Text { width, .. }) => *width,
            Some(ParamKind::Int { .. }) => {
                return Err(self.model_error(ModelError::WrongKind {
                    key: key.to_string(),
                    expected: "text",
                }))
            }
            None => return Err(self.model_error(ModelError::Undefined(key.to_string()))),
        };
        model
            .set_text(key, revise_text(value, width))
            .map_err(|e| self.model_error(e))
    }

    fn clamp_key(&self, model: &mut ParameterModel, key: &str) -> Result<bool, CodecError> {
        let Some((min, max)) = self.bounds(key, model) else {
            return Ok(false);
        };
        let value = model.int(key).map_err(|e| self.model_error(e))?;
        let clamped = clamp(value, min, max);
        if clamped != value {
            debug!(
                "{}: clamped {} from {} to {} ({}..={})",
                self.device, key, value, clamped, min, max
            );
            model.set_int(key, clamped).map_err(|e| self.model_error(e))?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Bring every parameter back into its legal range: integers are clamped
    /// (static bounds first, then derived bounds) and text is sanitised.
    ///
    /// Returns the number of values that had to change.
    pub fn revise(&self, model: &mut ParameterModel) -> Result<usize, CodecError> {
        let mut changed = 0;
        let derived: Vec<&str> = self.rules.iter().map(|r| r.target.as_str()).collect();

        for (key, kind) in &self.params {
            match kind {
                ParamKind::Int { min, max, .. } => {
                    let value = model.int(key).map_err(|e| self.model_error(e))?;
                    let clamped = clamp(value, *min, *max);
                    if clamped != value {
                        debug!(
                            "{}: clamped {} from {} to {} ({}..={})",
                            self.device, key, value, clamped, min, max
                        );
                        model.set_int(key, clamped).map_err(|e| self.model_error(e))?;
                        changed += 1;
                    }
                }
                ParamKind::Text { width, .. } => {
                    let text = model.text(key).map_err(|e| self.model_error(e))?;
                    let revised = revise_text(text, *width);
                    if revised != text {
                        debug!("{}: revised {} from {:?} to {:?}", self.device, key, text, revised);
                        model.set_text(key, revised).map_err(|e| self.model_error(e))?;
                        changed += 1;
                    }
                }
            }
        }

        for key in derived {
            if self.clamp_key(model, key)? {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

/// Replace characters a 7-bit device cannot hold, cut to `width` and drop
/// trailing whitespace.
fn revise_text(text: &str, width: usize) -> String {
    let cut: String = text
        .chars()
        .take(width)
        .map(|c| if packing::is_printable(c) { c } else { ' ' })
        .collect();
    cut.trim_end().to_string()
}
